//! Atlas Graph - the directed location graph (C3, §4.3)
//!
//! A `LocationGraph` is a directed graph of [`Location`]s connected by
//! labeled [`Exit`] edges. This crate defines the shared trait and an
//! in-memory implementation modeled on the reference stack's append-safe,
//! lock-guarded repository pattern (one `RwLock`-protected map per
//! collection, invariants enforced at the write site rather than after
//! the fact). The durable ("cosmos") implementation lives in `atlas-db`,
//! which depends on this crate for the trait and shared types.

pub mod error;
pub mod memory;

pub use error::{GraphError, GraphResult};

use async_trait::async_trait;
use atlas_types::{Direction, Exit, Location, LocationId};

/// Outcome of `upsert`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub created: bool,
    pub id: LocationId,
    pub updated_revision: Option<u64>,
}

/// Outcome of a successful move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    pub location: Location,
}

/// Why a move failed (§4.3 `move`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveFailureReason {
    FromMissing,
    NoExit,
    TargetMissing,
}

/// Outcome of `ensure_exit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnsureExitOutcome {
    pub created: bool,
    pub description_backfilled: bool,
}

/// Outcome of `ensure_exit_bidirectional`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnsureExitBidirectionalOutcome {
    pub forward: EnsureExitOutcome,
    pub reciprocal: Option<EnsureExitOutcome>,
}

/// A single edge to create via `apply_exits`.
#[derive(Debug, Clone)]
pub struct ExitBatchItem {
    pub from: LocationId,
    pub direction: Direction,
    pub to: LocationId,
    pub description: Option<String>,
    pub reciprocal: bool,
}

/// Aggregate outcome of `apply_exits`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ApplyExitsOutcome {
    pub exits_created: u32,
    pub exits_skipped: u32,
    pub reciprocal_applied: u32,
}

/// Options for `ensure_exit_bidirectional`.
#[derive(Debug, Clone, Default)]
pub struct BidirectionalOptions {
    pub reciprocal: bool,
    pub forward_description: Option<String>,
    pub reverse_description: Option<String>,
}

/// The directed location graph (C3, §4.3). All mutation methods regenerate
/// the affected location's `exits_summary_cache`; `no self-loop` is
/// enforced at the call site in `atlas-engine`, not here, matching the
/// spec's "current policy: rejected by caller" note.
#[async_trait]
pub trait LocationGraph: Send + Sync {
    async fn get(&self, id: LocationId) -> GraphResult<Option<Location>>;

    async fn upsert(&self, location: Location) -> GraphResult<UpsertOutcome>;

    /// Resolve a move out of `from` in `direction`. Named `move_from`
    /// because `move` is a reserved word in Rust.
    async fn move_from(
        &self,
        from: LocationId,
        direction: Direction,
    ) -> GraphResult<Result<MoveOutcome, MoveFailureReason>>;

    async fn ensure_exit(
        &self,
        from: LocationId,
        direction: Direction,
        to: LocationId,
        description: Option<String>,
    ) -> GraphResult<EnsureExitOutcome>;

    async fn ensure_exit_bidirectional(
        &self,
        from: LocationId,
        direction: Direction,
        to: LocationId,
        options: BidirectionalOptions,
    ) -> GraphResult<EnsureExitBidirectionalOutcome>;

    async fn remove_exit(&self, from: LocationId, direction: Direction) -> GraphResult<u32>;

    async fn apply_exits(&self, batch: Vec<ExitBatchItem>) -> GraphResult<ApplyExitsOutcome>;

    async fn list_all(&self) -> GraphResult<Vec<Location>>;

    async fn delete_location(&self, id: LocationId) -> GraphResult<bool>;
}
