//! Atlas Event Log - the world event log and worker claim API (C7, §4.7)
//!
//! `create` is idempotent by record id (second write of the same id is a
//! no-op, for at-least-once queue delivery). `update_status` enforces the
//! monotonic state machine from [`atlas_types::EventStatus`]. Workers
//! external to this crate drive events from `pending` to `processed` by
//! calling [`WorldEventLog::claim_next`] and then `complete`/`fail`;
//! `retry`/`give_up` close the loop on a previously failed event.

pub mod error;
pub mod memory;

pub use error::{EventLogError, EventLogResult};
pub use memory::InMemoryWorldEventLog;

use async_trait::async_trait;
use atlas_types::{DeadLetterRecord, EventStatus, ScopeKey, WorldEventId, WorldEventRecord};
use chrono::{DateTime, Utc};

/// Outcome of `create`: `created = false` signals a duplicate write of an
/// id already present, left untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateOutcome {
    pub record: WorldEventRecord,
    pub created: bool,
}

/// Filters for `query_by_scope`. `limit` defaults to 100 per §4.7.
#[derive(Debug, Clone)]
pub struct ScopeQueryOptions {
    pub limit: usize,
    pub status: Option<EventStatus>,
    pub occurred_from: Option<DateTime<Utc>>,
    pub occurred_to: Option<DateTime<Utc>>,
}

impl Default for ScopeQueryOptions {
    fn default() -> Self {
        Self {
            limit: 100,
            status: None,
            occurred_from: None,
            occurred_to: None,
        }
    }
}

/// The world event log: append-only records with a monotonic status
/// machine and a worker-facing claim/complete/fail loop.
#[async_trait]
pub trait WorldEventLog: Send + Sync {
    /// Upserts by `(scope_key, id)`; a second create of the same id is a
    /// no-op (`created = false`), not an error, to tolerate at-least-once
    /// delivery from upstream queues.
    async fn create(&self, record: WorldEventRecord) -> EventLogResult<CreateOutcome>;

    /// Cross-partition scan for a matching idempotency key. A hit lets the
    /// caller short-circuit with `World.Event.Duplicate` before doing any
    /// processing work.
    async fn get_by_idempotency_key(
        &self,
        idempotency_key: &str,
    ) -> EventLogResult<Option<WorldEventRecord>>;

    /// Applies a status transition, rejecting anything
    /// [`EventStatus::can_transition_to`] disallows.
    async fn update_status(
        &self,
        id: WorldEventId,
        scope_key: ScopeKey,
        next: EventStatus,
        processing_metadata: Option<serde_json::Value>,
    ) -> EventLogResult<WorldEventRecord>;

    /// Single-partition query ordered by `occurred_utc`, filtered by
    /// `opts`. Target: ≤200ms for 1000 events in scope (reference
    /// guidance; not enforced by this in-memory implementation).
    async fn query_by_scope(
        &self,
        scope_key: ScopeKey,
        opts: ScopeQueryOptions,
    ) -> EventLogResult<Vec<WorldEventRecord>>;

    /// Cross-partition, admin-only: the most recent `limit` events
    /// regardless of scope.
    async fn get_recent(&self, limit: usize) -> EventLogResult<Vec<WorldEventRecord>>;

    /// Claims the oldest pending event (optionally restricted to
    /// `scope_key`) not already claimed by another in-flight worker.
    /// Returns `None` if nothing is claimable.
    async fn claim_next(
        &self,
        scope_key: Option<ScopeKey>,
    ) -> EventLogResult<Option<WorldEventRecord>>;

    /// Marks a claimed event `processed` and releases the claim.
    async fn complete(&self, id: WorldEventId, scope_key: ScopeKey) -> EventLogResult<WorldEventRecord>;

    /// Marks a claimed event `failed` and releases the claim.
    async fn fail(
        &self,
        id: WorldEventId,
        scope_key: ScopeKey,
        reason: String,
    ) -> EventLogResult<WorldEventRecord>;

    /// Returns a previously failed event to `pending` for another attempt.
    async fn retry(&self, id: WorldEventId, scope_key: ScopeKey) -> EventLogResult<WorldEventRecord>;

    /// Terminally dead-letters a failed event. Always writes a redacted
    /// dead-letter snapshot; the write itself never fails the caller even
    /// if the sink has trouble, per §4.7 ("dead-letter writes never
    /// throw").
    async fn give_up(
        &self,
        id: WorldEventId,
        scope_key: ScopeKey,
        reason: String,
    ) -> EventLogResult<WorldEventRecord>;

    /// Out-of-band listing of dead letters, most recent first.
    async fn list_dead_letters(&self, limit: usize) -> EventLogResult<Vec<DeadLetterRecord>>;
}
