//! Atlas Debounce - the exit-hint debouncer (C10, §4.10)
//!
//! `should_emit` is partition-local: a hit inside the debounce window
//! suppresses a repeat `Navigation.Exit.GenerationRequested` for the same
//! `(player, origin, direction)`. On a storage error callers should fail
//! **open** (treat it as emit-worthy) rather than silently suppress a
//! legitimate generation hint; see [`fail_open`].

pub mod error;
pub mod memory;

pub use error::{DebounceError, DebounceResult};
pub use memory::InMemoryExitHintDebouncer;

use async_trait::async_trait;
use atlas_types::{Direction, LocationId, PlayerId};

/// Default debounce window per §4.10 and the `EXIT_HINT_DEBOUNCE_MS`
/// config default.
pub const DEFAULT_DEBOUNCE_WINDOW_MS: u64 = 60_000;

/// Extra TTL margin added on top of the debounce window so a record
/// outlives the window it's meant to suppress, per §4.10's `ceil(window /
/// 1000) + 60s` rule.
pub const TTL_MARGIN_SECONDS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShouldEmitOutcome {
    pub emit: bool,
    pub debounce_hit: bool,
}

/// The exit-hint debouncer: a process-local (or, via `atlas-db`,
/// partition-local) TTL store keyed by `(player, origin, direction)`.
#[async_trait]
pub trait ExitHintDebouncer: Send + Sync {
    /// Returns whether a `Navigation.Exit.GenerationRequested` hint should
    /// be emitted for `(player_id, origin_location_id, direction)`, given
    /// `window_ms` as the debounce window.
    async fn should_emit(
        &self,
        player_id: PlayerId,
        origin_location_id: LocationId,
        direction: Direction,
        window_ms: u64,
    ) -> DebounceResult<ShouldEmitOutcome>;
}

/// Collapses a storage error into the fail-open outcome (`emit: true`),
/// matching §4.10: availability over strict debounce.
pub fn fail_open(result: DebounceResult<ShouldEmitOutcome>) -> ShouldEmitOutcome {
    result.unwrap_or(ShouldEmitOutcome {
        emit: true,
        debounce_hit: false,
    })
}
