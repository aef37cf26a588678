//! The world clock singleton (C4, §4.4).

use async_trait::async_trait;
use atlas_types::WorldClockState;

use crate::error::ClockResult;

/// Outcome of a successful `advance`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvanceOutcome {
    pub state: WorldClockState,
}

/// The world clock: a single monotonically advancing tick counter guarded
/// by an ETag so concurrent advancers detect and retry lost updates rather
/// than silently clobbering each other's `durationMs`.
#[async_trait]
pub trait WorldClock: Send + Sync {
    /// Returns the singleton state, or `None` if `initialize` has never run.
    async fn get(&self) -> ClockResult<Option<WorldClockState>>;

    /// Creates the singleton at `initial_tick`. Fails with
    /// `ClockError::AlreadyInitialized` if one already exists.
    async fn initialize(&self, initial_tick: i64) -> ClockResult<WorldClockState>;

    /// Advances the clock by `duration_ms`, recording `reason` in the
    /// advancement history. `current_etag` must match the stored ETag or
    /// this fails with `ClockError::ConcurrentAdvancement`.
    async fn advance(
        &self,
        duration_ms: i64,
        reason: String,
        current_etag: &str,
    ) -> ClockResult<AdvanceOutcome>;

    /// Replays `advancement_history` to reconstruct the tick in effect at
    /// `timestamp`. Returns `None` for timestamps before initialization.
    async fn get_tick_at(
        &self,
        timestamp: chrono::DateTime<chrono::Utc>,
    ) -> ClockResult<Option<i64>>;
}
