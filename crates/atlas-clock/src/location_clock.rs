//! Per-location clock anchors (C5, §4.5).

use async_trait::async_trait;
use atlas_types::{LocationClockState, LocationId};

use crate::error::ClockResult;

/// Outcome of `get_location_anchor`: distinguishes a pre-existing anchor
/// from one created by this call, so callers can decide whether to emit
/// `Location.Clock.Initialized`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorOutcome {
    pub state: LocationClockState,
    pub freshly_initialized: bool,
}

/// The set of per-location clock anchors, each independently advanceable
/// and lazily created on first read at the world clock's current tick.
#[async_trait]
pub trait LocationClock: Send + Sync {
    /// Returns the anchor for `location_id`, lazily initializing it to
    /// `world_tick` if this location has never been observed before.
    async fn get_location_anchor(
        &self,
        location_id: LocationId,
        world_tick: i64,
    ) -> ClockResult<AnchorOutcome>;

    /// Upserts the anchor for `location_id` to `tick`. Auto-initializes if
    /// missing; otherwise requires the current ETag to match.
    async fn sync_location(
        &self,
        location_id: LocationId,
        tick: i64,
        current_etag: Option<&str>,
    ) -> ClockResult<LocationClockState>;

    /// Syncs every anchor that already exists to `tick`, at bounded
    /// concurrency. Does not manufacture anchors for locations that have
    /// never been observed; returns the count of anchors synced.
    async fn batch_update_all(&self, tick: i64) -> ClockResult<usize>;
}
