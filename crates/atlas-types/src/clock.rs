//! World clock and location clock state (§3, §4.4, §4.5).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::LocationId;

/// A single entry in the world clock's append-only advancement history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvancementEntry {
    pub timestamp: DateTime<Utc>,
    pub duration_ms: i64,
    pub reason: String,
    pub tick_after: i64,
}

/// The singleton world clock record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldClockState {
    pub current_tick: i64,
    pub last_advanced: DateTime<Utc>,
    pub advancement_history: Vec<AdvancementEntry>,
    pub etag: String,
}

/// A per-location tick anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationClockState {
    pub location_id: LocationId,
    pub clock_anchor: i64,
    pub last_synced: DateTime<Utc>,
    pub etag: String,
}
