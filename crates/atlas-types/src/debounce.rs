//! Exit-hint debounce records (§3 ExitHintDebounceRecord, §4.10).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::direction::Direction;
use crate::ids::{DebounceRecordId, LocationId, PlayerId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitHintDebounceRecord {
    pub id: DebounceRecordId,
    pub player_id: PlayerId,
    pub origin_location_id: LocationId,
    pub direction: Direction,
    pub last_emit_utc: DateTime<Utc>,
    pub ttl_seconds: u64,
}

impl ExitHintDebounceRecord {
    /// The partition-local debounce key: `<player>:<origin>:<dir>`.
    pub fn debounce_key(player_id: PlayerId, origin: LocationId, direction: Direction) -> String {
        format!("{player_id}:{origin}:{direction}")
    }
}
