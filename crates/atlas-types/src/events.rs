//! World event records and dead letters (§3, §4.7).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{PlayerId, ScopeKey, WorldEventId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Pending,
    Processed,
    Failed,
    DeadLettered,
}

impl EventStatus {
    /// Whether `self -> next` is a legal transition in the monotonic state
    /// machine (§4.7). Terminal states (`Processed`, `DeadLettered`) admit
    /// no outgoing transition.
    pub fn can_transition_to(self, next: EventStatus) -> bool {
        use EventStatus::*;
        matches!(
            (self, next),
            (Pending, Processed) | (Pending, Failed) | (Failed, Pending) | (Failed, DeadLettered)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    Player,
    System,
    Worker,
}

/// An append-only world event record (§3 WorldEventRecord).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldEventRecord {
    pub id: WorldEventId,
    pub scope_key: ScopeKey,
    pub event_type: String,
    pub status: EventStatus,
    pub occurred_utc: DateTime<Utc>,
    pub ingested_utc: DateTime<Utc>,
    pub processed_utc: Option<DateTime<Utc>>,
    pub actor_kind: ActorKind,
    pub actor_id: Option<PlayerId>,
    pub correlation_id: String,
    pub causation_id: Option<String>,
    pub idempotency_key: String,
    pub payload: serde_json::Value,
    pub processing_metadata: Option<serde_json::Value>,
    /// Bumped on every status transition; not part of the immutable
    /// `{id, scopeKey, occurredUtc, idempotencyKey, payload}` set.
    pub version: u64,
}

/// A redacted snapshot of a failed envelope, written when an event reaches
/// `dead_lettered` (§3 DeadLetterRecord). Payload redaction removes
/// player-identifying fields and large blobs; correlation and failure
/// reason survive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadLetterRecord {
    pub original_event_id: WorldEventId,
    pub scope_key: ScopeKey,
    pub event_type: String,
    pub redacted_payload: serde_json::Value,
    pub failure_reason: String,
    pub dead_lettered_utc: DateTime<Utc>,
    pub correlation_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_machine_forbids_backward_transitions() {
        assert!(!EventStatus::Processed.can_transition_to(EventStatus::Pending));
        assert!(!EventStatus::DeadLettered.can_transition_to(EventStatus::Pending));
    }

    #[test]
    fn status_machine_allows_the_documented_forward_paths() {
        assert!(EventStatus::Pending.can_transition_to(EventStatus::Processed));
        assert!(EventStatus::Pending.can_transition_to(EventStatus::Failed));
        assert!(EventStatus::Failed.can_transition_to(EventStatus::Pending));
        assert!(EventStatus::Failed.can_transition_to(EventStatus::DeadLettered));
    }

    #[test]
    fn status_machine_forbids_terminal_to_terminal() {
        assert!(!EventStatus::Processed.can_transition_to(EventStatus::DeadLettered));
    }
}
