//! Player records (§3 Data model: Player).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::direction::Direction;
use crate::ids::{LocationId, PlayerId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
    pub guest: bool,
    /// Provider-qualified, lower-cased, unique when present. Immutable
    /// once set - see `Player::link_external_id`.
    pub external_id: Option<String>,
    pub current_location_id: LocationId,
    pub name: Option<String>,
    pub clock_tick: Option<i64>,
    pub attributes: Option<serde_json::Value>,
    pub inventory_version: Option<u64>,
    /// The last canonical direction this player moved; used to resolve
    /// relative direction tokens on the next move (§Glossary Heading).
    pub heading: Option<Direction>,
}

impl Player {
    pub fn new_guest(starter_location: LocationId, now: DateTime<Utc>) -> Self {
        Self {
            id: PlayerId::new(),
            created_utc: now,
            updated_utc: now,
            guest: true,
            external_id: None,
            current_location_id: starter_location,
            name: None,
            clock_tick: None,
            attributes: None,
            inventory_version: None,
            heading: None,
        }
    }

    /// Outcome of attempting to link an external identity (§3 Player,
    /// round-trip law in §8: re-linking the same value is a no-op).
    pub fn link_external_id(&mut self, external_id: &str, now: DateTime<Utc>) -> LinkOutcome {
        let normalized = external_id.to_lowercase();
        match &self.external_id {
            None => {
                self.external_id = Some(normalized);
                self.guest = false;
                self.updated_utc = now;
                LinkOutcome::Linked
            }
            Some(existing) if *existing == normalized => LinkOutcome::NoOp,
            Some(existing) => LinkOutcome::Conflict {
                existing_external_id: existing.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    Linked,
    NoOp,
    Conflict { existing_external_id: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relinking_same_external_id_is_idempotent_noop() {
        let mut p = Player::new_guest(LocationId::new(), Utc::now());
        let first = p.link_external_id("Provider:ABC", Utc::now());
        assert_eq!(first, LinkOutcome::Linked);
        assert!(!p.guest);
        let updated_at = p.updated_utc;

        let second = p.link_external_id("provider:abc", Utc::now());
        assert_eq!(second, LinkOutcome::NoOp);
        assert_eq!(p.updated_utc, updated_at);
    }

    #[test]
    fn relinking_a_different_external_id_conflicts() {
        let mut p = Player::new_guest(LocationId::new(), Utc::now());
        p.link_external_id("provider:abc", Utc::now());
        let outcome = p.link_external_id("provider:xyz", Utc::now());
        assert_eq!(
            outcome,
            LinkOutcome::Conflict {
                existing_external_id: "provider:abc".to_string()
            }
        );
    }
}
