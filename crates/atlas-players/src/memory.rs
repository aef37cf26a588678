//! In-memory [`PlayerStore`] backed by `dashmap`. Process-local; the
//! `atlas-db` variant is partition-local via Postgres row locking.

use async_trait::async_trait;
use atlas_types::{LinkOutcome, LocationId, Player, PlayerId};
use chrono::Utc;
use dashmap::DashMap;

use crate::error::{PlayerError, PlayerResult};
use crate::{BootstrapOutcome, PlayerStore};

#[derive(Default)]
pub struct InMemoryPlayerStore {
    players: DashMap<PlayerId, Player>,
    external_id_index: DashMap<String, PlayerId>,
}

impl InMemoryPlayerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PlayerStore for InMemoryPlayerStore {
    async fn bootstrap(
        &self,
        requested_id: Option<PlayerId>,
        starter_location_id: LocationId,
    ) -> PlayerResult<BootstrapOutcome> {
        if let Some(id) = requested_id {
            if let Some(existing) = self.players.get(&id) {
                return Ok(BootstrapOutcome {
                    player: existing.clone(),
                    created: false,
                });
            }
        }

        let player = Player::new_guest(starter_location_id, Utc::now());
        self.players.insert(player.id, player.clone());
        Ok(BootstrapOutcome {
            player,
            created: true,
        })
    }

    async fn get(&self, id: PlayerId) -> PlayerResult<Option<Player>> {
        Ok(self.players.get(&id).map(|p| p.clone()))
    }

    async fn get_by_external_id(&self, external_id: &str) -> PlayerResult<Option<Player>> {
        let normalized = external_id.to_lowercase();
        let Some(id) = self.external_id_index.get(&normalized).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self.players.get(&id).map(|p| p.clone()))
    }

    async fn update_location(
        &self,
        id: PlayerId,
        new_location_id: LocationId,
    ) -> PlayerResult<Player> {
        let mut entry = self.players.get_mut(&id).ok_or_else(|| PlayerError::NotFound {
            player_id: id.to_string(),
        })?;
        entry.current_location_id = new_location_id;
        entry.updated_utc = Utc::now();
        Ok(entry.clone())
    }

    async fn link_external_id(
        &self,
        id: PlayerId,
        external_id: &str,
    ) -> PlayerResult<(Player, LinkOutcome)> {
        let normalized = external_id.to_lowercase();
        if let Some(owner) = self.external_id_index.get(&normalized).map(|id| *id) {
            if owner != id {
                return Err(PlayerError::Conflict {
                    existing_player_id: owner.to_string(),
                });
            }
        }

        let mut entry = self.players.get_mut(&id).ok_or_else(|| PlayerError::NotFound {
            player_id: id.to_string(),
        })?;
        let outcome = entry.link_external_id(external_id, Utc::now());
        if matches!(outcome, LinkOutcome::Linked) {
            self.external_id_index.insert(normalized, id);
        }
        Ok((entry.clone(), outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bootstrap_with_no_id_creates_a_guest() {
        let store = InMemoryPlayerStore::new();
        let starter = LocationId::new();
        let outcome = store.bootstrap(None, starter).await.unwrap();
        assert!(outcome.created);
        assert!(outcome.player.guest);
        assert_eq!(outcome.player.current_location_id, starter);
    }

    #[tokio::test]
    async fn bootstrap_with_known_id_is_idempotent() {
        let store = InMemoryPlayerStore::new();
        let starter = LocationId::new();
        let first = store.bootstrap(None, starter).await.unwrap();

        let second = store.bootstrap(Some(first.player.id), starter).await.unwrap();
        assert!(!second.created);
        assert_eq!(second.player.id, first.player.id);
        assert_eq!(second.player.updated_utc, first.player.updated_utc);
    }

    #[tokio::test]
    async fn bootstrap_with_unknown_id_still_creates_a_fresh_guest() {
        let store = InMemoryPlayerStore::new();
        let starter = LocationId::new();
        let ghost = PlayerId::new();
        let outcome = store.bootstrap(Some(ghost), starter).await.unwrap();
        assert!(outcome.created);
        assert_ne!(outcome.player.id, ghost);
    }

    #[tokio::test]
    async fn update_location_persists_the_new_location() {
        let store = InMemoryPlayerStore::new();
        let starter = LocationId::new();
        let outcome = store.bootstrap(None, starter).await.unwrap();
        let next = LocationId::new();

        let updated = store.update_location(outcome.player.id, next).await.unwrap();
        assert_eq!(updated.current_location_id, next);
    }

    #[tokio::test]
    async fn linking_the_same_external_id_twice_is_a_noop() {
        let store = InMemoryPlayerStore::new();
        let outcome = store.bootstrap(None, LocationId::new()).await.unwrap();

        let (_, first) = store
            .link_external_id(outcome.player.id, "Provider:ABC")
            .await
            .unwrap();
        assert_eq!(first, LinkOutcome::Linked);

        let (_, second) = store
            .link_external_id(outcome.player.id, "provider:abc")
            .await
            .unwrap();
        assert_eq!(second, LinkOutcome::NoOp);
    }

    #[tokio::test]
    async fn linking_an_id_already_owned_elsewhere_conflicts() {
        let store = InMemoryPlayerStore::new();
        let a = store.bootstrap(None, LocationId::new()).await.unwrap().player;
        let b = store.bootstrap(None, LocationId::new()).await.unwrap().player;

        store.link_external_id(a.id, "shared").await.unwrap();
        let err = store.link_external_id(b.id, "shared").await.unwrap_err();
        assert!(matches!(err, PlayerError::Conflict { .. }));
    }
}
