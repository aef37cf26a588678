//! Atlas Players - guest bootstrap, identity linking, and current-location
//! tracking for the player record (§3 Player).
//!
//! `bootstrap` is the idempotent entry point every session starts from: a
//! missing or unparseable `x-player-guid` header mints a fresh guest;
//! a known id returns the existing record untouched (`created = false`).
//! Everything else here is a thin read/update surface the move pipeline
//! and HTTP handlers use to keep a player's `current_location_id` and
//! external identity in sync with the rest of the world.

pub mod error;
pub mod memory;

pub use error::{PlayerError, PlayerResult};
pub use memory::InMemoryPlayerStore;

use async_trait::async_trait;
use atlas_types::{LinkOutcome, LocationId, Player, PlayerId};

/// Outcome of [`PlayerStore::bootstrap`].
#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapOutcome {
    pub player: Player,
    pub created: bool,
}

#[async_trait]
pub trait PlayerStore: Send + Sync {
    /// Looks up `requested_id`; if missing, creates a fresh guest player
    /// at `starter_location_id`. Never fails on an unknown id - that's
    /// the expected path for a first-time visitor.
    async fn bootstrap(
        &self,
        requested_id: Option<PlayerId>,
        starter_location_id: LocationId,
    ) -> PlayerResult<BootstrapOutcome>;

    async fn get(&self, id: PlayerId) -> PlayerResult<Option<Player>>;

    async fn get_by_external_id(&self, external_id: &str) -> PlayerResult<Option<Player>>;

    /// Updates `current_location_id` after a successful move.
    async fn update_location(
        &self,
        id: PlayerId,
        new_location_id: LocationId,
    ) -> PlayerResult<Player>;

    /// Links an external identity onto a guest player (§3 round-trip
    /// law: re-linking the same value is a no-op).
    async fn link_external_id(
        &self,
        id: PlayerId,
        external_id: &str,
    ) -> PlayerResult<(Player, LinkOutcome)>;
}
