//! The heading store: one canonical direction remembered per player, used
//! to resolve relative tokens (`left`/`right`/`back`) in the next move
//! (§5 Shared state). Explicitly single-process: a horizontally scaled
//! deployment needs a partition-local or durable variant, which this
//! crate does not provide.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use atlas_types::{Direction, PlayerId};
use tokio::sync::RwLock;

/// Remembers the last canonical direction each player moved in.
#[async_trait]
pub trait HeadingStore: Send + Sync {
    async fn get(&self, player_id: PlayerId) -> Option<Direction>;
    async fn set(&self, player_id: PlayerId, direction: Direction);
}

/// `Arc<RwLock<HashMap>>` enforces the single-writer-per-player invariant
/// the same way every other in-memory store in this workspace does.
#[derive(Default)]
pub struct InMemoryHeadingStore {
    headings: Arc<RwLock<HashMap<PlayerId, Direction>>>,
}

impl InMemoryHeadingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HeadingStore for InMemoryHeadingStore {
    async fn get(&self, player_id: PlayerId) -> Option<Direction> {
        self.headings.read().await.get(&player_id).copied()
    }

    async fn set(&self, player_id: PlayerId, direction: Direction) {
        self.headings.write().await.insert(player_id, direction);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unset_player_has_no_heading() {
        let store = InMemoryHeadingStore::new();
        assert_eq!(store.get(PlayerId::new()).await, None);
    }

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let store = InMemoryHeadingStore::new();
        let player = PlayerId::new();
        store.set(player, Direction::East).await;
        assert_eq!(store.get(player).await, Some(Direction::East));
    }
}
