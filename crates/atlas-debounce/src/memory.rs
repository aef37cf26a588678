//! In-memory [`ExitHintDebouncer`] backed by `dashmap`. Explicitly
//! process-local: a horizontally scaled deployment needs the `atlas-db`
//! variant, which is partition-local via the durable backend's partition
//! key rather than tied to a single process's memory.

use async_trait::async_trait;
use atlas_types::{Direction, ExitHintDebounceRecord, LocationId, PlayerId};
use chrono::Utc;
use dashmap::DashMap;

use crate::error::DebounceResult;
use crate::{ExitHintDebouncer, ShouldEmitOutcome, TTL_MARGIN_SECONDS};

#[derive(Default)]
pub struct InMemoryExitHintDebouncer {
    records: DashMap<String, ExitHintDebounceRecord>,
}

impl InMemoryExitHintDebouncer {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExitHintDebouncer for InMemoryExitHintDebouncer {
    async fn should_emit(
        &self,
        player_id: PlayerId,
        origin_location_id: LocationId,
        direction: Direction,
        window_ms: u64,
    ) -> DebounceResult<ShouldEmitOutcome> {
        let key = ExitHintDebounceRecord::debounce_key(player_id, origin_location_id, direction);
        let now = Utc::now();

        if let Some(existing) = self.records.get(&key) {
            let elapsed_ms = (now - existing.last_emit_utc).num_milliseconds().max(0) as u64;
            if elapsed_ms < window_ms {
                return Ok(ShouldEmitOutcome {
                    emit: false,
                    debounce_hit: true,
                });
            }
        }

        let ttl_seconds = window_ms.div_ceil(1000) + TTL_MARGIN_SECONDS;
        self.records.insert(
            key,
            ExitHintDebounceRecord {
                id: atlas_types::DebounceRecordId::new(),
                player_id,
                origin_location_id,
                direction,
                last_emit_utc: now,
                ttl_seconds,
            },
        );
        Ok(ShouldEmitOutcome {
            emit: true,
            debounce_hit: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_call_always_emits() {
        let debouncer = InMemoryExitHintDebouncer::new();
        let outcome = debouncer
            .should_emit(PlayerId::new(), LocationId::new(), Direction::North, 60_000)
            .await
            .unwrap();
        assert!(outcome.emit);
        assert!(!outcome.debounce_hit);
    }

    #[tokio::test]
    async fn second_call_within_window_is_suppressed() {
        let debouncer = InMemoryExitHintDebouncer::new();
        let player = PlayerId::new();
        let origin = LocationId::new();
        debouncer
            .should_emit(player, origin, Direction::North, 60_000)
            .await
            .unwrap();
        let second = debouncer
            .should_emit(player, origin, Direction::North, 60_000)
            .await
            .unwrap();
        assert!(!second.emit);
        assert!(second.debounce_hit);
    }

    #[tokio::test]
    async fn distinct_directions_are_independent() {
        let debouncer = InMemoryExitHintDebouncer::new();
        let player = PlayerId::new();
        let origin = LocationId::new();
        debouncer
            .should_emit(player, origin, Direction::North, 60_000)
            .await
            .unwrap();
        let south = debouncer
            .should_emit(player, origin, Direction::South, 60_000)
            .await
            .unwrap();
        assert!(south.emit);
    }

    #[tokio::test]
    async fn zero_window_never_suppresses() {
        let debouncer = InMemoryExitHintDebouncer::new();
        let player = PlayerId::new();
        let origin = LocationId::new();
        debouncer
            .should_emit(player, origin, Direction::North, 0)
            .await
            .unwrap();
        let second = debouncer
            .should_emit(player, origin, Direction::North, 0)
            .await
            .unwrap();
        assert!(second.emit);
    }
}
