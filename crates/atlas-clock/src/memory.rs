//! In-memory implementations of [`WorldClock`] and [`LocationClock`].
//!
//! Durable ("cosmos") implementations backed by Postgres live in
//! `atlas-db`; these are the process-local reference implementations used
//! by tests and by `services/atlas-server` when run without a database.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use atlas_types::{AdvancementEntry, LocationClockState, LocationId, WorldClockState};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{ClockError, ClockResult};
use crate::location_clock::{AnchorOutcome, LocationClock};
use crate::world_clock::{AdvanceOutcome, WorldClock};

/// Bound on concurrent writes during `batch_update_all`, matching the
/// reference stack's connection-pool-sized fan-out.
const BATCH_CONCURRENCY: usize = 50;

fn fresh_etag() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Default)]
pub struct InMemoryWorldClock {
    state: Arc<RwLock<Option<WorldClockState>>>,
}

impl InMemoryWorldClock {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorldClock for InMemoryWorldClock {
    async fn get(&self) -> ClockResult<Option<WorldClockState>> {
        Ok(self.state.read().await.clone())
    }

    async fn initialize(&self, initial_tick: i64) -> ClockResult<WorldClockState> {
        let mut guard = self.state.write().await;
        if guard.is_some() {
            return Err(ClockError::AlreadyInitialized);
        }
        let created = WorldClockState {
            current_tick: initial_tick,
            last_advanced: Utc::now(),
            advancement_history: Vec::new(),
            etag: fresh_etag(),
        };
        *guard = Some(created.clone());
        Ok(created)
    }

    async fn advance(
        &self,
        duration_ms: i64,
        reason: String,
        current_etag: &str,
    ) -> ClockResult<AdvanceOutcome> {
        if duration_ms <= 0 {
            return Err(ClockError::InvalidDuration);
        }
        let mut guard = self.state.write().await;
        let existing = guard.as_mut().ok_or(ClockError::Uninitialized)?;
        if existing.etag != current_etag {
            return Err(ClockError::ConcurrentAdvancement);
        }
        let now = Utc::now();
        existing.current_tick += duration_ms;
        existing.advancement_history.push(AdvancementEntry {
            timestamp: now,
            duration_ms,
            reason,
            tick_after: existing.current_tick,
        });
        existing.last_advanced = now;
        existing.etag = fresh_etag();
        Ok(AdvanceOutcome {
            state: existing.clone(),
        })
    }

    async fn get_tick_at(
        &self,
        timestamp: chrono::DateTime<chrono::Utc>,
    ) -> ClockResult<Option<i64>> {
        let guard = self.state.read().await;
        let Some(state) = guard.as_ref() else {
            return Ok(None);
        };
        // The history is append-only in chronological order; the tick in
        // effect at `timestamp` is the `tick_after` of the last entry at or
        // before it, or `None` if `timestamp` predates initialization.
        let mut result = None;
        for entry in &state.advancement_history {
            if entry.timestamp <= timestamp {
                result = Some(entry.tick_after);
            } else {
                break;
            }
        }
        Ok(result)
    }
}

#[derive(Default)]
pub struct InMemoryLocationClock {
    anchors: Arc<RwLock<HashMap<LocationId, LocationClockState>>>,
}

impl InMemoryLocationClock {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LocationClock for InMemoryLocationClock {
    async fn get_location_anchor(
        &self,
        location_id: LocationId,
        world_tick: i64,
    ) -> ClockResult<AnchorOutcome> {
        {
            let guard = self.anchors.read().await;
            if let Some(existing) = guard.get(&location_id) {
                return Ok(AnchorOutcome {
                    state: existing.clone(),
                    freshly_initialized: false,
                });
            }
        }
        let mut guard = self.anchors.write().await;
        // Re-check: another task may have initialized this anchor between
        // the read lock release above and acquiring the write lock.
        if let Some(existing) = guard.get(&location_id) {
            return Ok(AnchorOutcome {
                state: existing.clone(),
                freshly_initialized: false,
            });
        }
        let created = LocationClockState {
            location_id,
            clock_anchor: world_tick,
            last_synced: Utc::now(),
            etag: fresh_etag(),
        };
        guard.insert(location_id, created.clone());
        Ok(AnchorOutcome {
            state: created,
            freshly_initialized: true,
        })
    }

    async fn sync_location(
        &self,
        location_id: LocationId,
        tick: i64,
        current_etag: Option<&str>,
    ) -> ClockResult<LocationClockState> {
        let mut guard = self.anchors.write().await;
        match guard.get_mut(&location_id) {
            None => {
                let created = LocationClockState {
                    location_id,
                    clock_anchor: tick,
                    last_synced: Utc::now(),
                    etag: fresh_etag(),
                };
                guard.insert(location_id, created.clone());
                Ok(created)
            }
            Some(existing) => {
                if let Some(expected) = current_etag {
                    if existing.etag != expected {
                        return Err(ClockError::ConcurrentAdvancement);
                    }
                }
                existing.clock_anchor = tick;
                existing.last_synced = Utc::now();
                existing.etag = fresh_etag();
                Ok(existing.clone())
            }
        }
    }

    async fn batch_update_all(&self, tick: i64) -> ClockResult<usize> {
        let existing_ids: Vec<LocationId> = {
            let guard = self.anchors.read().await;
            guard.keys().copied().collect()
        };
        let results = stream::iter(existing_ids.into_iter().map(|location_id| async move {
            self.sync_location(location_id, tick, None).await
        }))
        .buffer_unordered(BATCH_CONCURRENCY)
        .collect::<Vec<_>>()
        .await;

        let mut synced = 0usize;
        for result in results {
            result?;
            synced += 1;
        }
        Ok(synced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn initialize_then_reinitialize_fails() {
        let clock = InMemoryWorldClock::new();
        clock.initialize(0).await.unwrap();
        let err = clock.initialize(0).await.unwrap_err();
        assert!(matches!(err, ClockError::AlreadyInitialized));
    }

    #[tokio::test]
    async fn get_before_initialize_is_none() {
        let clock = InMemoryWorldClock::new();
        assert!(clock.get().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn advance_rejects_non_positive_duration() {
        let clock = InMemoryWorldClock::new();
        let state = clock.initialize(0).await.unwrap();
        let err = clock
            .advance(0, "tick".to_string(), &state.etag)
            .await
            .unwrap_err();
        assert!(matches!(err, ClockError::InvalidDuration));
    }

    #[tokio::test]
    async fn advance_commits_and_rotates_etag() {
        let clock = InMemoryWorldClock::new();
        let state = clock.initialize(0).await.unwrap();
        let outcome = clock
            .advance(1000, "scheduler tick".to_string(), &state.etag)
            .await
            .unwrap();
        assert_eq!(outcome.state.current_tick, 1000);
        assert_eq!(outcome.state.advancement_history.len(), 1);
        assert_ne!(outcome.state.etag, state.etag);
    }

    #[tokio::test]
    async fn advance_with_stale_etag_is_concurrent_advancement() {
        let clock = InMemoryWorldClock::new();
        let state = clock.initialize(0).await.unwrap();
        clock
            .advance(500, "first".to_string(), &state.etag)
            .await
            .unwrap();
        let err = clock
            .advance(500, "stale retry".to_string(), &state.etag)
            .await
            .unwrap_err();
        assert!(matches!(err, ClockError::ConcurrentAdvancement));
    }

    #[tokio::test]
    async fn get_tick_at_replays_history() {
        let clock = InMemoryWorldClock::new();
        let state = clock.initialize(0).await.unwrap();
        let before_any_advance = Utc::now() - chrono::Duration::seconds(10);
        let first = clock
            .advance(100, "a".to_string(), &state.etag)
            .await
            .unwrap();
        let after_first = Utc::now();

        assert_eq!(clock.get_tick_at(before_any_advance).await.unwrap(), None);
        assert_eq!(
            clock.get_tick_at(after_first).await.unwrap(),
            Some(first.state.current_tick)
        );
    }

    #[tokio::test]
    async fn location_anchor_lazily_initializes_once() {
        let clock = InMemoryLocationClock::new();
        let loc = LocationId::new();
        let first = clock.get_location_anchor(loc, 42).await.unwrap();
        assert!(first.freshly_initialized);
        assert_eq!(first.state.clock_anchor, 42);

        let second = clock.get_location_anchor(loc, 999).await.unwrap();
        assert!(!second.freshly_initialized);
        assert_eq!(second.state.clock_anchor, 42);
    }

    #[tokio::test]
    async fn sync_location_auto_initializes_when_missing() {
        let clock = InMemoryLocationClock::new();
        let loc = LocationId::new();
        let synced = clock.sync_location(loc, 7, None).await.unwrap();
        assert_eq!(synced.clock_anchor, 7);
    }

    #[tokio::test]
    async fn sync_location_rejects_stale_etag() {
        let clock = InMemoryLocationClock::new();
        let loc = LocationId::new();
        let created = clock.sync_location(loc, 1, None).await.unwrap();
        clock
            .sync_location(loc, 2, Some(&created.etag))
            .await
            .unwrap();
        let err = clock
            .sync_location(loc, 3, Some(&created.etag))
            .await
            .unwrap_err();
        assert!(matches!(err, ClockError::ConcurrentAdvancement));
    }

    #[tokio::test]
    async fn batch_update_all_skips_never_observed_locations() {
        let clock = InMemoryLocationClock::new();
        let observed = LocationId::new();
        clock.sync_location(observed, 0, None).await.unwrap();
        // `unobserved` never synced; batch_update_all must not create it.
        let _unobserved = LocationId::new();

        let count = clock.batch_update_all(500).await.unwrap();
        assert_eq!(count, 1);
        let state = clock
            .get_location_anchor(observed, 999)
            .await
            .unwrap()
            .state;
        assert_eq!(state.clock_anchor, 500);
    }
}
