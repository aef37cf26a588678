//! In-memory `LocationGraph`, for tests and single-process development.
//!
//! Modeled on the reference ledger's `Arc<RwLock<HashMap<_, _>>>` shape:
//! one lock-guarded collection, invariants (canonical exit order, exit
//! uniqueness, summary-cache regeneration) enforced at every write site
//! rather than trusted to callers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use atlas_types::{Direction, Exit, Location, LocationId};
use tokio::sync::RwLock;

use crate::{
    ApplyExitsOutcome, BidirectionalOptions, EnsureExitBidirectionalOutcome, EnsureExitOutcome,
    ExitBatchItem, GraphError, GraphResult, LocationGraph, MoveFailureReason, MoveOutcome,
    UpsertOutcome,
};

#[derive(Clone, Default)]
pub struct InMemoryLocationGraph {
    locations: Arc<RwLock<HashMap<LocationId, Location>>>,
}

impl InMemoryLocationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn finish_exit_mutation(location: &mut Location) {
        Location::sort_exits_canonical(&mut location.exits);
        location.regenerate_exits_summary();
    }

    /// Idempotent create-or-backfill of a single edge, assuming the lock
    /// is already held by the caller. Existing edge with the same
    /// `(from, dir, to)` yields `created=false`; a differing description
    /// backfills only if previously absent; an edge at the same direction
    /// pointing elsewhere is replaced (directions are unique per
    /// location, so a second intent at the same direction supersedes the
    /// first rather than silently failing).
    fn ensure_exit_locked(
        locations: &mut HashMap<LocationId, Location>,
        from: LocationId,
        direction: Direction,
        to: LocationId,
        description: Option<String>,
    ) -> GraphResult<EnsureExitOutcome> {
        let location = locations.get_mut(&from).ok_or_else(|| GraphError::NotFound {
            location_id: from.to_string(),
        })?;

        if let Some(existing) = location.exits.iter_mut().find(|e| e.direction == direction) {
            if existing.to_location_id == to {
                let mut backfilled = false;
                if existing.description.is_none() && description.is_some() {
                    existing.description = description;
                    backfilled = true;
                }
                if backfilled {
                    Self::finish_exit_mutation(location);
                }
                return Ok(EnsureExitOutcome {
                    created: false,
                    description_backfilled: backfilled,
                });
            }
            existing.to_location_id = to;
            existing.description = description;
            Self::finish_exit_mutation(location);
            return Ok(EnsureExitOutcome {
                created: true,
                description_backfilled: false,
            });
        }

        location.exits.push(Exit {
            direction,
            to_location_id: to,
            description,
            kind: None,
        });
        Self::finish_exit_mutation(location);
        Ok(EnsureExitOutcome {
            created: true,
            description_backfilled: false,
        })
    }
}

#[async_trait]
impl LocationGraph for InMemoryLocationGraph {
    async fn get(&self, id: LocationId) -> GraphResult<Option<Location>> {
        Ok(self.locations.read().await.get(&id).cloned())
    }

    async fn upsert(&self, mut location: Location) -> GraphResult<UpsertOutcome> {
        Location::sort_exits_canonical(&mut location.exits);
        let mut locations = self.locations.write().await;

        match locations.get_mut(&location.id) {
            None => {
                let id = location.id;
                location.regenerate_exits_summary();
                locations.insert(id, location);
                Ok(UpsertOutcome {
                    created: true,
                    id,
                    updated_revision: None,
                })
            }
            Some(existing) => {
                let content_changed =
                    existing.name != location.name || existing.description != location.description;
                existing.name = location.name;
                existing.description = location.description;
                existing.exits = location.exits;
                existing.exit_availability = location.exit_availability;
                if content_changed {
                    existing.version += 1;
                }
                Self::finish_exit_mutation(existing);
                Ok(UpsertOutcome {
                    created: false,
                    id: existing.id,
                    updated_revision: content_changed.then_some(existing.version),
                })
            }
        }
    }

    async fn move_from(
        &self,
        from: LocationId,
        direction: Direction,
    ) -> GraphResult<Result<MoveOutcome, MoveFailureReason>> {
        let locations = self.locations.read().await;
        let Some(from_location) = locations.get(&from) else {
            return Ok(Err(MoveFailureReason::FromMissing));
        };
        let Some(exit) = from_location.exits.iter().find(|e| e.direction == direction) else {
            return Ok(Err(MoveFailureReason::NoExit));
        };
        let Some(target) = locations.get(&exit.to_location_id) else {
            return Ok(Err(MoveFailureReason::TargetMissing));
        };
        Ok(Ok(MoveOutcome {
            location: target.clone(),
        }))
    }

    async fn ensure_exit(
        &self,
        from: LocationId,
        direction: Direction,
        to: LocationId,
        description: Option<String>,
    ) -> GraphResult<EnsureExitOutcome> {
        let mut locations = self.locations.write().await;
        Self::ensure_exit_locked(&mut locations, from, direction, to, description)
    }

    async fn ensure_exit_bidirectional(
        &self,
        from: LocationId,
        direction: Direction,
        to: LocationId,
        options: BidirectionalOptions,
    ) -> GraphResult<EnsureExitBidirectionalOutcome> {
        let mut locations = self.locations.write().await;
        let forward = Self::ensure_exit_locked(
            &mut locations,
            from,
            direction,
            to,
            options.forward_description,
        )?;

        let reciprocal = if options.reciprocal {
            Some(Self::ensure_exit_locked(
                &mut locations,
                to,
                direction.opposite(),
                from,
                options.reverse_description,
            )?)
        } else {
            None
        };

        Ok(EnsureExitBidirectionalOutcome {
            forward,
            reciprocal,
        })
    }

    async fn remove_exit(&self, from: LocationId, direction: Direction) -> GraphResult<u32> {
        let mut locations = self.locations.write().await;
        let Some(location) = locations.get_mut(&from) else {
            return Ok(0);
        };
        let before = location.exits.len();
        location.exits.retain(|e| e.direction != direction);
        let removed = (before - location.exits.len()) as u32;
        if removed > 0 {
            Self::finish_exit_mutation(location);
        }
        Ok(removed)
    }

    async fn apply_exits(&self, batch: Vec<ExitBatchItem>) -> GraphResult<ApplyExitsOutcome> {
        let mut outcome = ApplyExitsOutcome::default();
        let mut locations = self.locations.write().await;

        for item in batch {
            let forward = Self::ensure_exit_locked(
                &mut locations,
                item.from,
                item.direction,
                item.to,
                item.description.clone(),
            )?;
            if forward.created {
                outcome.exits_created += 1;
            } else {
                outcome.exits_skipped += 1;
            }

            if item.reciprocal {
                let reverse = Self::ensure_exit_locked(
                    &mut locations,
                    item.to,
                    item.direction.opposite(),
                    item.from,
                    None,
                )?;
                if reverse.created {
                    outcome.reciprocal_applied += 1;
                }
            }
        }

        Ok(outcome)
    }

    async fn list_all(&self) -> GraphResult<Vec<Location>> {
        Ok(self.locations.read().await.values().cloned().collect())
    }

    async fn delete_location(&self, id: LocationId) -> GraphResult<bool> {
        Ok(self.locations.write().await.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_location(name: &str) -> Location {
        Location::new(LocationId::new(), name, format!("{name} description"))
    }

    #[tokio::test]
    async fn upsert_twice_is_a_no_op_on_unchanged_content() {
        let graph = InMemoryLocationGraph::new();
        let loc = new_location("Plaza");
        let first = graph.upsert(loc.clone()).await.unwrap();
        assert!(first.created);

        let second = graph.upsert(loc).await.unwrap();
        assert!(!second.created);
        assert_eq!(second.updated_revision, None);
    }

    #[tokio::test]
    async fn upsert_bumps_version_only_when_name_or_description_changes() {
        let graph = InMemoryLocationGraph::new();
        let mut loc = new_location("Plaza");
        graph.upsert(loc.clone()).await.unwrap();

        loc.name = "Grand Plaza".to_string();
        let outcome = graph.upsert(loc.clone()).await.unwrap();
        assert_eq!(outcome.updated_revision, Some(2));

        // Re-upserting the same content again is a no-op.
        let outcome2 = graph.upsert(loc).await.unwrap();
        assert_eq!(outcome2.updated_revision, None);
    }

    #[tokio::test]
    async fn ensure_exit_twice_is_idempotent() {
        let graph = InMemoryLocationGraph::new();
        let a = new_location("A");
        let b = new_location("B");
        let (a_id, b_id) = (a.id, b.id);
        graph.upsert(a).await.unwrap();
        graph.upsert(b).await.unwrap();

        let first = graph
            .ensure_exit(a_id, Direction::North, b_id, None)
            .await
            .unwrap();
        assert!(first.created);

        let second = graph
            .ensure_exit(a_id, Direction::North, b_id, None)
            .await
            .unwrap();
        assert!(!second.created);
    }

    #[tokio::test]
    async fn ensure_exit_backfills_description_only_when_previously_absent() {
        let graph = InMemoryLocationGraph::new();
        let a = new_location("A");
        let b = new_location("B");
        let (a_id, b_id) = (a.id, b.id);
        graph.upsert(a).await.unwrap();
        graph.upsert(b).await.unwrap();

        graph
            .ensure_exit(a_id, Direction::North, b_id, None)
            .await
            .unwrap();
        let backfilled = graph
            .ensure_exit(a_id, Direction::North, b_id, Some("a gate".to_string()))
            .await
            .unwrap();
        assert!(backfilled.description_backfilled);

        let not_backfilled_again = graph
            .ensure_exit(a_id, Direction::North, b_id, Some("a different gate".to_string()))
            .await
            .unwrap();
        assert!(!not_backfilled_again.description_backfilled);
    }

    #[tokio::test]
    async fn ensure_exit_bidirectional_creates_the_reciprocal_using_the_opposite_table() {
        let graph = InMemoryLocationGraph::new();
        let a = new_location("A");
        let b = new_location("B");
        let (a_id, b_id) = (a.id, b.id);
        graph.upsert(a).await.unwrap();
        graph.upsert(b).await.unwrap();

        graph
            .ensure_exit_bidirectional(
                a_id,
                Direction::North,
                b_id,
                BidirectionalOptions {
                    reciprocal: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let b_loc = graph.get(b_id).await.unwrap().unwrap();
        assert!(b_loc.exits.iter().any(|e| e.direction == Direction::South && e.to_location_id == a_id));
    }

    #[tokio::test]
    async fn move_from_reports_from_missing() {
        let graph = InMemoryLocationGraph::new();
        let result = graph
            .move_from(LocationId::new(), Direction::North)
            .await
            .unwrap();
        assert_eq!(result, Err(MoveFailureReason::FromMissing));
    }

    #[tokio::test]
    async fn move_from_reports_no_exit() {
        let graph = InMemoryLocationGraph::new();
        let a = new_location("A");
        let a_id = a.id;
        graph.upsert(a).await.unwrap();
        let result = graph.move_from(a_id, Direction::North).await.unwrap();
        assert_eq!(result, Err(MoveFailureReason::NoExit));
    }

    #[tokio::test]
    async fn move_from_succeeds_and_returns_the_target_location() {
        let graph = InMemoryLocationGraph::new();
        let a = new_location("A");
        let b = new_location("B");
        let (a_id, b_id) = (a.id, b.id);
        graph.upsert(a).await.unwrap();
        graph.upsert(b).await.unwrap();
        graph
            .ensure_exit(a_id, Direction::North, b_id, None)
            .await
            .unwrap();

        let result = graph.move_from(a_id, Direction::North).await.unwrap();
        assert_eq!(result.unwrap().location.id, b_id);
    }

    #[tokio::test]
    async fn remove_exit_regenerates_the_summary_cache() {
        let graph = InMemoryLocationGraph::new();
        let a = new_location("A");
        let b = new_location("B");
        let (a_id, b_id) = (a.id, b.id);
        graph.upsert(a).await.unwrap();
        graph.upsert(b).await.unwrap();
        graph
            .ensure_exit(a_id, Direction::North, b_id, None)
            .await
            .unwrap();

        let removed = graph.remove_exit(a_id, Direction::North).await.unwrap();
        assert_eq!(removed, 1);

        let a_loc = graph.get(a_id).await.unwrap().unwrap();
        assert_eq!(a_loc.exits_summary_cache.as_deref(), Some("No exits available."));
    }

    #[tokio::test]
    async fn apply_exits_aggregates_created_skipped_and_reciprocal_counts() {
        let graph = InMemoryLocationGraph::new();
        let a = new_location("A");
        let b = new_location("B");
        let (a_id, b_id) = (a.id, b.id);
        graph.upsert(a).await.unwrap();
        graph.upsert(b).await.unwrap();

        let batch = vec![ExitBatchItem {
            from: a_id,
            direction: Direction::East,
            to: b_id,
            description: None,
            reciprocal: true,
        }];
        let outcome = graph.apply_exits(batch.clone()).await.unwrap();
        assert_eq!(outcome.exits_created, 1);
        assert_eq!(outcome.reciprocal_applied, 1);

        let outcome2 = graph.apply_exits(batch).await.unwrap();
        assert_eq!(outcome2.exits_skipped, 1);
        assert_eq!(outcome2.reciprocal_applied, 0);
    }
}
