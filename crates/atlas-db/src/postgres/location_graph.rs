//! PostgreSQL-backed `LocationGraph` (C3, §4.3).
//!
//! `exits` and `exit_availability` are stored as JSONB rather than
//! normalized into an edge table: the graph is read far more often as
//! "give me this location and all its exits" than it is queried by edge,
//! and the invariants (canonical exit order, single edge per direction)
//! are enforced in Rust the same way `atlas_graph::memory` enforces them,
//! just under a row lock instead of an `RwLock` guard.

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::Row;

use atlas_graph::{
    ApplyExitsOutcome, BidirectionalOptions, EnsureExitBidirectionalOutcome, EnsureExitOutcome,
    ExitBatchItem, GraphError, GraphResult, LocationGraph, MoveFailureReason, MoveOutcome,
    UpsertOutcome,
};
use atlas_types::{Direction, Exit, ExitAvailabilityMetadata, Location, LocationId};

pub struct PgLocationGraph {
    pool: PgPool,
}

impl PgLocationGraph {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn decode_row(
        id: LocationId,
        name: String,
        description: String,
        version: i64,
        exits_json: serde_json::Value,
        exits_summary_cache: Option<String>,
        availability_json: Option<serde_json::Value>,
    ) -> GraphResult<Location> {
        let exits: Vec<Exit> = serde_json::from_value(exits_json).map_err(|e| GraphError::Storage {
            message: format!("corrupt exits JSON for {id}: {e}"),
        })?;
        let exit_availability: Option<ExitAvailabilityMetadata> = availability_json
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| GraphError::Storage {
                message: format!("corrupt exit_availability JSON for {id}: {e}"),
            })?;
        Ok(Location {
            id,
            name,
            description,
            version: version as u64,
            exits,
            exits_summary_cache,
            exit_availability,
        })
    }

    async fn fetch_for_update(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: LocationId,
    ) -> GraphResult<Option<Location>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, description, version, exits, exits_summary_cache, exit_availability
            FROM locations
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| GraphError::Storage {
            message: e.to_string(),
        })?;

        let Some(row) = row else { return Ok(None) };
        let location = Self::decode_row(
            id,
            row.get("name"),
            row.get("description"),
            row.get("version"),
            row.get("exits"),
            row.get("exits_summary_cache"),
            row.get("exit_availability"),
        )?;
        Ok(Some(location))
    }

    async fn write(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        location: &Location,
    ) -> GraphResult<()> {
        let exits_json = serde_json::to_value(&location.exits).map_err(|e| GraphError::Storage {
            message: e.to_string(),
        })?;
        let availability_json = location
            .exit_availability
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| GraphError::Storage {
                message: e.to_string(),
            })?;

        sqlx::query(
            r#"
            INSERT INTO locations (id, name, description, version, exits, exits_summary_cache, exit_availability)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                version = EXCLUDED.version,
                exits = EXCLUDED.exits,
                exits_summary_cache = EXCLUDED.exits_summary_cache,
                exit_availability = EXCLUDED.exit_availability
            "#,
        )
        .bind(location.id.to_string())
        .bind(&location.name)
        .bind(&location.description)
        .bind(location.version as i64)
        .bind(exits_json)
        .bind(&location.exits_summary_cache)
        .bind(availability_json)
        .execute(&mut **tx)
        .await
        .map_err(|e| GraphError::Storage {
            message: e.to_string(),
        })?;

        Ok(())
    }

    fn finish_exit_mutation(location: &mut Location) {
        Location::sort_exits_canonical(&mut location.exits);
        location.regenerate_exits_summary();
    }

    fn ensure_exit_on(
        location: &mut Location,
        direction: Direction,
        to: LocationId,
        description: Option<String>,
    ) -> EnsureExitOutcome {
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
                return EnsureExitOutcome {
                    created: false,
                    description_backfilled: backfilled,
                };
            }
            existing.to_location_id = to;
            existing.description = description;
            Self::finish_exit_mutation(location);
            return EnsureExitOutcome {
                created: true,
                description_backfilled: false,
            };
        }

        location.exits.push(Exit {
            direction,
            to_location_id: to,
            description,
            kind: None,
        });
        Self::finish_exit_mutation(location);
        EnsureExitOutcome {
            created: true,
            description_backfilled: false,
        }
    }
}

#[async_trait]
impl LocationGraph for PgLocationGraph {
    async fn get(&self, id: LocationId) -> GraphResult<Option<Location>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, description, version, exits, exits_summary_cache, exit_availability
            FROM locations
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| GraphError::Storage {
            message: e.to_string(),
        })?;

        let Some(row) = row else { return Ok(None) };
        Ok(Some(Self::decode_row(
            id,
            row.get("name"),
            row.get("description"),
            row.get("version"),
            row.get("exits"),
            row.get("exits_summary_cache"),
            row.get("exit_availability"),
        )?))
    }

    async fn upsert(&self, mut location: Location) -> GraphResult<UpsertOutcome> {
        Location::sort_exits_canonical(&mut location.exits);
        let mut tx = self.pool.begin().await.map_err(|e| GraphError::Storage {
            message: e.to_string(),
        })?;

        let existing = Self::fetch_for_update(&mut tx, location.id).await?;
        let outcome = match existing {
            None => {
                location.regenerate_exits_summary();
                let id = location.id;
                Self::write(&mut tx, &location).await?;
                UpsertOutcome {
                    created: true,
                    id,
                    updated_revision: None,
                }
            }
            Some(mut current) => {
                let content_changed =
                    current.name != location.name || current.description != location.description;
                current.name = location.name;
                current.description = location.description;
                current.exits = location.exits;
                current.exit_availability = location.exit_availability;
                if content_changed {
                    current.version += 1;
                }
                Self::finish_exit_mutation(&mut current);
                Self::write(&mut tx, &current).await?;
                UpsertOutcome {
                    created: false,
                    id: current.id,
                    updated_revision: content_changed.then_some(current.version),
                }
            }
        };

        tx.commit().await.map_err(|e| GraphError::Storage {
            message: e.to_string(),
        })?;
        Ok(outcome)
    }

    async fn move_from(
        &self,
        from: LocationId,
        direction: Direction,
    ) -> GraphResult<Result<MoveOutcome, MoveFailureReason>> {
        let Some(from_location) = self.get(from).await? else {
            return Ok(Err(MoveFailureReason::FromMissing));
        };
        let Some(exit) = from_location.exits.iter().find(|e| e.direction == direction) else {
            return Ok(Err(MoveFailureReason::NoExit));
        };
        let Some(target) = self.get(exit.to_location_id).await? else {
            return Ok(Err(MoveFailureReason::TargetMissing));
        };
        Ok(Ok(MoveOutcome { location: target }))
    }

    async fn ensure_exit(
        &self,
        from: LocationId,
        direction: Direction,
        to: LocationId,
        description: Option<String>,
    ) -> GraphResult<EnsureExitOutcome> {
        let mut tx = self.pool.begin().await.map_err(|e| GraphError::Storage {
            message: e.to_string(),
        })?;
        let mut location = Self::fetch_for_update(&mut tx, from)
            .await?
            .ok_or_else(|| GraphError::NotFound {
                location_id: from.to_string(),
            })?;
        let outcome = Self::ensure_exit_on(&mut location, direction, to, description);
        Self::write(&mut tx, &location).await?;
        tx.commit().await.map_err(|e| GraphError::Storage {
            message: e.to_string(),
        })?;
        Ok(outcome)
    }

    async fn ensure_exit_bidirectional(
        &self,
        from: LocationId,
        direction: Direction,
        to: LocationId,
        options: BidirectionalOptions,
    ) -> GraphResult<EnsureExitBidirectionalOutcome> {
        let mut tx = self.pool.begin().await.map_err(|e| GraphError::Storage {
            message: e.to_string(),
        })?;

        let mut from_location = Self::fetch_for_update(&mut tx, from)
            .await?
            .ok_or_else(|| GraphError::NotFound {
                location_id: from.to_string(),
            })?;
        let forward = Self::ensure_exit_on(
            &mut from_location,
            direction,
            to,
            options.forward_description,
        );
        Self::write(&mut tx, &from_location).await?;

        let reciprocal = if options.reciprocal {
            let mut to_location = Self::fetch_for_update(&mut tx, to)
                .await?
                .ok_or_else(|| GraphError::NotFound {
                    location_id: to.to_string(),
                })?;
            let outcome = Self::ensure_exit_on(
                &mut to_location,
                direction.opposite(),
                from,
                options.reverse_description,
            );
            Self::write(&mut tx, &to_location).await?;
            Some(outcome)
        } else {
            None
        };

        tx.commit().await.map_err(|e| GraphError::Storage {
            message: e.to_string(),
        })?;
        Ok(EnsureExitBidirectionalOutcome {
            forward,
            reciprocal,
        })
    }

    async fn remove_exit(&self, from: LocationId, direction: Direction) -> GraphResult<u32> {
        let mut tx = self.pool.begin().await.map_err(|e| GraphError::Storage {
            message: e.to_string(),
        })?;
        let Some(mut location) = Self::fetch_for_update(&mut tx, from).await? else {
            return Ok(0);
        };
        let before = location.exits.len();
        location.exits.retain(|e| e.direction != direction);
        let removed = (before - location.exits.len()) as u32;
        if removed > 0 {
            Self::finish_exit_mutation(&mut location);
            Self::write(&mut tx, &location).await?;
        }
        tx.commit().await.map_err(|e| GraphError::Storage {
            message: e.to_string(),
        })?;
        Ok(removed)
    }

    async fn apply_exits(&self, batch: Vec<ExitBatchItem>) -> GraphResult<ApplyExitsOutcome> {
        let mut outcome = ApplyExitsOutcome::default();
        let mut tx = self.pool.begin().await.map_err(|e| GraphError::Storage {
            message: e.to_string(),
        })?;

        for item in batch {
            let mut from_location = Self::fetch_for_update(&mut tx, item.from)
                .await?
                .ok_or_else(|| GraphError::NotFound {
                    location_id: item.from.to_string(),
                })?;
            let forward = Self::ensure_exit_on(
                &mut from_location,
                item.direction,
                item.to,
                item.description.clone(),
            );
            Self::write(&mut tx, &from_location).await?;
            if forward.created {
                outcome.exits_created += 1;
            } else {
                outcome.exits_skipped += 1;
            }

            if item.reciprocal {
                let mut to_location = Self::fetch_for_update(&mut tx, item.to)
                    .await?
                    .ok_or_else(|| GraphError::NotFound {
                        location_id: item.to.to_string(),
                    })?;
                let reverse =
                    Self::ensure_exit_on(&mut to_location, item.direction.opposite(), item.from, None);
                Self::write(&mut tx, &to_location).await?;
                if reverse.created {
                    outcome.reciprocal_applied += 1;
                }
            }
        }

        tx.commit().await.map_err(|e| GraphError::Storage {
            message: e.to_string(),
        })?;
        Ok(outcome)
    }

    async fn list_all(&self) -> GraphResult<Vec<Location>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, description, version, exits, exits_summary_cache, exit_availability
            FROM locations
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| GraphError::Storage {
            message: e.to_string(),
        })?;

        rows.into_iter()
            .map(|row| {
                let id_str: String = row.get("id");
                let id = LocationId::parse(&id_str).map_err(|_| GraphError::Storage {
                    message: format!("corrupt location id in storage: {id_str}"),
                })?;
                Self::decode_row(
                    id,
                    row.get("name"),
                    row.get("description"),
                    row.get("version"),
                    row.get("exits"),
                    row.get("exits_summary_cache"),
                    row.get("exit_availability"),
                )
            })
            .collect()
    }

    async fn delete_location(&self, id: LocationId) -> GraphResult<bool> {
        let result = sqlx::query("DELETE FROM locations WHERE id = $1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| GraphError::Storage {
                message: e.to_string(),
            })?;
        Ok(result.rows_affected() > 0)
    }
}
