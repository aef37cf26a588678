//! PostgreSQL-backed [`WorldClock`] and [`LocationClock`] (C4, C5, §4.4-4.5).
//!
//! Both tables store `etag` as a plain column; `advance`/`sync_location`
//! re-read the row `FOR UPDATE` inside a transaction and compare etags
//! before writing, which is the same optimistic-concurrency check the
//! in-memory implementation makes under its `RwLock` write guard.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use atlas_clock::{AdvanceOutcome, AnchorOutcome, ClockError, ClockResult, LocationClock, WorldClock};
use atlas_types::{AdvancementEntry, LocationClockState, LocationId, WorldClockState};

fn fresh_etag() -> String {
    Uuid::new_v4().to_string()
}

fn storage_err(e: sqlx::Error) -> ClockError {
    ClockError::Storage {
        message: e.to_string(),
    }
}

pub struct PgWorldClock {
    pool: PgPool,
}

impl PgWorldClock {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn decode(row: &sqlx::postgres::PgRow) -> ClockResult<WorldClockState> {
        let history_json: serde_json::Value = row.get("advancement_history");
        let advancement_history: Vec<AdvancementEntry> =
            serde_json::from_value(history_json).map_err(|e| ClockError::Storage {
                message: e.to_string(),
            })?;
        Ok(WorldClockState {
            current_tick: row.get("current_tick"),
            last_advanced: row.get("last_advanced"),
            advancement_history,
            etag: row.get("etag"),
        })
    }
}

#[async_trait]
impl WorldClock for PgWorldClock {
    async fn get(&self) -> ClockResult<Option<WorldClockState>> {
        let row = sqlx::query(
            "SELECT current_tick, last_advanced, advancement_history, etag FROM world_clock WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;
        row.as_ref().map(Self::decode).transpose()
    }

    async fn initialize(&self, initial_tick: i64) -> ClockResult<WorldClockState> {
        let existing = sqlx::query_scalar::<_, i32>("SELECT id FROM world_clock WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_err)?;
        if existing.is_some() {
            return Err(ClockError::AlreadyInitialized);
        }

        let state = WorldClockState {
            current_tick: initial_tick,
            last_advanced: Utc::now(),
            advancement_history: Vec::new(),
            etag: fresh_etag(),
        };
        sqlx::query(
            r#"
            INSERT INTO world_clock (id, current_tick, last_advanced, advancement_history, etag)
            VALUES (1, $1, $2, $3, $4)
            "#,
        )
        .bind(state.current_tick)
        .bind(state.last_advanced)
        .bind(serde_json::to_value(&state.advancement_history).unwrap())
        .bind(&state.etag)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(state)
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

        let mut tx = self.pool.begin().await.map_err(storage_err)?;
        let row = sqlx::query(
            "SELECT current_tick, last_advanced, advancement_history, etag FROM world_clock WHERE id = 1 FOR UPDATE",
        )
        .fetch_optional(&mut *tx)
        .await
        .map_err(storage_err)?;
        let Some(row) = row else {
            return Err(ClockError::Uninitialized);
        };
        let mut state = Self::decode(&row)?;
        if state.etag != current_etag {
            return Err(ClockError::ConcurrentAdvancement);
        }

        let now = Utc::now();
        state.current_tick += duration_ms;
        state.advancement_history.push(AdvancementEntry {
            timestamp: now,
            duration_ms,
            reason,
            tick_after: state.current_tick,
        });
        state.last_advanced = now;
        state.etag = fresh_etag();

        sqlx::query(
            r#"
            UPDATE world_clock
            SET current_tick = $1, last_advanced = $2, advancement_history = $3, etag = $4
            WHERE id = 1
            "#,
        )
        .bind(state.current_tick)
        .bind(state.last_advanced)
        .bind(serde_json::to_value(&state.advancement_history).unwrap())
        .bind(&state.etag)
        .execute(&mut *tx)
        .await
        .map_err(storage_err)?;

        tx.commit().await.map_err(storage_err)?;
        Ok(AdvanceOutcome { state })
    }

    async fn get_tick_at(
        &self,
        timestamp: chrono::DateTime<chrono::Utc>,
    ) -> ClockResult<Option<i64>> {
        let Some(state) = self.get().await? else {
            return Ok(None);
        };
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

pub struct PgLocationClock {
    pool: PgPool,
}

impl PgLocationClock {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn decode(row: &sqlx::postgres::PgRow) -> ClockResult<LocationClockState> {
        let id_str: String = row.get("location_id");
        let location_id = LocationId::parse(&id_str).map_err(|_| ClockError::Storage {
            message: format!("corrupt location id in storage: {id_str}"),
        })?;
        Ok(LocationClockState {
            location_id,
            clock_anchor: row.get("clock_anchor"),
            last_synced: row.get("last_synced"),
            etag: row.get("etag"),
        })
    }
}

#[async_trait]
impl LocationClock for PgLocationClock {
    async fn get_location_anchor(
        &self,
        location_id: LocationId,
        world_tick: i64,
    ) -> ClockResult<AnchorOutcome> {
        let mut tx = self.pool.begin().await.map_err(storage_err)?;
        let row = sqlx::query(
            "SELECT location_id, clock_anchor, last_synced, etag FROM location_clocks WHERE location_id = $1 FOR UPDATE",
        )
        .bind(location_id.to_string())
        .fetch_optional(&mut *tx)
        .await
        .map_err(storage_err)?;

        if let Some(row) = row {
            tx.commit().await.map_err(storage_err)?;
            return Ok(AnchorOutcome {
                state: Self::decode(&row)?,
                freshly_initialized: false,
            });
        }

        let created = LocationClockState {
            location_id,
            clock_anchor: world_tick,
            last_synced: Utc::now(),
            etag: fresh_etag(),
        };
        sqlx::query(
            r#"
            INSERT INTO location_clocks (location_id, clock_anchor, last_synced, etag)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (location_id) DO NOTHING
            "#,
        )
        .bind(created.location_id.to_string())
        .bind(created.clock_anchor)
        .bind(created.last_synced)
        .bind(&created.etag)
        .execute(&mut *tx)
        .await
        .map_err(storage_err)?;
        tx.commit().await.map_err(storage_err)?;

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
        let mut tx = self.pool.begin().await.map_err(storage_err)?;
        let row = sqlx::query(
            "SELECT location_id, clock_anchor, last_synced, etag FROM location_clocks WHERE location_id = $1 FOR UPDATE",
        )
        .bind(location_id.to_string())
        .fetch_optional(&mut *tx)
        .await
        .map_err(storage_err)?;

        let state = match row {
            None => LocationClockState {
                location_id,
                clock_anchor: tick,
                last_synced: Utc::now(),
                etag: fresh_etag(),
            },
            Some(row) => {
                let existing = Self::decode(&row)?;
                if let Some(expected) = current_etag {
                    if existing.etag != expected {
                        return Err(ClockError::ConcurrentAdvancement);
                    }
                }
                LocationClockState {
                    location_id,
                    clock_anchor: tick,
                    last_synced: Utc::now(),
                    etag: fresh_etag(),
                }
            }
        };

        sqlx::query(
            r#"
            INSERT INTO location_clocks (location_id, clock_anchor, last_synced, etag)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (location_id) DO UPDATE SET
                clock_anchor = EXCLUDED.clock_anchor,
                last_synced = EXCLUDED.last_synced,
                etag = EXCLUDED.etag
            "#,
        )
        .bind(state.location_id.to_string())
        .bind(state.clock_anchor)
        .bind(state.last_synced)
        .bind(&state.etag)
        .execute(&mut *tx)
        .await
        .map_err(storage_err)?;

        tx.commit().await.map_err(storage_err)?;
        Ok(state)
    }

    async fn batch_update_all(&self, tick: i64) -> ClockResult<usize> {
        let result = sqlx::query(
            "UPDATE location_clocks SET clock_anchor = $1, last_synced = now(), etag = gen_random_uuid()::text",
        )
        .bind(tick)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;
        Ok(result.rows_affected() as usize)
    }
}
