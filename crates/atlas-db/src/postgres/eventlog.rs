//! PostgreSQL-backed [`WorldEventLog`] (C7, §4.7).
//!
//! `claim_next` uses `FOR UPDATE SKIP LOCKED` so concurrent workers never
//! block on each other's claim; the `in_flight` column replaces the
//! in-memory store's `HashSet<WorldEventId>`. The idempotency key carries
//! a unique index so a racing duplicate insert surfaces as a constraint
//! violation rather than a second silent read-then-write.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use sqlx::PgPool;

use atlas_eventlog::{CreateOutcome, EventLogError, EventLogResult, ScopeQueryOptions, WorldEventLog};
use atlas_types::{ActorKind, DeadLetterRecord, EventStatus, ScopeKey, WorldEventId, WorldEventRecord};

const REDACTED_KEYS: [&str; 4] = ["player_id", "playerId", "name", "email"];
const MAX_STRING_LEN: usize = 256;

fn redact_payload(payload: &serde_json::Value) -> serde_json::Value {
    match payload {
        serde_json::Value::Object(map) => {
            let mut redacted = serde_json::Map::new();
            for (key, value) in map {
                if REDACTED_KEYS.contains(&key.as_str()) {
                    redacted.insert(key.clone(), serde_json::Value::String("[redacted]".into()));
                    continue;
                }
                redacted.insert(key.clone(), redact_payload(value));
            }
            serde_json::Value::Object(redacted)
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(redact_payload).collect())
        }
        serde_json::Value::String(s) if s.len() > MAX_STRING_LEN => {
            serde_json::Value::String(format!("[redacted: {} bytes]", s.len()))
        }
        other => other.clone(),
    }
}

fn status_to_text(status: EventStatus) -> String {
    serde_json::to_value(status).unwrap().as_str().unwrap().to_string()
}

fn status_from_text(text: &str) -> EventLogResult<EventStatus> {
    serde_json::from_value(serde_json::Value::String(text.to_string())).map_err(|e| {
        EventLogError::Storage {
            message: e.to_string(),
        }
    })
}

fn actor_kind_to_text(kind: ActorKind) -> String {
    serde_json::to_value(kind).unwrap().as_str().unwrap().to_string()
}

fn actor_kind_from_text(text: &str) -> EventLogResult<ActorKind> {
    serde_json::from_value(serde_json::Value::String(text.to_string())).map_err(|e| {
        EventLogError::Storage {
            message: e.to_string(),
        }
    })
}

fn storage_err(e: sqlx::Error) -> EventLogError {
    EventLogError::Storage {
        message: e.to_string(),
    }
}

pub struct PgWorldEventLog {
    pool: PgPool,
}

impl PgWorldEventLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn decode(row: &sqlx::postgres::PgRow) -> EventLogResult<WorldEventRecord> {
        let id_str: String = row.get("id");
        let id = WorldEventId::parse(&id_str).map_err(|_| EventLogError::Storage {
            message: format!("corrupt event id in storage: {id_str}"),
        })?;
        let scope_key_str: String = row.get("scope_key");
        let scope_key = ScopeKey::try_from(scope_key_str.clone()).map_err(|_| {
            EventLogError::Storage {
                message: format!("corrupt scope key in storage: {scope_key_str}"),
            }
        })?;
        let status_str: String = row.get("status");
        let actor_kind_str: String = row.get("actor_kind");
        let actor_id: Option<String> = row.get("actor_id");
        let actor_id = actor_id
            .map(|s| {
                atlas_types::PlayerId::parse(&s).map_err(|_| EventLogError::Storage {
                    message: format!("corrupt actor id in storage: {s}"),
                })
            })
            .transpose()?;

        Ok(WorldEventRecord {
            id,
            scope_key,
            event_type: row.get("event_type"),
            status: status_from_text(&status_str)?,
            occurred_utc: row.get("occurred_utc"),
            ingested_utc: row.get("ingested_utc"),
            processed_utc: row.get("processed_utc"),
            actor_kind: actor_kind_from_text(&actor_kind_str)?,
            actor_id,
            correlation_id: row.get("correlation_id"),
            causation_id: row.get("causation_id"),
            idempotency_key: row.get("idempotency_key"),
            payload: row.get("payload"),
            processing_metadata: row.get("processing_metadata"),
            version: row.get::<i64, _>("version") as u64,
        })
    }

    async fn transition(
        &self,
        id: WorldEventId,
        scope_key: ScopeKey,
        next: EventStatus,
        processing_metadata: Option<serde_json::Value>,
    ) -> EventLogResult<WorldEventRecord> {
        let mut tx = self.pool.begin().await.map_err(storage_err)?;
        let row = sqlx::query("SELECT * FROM world_events WHERE id = $1 FOR UPDATE")
            .bind(id.to_string())
            .fetch_optional(&mut *tx)
            .await
            .map_err(storage_err)?;
        let Some(row) = row else {
            return Err(EventLogError::NotFound {
                event_id: id.to_string(),
            });
        };
        let mut record = Self::decode(&row)?;
        if record.scope_key != scope_key {
            return Err(EventLogError::NotFound {
                event_id: id.to_string(),
            });
        }
        if !record.status.can_transition_to(next) {
            return Err(EventLogError::IllegalTransition {
                from: record.status,
                to: next,
            });
        }

        record.status = next;
        record.version += 1;
        if next == EventStatus::Processed {
            record.processed_utc = Some(Utc::now());
        }
        if processing_metadata.is_some() {
            record.processing_metadata = processing_metadata;
        }

        sqlx::query(
            r#"
            UPDATE world_events
            SET status = $1, version = $2, processed_utc = $3, processing_metadata = $4
            WHERE id = $5
            "#,
        )
        .bind(status_to_text(record.status))
        .bind(record.version as i64)
        .bind(record.processed_utc)
        .bind(&record.processing_metadata)
        .bind(id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(storage_err)?;

        tx.commit().await.map_err(storage_err)?;
        Ok(record)
    }

    async fn release_claim(&self, id: WorldEventId) -> EventLogResult<()> {
        sqlx::query("UPDATE world_events SET in_flight = FALSE WHERE id = $1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;
        Ok(())
    }
}

#[async_trait]
impl WorldEventLog for PgWorldEventLog {
    async fn create(&self, record: WorldEventRecord) -> EventLogResult<CreateOutcome> {
        let mut tx = self.pool.begin().await.map_err(storage_err)?;
        let existing = sqlx::query("SELECT * FROM world_events WHERE id = $1")
            .bind(record.id.to_string())
            .fetch_optional(&mut *tx)
            .await
            .map_err(storage_err)?;
        if let Some(row) = existing {
            return Ok(CreateOutcome {
                record: Self::decode(&row)?,
                created: false,
            });
        }

        let owner: Option<String> = sqlx::query_scalar(
            "SELECT id FROM world_events WHERE idempotency_key = $1",
        )
        .bind(&record.idempotency_key)
        .fetch_optional(&mut *tx)
        .await
        .map_err(storage_err)?;
        if let Some(owner) = owner {
            if owner != record.id.to_string() {
                return Err(EventLogError::DuplicateIdempotencyKey {
                    idempotency_key: record.idempotency_key.clone(),
                });
            }
        }

        sqlx::query(
            r#"
            INSERT INTO world_events
                (id, scope_key, event_type, status, occurred_utc, ingested_utc, processed_utc,
                 actor_kind, actor_id, correlation_id, causation_id, idempotency_key, payload,
                 processing_metadata, version, in_flight)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, FALSE)
            "#,
        )
        .bind(record.id.to_string())
        .bind(record.scope_key.to_string())
        .bind(&record.event_type)
        .bind(status_to_text(record.status))
        .bind(record.occurred_utc)
        .bind(record.ingested_utc)
        .bind(record.processed_utc)
        .bind(actor_kind_to_text(record.actor_kind))
        .bind(record.actor_id.map(|id| id.to_string()))
        .bind(&record.correlation_id)
        .bind(&record.causation_id)
        .bind(&record.idempotency_key)
        .bind(&record.payload)
        .bind(&record.processing_metadata)
        .bind(record.version as i64)
        .execute(&mut *tx)
        .await
        .map_err(storage_err)?;

        tx.commit().await.map_err(storage_err)?;
        Ok(CreateOutcome {
            record,
            created: true,
        })
    }

    async fn get_by_idempotency_key(
        &self,
        idempotency_key: &str,
    ) -> EventLogResult<Option<WorldEventRecord>> {
        let row = sqlx::query("SELECT * FROM world_events WHERE idempotency_key = $1")
            .bind(idempotency_key)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_err)?;
        row.as_ref().map(Self::decode).transpose()
    }

    async fn update_status(
        &self,
        id: WorldEventId,
        scope_key: ScopeKey,
        next: EventStatus,
        processing_metadata: Option<serde_json::Value>,
    ) -> EventLogResult<WorldEventRecord> {
        self.transition(id, scope_key, next, processing_metadata)
            .await
    }

    async fn query_by_scope(
        &self,
        scope_key: ScopeKey,
        opts: ScopeQueryOptions,
    ) -> EventLogResult<Vec<WorldEventRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM world_events
            WHERE scope_key = $1
              AND ($2::text IS NULL OR status = $2)
              AND ($3::timestamptz IS NULL OR occurred_utc >= $3)
              AND ($4::timestamptz IS NULL OR occurred_utc <= $4)
            ORDER BY occurred_utc ASC
            LIMIT $5
            "#,
        )
        .bind(scope_key.to_string())
        .bind(opts.status.map(status_to_text))
        .bind(opts.occurred_from)
        .bind(opts.occurred_to)
        .bind(opts.limit.max(1) as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;
        rows.iter().map(Self::decode).collect()
    }

    async fn get_recent(&self, limit: usize) -> EventLogResult<Vec<WorldEventRecord>> {
        let rows = sqlx::query(
            "SELECT * FROM world_events ORDER BY occurred_utc DESC LIMIT $1",
        )
        .bind(limit.max(1) as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;
        rows.iter().map(Self::decode).collect()
    }

    async fn claim_next(
        &self,
        scope_key: Option<ScopeKey>,
    ) -> EventLogResult<Option<WorldEventRecord>> {
        let mut tx = self.pool.begin().await.map_err(storage_err)?;
        let row = sqlx::query(
            r#"
            SELECT * FROM world_events
            WHERE status = 'pending'
              AND in_flight = FALSE
              AND ($1::text IS NULL OR scope_key = $1)
            ORDER BY occurred_utc ASC
            LIMIT 1
            FOR UPDATE SKIP LOCKED
            "#,
        )
        .bind(scope_key.map(|s| s.to_string()))
        .fetch_optional(&mut *tx)
        .await
        .map_err(storage_err)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let record = Self::decode(&row)?;
        sqlx::query("UPDATE world_events SET in_flight = TRUE WHERE id = $1")
            .bind(record.id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(storage_err)?;
        tx.commit().await.map_err(storage_err)?;

        Ok(Some(record))
    }

    async fn complete(&self, id: WorldEventId, scope_key: ScopeKey) -> EventLogResult<WorldEventRecord> {
        let result = self
            .transition(id, scope_key, EventStatus::Processed, None)
            .await?;
        self.release_claim(id).await?;
        Ok(result)
    }

    async fn fail(
        &self,
        id: WorldEventId,
        scope_key: ScopeKey,
        reason: String,
    ) -> EventLogResult<WorldEventRecord> {
        let metadata = serde_json::json!({ "failure_reason": reason });
        let result = self
            .transition(id, scope_key, EventStatus::Failed, Some(metadata))
            .await?;
        self.release_claim(id).await?;
        Ok(result)
    }

    async fn retry(&self, id: WorldEventId, scope_key: ScopeKey) -> EventLogResult<WorldEventRecord> {
        let result = self
            .transition(id, scope_key, EventStatus::Pending, None)
            .await?;
        self.release_claim(id).await?;
        Ok(result)
    }

    async fn give_up(
        &self,
        id: WorldEventId,
        scope_key: ScopeKey,
        reason: String,
    ) -> EventLogResult<WorldEventRecord> {
        let result = self
            .transition(id, scope_key, EventStatus::DeadLettered, None)
            .await?;
        self.release_claim(id).await?;

        let dead_letter = DeadLetterRecord {
            original_event_id: result.id,
            scope_key: result.scope_key.clone(),
            event_type: result.event_type.clone(),
            redacted_payload: redact_payload(&result.payload),
            failure_reason: reason,
            dead_lettered_utc: Utc::now(),
            correlation_id: result.correlation_id.clone(),
        };
        // Dead-letter writes must never fail the caller; swallow storage errors.
        let _ = sqlx::query(
            r#"
            INSERT INTO dead_letters
                (original_event_id, scope_key, event_type, redacted_payload, failure_reason,
                 dead_lettered_utc, correlation_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(dead_letter.original_event_id.to_string())
        .bind(dead_letter.scope_key.to_string())
        .bind(&dead_letter.event_type)
        .bind(&dead_letter.redacted_payload)
        .bind(&dead_letter.failure_reason)
        .bind(dead_letter.dead_lettered_utc)
        .bind(&dead_letter.correlation_id)
        .execute(&self.pool)
        .await;

        Ok(result)
    }

    async fn list_dead_letters(&self, limit: usize) -> EventLogResult<Vec<DeadLetterRecord>> {
        let rows = sqlx::query(
            "SELECT * FROM dead_letters ORDER BY dead_lettered_utc DESC LIMIT $1",
        )
        .bind(limit.max(1) as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        rows.into_iter()
            .map(|row| {
                let scope_key_str: String = row.get("scope_key");
                let scope_key = ScopeKey::try_from(scope_key_str.clone()).map_err(|_| {
                    EventLogError::Storage {
                        message: format!("corrupt scope key in storage: {scope_key_str}"),
                    }
                })?;
                let original_event_id_str: String = row.get("original_event_id");
                let original_event_id = WorldEventId::parse(&original_event_id_str).map_err(|_| {
                    EventLogError::Storage {
                        message: format!(
                            "corrupt event id in storage: {original_event_id_str}"
                        ),
                    }
                })?;
                Ok(DeadLetterRecord {
                    original_event_id,
                    scope_key,
                    event_type: row.get("event_type"),
                    redacted_payload: row.get("redacted_payload"),
                    failure_reason: row.get("failure_reason"),
                    dead_lettered_utc: row.get("dead_lettered_utc"),
                    correlation_id: row.get("correlation_id"),
                })
            })
            .collect()
    }
}
