//! In-memory [`WorldEventLog`]. The durable ("cosmos") implementation
//! lives in `atlas-db`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use atlas_types::{
    DeadLetterRecord, EventStatus, ScopeKey, WorldEventId, WorldEventRecord,
};
use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::{EventLogError, EventLogResult};
use crate::{CreateOutcome, ScopeQueryOptions, WorldEventLog};

/// Fields stripped from a redacted dead-letter payload. The reference
/// payload shape is free-form JSON, so redaction is key-name based rather
/// than schema based.
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

#[derive(Default)]
struct State {
    records: HashMap<WorldEventId, WorldEventRecord>,
    idempotency_index: HashMap<String, WorldEventId>,
    in_flight: HashSet<WorldEventId>,
    dead_letters: Vec<DeadLetterRecord>,
}

#[derive(Default)]
pub struct InMemoryWorldEventLog {
    state: Arc<RwLock<State>>,
}

impl InMemoryWorldEventLog {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches_scope_filters(
    record: &WorldEventRecord,
    opts: &ScopeQueryOptions,
) -> bool {
    if let Some(status) = opts.status {
        if record.status != status {
            return false;
        }
    }
    if let Some(from) = opts.occurred_from {
        if record.occurred_utc < from {
            return false;
        }
    }
    if let Some(to) = opts.occurred_to {
        if record.occurred_utc > to {
            return false;
        }
    }
    true
}

impl InMemoryWorldEventLog {
    async fn transition(
        &self,
        id: WorldEventId,
        scope_key: ScopeKey,
        next: EventStatus,
        processing_metadata: Option<serde_json::Value>,
    ) -> EventLogResult<WorldEventRecord> {
        let mut guard = self.state.write().await;
        let record = guard
            .records
            .get_mut(&id)
            .filter(|r| r.scope_key == scope_key)
            .ok_or_else(|| EventLogError::NotFound {
                event_id: id.to_string(),
            })?;
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
        Ok(record.clone())
    }
}

#[async_trait]
impl WorldEventLog for InMemoryWorldEventLog {
    async fn create(&self, record: WorldEventRecord) -> EventLogResult<CreateOutcome> {
        let mut guard = self.state.write().await;
        if let Some(existing) = guard.records.get(&record.id) {
            return Ok(CreateOutcome {
                record: existing.clone(),
                created: false,
            });
        }
        if let Some(owner) = guard.idempotency_index.get(&record.idempotency_key) {
            if *owner != record.id {
                return Err(EventLogError::DuplicateIdempotencyKey {
                    idempotency_key: record.idempotency_key.clone(),
                });
            }
        }
        guard
            .idempotency_index
            .insert(record.idempotency_key.clone(), record.id);
        guard.records.insert(record.id, record.clone());
        Ok(CreateOutcome {
            record,
            created: true,
        })
    }

    async fn get_by_idempotency_key(
        &self,
        idempotency_key: &str,
    ) -> EventLogResult<Option<WorldEventRecord>> {
        let guard = self.state.read().await;
        Ok(guard
            .idempotency_index
            .get(idempotency_key)
            .and_then(|id| guard.records.get(id))
            .cloned())
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
        let guard = self.state.read().await;
        let mut matched: Vec<WorldEventRecord> = guard
            .records
            .values()
            .filter(|r| r.scope_key == scope_key && matches_scope_filters(r, &opts))
            .cloned()
            .collect();
        matched.sort_by_key(|r| r.occurred_utc);
        matched.truncate(opts.limit.max(1));
        Ok(matched)
    }

    async fn get_recent(&self, limit: usize) -> EventLogResult<Vec<WorldEventRecord>> {
        let guard = self.state.read().await;
        let mut all: Vec<WorldEventRecord> = guard.records.values().cloned().collect();
        all.sort_by_key(|r| std::cmp::Reverse(r.occurred_utc));
        all.truncate(limit.max(1));
        Ok(all)
    }

    async fn claim_next(
        &self,
        scope_key: Option<ScopeKey>,
    ) -> EventLogResult<Option<WorldEventRecord>> {
        let mut guard = self.state.write().await;
        let mut candidates: Vec<&WorldEventRecord> = guard
            .records
            .values()
            .filter(|r| r.status == EventStatus::Pending)
            .filter(|r| scope_key.as_ref().map_or(true, |s| &r.scope_key == s))
            .collect();
        candidates.sort_by_key(|r| r.occurred_utc);
        let claimed_id = candidates
            .iter()
            .find(|r| !guard.in_flight.contains(&r.id))
            .map(|r| r.id);

        let Some(id) = claimed_id else {
            return Ok(None);
        };
        guard.in_flight.insert(id);
        Ok(guard.records.get(&id).cloned())
    }

    async fn complete(
        &self,
        id: WorldEventId,
        scope_key: ScopeKey,
    ) -> EventLogResult<WorldEventRecord> {
        let result = self
            .transition(id, scope_key, EventStatus::Processed, None)
            .await?;
        self.state.write().await.in_flight.remove(&id);
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
        self.state.write().await.in_flight.remove(&id);
        Ok(result)
    }

    async fn retry(
        &self,
        id: WorldEventId,
        scope_key: ScopeKey,
    ) -> EventLogResult<WorldEventRecord> {
        let result = self
            .transition(id, scope_key, EventStatus::Pending, None)
            .await?;
        self.state.write().await.in_flight.remove(&id);
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
        self.state.write().await.in_flight.remove(&id);

        // Dead-letter writes must never fail the caller; swallow and log.
        let dead_letter = DeadLetterRecord {
            original_event_id: result.id,
            scope_key: result.scope_key,
            event_type: result.event_type.clone(),
            redacted_payload: redact_payload(&result.payload),
            failure_reason: reason,
            dead_lettered_utc: Utc::now(),
            correlation_id: result.correlation_id.clone(),
        };
        self.state.write().await.dead_letters.push(dead_letter);

        Ok(result)
    }

    async fn list_dead_letters(&self, limit: usize) -> EventLogResult<Vec<DeadLetterRecord>> {
        let guard = self.state.read().await;
        let mut letters = guard.dead_letters.clone();
        letters.sort_by_key(|d| std::cmp::Reverse(d.dead_lettered_utc));
        letters.truncate(limit.max(1));
        Ok(letters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_types::{ActorKind, LocationId};

    fn sample_record(scope_key: ScopeKey, idempotency_key: &str) -> WorldEventRecord {
        WorldEventRecord {
            id: WorldEventId::new(),
            scope_key,
            event_type: "Location.Move".to_string(),
            status: EventStatus::Pending,
            occurred_utc: Utc::now(),
            ingested_utc: Utc::now(),
            processed_utc: None,
            actor_kind: ActorKind::Player,
            actor_id: None,
            correlation_id: "corr-1".to_string(),
            causation_id: None,
            idempotency_key: idempotency_key.to_string(),
            payload: serde_json::json!({ "player_id": "secret", "note": "hello" }),
            processing_metadata: None,
            version: 0,
        }
    }

    #[tokio::test]
    async fn create_is_idempotent_by_id() {
        let log = InMemoryWorldEventLog::new();
        let scope = ScopeKey::Location(LocationId::new());
        let record = sample_record(scope.clone(), "idem-1");
        let first = log.create(record.clone()).await.unwrap();
        assert!(first.created);
        let second = log.create(record).await.unwrap();
        assert!(!second.created);
    }

    #[tokio::test]
    async fn duplicate_idempotency_key_on_different_id_is_rejected() {
        let log = InMemoryWorldEventLog::new();
        let scope = ScopeKey::Location(LocationId::new());
        let first = sample_record(scope.clone(), "shared-key");
        log.create(first).await.unwrap();
        let second = sample_record(scope, "shared-key");
        let err = log.create(second).await.unwrap_err();
        assert!(matches!(err, EventLogError::DuplicateIdempotencyKey { .. }));
    }

    #[tokio::test]
    async fn status_transitions_reject_illegal_paths() {
        let log = InMemoryWorldEventLog::new();
        let scope = ScopeKey::Location(LocationId::new());
        let record = sample_record(scope.clone(), "idem-2");
        log.create(record.clone()).await.unwrap();
        log.update_status(record.id, scope.clone(), EventStatus::Processed, None)
            .await
            .unwrap();
        let err = log
            .update_status(record.id, scope, EventStatus::Pending, None)
            .await
            .unwrap_err();
        assert!(matches!(err, EventLogError::IllegalTransition { .. }));
    }

    #[tokio::test]
    async fn claim_next_does_not_double_claim() {
        let log = InMemoryWorldEventLog::new();
        let scope = ScopeKey::Location(LocationId::new());
        let record = sample_record(scope.clone(), "idem-3");
        log.create(record.clone()).await.unwrap();

        let claimed_first = log.claim_next(Some(scope.clone())).await.unwrap();
        assert!(claimed_first.is_some());
        let claimed_second = log.claim_next(Some(scope)).await.unwrap();
        assert!(claimed_second.is_none());
    }

    #[tokio::test]
    async fn complete_releases_the_claim_and_advances_status() {
        let log = InMemoryWorldEventLog::new();
        let scope = ScopeKey::Location(LocationId::new());
        let record = sample_record(scope.clone(), "idem-4");
        log.create(record.clone()).await.unwrap();
        log.claim_next(Some(scope.clone())).await.unwrap();
        let completed = log.complete(record.id, scope).await.unwrap();
        assert_eq!(completed.status, EventStatus::Processed);
    }

    #[tokio::test]
    async fn give_up_writes_a_redacted_dead_letter() {
        let log = InMemoryWorldEventLog::new();
        let scope = ScopeKey::Location(LocationId::new());
        let record = sample_record(scope.clone(), "idem-5");
        log.create(record.clone()).await.unwrap();
        log.fail(record.id, scope.clone(), "ai timeout".to_string())
            .await
            .unwrap();
        log.give_up(record.id, scope, "exhausted retries".to_string())
            .await
            .unwrap();

        let letters = log.list_dead_letters(10).await.unwrap();
        assert_eq!(letters.len(), 1);
        assert_eq!(
            letters[0].redacted_payload["player_id"],
            serde_json::json!("[redacted]")
        );
        assert_eq!(letters[0].redacted_payload["note"], serde_json::json!("hello"));
    }

    #[tokio::test]
    async fn query_by_scope_respects_limit_and_status_filter() {
        let log = InMemoryWorldEventLog::new();
        let scope = ScopeKey::Location(LocationId::new());
        for i in 0..3 {
            log.create(sample_record(scope.clone(), &format!("idem-q{i}")))
                .await
                .unwrap();
        }
        let opts = ScopeQueryOptions {
            limit: 2,
            status: Some(EventStatus::Pending),
            ..Default::default()
        };
        let results = log.query_by_scope(scope, opts).await.unwrap();
        assert_eq!(results.len(), 2);
    }
}
