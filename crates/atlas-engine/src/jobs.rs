//! Scheduled jobs (§10.5 background scheduler): named, periodic units of
//! work the composition root registers against a `tokio::time::interval`.
//! Each job emits a start/complete telemetry pair through [`EventSink`] so
//! job health is observable the same way request handling is.

use atlas_clock::{LocationClock, WorldClock};
use atlas_layers::DescriptionLayerStore;
use atlas_telemetry::{EventName, EventSink, TelemetryEvent};

fn correlation_id_for_job(job_name: &str) -> String {
    format!("job:{job_name}:{}", uuid::Uuid::new_v4())
}

async fn emit(sink: &dyn EventSink, event_name: EventName, correlation_id: &str, extra: Option<serde_json::Value>) {
    sink.emit(TelemetryEvent {
        event_name,
        correlation_id: correlation_id.to_string(),
        player_guid: None,
        service: "atlas-engine".to_string(),
        latency_ms: 0,
        persistence_mode: None,
        occurred_utc: chrono::Utc::now(),
        extra,
    })
    .await;
}

/// Advances the world clock by `tick_duration_ms`, re-reading the current
/// ETag first since this job has no caller-supplied one to retry against.
/// A `ConcurrentAdvancement` race against a manual `/world/clock/advance`
/// call is logged and skipped rather than retried, since the next
/// scheduled tick will simply catch up. On a successful advance, batch-syncs
/// every already-observed location clock to the new tick (§4.5's
/// C4.advance → C5.batchSync step), so `LocationClock` anchors don't drift
/// behind the world clock between per-location lazy reads.
pub async fn advance_world_clock_job(
    sink: &dyn EventSink,
    clock: &dyn WorldClock,
    location_clock: &dyn LocationClock,
    tick_duration_ms: i64,
) {
    let correlation_id = correlation_id_for_job("world-clock-advance");

    let current = match clock.get().await {
        Ok(Some(state)) => state,
        Ok(None) => {
            tracing::warn!("world clock advance job skipped: clock not yet initialized");
            return;
        }
        Err(err) => {
            tracing::error!(error = %err, "world clock advance job failed to read current state");
            return;
        }
    };

    match clock
        .advance(tick_duration_ms, "scheduled-tick".to_string(), &current.etag)
        .await
    {
        Ok(outcome) => {
            emit(
                sink,
                EventName::WorldClockAdvanced,
                &correlation_id,
                Some(serde_json::json!({ "currentTick": outcome.state.current_tick })),
            )
            .await;

            match location_clock.batch_update_all(outcome.state.current_tick).await {
                Ok(synced) => {
                    emit(
                        sink,
                        EventName::LocationClockBatchSynced,
                        &correlation_id,
                        Some(serde_json::json!({
                            "tick": outcome.state.current_tick,
                            "synced": synced,
                        })),
                    )
                    .await;
                }
                Err(err) => {
                    tracing::error!(error = %err, "location clock batch sync failed after world clock advance");
                }
            }
        }
        Err(err) => {
            tracing::warn!(error = %err, "world clock advance job lost the race; will catch up next tick");
        }
    }
}

/// Runs one pass of the description-layer integrity job (§4.6), logging a
/// `Description.Integrity.JobStart`/`JobComplete` pair and any mismatches
/// the pass itself already warns on.
pub async fn integrity_job(
    sink: &dyn EventSink,
    store: &dyn DescriptionLayerStore,
    batch_size: usize,
) {
    let correlation_id = correlation_id_for_job("description-integrity");
    emit(
        sink,
        EventName::DescriptionIntegrityJobStart,
        &correlation_id,
        None,
    )
    .await;

    match atlas_layers::integrity::run_integrity_job(store, batch_size, false).await {
        Ok(report) => {
            emit(
                sink,
                EventName::DescriptionIntegrityJobComplete,
                &correlation_id,
                Some(serde_json::json!({
                    "scanned": report.scanned,
                    "hashesStored": report.hashes_stored,
                    "mismatches": report.mismatches.len(),
                })),
            )
            .await;
        }
        Err(err) => {
            tracing::error!(error = %err, "description integrity job failed");
        }
    }
}
