//! The telemetry envelope: correlation propagation, timing, and
//! success/error event emission wrapping every handler (§4.11).
//!
//! Generalizes the reference stack's `Instant`-based
//! `timing_middleware` (elapsed-time measurement, slow-request warning)
//! into a reusable wrapper that also emits a structured event rather than
//! only a log line, and works over any `Result<T, E>`-returning async
//! call rather than only `axum` handlers.

use std::fmt;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::event_name::EventName;

/// Above this latency, the envelope logs at `warn` instead of `debug`,
/// matching the reference stack's slow-request threshold.
const SLOW_REQUEST_MS: u128 = 1000;

/// A single telemetry event, as emitted to an [`EventSink`]. Carries only
/// metadata: no raw prompt or completion text ever appears here (§4.11).
#[derive(Debug, Clone)]
pub struct TelemetryEvent {
    pub event_name: EventName,
    pub correlation_id: String,
    pub player_guid: Option<String>,
    pub service: String,
    pub latency_ms: u64,
    pub persistence_mode: Option<String>,
    pub occurred_utc: chrono::DateTime<Utc>,
    pub extra: Option<serde_json::Value>,
}

/// Where telemetry events go. `atlas-engine` and `atlas-api` depend on
/// this trait, not a concrete sink, so tests can substitute
/// [`InMemoryEventSink`] for assertions.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: TelemetryEvent);
}

/// Logs every event via `tracing`, at `warn` when `latency_ms` exceeds
/// the slow-request threshold and `debug` otherwise.
pub struct TracingEventSink {
    pub service: String,
}

#[async_trait]
impl EventSink for TracingEventSink {
    async fn emit(&self, event: TelemetryEvent) {
        if event.latency_ms as u128 > SLOW_REQUEST_MS {
            tracing::warn!(
                event_name = %event.event_name,
                correlation_id = %event.correlation_id,
                player_guid = ?event.player_guid,
                latency_ms = event.latency_ms,
                "slow request"
            );
        } else {
            tracing::debug!(
                event_name = %event.event_name,
                correlation_id = %event.correlation_id,
                player_guid = ?event.player_guid,
                latency_ms = event.latency_ms,
                "telemetry event"
            );
        }
    }
}

/// Extracts `x-correlation-id` if present, otherwise mints a fresh UUID.
/// Grounds §4.11's "extracts or generates a `correlationId`".
pub fn correlation_id_from_header(header_value: Option<&str>) -> String {
    header_value
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Runs `f`, measuring elapsed time, and emits `on_success` if `f`
/// resolves `Ok` or `on_failure` if it resolves `Err`, re-raising the
/// original error either way (the envelope never swallows it). Generic
/// over the error type so this crate stays independent of
/// `atlas-core::EngineError`.
pub async fn with_telemetry<T, E, F, Fut>(
    sink: &dyn EventSink,
    on_success: EventName,
    on_failure: EventName,
    correlation_id: String,
    player_guid: Option<String>,
    service: impl Into<String>,
    f: F,
) -> Result<T, E>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    let service = service.into();
    let started = Instant::now();
    let result = f().await;
    let latency_ms = started.elapsed().as_millis() as u64;

    match &result {
        Ok(_) => {
            sink.emit(TelemetryEvent {
                event_name: on_success,
                correlation_id,
                player_guid,
                service,
                latency_ms,
                persistence_mode: None,
                occurred_utc: Utc::now(),
                extra: None,
            })
            .await;
        }
        Err(err) => {
            sink.emit(TelemetryEvent {
                event_name: on_failure,
                correlation_id,
                player_guid,
                service,
                latency_ms,
                persistence_mode: None,
                occurred_utc: Utc::now(),
                extra: Some(serde_json::json!({ "error": err.to_string() })),
            })
            .await;
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<TelemetryEvent>>,
    }

    #[async_trait]
    impl EventSink for RecordingSink {
        async fn emit(&self, event: TelemetryEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    #[tokio::test]
    async fn emits_success_event_on_ok() {
        let sink = RecordingSink::default();
        let result: Result<i32, String> = with_telemetry(
            &sink,
            EventName::PingInvoked,
            EventName::TelemetryEventNameInvalid,
            "corr-1".to_string(),
            None,
            "atlas",
            || async { Ok(42) },
        )
        .await;
        assert_eq!(result.unwrap(), 42);
        let events = sink.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_name, EventName::PingInvoked);
    }

    #[tokio::test]
    async fn emits_failure_event_and_reraises_error_on_err() {
        let sink = RecordingSink::default();
        let result: Result<i32, String> = with_telemetry(
            &sink,
            EventName::PingInvoked,
            EventName::TelemetryEventNameInvalid,
            "corr-2".to_string(),
            None,
            "atlas",
            || async { Err("boom".to_string()) },
        )
        .await;
        assert_eq!(result.unwrap_err(), "boom");
        let events = sink.events.lock().unwrap();
        assert_eq!(events[0].event_name, EventName::TelemetryEventNameInvalid);
    }

    #[test]
    fn correlation_id_falls_back_to_generated_uuid_when_missing() {
        let generated = correlation_id_from_header(None);
        assert_eq!(generated.len(), 36);
        let passthrough = correlation_id_from_header(Some("client-supplied"));
        assert_eq!(passthrough, "client-supplied");
    }
}
