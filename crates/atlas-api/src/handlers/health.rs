//! `/api/ping` and `/api/backend/health` (§6).

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use atlas_telemetry::{EventName, TelemetryEvent};
use chrono::Utc;

use crate::dto::common::Envelope;
use crate::extractors::CorrelationId;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PingQuery {
    msg: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PingResponse {
    pub reply: String,
    pub latency_ms: u64,
}

#[utoipa::path(
    get,
    path = "/api/ping",
    tag = "General",
    responses((status = 200, description = "Pong", body = PingResponse))
)]
pub async fn ping(
    State(state): State<Arc<AppState>>,
    CorrelationId(correlation_id): CorrelationId,
    Query(query): Query<PingQuery>,
) -> Json<Envelope<PingResponse>> {
    let started = Instant::now();
    let sink = state.engine.event_sink();

    let reply = query.msg.unwrap_or_else(|| "pong".to_string());
    let latency_ms = started.elapsed().as_millis() as u64;

    sink.emit(TelemetryEvent {
        event_name: EventName::PingInvoked,
        correlation_id: correlation_id.clone(),
        player_guid: None,
        service: "atlas-api".to_string(),
        latency_ms,
        persistence_mode: None,
        occurred_utc: Utc::now(),
        extra: None,
    })
    .await;

    Json(Envelope::ok(
        PingResponse { reply, latency_ms },
        correlation_id,
    ))
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub latency_ms: u64,
}

#[utoipa::path(
    get,
    path = "/api/backend/health",
    tag = "General",
    responses((status = 200, description = "Service is healthy", body = HealthResponse))
)]
pub async fn health(
    State(state): State<Arc<AppState>>,
    CorrelationId(correlation_id): CorrelationId,
) -> Json<Envelope<HealthResponse>> {
    let started = Instant::now();
    Json(Envelope::ok(
        HealthResponse {
            status: "ok".to_string(),
            service: state.service_name.clone(),
            latency_ms: started.elapsed().as_millis() as u64,
        },
        correlation_id,
    ))
}
