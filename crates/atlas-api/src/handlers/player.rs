//! `/api/player/bootstrap`, `/api/player/get`, `/api/player/move` (§6, §4.8).

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Query, State};
use axum::Json;

use atlas_core::error::EngineError;
use atlas_engine::move_pipeline::MoveRequest;
use atlas_players::BootstrapOutcome;
use atlas_telemetry::{with_telemetry, EventName, TelemetryEvent};
use chrono::Utc;
use atlas_types::{Direction, LocationId, PlayerId};

use crate::dto::common::Envelope;
use crate::dto::player::{BootstrapResponse, GetPlayerQuery, GetPlayerResponse, MoveQuery, MoveResponse};
use crate::error::ApiError;
use crate::extractors::{CorrelationId, PlayerGuid};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/player/bootstrap",
    tag = "Player",
    responses((status = 200, description = "Player bootstrapped", body = BootstrapResponse))
)]
pub async fn bootstrap(
    State(state): State<Arc<AppState>>,
    CorrelationId(correlation_id): CorrelationId,
    PlayerGuid(requested_id): PlayerGuid,
) -> Result<Json<Envelope<BootstrapResponse>>, ApiError> {
    let started = Instant::now();
    let sink = state.engine.event_sink();

    sink.emit(TelemetryEvent {
        event_name: EventName::OnboardingGuestGuidStarted,
        correlation_id: correlation_id.clone(),
        player_guid: requested_id.map(|id| id.to_string()),
        service: "atlas-api".to_string(),
        latency_ms: 0,
        persistence_mode: None,
        occurred_utc: Utc::now(),
        extra: None,
    })
    .await;

    let BootstrapOutcome { player, created } = with_telemetry(
        sink.as_ref(),
        EventName::OnboardingGuestGuidCompleted,
        EventName::OnboardingGuestGuidStarted,
        correlation_id.clone(),
        requested_id.map(|id| id.to_string()),
        "atlas-api",
        || async {
            state
                .engine
                .bootstrap_player(requested_id.map(PlayerId::from_uuid))
                .await
        },
    )
    .await
    .map_err(|err| ApiError::new(err, correlation_id.clone()))?;

    if created {
        sink.emit(TelemetryEvent {
            event_name: EventName::OnboardingGuestGuidCreated,
            correlation_id: correlation_id.clone(),
            player_guid: Some(player.id.to_string()),
            service: "atlas-api".to_string(),
            latency_ms: started.elapsed().as_millis() as u64,
            persistence_mode: None,
            occurred_utc: Utc::now(),
            extra: None,
        })
        .await;
    }

    Ok(Json(Envelope::ok(
        BootstrapResponse {
            player_guid: player.id.0,
            created,
            current_location_id: player.current_location_id.0,
            name: player.name,
            latency_ms: started.elapsed().as_millis() as u64,
        },
        correlation_id,
    )))
}

#[utoipa::path(
    get,
    path = "/api/player/get",
    tag = "Player",
    responses(
        (status = 200, description = "Player found", body = GetPlayerResponse),
        (status = 404, description = "Player not found")
    )
)]
pub async fn get(
    State(state): State<Arc<AppState>>,
    CorrelationId(correlation_id): CorrelationId,
    PlayerGuid(header_id): PlayerGuid,
    Query(query): Query<GetPlayerQuery>,
) -> Result<Json<Envelope<GetPlayerResponse>>, ApiError> {
    let sink = state.engine.event_sink();

    let id = query
        .id
        .or(header_id)
        .map(PlayerId::from_uuid)
        .ok_or_else(|| {
            ApiError::new(
                EngineError::Validation {
                    message: "id query parameter or x-player-guid header is required".to_string(),
                },
                correlation_id.clone(),
            )
        })?;

    let player = with_telemetry(
        sink.as_ref(),
        EventName::PlayerGet,
        EventName::PlayerGet,
        correlation_id.clone(),
        Some(id.to_string()),
        "atlas-api",
        || async { state.engine.get_player(id).await },
    )
    .await
    .map_err(|err| ApiError::new(err, correlation_id.clone()))?
    .ok_or_else(|| {
        ApiError::new(
            EngineError::PlayerNotFound {
                player_id: id.to_string(),
            },
            correlation_id.clone(),
        )
    })?;

    Ok(Json(Envelope::ok(
        GetPlayerResponse {
            id: player.id.0,
            guest: player.guest,
            external_id: player.external_id,
        },
        correlation_id,
    )))
}

#[utoipa::path(
    get,
    path = "/api/player/move",
    tag = "Player",
    responses(
        (status = 200, description = "Move succeeded", body = MoveResponse),
        (status = 400, description = "Validation, ambiguity, no-exit, or generation-hint error")
    )
)]
pub async fn r#move(
    State(state): State<Arc<AppState>>,
    CorrelationId(correlation_id): CorrelationId,
    PlayerGuid(player_id): PlayerGuid,
    Query(query): Query<MoveQuery>,
) -> Result<Json<Envelope<MoveResponse>>, ApiError> {
    let outcome = state
        .engine
        .move_player(MoveRequest {
            from_id: query.from.map(LocationId::from_uuid),
            raw_direction: query.dir,
            player_id: player_id.map(PlayerId::from_uuid),
            correlation_id: correlation_id.clone(),
        })
        .await
        .map_err(|err| ApiError::new(err, correlation_id.clone()))?;

    Ok(Json(Envelope::ok(
        MoveResponse {
            id: outcome.location.id.0,
            name: outcome.location.name,
            description: outcome.location.description,
            exits_summary: outcome.location.exits_summary_cache,
            direction: direction_str(outcome.direction),
            from_location_id: outcome.from_location_id.0,
        },
        correlation_id,
    )))
}

fn direction_str(direction: Direction) -> String {
    direction.as_str().to_string()
}
