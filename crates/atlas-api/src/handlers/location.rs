//! `/api/location`, `/api/location/look` (§6).

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;

use atlas_core::error::EngineError;
use atlas_core::exits::build_exit_info_array;
use atlas_telemetry::{with_telemetry, EventName};
use atlas_types::{ExitAvailability, LocationId};

use crate::dto::common::Envelope;
use crate::dto::location::{ExitInfoDto, LocationQuery, LocationResponse};
use crate::error::ApiError;
use crate::extractors::CorrelationId;
use crate::state::AppState;

fn availability_str(availability: ExitAvailability) -> String {
    match availability {
        ExitAvailability::Hard => "hard",
        ExitAvailability::Pending => "pending",
        ExitAvailability::Forbidden => "forbidden",
    }
    .to_string()
}

async fn fetch(
    state: &AppState,
    correlation_id: &str,
    query: LocationQuery,
) -> Result<LocationResponse, ApiError> {
    let sink = state.engine.event_sink();
    let id = LocationId::from_uuid(query.id);

    let location = with_telemetry(
        sink.as_ref(),
        EventName::LocationGet,
        EventName::LocationGet,
        correlation_id.to_string(),
        None,
        "atlas-api",
        || async { state.engine.get_location(id).await },
    )
    .await
    .map_err(|err| ApiError::new(err, correlation_id.to_string()))?
    .ok_or_else(|| {
        ApiError::new(
            EngineError::LocationNotFound {
                location_id: id.to_string(),
            },
            correlation_id.to_string(),
        )
    })?;

    let (exit_infos, warnings) = build_exit_info_array(&location);
    for warning in &warnings {
        tracing::warn!(direction = %warning.direction, message = %warning.message, "exit availability data integrity warning");
    }

    Ok(LocationResponse {
        id: location.id.0,
        name: location.name,
        description: location.description,
        version: location.version,
        exits_summary: location.exits_summary_cache,
        exits: exit_infos
            .into_iter()
            .map(|e| ExitInfoDto {
                direction: e.direction.as_str().to_string(),
                availability: availability_str(e.availability),
                to_location_id: e.to_location_id.map(|id| id.0),
                reason: e.reason,
            })
            .collect(),
    })
}

#[utoipa::path(
    get,
    path = "/api/location",
    tag = "Location",
    responses(
        (status = 200, description = "Location found", body = LocationResponse),
        (status = 404, description = "Location not found")
    )
)]
pub async fn get(
    State(state): State<Arc<AppState>>,
    CorrelationId(correlation_id): CorrelationId,
    Query(query): Query<LocationQuery>,
) -> Result<Json<Envelope<LocationResponse>>, ApiError> {
    let response = fetch(&state, &correlation_id, query).await?;
    Ok(Json(Envelope::ok(response, correlation_id)))
}

#[utoipa::path(
    get,
    path = "/api/location/look",
    tag = "Location",
    responses(
        (status = 200, description = "Location found", body = LocationResponse),
        (status = 404, description = "Location not found")
    )
)]
pub async fn look(
    State(state): State<Arc<AppState>>,
    CorrelationId(correlation_id): CorrelationId,
    Query(query): Query<LocationQuery>,
) -> Result<Json<Envelope<LocationResponse>>, ApiError> {
    let sink = state.engine.event_sink();
    sink.emit(atlas_telemetry::TelemetryEvent {
        event_name: EventName::NavigationLookIssued,
        correlation_id: correlation_id.clone(),
        player_guid: None,
        service: "atlas-api".to_string(),
        latency_ms: 0,
        persistence_mode: None,
        occurred_utc: chrono::Utc::now(),
        extra: None,
    })
    .await;

    let response = fetch(&state, &correlation_id, query).await?;
    Ok(Json(Envelope::ok(response, correlation_id)))
}
