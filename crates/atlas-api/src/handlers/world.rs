//! `/api/world/generate-area`, `/api/world/link-rooms` (§6, §4.9, §4.3).

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use atlas_core::error::EngineError;
use atlas_telemetry::{with_telemetry, EventName};
use atlas_types::{AreaGenerationRequest, Direction, GenerationMode, LocationId, Terrain};

use crate::dto::common::Envelope;
use crate::dto::world::{
    GenerateAreaRequest, GenerateAreaResponse, LinkRoomsRequest, LinkRoomsResponse,
};
use crate::error::ApiError;
use crate::extractors::CorrelationId;
use crate::state::AppState;

fn parse_mode(raw: &str) -> Result<GenerationMode, EngineError> {
    match raw {
        "urban" => Ok(GenerationMode::Urban),
        "wilderness" => Ok(GenerationMode::Wilderness),
        "auto" => Ok(GenerationMode::Auto),
        other => Err(EngineError::Validation {
            message: format!("unknown generation mode: {other}"),
        }),
    }
}

fn terrain_str(terrain: Terrain) -> String {
    match terrain {
        Terrain::Urban => "urban",
        Terrain::Wilderness => "wilderness",
    }
    .to_string()
}

#[utoipa::path(
    post,
    path = "/api/world/generate-area",
    tag = "World",
    request_body = GenerateAreaRequest,
    responses(
        (status = 200, description = "Area generation enqueued", body = GenerateAreaResponse),
        (status = 400, description = "Validation error")
    )
)]
pub async fn generate_area(
    State(state): State<Arc<AppState>>,
    CorrelationId(correlation_id): CorrelationId,
    Json(body): Json<GenerateAreaRequest>,
) -> Result<Json<Envelope<GenerateAreaResponse>>, ApiError> {
    let sink = state.engine.event_sink();

    let mode = parse_mode(&body.mode).map_err(|err| ApiError::new(err, correlation_id.clone()))?;

    let request = AreaGenerationRequest {
        anchor_location_id: body.anchor_location_id.map(LocationId::from_uuid),
        mode,
        budget_locations: body.budget_locations,
        realm_hints: body.realm_hints,
        idempotency_key: body.idempotency_key,
    };

    let result = with_telemetry(
        sink.as_ref(),
        EventName::WorldAreaGenerationRequested,
        EventName::WorldAreaGenerationRequested,
        correlation_id.clone(),
        None,
        "atlas-api",
        || {
            state
                .engine
                .orchestrate_area_generation(request, correlation_id.clone())
        },
    )
    .await
    .map_err(|err| ApiError::new(err, correlation_id.clone()))?;

    Ok(Json(Envelope::ok(
        GenerateAreaResponse {
            enqueued_count: result.enqueued_count,
            anchor_location_id: result.anchor_location_id.0,
            terrain: terrain_str(result.terrain),
            idempotency_key: result.idempotency_key,
            clamped: result.clamped,
            max_budget: state.engine.max_budget_locations(),
        },
        correlation_id,
    )))
}

#[utoipa::path(
    post,
    path = "/api/world/link-rooms",
    tag = "World",
    request_body = LinkRoomsRequest,
    responses(
        (status = 200, description = "Rooms linked", body = LinkRoomsResponse),
        (status = 409, description = "Link conflict")
    )
)]
pub async fn link_rooms(
    State(state): State<Arc<AppState>>,
    CorrelationId(correlation_id): CorrelationId,
    Json(body): Json<LinkRoomsRequest>,
) -> Result<Json<Envelope<LinkRoomsResponse>>, ApiError> {
    let direction = Direction::parse(&body.dir).ok_or_else(|| {
        ApiError::new(
            EngineError::Validation {
                message: format!("unknown direction: {}", body.dir),
            },
            correlation_id.clone(),
        )
    })?;

    let sink = state.engine.event_sink();

    let outcome = with_telemetry(
        sink.as_ref(),
        EventName::WorldExitCreated,
        EventName::WorldExitCreated,
        correlation_id.clone(),
        None,
        "atlas-api",
        || {
            state.engine.link_rooms(
                LocationId::from_uuid(body.origin_id),
                LocationId::from_uuid(body.dest_id),
                direction,
                body.reciprocal.unwrap_or(false),
                body.description,
            )
        },
    )
    .await
    .map_err(|err| ApiError::new(err, correlation_id.clone()))?;

    Ok(Json(Envelope::ok(
        LinkRoomsResponse {
            created: outcome.forward.created,
            reciprocal_created: outcome.reciprocal.map(|r| r.created),
        },
        correlation_id,
    )))
}
