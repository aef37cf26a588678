//! Atlas API - the HTTP surface for the Shifting Atlas world engine (§6).
//!
//! Every handler accepts bytes/query via `axum::Json`/`Query`, deserializes
//! into a boundary struct in [`dto`], and validates before crossing into
//! `atlas-engine::WorldEngine` (§9 Design Notes: "dynamic any at
//! boundaries" replaced by parsed-then-validated structs). `EngineError` is
//! mapped to an HTTP status exactly once, in [`error::ApiError`].

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::middleware as axum_middleware;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use state::AppState;

/// Assembles the full API router over `state`, including CORS, request
/// tracing, timing, correlation-id, and security-header middleware, plus
/// the Swagger UI.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", routes::api_routes())
        .merge(routes::swagger_routes())
        .layer(axum_middleware::from_fn(middleware::security_headers_middleware))
        .layer(axum_middleware::from_fn(middleware::correlation_id_middleware))
        .layer(axum_middleware::from_fn(middleware::timing_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
