//! Route definitions for the HTTP surface (§6 External interfaces).

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

use crate::handlers;
use crate::state::AppState;

pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::health::ping))
        .route("/backend/health", get(handlers::health::health))
        .nest("/player", player_routes())
        .route("/location", get(handlers::location::get))
        .route("/location/look", get(handlers::location::look))
        .nest("/world", world_routes())
}

fn player_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bootstrap", get(handlers::player::bootstrap))
        .route("/get", get(handlers::player::get))
        .route(
            "/move",
            get(handlers::player::r#move).post(handlers::player::r#move),
        )
}

fn world_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/generate-area", post(handlers::world::generate_area))
        .route("/link-rooms", post(handlers::world::link_rooms))
}

pub fn swagger_routes() -> Router<Arc<AppState>> {
    use crate::openapi::ApiDoc;
    use utoipa::OpenApi;
    use utoipa_swagger_ui::SwaggerUi;

    Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_routes_build_without_panicking() {
        let _: Router<Arc<AppState>> = api_routes();
    }
}
