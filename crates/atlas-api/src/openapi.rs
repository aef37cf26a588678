//! OpenAPI documentation for the HTTP surface (§10.5).

use utoipa::OpenApi;

use crate::dto;
use crate::handlers;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "The Shifting Atlas - World Engine API",
        description = "HTTP surface for the temporal-spatial world engine: ping/health, player bootstrap, location lookup, move, and world generation.",
        version = "0.1.0"
    ),
    paths(
        handlers::health::ping,
        handlers::health::health,
        handlers::player::bootstrap,
        handlers::player::get,
        handlers::player::r#move,
        handlers::location::get,
        handlers::location::look,
        handlers::world::generate_area,
        handlers::world::link_rooms,
    ),
    components(schemas(
        dto::common::EnvelopeError,
        handlers::health::PingResponse,
        handlers::health::HealthResponse,
        dto::player::BootstrapResponse,
        dto::player::GetPlayerQuery,
        dto::player::GetPlayerResponse,
        dto::player::MoveQuery,
        dto::player::MoveResponse,
        dto::location::LocationQuery,
        dto::location::ExitInfoDto,
        dto::location::LocationResponse,
        dto::world::GenerateAreaRequest,
        dto::world::GenerateAreaResponse,
        dto::world::LinkRoomsRequest,
        dto::world::LinkRoomsResponse,
    )),
    tags(
        (name = "General", description = "Ping and health endpoints"),
        (name = "Player", description = "Player bootstrap, lookup, and movement"),
        (name = "Location", description = "Location lookup"),
        (name = "World", description = "World generation and room linking"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_doc_serializes() {
        let doc = ApiDoc::openapi();
        let json = doc.to_json().expect("OpenAPI doc should serialize to JSON");
        assert!(json.contains("\"title\""));
    }
}
