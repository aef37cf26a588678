//! End-to-end HTTP surface tests against the in-memory backend (§10.4).

use std::sync::Arc;

use atlas_api::state::AppState;
use atlas_debounce::InMemoryExitHintDebouncer;
use atlas_engine::{InMemoryHeadingStore, WorldEngine};
use atlas_eventlog::InMemoryWorldEventLog;
use atlas_graph::memory::InMemoryLocationGraph;
use atlas_players::InMemoryPlayerStore;
use atlas_telemetry::TracingEventSink;
use atlas_types::{Direction, Exit, Location, LocationId};
use axum_test::TestServer;
use serde_json::Value;

async fn test_server() -> (TestServer, LocationId) {
    let starter_id = LocationId::new();
    let graph = Arc::new(InMemoryLocationGraph::new());
    let mut starter = Location::new(starter_id, "The Plaza", "A sunlit plaza.");
    let north_id = LocationId::new();
    starter.exits.push(Exit {
        direction: Direction::North,
        to_location_id: north_id,
        description: None,
        kind: None,
    });
    Location::sort_exits_canonical(&mut starter.exits);
    starter.regenerate_exits_summary();
    graph.upsert(starter).await.unwrap();
    graph
        .upsert(Location::new(north_id, "North Hall", "A quiet hall."))
        .await
        .unwrap();

    let engine = Arc::new(WorldEngine::new(
        graph,
        Arc::new(InMemoryWorldEventLog::new()),
        Arc::new(InMemoryExitHintDebouncer::new()),
        Arc::new(InMemoryHeadingStore::new()),
        Arc::new(InMemoryPlayerStore::new()),
        Arc::new(TracingEventSink {
            service: "atlas-api-tests".to_string(),
        }),
        starter_id,
    ));

    let state = Arc::new(AppState::new(engine, "atlas-api-tests"));
    let router = atlas_api::create_router(state);
    (TestServer::new(router).unwrap(), starter_id)
}

#[tokio::test]
async fn ping_echoes_the_message_and_the_envelope_shape() {
    let (server, _) = test_server().await;
    let response = server.get("/api/ping").add_query_param("msg", "hello").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["reply"], "hello");
    assert!(body["correlationId"].is_string());
}

#[tokio::test]
async fn bootstrap_without_a_header_mints_a_fresh_guest_and_is_idempotent_on_replay() {
    let (server, starter_id) = test_server().await;

    let first = server.get("/api/player/bootstrap").await;
    first.assert_status_ok();
    let first_body: Value = first.json();
    assert_eq!(first_body["data"]["created"], true);
    assert_eq!(
        first_body["data"]["currentLocationId"],
        starter_id.0.to_string()
    );

    let guid = first_body["data"]["playerGuid"].as_str().unwrap().to_string();
    let second = server
        .get("/api/player/bootstrap")
        .add_header("x-player-guid", &guid)
        .await;
    second.assert_status_ok();
    let second_body: Value = second.json();
    assert_eq!(second_body["data"]["created"], false);
    assert_eq!(second_body["data"]["playerGuid"], guid);
}

#[tokio::test]
async fn move_north_from_the_starter_location_succeeds() {
    let (server, starter_id) = test_server().await;

    let bootstrap = server.get("/api/player/bootstrap").await;
    let guid = bootstrap.json::<Value>()["data"]["playerGuid"]
        .as_str()
        .unwrap()
        .to_string();

    let response = server
        .get("/api/player/move")
        .add_query_param("dir", "north")
        .add_header("x-player-guid", &guid)
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["fromLocationId"], starter_id.0.to_string());
    assert_eq!(body["data"]["direction"], "north");
}

#[tokio::test]
async fn move_in_an_unknown_direction_returns_a_validation_error_envelope() {
    let (server, _) = test_server().await;
    let response = server
        .get("/api/player/move")
        .add_query_param("dir", "diagonal-north")
        .await;
    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "ValidationError");
}

#[tokio::test]
async fn location_lookup_returns_404_for_an_unknown_id() {
    let (server, _) = test_server().await;
    let response = server
        .get("/api/location")
        .add_query_param("id", uuid::Uuid::new_v4().to_string())
        .await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn location_lookup_reports_canonical_exits_for_the_starter() {
    let (server, starter_id) = test_server().await;
    let response = server
        .get("/api/location")
        .add_query_param("id", starter_id.0.to_string())
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["exits"][0]["direction"], "north");
    assert_eq!(body["data"]["exits"][0]["availability"], "hard");
}

#[tokio::test]
async fn link_rooms_rejects_a_self_loop() {
    let (server, starter_id) = test_server().await;
    let response = server
        .post("/api/world/link-rooms")
        .json(&serde_json::json!({
            "originId": starter_id.0.to_string(),
            "destId": starter_id.0.to_string(),
            "dir": "east",
        }))
        .await;
    response.assert_status_bad_request();
}

#[tokio::test]
async fn generate_area_rejects_an_unknown_mode() {
    let (server, _) = test_server().await;
    let response = server
        .post("/api/world/generate-area")
        .json(&serde_json::json!({
            "mode": "not-a-real-mode",
            "budgetLocations": 5,
        }))
        .await;
    response.assert_status_bad_request();
}
