//! The Move Pipeline (C8, §4.8).
//!
//! Orchestration shape generalized from a stage pipeline that resolves
//! input, checks it against domain state, performs the effecting call,
//! and emits a receipt event — here: normalize → resolve exit → move →
//! emit. Every stage either returns a mapped [`EngineError`] or proceeds;
//! nothing downstream is swallowed.

use atlas_core::direction::{normalize_direction, NormalizeOutcome};
use atlas_core::error::{EngineError, Result as EngineResult};
use atlas_core::exits::determine_exit_availability;
use atlas_debounce::ExitHintDebouncer;
use atlas_eventlog::WorldEventLog;
use atlas_graph::{LocationGraph, MoveFailureReason};
use atlas_telemetry::{with_telemetry, EventName, EventSink};
use atlas_types::{
    ActorKind, Direction, ExitAvailability, Location, LocationId, PlayerId, ScopeKey,
    WorldEventId, WorldEventRecord,
};

use crate::heading::HeadingStore;

/// Appends a record to the world event log for `event_type`, logging
/// (not propagating) a storage failure: per §4.8 the pipeline must not
/// swallow *downstream* exceptions that affect the response, but a
/// best-effort receipt append that fails after the move already
/// succeeded must not turn a 200 into a 500.
async fn record_move_event(
    event_log: &dyn WorldEventLog,
    event_type: &str,
    from_location_id: LocationId,
    to_location_id: Option<LocationId>,
    direction: Direction,
    player_id: Option<PlayerId>,
    correlation_id: &str,
) {
    let record = WorldEventRecord {
        id: WorldEventId::new(),
        scope_key: ScopeKey::Location(from_location_id),
        event_type: event_type.to_string(),
        status: atlas_types::EventStatus::Processed,
        occurred_utc: chrono::Utc::now(),
        ingested_utc: chrono::Utc::now(),
        processed_utc: Some(chrono::Utc::now()),
        actor_kind: if player_id.is_some() {
            ActorKind::Player
        } else {
            ActorKind::System
        },
        actor_id: player_id,
        correlation_id: correlation_id.to_string(),
        causation_id: None,
        idempotency_key: uuid::Uuid::new_v4().to_string(),
        payload: serde_json::json!({
            "from": from_location_id.to_string(),
            "to": to_location_id.map(|id| id.to_string()),
            "direction": direction.as_str(),
        }),
        processing_metadata: None,
        version: 0,
    };
    if let Err(err) = event_log.create(record).await {
        tracing::warn!(error = %err, event_type, "failed to append move receipt event");
    }
}

/// Input to [`move_player`].
#[derive(Debug, Clone)]
pub struct MoveRequest {
    pub from_id: Option<LocationId>,
    pub raw_direction: String,
    pub player_id: Option<PlayerId>,
    pub correlation_id: String,
}

/// The successful result of a move.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveOutcome {
    pub location: Location,
    pub from_location_id: LocationId,
    pub direction: Direction,
}

/// The collaborators a move pipeline run needs. Grouped into one struct
/// so `move_player` doesn't take seven separate `Arc` parameters.
pub struct MovePipelineDeps<'a> {
    pub graph: &'a dyn LocationGraph,
    pub event_log: &'a dyn WorldEventLog,
    pub debouncer: &'a dyn ExitHintDebouncer,
    pub heading_store: &'a dyn HeadingStore,
    pub event_sink: &'a dyn EventSink,
    pub starter_location_id: LocationId,
    pub debounce_window_ms: u64,
}

/// Runs the full §4.8 pipeline. Telemetry is emitted by the caller's
/// `with_telemetry` wrapper in `atlas-api`/`services/atlas-server`; this
/// function additionally emits the debounced
/// `Navigation.Exit.GenerationRequested` event inline, since that event's
/// emission is conditional on pipeline-internal state (the debounce
/// check) rather than purely on the call's success/failure.
pub async fn move_player(
    deps: &MovePipelineDeps<'_>,
    request: MoveRequest,
) -> EngineResult<MoveOutcome> {
    let from_id = request.from_id.unwrap_or(deps.starter_location_id);

    let heading = match request.player_id {
        Some(player_id) => deps.heading_store.get(player_id).await,
        None => None,
    };

    let canonical = match normalize_direction(&request.raw_direction, heading) {
        NormalizeOutcome::Ok { canonical } => canonical,
        NormalizeOutcome::Ambiguous { clarification } => {
            return Err(EngineError::AmbiguousDirection { clarification });
        }
        NormalizeOutcome::Unknown { clarification } => {
            return Err(EngineError::Validation {
                message: clarification,
            });
        }
    };

    let from = deps
        .graph
        .get(from_id)
        .await?
        .ok_or_else(|| EngineError::FromMissing {
            location_id: from_id.to_string(),
        })?;

    let availability = determine_exit_availability(
        canonical,
        &from.exits,
        from.exit_availability.as_ref(),
    )
    .availability;

    match availability {
        Some(ExitAvailability::Hard) => {}
        Some(ExitAvailability::Forbidden) => {
            return Err(EngineError::NoExit {
                from_location: from_id.to_string(),
                direction: canonical.as_str().to_string(),
            });
        }
        Some(ExitAvailability::Pending) | None => {
            if let Some(player_id) = request.player_id {
                let should_emit = deps
                    .debouncer
                    .should_emit(player_id, from_id, canonical, deps.debounce_window_ms)
                    .await
                    .unwrap_or(atlas_debounce::ShouldEmitOutcome {
                        emit: true,
                        debounce_hit: false,
                    });
                if should_emit.emit {
                    deps.event_sink
                        .emit(atlas_telemetry::TelemetryEvent {
                            event_name: EventName::NavigationExitGenerationRequested,
                            correlation_id: request.correlation_id.clone(),
                            player_guid: Some(player_id.to_string()),
                            service: "atlas-engine".to_string(),
                            latency_ms: 0,
                            persistence_mode: None,
                            occurred_utc: chrono::Utc::now(),
                            extra: Some(serde_json::json!({
                                "originLocationId": from_id.to_string(),
                                "direction": canonical.as_str(),
                            })),
                        })
                        .await;
                }
            }
            return Err(EngineError::Generate {
                from_location: from_id.to_string(),
                direction: canonical.as_str().to_string(),
                origin_location_id: from_id.to_string(),
            });
        }
    }

    let move_result = deps.graph.move_from(from_id, canonical).await?;
    let location = match move_result {
        Ok(outcome) => outcome.location,
        Err(MoveFailureReason::FromMissing) => {
            return Err(EngineError::FromMissing {
                location_id: from_id.to_string(),
            })
        }
        Err(MoveFailureReason::NoExit) => {
            return Err(EngineError::NoExit {
                from_location: from_id.to_string(),
                direction: canonical.as_str().to_string(),
            })
        }
        Err(MoveFailureReason::TargetMissing) => {
            return Err(EngineError::TargetMissing {
                location_id: from_id.to_string(),
            })
        }
    };

    if let Some(player_id) = request.player_id {
        deps.heading_store.set(player_id, canonical).await;
    }

    // Both the deprecated `Location.Move` event and the current
    // `Navigation.Move.Success` event are appended on every successful
    // move, unconditionally (DESIGN.md Open Question 1).
    record_move_event(
        deps.event_log,
        "Location.Move",
        from_id,
        Some(location.id),
        canonical,
        request.player_id,
        &request.correlation_id,
    )
    .await;
    record_move_event(
        deps.event_log,
        "Navigation.Move.Success",
        from_id,
        Some(location.id),
        canonical,
        request.player_id,
        &request.correlation_id,
    )
    .await;

    Ok(MoveOutcome {
        location,
        from_location_id: from_id,
        direction: canonical,
    })
}

/// Convenience wrapper applying the telemetry envelope around
/// [`move_player`], emitting `on_success`/`on_failure` per §4.8's
/// `Location.Move`/`Navigation.Move.Success`/`Navigation.Move.Blocked`
/// event pair. Both the legacy and the current event names are emitted
/// unconditionally, per the Open Question decision recorded in
/// DESIGN.md.
pub async fn move_player_with_telemetry(
    deps: &MovePipelineDeps<'_>,
    request: MoveRequest,
) -> EngineResult<MoveOutcome> {
    let correlation_id = request.correlation_id.clone();
    let player_guid = request.player_id.map(|p| p.to_string());
    with_telemetry(
        deps.event_sink,
        EventName::NavigationMoveSuccess,
        EventName::NavigationMoveBlocked,
        correlation_id,
        player_guid,
        "atlas-engine",
        || async { move_player(deps, request).await },
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_debounce::InMemoryExitHintDebouncer;
    use atlas_eventlog::InMemoryWorldEventLog;
    use atlas_graph::{BidirectionalOptions, InMemoryLocationGraph};
    use atlas_telemetry::TracingEventSink;
    use atlas_types::Direction;

    use crate::heading::InMemoryHeadingStore;

    struct Fixture {
        graph: InMemoryLocationGraph,
        event_log: InMemoryWorldEventLog,
        debouncer: InMemoryExitHintDebouncer,
        heading_store: InMemoryHeadingStore,
        event_sink: TracingEventSink,
        start: LocationId,
        north_of_start: LocationId,
    }

    impl Fixture {
        async fn new() -> Self {
            let graph = InMemoryLocationGraph::new();
            let start = LocationId::new();
            let north_of_start = LocationId::new();

            graph
                .upsert(Location::new(start, "Start", "Where journeys begin"))
                .await
                .unwrap();
            graph
                .upsert(Location::new(north_of_start, "North Room", "A quiet room"))
                .await
                .unwrap();
            graph
                .ensure_exit_bidirectional(
                    start,
                    Direction::North,
                    north_of_start,
                    BidirectionalOptions {
                        reciprocal: true,
                        ..Default::default()
                    },
                )
                .await
                .unwrap();

            Self {
                graph,
                event_log: InMemoryWorldEventLog::new(),
                debouncer: InMemoryExitHintDebouncer::new(),
                heading_store: InMemoryHeadingStore::new(),
                event_sink: TracingEventSink {
                    service: "atlas-engine".to_string(),
                },
                start,
                north_of_start,
            }
        }

        fn deps(&self) -> MovePipelineDeps<'_> {
            MovePipelineDeps {
                graph: &self.graph,
                event_log: &self.event_log,
                debouncer: &self.debouncer,
                heading_store: &self.heading_store,
                event_sink: &self.event_sink,
                starter_location_id: self.start,
                debounce_window_ms: atlas_debounce::DEFAULT_DEBOUNCE_WINDOW_MS,
            }
        }
    }

    fn request(from_id: Option<LocationId>, raw_direction: &str) -> MoveRequest {
        MoveRequest {
            from_id,
            raw_direction: raw_direction.to_string(),
            player_id: Some(PlayerId::new()),
            correlation_id: "corr-1".to_string(),
        }
    }

    #[tokio::test]
    async fn moves_through_a_hard_exit_and_updates_heading() {
        let fixture = Fixture::new().await;
        let req = request(Some(fixture.start), "north");
        let player_id = req.player_id.unwrap();

        let outcome = move_player(&fixture.deps(), req).await.unwrap();

        assert_eq!(outcome.location.id, fixture.north_of_start);
        assert_eq!(outcome.direction, Direction::North);
        assert_eq!(
            fixture.heading_store.get(player_id).await,
            Some(Direction::North)
        );
    }

    #[tokio::test]
    async fn defaults_from_id_to_starter_location() {
        let fixture = Fixture::new().await;
        let req = request(None, "north");

        let outcome = move_player(&fixture.deps(), req).await.unwrap();

        assert_eq!(outcome.from_location_id, fixture.start);
    }

    #[tokio::test]
    async fn unknown_direction_is_a_validation_error() {
        let fixture = Fixture::new().await;
        let req = request(Some(fixture.start), "sideways");

        let err = move_player(&fixture.deps(), req).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation { .. }));
    }

    #[tokio::test]
    async fn ambiguous_relative_direction_without_heading() {
        let fixture = Fixture::new().await;
        let req = request(Some(fixture.start), "back");

        let err = move_player(&fixture.deps(), req).await.unwrap_err();
        assert!(matches!(err, EngineError::AmbiguousDirection { .. }));
    }

    #[tokio::test]
    async fn absent_exit_returns_generate_and_emits_debounced_hint() {
        let fixture = Fixture::new().await;
        let req = request(Some(fixture.start), "south");

        let err = move_player(&fixture.deps(), req).await.unwrap_err();
        assert!(matches!(err, EngineError::Generate { .. }));
    }

    #[tokio::test]
    async fn repeated_generate_requests_are_debounce_suppressed() {
        let fixture = Fixture::new().await;
        let player_id = PlayerId::new();

        let first = MoveRequest {
            from_id: Some(fixture.start),
            raw_direction: "south".to_string(),
            player_id: Some(player_id),
            correlation_id: "corr-a".to_string(),
        };
        move_player(&fixture.deps(), first).await.unwrap_err();

        let should_emit_again = fixture
            .debouncer
            .should_emit(
                player_id,
                fixture.start,
                Direction::South,
                atlas_debounce::DEFAULT_DEBOUNCE_WINDOW_MS,
            )
            .await
            .unwrap();
        assert!(!should_emit_again.emit);
        assert!(should_emit_again.debounce_hit);
    }

    #[tokio::test]
    async fn from_missing_location_is_reported() {
        let fixture = Fixture::new().await;
        let ghost = LocationId::new();
        let req = request(Some(ghost), "north");

        let err = move_player(&fixture.deps(), req).await.unwrap_err();
        assert!(matches!(err, EngineError::FromMissing { .. }));
    }

    #[tokio::test]
    async fn successful_move_appends_both_receipt_events() {
        let fixture = Fixture::new().await;
        let req = request(Some(fixture.start), "north");

        move_player(&fixture.deps(), req).await.unwrap();

        let recent = fixture.event_log.get_recent(10).await.unwrap();
        let event_types: Vec<&str> = recent.iter().map(|r| r.event_type.as_str()).collect();
        assert!(event_types.contains(&"Location.Move"));
        assert!(event_types.contains(&"Navigation.Move.Success"));
    }

    #[tokio::test]
    async fn telemetry_wrapper_propagates_errors_unchanged() {
        let fixture = Fixture::new().await;
        let req = request(Some(fixture.start), "sideways");

        let err = move_player_with_telemetry(&fixture.deps(), req)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation { .. }));
    }
}
