//! `WorldEngine`: the composition root wiring every subsystem crate's
//! trait object together behind the operations the outer API layer calls
//! (§9 Design Notes — explicit typed capability wiring, no reflective DI
//! container).

use std::sync::Arc;

use atlas_core::error::{EngineError, Result as EngineResult};
use atlas_debounce::ExitHintDebouncer;
use atlas_eventlog::WorldEventLog;
use atlas_graph::{BidirectionalOptions, EnsureExitBidirectionalOutcome, LocationGraph};
use atlas_players::{BootstrapOutcome, PlayerStore};
use atlas_telemetry::EventSink;
use atlas_types::{
    AreaGenerationRequest, AreaGenerationResult, Direction, LinkOutcome, Location, LocationId,
    Player, PlayerId,
};

use atlas_debounce::DEFAULT_DEBOUNCE_WINDOW_MS;

use crate::area_generation::{self, DEFAULT_MAX_BUDGET_LOCATIONS};
use crate::heading::HeadingStore;
use crate::move_pipeline::{self, MoveOutcome, MovePipelineDeps, MoveRequest};

/// Every collaborator the engine needs, held as `Arc<dyn Trait>` so the
/// composition root (`services/atlas-server`) can choose in-memory or
/// durable (`atlas-db`) implementations per capability without the engine
/// knowing which.
pub struct WorldEngine {
    graph: Arc<dyn LocationGraph>,
    event_log: Arc<dyn WorldEventLog>,
    debouncer: Arc<dyn ExitHintDebouncer>,
    heading_store: Arc<dyn HeadingStore>,
    players: Arc<dyn PlayerStore>,
    event_sink: Arc<dyn EventSink>,
    starter_location_id: LocationId,
    max_budget_locations: i64,
    debounce_window_ms: u64,
}

impl WorldEngine {
    pub fn new(
        graph: Arc<dyn LocationGraph>,
        event_log: Arc<dyn WorldEventLog>,
        debouncer: Arc<dyn ExitHintDebouncer>,
        heading_store: Arc<dyn HeadingStore>,
        players: Arc<dyn PlayerStore>,
        event_sink: Arc<dyn EventSink>,
        starter_location_id: LocationId,
    ) -> Self {
        Self {
            graph,
            event_log,
            debouncer,
            heading_store,
            players,
            event_sink,
            starter_location_id,
            max_budget_locations: DEFAULT_MAX_BUDGET_LOCATIONS,
            debounce_window_ms: DEFAULT_DEBOUNCE_WINDOW_MS,
        }
    }

    pub fn with_max_budget_locations(mut self, max_budget_locations: i64) -> Self {
        self.max_budget_locations = max_budget_locations;
        self
    }

    pub fn max_budget_locations(&self) -> i64 {
        self.max_budget_locations
    }

    pub fn with_debounce_window_ms(mut self, debounce_window_ms: u64) -> Self {
        self.debounce_window_ms = debounce_window_ms;
        self
    }

    /// The telemetry sink, for handlers that emit events outside the move
    /// pipeline's own `with_telemetry` wrapping (bootstrap, lookup, link).
    pub fn event_sink(&self) -> &Arc<dyn EventSink> {
        &self.event_sink
    }

    /// Looks up a location by id (`/api/location`, `/api/location/look`).
    pub async fn get_location(&self, id: LocationId) -> EngineResult<Option<Location>> {
        self.graph.get(id).await.map_err(Into::into)
    }

    /// Creates (or idempotently confirms) a directed exit between two
    /// existing locations, optionally with a reciprocal edge
    /// (`/api/world/link-rooms`).
    pub async fn link_rooms(
        &self,
        origin_id: LocationId,
        dest_id: LocationId,
        direction: Direction,
        reciprocal: bool,
        description: Option<String>,
    ) -> EngineResult<EnsureExitBidirectionalOutcome> {
        if origin_id == dest_id {
            return Err(EngineError::Validation {
                message: format!("location {origin_id} would form a self-loop"),
            });
        }
        self.graph
            .ensure_exit_bidirectional(
                origin_id,
                direction,
                dest_id,
                BidirectionalOptions {
                    reciprocal,
                    forward_description: description,
                    reverse_description: None,
                },
            )
            .await
            .map_err(Into::into)
    }

    fn deps(&self) -> MovePipelineDeps<'_> {
        MovePipelineDeps {
            graph: self.graph.as_ref(),
            event_log: self.event_log.as_ref(),
            debouncer: self.debouncer.as_ref(),
            heading_store: self.heading_store.as_ref(),
            event_sink: self.event_sink.as_ref(),
            starter_location_id: self.starter_location_id,
            debounce_window_ms: self.debounce_window_ms,
        }
    }

    /// Runs the move pipeline (C8, §4.8) under the telemetry envelope.
    ///
    /// When the caller doesn't pin `from_id` explicitly, it's resolved from
    /// the player's own stored location rather than falling back to the
    /// starter location — the starter fallback inside `move_pipeline` exists
    /// for anonymous/system-initiated moves, not for a known player who has
    /// already moved once. On success the player's stored location is
    /// advanced to match; this happens after the pipeline call returns so a
    /// failed move never mutates player state.
    pub async fn move_player(&self, mut request: MoveRequest) -> EngineResult<MoveOutcome> {
        if request.from_id.is_none() {
            if let Some(player_id) = request.player_id {
                if let Some(player) = self.players.get(player_id).await? {
                    request.from_id = Some(player.current_location_id);
                }
            }
        }

        let outcome = move_pipeline::move_player_with_telemetry(&self.deps(), request.clone()).await?;

        if let Some(player_id) = request.player_id {
            self.players
                .update_location(player_id, outcome.location.id)
                .await?;
        }

        Ok(outcome)
    }

    /// Bootstraps a guest (or returns the existing player unchanged if
    /// `requested_id` resolves) per the player bootstrap surface.
    pub async fn bootstrap_player(
        &self,
        requested_id: Option<PlayerId>,
    ) -> EngineResult<BootstrapOutcome> {
        self.players
            .bootstrap(requested_id, self.starter_location_id)
            .await
            .map_err(Into::into)
    }

    pub async fn get_player(&self, id: PlayerId) -> EngineResult<Option<Player>> {
        self.players.get(id).await.map_err(Into::into)
    }

    pub async fn link_player_external_id(
        &self,
        id: PlayerId,
        external_id: &str,
    ) -> EngineResult<(Player, LinkOutcome)> {
        self.players
            .link_external_id(id, external_id)
            .await
            .map_err(Into::into)
    }

    /// Runs the area generation orchestrator (C9, §4.9).
    pub async fn orchestrate_area_generation(
        &self,
        request: AreaGenerationRequest,
        correlation_id: String,
    ) -> EngineResult<AreaGenerationResult> {
        area_generation::orchestrate_area_generation(
            self.graph.as_ref(),
            self.event_log.as_ref(),
            self.starter_location_id,
            self.max_budget_locations,
            request,
            correlation_id,
        )
        .await
    }

    /// Who occupies `location_id` as of `world_tick`. Deferred per DESIGN.md
    /// Open Question 3: occupancy tracking needs a presence subsystem this
    /// workspace does not yet define, so this returns `NotImplemented`
    /// rather than guessing at a shape nothing else here produces.
    pub async fn occupants_at_tick(
        &self,
        _location_id: LocationId,
        _world_tick: i64,
    ) -> EngineResult<Vec<PlayerId>> {
        Err(EngineError::NotImplemented)
    }
}
