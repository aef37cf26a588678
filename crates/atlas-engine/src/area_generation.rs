//! The Area Generation Orchestrator (C9, §4.9).
//!
//! Resolves an anchor, clamps the requested budget, derives a terrain
//! classification, computes (or accepts) an idempotency key, and enqueues
//! exactly one pending [`WorldEventRecord`] — deduplicating against the
//! World Event Log rather than trusting the caller not to retry.

use sha2::{Digest, Sha256};

use atlas_core::error::{EngineError, Result as EngineResult};
use atlas_eventlog::WorldEventLog;
use atlas_graph::LocationGraph;
use atlas_types::{
    ActorKind, AreaGenerationRequest, AreaGenerationResult, EventStatus, GenerationMode,
    LocationId, ScopeKey, Terrain, WorldEventId, WorldEventRecord,
};

/// Default cap on `budgetLocations`, matching `MAX_BUDGET_LOCATIONS`'s
/// configuration default.
pub const DEFAULT_MAX_BUDGET_LOCATIONS: i64 = 20;

/// Urban terrain is inferred when the anchor already has at least this
/// many hard exits, a proxy for "already a dense intersection" absent a
/// real neighborhood survey. Engineering decision, not spec-mandated.
const URBAN_EXIT_THRESHOLD: usize = 3;

fn clamp_budget(requested: i64, max_budget: i64) -> (i64, bool) {
    if requested < 1 {
        (1, true)
    } else if requested > max_budget {
        (max_budget, true)
    } else {
        (requested, false)
    }
}

fn derive_terrain(mode: GenerationMode, anchor_exit_count: usize) -> Terrain {
    match mode {
        GenerationMode::Urban => Terrain::Urban,
        GenerationMode::Wilderness => Terrain::Wilderness,
        GenerationMode::Auto => {
            if anchor_exit_count >= URBAN_EXIT_THRESHOLD {
                Terrain::Urban
            } else {
                Terrain::Wilderness
            }
        }
    }
}

/// A deterministic idempotency key derived from `(anchor, mode, budget,
/// sorted realm hints)`, used when the caller doesn't supply one.
fn derive_idempotency_key(
    anchor: LocationId,
    mode: GenerationMode,
    budget: i64,
    realm_hints: &Option<Vec<String>>,
) -> String {
    let mut hints = realm_hints.clone().unwrap_or_default();
    hints.sort();
    let basis = format!("{anchor}:{mode:?}:{budget}:{}", hints.join(","));
    let digest = Sha256::digest(basis.as_bytes());
    hex::encode(digest)
}

/// Runs the §4.9 orchestration given an already-resolved `starter_location_id`
/// to fall back on when `request.anchor_location_id` is absent.
pub async fn orchestrate_area_generation(
    graph: &dyn LocationGraph,
    event_log: &dyn WorldEventLog,
    starter_location_id: LocationId,
    max_budget_locations: i64,
    request: AreaGenerationRequest,
    correlation_id: String,
) -> EngineResult<AreaGenerationResult> {
    let anchor_id = request.anchor_location_id.unwrap_or(starter_location_id);
    let anchor = graph
        .get(anchor_id)
        .await?
        .ok_or_else(|| EngineError::LocationNotFound {
            location_id: anchor_id.to_string(),
        })?;

    let (budget, clamped) = clamp_budget(request.budget_locations, max_budget_locations);
    let terrain = derive_terrain(request.mode, anchor.exits.len());

    let idempotency_key = request
        .idempotency_key
        .clone()
        .unwrap_or_else(|| derive_idempotency_key(anchor_id, request.mode, budget, &request.realm_hints));

    if let Some(existing) = event_log
        .get_by_idempotency_key(&idempotency_key)
        .await?
    {
        if existing.status != EventStatus::DeadLettered {
            return Ok(AreaGenerationResult {
                enqueued_count: 0,
                anchor_location_id: anchor_id,
                terrain,
                idempotency_key,
                clamped,
            });
        }
    }

    let payload = serde_json::json!({
        "terrain": terrain,
        "budget": budget,
        "realmHints": request.realm_hints,
    });

    let record = WorldEventRecord {
        id: WorldEventId::new(),
        scope_key: ScopeKey::Location(anchor_id),
        event_type: "World.Area.GenerationRequested".to_string(),
        status: EventStatus::Pending,
        occurred_utc: chrono::Utc::now(),
        ingested_utc: chrono::Utc::now(),
        processed_utc: None,
        actor_kind: ActorKind::System,
        actor_id: None,
        correlation_id: correlation_id.clone(),
        causation_id: None,
        idempotency_key: idempotency_key.clone(),
        payload,
        processing_metadata: None,
        version: 0,
    };

    event_log.create(record).await?;

    Ok(AreaGenerationResult {
        enqueued_count: 1,
        anchor_location_id: anchor_id,
        terrain,
        idempotency_key,
        clamped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_eventlog::InMemoryWorldEventLog;
    use atlas_graph::InMemoryLocationGraph;
    use atlas_types::Location;

    async fn seeded_graph(anchor: LocationId) -> InMemoryLocationGraph {
        let graph = InMemoryLocationGraph::new();
        graph
            .upsert(Location::new(anchor, "Anchor", "An anchor location"))
            .await
            .unwrap();
        graph
    }

    #[tokio::test]
    async fn clamps_budget_below_one_and_above_max() {
        let anchor = LocationId::new();
        let graph = seeded_graph(anchor).await;
        let event_log = InMemoryWorldEventLog::new();

        let request = AreaGenerationRequest {
            anchor_location_id: Some(anchor),
            mode: GenerationMode::Wilderness,
            budget_locations: 0,
            realm_hints: None,
            idempotency_key: None,
        };
        let result = orchestrate_area_generation(
            &graph,
            &event_log,
            anchor,
            DEFAULT_MAX_BUDGET_LOCATIONS,
            request,
            "corr".to_string(),
        )
        .await
        .unwrap();
        assert!(result.clamped);
    }

    #[tokio::test]
    async fn repeat_idempotency_key_suppresses_second_enqueue() {
        let anchor = LocationId::new();
        let graph = seeded_graph(anchor).await;
        let event_log = InMemoryWorldEventLog::new();

        let request = || AreaGenerationRequest {
            anchor_location_id: Some(anchor),
            mode: GenerationMode::Wilderness,
            budget_locations: 5,
            realm_hints: None,
            idempotency_key: Some("fixed-key".to_string()),
        };

        let first = orchestrate_area_generation(
            &graph,
            &event_log,
            anchor,
            DEFAULT_MAX_BUDGET_LOCATIONS,
            request(),
            "corr".to_string(),
        )
        .await
        .unwrap();
        assert_eq!(first.enqueued_count, 1);

        let second = orchestrate_area_generation(
            &graph,
            &event_log,
            anchor,
            DEFAULT_MAX_BUDGET_LOCATIONS,
            request(),
            "corr".to_string(),
        )
        .await
        .unwrap();
        assert_eq!(second.enqueued_count, 0);
    }

    #[tokio::test]
    async fn missing_anchor_is_location_not_found() {
        let graph = InMemoryLocationGraph::new();
        let event_log = InMemoryWorldEventLog::new();
        let missing = LocationId::new();

        let request = AreaGenerationRequest {
            anchor_location_id: Some(missing),
            mode: GenerationMode::Auto,
            budget_locations: 5,
            realm_hints: None,
            idempotency_key: None,
        };
        let err = orchestrate_area_generation(
            &graph,
            &event_log,
            missing,
            DEFAULT_MAX_BUDGET_LOCATIONS,
            request,
            "corr".to_string(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, EngineError::LocationNotFound { .. }));
    }
}
