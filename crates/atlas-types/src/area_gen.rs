//! Area generation request/result shapes (§3 AreaGenerationRequest, §4.9).

use serde::{Deserialize, Serialize};

use crate::ids::LocationId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    Urban,
    Wilderness,
    Auto,
}

/// Terrain classification assigned by the orchestrator. When `mode =
/// auto`, this is derived from the anchor's neighborhood via the terrain
/// guidance table (§Glossary); otherwise it mirrors the requested mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Terrain {
    Urban,
    Wilderness,
}

impl Terrain {
    /// Terrain guidance (§Glossary): typical exit count and default
    /// directions an AI description worker should favor for this terrain.
    pub fn typical_exit_count(&self) -> u8 {
        match self {
            Terrain::Urban => 4,
            Terrain::Wilderness => 2,
        }
    }

    pub fn hint(&self) -> &'static str {
        match self {
            Terrain::Urban => "dense streets, buildings, frequent intersections",
            Terrain::Wilderness => "sparse paths, natural features, long sightlines",
        }
    }
}

/// A bounded expansion request (transient; never persisted as-is).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AreaGenerationRequest {
    pub anchor_location_id: Option<LocationId>,
    pub mode: GenerationMode,
    pub budget_locations: i64,
    pub realm_hints: Option<Vec<String>>,
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaGenerationResult {
    pub enqueued_count: u32,
    pub anchor_location_id: LocationId,
    pub terrain: Terrain,
    pub idempotency_key: String,
    pub clamped: bool,
}
