//! Description layers (§3, §4.6).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{DescriptionLayerId, LocationId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerType {
    Base,
    Ambient,
    Dynamic,
    Weather,
    Lighting,
}

/// A realm in the location's containment chain, walked outward from the
/// most specific tier when no location-scoped layer matches (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RealmTier {
    Local,
    Regional,
    Macro,
    Continental,
    Global,
}

impl RealmTier {
    /// The containment chain walk order, outward from `Local`.
    pub const WALK_ORDER: [RealmTier; 5] = [
        RealmTier::Local,
        RealmTier::Regional,
        RealmTier::Macro,
        RealmTier::Continental,
        RealmTier::Global,
    ];
}

/// Identifies a unique realm within a tier (e.g. a specific weather-zone
/// or continent), distinct from the tier itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealmId(pub String);

/// The scope a description layer is authored against: a single location,
/// or a realm that location inherits from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayerScope {
    Location(LocationId),
    Realm(RealmTier, RealmId),
}

impl LayerScope {
    pub fn as_scope_id(&self) -> String {
        match self {
            LayerScope::Location(id) => format!("loc:{id}"),
            LayerScope::Realm(_, realm_id) => format!("realm:{}", realm_id.0),
        }
    }
}

/// A temporally-scoped, priority-ordered, realm-inheritable text layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptionLayer {
    pub id: DescriptionLayerId,
    pub scope: LayerScope,
    pub layer_type: LayerType,
    pub value: String,
    pub effective_from_tick: i64,
    pub effective_to_tick: Option<i64>,
    pub authored_at: DateTime<Utc>,
    pub metadata: Option<serde_json::Value>,
    pub integrity_hash: Option<String>,
}

impl DescriptionLayer {
    /// Whether this layer is temporally valid at `tick`: `fromTick <=
    /// tick < (toTick ?? +inf)`.
    pub fn is_valid_at(&self, tick: i64) -> bool {
        self.effective_from_tick <= tick
            && self.effective_to_tick.map_or(true, |to| tick < to)
    }
}

/// A location's place in the realm containment chain, used to walk
/// outward from `Local` when no location-scoped layer matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealmContainment {
    pub location_id: LocationId,
    /// The realm id at each tier the location belongs to, in
    /// `RealmTier::WALK_ORDER`. A tier with no realm membership is `None`.
    pub realms: [Option<RealmId>; 5],
}
