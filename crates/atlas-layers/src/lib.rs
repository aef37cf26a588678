//! Atlas Layers - the description layer store and integrity job (C6, §4.6)
//!
//! Layers are append-only: `set_layer_for_location`/`set_layer_for_realm`
//! always insert a new record rather than mutating one in place, so the
//! temporal history of a location's description is fully reconstructible.
//! Resolution walks location scope first, then the realm containment
//! chain outward; see [`resolution`] for the shared logic.

pub mod error;
pub mod integrity;
pub mod memory;
pub mod resolution;

pub use error::{LayersError, LayersResult};
pub use integrity::{run_integrity_job, IntegrityMismatch, IntegrityReport};
pub use memory::InMemoryDescriptionLayerStore;

use async_trait::async_trait;
use atlas_types::{
    DescriptionLayer, DescriptionLayerId, LayerType, LocationId, RealmContainment, RealmId,
    RealmTier,
};

/// The description layer store: temporal, realm-inheritable text layers
/// describing locations, never updated in place.
#[async_trait]
pub trait DescriptionLayerStore: Send + Sync {
    async fn set_layer_for_location(
        &self,
        location_id: LocationId,
        layer_type: LayerType,
        value: String,
        effective_from_tick: i64,
        effective_to_tick: Option<i64>,
        metadata: Option<serde_json::Value>,
    ) -> LayersResult<DescriptionLayer>;

    async fn set_layer_for_realm(
        &self,
        tier: RealmTier,
        realm_id: RealmId,
        layer_type: LayerType,
        value: String,
        effective_from_tick: i64,
        effective_to_tick: Option<i64>,
        metadata: Option<serde_json::Value>,
    ) -> LayersResult<DescriptionLayer>;

    /// Resolves the active layer per §4.6: location scope, then the
    /// containment chain outward from `Local` to `Global`.
    async fn get_active_layer_for_location(
        &self,
        location_id: LocationId,
        layer_type: LayerType,
        tick: i64,
        containment: &RealmContainment,
    ) -> LayersResult<Option<DescriptionLayer>>;

    /// Admin-only: removes a layer by id. Callers are responsible for
    /// authorization; this store does not enforce it.
    async fn delete_layer(
        &self,
        layer_id: DescriptionLayerId,
        scope_id: &str,
    ) -> LayersResult<bool>;

    /// All layers across every scope, for the integrity job.
    async fn list_all(&self) -> LayersResult<Vec<DescriptionLayer>>;

    /// Persists a freshly computed integrity hash for `layer_id`.
    async fn set_integrity_hash(
        &self,
        layer_id: DescriptionLayerId,
        hash: String,
    ) -> LayersResult<()>;
}
