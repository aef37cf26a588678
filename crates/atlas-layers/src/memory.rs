//! In-memory [`DescriptionLayerStore`]. The durable ("cosmos")
//! implementation lives in `atlas-db`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use atlas_types::{
    DescriptionLayer, DescriptionLayerId, LayerScope, LayerType, LocationId, RealmContainment,
    RealmId, RealmTier,
};
use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::{LayersError, LayersResult};
use crate::resolution::{containment_walk_order, pick_latest_valid};
use crate::DescriptionLayerStore;

#[derive(Default)]
pub struct InMemoryDescriptionLayerStore {
    // Keyed by the scope id string (`loc:<id>` or `realm:<realmId>`); each
    // scope's layers are appended to, never mutated, matching the
    // append-only temporal model.
    layers: Arc<RwLock<HashMap<String, Vec<DescriptionLayer>>>>,
}

impl InMemoryDescriptionLayerStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn append(
        &self,
        scope: LayerScope,
        layer_type: LayerType,
        value: String,
        effective_from_tick: i64,
        effective_to_tick: Option<i64>,
        metadata: Option<serde_json::Value>,
    ) -> DescriptionLayer {
        let layer = DescriptionLayer {
            id: DescriptionLayerId::new(),
            scope: scope.clone(),
            layer_type,
            value,
            effective_from_tick,
            effective_to_tick,
            authored_at: Utc::now(),
            metadata,
            integrity_hash: None,
        };
        let mut guard = self.layers.write().await;
        guard
            .entry(scope.as_scope_id())
            .or_default()
            .push(layer.clone());
        layer
    }
}

#[async_trait]
impl DescriptionLayerStore for InMemoryDescriptionLayerStore {
    async fn set_layer_for_location(
        &self,
        location_id: LocationId,
        layer_type: LayerType,
        value: String,
        effective_from_tick: i64,
        effective_to_tick: Option<i64>,
        metadata: Option<serde_json::Value>,
    ) -> LayersResult<DescriptionLayer> {
        Ok(self
            .append(
                LayerScope::Location(location_id),
                layer_type,
                value,
                effective_from_tick,
                effective_to_tick,
                metadata,
            )
            .await)
    }

    async fn set_layer_for_realm(
        &self,
        tier: RealmTier,
        realm_id: RealmId,
        layer_type: LayerType,
        value: String,
        effective_from_tick: i64,
        effective_to_tick: Option<i64>,
        metadata: Option<serde_json::Value>,
    ) -> LayersResult<DescriptionLayer> {
        Ok(self
            .append(
                LayerScope::Realm(tier, realm_id),
                layer_type,
                value,
                effective_from_tick,
                effective_to_tick,
                metadata,
            )
            .await)
    }

    async fn get_active_layer_for_location(
        &self,
        location_id: LocationId,
        layer_type: LayerType,
        tick: i64,
        containment: &RealmContainment,
    ) -> LayersResult<Option<DescriptionLayer>> {
        let guard = self.layers.read().await;

        let location_scope_id = LayerScope::Location(location_id).as_scope_id();
        if let Some(candidates) = guard.get(&location_scope_id) {
            let narrowed: Vec<DescriptionLayer> = candidates
                .iter()
                .filter(|l| l.layer_type == layer_type)
                .cloned()
                .collect();
            if let Some(found) = pick_latest_valid(&narrowed, tick) {
                return Ok(Some(found.clone()));
            }
        }

        for (tier, realm_id) in containment_walk_order(containment) {
            let realm_scope_id = format!("realm:{realm_id}");
            if let Some(candidates) = guard.get(&realm_scope_id) {
                let narrowed: Vec<DescriptionLayer> = candidates
                    .iter()
                    .filter(|l| l.layer_type == layer_type && matches!(&l.scope, LayerScope::Realm(t, _) if *t == tier))
                    .cloned()
                    .collect();
                if let Some(found) = pick_latest_valid(&narrowed, tick) {
                    return Ok(Some(found.clone()));
                }
            }
        }

        Ok(None)
    }

    async fn delete_layer(
        &self,
        layer_id: DescriptionLayerId,
        scope_id: &str,
    ) -> LayersResult<bool> {
        let mut guard = self.layers.write().await;
        let Some(bucket) = guard.get_mut(scope_id) else {
            return Ok(false);
        };
        let before = bucket.len();
        bucket.retain(|l| l.id != layer_id);
        Ok(bucket.len() != before)
    }

    async fn list_all(&self) -> LayersResult<Vec<DescriptionLayer>> {
        let guard = self.layers.read().await;
        Ok(guard.values().flatten().cloned().collect())
    }

    async fn set_integrity_hash(
        &self,
        layer_id: DescriptionLayerId,
        hash: String,
    ) -> LayersResult<()> {
        let mut guard = self.layers.write().await;
        for bucket in guard.values_mut() {
            if let Some(layer) = bucket.iter_mut().find(|l| l.id == layer_id) {
                layer.integrity_hash = Some(hash);
                return Ok(());
            }
        }
        Err(LayersError::NotFound {
            layer_id: layer_id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn containment(location_id: LocationId, realms: [Option<RealmId>; 5]) -> RealmContainment {
        RealmContainment {
            location_id,
            realms,
        }
    }

    #[tokio::test]
    async fn location_layer_wins_over_realm() {
        let store = InMemoryDescriptionLayerStore::new();
        let loc = LocationId::new();
        store
            .set_layer_for_realm(
                RealmTier::Global,
                RealmId("world".to_string()),
                LayerType::Weather,
                "global overcast".to_string(),
                0,
                None,
                None,
            )
            .await
            .unwrap();
        store
            .set_layer_for_location(
                loc,
                LayerType::Weather,
                "local drizzle".to_string(),
                0,
                None,
                None,
            )
            .await
            .unwrap();

        let containment = containment(
            loc,
            [None, None, None, None, Some(RealmId("world".to_string()))],
        );
        let active = store
            .get_active_layer_for_location(loc, LayerType::Weather, 5, &containment)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(active.value, "local drizzle");
    }

    #[tokio::test]
    async fn falls_back_to_containment_chain_when_no_location_layer() {
        let store = InMemoryDescriptionLayerStore::new();
        let loc = LocationId::new();
        store
            .set_layer_for_realm(
                RealmTier::Regional,
                RealmId("north-wind".to_string()),
                LayerType::Weather,
                "regional fog".to_string(),
                0,
                None,
                None,
            )
            .await
            .unwrap();
        store
            .set_layer_for_realm(
                RealmTier::Global,
                RealmId("world".to_string()),
                LayerType::Weather,
                "global overcast".to_string(),
                0,
                None,
                None,
            )
            .await
            .unwrap();

        let containment = containment(
            loc,
            [
                None,
                Some(RealmId("north-wind".to_string())),
                None,
                None,
                Some(RealmId("world".to_string())),
            ],
        );
        let active = store
            .get_active_layer_for_location(loc, LayerType::Weather, 5, &containment)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(active.value, "regional fog");
    }

    #[tokio::test]
    async fn returns_none_when_nothing_matches() {
        let store = InMemoryDescriptionLayerStore::new();
        let loc = LocationId::new();
        let containment = containment(loc, [None, None, None, None, None]);
        let active = store
            .get_active_layer_for_location(loc, LayerType::Weather, 5, &containment)
            .await
            .unwrap();
        assert!(active.is_none());
    }

    #[tokio::test]
    async fn set_layer_never_mutates_prior_entries() {
        let store = InMemoryDescriptionLayerStore::new();
        let loc = LocationId::new();
        store
            .set_layer_for_location(loc, LayerType::Base, "first".to_string(), 0, None, None)
            .await
            .unwrap();
        store
            .set_layer_for_location(loc, LayerType::Base, "second".to_string(), 0, None, None)
            .await
            .unwrap();
        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn delete_layer_removes_by_id() {
        let store = InMemoryDescriptionLayerStore::new();
        let loc = LocationId::new();
        let layer = store
            .set_layer_for_location(loc, LayerType::Base, "value".to_string(), 0, None, None)
            .await
            .unwrap();
        let scope_id = LayerScope::Location(loc).as_scope_id();
        let deleted = store.delete_layer(layer.id, &scope_id).await.unwrap();
        assert!(deleted);
        assert!(store.list_all().await.unwrap().is_empty());
    }
}
