//! PostgreSQL-backed [`DescriptionLayerStore`] (C6, §4.6).
//!
//! `scope` and `layer_type` are stored as JSONB rather than normalized
//! columns so the enum shapes defined in `atlas_types::layers` stay the
//! single source of truth; resolution logic is identical to the in-memory
//! store's, just reading from a query instead of a lock-guarded map.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};

use atlas_layers::error::{LayersError, LayersResult};
use atlas_layers::resolution::{containment_walk_order, pick_latest_valid};
use atlas_layers::DescriptionLayerStore;
use atlas_types::{
    DescriptionLayer, DescriptionLayerId, LayerScope, LayerType, LocationId, RealmContainment,
    RealmId, RealmTier,
};

pub struct PgDescriptionLayerStore {
    pool: PgPool,
}

impl PgDescriptionLayerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn decode(row: &sqlx::postgres::PgRow) -> LayersResult<DescriptionLayer> {
        let id_str: String = row.get("id");
        let id = DescriptionLayerId::parse(&id_str).map_err(|_| LayersError::Storage {
            message: format!("corrupt layer id in storage: {id_str}"),
        })?;
        let scope: LayerScope =
            serde_json::from_value(row.get("scope")).map_err(|e| LayersError::Storage {
                message: e.to_string(),
            })?;
        let layer_type: LayerType =
            serde_json::from_value(row.get("layer_type")).map_err(|e| LayersError::Storage {
                message: e.to_string(),
            })?;
        Ok(DescriptionLayer {
            id,
            scope,
            layer_type,
            value: row.get("value"),
            effective_from_tick: row.get("effective_from_tick"),
            effective_to_tick: row.get("effective_to_tick"),
            authored_at: row.get("authored_at"),
            metadata: row.get("metadata"),
            integrity_hash: row.get("integrity_hash"),
        })
    }

    async fn append(
        &self,
        scope: LayerScope,
        layer_type: LayerType,
        value: String,
        effective_from_tick: i64,
        effective_to_tick: Option<i64>,
        metadata: Option<serde_json::Value>,
    ) -> LayersResult<DescriptionLayer> {
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

        sqlx::query(
            r#"
            INSERT INTO description_layers
                (id, scope_id, scope, layer_type, value, effective_from_tick, effective_to_tick, authored_at, metadata, integrity_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(layer.id.to_string())
        .bind(scope.as_scope_id())
        .bind(serde_json::to_value(&layer.scope).unwrap())
        .bind(serde_json::to_value(&layer.layer_type).unwrap())
        .bind(&layer.value)
        .bind(layer.effective_from_tick)
        .bind(layer.effective_to_tick)
        .bind(layer.authored_at)
        .bind(&layer.metadata)
        .bind(&layer.integrity_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| LayersError::Storage {
            message: e.to_string(),
        })?;

        Ok(layer)
    }

    async fn candidates_for_scope(
        &self,
        scope_id: &str,
        layer_type: LayerType,
    ) -> LayersResult<Vec<DescriptionLayer>> {
        let rows = sqlx::query(
            r#"
            SELECT id, scope, layer_type, value, effective_from_tick, effective_to_tick, authored_at, metadata, integrity_hash
            FROM description_layers
            WHERE scope_id = $1 AND layer_type = $2
            "#,
        )
        .bind(scope_id)
        .bind(serde_json::to_value(layer_type).unwrap())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| LayersError::Storage {
            message: e.to_string(),
        })?;

        rows.iter().map(Self::decode).collect()
    }
}

#[async_trait]
impl DescriptionLayerStore for PgDescriptionLayerStore {
    async fn set_layer_for_location(
        &self,
        location_id: LocationId,
        layer_type: LayerType,
        value: String,
        effective_from_tick: i64,
        effective_to_tick: Option<i64>,
        metadata: Option<serde_json::Value>,
    ) -> LayersResult<DescriptionLayer> {
        self.append(
            LayerScope::Location(location_id),
            layer_type,
            value,
            effective_from_tick,
            effective_to_tick,
            metadata,
        )
        .await
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
        self.append(
            LayerScope::Realm(tier, realm_id),
            layer_type,
            value,
            effective_from_tick,
            effective_to_tick,
            metadata,
        )
        .await
    }

    async fn get_active_layer_for_location(
        &self,
        location_id: LocationId,
        layer_type: LayerType,
        tick: i64,
        containment: &RealmContainment,
    ) -> LayersResult<Option<DescriptionLayer>> {
        let location_scope_id = LayerScope::Location(location_id).as_scope_id();
        let candidates = self
            .candidates_for_scope(&location_scope_id, layer_type)
            .await?;
        if let Some(found) = pick_latest_valid(&candidates, tick) {
            return Ok(Some(found.clone()));
        }

        for (tier, realm_id) in containment_walk_order(containment) {
            let realm_scope_id = format!("realm:{realm_id}");
            let candidates = self
                .candidates_for_scope(&realm_scope_id, layer_type)
                .await?
                .into_iter()
                .filter(|l| matches!(&l.scope, LayerScope::Realm(t, _) if *t == tier))
                .collect::<Vec<_>>();
            if let Some(found) = pick_latest_valid(&candidates, tick) {
                return Ok(Some(found.clone()));
            }
        }

        Ok(None)
    }

    async fn delete_layer(
        &self,
        layer_id: DescriptionLayerId,
        scope_id: &str,
    ) -> LayersResult<bool> {
        let result = sqlx::query("DELETE FROM description_layers WHERE id = $1 AND scope_id = $2")
            .bind(layer_id.to_string())
            .bind(scope_id)
            .execute(&self.pool)
            .await
            .map_err(|e| LayersError::Storage {
                message: e.to_string(),
            })?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_all(&self) -> LayersResult<Vec<DescriptionLayer>> {
        let rows = sqlx::query(
            r#"
            SELECT id, scope, layer_type, value, effective_from_tick, effective_to_tick, authored_at, metadata, integrity_hash
            FROM description_layers
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| LayersError::Storage {
            message: e.to_string(),
        })?;
        rows.iter().map(Self::decode).collect()
    }

    async fn set_integrity_hash(
        &self,
        layer_id: DescriptionLayerId,
        hash: String,
    ) -> LayersResult<()> {
        let result = sqlx::query("UPDATE description_layers SET integrity_hash = $1 WHERE id = $2")
            .bind(&hash)
            .bind(layer_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| LayersError::Storage {
                message: e.to_string(),
            })?;
        if result.rows_affected() == 0 {
            return Err(LayersError::NotFound {
                layer_id: layer_id.to_string(),
            });
        }
        Ok(())
    }
}
