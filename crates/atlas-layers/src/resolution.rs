//! Pure resolution logic for `getActiveLayerForLocation` (§4.6 step 1-3),
//! shared by every backing store so the in-memory and durable
//! implementations can never disagree on resolution order.

use atlas_types::{DescriptionLayer, RealmContainment, RealmTier};

/// Picks the single active layer from `location_candidates` (already
/// filtered to `scope = loc:<locationId>` and `layer_type`): the temporally
/// valid entry with the latest `authored_at`. Ties broken by `authored_at`
/// descending only; a genuine tie (identical timestamp) keeps the first
/// encountered, which callers should avoid by giving layers distinct
/// authoring times.
pub fn pick_latest_valid(
    candidates: &[DescriptionLayer],
    tick: i64,
) -> Option<&DescriptionLayer> {
    candidates
        .iter()
        .filter(|layer| layer.is_valid_at(tick))
        .max_by_key(|layer| layer.authored_at)
}

/// Walks the realm containment chain outward from `Local`, returning the
/// tier/realm pairs to probe in order. Tiers the location has no
/// membership in are skipped.
pub fn containment_walk_order(
    containment: &RealmContainment,
) -> Vec<(RealmTier, &str)> {
    RealmTier::WALK_ORDER
        .iter()
        .zip(containment.realms.iter())
        .filter_map(|(tier, realm)| realm.as_ref().map(|r| (*tier, r.0.as_str())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_types::{DescriptionLayerId, LayerScope, LayerType, LocationId, RealmId};
    use chrono::{Duration, Utc};

    fn layer(
        scope: LayerScope,
        layer_type: LayerType,
        value: &str,
        authored_offset_secs: i64,
        from_tick: i64,
        to_tick: Option<i64>,
    ) -> DescriptionLayer {
        DescriptionLayer {
            id: DescriptionLayerId::new(),
            scope,
            layer_type,
            value: value.to_string(),
            effective_from_tick: from_tick,
            effective_to_tick: to_tick,
            authored_at: Utc::now() + Duration::seconds(authored_offset_secs),
            metadata: None,
            integrity_hash: None,
        }
    }

    #[test]
    fn picks_latest_authored_among_valid() {
        let loc = LocationId::new();
        let older = layer(
            LayerScope::Location(loc),
            LayerType::Ambient,
            "older",
            0,
            0,
            None,
        );
        let newer = layer(
            LayerScope::Location(loc),
            LayerType::Ambient,
            "newer",
            10,
            0,
            None,
        );
        let candidates = vec![older, newer];
        let picked = pick_latest_valid(&candidates, 5).unwrap();
        assert_eq!(picked.value, "newer");
    }

    #[test]
    fn ignores_temporally_invalid_candidates() {
        let loc = LocationId::new();
        let expired = layer(
            LayerScope::Location(loc),
            LayerType::Weather,
            "expired",
            10,
            0,
            Some(3),
        );
        let still_valid = layer(
            LayerScope::Location(loc),
            LayerType::Weather,
            "valid",
            0,
            0,
            None,
        );
        let candidates = vec![expired, still_valid];
        let picked = pick_latest_valid(&candidates, 5).unwrap();
        assert_eq!(picked.value, "valid");
    }

    #[test]
    fn containment_walk_skips_unmapped_tiers() {
        let loc = LocationId::new();
        let containment = RealmContainment {
            location_id: loc,
            realms: [
                None,
                Some(RealmId("north-wind".to_string())),
                None,
                None,
                Some(RealmId("world".to_string())),
            ],
        };
        let order = containment_walk_order(&containment);
        assert_eq!(order, vec![
            (RealmTier::Regional, "north-wind"),
            (RealmTier::Global, "world"),
        ]);
    }
}
