//! The description-layer integrity job (§4.6 integrity job).
//!
//! Iterates every layer in fixed-size batches, computing `SHA-256(value)`.
//! First pass stores the hash; subsequent passes compare against it and
//! report a mismatch without blocking the caller. Re-running is a no-op
//! for layers whose hash is unchanged, unless `recompute_all` is set.

use sha2::{Digest, Sha256};

use crate::error::LayersResult;
use crate::DescriptionLayerStore;

/// A detected hash mismatch, carrying only truncated hashes and content
/// length, never the layer value itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityMismatch {
    pub layer_id: String,
    pub expected_hash_prefix: String,
    pub actual_hash_prefix: String,
    pub content_length: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegrityReport {
    pub scanned: usize,
    pub hashes_stored: usize,
    pub mismatches: Vec<IntegrityMismatch>,
}

fn truncated_hex(hash: &[u8]) -> String {
    let full = hex::encode(hash);
    full.chars().take(32).collect()
}

/// Runs one full pass of the integrity job against `store`, in batches of
/// `batch_size` (the spec's default is 100). `recompute_all` forces a hash
/// recomputation even for layers whose stored hash already matches.
pub async fn run_integrity_job(
    store: &dyn DescriptionLayerStore,
    batch_size: usize,
    recompute_all: bool,
) -> LayersResult<IntegrityReport> {
    let layers = store.list_all().await?;
    let mut report = IntegrityReport::default();

    for batch in layers.chunks(batch_size.max(1)) {
        for layer in batch {
            report.scanned += 1;
            let digest = Sha256::digest(layer.value.as_bytes());
            let computed_prefix = truncated_hex(&digest);

            match &layer.integrity_hash {
                None => {
                    store
                        .set_integrity_hash(layer.id, hex::encode(digest))
                        .await?;
                    report.hashes_stored += 1;
                }
                Some(stored) if !recompute_all && stored.starts_with(&computed_prefix) => {
                    // Unchanged since the last pass; nothing to do.
                }
                Some(stored) => {
                    let stored_prefix: String = stored.chars().take(32).collect();
                    if stored_prefix != computed_prefix {
                        tracing::warn!(
                            layer_id = %layer.id,
                            expected = %stored_prefix,
                            actual = %computed_prefix,
                            "Description.Integrity.Mismatch"
                        );
                        report.mismatches.push(IntegrityMismatch {
                            layer_id: layer.id.to_string(),
                            expected_hash_prefix: stored_prefix,
                            actual_hash_prefix: computed_prefix,
                            content_length: layer.value.len(),
                        });
                    }
                    if recompute_all {
                        store
                            .set_integrity_hash(layer.id, hex::encode(digest))
                            .await?;
                    }
                }
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryDescriptionLayerStore;
    use atlas_types::{LayerType, LocationId};

    #[tokio::test]
    async fn first_pass_stores_hashes_without_mismatches() {
        let store = InMemoryDescriptionLayerStore::new();
        store
            .set_layer_for_location(
                LocationId::new(),
                LayerType::Base,
                "a quiet courtyard".to_string(),
                0,
                None,
                None,
            )
            .await
            .unwrap();

        let report = run_integrity_job(&store, 100, false).await.unwrap();
        assert_eq!(report.scanned, 1);
        assert_eq!(report.hashes_stored, 1);
        assert!(report.mismatches.is_empty());
    }

    #[tokio::test]
    async fn second_pass_is_idempotent_when_unchanged() {
        let store = InMemoryDescriptionLayerStore::new();
        store
            .set_layer_for_location(
                LocationId::new(),
                LayerType::Base,
                "a quiet courtyard".to_string(),
                0,
                None,
                None,
            )
            .await
            .unwrap();

        run_integrity_job(&store, 100, false).await.unwrap();
        let second = run_integrity_job(&store, 100, false).await.unwrap();
        assert_eq!(second.hashes_stored, 0);
        assert!(second.mismatches.is_empty());
    }

    #[tokio::test]
    async fn detects_mismatch_when_stored_hash_is_tampered() {
        let store = InMemoryDescriptionLayerStore::new();
        let layer = store
            .set_layer_for_location(
                LocationId::new(),
                LayerType::Base,
                "a quiet courtyard".to_string(),
                0,
                None,
                None,
            )
            .await
            .unwrap();

        run_integrity_job(&store, 100, false).await.unwrap();
        store
            .set_integrity_hash(layer.id, "0".repeat(64))
            .await
            .unwrap();

        let report = run_integrity_job(&store, 100, false).await.unwrap();
        assert_eq!(report.mismatches.len(), 1);
        assert_eq!(report.mismatches[0].content_length, "a quiet courtyard".len());
    }
}
