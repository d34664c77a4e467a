//! Semantic deduplication: reject a candidate whose embedding is too
//! close to something already in the store or already kept in this batch.

use crate::vector::cosine;

/// A candidate is rejected if any prior embedding scores at or above this
/// cosine similarity.
pub const SEMANTIC_DEDUP_THRESHOLD: f32 = 0.92;

/// How many of the most-similar stored embeddings are considered per
/// candidate.
pub const TOP_K_STORED: usize = 3;

/// Whether `candidate` is too similar to any of `stored_embeddings` (the
/// top-K most similar stored vectors) or any `batch_kept` embedding seen
/// earlier in the current ingestion batch.
#[must_use]
pub fn is_semantic_duplicate(
    candidate: &[f32],
    stored_embeddings: &[Vec<f32>],
    batch_kept: &[Vec<f32>],
) -> bool {
    let mut top: Vec<f32> = stored_embeddings
        .iter()
        .map(|e| cosine(Some(candidate), Some(e)))
        .collect();
    top.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    top.truncate(TOP_K_STORED);
    if top.iter().any(|&sim| sim > SEMANTIC_DEDUP_THRESHOLD) {
        return true;
    }
    batch_kept
        .iter()
        .any(|e| cosine(Some(candidate), Some(e)) > SEMANTIC_DEDUP_THRESHOLD)
}
