//! Back-fill maintenance task: embed any active memory that was written
//! without one (a prior embedding-oracle outage, a bulk import, etc).
//!
//! Grounded in the same batching and graceful-degradation shape as
//! [`super::IngestionPipeline::ingest_candidates`]; kept as a separate
//! entry point since it is driven by a scan rather than fresh candidates.

use crate::embeddings::{embed_chunked, EmbeddingClient};
use crate::error::Result;
use crate::store::Store;
use std::sync::Arc;

/// How many rows are scanned at most in one back-fill pass.
pub const DEFAULT_BATCH_LIMIT: usize = 200;

/// Outcome of one back-fill pass.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct BackfillReport {
    pub scanned: usize,
    pub embedded: usize,
}

/// Scan for active memories missing an embedding, embed them in one
/// chunked batch, and write the embeddings back. If the embedding call
/// fails outright, the rows are left as-is for the next pass.
pub async fn run(
    store: &Arc<dyn Store>,
    embeddings: &Arc<dyn EmbeddingClient>,
    limit: usize,
) -> Result<BackfillReport> {
    let mut memories = store.missing_embeddings(limit).await?;
    let mut report = BackfillReport {
        scanned: memories.len(),
        embedded: 0,
    };
    if memories.is_empty() {
        return Ok(report);
    }

    let texts: Vec<String> = memories.iter().map(crate::types::Memory::embedding_text).collect();
    let vectors = embed_chunked(embeddings.as_ref(), &texts).await?;

    for (memory, vector) in memories.iter_mut().zip(vectors) {
        memory.embedding = Some(vector);
    }
    store.upsert_memories_batch(&memories).await?;
    report.embedded = memories.len();
    Ok(report)
}
