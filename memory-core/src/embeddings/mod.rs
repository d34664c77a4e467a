//! The Embedding Client: a stateless oracle mapping text to vectors.

pub mod cache;
pub mod circuit_breaker;
#[cfg(feature = "http-embeddings")]
pub mod http;

use crate::error::Result;
use async_trait::async_trait;

/// Maximum batch size accepted by [`EmbeddingClient::embed`].
pub const MAX_BATCH_SIZE: usize = 25;

/// Stateless oracle mapping a batch of texts (each truncated to 512
/// characters by the caller) to a batch of vectors of the same length
/// and order.
///
/// Implementations may fail with a transient error; callers must
/// tolerate absence and proceed in degraded mode rather than propagate a
/// hard failure up through the query path.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Embed a batch of texts. `texts.len()` must be `<= MAX_BATCH_SIZE`;
    /// larger batches should be chunked by the caller.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// The dimension this client produces.
    fn dimension(&self) -> usize;
}

/// Split `texts` into chunks of at most [`MAX_BATCH_SIZE`] and embed each
/// chunk in turn, concatenating the results. Fails fast on the first
/// chunk that errors; callers insert that batch without embeddings
/// rather than retry indefinitely.
pub async fn embed_chunked(client: &dyn EmbeddingClient, texts: &[String]) -> Result<Vec<Vec<f32>>> {
    let mut out = Vec::with_capacity(texts.len());
    for chunk in texts.chunks(MAX_BATCH_SIZE) {
        let mut vectors = client.embed(chunk).await?;
        out.append(&mut vectors);
    }
    Ok(out)
}
