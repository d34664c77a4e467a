//! HTTP-backed embedding oracle client.
//!
//! Request/response contract: `POST` with JSON body
//! `{model, input: [text, ...]}`, response `{embeddings: [[float, ...], ...]}`,
//! batches of at most [`super::MAX_BATCH_SIZE`], 15-second timeout.

use super::EmbeddingClient;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Embedding oracle reachable over HTTP (e.g. a local Ollama instance or
/// a hosted embeddings endpoint).
pub struct HttpEmbeddingClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    dimension: usize,
}

impl HttpEmbeddingClient {
    /// Build a client against `base_url` using `model`, expecting
    /// `dimension`-length vectors back.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, dimension: usize) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(TIMEOUT)
            .build()
            .map_err(|e| Error::ConfigInvalid(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            model: model.into(),
            dimension,
        })
    }
}

#[async_trait]
impl EmbeddingClient for HttpEmbeddingClient {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.len() > super::MAX_BATCH_SIZE {
            return Err(Error::EmbedMalformed(format!(
                "batch of {} exceeds max of {}",
                texts.len(),
                super::MAX_BATCH_SIZE
            )));
        }
        let truncated: Vec<String> = texts
            .iter()
            .map(|t| crate::types::truncate_chars(t, 512))
            .collect();

        let url = format!("{}/api/embed", self.base_url.trim_end_matches('/'));
        let request = EmbedRequest {
            model: &self.model,
            input: &truncated,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::EmbedTimeout
                } else {
                    Error::EmbedUnavailable(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(Error::EmbedUnavailable(format!(
                "oracle responded with status {}",
                response.status()
            )));
        }

        let body: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::EmbedMalformed(e.to_string()))?;

        if body.embeddings.len() != truncated.len() {
            return Err(Error::EmbedMalformed(format!(
                "expected {} vectors, got {}",
                truncated.len(),
                body.embeddings.len()
            )));
        }

        Ok(body.embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
