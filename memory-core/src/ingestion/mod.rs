//! The Ingestion Pipeline: id-level dedup, batched embedding, semantic
//! dedup, transactional upsert, and per-source fingerprinting.
//!
//! Channel-specific low-signal filters (minimum detail length,
//! thinking-aloud prefixes, routine-status lines) are applied upstream by
//! the extractors that produce candidate entries; this pipeline does not
//! re-filter.

pub mod backfill;
pub mod dedup;

use crate::embeddings::{embed_chunked, EmbeddingClient};
use crate::error::Result;
use crate::hashing;
use crate::store::Store;
use crate::types::{Memory, PatternType, Status};
use chrono::Utc;
use std::sync::Arc;

/// A candidate entry, already separated into fields by an upstream
/// extractor (markdown atomiser, session-transcript regex extractor,
/// reasoning-block LLM extractor). The pipeline treats all channels
/// uniformly from here on.
#[derive(Debug, Clone)]
pub struct CandidateEntry {
    pub domain: String,
    pub pattern_type: Option<PatternType>,
    pub title: String,
    pub detail: String,
    pub source: String,
    pub source_section: String,
    pub tags: Vec<String>,
    /// Constant per ingestion source, e.g. `atomic`, `session`, `reasoning`.
    pub channel: String,
}

/// Initial activation, retrieval count, and status for a freshly-ingested
/// memory.
const INITIAL_ACTIVATION: f64 = 0.5;
const INITIAL_RETRIEVAL_COUNT: u64 = 1;

/// One ingestion run's outcome.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct IngestReport {
    pub added: usize,
    pub skipped_id: usize,
    pub skipped_semantic: usize,
    pub errored: usize,
    /// Set when the source's fingerprint was unchanged and the whole run
    /// was skipped before any candidate was examined.
    pub skipped_unchanged_source: bool,
}

/// Lowercase a domain and replace runs of non-alphanumeric characters
/// with a single underscore.
#[must_use]
pub fn lower_snake(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_was_sep = false;
    for ch in s.trim().chars() {
        if ch.is_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            last_was_sep = false;
        } else if !last_was_sep && !out.is_empty() {
            out.push('_');
            last_was_sep = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

/// Compose a deterministic id: `lower_snake(domain):channel:shortHash(title)`.
#[must_use]
pub fn compose_id(domain: &str, channel: &str, title: &str) -> String {
    format!("{}:{}:{}", lower_snake(domain), channel, hashing::short_hash(title))
}

/// Orchestrates one ingestion run end-to-end.
pub struct IngestionPipeline {
    store: Arc<dyn Store>,
    embeddings: Arc<dyn EmbeddingClient>,
}

impl IngestionPipeline {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, embeddings: Arc<dyn EmbeddingClient>) -> Self {
        Self { store, embeddings }
    }

    /// Ingest a batch of candidates that were extracted from `source_key`
    /// (a stable path-like identifier). If `raw_content`'s fingerprint
    /// matches the last-seen fingerprint for this source and `force` is
    /// false, the whole run is skipped.
    pub async fn ingest_source(
        &self,
        source_key: &str,
        raw_content: &str,
        candidates: Vec<CandidateEntry>,
        force: bool,
    ) -> Result<IngestReport> {
        let meta_key = format!("atomize_hash:{source_key}");
        let fingerprint = hashing::fingerprint(raw_content);

        if !force {
            if let Some(previous) = self.store.get_meta(&meta_key).await? {
                if previous == fingerprint {
                    return Ok(IngestReport {
                        skipped_unchanged_source: true,
                        ..Default::default()
                    });
                }
            }
        }

        let report = self.ingest_candidates(candidates).await?;
        self.store.set_meta(&meta_key, &fingerprint).await?;
        Ok(report)
    }

    /// Ingest a batch of candidates with no source-level fingerprinting
    /// (used for ad hoc / CLI-driven ingestion).
    pub async fn ingest_candidates(&self, candidates: Vec<CandidateEntry>) -> Result<IngestReport> {
        let mut report = IngestReport::default();

        // Step 1-2: id composition + id-level dedup against active rows.
        let mut surviving: Vec<(String, CandidateEntry)> = Vec::new();
        for candidate in candidates {
            let id = compose_id(&candidate.domain, &candidate.channel, &candidate.title);
            match self.store.get_memory(&id).await {
                Ok(Some(existing)) if matches!(existing.status, Status::Active) => {
                    report.skipped_id += 1;
                }
                Ok(_) => surviving.push((id, candidate)),
                Err(_) => report.errored += 1,
            }
        }
        if surviving.is_empty() {
            return Ok(report);
        }

        // Step 3-4: build records, batch-embed.
        let now = Utc::now();
        let mut memories: Vec<Memory> = surviving
            .into_iter()
            .map(|(id, c)| Memory {
                id,
                title: crate::types::truncate_chars(&c.title, 120),
                detail: c.detail,
                domain: c.domain,
                pattern_type: c.pattern_type,
                source: c.source,
                source_section: c.source_section,
                created: now,
                last_retrieved: now,
                retrieval_count: INITIAL_RETRIEVAL_COUNT,
                activation: INITIAL_ACTIVATION,
                content_hash: hashing::content_hash(&c.detail),
                embedding: None,
                status: Status::Active,
                superseded_by: None,
                corrects: None,
                tags: c.tags,
            })
            .collect();

        let texts: Vec<String> = memories.iter().map(Memory::embedding_text).collect();
        match embed_chunked(self.embeddings.as_ref(), &texts).await {
            Ok(vectors) => {
                for (memory, vector) in memories.iter_mut().zip(vectors) {
                    memory.embedding = Some(vector);
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "embedding batch failed, inserting without embeddings");
            }
        }

        // Step 5: semantic dedup against the stored corpus and the
        // in-flight batch.
        let stored = self.store.scan_active_with_embedding().await?;
        let stored_embeddings: Vec<Vec<f32>> =
            stored.into_iter().filter_map(|m| m.embedding).collect();

        let mut kept: Vec<Memory> = Vec::with_capacity(memories.len());
        let mut kept_embeddings: Vec<Vec<f32>> = Vec::new();
        for memory in memories {
            if let Some(embedding) = &memory.embedding {
                if dedup::is_semantic_duplicate(embedding, &stored_embeddings, &kept_embeddings) {
                    report.skipped_semantic += 1;
                    continue;
                }
                kept_embeddings.push(embedding.clone());
            }
            kept.push(memory);
        }

        // Step 6: upsert surviving candidates and their tags in one batch.
        if !kept.is_empty() {
            self.store.upsert_memories_batch(&kept).await?;
            for memory in &kept {
                self.store.set_tags(&memory.id, &memory.tags).await?;
            }
            report.added = kept.len();
        }

        Ok(report)
    }
}
