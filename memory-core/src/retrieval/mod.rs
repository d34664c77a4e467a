//! The Retrieval Pipeline: query embedding → candidate scan → scoring →
//! diversity/budget selection → spreading-activation fill → side effects.

pub mod scoring;
pub mod selection;

use crate::activation::{self, RETRIEVAL_BUMP};
use crate::config::ScoringWeights;
use crate::cooccurrence;
use crate::embeddings::cache::EmbeddingCache;
use crate::embeddings::EmbeddingClient;
use crate::error::Result;
use crate::store::Store;
use crate::types::Memory;
use crate::vector;
use chrono::Utc;
use selection::{append_spread_fill, select_budgeted, Selected};
use std::sync::Arc;

/// Maximum spread-fill neighbours requested per retrieval.
pub const SPREAD_FILL_LIMIT: usize = 8;

/// Ids eligible for the post-return bump+wire side effects are capped at this many.
pub const SIDE_EFFECT_LIMIT: usize = 20;

/// Number of top-activation candidates scanned when there is neither a
/// query embedding nor domain hints.
pub const NO_HINT_SCAN_LIMIT: usize = 100;

/// One retrieval request.
#[derive(Debug, Clone)]
pub struct RetrievalRequest {
    pub query: String,
    /// 0–3 coarse domain hints.
    pub domains: Vec<String>,
    pub max_entries: usize,
    pub token_budget: u32,
    pub weights: ScoringWeights,
}

impl RetrievalRequest {
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            domains: Vec::new(),
            max_entries: 20,
            token_budget: 800,
            weights: ScoringWeights::default(),
        }
    }
}

/// One item in a retrieval result.
#[derive(Debug, Clone)]
pub struct RetrievedItem {
    pub memory: Memory,
    pub score: f64,
    pub spread_origin: bool,
}

/// The outcome of a retrieval: the ranked, budgeted, diversity-capped list.
#[derive(Debug, Clone, Default)]
pub struct RetrievalResult {
    pub items: Vec<RetrievedItem>,
    /// `true` if the query embedding could not be computed and retrieval
    /// fell back to domain-hint or activation-only candidate selection.
    pub degraded: bool,
}

/// Orchestrates one retrieval end-to-end, including the post-return
/// activation bump and co-occurrence wiring for the selected set.
pub struct RetrievalPipeline {
    store: Arc<dyn Store>,
    embeddings: Arc<dyn EmbeddingClient>,
    cache: EmbeddingCache,
    dimension: usize,
}

impl RetrievalPipeline {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, embeddings: Arc<dyn EmbeddingClient>, dimension: usize) -> Self {
        Self {
            store,
            embeddings,
            cache: EmbeddingCache::with_defaults(),
            dimension,
        }
    }

    /// Step 1: embed the query, using and populating the process-local cache.
    async fn embed_query(&self, query: &str) -> Option<Vec<f32>> {
        if query.trim().is_empty() {
            return None;
        }
        let truncated = crate::types::truncate_chars(query, 512);
        if let Some(cached) = self.cache.get(&truncated) {
            return Some(cached);
        }
        match self.embeddings.embed(&[truncated.clone()]).await {
            Ok(mut vectors) if !vectors.is_empty() => {
                let v = vectors.remove(0);
                self.cache.put(truncated, v.clone());
                Some(v)
            }
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "embedding oracle unavailable, degrading to activation-only retrieval");
                None
            }
        }
    }

    /// Step 2: select the candidate pool.
    async fn candidates(
        &self,
        query_embedding: &Option<Vec<f32>>,
        domains: &[String],
    ) -> Result<Vec<Memory>> {
        if query_embedding.is_some() {
            return self.store.scan_active_with_embedding().await;
        }
        if !domains.is_empty() {
            let mut out = Vec::new();
            for domain in domains {
                out.extend(self.store.scan_by_domain(domain).await?);
            }
            return Ok(out);
        }
        self.store.top_by_activation(NO_HINT_SCAN_LIMIT).await
    }

    /// Run the full pipeline and return the ranked, selected, filled result.
    pub async fn retrieve(&self, request: &RetrievalRequest) -> Result<RetrievalResult> {
        let query_embedding = self.embed_query(&request.query).await;
        let degraded = query_embedding.is_none() && !request.query.trim().is_empty();

        let mut candidates = self.candidates(&query_embedding, &request.domains).await?;

        // Step 3: hard semantic floor.
        if let Some(qe) = &query_embedding {
            candidates.retain(|m| {
                vector::cosine(Some(qe.as_slice()), m.embedding.as_deref()) >= scoring::SEMANTIC_FLOOR
            });
        }

        // Step 4: score.
        let activations: Vec<f64> = candidates.iter().map(|m| m.activation).collect();
        let p95 = activation::percentile_95(&activations);
        let now = Utc::now();

        let mut ranked: Vec<(Memory, f64)> = candidates
            .into_iter()
            .map(|m| {
                let sim = query_embedding
                    .as_ref()
                    .map_or(0.0, |qe| vector::cosine(Some(qe.as_slice()), m.embedding.as_deref()));
                let norm_act = activation::normalise(m.activation, p95);
                let breakdown =
                    scoring::score(&m, sim, norm_act, &request.domains, request.weights, now);
                (m, breakdown.total)
            })
            .collect();

        // Step 5: rank. Stable sort; ties are intentionally left unresolved.
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        // Step 6: diversity- and budget-bounded selection.
        let char_budget = (request.token_budget as usize) * 4;
        let (mut selected, mut used_chars) =
            select_budgeted(&ranked, char_budget, request.max_entries);

        // Step 7: spreading-activation fill.
        if (used_chars as f64) < selection::FILL_THRESHOLD * char_budget as f64 {
            let selected_ids: Vec<String> =
                selected.iter().map(|s| s.memory.id.clone()).collect();
            let remaining_slots = request.max_entries.saturating_sub(selected.len());
            if remaining_slots > 0 {
                let spread = cooccurrence::spread(
                    self.store.as_ref(),
                    &selected_ids,
                    SPREAD_FILL_LIMIT.min(remaining_slots),
                )
                .await?;
                let fill: Vec<(Memory, f64)> =
                    spread.into_iter().map(|s| (s.memory, s.boost)).collect();
                append_spread_fill(&mut selected, &mut used_chars, char_budget, fill);
            }
        }

        // Step 8: post-return side effects (bump + wire), synchronous with
        // respect to each other, run here because the engine has no
        // background thread of its own.
        self.apply_side_effects(&selected).await?;

        let items = selected
            .into_iter()
            .map(|s| RetrievedItem {
                memory: s.memory,
                score: s.score,
                spread_origin: s.spread_origin,
            })
            .collect();

        Ok(RetrievalResult { items, degraded })
    }

    async fn apply_side_effects(&self, selected: &[Selected]) -> Result<()> {
        let eligible: Vec<&Selected> = selected
            .iter()
            .filter(|s| s.memory.pattern_type.is_some() && !s.memory.domain.is_empty())
            .take(SIDE_EFFECT_LIMIT)
            .collect();
        if eligible.is_empty() {
            return Ok(());
        }
        let ids: Vec<String> = eligible.iter().map(|s| s.memory.id.clone()).collect();
        activation::bump(self.store.as_ref(), &ids, RETRIEVAL_BUMP).await?;

        let with_domain: Vec<(String, String)> = eligible
            .iter()
            .map(|s| (s.memory.id.clone(), s.memory.domain.clone()))
            .collect();
        cooccurrence::wire(self.store.as_ref(), &with_domain).await?;
        Ok(())
    }

    /// Embedding dimension this pipeline expects from the store/client.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::InMemoryStore;
    use crate::types::PatternType;
    use async_trait::async_trait;

    struct MockEmbeddings;

    #[async_trait]
    impl EmbeddingClient for MockEmbeddings {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0, 0.0]).collect())
        }
        fn dimension(&self) -> usize {
            3
        }
    }

    struct FailingEmbeddings;

    #[async_trait]
    impl EmbeddingClient for FailingEmbeddings {
        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Err(crate::error::Error::EmbedTimeout)
        }
        fn dimension(&self) -> usize {
            3
        }
    }

    fn pipeline_with(store: Arc<InMemoryStore>, embeddings: Arc<dyn EmbeddingClient>) -> RetrievalPipeline {
        RetrievalPipeline::new(store, embeddings, 3)
    }

    #[tokio::test]
    async fn exact_match_scenario_bumps_activation_and_count() {
        let store = Arc::new(InMemoryStore::new());
        store.seed_memory_full(
            "peekaboo-web:atomic:abc",
            "peekaboo-web",
            10.0,
            Some(vec![1.0, 0.0, 0.0]),
            Some(PatternType::Rule),
        );
        let pipeline = pipeline_with(store.clone(), Arc::new(MockEmbeddings));

        let mut request = RetrievalRequest::new("checkbox id");
        request.domains = vec!["peekaboo-web".to_string()];
        request.token_budget = 800;

        let result = pipeline.retrieve(&request).await.unwrap();
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].memory.id, "peekaboo-web:atomic:abc");

        let updated = store.get("peekaboo-web:atomic:abc").unwrap();
        assert!((updated.activation - 10.5).abs() < 1e-9);
        assert_eq!(updated.retrieval_count, 1);
    }

    #[tokio::test]
    async fn diversity_cap_limits_to_three_per_domain() {
        let store = Arc::new(InMemoryStore::new());
        for i in 0..10 {
            store.seed_memory_full(
                &format!("comfyui:atomic:{i}"),
                "comfyui",
                50.0,
                Some(vec![1.0, 0.0, 0.0]),
                Some(PatternType::Fact),
            );
        }
        for i in 0..2 {
            store.seed_memory_full(
                &format!("tts:atomic:{i}"),
                "tts",
                1.0,
                Some(vec![0.9, 0.1, 0.0]),
                Some(PatternType::Fact),
            );
        }
        let pipeline = pipeline_with(store, Arc::new(MockEmbeddings));
        let mut request = RetrievalRequest::new("anything");
        request.max_entries = 30;
        request.token_budget = 800;

        let result = pipeline.retrieve(&request).await.unwrap();
        let comfy_count = result
            .items
            .iter()
            .filter(|i| i.memory.domain == "comfyui" && !i.spread_origin)
            .count();
        assert_eq!(comfy_count, 3);
    }

    #[tokio::test]
    async fn semantic_floor_excludes_high_activation_low_similarity() {
        let store = Arc::new(InMemoryStore::new());
        store.seed_memory_full(
            "d:atomic:low-sim",
            "d",
            1000.0,
            Some(vec![0.0, 1.0, 0.0]),
            Some(PatternType::Fact),
        );
        let pipeline = pipeline_with(store, Arc::new(MockEmbeddings));
        let request = RetrievalRequest::new("matches first axis only");
        let result = pipeline.retrieve(&request).await.unwrap();
        assert!(result.items.is_empty());
    }

    #[tokio::test]
    async fn deprecated_memory_is_never_returned() {
        let store = Arc::new(InMemoryStore::new());
        store.seed_memory_full(
            "d:atomic:old",
            "d",
            100.0,
            Some(vec![1.0, 0.0, 0.0]),
            Some(PatternType::Fact),
        );
        store.deprecate("d:atomic:old", "d:atomic:new").await.unwrap();
        let pipeline = pipeline_with(store, Arc::new(MockEmbeddings));
        let request = RetrievalRequest::new("anything");
        let result = pipeline.retrieve(&request).await.unwrap();
        assert!(result.items.iter().all(|i| i.memory.id != "d:atomic:old"));
    }

    #[tokio::test]
    async fn empty_query_falls_back_to_activation_only() {
        let store = Arc::new(InMemoryStore::new());
        store.seed_memory_full("d:atomic:a", "d", 5.0, None, Some(PatternType::Fact));
        let pipeline = pipeline_with(store, Arc::new(MockEmbeddings));
        let request = RetrievalRequest::new("");
        let result = pipeline.retrieve(&request).await.unwrap();
        assert!(!result.degraded);
        assert_eq!(result.items.len(), 1);
    }

    #[tokio::test]
    async fn embedding_failure_degrades_gracefully() {
        let store = Arc::new(InMemoryStore::new());
        store.seed_memory_full("d:atomic:a", "d", 5.0, None, Some(PatternType::Fact));
        let pipeline = pipeline_with(store, Arc::new(FailingEmbeddings));
        let request = RetrievalRequest::new("some query text");
        let result = pipeline.retrieve(&request).await.unwrap();
        assert!(result.degraded);
        assert_eq!(result.items.len(), 1);
    }

    #[tokio::test]
    async fn max_entries_is_never_exceeded() {
        let store = Arc::new(InMemoryStore::new());
        for i in 0..50 {
            store.seed_memory_full(
                &format!("d{i}:atomic:x"),
                &format!("d{i}"),
                1.0,
                None,
                Some(PatternType::Fact),
            );
        }
        let pipeline = pipeline_with(store, Arc::new(MockEmbeddings));
        let mut request = RetrievalRequest::new("");
        request.max_entries = 5;
        let result = pipeline.retrieve(&request).await.unwrap();
        assert!(result.items.len() <= 5);
    }
}
