//! An in-memory [`Store`] implementation used only by unit tests in this
//! crate. `memory-store` provides the real `libsql`-backed implementation;
//! this one exists so that activation, co-occurrence, retrieval, and
//! ingestion logic can be tested without pulling in a database engine.

use crate::error::{Error, Result};
use crate::store::{NeighbourRow, Store, StoreStats};
use crate::types::{Memory, PatternType, Status};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Default)]
struct Inner {
    memories: HashMap<String, Memory>,
    edges: HashMap<(String, String), f64>,
    meta: HashMap<String, String>,
}

/// Thread-safe, process-local `Store` for tests.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a minimal active memory with the given id, domain, and activation.
    pub fn seed_memory(&self, id: &str, domain: &str, activation: f64) {
        self.seed_memory_full(id, domain, activation, None, None);
    }

    /// Insert a memory with full control over embedding and pattern type,
    /// used by retrieval/ingestion tests.
    pub fn seed_memory_full(
        &self,
        id: &str,
        domain: &str,
        activation: f64,
        embedding: Option<Vec<f32>>,
        pattern_type: Option<PatternType>,
    ) {
        let now = Utc::now();
        let memory = Memory {
            id: id.to_string(),
            title: format!("title-{id}"),
            detail: format!("detail for {id} with enough length to pass filters"),
            domain: domain.to_string(),
            pattern_type,
            source: "test".to_string(),
            source_section: String::new(),
            created: now,
            last_retrieved: now,
            retrieval_count: 0,
            activation,
            content_hash: crate::hashing::content_hash(&format!("detail-{id}")),
            embedding,
            status: Status::Active,
            superseded_by: None,
            corrects: None,
            tags: Vec::new(),
        };
        self.inner.lock().memories.insert(id.to_string(), memory);
    }

    pub fn insert_memory(&self, memory: Memory) {
        self.inner.lock().memories.insert(memory.id.clone(), memory);
    }

    pub fn seed_edge(&self, a: &str, b: &str, weight: f64) {
        let mut inner = self.inner.lock();
        inner.edges.insert((a.to_string(), b.to_string()), weight);
        inner.edges.insert((b.to_string(), a.to_string()), weight);
    }

    pub fn edge_weight(&self, a: &str, b: &str) -> f64 {
        self.inner
            .lock()
            .edges
            .get(&(a.to_string(), b.to_string()))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn get(&self, id: &str) -> Option<Memory> {
        self.inner.lock().memories.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().memories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn migrate(&self) -> Result<()> {
        Ok(())
    }

    async fn upsert_memory(&self, memory: &Memory) -> Result<()> {
        self.inner
            .lock()
            .memories
            .insert(memory.id.clone(), memory.clone());
        Ok(())
    }

    async fn upsert_memories_batch(&self, memories: &[Memory]) -> Result<()> {
        let mut inner = self.inner.lock();
        for m in memories {
            inner.memories.insert(m.id.clone(), m.clone());
        }
        Ok(())
    }

    async fn get_memory(&self, id: &str) -> Result<Option<Memory>> {
        Ok(self.inner.lock().memories.get(id).cloned())
    }

    async fn get_memories(&self, ids: &[String]) -> Result<Vec<Memory>> {
        let inner = self.inner.lock();
        Ok(ids.iter().filter_map(|id| inner.memories.get(id).cloned()).collect())
    }

    async fn scan_active_with_embedding(&self) -> Result<Vec<Memory>> {
        let inner = self.inner.lock();
        Ok(inner
            .memories
            .values()
            .filter(|m| matches!(m.status, Status::Active) && m.embedding.is_some())
            .cloned()
            .collect())
    }

    async fn scan_by_domain(&self, domain: &str) -> Result<Vec<Memory>> {
        let inner = self.inner.lock();
        let mut out: Vec<Memory> = inner
            .memories
            .values()
            .filter(|m| matches!(m.status, Status::Active) && m.domain == domain)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.activation.partial_cmp(&a.activation).unwrap());
        Ok(out)
    }

    async fn top_by_activation(&self, limit: usize) -> Result<Vec<Memory>> {
        let inner = self.inner.lock();
        let mut out: Vec<Memory> = inner
            .memories
            .values()
            .filter(|m| matches!(m.status, Status::Active))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.activation.partial_cmp(&a.activation).unwrap());
        out.truncate(limit);
        Ok(out)
    }

    async fn bump_activation(
        &self,
        ids: &[String],
        delta: f64,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        let mut inner = self.inner.lock();
        let mut affected = 0;
        for id in ids {
            if let Some(m) = inner.memories.get_mut(id) {
                m.activation += delta;
                m.retrieval_count += 1;
                m.last_retrieved = now;
                affected += 1;
            }
        }
        Ok(affected)
    }

    async fn decay_all(&self, factor: f64) -> Result<u64> {
        let mut inner = self.inner.lock();
        let mut count = 0;
        for m in inner.memories.values_mut() {
            m.activation *= factor;
            count += 1;
        }
        Ok(count)
    }

    async fn low_activation(&self, threshold: f64, limit: usize) -> Result<Vec<Memory>> {
        let inner = self.inner.lock();
        let mut out: Vec<Memory> = inner
            .memories
            .values()
            .filter(|m| m.activation < threshold)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.activation.partial_cmp(&b.activation).unwrap());
        out.truncate(limit);
        Ok(out)
    }

    async fn deprecate(&self, old_id: &str, new_id: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        if !inner.memories.contains_key(old_id) {
            return Err(Error::NotFound(old_id.to_string()));
        }
        let m = inner.memories.get_mut(old_id).expect("checked above");
        m.status = Status::Deprecated;
        m.superseded_by = Some(new_id.to_string());
        Ok(())
    }

    async fn mark_correction(&self, correction_id: &str, corrected_id: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        if !inner.memories.contains_key(correction_id) {
            return Err(Error::NotFound(correction_id.to_string()));
        }
        let m = inner.memories.get_mut(correction_id).expect("checked above");
        m.corrects = Some(corrected_id.to_string());
        Ok(())
    }

    async fn set_tags(&self, memory_id: &str, tags: &[String]) -> Result<()> {
        let mut inner = self.inner.lock();
        if let Some(m) = inner.memories.get_mut(memory_id) {
            m.tags = tags.to_vec();
        }
        Ok(())
    }

    async fn add_cooccurrence(&self, a: &str, b: &str, delta: f64) -> Result<()> {
        let mut inner = self.inner.lock();
        *inner.edges.entry((a.to_string(), b.to_string())).or_insert(0.0) += delta;
        *inner.edges.entry((b.to_string(), a.to_string())).or_insert(0.0) += delta;
        Ok(())
    }

    async fn add_cooccurrence_batch(&self, pairs: &[(String, String, f64)]) -> Result<()> {
        let mut inner = self.inner.lock();
        for (a, b, delta) in pairs {
            *inner.edges.entry((a.clone(), b.clone())).or_insert(0.0) += delta;
            *inner.edges.entry((b.clone(), a.clone())).or_insert(0.0) += delta;
        }
        Ok(())
    }

    async fn top_neighbours(&self, id: &str, limit: usize) -> Result<Vec<NeighbourRow>> {
        let inner = self.inner.lock();
        let mut out: Vec<NeighbourRow> = inner
            .edges
            .iter()
            .filter(|((from, _), _)| from == id)
            .map(|((_, to), weight)| NeighbourRow {
                id: to.clone(),
                weight: *weight,
            })
            .collect();
        out.sort_by(|a, b| b.weight.partial_cmp(&a.weight).unwrap());
        out.truncate(limit);
        Ok(out)
    }

    async fn get_meta(&self, key: &str) -> Result<Option<String>> {
        Ok(self.inner.lock().meta.get(key).cloned())
    }

    async fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        self.inner.lock().meta.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn stats(&self) -> Result<StoreStats> {
        let inner = self.inner.lock();
        let mut by_domain: HashMap<String, u64> = HashMap::new();
        let mut by_pattern_type: HashMap<String, u64> = HashMap::new();
        let mut active = 0u64;
        let mut deprecated = 0u64;
        let mut activations = Vec::new();
        for m in inner.memories.values() {
            match m.status {
                Status::Active => active += 1,
                Status::Deprecated => deprecated += 1,
            }
            *by_domain.entry(m.domain.clone()).or_insert(0) += 1;
            if let Some(pt) = m.pattern_type {
                *by_pattern_type.entry(pt.as_str().to_string()).or_insert(0) += 1;
            }
            activations.push(m.activation);
        }
        activations.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let min = activations.first().copied().unwrap_or(0.0);
        let max = activations.last().copied().unwrap_or(0.0);
        let p50 = crate::activation::percentile(&activations, 0.50);
        let p95 = crate::activation::percentile(&activations, 0.95);
        Ok(StoreStats {
            total_active: active,
            total_deprecated: deprecated,
            by_domain: by_domain.into_iter().collect(),
            by_pattern_type: by_pattern_type.into_iter().collect(),
            activation_min: min,
            activation_p50: p50,
            activation_p95: p95,
            activation_max: max,
        })
    }

    async fn missing_embeddings(&self, limit: usize) -> Result<Vec<Memory>> {
        let inner = self.inner.lock();
        let mut out: Vec<Memory> = inner
            .memories
            .values()
            .filter(|m| matches!(m.status, Status::Active) && m.embedding.is_none())
            .cloned()
            .collect();
        out.truncate(limit);
        Ok(out)
    }
}
