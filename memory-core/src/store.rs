//! The `Store` trait: the engine's one shared mutable resource.
//!
//! `memory-store` provides the `libsql`-backed implementation. Keeping
//! the trait here (rather than an index-by-key proxy object) favours
//! explicit operations over the illusion of a shared in-memory dictionary.

use crate::error::Result;
use crate::types::Memory;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// A co-occurrence neighbour: the other memory's id and the edge weight.
#[derive(Debug, Clone, Copy)]
pub struct Neighbour<'a> {
    pub id: &'a str,
    pub weight: f64,
}

/// Owned variant of [`Neighbour`], returned across API boundaries.
#[derive(Debug, Clone)]
pub struct NeighbourRow {
    pub id: String,
    pub weight: f64,
}

/// Counts and activation distribution, backing the operator `stats` command.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct StoreStats {
    pub total_active: u64,
    pub total_deprecated: u64,
    pub by_domain: Vec<(String, u64)>,
    pub by_pattern_type: Vec<(String, u64)>,
    pub activation_min: f64,
    pub activation_p50: f64,
    pub activation_p95: f64,
    pub activation_max: f64,
}

/// A new or updated memory row plus its tag set, as produced by ingestion.
#[derive(Debug, Clone)]
pub struct UpsertMemory {
    pub memory: Memory,
}

/// The embedded relational store.
///
/// All multi-row writes (a batch upsert, a decay pass, a bump of N ids, a
/// co-occurrence wire of a retrieval's selected set) occur inside a
/// single transaction each.
#[async_trait]
pub trait Store: Send + Sync {
    /// Run schema migrations. Idempotent; safe to call on every start.
    async fn migrate(&self) -> Result<()>;

    /// Insert or replace a memory row, its tag edges, and its embedding
    /// blob (if present) in one transaction.
    async fn upsert_memory(&self, memory: &Memory) -> Result<()>;

    /// Insert or replace a batch of memories atomically: the whole batch
    /// commits or none of it does.
    async fn upsert_memories_batch(&self, memories: &[Memory]) -> Result<()>;

    /// Fetch a single memory by id, regardless of status.
    async fn get_memory(&self, id: &str) -> Result<Option<Memory>>;

    /// Fetch a batch of memories by id in one round trip, preserving the
    /// input order; missing ids are omitted from the result.
    async fn get_memories(&self, ids: &[String]) -> Result<Vec<Memory>>;

    /// All active memories that have a non-null embedding.
    async fn scan_active_with_embedding(&self) -> Result<Vec<Memory>>;

    /// Active memories whose `domain` matches `domain` (case-sensitive
    /// equality, not substring), ordered by `activation` descending.
    async fn scan_by_domain(&self, domain: &str) -> Result<Vec<Memory>>;

    /// Top-N active memories by `activation` descending, across all domains.
    async fn top_by_activation(&self, limit: usize) -> Result<Vec<Memory>>;

    /// Atomically, for each id: `activation += delta`, `retrieval_count +=
    /// 1`, `last_retrieved = now`. Returns the number of rows affected.
    async fn bump_activation(&self, ids: &[String], delta: f64, now: DateTime<Utc>)
        -> Result<u64>;

    /// Multiply every row's `activation` by `factor` in one statement,
    /// one transaction. Fatal on error; no partial decay is committed.
    async fn decay_all(&self, factor: f64) -> Result<u64>;

    /// Memories with `activation < threshold`, for the operator's
    /// low-activation report. Never deletes anything.
    async fn low_activation(&self, threshold: f64, limit: usize) -> Result<Vec<Memory>>;

    /// Mark `old_id` deprecated in favour of `new_id`. No-op error if
    /// `old_id` does not exist.
    async fn deprecate(&self, old_id: &str, new_id: &str) -> Result<()>;

    /// Set `correction_id.corrects = corrected_id`. The correction stays active.
    async fn mark_correction(&self, correction_id: &str, corrected_id: &str) -> Result<()>;

    /// Write tag edges for a memory, replacing its existing tag set.
    async fn set_tags(&self, memory_id: &str, tags: &[String]) -> Result<()>;

    /// Additively upsert a symmetric co-occurrence edge: both
    /// `(a,b,+delta)` and `(b,a,+delta)` are written in one transaction.
    async fn add_cooccurrence(&self, a: &str, b: &str, delta: f64) -> Result<()>;

    /// Add a batch of symmetric co-occurrence deltas in one transaction.
    async fn add_cooccurrence_batch(&self, pairs: &[(String, String, f64)]) -> Result<()>;

    /// Up to `limit` neighbours of `id`, ordered by `weight` descending.
    async fn top_neighbours(&self, id: &str, limit: usize) -> Result<Vec<NeighbourRow>>;

    /// Read a value from the `Meta` key/value table.
    async fn get_meta(&self, key: &str) -> Result<Option<String>>;

    /// Write a value to the `Meta` key/value table.
    async fn set_meta(&self, key: &str, value: &str) -> Result<()>;

    /// Counts and activation distribution for the operator `stats` command.
    async fn stats(&self) -> Result<StoreStats>;

    /// Active memories missing an embedding, for the back-fill maintenance task.
    async fn missing_embeddings(&self, limit: usize) -> Result<Vec<Memory>>;
}
