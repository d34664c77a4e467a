//! Engine configuration: defaults, file, and environment layering.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// The embedding dimension the rest of the system assumes unless configured otherwise.
pub const DEFAULT_DIMENSION: usize = 768;

/// Decay configuration nested under `decay.*` in the config table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecayConfig {
    /// Multiplicative factor applied to every row's activation per invocation.
    pub daily_factor: f64,
    /// Advisory threshold below which entries are reported, never deleted.
    pub prune_threshold: f64,
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            daily_factor: 0.9995,
            prune_threshold: 0.05,
        }
    }
}

/// Scoring weights for the retrieval pipeline; must sum to a sane total
/// but are not required to sum exactly to 1.0 (penalties and bonuses are
/// additive on top).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub semantic: f64,
    pub activation: f64,
    pub domain: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            semantic: 0.6,
            activation: 0.3,
            domain: 0.1,
        }
    }
}

/// The full engine configuration record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Filesystem path to the store.
    pub db_path: String,
    /// Identifier sent to the embedding oracle.
    pub embed_model: String,
    /// Base URL of the embedding oracle.
    pub embed_url: String,
    /// Embedding vector dimension.
    pub dimension: usize,
    /// Token budget for retrieval.
    pub max_context_tokens: u32,
    /// Cap on selected entries.
    pub max_entries: usize,
    /// Scoring weights.
    pub weights: ScoringWeights,
    /// Decay configuration.
    pub decay: DecayConfig,
    /// TTL, in milliseconds, for the query embedding cache.
    pub embedding_cache_ttl_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            db_path: "hebbian_memory.db".to_string(),
            embed_model: "nomic-embed-text".to_string(),
            embed_url: "http://localhost:11434".to_string(),
            dimension: DEFAULT_DIMENSION,
            max_context_tokens: 800,
            max_entries: 20,
            weights: ScoringWeights::default(),
            decay: DecayConfig::default(),
            embedding_cache_ttl_ms: 300_000,
        }
    }
}

impl EngineConfig {
    /// Validate the configuration, rejecting values that would make the
    /// rest of the engine misbehave silently.
    pub fn validate(&self) -> Result<()> {
        if self.db_path.trim().is_empty() {
            return Err(Error::ConfigInvalid("dbPath must not be empty".into()));
        }
        if self.dimension == 0 {
            return Err(Error::ConfigInvalid("dimension must be > 0".into()));
        }
        if self.max_entries == 0 {
            return Err(Error::ConfigInvalid("maxEntries must be > 0".into()));
        }
        if self.max_context_tokens == 0 {
            return Err(Error::ConfigInvalid("maxContextTokens must be > 0".into()));
        }
        if !(0.0..=2.0).contains(&self.decay.daily_factor) {
            return Err(Error::ConfigInvalid(
                "decay.dailyFactor must be within [0, 2]".into(),
            ));
        }
        Ok(())
    }

    /// Apply environment variable overrides: `HEBBIAN_DB_PATH`,
    /// `HEBBIAN_EMBED_URL`, and `HEBBIAN_EMBED_MODEL`.
    #[must_use]
    pub fn apply_env_overrides(mut self) -> Self {
        if let Ok(path) = std::env::var("HEBBIAN_DB_PATH") {
            self.db_path = path;
        }
        if let Ok(url) = std::env::var("HEBBIAN_EMBED_URL") {
            self.embed_url = url;
        }
        if let Ok(model) = std::env::var("HEBBIAN_EMBED_MODEL") {
            self.embed_model = model;
        }
        self
    }
}
