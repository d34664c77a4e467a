//! The combined relevance score blending semantic similarity, activation,
//! co-occurrence, and editorial bonuses/penalties.

use crate::config::ScoringWeights;
use crate::types::{Memory, PatternType};
use chrono::{DateTime, Utc};

/// The hard semantic floor: candidates below this cosine similarity are
/// dropped before scoring when a query embedding is available.
pub const SEMANTIC_FLOOR: f32 = 0.30;

/// Recency bonus applied when a memory was retrieved within the last 24 hours.
pub const RECENCY_BONUS: f64 = 0.03;

/// Score components for one candidate, kept separate for testability and
/// for the "explain a ranking" use case.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreBreakdown {
    pub semantic: f64,
    pub activation: f64,
    pub recency: f64,
    pub domain: f64,
    pub type_bonus: f64,
    pub penalties: f64,
    pub total: f64,
}

fn type_bonus(pattern_type: Option<PatternType>) -> f64 {
    match pattern_type {
        Some(PatternType::Rule | PatternType::Directive) => 0.08,
        Some(PatternType::Correction | PatternType::BugInsight) => 0.05,
        Some(PatternType::Command) => 0.04,
        Some(PatternType::Solution) => 0.03,
        _ => 0.0,
    }
}

fn penalties(memory: &Memory) -> f64 {
    let mut p = 0.0;
    if memory.domain == crate::types::GENERAL_DOMAIN {
        p += 0.20;
    }
    if memory.title.to_lowercase().contains("daily log") {
        p += 0.25;
    }
    if memory.pattern_type.is_none() {
        p += 0.10;
    }
    if memory.detail.chars().count() < 20 {
        p += 0.15;
    }
    p
}

/// Whether any of `hints` is a case-insensitive substring of `domain`.
#[must_use]
pub fn domain_hint_matches(domain: &str, hints: &[String]) -> bool {
    if hints.is_empty() {
        return false;
    }
    let domain_lower = domain.to_lowercase();
    hints
        .iter()
        .any(|h| !h.is_empty() && domain_lower.contains(&h.to_lowercase()))
}

/// Score one candidate. `similarity` is `0.0` when no query embedding was
/// available (the caller is expected to have already applied the
/// semantic floor before calling this, in that case by skipping it).
#[must_use]
pub fn score(
    memory: &Memory,
    similarity: f32,
    normalised_activation: f64,
    hints: &[String],
    weights: ScoringWeights,
    now: DateTime<Utc>,
) -> ScoreBreakdown {
    let semantic = weights.semantic * f64::from(similarity);
    let activation = weights.activation * normalised_activation;
    let recency = if (now - memory.last_retrieved).num_hours() < 24 {
        RECENCY_BONUS
    } else {
        0.0
    };
    let domain = if domain_hint_matches(&memory.domain, hints) {
        weights.domain
    } else {
        0.0
    };
    let type_bonus = type_bonus(memory.pattern_type);
    let penalty = penalties(memory);

    let total = semantic + activation + recency + domain + type_bonus - penalty;

    ScoreBreakdown {
        semantic,
        activation,
        recency,
        domain,
        type_bonus,
        penalties: penalty,
        total,
    }
}
