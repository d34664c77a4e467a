//! Core data model: `Memory`, `PatternType`, `Status`, and their satellites.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel domain used when no coarse topic applies.
pub const GENERAL_DOMAIN: &str = "general";

/// The kind of atomic pattern a memory represents.
///
/// `None` on `Memory::pattern_type` covers legacy file-level blobs that
/// predate per-pattern classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatternType {
    Rule,
    Directive,
    Command,
    Fact,
    Discovery,
    Failure,
    Solution,
    Config,
    Benchmark,
    BugInsight,
    Decision,
    Spec,
    Correction,
    Conclusion,
}

impl PatternType {
    /// All variants, in declaration order — used by `stats` and tests.
    pub const ALL: [PatternType; 14] = [
        PatternType::Rule,
        PatternType::Directive,
        PatternType::Command,
        PatternType::Fact,
        PatternType::Discovery,
        PatternType::Failure,
        PatternType::Solution,
        PatternType::Config,
        PatternType::Benchmark,
        PatternType::BugInsight,
        PatternType::Decision,
        PatternType::Spec,
        PatternType::Correction,
        PatternType::Conclusion,
    ];

    /// Parse the lower-kebab-case wire form stored in the `pattern_type` column.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "rule" => Some(Self::Rule),
            "directive" => Some(Self::Directive),
            "command" => Some(Self::Command),
            "fact" => Some(Self::Fact),
            "discovery" => Some(Self::Discovery),
            "failure" => Some(Self::Failure),
            "solution" => Some(Self::Solution),
            "config" => Some(Self::Config),
            "benchmark" => Some(Self::Benchmark),
            "bug-insight" => Some(Self::BugInsight),
            "decision" => Some(Self::Decision),
            "spec" => Some(Self::Spec),
            "correction" => Some(Self::Correction),
            "conclusion" => Some(Self::Conclusion),
            _ => None,
        }
    }

    /// Lower-kebab-case wire form stored in the `pattern_type` column.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rule => "rule",
            Self::Directive => "directive",
            Self::Command => "command",
            Self::Fact => "fact",
            Self::Discovery => "discovery",
            Self::Failure => "failure",
            Self::Solution => "solution",
            Self::Config => "config",
            Self::Benchmark => "benchmark",
            Self::BugInsight => "bug-insight",
            Self::Decision => "decision",
            Self::Spec => "spec",
            Self::Correction => "correction",
            Self::Conclusion => "conclusion",
        }
    }
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Active,
    Deprecated,
}

impl Status {
    /// Parse the stored column value, treating null/unknown as active
    /// for backward compatibility.
    #[must_use]
    pub fn parse(s: Option<&str>) -> Self {
        match s {
            Some("deprecated") => Self::Deprecated,
            _ => Self::Active,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Deprecated => "deprecated",
        }
    }
}

/// A single atomic memory: the unit of storage and retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    /// Opaque, deterministic primary key (`domain:channel:hash`).
    pub id: String,
    /// Short human summary, at most 120 characters.
    pub title: String,
    /// Full textual payload.
    pub detail: String,
    /// Coarse topical tag; `"general"` is the sentinel catch-all.
    pub domain: String,
    /// Kind of atomic pattern, or `None` for legacy file-level blobs.
    pub pattern_type: Option<PatternType>,
    /// Provenance: origin channel (`atomic`, `session`, `reasoning`, ...).
    pub source: String,
    /// Provenance: a path-like locator within the source.
    pub source_section: String,
    /// Creation timestamp.
    pub created: DateTime<Utc>,
    /// Timestamp of the most recent retrieval bump.
    pub last_retrieved: DateTime<Utc>,
    /// Monotonically non-decreasing retrieval counter.
    pub retrieval_count: u64,
    /// Hebbian-style activation score; unbounded above, can go negative after decay.
    pub activation: f64,
    /// Cheap duplicate hint computed over `detail` (FNV-1a, not cryptographic).
    pub content_hash: String,
    /// Dense embedding vector, when computed.
    pub embedding: Option<Vec<f32>>,
    /// Lifecycle status.
    pub status: Status,
    /// Replacement memory, set when `status == Deprecated`.
    pub superseded_by: Option<String>,
    /// The memory this one corrects, if any.
    pub corrects: Option<String>,
    /// Lower-cased tags attached to this memory.
    pub tags: Vec<String>,
}

impl Memory {
    /// The text handed to the embedding client: `"[domain] (pattern_type)
    /// title detail source_section"`, fields omitted when empty,
    /// whitespace-joined, truncated to 512 characters.
    #[must_use]
    pub fn embedding_text(&self) -> String {
        let mut parts = Vec::with_capacity(5);
        if !self.domain.is_empty() {
            parts.push(format!("[{}]", self.domain));
        }
        if let Some(pt) = self.pattern_type {
            parts.push(format!("({pt})"));
        }
        if !self.title.is_empty() {
            parts.push(self.title.clone());
        }
        if !self.detail.is_empty() {
            parts.push(self.detail.clone());
        }
        if !self.source_section.is_empty() {
            parts.push(self.source_section.clone());
        }
        let joined = parts.join(" ");
        truncate_chars(&joined, 512)
    }
}

/// Truncate a string to at most `max_chars` Unicode scalar values.
#[must_use]
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

/// A symmetric co-occurrence edge, as stored in both directions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CoOccurrenceEdge {
    pub from: u64,
    pub weight: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Memory {
        Memory {
            id: "web:atomic:abc123".into(),
            title: "Use explicit checkbox id".into(),
            detail: "Always set an explicit id attribute on checkbox inputs".into(),
            domain: "peekaboo-web".into(),
            pattern_type: Some(PatternType::Rule),
            source: "atomic".into(),
            source_section: "docs/checkbox.md#id".into(),
            created: Utc::now(),
            last_retrieved: Utc::now(),
            retrieval_count: 1,
            activation: 0.5,
            content_hash: "deadbeef".into(),
            embedding: None,
            status: Status::Active,
            superseded_by: None,
            corrects: None,
            tags: vec!["forms".into()],
        }
    }

    #[test]
    fn embedding_text_joins_nonempty_fields() {
        let m = sample();
        let text = m.embedding_text();
        assert!(text.starts_with("[peekaboo-web] (rule) Use explicit checkbox id"));
        assert!(text.ends_with("docs/checkbox.md#id"));
    }

    #[test]
    fn embedding_text_omits_empty_fields() {
        let mut m = sample();
        m.source_section.clear();
        let text = m.embedding_text();
        assert!(!text.ends_with(' '));
        assert!(!text.contains("  "));
    }

    #[test]
    fn embedding_text_truncates_to_512_chars() {
        let mut m = sample();
        m.detail = "x".repeat(2000);
        assert_eq!(m.embedding_text().chars().count(), 512);
    }

    #[test]
    fn pattern_type_round_trips_through_str() {
        for pt in PatternType::ALL {
            assert_eq!(PatternType::parse(pt.as_str()), Some(pt));
        }
    }

    #[test]
    fn status_treats_null_and_unknown_as_active() {
        assert_eq!(Status::parse(None), Status::Active);
        assert_eq!(Status::parse(Some("")), Status::Active);
        assert_eq!(Status::parse(Some("deprecated")), Status::Deprecated);
    }
}
