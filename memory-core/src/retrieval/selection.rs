//! Diversity- and budget-bounded selection.

use crate::types::Memory;
use std::collections::HashMap;

/// Max occurrences of one domain among non-spread selected items.
pub const MAX_PER_DOMAIN: usize = 3;

/// Fraction of `char_budget` below which the spreading-activation fill
/// pass kicks in.
pub const FILL_THRESHOLD: f64 = 0.90;

/// A selected candidate with its score and whether it arrived via the
/// spreading-activation fill pass.
#[derive(Debug, Clone)]
pub struct Selected {
    pub memory: Memory,
    pub score: f64,
    pub spread_origin: bool,
}

/// The character cost charged against the budget for one candidate:
/// `len(detail or title) + 20`.
#[must_use]
pub fn char_cost(memory: &Memory) -> usize {
    let text = if memory.detail.is_empty() {
        &memory.title
    } else {
        &memory.detail
    };
    text.chars().count() + 20
}

/// Walk `ranked` (already sorted by score descending) and select
/// candidates within `char_budget` and `max_entries`, skipping a
/// candidate once three entries from its domain are already selected.
///
/// Stops when adding the next candidate would exceed `char_budget` *and*
/// at least one candidate is already selected (so the very first
/// candidate is always taken, even if it alone exceeds the budget). Also
/// stops at `max_entries`.
#[must_use]
pub fn select_budgeted(
    ranked: &[(Memory, f64)],
    char_budget: usize,
    max_entries: usize,
) -> (Vec<Selected>, usize) {
    let mut selected = Vec::new();
    let mut domain_counts: HashMap<&str, usize> = HashMap::new();
    let mut used_chars = 0usize;

    for (memory, score) in ranked {
        if selected.len() >= max_entries {
            break;
        }
        let domain_count = domain_counts.get(memory.domain.as_str()).copied().unwrap_or(0);
        if domain_count >= MAX_PER_DOMAIN {
            continue;
        }
        let cost = char_cost(memory);
        if used_chars + cost > char_budget && !selected.is_empty() {
            break;
        }
        used_chars += cost;
        *domain_counts.entry(memory.domain.as_str()).or_insert(0) += 1;
        selected.push(Selected {
            memory: memory.clone(),
            score: *score,
            spread_origin: false,
        });
    }

    (selected, used_chars)
}

/// Append spread-fill candidates (already in descending-boost order),
/// charging each against the remaining budget, stopping at the first one
/// that would exceed it.
pub fn append_spread_fill(
    selected: &mut Vec<Selected>,
    used_chars: &mut usize,
    char_budget: usize,
    fill: Vec<(Memory, f64)>,
) {
    for (memory, boost) in fill {
        let cost = char_cost(&memory);
        if *used_chars + cost > char_budget {
            break;
        }
        *used_chars += cost;
        selected.push(Selected {
            memory,
            score: boost,
            spread_origin: true,
        });
    }
}
