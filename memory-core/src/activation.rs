//! The Activation Engine: bump, decay, and scoring-time normalisation.

use crate::error::Result;
use crate::store::Store;
use chrono::Utc;

/// Default activation bump on a normal retrieval.
pub const RETRIEVAL_BUMP: f64 = 0.5;

/// Default activation bump on a tool-triggered refresh (`after_tool_call`).
pub const TOOL_REFRESH_BUMP: f64 = 0.3;

/// Bump activation, retrieval count, and last-retrieved timestamp for a
/// set of ids, inside one transaction. Returns the number of rows affected.
pub async fn bump(store: &dyn Store, ids: &[String], delta: f64) -> Result<u64> {
    if ids.is_empty() {
        return Ok(0);
    }
    store.bump_activation(ids, delta, Utc::now()).await
}

/// Multiply every row's activation by `factor`. Single transaction,
/// fatal on error (no partial decay is ever committed).
pub async fn decay(store: &dyn Store, factor: f64) -> Result<u64> {
    store.decay_all(factor).await
}

/// The `pct`-th percentile (0.0..=1.0) of a slice of values, using linear
/// interpolation between closest ranks. Returns `0.0` for an empty slice.
#[must_use]
pub fn percentile(values: &[f64], pct: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted: Vec<f64> = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = pct.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = rank - lo as f64;
        sorted[lo] + frac * (sorted[hi] - sorted[lo])
    }
}

/// The 95th percentile of a slice of activations.
///
/// Returns `0.0` for an empty slice.
#[must_use]
pub fn percentile_95(activations: &[f64]) -> f64 {
    percentile(activations, 0.95)
}

/// Normalise a single candidate's activation for scoring: divide by
/// `max(p95, 1)`, clipped to `[0, 1]`.
#[must_use]
pub fn normalise(activation: f64, p95: f64) -> f64 {
    let denom = p95.max(1.0);
    (activation / denom).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_of_empty_is_zero() {
        assert_eq!(percentile_95(&[]), 0.0);
    }

    #[test]
    fn percentile_of_single_value_is_that_value() {
        assert_eq!(percentile_95(&[42.0]), 42.0);
    }

    #[test]
    fn percentile_95_insulates_from_one_runaway_value() {
        let mut values: Vec<f64> = (0..99).map(|_| 1.0).collect();
        values.push(10_000.0);
        let p95 = percentile_95(&values);
        assert!(p95 < 100.0, "p95 should not be dominated by one outlier: {p95}");
    }

    #[test]
    fn normalise_clips_to_unit_interval() {
        assert_eq!(normalise(-5.0, 10.0), 0.0);
        assert_eq!(normalise(1000.0, 10.0), 1.0);
        assert!((normalise(5.0, 10.0) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn normalise_uses_floor_of_one_for_p95() {
        // With p95 < 1, the denominator is still 1, not the smaller p95.
        assert!((normalise(0.5, 0.1) - 0.5).abs() < 1e-9);
    }
}
