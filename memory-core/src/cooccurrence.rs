//! The Co-occurrence Engine: wiring retrieved sets and spreading activation.

use crate::error::Result;
use crate::store::Store;
use crate::types::Memory;
use std::collections::HashMap;

/// Default neighbour fan-out per id when spreading.
pub const NEIGHBOURS_PER_ID: usize = 20;

/// Weight applied to a neighbour's edge weight when accumulating boost.
pub const SPREAD_DECAY: f64 = 0.3;

/// A memory surfaced by spreading activation, carrying its accumulated boost.
#[derive(Debug, Clone)]
pub struct SpreadResult {
    pub memory: Memory,
    pub boost: f64,
}

/// Wire co-occurrence edges for a retrieval's selected ids.
///
/// Groups `selected` by domain (`None`/`"general"` share a group), and for
/// every unordered pair within a group adds `+1` to both directed edges.
/// Cross-domain pairs are intentionally left unwired. All writes happen
/// in a single transaction.
pub async fn wire(store: &dyn Store, selected: &[(String, String)]) -> Result<()> {
    let mut groups: HashMap<&str, Vec<&str>> = HashMap::new();
    for (id, domain) in selected {
        let key = if domain.is_empty() || domain == crate::types::GENERAL_DOMAIN {
            crate::types::GENERAL_DOMAIN
        } else {
            domain.as_str()
        };
        groups.entry(key).or_default().push(id.as_str());
    }

    let mut pairs = Vec::new();
    for ids in groups.values() {
        for i in 0..ids.len() {
            for j in (i + 1)..ids.len() {
                pairs.push((ids[i].to_string(), ids[j].to_string(), 1.0));
            }
        }
    }
    if pairs.is_empty() {
        return Ok(());
    }
    store.add_cooccurrence_batch(&pairs).await
}

/// Spreading-activation fill: given the currently-selected ids, fetch up
/// to [`NEIGHBOURS_PER_ID`] neighbours of each by descending weight,
/// accumulate `boost(n) += weight * SPREAD_DECAY` for neighbours not
/// already in `active`, and return the top `limit` by boost, each
/// reunited with its full memory record.
pub async fn spread(
    store: &dyn Store,
    active: &[String],
    limit: usize,
) -> Result<Vec<SpreadResult>> {
    if active.is_empty() || limit == 0 {
        return Ok(Vec::new());
    }
    let active_set: std::collections::HashSet<&str> =
        active.iter().map(String::as_str).collect();

    let mut boosts: HashMap<String, f64> = HashMap::new();
    for id in active {
        let neighbours = store.top_neighbours(id, NEIGHBOURS_PER_ID).await?;
        for n in neighbours {
            if active_set.contains(n.id.as_str()) {
                continue;
            }
            *boosts.entry(n.id).or_insert(0.0) += n.weight * SPREAD_DECAY;
        }
    }

    let mut ranked: Vec<(String, f64)> = boosts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    ranked.truncate(limit);

    let ids: Vec<String> = ranked.iter().map(|(id, _)| id.clone()).collect();
    let memories = store.get_memories(&ids).await?;
    let by_id: HashMap<&str, &Memory> = memories.iter().map(|m| (m.id.as_str(), m)).collect();

    let mut out = Vec::with_capacity(ranked.len());
    for (id, boost) in ranked {
        if let Some(memory) = by_id.get(id.as_str()) {
            out.push(SpreadResult {
                memory: (*memory).clone(),
                boost,
            });
        }
    }
    Ok(out)
}
