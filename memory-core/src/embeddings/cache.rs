//! Process-local query-text → vector cache.
//!
//! TTL 5 minutes (configurable), soft cap ~100 entries with oldest-first
//! eviction. Readable by a single retrieval at a time; the mutex here
//! just guards get/insert/evict, not a concurrency requirement of its
//! own.

use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

struct Entry {
    vector: Vec<f32>,
    inserted_at: Instant,
}

/// TTL'd, capacity-bounded cache from query text to its embedding.
pub struct EmbeddingCache {
    inner: Mutex<LruCache<String, Entry>>,
    ttl: Duration,
}

impl EmbeddingCache {
    /// Build a cache with the given capacity and TTL.
    #[must_use]
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(cap)),
            ttl,
        }
    }

    /// Default cache: 100 entries, 5-minute TTL.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(100, Duration::from_millis(300_000))
    }

    /// Fetch a cached vector, evicting it first if its TTL has expired.
    #[must_use]
    pub fn get(&self, query: &str) -> Option<Vec<f32>> {
        let mut guard = self.inner.lock();
        if let Some(entry) = guard.peek(query) {
            if entry.inserted_at.elapsed() > self.ttl {
                guard.pop(query);
                return None;
            }
        } else {
            return None;
        }
        guard.get(query).map(|e| e.vector.clone())
    }

    /// Insert or refresh a cached vector. Oldest entry is evicted first
    /// when the cache is at capacity (the `lru` crate's native policy).
    pub fn put(&self, query: String, vector: Vec<f32>) {
        self.inner.lock().put(
            query,
            Entry {
                vector,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Number of entries currently cached (including possibly-expired ones).
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_round_trips() {
        let cache = EmbeddingCache::new(10, Duration::from_secs(300));
        cache.put("hello".to_string(), vec![1.0, 2.0]);
        assert_eq!(cache.get("hello"), Some(vec![1.0, 2.0]));
    }

    #[test]
    fn miss_returns_none() {
        let cache = EmbeddingCache::new(10, Duration::from_secs(300));
        assert_eq!(cache.get("missing"), None);
    }

    #[test]
    fn expired_entry_is_evicted_on_read() {
        let cache = EmbeddingCache::new(10, Duration::from_millis(1));
        cache.put("hello".to_string(), vec![1.0]);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get("hello"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn capacity_evicts_oldest_first() {
        let cache = EmbeddingCache::new(2, Duration::from_secs(300));
        cache.put("a".to_string(), vec![1.0]);
        cache.put("b".to_string(), vec![2.0]);
        cache.put("c".to_string(), vec![3.0]);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), None);
        assert!(cache.get("b").is_some());
        assert!(cache.get("c").is_some());
    }
}
