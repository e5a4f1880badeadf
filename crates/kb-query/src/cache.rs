//! Bounded cache of ranked results keyed by normalized query.
//!
//! Only non-empty result lists are stored. Hits are served as-is with no
//! freshness check, so results can go stale if the knowledge base changes;
//! call [`QueryCache::invalidate`] after a reload to avoid that.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tracing::debug;

use kb_core::{Entry, EvictionKind, EvictionPolicy};

/// Evicts the entry inserted earliest. Hits do not change the order.
#[derive(Debug, Default)]
pub struct FifoPolicy {
    order: VecDeque<String>,
}

impl FifoPolicy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EvictionPolicy for FifoPolicy {
    fn record_insert(&mut self, key: &str) {
        self.order.push_back(key.to_string());
    }

    fn record_hit(&mut self, _key: &str) {}

    fn victim(&mut self) -> Option<String> {
        self.order.pop_front()
    }

    fn clear(&mut self) {
        self.order.clear();
    }
}

/// Evicts the entry used least recently.
#[derive(Debug, Default)]
pub struct LruPolicy {
    order: VecDeque<String>,
}

impl LruPolicy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EvictionPolicy for LruPolicy {
    fn record_insert(&mut self, key: &str) {
        self.order.push_back(key.to_string());
    }

    fn record_hit(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            if let Some(k) = self.order.remove(pos) {
                self.order.push_back(k);
            }
        }
    }

    fn victim(&mut self) -> Option<String> {
        self.order.pop_front()
    }

    fn clear(&mut self) {
        self.order.clear();
    }
}

/// Build the policy selected in configuration.
pub fn policy_for(kind: EvictionKind) -> Box<dyn EvictionPolicy> {
    match kind {
        EvictionKind::Fifo => Box::new(FifoPolicy::new()),
        EvictionKind::Lru => Box::new(LruPolicy::new()),
    }
}

/// Cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl CacheStats {
    /// Hit rate in 0.0-1.0.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Size-bounded map from normalized query to ranked entries.
pub struct QueryCache {
    entries: HashMap<String, Vec<Arc<Entry>>>,
    capacity: usize,
    policy: Box<dyn EvictionPolicy>,
    stats: CacheStats,
}

impl QueryCache {
    /// Create a FIFO cache holding at most `capacity` queries.
    pub fn new(capacity: usize) -> Self {
        Self::with_policy(capacity, Box::new(FifoPolicy::new()))
    }

    /// Create a cache with a custom eviction policy.
    pub fn with_policy(capacity: usize, policy: Box<dyn EvictionPolicy>) -> Self {
        Self {
            entries: HashMap::new(),
            capacity,
            policy,
            stats: CacheStats::default(),
        }
    }

    /// Look up a query, recording a hit or miss.
    pub fn get(&mut self, key: &str) -> Option<Vec<Arc<Entry>>> {
        match self.entries.get(key) {
            Some(ranked) => {
                self.stats.hits += 1;
                self.policy.record_hit(key);
                debug!("Cache hit for {:?}", key);
                Some(ranked.clone())
            }
            None => {
                self.stats.misses += 1;
                debug!("Cache miss for {:?}", key);
                None
            }
        }
    }

    /// Store a ranked list, evicting as needed. Empty lists are ignored.
    pub fn insert(&mut self, key: &str, ranked: Vec<Arc<Entry>>) {
        if self.capacity == 0 || ranked.is_empty() {
            return;
        }

        if let Some(existing) = self.entries.get_mut(key) {
            *existing = ranked;
            return;
        }

        while self.entries.len() >= self.capacity {
            match self.policy.victim() {
                Some(victim) => {
                    if self.entries.remove(&victim).is_some() {
                        self.stats.evictions += 1;
                        debug!("Evicted {:?} from query cache", victim);
                    }
                }
                None => break,
            }
        }

        self.entries.insert(key.to_string(), ranked);
        self.policy.record_insert(key);
    }

    /// Return the cached list for `key`, or compute, store and return it.
    pub fn get_or_compute<F>(&mut self, key: &str, compute: F) -> Vec<Arc<Entry>>
    where
        F: FnOnce() -> Vec<Arc<Entry>>,
    {
        if let Some(ranked) = self.get(key) {
            return ranked;
        }

        let ranked = compute();
        self.insert(key, ranked.clone());
        ranked
    }

    /// Drop every cached query. Counters are kept.
    pub fn invalidate(&mut self) {
        self.entries.clear();
        self.policy.clear();
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("len", &self.entries.len())
            .field("capacity", &self.capacity)
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranked(id: &str) -> Vec<Arc<Entry>> {
        let json = format!(r#"{{"id":"{}","type":"conversation_example","log":"x"}}"#, id);
        vec![Arc::new(serde_json::from_str(&json).unwrap())]
    }

    #[test]
    fn test_miss_then_hit() {
        let mut cache = QueryCache::new(10);
        let mut calls = 0;

        let first = cache.get_or_compute("refund", || {
            calls += 1;
            ranked("c1")
        });
        let second = cache.get_or_compute("refund", || {
            calls += 1;
            ranked("other")
        });

        assert_eq!(calls, 1);
        assert_eq!(first, second);
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_empty_results_not_cached() {
        let mut cache = QueryCache::new(10);
        let mut calls = 0;

        for _ in 0..3 {
            let result = cache.get_or_compute("nothing", || {
                calls += 1;
                Vec::new()
            });
            assert!(result.is_empty());
        }

        assert_eq!(calls, 3);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_fifo_eviction_capacity_one() {
        let mut cache = QueryCache::new(1);
        let mut calls = 0;

        cache.get_or_compute("a", || {
            calls += 1;
            ranked("a")
        });
        cache.get_or_compute("b", || {
            calls += 1;
            ranked("b")
        });
        assert!(!cache.contains("a"));
        assert!(cache.contains("b"));

        cache.get_or_compute("a", || {
            calls += 1;
            ranked("a")
        });

        assert_eq!(calls, 3);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().evictions, 2);
    }

    #[test]
    fn test_fifo_ignores_hits() {
        let mut cache = QueryCache::new(2);
        cache.insert("a", ranked("a"));
        cache.insert("b", ranked("b"));
        assert!(cache.get("a").is_some());

        cache.insert("c", ranked("c"));

        assert!(!cache.contains("a"));
        assert!(cache.contains("b"));
        assert!(cache.contains("c"));
    }

    #[test]
    fn test_lru_refreshes_on_hit() {
        let mut cache = QueryCache::with_policy(2, policy_for(EvictionKind::Lru));
        cache.insert("a", ranked("a"));
        cache.insert("b", ranked("b"));
        assert!(cache.get("a").is_some());

        cache.insert("c", ranked("c"));

        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
    }

    #[test]
    fn test_zero_capacity_disables_storage() {
        let mut cache = QueryCache::new(0);
        cache.insert("a", ranked("a"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate() {
        let mut cache = QueryCache::new(4);
        cache.insert("a", ranked("a"));
        cache.insert("b", ranked("b"));

        cache.invalidate();

        assert!(cache.is_empty());
        cache.insert("c", ranked("c"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_hit_rate() {
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            evictions: 0,
        };
        assert!((stats.hit_rate() - 0.75).abs() < f64::EPSILON);
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }
}
