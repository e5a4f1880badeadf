//! Core traits defining the interfaces between components.

use crate::types::Entry;

/// Relevance scoring trait.
pub trait Scorer: Send + Sync {
    /// Score one entry against an already tokenized query.
    ///
    /// Must return a non-negative value; zero means "not relevant".
    fn score(&self, entry: &Entry, query_tokens: &[String]) -> f32;
}

/// Eviction policy for the bounded query cache.
///
/// The cache owns the stored values; a policy only tracks keys and decides
/// which one goes when the cache is full.
pub trait EvictionPolicy: Send + Sync {
    /// A new key was stored.
    fn record_insert(&mut self, key: &str);

    /// An existing key was served from the cache.
    fn record_hit(&mut self, key: &str);

    /// Pick and forget the key to evict next.
    fn victim(&mut self) -> Option<String>;

    /// Forget every key.
    fn clear(&mut self);
}
