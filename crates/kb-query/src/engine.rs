//! Query engine: normalize, rank (cache-checked), format.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use kb_core::{Entry, KbConfig, KnowledgeBase, Result, Scorer};

use crate::cache::{policy_for, CacheStats, QueryCache};
use crate::format::{ResultFormatter, EMPTY_KB_MESSAGE};
use crate::score::{rank, FieldWeightedScorer};
use crate::tokenize::{normalize, tokenize};

/// In-memory search over one knowledge base.
///
/// Owns the knowledge base, the scorer and the query cache. Every method
/// that can touch the cache takes `&mut self`; wrap the engine in a mutex to
/// share it across threads.
pub struct QueryEngine<S = FieldWeightedScorer> {
    kb: KnowledgeBase,

    scorer: S,

    cache: QueryCache,

    formatter: ResultFormatter,

    /// Entries rendered per query.
    max_results: usize,
}

impl QueryEngine<FieldWeightedScorer> {
    /// Create an engine with the default scorer.
    pub fn with_default_scorer(kb: KnowledgeBase, config: &KbConfig) -> Self {
        Self::new(kb, FieldWeightedScorer::new(), config)
    }
}

impl<S: Scorer> QueryEngine<S> {
    /// Create a new query engine.
    pub fn new(kb: KnowledgeBase, scorer: S, config: &KbConfig) -> Self {
        Self {
            kb,
            scorer,
            cache: QueryCache::with_policy(config.cache.capacity, policy_for(config.cache.policy)),
            formatter: ResultFormatter::new(&config.output),
            max_results: config.output.max_results,
        }
    }

    /// Run a query end to end and render the top results.
    pub fn search(&mut self, query: &str) -> Result<String> {
        if self.kb.is_empty() {
            return Ok(EMPTY_KB_MESSAGE.to_string());
        }

        let start = Instant::now();
        info!("Searching for: {:?}", query);

        let normalized = normalize(query);
        let ranked = self.ranked(&normalized);
        let output = self.formatter.format(&ranked, self.max_results)?;

        info!(
            "Search completed in {}ms, {} relevant entries",
            start.elapsed().as_millis(),
            ranked.len()
        );

        Ok(output)
    }

    /// Ranked entries for an already normalized query, served from the cache
    /// when possible.
    pub fn ranked(&mut self, normalized: &str) -> Vec<Arc<Entry>> {
        let kb = &self.kb;
        let scorer = &self.scorer;

        self.cache.get_or_compute(normalized, || {
            let tokens = tokenize(normalized);
            let scored = rank(kb, scorer, &tokens);
            if let Some(top) = scored.first() {
                debug!("Top entry {} scored {}", top.entry.id(), top.score);
            }
            scored.into_iter().map(|s| s.entry).collect()
        })
    }

    /// Swap the knowledge base. Cached results are kept and may be stale.
    pub fn replace_knowledge_base(&mut self, kb: KnowledgeBase) {
        info!(
            "Replacing knowledge base ({} -> {} entries), {} cached queries kept",
            self.kb.len(),
            kb.len(),
            self.cache.len()
        );
        self.kb = kb;
    }

    /// Drop all cached results.
    pub fn invalidate(&mut self) {
        debug!("Invalidating {} cached queries", self.cache.len());
        self.cache.invalidate();
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.kb
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn cached_queries(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::NO_RESULTS_MESSAGE;

    fn kb() -> KnowledgeBase {
        let entries: Vec<Entry> = serde_json::from_str(
            r#"[
                {"id":"c1","type":"conversation_example","tags":["refund"],
                 "summary":"Refund request",
                 "log":"User: I want a refund\nAgent: Sure, processing now"},
                {"id":"g1","type":"guideline","title":"Refund policy",
                 "description":"Refunds within 30 days.","examples":["Happy to help"]}
            ]"#,
        )
        .unwrap();
        KnowledgeBase::new(entries)
    }

    #[test]
    fn test_empty_knowledge_base() {
        let mut engine =
            QueryEngine::with_default_scorer(KnowledgeBase::empty(), &KbConfig::default());
        assert_eq!(engine.search("refund").unwrap(), EMPTY_KB_MESSAGE);
        assert_eq!(engine.cache_stats().misses, 0);
    }

    #[test]
    fn test_search_ranks_and_formats() {
        let mut engine = QueryEngine::with_default_scorer(kb(), &KbConfig::default());

        let out = engine.search("Refund?").unwrap();

        // g1: title 3.0 only ("refunds" is a different token); c1: 5.0
        let c1 = out.find("ID: c1").unwrap();
        let g1 = out.find("ID: g1").unwrap();
        assert!(c1 < g1);
    }

    #[test]
    fn test_normalized_queries_share_cache_entry() {
        let mut engine = QueryEngine::with_default_scorer(kb(), &KbConfig::default());

        let a = engine.search("REFUND!!").unwrap();
        let b = engine.search("  refund ").unwrap();

        assert_eq!(a, b);
        assert_eq!(engine.cache_stats().hits, 1);
        assert_eq!(engine.cached_queries(), 1);
    }

    #[test]
    fn test_no_match() {
        let mut engine = QueryEngine::with_default_scorer(kb(), &KbConfig::default());
        assert_eq!(engine.search("unknown_topic").unwrap(), NO_RESULTS_MESSAGE);
        assert_eq!(engine.cached_queries(), 0);
    }

    #[test]
    fn test_stale_until_invalidated() {
        let mut engine = QueryEngine::with_default_scorer(kb(), &KbConfig::default());
        let before = engine.search("refund").unwrap();

        engine.replace_knowledge_base(KnowledgeBase::new(vec![serde_json::from_str(
            r#"{"id":"c9","type":"conversation_example","log":"refund"}"#,
        )
        .unwrap()]));

        assert_eq!(engine.search("refund").unwrap(), before);

        engine.invalidate();
        let after = engine.search("refund").unwrap();
        assert!(after.contains("ID: c9"));
        assert!(!after.contains("ID: c1"));
    }
}
