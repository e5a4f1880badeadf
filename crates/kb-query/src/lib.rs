//! kb-query - Search and ranking engine
//!
//! This crate scores knowledge base entries against free-text queries and
//! renders the best matches as text.
//!
//! # Features
//!
//! - Unicode-aware tokenization and normalization
//! - Field-weighted term scoring with entry-type boosts
//! - Stable ranking (ties keep knowledge base order)
//! - Bounded query cache with pluggable eviction (FIFO or LRU)
//! - Bounded text output with overflow notes
//!
//! # Example
//!
//! ```rust,ignore
//! use kb_core::{KbConfig, KnowledgeBase};
//! use kb_query::QueryEngine;
//!
//! let mut engine = QueryEngine::with_default_scorer(kb, &KbConfig::default());
//! let text = engine.search("refund for a late order")?;
//! ```

mod cache;
mod engine;
mod format;
mod score;
mod tokenize;

pub use cache::{policy_for, CacheStats, FifoPolicy, LruPolicy, QueryCache};
pub use engine::QueryEngine;
pub use format::{ResultFormatter, EMPTY_KB_MESSAGE, NO_RESULTS_MESSAGE};
pub use score::{rank, FieldWeightedScorer};
pub use tokenize::{normalize, token_set, tokenize};

// Re-export for convenience
pub use kb_core::{Entry, KnowledgeBase, ScoredEntry, Scorer};
