//! Field-weighted relevance scoring and ranking.

use std::collections::HashSet;

use tracing::debug;

use kb_core::{Entry, KnowledgeBase, ScoredEntry, Scorer};

use crate::tokenize::token_set;

/// Per query token found in a tag (each tag scored separately).
const TAG_WEIGHT: f32 = 2.0;
const ID_WEIGHT: f32 = 1.0;
const SUMMARY_WEIGHT: f32 = 2.0;
const TITLE_WEIGHT: f32 = 3.0;
const LOG_WEIGHT: f32 = 1.0;
const DESCRIPTION_WEIGHT: f32 = 1.5;
/// Per query token found in an example (each example scored separately).
const EXAMPLE_WEIGHT: f32 = 1.0;
/// Added when the query names the entry's type.
const TYPE_BOOST: f32 = 5.0;

/// Count query tokens present in a field. Repeated query tokens count
/// once per occurrence.
fn matches(query_tokens: &[String], field_tokens: &HashSet<String>) -> usize {
    query_tokens
        .iter()
        .filter(|t| field_tokens.contains(t.as_str()))
        .count()
}

fn weighted(query_tokens: &[String], field: &str, weight: f32) -> f32 {
    matches(query_tokens, &token_set(field)) as f32 * weight
}

/// Default scorer: weighted term matching over entry fields plus a type
/// boost when the query mentions the entry's type.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldWeightedScorer;

impl FieldWeightedScorer {
    pub fn new() -> Self {
        Self
    }

    fn type_boost(entry: &Entry, query_tokens: &[String]) -> f32 {
        let has = |word: &str| query_tokens.iter().any(|t| t == word);

        match entry {
            Entry::Guideline(_) if has("guideline") => TYPE_BOOST,
            Entry::ConversationExample(_) if has("conversation") || has("example") => TYPE_BOOST,
            _ => 0.0,
        }
    }
}

impl Scorer for FieldWeightedScorer {
    fn score(&self, entry: &Entry, query_tokens: &[String]) -> f32 {
        if query_tokens.is_empty() {
            return 0.0;
        }

        let mut score = weighted(query_tokens, entry.id(), ID_WEIGHT);

        for tag in entry.tags() {
            score += weighted(query_tokens, tag, TAG_WEIGHT);
        }

        if let Some(summary) = entry.summary() {
            score += weighted(query_tokens, summary, SUMMARY_WEIGHT);
        }

        match entry {
            Entry::ConversationExample(c) => {
                score += weighted(query_tokens, &c.log, LOG_WEIGHT);
            }
            Entry::Guideline(g) => {
                score += weighted(query_tokens, &g.title, TITLE_WEIGHT);
                score += weighted(query_tokens, &g.description, DESCRIPTION_WEIGHT);
                for example in &g.examples {
                    score += weighted(query_tokens, example, EXAMPLE_WEIGHT);
                }
            }
        }

        score + Self::type_boost(entry, query_tokens)
    }
}

/// Score every entry, drop zero scores, and sort by score descending.
///
/// The sort is stable: equal scores keep knowledge base order.
pub fn rank<S: Scorer + ?Sized>(
    kb: &KnowledgeBase,
    scorer: &S,
    query_tokens: &[String],
) -> Vec<ScoredEntry> {
    let mut scored: Vec<ScoredEntry> = kb
        .iter()
        .filter_map(|entry| {
            let score = scorer.score(entry, query_tokens);
            if score > 0.0 {
                Some(ScoredEntry {
                    entry: entry.clone(),
                    score,
                })
            } else {
                None
            }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    debug!(
        "Ranked {} of {} entries for {:?}",
        scored.len(),
        kb.len(),
        query_tokens
    );

    scored
}
