//! Core domain types for the knowledge base.

use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;

/// Entry kind, taken from the `type` field of a dataset record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    ConversationExample,
    Guideline,
}

impl EntryKind {
    /// The wire name used in the dataset.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConversationExample => "conversation_example",
            Self::Guideline => "guideline",
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::ConversationExample => "Conversation",
            Self::Guideline => "Guideline",
        };
        write!(f, "{}", s)
    }
}

/// Fields shared by every entry kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryMeta {
    /// Identifier. Uniqueness is not enforced.
    pub id: String,

    /// Free-form tags.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,

    /// One-line summary.
    #[serde(default)]
    pub summary: Option<String>,

    /// Language hint. Advisory only, never used for matching.
    #[serde(default)]
    pub language: Option<String>,
}

/// A past support conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationExample {
    #[serde(flatten)]
    pub meta: EntryMeta,

    /// Multi-line transcript.
    pub log: String,
}

/// A written support guideline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guideline {
    #[serde(flatten)]
    pub meta: EntryMeta,

    pub title: String,

    pub description: String,

    /// Example phrasings or situations.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub examples: Vec<String>,
}

/// Treat an explicit `null` list the same as a missing one.
fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// One knowledge base record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Entry {
    ConversationExample(ConversationExample),
    Guideline(Guideline),
}

impl Entry {
    /// Shared fields.
    pub fn meta(&self) -> &EntryMeta {
        match self {
            Self::ConversationExample(c) => &c.meta,
            Self::Guideline(g) => &g.meta,
        }
    }

    pub fn id(&self) -> &str {
        &self.meta().id
    }

    pub fn kind(&self) -> EntryKind {
        match self {
            Self::ConversationExample(_) => EntryKind::ConversationExample,
            Self::Guideline(_) => EntryKind::Guideline,
        }
    }

    pub fn tags(&self) -> &[String] {
        &self.meta().tags
    }

    pub fn summary(&self) -> Option<&str> {
        self.meta().summary.as_deref()
    }

    /// Title, only guidelines carry one.
    pub fn title(&self) -> Option<&str> {
        match self {
            Self::Guideline(g) => Some(&g.title),
            Self::ConversationExample(_) => None,
        }
    }
}

/// Ordered, read-only collection of entries.
///
/// Insertion order is the ranking tie-break, so it must never be re-sorted.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    entries: Vec<Arc<Entry>>,
}

impl KnowledgeBase {
    /// Create a knowledge base from entries, preserving their order.
    pub fn new(entries: Vec<Entry>) -> Self {
        Self {
            entries: entries.into_iter().map(Arc::new).collect(),
        }
    }

    /// An empty knowledge base.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Arc<Entry>] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Entry>> {
        self.entries.iter()
    }

    /// Count entries per kind.
    pub fn stats(&self) -> Stats {
        let guidelines = self
            .entries
            .iter()
            .filter(|e| e.kind() == EntryKind::Guideline)
            .count();

        Stats {
            entries: self.entries.len(),
            conversations: self.entries.len() - guidelines,
            guidelines,
        }
    }
}

/// An entry paired with its relevance score during ranking.
#[derive(Debug, Clone)]
pub struct ScoredEntry {
    pub entry: Arc<Entry>,

    /// Relevance score (higher is better, never negative).
    pub score: f32,
}

/// Statistics about the knowledge base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub entries: usize,
    pub conversations: usize,
    pub guidelines: usize,
}
