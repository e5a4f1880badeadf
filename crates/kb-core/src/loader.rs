//! Dataset loading.
//!
//! The dataset is a JSON array of entries. Loading never fails outward:
//! every failure degrades to an empty knowledge base and a [`LoadStatus`]
//! describing what went wrong.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::error::{KbError, Result};
use crate::types::{Entry, KnowledgeBase};

/// A dataset element that was rejected while loading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuarantinedEntry {
    /// Position in the JSON array (0-based).
    pub index: usize,

    /// The element's `id`, when it had a string one.
    pub id: Option<String>,

    pub reason: String,
}

/// Outcome of loading a dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadStatus {
    /// Dataset parsed; some elements may have been quarantined.
    Loaded {
        path: PathBuf,
        entries: usize,
        quarantined: Vec<QuarantinedEntry>,
    },

    /// No candidate path existed.
    NotFound { tried: Vec<PathBuf> },

    /// File is not a JSON array.
    Malformed { path: PathBuf, reason: String },

    /// File exists but could not be read.
    Unreadable { path: PathBuf, reason: String },
}

impl LoadStatus {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }

    /// One-line human-readable description.
    pub fn describe(&self) -> String {
        match self {
            Self::Loaded {
                path,
                entries,
                quarantined,
            } => format!(
                "Loaded {} entries from {} ({} quarantined)",
                entries,
                path.display(),
                quarantined.len()
            ),
            Self::NotFound { tried } => {
                let tried: Vec<String> = tried.iter().map(|p| p.display().to_string()).collect();
                format!("Dataset file not found (tried: {})", tried.join(", "))
            }
            Self::Malformed { path, reason } => {
                format!("Could not decode JSON from {}: {}", path.display(), reason)
            }
            Self::Unreadable { path, reason } => {
                format!("Could not read {}: {}", path.display(), reason)
            }
        }
    }
}

/// A successfully parsed dataset.
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    /// The path that was actually read.
    pub path: PathBuf,

    pub knowledge_base: KnowledgeBase,

    pub quarantined: Vec<QuarantinedEntry>,
}

/// Reads datasets, resolving relative paths against the project root.
#[derive(Debug, Clone)]
pub struct DatasetLoader {
    /// Directory the project-root offsets are computed from.
    anchor: PathBuf,
}

impl DatasetLoader {
    /// Create a loader anchored at this crate's directory.
    ///
    /// The project root is two levels up (`crates/kb-core/../..`).
    pub fn new() -> Self {
        Self {
            anchor: PathBuf::from(env!("CARGO_MANIFEST_DIR")),
        }
    }

    /// Create a loader anchored at an arbitrary directory.
    pub fn with_anchor(anchor: impl Into<PathBuf>) -> Self {
        Self {
            anchor: anchor.into(),
        }
    }

    /// Candidate locations for `path`, in priority order.
    pub fn candidates(&self, path: &Path) -> Vec<PathBuf> {
        let mut candidates = vec![path.to_path_buf()];
        if path.is_relative() {
            candidates.push(self.anchor.join("..").join("..").join(path));
            candidates.push(self.anchor.join("..").join(path));
        }
        candidates
    }

    /// First existing candidate for `path`.
    pub fn resolve(&self, path: &Path) -> Option<PathBuf> {
        self.candidates(path).into_iter().find(|p| p.exists())
    }

    /// Load a dataset, returning an error on any failure.
    pub fn try_load(&self, path: &Path) -> Result<LoadedDataset> {
        let resolved = self.resolve(path).ok_or_else(|| KbError::DatasetNotFound {
            path: path.to_path_buf(),
        })?;
        debug!("Reading dataset from {}", resolved.display());

        let content = fs::read_to_string(&resolved).map_err(|e| KbError::DatasetUnreadable {
            path: resolved.clone(),
            reason: e.to_string(),
        })?;

        let (entries, quarantined) = parse_entries(&content, &resolved)?;

        Ok(LoadedDataset {
            path: resolved,
            knowledge_base: KnowledgeBase::new(entries),
            quarantined,
        })
    }

    /// Load a dataset, degrading every failure to an empty knowledge base.
    pub fn load(&self, path: &Path) -> (KnowledgeBase, LoadStatus) {
        match self.try_load(path) {
            Ok(dataset) => {
                info!(
                    "Loaded {} entries from {}",
                    dataset.knowledge_base.len(),
                    dataset.path.display()
                );
                let status = LoadStatus::Loaded {
                    path: dataset.path,
                    entries: dataset.knowledge_base.len(),
                    quarantined: dataset.quarantined,
                };
                (dataset.knowledge_base, status)
            }
            Err(e) => {
                error!("Failed to load dataset: {}", e);
                let status = match e {
                    KbError::DatasetNotFound { path } => LoadStatus::NotFound {
                        tried: self.candidates(&path),
                    },
                    KbError::DatasetMalformed { path, reason } => {
                        LoadStatus::Malformed { path, reason }
                    }
                    KbError::DatasetUnreadable { path, reason } => {
                        LoadStatus::Unreadable { path, reason }
                    }
                    other => LoadStatus::Unreadable {
                        path: path.to_path_buf(),
                        reason: other.to_string(),
                    },
                };
                (KnowledgeBase::empty(), status)
            }
        }
    }
}

impl Default for DatasetLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a JSON array, quarantining elements that are not valid entries.
fn parse_entries(content: &str, path: &Path) -> Result<(Vec<Entry>, Vec<QuarantinedEntry>)> {
    let values: Vec<serde_json::Value> =
        serde_json::from_str(content).map_err(|e| KbError::malformed(path, e.to_string()))?;

    let mut entries = Vec::with_capacity(values.len());
    let mut quarantined = Vec::new();

    for (index, value) in values.into_iter().enumerate() {
        let id = value.get("id").and_then(|v| v.as_str()).map(String::from);

        match serde_json::from_value::<Entry>(value) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                warn!(
                    "Quarantined dataset element {} ({}): {}",
                    index,
                    id.as_deref().unwrap_or("no id"),
                    e
                );
                quarantined.push(QuarantinedEntry {
                    index,
                    id,
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok((entries, quarantined))
}
