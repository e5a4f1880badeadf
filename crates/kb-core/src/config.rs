//! Configuration types for the knowledge base.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration for the knowledge base tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KbConfig {
    /// Dataset configuration.
    #[serde(default)]
    pub dataset: DatasetConfig,

    /// Query cache configuration.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Output formatting configuration.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Dataset configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Path to the JSON dataset, absolute or relative to the project root.
    #[serde(default = "default_dataset_path")]
    pub path: PathBuf,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: default_dataset_path(),
        }
    }
}

/// Which entry the query cache evicts when full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionKind {
    /// Oldest inserted entry first. Hits do not refresh an entry.
    #[default]
    Fifo,

    /// Least recently used entry first.
    Lru,
}

/// Query cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of cached queries (0 disables caching).
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,

    /// Eviction policy.
    #[serde(default)]
    pub policy: EvictionKind,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            policy: EvictionKind::Fifo,
        }
    }
}

/// Output formatting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Number of entries rendered per query.
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Guideline descriptions longer than this (in characters) are truncated.
    #[serde(default = "default_description_limit")]
    pub description_limit: usize,

    /// Guideline examples shown per entry.
    #[serde(default = "default_max_examples")]
    pub max_examples: usize,

    /// Conversation log lines shown per entry.
    #[serde(default = "default_max_log_lines")]
    pub max_log_lines: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            max_results: 5,
            description_limit: 150,
            max_examples: 3,
            max_log_lines: 4,
        }
    }
}

// Default value functions

fn default_dataset_path() -> PathBuf {
    PathBuf::from("data").join("sample_conversations.json")
}

fn default_cache_capacity() -> usize {
    100
}

fn default_max_results() -> usize {
    5
}

fn default_description_limit() -> usize {
    150
}

fn default_max_examples() -> usize {
    3
}

fn default_max_log_lines() -> usize {
    4
}

impl KbConfig {
    /// Load configuration from file.
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> crate::error::Result<Self> {
        toml::from_str(content).map_err(|e| {
            crate::error::KbError::config(format!("Failed to parse config: {}", e))
        })
    }

    /// Load configuration from default paths.
    pub fn load_default() -> crate::error::Result<Self> {
        // Try user config first
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("support-kb").join("config.toml");
            if user_config.exists() {
                return Self::load(&user_config);
            }
        }

        // Try local config
        let local_config = PathBuf::from("support-kb.toml");
        if local_config.exists() {
            return Self::load(&local_config);
        }

        Ok(Self::default())
    }
}
