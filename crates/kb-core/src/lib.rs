//! kb-core - Core types and dataset loading for the support knowledge base
//!
//! This crate provides the entry model, error handling, configuration,
//! component traits and the dataset loader used throughout support-kb.

pub mod config;
pub mod error;
pub mod loader;
pub mod traits;
pub mod types;

pub use config::*;
pub use error::{KbError, Result};
pub use loader::{DatasetLoader, LoadStatus, LoadedDataset, QuarantinedEntry};
pub use traits::*;
pub use types::*;
