//! Error types for the knowledge base.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using KbError.
pub type Result<T> = std::result::Result<T, KbError>;

/// Errors that can occur in the knowledge base.
#[derive(Error, Debug)]
pub enum KbError {
    /// Dataset file could not be found at any candidate location.
    #[error("Dataset file not found: {path}")]
    DatasetNotFound { path: PathBuf },

    /// Dataset file exists but is not a JSON array of entries.
    #[error("Could not decode dataset {path}: {reason}")]
    DatasetMalformed { path: PathBuf, reason: String },

    /// Dataset file exists but could not be read.
    #[error("Could not read dataset {path}: {reason}")]
    DatasetUnreadable { path: PathBuf, reason: String },

    /// Any fault while scoring, ranking or formatting a query.
    #[error("Unexpected query failure: {message}")]
    UnexpectedQueryFailure { message: String },

    /// Invalid argument provided.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl KbError {
    /// Create a malformed dataset error.
    pub fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::DatasetMalformed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a query failure error.
    pub fn query_failed(message: impl Into<String>) -> Self {
        Self::UnexpectedQueryFailure {
            message: message.into(),
        }
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Get the stable error code reported to tool callers.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::DatasetNotFound { .. } => "DATASET_NOT_FOUND",
            Self::DatasetMalformed { .. } => "DATASET_MALFORMED",
            Self::DatasetUnreadable { .. } => "DATASET_UNREADABLE",
            Self::UnexpectedQueryFailure { .. } => "UNEXPECTED_QUERY_FAILURE",
            Self::InvalidArgument { .. } => "INVALID_ARGUMENT",
            Self::Config { .. } => "CONFIG_ERROR",
            Self::Io(_) => "IO_ERROR",
        }
    }
}

impl From<std::fmt::Error> for KbError {
    fn from(_: std::fmt::Error) -> Self {
        Self::query_failed("failed to write formatted output")
    }
}
