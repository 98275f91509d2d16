//! Error types for the state store

use bookbox_core::{ClassifyError, ErrorSeverity};
use std::path::PathBuf;
use thiserror::Error;

/// Result type for state store operations
pub type StateResult<T> = Result<T, StateError>;

/// Errors that can occur while reading or writing the durable state record
///
/// None of these are fatal: a failed load falls back to defaults, a failed
/// save is logged and skipped.
#[derive(Debug, Error)]
pub enum StateError {
    /// Failed to read the state file
    #[error("Failed to read state file at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// State file contents are not a valid record
    #[error("Failed to parse state file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Failed to serialize the record
    #[error("Failed to serialize state: {0}")]
    Serialize(serde_json::Error),

    /// Failed to write the state file
    #[error("Failed to write state file at {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ClassifyError for StateError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Recoverable
    }
}
