// FILE: crates/player-engine/src/error.rs

use bookbox_core::{ClassifyError, ErrorSeverity};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Audio file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to launch decoder: {0}")]
    Spawn(std::io::Error),

    #[error("Signal delivery failed: {0}")]
    Signal(String),

    #[error("Decoder command failed: {0}")]
    Command(String),

    #[error("Clip playback timed out after {0:?}")]
    ClipTimeout(std::time::Duration),

    #[error("Clip playback failed: {0}")]
    ClipFailed(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl ClassifyError for EngineError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::FileNotFound(_) | Self::ClipTimeout(_) | Self::ClipFailed(_) => {
                ErrorSeverity::Degraded
            }
            _ => ErrorSeverity::Recoverable,
        }
    }
}
