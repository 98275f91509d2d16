//! Error types for the I/O bridge

use bookbox_core::{ClassifyError, ErrorSeverity};
use thiserror::Error;

/// Result type for bridge operations
pub type IoResult<T> = Result<T, IoError>;

#[derive(Debug, Error)]
pub enum IoError {
    /// LED pin was never set up
    #[error("Unknown LED pin: {0}")]
    UnknownLed(u8),

    /// Terminal could not be prepared for key input
    #[error("Terminal setup failed: {source}")]
    Terminal { source: std::io::Error },
}

impl ClassifyError for IoError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Degraded
    }
}
