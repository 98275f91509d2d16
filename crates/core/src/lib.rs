//! Shared domain types and error classification for BookBox

pub mod error;
pub mod types;

pub use error::{ClassifyError, ErrorSeverity};
pub use types::{BookEntry, ButtonAction};
