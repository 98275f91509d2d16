//! BookBox configuration
//!
//! TOML configuration with `#[serde(default)]` sections, validated on load.
//! Configuration errors are the only fatal error class in the system: the
//! loader returns an error and the shell exits non-zero. At runtime nothing
//! here is ever written back to disk.

mod error;
mod loader;
mod settings;
mod validation;

pub use error::{ConfigError, ConfigResult, ValidationError};
pub use loader::load;
pub use settings::{
    ButtonPins, DecoderBackendKind, DecoderConfig, InputBackendKind, InputConfig, KeyMap,
    PlaybackConfig,
};
pub use validation::Validator;

use bookbox_core::BookEntry;
use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub decoder: DecoderConfig,

    #[serde(default)]
    pub input: InputConfig,

    /// Ordered book list; indices into it are what gets persisted
    #[serde(default)]
    pub audiobooks: Vec<BookEntry>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            playback: PlaybackConfig::default(),
            decoder: DecoderConfig::default(),
            input: InputConfig::default(),
            audiobooks: Vec::new(),
        }
    }
}

impl Config {
    /// Validates every section, collecting all errors
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.playback.validate() {
            errors.extend(e);
        }
        if let Err(e) = self.decoder.validate() {
            errors.extend(e);
        }
        if let Err(e) = self.input.validate() {
            errors.extend(e);
        }

        if self.audiobooks.is_empty() {
            errors.push(ValidationError::new("audiobooks", "must not be empty"));
        }
        for (i, book) in self.audiobooks.iter().enumerate() {
            if let Err(e) = Validator::not_empty(&book.name, &format!("audiobooks[{}].name", i)) {
                errors.push(e);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
