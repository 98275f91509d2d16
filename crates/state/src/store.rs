//! Durable playback state
//!
//! One JSON record of `{book_index, position}` at a configured path. Writes
//! go through a temporary file and an atomic rename so the record is never
//! left half-written.

use crate::error::{StateError, StateResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct StateRecord {
    book_index: usize,
    position: f64,
}

impl Default for StateRecord {
    fn default() -> Self {
        Self {
            book_index: 0,
            position: 0.0,
        }
    }
}

/// Persistent record of the active book and playback position
pub struct StateStore {
    path: PathBuf,
    record: StateRecord,
}

impl StateStore {
    /// Loads the record at `path`, falling back to defaults
    ///
    /// A missing file starts fresh; an unreadable or corrupt file is logged
    /// and discarded. Loading never fails.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut record = match Self::read_record(&path) {
            Ok(Some(record)) => {
                log::info!(
                    "Loaded state: book {}, position {:.1}s",
                    record.book_index + 1,
                    record.position
                );
                record
            }
            Ok(None) => {
                log::info!("No saved state at {}, starting fresh", path.display());
                StateRecord::default()
            }
            Err(e) => {
                log::warn!("{}; starting fresh", e);
                StateRecord::default()
            }
        };
        record.position = record.position.max(0.0);
        Self { path, record }
    }

    fn read_record(path: &Path) -> StateResult<Option<StateRecord>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(path).map_err(|e| StateError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let record = serde_json::from_str(&contents).map_err(|e| StateError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Some(record))
    }

    /// Writes the current record to disk atomically
    pub fn save(&self) -> StateResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                if !parent.exists() {
                    fs::create_dir_all(parent).map_err(|e| StateError::Write {
                        path: self.path.clone(),
                        source: e,
                    })?;
                }
                parent
            }
            _ => Path::new("."),
        };

        let json =
            serde_json::to_string_pretty(&self.record).map_err(StateError::Serialize)?;

        let mut temp_file = NamedTempFile::new_in(dir).map_err(|e| StateError::Write {
            path: self.path.clone(),
            source: e,
        })?;
        temp_file
            .write_all(json.as_bytes())
            .and_then(|_| temp_file.flush())
            .map_err(|e| StateError::Write {
                path: self.path.clone(),
                source: e,
            })?;
        temp_file.persist(&self.path).map_err(|e| StateError::Write {
            path: self.path.clone(),
            source: e.error,
        })?;

        log::debug!(
            "Saved state: book {}, position {:.1}s",
            self.record.book_index + 1,
            self.record.position
        );
        Ok(())
    }

    /// Switches the active book and resets the position, persisting at once
    pub fn set_book(&mut self, index: usize) {
        self.record.book_index = index;
        self.record.position = 0.0;
        if let Err(e) = self.save() {
            log::warn!("Failed to persist book switch: {}", e);
        }
    }

    /// Updates the in-memory position, clamped to zero
    ///
    /// The caller decides when to persist.
    pub fn set_position(&mut self, position: f64) {
        self.record.position = position.max(0.0);
    }

    pub fn book_index(&self) -> usize {
        self.record.book_index
    }

    pub fn position(&self) -> f64 {
        self.record.position
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
