//! Core domain types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// One audiobook as listed in the configuration
///
/// Entries are immutable and referenced everywhere by their index in the
/// configured order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookEntry {
    pub name: String,
    pub path: PathBuf,
}

impl BookEntry {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// The six logical player buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonAction {
    PlayPause,
    SleepTimer,
    NextBook,
    PrevBook,
    Forward,
    Backward,
}

impl ButtonAction {
    /// All actions, in the order they appear in configuration files
    pub const ALL: [ButtonAction; 6] = [
        ButtonAction::PlayPause,
        ButtonAction::SleepTimer,
        ButtonAction::NextBook,
        ButtonAction::PrevBook,
        ButtonAction::Forward,
        ButtonAction::Backward,
    ];
}

impl fmt::Display for ButtonAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlayPause => write!(f, "play_pause"),
            Self::SleepTimer => write!(f, "sleep_timer"),
            Self::NextBook => write!(f, "next_book"),
            Self::PrevBook => write!(f, "prev_book"),
            Self::Forward => write!(f, "forward"),
            Self::Backward => write!(f, "backward"),
        }
    }
}
