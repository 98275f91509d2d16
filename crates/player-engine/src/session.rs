//! Playback session state shared with the monitor loop

use crate::position::PositionTracker;
use std::path::PathBuf;
use std::time::Instant;

/// Playback status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    Playing,
    Paused,
    Stopped,
}

/// State of the one in-progress playback attempt
///
/// Owned by the controller behind its session lock; the monitor loop is the
/// only other writer.
#[derive(Debug)]
pub struct SessionState {
    pub(crate) file: Option<PathBuf>,
    pub(crate) status: PlaybackStatus,
    pub(crate) tracker: Option<PositionTracker>,
    /// Last computed position estimate, kept fresh by the monitor loop
    pub(crate) position: f64,
    pub(crate) sleep_deadline: Option<Instant>,
}

impl SessionState {
    pub(crate) fn new() -> Self {
        Self {
            file: None,
            status: PlaybackStatus::Stopped,
            tracker: None,
            position: 0.0,
            sleep_deadline: None,
        }
    }

    /// Replaces the session with a fresh one for `file`
    pub(crate) fn begin(&mut self, file: PathBuf, now: Instant, position: f64) {
        self.file = Some(file);
        self.status = PlaybackStatus::Playing;
        self.tracker = Some(PositionTracker::start_at(now, position));
        self.position = position.max(0.0);
        self.sleep_deadline = None;
    }

    /// Tears the session down, retaining the final position estimate
    pub(crate) fn end(&mut self, final_position: f64) {
        self.file = None;
        self.status = PlaybackStatus::Stopped;
        self.tracker = None;
        self.position = final_position.max(0.0);
        self.sleep_deadline = None;
    }

    pub(crate) fn is_live(&self) -> bool {
        self.status != PlaybackStatus::Stopped
    }
}
