//! Configuration sections

use crate::validation::{ValidationError, Validator};
use bookbox_core::ButtonAction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Playback behavior and file locations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Durable state record path
    pub state_file: PathBuf,

    /// Seconds skipped by the forward/backward buttons
    pub seek_seconds: u64,

    /// Interval of the background position save loop
    pub save_interval_seconds: u64,

    /// Minutes added per sleep-timer button press
    pub sleep_timer_minutes: u64,

    /// Chime played on pause/resume/sleep-timer, omit to disable
    pub notification_sound: Option<PathBuf>,

    /// Directory of per-book announcement clips, named `{index+1}.mp3`
    pub announcements_dir: PathBuf,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            state_file: PathBuf::from("bookbox-state.json"),
            seek_seconds: 60,
            save_interval_seconds: 30,
            sleep_timer_minutes: 15,
            notification_sound: None,
            announcements_dir: PathBuf::from("announcements"),
        }
    }
}

impl PlaybackConfig {
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Validator::collect_errors(vec![
            Validator::in_range(self.seek_seconds, 1, 600, "playback.seek_seconds"),
            Validator::in_range(
                self.save_interval_seconds,
                1,
                3600,
                "playback.save_interval_seconds",
            ),
            Validator::in_range(
                self.sleep_timer_minutes,
                1,
                480,
                "playback.sleep_timer_minutes",
            ),
        ])
    }
}

/// Decoder process control strategy
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DecoderBackendKind {
    /// Process-group signals only (madplay-style, seek restarts the process)
    Signal,
    /// Command stream over stdin (mpg123 -R style, in-place seek)
    Remote,
}

impl std::fmt::Display for DecoderBackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Signal => write!(f, "signal"),
            Self::Remote => write!(f, "remote"),
        }
    }
}

/// External decoder program
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DecoderConfig {
    pub backend: DecoderBackendKind,

    /// Decoder executable, looked up on PATH if not absolute
    pub binary: PathBuf,

    /// Arguments for a playback session launch
    pub args: Vec<String>,

    /// Arguments for one-shot clip playback (announcements, chimes); the
    /// remote-control flag in `args` must not leak into these
    pub clip_args: Vec<String>,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            backend: DecoderBackendKind::Signal,
            binary: PathBuf::from("madplay"),
            args: vec!["-Q".to_string()],
            clip_args: vec!["-Q".to_string()],
        }
    }
}

impl DecoderConfig {
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Validator::collect_errors(vec![Validator::not_empty(
            &self.binary.to_string_lossy(),
            "decoder.binary",
        )])
    }
}

/// Input backend selection
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InputBackendKind {
    /// Physical buttons and LEDs (driver supplied externally)
    Hardware,
    /// Keyboard simulation for development machines
    Keyboard,
}

impl std::fmt::Display for InputBackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hardware => write!(f, "hardware"),
            Self::Keyboard => write!(f, "keyboard"),
        }
    }
}

/// Physical pin per logical button
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ButtonPins {
    pub play_pause: u8,
    pub sleep_timer: u8,
    pub next_book: u8,
    pub prev_book: u8,
    pub forward: u8,
    pub backward: u8,
}

impl Default for ButtonPins {
    fn default() -> Self {
        Self {
            play_pause: 17,
            sleep_timer: 27,
            next_book: 22,
            prev_book: 23,
            forward: 24,
            backward: 25,
        }
    }
}

impl ButtonPins {
    /// Returns the pin assigned to a logical action
    pub fn pin_for(&self, action: ButtonAction) -> u8 {
        match action {
            ButtonAction::PlayPause => self.play_pause,
            ButtonAction::SleepTimer => self.sleep_timer,
            ButtonAction::NextBook => self.next_book,
            ButtonAction::PrevBook => self.prev_book,
            ButtonAction::Forward => self.forward,
            ButtonAction::Backward => self.backward,
        }
    }

    fn all(&self) -> [u8; 6] {
        [
            self.play_pause,
            self.sleep_timer,
            self.next_book,
            self.prev_book,
            self.forward,
            self.backward,
        ]
    }
}

/// Keyboard keys for the simulated input backend
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct KeyMap {
    pub play_pause: char,
    pub sleep_timer: char,
    pub next_book: char,
    pub prev_book: char,
    pub forward: char,
    pub backward: char,
    pub quit: char,
}

impl Default for KeyMap {
    fn default() -> Self {
        Self {
            play_pause: 'p',
            sleep_timer: 's',
            next_book: 'n',
            prev_book: 'b',
            forward: 'f',
            backward: 'r',
            quit: 'q',
        }
    }
}

impl KeyMap {
    /// Resolves the key-to-pin mapping the simulated input loop dispatches on
    pub fn key_to_pin(&self, pins: &ButtonPins) -> HashMap<char, u8> {
        HashMap::from([
            (self.play_pause, pins.play_pause),
            (self.sleep_timer, pins.sleep_timer),
            (self.next_book, pins.next_book),
            (self.prev_book, pins.prev_book),
            (self.forward, pins.forward),
            (self.backward, pins.backward),
        ])
    }
}

/// Buttons, LEDs and the input backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InputConfig {
    pub backend: InputBackendKind,
    pub buttons: ButtonPins,

    /// One LED pin per book, lit while that book is active
    pub leds: Vec<u8>,

    pub keys: KeyMap,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            backend: InputBackendKind::Hardware,
            buttons: ButtonPins::default(),
            leds: vec![5, 6, 13, 19],
            keys: KeyMap::default(),
        }
    }
}

impl InputConfig {
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut pins: Vec<u8> = self.buttons.all().to_vec();
        pins.extend_from_slice(&self.leds);
        Validator::collect_errors(vec![Validator::all_distinct(&pins, "input pins")])
    }
}
