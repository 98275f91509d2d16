//! Player Engine - decoder process control and playback tracking for BookBox
//!
//! The engine never touches audio samples. It launches an external decoder
//! process, estimates the playback position from wall-clock bookkeeping, and
//! supervises the session from a background monitor thread.

mod controller;
mod decoder;
mod error;
mod position;
mod session;

pub use controller::{ControllerSettings, PlayerController};
pub use decoder::{
    play_clip_blocking, spawn_clip_detached, DecoderControl, RemoteDecoder, SignalDecoder,
};
pub use error::{EngineError, EngineResult};
pub use position::PositionTracker;
pub use session::PlaybackStatus;

pub type Result<T> = std::result::Result<T, EngineError>;
