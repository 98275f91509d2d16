//! Persistent playback state for BookBox

mod error;
mod store;

pub use error::{StateError, StateResult};
pub use store::StateStore;
