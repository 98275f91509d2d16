//! Input/Output bridge for BookBox
//!
//! Physical buttons and LEDs behind a capability trait, with a keyboard
//! simulation for development and a null bridge for headless use.

mod bridge;
mod error;
mod keyboard;

pub use bridge::{update_book_leds, ButtonCallback, IoBridge, NullBridge};
pub use error::{IoError, IoResult};
pub use keyboard::KeyboardBridge;
