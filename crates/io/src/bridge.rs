//! I/O bridge capability interface
//!
//! Buttons and LEDs sit behind [`IoBridge`] so the same orchestration runs
//! against physical GPIO, the keyboard simulation, or nothing at all. The
//! hardware driver itself lives outside this repository; it only has to
//! implement this trait.

use crate::error::{IoError, IoResult};
use std::collections::HashMap;
use std::sync::Mutex;

/// Callback invoked on the dispatch thread when a button fires
pub type ButtonCallback = Box<dyn Fn() + Send + Sync>;

pub trait IoBridge: Send + Sync {
    /// Registers a callback for a button pin
    fn setup_button(&self, id: u8, callback: ButtonCallback) -> IoResult<()>;

    /// Prepares an LED pin, initially off
    fn setup_led(&self, id: u8) -> IoResult<()>;

    /// Switches an LED on or off
    fn set_led(&self, id: u8, on: bool) -> IoResult<()>;

    /// Releases all resources held by the bridge
    fn cleanup(&self);
}

/// Lights exactly the LED assigned to the active book
pub fn update_book_leds(bridge: &dyn IoBridge, leds: &[u8], active_index: usize) {
    for (i, &pin) in leds.iter().enumerate() {
        if let Err(e) = bridge.set_led(pin, i == active_index) {
            log::warn!("Failed to update LED {}: {}", pin, e);
        }
    }
}

/// Headless bridge: accepts registrations, drives nothing on its own
///
/// Used where neither hardware nor a terminal is present; `press` dispatches
/// a button by hand, which is also how tests exercise the wiring.
#[derive(Default)]
pub struct NullBridge {
    buttons: Mutex<HashMap<u8, ButtonCallback>>,
    leds: Mutex<HashMap<u8, bool>>,
}

impl NullBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires the callback registered for `id`, if any
    pub fn press(&self, id: u8) {
        if let Some(callback) = self.buttons.lock().unwrap().get(&id) {
            callback();
        }
    }

    /// Current LED state, if the pin was set up
    pub fn led_state(&self, id: u8) -> Option<bool> {
        self.leds.lock().unwrap().get(&id).copied()
    }
}

impl IoBridge for NullBridge {
    fn setup_button(&self, id: u8, callback: ButtonCallback) -> IoResult<()> {
        self.buttons.lock().unwrap().insert(id, callback);
        Ok(())
    }

    fn setup_led(&self, id: u8) -> IoResult<()> {
        self.leds.lock().unwrap().insert(id, false);
        Ok(())
    }

    fn set_led(&self, id: u8, on: bool) -> IoResult<()> {
        match self.leds.lock().unwrap().get_mut(&id) {
            Some(state) => {
                *state = on;
                Ok(())
            }
            None => Err(IoError::UnknownLed(id)),
        }
    }

    fn cleanup(&self) {}
}
