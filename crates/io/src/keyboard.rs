//! Keyboard simulation of the button panel
//!
//! For development machines without the physical board: a polling thread
//! reads raw key events and dispatches them through the same callbacks the
//! hardware buttons would fire. LED changes are logged instead of lit.

use crate::bridge::{ButtonCallback, IoBridge};
use crate::error::{IoError, IoResult};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Poll granularity of the input thread; bounds shutdown latency
const INPUT_POLL: Duration = Duration::from_millis(100);

pub struct KeyboardBridge {
    buttons: Arc<Mutex<HashMap<u8, ButtonCallback>>>,
    leds: Mutex<HashMap<u8, bool>>,
    running: Arc<AtomicBool>,
    input_thread: Mutex<Option<thread::JoinHandle<()>>>,
}

impl KeyboardBridge {
    pub fn new() -> Self {
        Self {
            buttons: Arc::new(Mutex::new(HashMap::new())),
            leds: Mutex::new(HashMap::new()),
            running: Arc::new(AtomicBool::new(false)),
            input_thread: Mutex::new(None),
        }
    }

    /// Starts the key-reading thread
    ///
    /// `key_map` routes characters to button pins; `quit_key` fires
    /// `on_quit` instead of a button. Callbacks run synchronously on the
    /// input thread, so a slow handler blocks further input, exactly like a
    /// hardware dispatch thread would.
    pub fn start_input_loop(
        &self,
        key_map: HashMap<char, u8>,
        quit_key: char,
        on_quit: ButtonCallback,
    ) -> IoResult<()> {
        terminal::enable_raw_mode().map_err(|e| IoError::Terminal { source: e })?;
        self.running.store(true, Ordering::SeqCst);

        let buttons = Arc::clone(&self.buttons);
        let running = Arc::clone(&self.running);

        let mut keys: Vec<char> = key_map.keys().copied().collect();
        keys.sort_unstable();

        let handle = thread::spawn(move || {
            input_loop(&buttons, &key_map, quit_key, &on_quit, &running);
        });
        *self.input_thread.lock().unwrap() = Some(handle);

        log::info!(
            "Keyboard controls active: {:?} ('{}' to quit)",
            keys,
            quit_key
        );
        Ok(())
    }
}

impl Default for KeyboardBridge {
    fn default() -> Self {
        Self::new()
    }
}

fn input_loop(
    buttons: &Mutex<HashMap<u8, ButtonCallback>>,
    key_map: &HashMap<char, u8>,
    quit_key: char,
    on_quit: &ButtonCallback,
    running: &AtomicBool,
) {
    while running.load(Ordering::SeqCst) {
        match event::poll(INPUT_POLL) {
            Ok(false) => continue,
            Ok(true) => match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                    if let KeyCode::Char(c) = key.code {
                        let c = c.to_ascii_lowercase();
                        if c == quit_key {
                            log::info!("Quit requested");
                            on_quit();
                        } else if let Some(&pin) = key_map.get(&c) {
                            log::debug!("Button press: '{}' (pin {})", c, pin);
                            if let Some(callback) = buttons.lock().unwrap().get(&pin) {
                                callback();
                            }
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    log::warn!("Keyboard read error: {}", e);
                }
            },
            Err(e) => {
                log::warn!("Keyboard poll error: {}", e);
                thread::sleep(INPUT_POLL);
            }
        }
    }
}

impl IoBridge for KeyboardBridge {
    fn setup_button(&self, id: u8, callback: ButtonCallback) -> IoResult<()> {
        self.buttons.lock().unwrap().insert(id, callback);
        log::debug!("Simulated button on pin {}", id);
        Ok(())
    }

    fn setup_led(&self, id: u8) -> IoResult<()> {
        self.leds.lock().unwrap().insert(id, false);
        log::debug!("Simulated LED on pin {}", id);
        Ok(())
    }

    fn set_led(&self, id: u8, on: bool) -> IoResult<()> {
        match self.leds.lock().unwrap().get_mut(&id) {
            Some(state) => {
                *state = on;
                log::info!("LED {}: {}", id, if on { "on" } else { "off" });
                Ok(())
            }
            None => Err(IoError::UnknownLed(id)),
        }
    }

    fn cleanup(&self) {
        let was_running = self.running.swap(false, Ordering::SeqCst);
        if let Some(handle) = self.input_thread.lock().unwrap().take() {
            let _ = handle.join();
        }
        if was_running {
            if let Err(e) = terminal::disable_raw_mode() {
                log::warn!("Failed to restore terminal: {}", e);
            }
        }
        log::debug!("Keyboard bridge cleanup complete");
    }
}
