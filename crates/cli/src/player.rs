// FILE: crates/cli/src/player.rs

//! Orchestration: buttons to playback to persisted state
//!
//! `Player` wires the controller, the state store and the I/O bridge
//! together, maps button events to transitions, and runs the periodic
//! position-save loop. Button callbacks run synchronously on the bridge's
//! dispatch thread; switching books blocks that thread for the duration of
//! the announcement clip, which is the intended "hold still" behavior.

use anyhow::{Context, Result};
use bookbox_config::{Config, DecoderBackendKind, InputBackendKind};
use bookbox_core::{BookEntry, ButtonAction};
use bookbox_io::{update_book_leds, ButtonCallback, IoBridge, KeyboardBridge, NullBridge};
use bookbox_state::StateStore;
use crossbeam_channel::{bounded, Sender};
use player_engine::{
    ControllerSettings, DecoderControl, PlayerController, RemoteDecoder, SignalDecoder,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Shared core the button callbacks and background loops operate on
struct Deck {
    controller: PlayerController,
    store: Mutex<StateStore>,
    bridge: Arc<dyn IoBridge>,
    books: Vec<BookEntry>,
    led_pins: Vec<u8>,
    announcements_dir: PathBuf,
    sleep_timer_minutes: u64,
    running: AtomicBool,
}

impl Deck {
    /// Persists the controller's current position estimate
    fn save_position(&self) {
        let position = self.controller.position();
        let mut store = self.store.lock().unwrap();
        store.set_position(position);
        if let Err(e) = store.save() {
            log::warn!("Failed to save state: {}", e);
        }
    }

    fn on_play_pause(&self) {
        log::info!("[Button] Play/Pause");
        if let Err(e) = self.controller.toggle_play_pause() {
            log::warn!("Play/pause failed: {}", e);
        }
        self.save_position();
    }

    fn on_sleep_timer(&self) {
        log::info!("[Button] Sleep timer (+{} min)", self.sleep_timer_minutes);
        self.controller.add_sleep_timer(self.sleep_timer_minutes);
    }

    fn on_seek(&self, forward: bool) {
        log::info!("[Button] {}", if forward { "Forward" } else { "Backward" });
        let result = if forward {
            self.controller.seek_forward()
        } else {
            self.controller.seek_backward()
        };
        if let Err(e) = result {
            log::warn!("Seek failed: {}", e);
        }
        self.save_position();
    }

    fn on_switch_book(&self, step: isize) {
        if self.books.is_empty() {
            return;
        }
        let current = self.store.lock().unwrap().book_index();
        let count = self.books.len() as isize;
        let next = (current as isize + step).rem_euclid(count) as usize;
        log::info!("[Button] Switch book {} -> {}", current + 1, next + 1);
        self.switch_book(next);
    }

    fn switch_book(&self, index: usize) {
        let Some(book) = self.books.get(index) else {
            log::error!("Invalid book index: {}", index);
            return;
        };

        // The outgoing book's position must survive the switch.
        self.save_position();
        self.store.lock().unwrap().set_book(index);
        log::info!("Switching to: {}", book.name);

        let announcement = self.announcements_dir.join(format!("{}.mp3", index + 1));
        if let Err(e) = self.controller.play_announcement(&announcement) {
            log::warn!("Announcement for book {} skipped: {}", index + 1, e);
        }

        if let Err(e) = self.controller.start(&book.path, 0.0) {
            log::error!("Failed to start {}: {}", book.path.display(), e);
        }
        update_book_leds(self.bridge.as_ref(), &self.led_pins, index);
    }

    /// Resumes the persisted book at its persisted position
    fn start_current_book(&self) {
        let (index, position) = {
            let store = self.store.lock().unwrap();
            (store.book_index(), store.position())
        };
        match self.books.get(index) {
            Some(book) => {
                log::info!("Starting: {} at {:.1}s", book.name, position);
                if let Err(e) = self.controller.start(&book.path, position) {
                    log::error!("Failed to start {}: {}", book.path.display(), e);
                }
                update_book_leds(self.bridge.as_ref(), &self.led_pins, index);
            }
            None => {
                log::error!(
                    "Invalid book index in saved state: {} ({} books configured)",
                    index,
                    self.books.len()
                );
            }
        }
    }
}

pub struct Player {
    deck: Arc<Deck>,
    save_interval: Duration,
    save_thread: Option<thread::JoinHandle<()>>,
    shutdown_tx: Option<Sender<()>>,
    shutdown_done: bool,
}

impl Player {
    pub fn new(config: Config, force_keyboard: bool) -> Result<Self> {
        let backend: Box<dyn DecoderControl> = match config.decoder.backend {
            DecoderBackendKind::Signal => Box::new(SignalDecoder::new(
                &config.decoder.binary,
                config.decoder.args.clone(),
            )),
            DecoderBackendKind::Remote => Box::new(RemoteDecoder::new(
                &config.decoder.binary,
                config.decoder.args.clone(),
            )),
        };
        let controller = PlayerController::new(
            backend,
            ControllerSettings {
                seek_seconds: config.playback.seek_seconds,
                notification_sound: config.playback.notification_sound.clone(),
                clip_binary: config.decoder.binary.clone(),
                clip_args: config.decoder.clip_args.clone(),
            },
        );

        let store = StateStore::load(&config.playback.state_file);

        let keyboard = force_keyboard || config.input.backend == InputBackendKind::Keyboard;
        let (bridge, keyboard_bridge): (Arc<dyn IoBridge>, Option<Arc<KeyboardBridge>>) =
            if keyboard {
                let kb = Arc::new(KeyboardBridge::new());
                (kb.clone(), Some(kb))
            } else {
                // The GPIO driver is an external collaborator; without one
                // linked in, buttons stay inert.
                log::warn!(
                    "No hardware GPIO driver available; buttons are inactive (try --keyboard)"
                );
                (Arc::new(NullBridge::new()), None)
            };

        let deck = Arc::new(Deck {
            controller,
            store: Mutex::new(store),
            bridge,
            books: config.audiobooks.clone(),
            led_pins: config.input.leds.clone(),
            announcements_dir: config.playback.announcements_dir.clone(),
            sleep_timer_minutes: config.playback.sleep_timer_minutes,
            running: AtomicBool::new(true),
        });

        Self::bind_buttons(&deck, &config)?;

        if let Some(kb) = keyboard_bridge {
            let key_map = config.input.keys.key_to_pin(&config.input.buttons);
            let quit_deck = Arc::clone(&deck);
            kb.start_input_loop(
                key_map,
                config.input.keys.quit,
                Box::new(move || {
                    quit_deck.running.store(false, Ordering::SeqCst);
                }),
            )
            .context("Failed to start keyboard input")?;
        }

        Ok(Self {
            deck,
            save_interval: Duration::from_secs(config.playback.save_interval_seconds),
            save_thread: None,
            shutdown_tx: None,
            shutdown_done: false,
        })
    }

    fn bind_buttons(deck: &Arc<Deck>, config: &Config) -> Result<()> {
        for action in ButtonAction::ALL {
            let pin = config.input.buttons.pin_for(action);
            deck.bridge
                .setup_button(pin, Self::handler_for(deck, action))
                .with_context(|| format!("Failed to bind {} to pin {}", action, pin))?;
        }
        for &pin in &config.input.leds {
            deck.bridge
                .setup_led(pin)
                .with_context(|| format!("Failed to set up LED on pin {}", pin))?;
        }
        Ok(())
    }

    fn handler_for(deck: &Arc<Deck>, action: ButtonAction) -> ButtonCallback {
        let deck = Arc::clone(deck);
        match action {
            ButtonAction::PlayPause => Box::new(move || deck.on_play_pause()),
            ButtonAction::SleepTimer => Box::new(move || deck.on_sleep_timer()),
            ButtonAction::NextBook => Box::new(move || deck.on_switch_book(1)),
            ButtonAction::PrevBook => Box::new(move || deck.on_switch_book(-1)),
            ButtonAction::Forward => Box::new(move || deck.on_seek(true)),
            ButtonAction::Backward => Box::new(move || deck.on_seek(false)),
        }
    }

    /// Restores the persisted session and starts the auto-save loop
    pub fn start_from_saved_state(&mut self) {
        self.deck.start_current_book();
        self.spawn_auto_save();
    }

    fn spawn_auto_save(&mut self) {
        let (tx, rx) = bounded::<()>(1);
        let deck = Arc::clone(&self.deck);
        let interval = self.save_interval;

        let handle = thread::spawn(move || loop {
            match rx.recv_timeout(interval) {
                Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                    if deck.controller.is_active() {
                        deck.save_position();
                    }
                }
                // Shutdown signal, or the sender is gone.
                _ => break,
            }
        });

        self.save_thread = Some(handle);
        self.shutdown_tx = Some(tx);
    }

    pub fn is_running(&self) -> bool {
        self.deck.running.load(Ordering::SeqCst)
    }

    /// Runs the full shutdown sequence; safe to call more than once
    pub fn shutdown(&mut self) {
        self.deck.running.store(false, Ordering::SeqCst);
        if self.shutdown_done {
            return;
        }
        self.shutdown_done = true;
        log::info!("Shutting down");

        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.save_thread.take() {
            let _ = handle.join();
        }

        if self.deck.controller.is_active() {
            self.deck.save_position();
        }
        self.deck.controller.cleanup();
        self.deck.bridge.cleanup();
        log::info!("Shutdown complete");
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.shutdown();
    }
}
