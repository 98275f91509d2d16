//! Playback controller
//!
//! Owns the lifecycle of one decoder process at a time and the background
//! monitor loop that keeps the position estimate fresh, notices decoder
//! exit, and fires the sleep timer. All operations degrade gracefully:
//! failures come back as `EngineResult` values for the caller to log, never
//! as panics.

use crate::decoder::{self, DecoderControl};
use crate::error::EngineResult;
use crate::session::{PlaybackStatus, SessionState};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

/// Monitor loop cadence
const MONITOR_TICK: Duration = Duration::from_millis(500);

/// Upper bound on announcement clip playback
const ANNOUNCEMENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Controller tunables beyond the decoder backend itself
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    /// Seconds skipped per seek button press
    pub seek_seconds: u64,

    /// Chime for pause/resume/sleep-timer acknowledgement, if configured
    pub notification_sound: Option<PathBuf>,

    /// Program and arguments for one-shot clip playback
    pub clip_binary: PathBuf,
    pub clip_args: Vec<String>,
}

/// Everything behind the position lock: the decoder handle and the session
struct Inner {
    backend: Box<dyn DecoderControl>,
    session: SessionState,
}

pub struct PlayerController {
    inner: Arc<Mutex<Inner>>,
    settings: ControllerSettings,
    running: Arc<AtomicBool>,
    monitor: Mutex<Option<thread::JoinHandle<()>>>,
}

impl PlayerController {
    pub fn new(backend: Box<dyn DecoderControl>, settings: ControllerSettings) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                backend,
                session: SessionState::new(),
            })),
            settings,
            running: Arc::new(AtomicBool::new(true)),
            monitor: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    /// Starts playback of `file` at `position` seconds
    ///
    /// Any existing session is torn down first; the backend guarantees no
    /// two decoder process groups ever run at once.
    pub fn start(&self, file: &Path, position: f64) -> EngineResult<()> {
        let position = position.max(0.0);
        {
            let mut inner = self.lock();
            inner.backend.start(file, position)?;
            inner
                .session
                .begin(file.to_path_buf(), Instant::now(), position);
        }
        self.ensure_monitor();
        Ok(())
    }

    /// Stops playback; a no-op when nothing is playing
    pub fn stop(&self) -> EngineResult<()> {
        let mut inner = self.lock();
        if !inner.session.is_live() && inner.session.file.is_none() {
            return Ok(());
        }
        // Snapshot the estimate before the (possibly slow) teardown.
        let last = current_position(&inner.session, Instant::now());
        inner.backend.stop()?;
        inner.session.end(last);
        Ok(())
    }

    /// Suspends playback; a no-op unless currently playing
    pub fn pause(&self) -> EngineResult<()> {
        let transitioned = {
            let mut inner = self.lock();
            pause_inner(&mut inner, Instant::now())?
        };
        if transitioned {
            play_notification_clip(&self.settings);
            log::info!("Paused");
        }
        Ok(())
    }

    /// Resumes playback; a no-op unless currently paused
    pub fn resume(&self) -> EngineResult<()> {
        let transitioned = {
            let mut inner = self.lock();
            if inner.session.status != PlaybackStatus::Paused {
                false
            } else {
                inner.backend.resume()?;
                let now = Instant::now();
                if let Some(tracker) = inner.session.tracker.as_mut() {
                    tracker.resume_at(now);
                }
                inner.session.status = PlaybackStatus::Playing;
                true
            }
        };
        if transitioned {
            play_notification_clip(&self.settings);
            log::info!("Resumed");
        }
        Ok(())
    }

    pub fn toggle_play_pause(&self) -> EngineResult<()> {
        match self.status() {
            PlaybackStatus::Playing => self.pause(),
            PlaybackStatus::Paused => self.resume(),
            PlaybackStatus::Stopped => Ok(()),
        }
    }

    pub fn seek_forward(&self) -> EngineResult<()> {
        self.seek_by(self.settings.seek_seconds as f64)
    }

    pub fn seek_backward(&self) -> EngineResult<()> {
        self.seek_by(-(self.settings.seek_seconds as f64))
    }

    fn seek_by(&self, delta: f64) -> EngineResult<()> {
        let mut inner = self.lock();
        if !inner.session.is_live() {
            return Ok(());
        }
        let Some(file) = inner.session.file.clone() else {
            return Ok(());
        };

        let now = Instant::now();
        let target = (current_position(&inner.session, now) + delta).max(0.0);
        let was_paused = inner.session.status == PlaybackStatus::Paused;

        inner.backend.seek(&file, target)?;
        if was_paused {
            // A restart-based seek leaves the fresh process audible.
            inner.backend.pause()?;
        }

        if let Some(tracker) = inner.session.tracker.as_mut() {
            tracker.seek_at(now, target);
        }
        inner.session.position = target;
        log::info!("Seek to {:.1}s", target);
        Ok(())
    }

    /// Extends the sleep deadline; a no-op unless actively playing
    ///
    /// Repeated presses stack: an active deadline grows by the increment, an
    /// absent or elapsed one is set relative to now.
    pub fn add_sleep_timer(&self, minutes: u64) {
        let remaining = {
            let mut inner = self.lock();
            if inner.session.status != PlaybackStatus::Playing {
                return;
            }
            let now = Instant::now();
            let extension = Duration::from_secs(minutes * 60);
            let deadline = match inner.session.sleep_deadline {
                Some(deadline) if deadline > now => deadline + extension,
                _ => now + extension,
            };
            inner.session.sleep_deadline = Some(deadline);
            deadline.saturating_duration_since(now)
        };
        play_notification_clip(&self.settings);
        log::info!("Sleep timer set: {} minutes remaining", remaining.as_secs() / 60);
    }

    /// Time left until the sleep timer pauses playback, if one is armed
    pub fn sleep_remaining(&self) -> Option<Duration> {
        let inner = self.lock();
        inner
            .session
            .sleep_deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Current estimated position in seconds
    pub fn position(&self) -> f64 {
        let inner = self.lock();
        current_position(&inner.session, Instant::now())
    }

    pub fn status(&self) -> PlaybackStatus {
        self.lock().session.status
    }

    /// True iff playing and not paused
    pub fn is_active(&self) -> bool {
        self.status() == PlaybackStatus::Playing
    }

    /// Plays a book announcement clip, blocking until it ends
    ///
    /// Bounded by a fixed timeout; the main session is untouched either way.
    pub fn play_announcement(&self, clip: &Path) -> EngineResult<()> {
        log::info!("Playing announcement: {}", clip.display());
        decoder::play_clip_blocking(
            &self.settings.clip_binary,
            &self.settings.clip_args,
            clip,
            ANNOUNCEMENT_TIMEOUT,
        )
    }

    /// Fires the notification chime in the background
    pub fn play_notification(&self) {
        play_notification_clip(&self.settings);
    }

    fn ensure_monitor(&self) {
        let mut guard = self.monitor.lock().unwrap();
        if guard.is_some() {
            return;
        }
        let inner = Arc::clone(&self.inner);
        let running = Arc::clone(&self.running);
        let settings = self.settings.clone();
        *guard = Some(thread::spawn(move || monitor_loop(inner, running, settings)));
    }

    /// Stops the session and the monitor loop
    pub fn cleanup(&self) {
        self.running.store(false, Ordering::Relaxed);
        if let Err(e) = self.stop() {
            log::warn!("Error stopping playback during cleanup: {}", e);
        }
        if let Some(handle) = self.monitor.lock().unwrap().take() {
            let _ = handle.join();
        }
    }
}

impl Drop for PlayerController {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Position estimate for the session at `now`
fn current_position(session: &SessionState, now: Instant) -> f64 {
    match (&session.tracker, session.is_live()) {
        (Some(tracker), true) => tracker.position_at(now),
        _ => session.position,
    }
}

/// Shared pause transition, used by `pause()` and the sleep timer
fn pause_inner(inner: &mut Inner, now: Instant) -> EngineResult<bool> {
    if inner.session.status != PlaybackStatus::Playing {
        return Ok(false);
    }
    inner.backend.pause()?;
    if let Some(tracker) = inner.session.tracker.as_mut() {
        tracker.pause_at(now);
    }
    let position = current_position(&inner.session, now);
    inner.session.position = position;
    inner.session.status = PlaybackStatus::Paused;
    Ok(true)
}

fn play_notification_clip(settings: &ControllerSettings) {
    let Some(clip) = settings.notification_sound.as_ref() else {
        return;
    };
    if !clip.exists() {
        log::debug!("Notification clip missing: {}", clip.display());
        return;
    }
    if let Err(e) = decoder::spawn_clip_detached(&settings.clip_binary, &settings.clip_args, clip) {
        log::warn!("Failed to play notification: {}", e);
    }
}

/// Background loop: position refresh, exit detection, sleep timer
///
/// Errors inside a tick are logged and the loop continues; nothing here may
/// take the process down.
fn monitor_loop(inner: Arc<Mutex<Inner>>, running: Arc<AtomicBool>, settings: ControllerSettings) {
    while running.load(Ordering::Relaxed) {
        thread::sleep(MONITOR_TICK);
        let now = Instant::now();
        let mut sleep_elapsed = false;

        {
            let mut guard = inner.lock().unwrap();
            if guard.session.status != PlaybackStatus::Playing {
                continue;
            }

            let position = current_position(&guard.session, now);
            guard.session.position = position;

            if guard.backend.poll_exited() {
                log::info!("Playback finished");
                guard.session.end(position);
                continue;
            }

            if guard
                .session
                .sleep_deadline
                .is_some_and(|deadline| now >= deadline)
            {
                guard.session.sleep_deadline = None;
                sleep_elapsed = true;
            }
        }

        if sleep_elapsed {
            log::info!("Sleep timer expired, pausing playback");
            let transitioned = {
                let mut guard = inner.lock().unwrap();
                match pause_inner(&mut guard, Instant::now()) {
                    Ok(transitioned) => transitioned,
                    Err(e) => {
                        log::warn!("Sleep timer pause failed: {}", e);
                        false
                    }
                }
            };
            if transitioned {
                play_notification_clip(&settings);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use std::sync::atomic::AtomicBool;

    #[derive(Clone, Default)]
    struct MockHandle {
        calls: Arc<Mutex<Vec<String>>>,
        exited: Arc<AtomicBool>,
    }

    impl MockHandle {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn count(&self, name: &str) -> usize {
            self.calls()
                .iter()
                .filter(|call| call.starts_with(name))
                .count()
        }
    }

    struct MockDecoder {
        handle: MockHandle,
    }

    impl DecoderControl for MockDecoder {
        fn start(&mut self, _file: &Path, position: f64) -> EngineResult<()> {
            self.handle
                .calls
                .lock()
                .unwrap()
                .push(format!("start {:.0}", position));
            self.handle.exited.store(false, Ordering::SeqCst);
            Ok(())
        }

        fn stop(&mut self) -> EngineResult<()> {
            self.handle.calls.lock().unwrap().push("stop".to_string());
            self.handle.exited.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn pause(&mut self) -> EngineResult<()> {
            self.handle.calls.lock().unwrap().push("pause".to_string());
            Ok(())
        }

        fn resume(&mut self) -> EngineResult<()> {
            self.handle.calls.lock().unwrap().push("resume".to_string());
            Ok(())
        }

        fn seek(&mut self, _file: &Path, position: f64) -> EngineResult<()> {
            self.handle
                .calls
                .lock()
                .unwrap()
                .push(format!("seek {:.0}", position));
            Ok(())
        }

        fn poll_exited(&mut self) -> bool {
            self.handle.exited.load(Ordering::SeqCst)
        }
    }

    fn settings() -> ControllerSettings {
        ControllerSettings {
            seek_seconds: 60,
            notification_sound: None,
            clip_binary: PathBuf::from("true"),
            clip_args: Vec::new(),
        }
    }

    fn controller() -> (PlayerController, MockHandle) {
        let handle = MockHandle::default();
        let backend = MockDecoder {
            handle: handle.clone(),
        };
        (PlayerController::new(Box::new(backend), settings()), handle)
    }

    fn book() -> PathBuf {
        PathBuf::from("/media/books/dune.mp3")
    }

    #[test]
    fn test_start_begins_playing() {
        let (controller, handle) = controller();
        controller.start(&book(), 42.0).expect("start");
        assert!(controller.is_active());
        assert_eq!(controller.status(), PlaybackStatus::Playing);
        assert!(controller.position() >= 42.0);
        assert_eq!(handle.calls(), vec!["start 42"]);
    }

    #[test]
    fn test_toggle_transitions() {
        let (controller, handle) = controller();
        controller.start(&book(), 0.0).expect("start");

        controller.toggle_play_pause().expect("pause");
        assert_eq!(controller.status(), PlaybackStatus::Paused);
        assert!(!controller.is_active());

        controller.toggle_play_pause().expect("resume");
        assert_eq!(controller.status(), PlaybackStatus::Playing);
        assert_eq!(handle.count("pause"), 1);
        assert_eq!(handle.count("resume"), 1);
    }

    #[test]
    fn test_toggle_when_stopped_is_noop() {
        let (controller, handle) = controller();
        controller.toggle_play_pause().expect("toggle");
        assert!(handle.calls().is_empty());
    }

    #[test]
    fn test_pause_twice_is_idempotent() {
        let (controller, handle) = controller();
        controller.start(&book(), 0.0).expect("start");
        controller.pause().expect("pause");
        controller.pause().expect("second pause");
        assert_eq!(handle.count("pause"), 1);
        assert_eq!(controller.status(), PlaybackStatus::Paused);
    }

    #[test]
    fn test_position_frozen_while_paused() {
        let (controller, _handle) = controller();
        controller.start(&book(), 100.0).expect("start");
        controller.pause().expect("pause");

        let first = controller.position();
        thread::sleep(Duration::from_millis(50));
        let second = controller.position();
        assert_eq!(first, second);
    }

    #[test]
    fn test_seek_round_trip_restores_position() {
        let (controller, handle) = controller();
        controller.start(&book(), 100.0).expect("start");
        controller.seek_forward().expect("forward");
        assert!((controller.position() - 160.0).abs() < 0.5);
        controller.seek_backward().expect("backward");
        assert!((controller.position() - 100.0).abs() < 0.5);
        assert_eq!(handle.count("seek"), 2);
    }

    #[test]
    fn test_seek_backward_clamps_at_zero() {
        let (controller, handle) = controller();
        controller.start(&book(), 10.0).expect("start");
        controller.seek_backward().expect("backward");
        assert_eq!(controller.position(), 0.0);
        assert_eq!(handle.calls()[1], "seek 0");
    }

    #[test]
    fn test_seek_while_paused_repauses() {
        let (controller, handle) = controller();
        controller.start(&book(), 100.0).expect("start");
        controller.pause().expect("pause");
        controller.seek_forward().expect("forward");
        assert_eq!(controller.status(), PlaybackStatus::Paused);
        // pause, then seek, then the post-seek re-pause
        assert_eq!(handle.count("pause"), 2);
    }

    #[test]
    fn test_seek_when_stopped_is_noop() {
        let (controller, handle) = controller();
        controller.seek_forward().expect("forward");
        assert!(handle.calls().is_empty());
    }

    #[test]
    fn test_sleep_timer_stacks() {
        let (controller, _handle) = controller();
        controller.start(&book(), 0.0).expect("start");

        controller.add_sleep_timer(5);
        controller.add_sleep_timer(5);

        let remaining = controller.sleep_remaining().expect("armed");
        assert!(remaining > Duration::from_secs(9 * 60 + 50));
        assert!(remaining <= Duration::from_secs(10 * 60));
    }

    #[test]
    fn test_sleep_timer_ignored_while_paused() {
        let (controller, _handle) = controller();
        controller.start(&book(), 0.0).expect("start");
        controller.pause().expect("pause");
        controller.add_sleep_timer(5);
        assert!(controller.sleep_remaining().is_none());
    }

    #[test]
    fn test_sleep_timer_fires_pause() {
        let (controller, handle) = controller();
        controller.start(&book(), 0.0).expect("start");

        controller.inner.lock().unwrap().session.sleep_deadline = Some(Instant::now());
        thread::sleep(Duration::from_millis(1200));

        assert_eq!(controller.status(), PlaybackStatus::Paused);
        assert!(controller.sleep_remaining().is_none());
        assert_eq!(handle.count("pause"), 1);
    }

    #[test]
    fn test_monitor_detects_decoder_exit() {
        let (controller, handle) = controller();
        controller.start(&book(), 7.0).expect("start");
        handle.exited.store(true, Ordering::SeqCst);

        thread::sleep(Duration::from_millis(1200));
        assert_eq!(controller.status(), PlaybackStatus::Stopped);
        assert!(!controller.is_active());
        // Final position survives the teardown.
        assert!(controller.position() >= 7.0);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let (controller, handle) = controller();
        controller.start(&book(), 0.0).expect("start");
        controller.stop().expect("stop");
        controller.stop().expect("second stop");
        assert_eq!(handle.count("stop"), 1);
        assert_eq!(controller.status(), PlaybackStatus::Stopped);
    }

    #[test]
    fn test_restart_replaces_session() {
        let (controller, handle) = controller();
        controller.start(&book(), 50.0).expect("start");
        controller.add_sleep_timer(5);
        controller.start(&book(), 0.0).expect("restart");

        assert!(controller.sleep_remaining().is_none());
        assert!(controller.position() < 1.0);
        assert_eq!(handle.count("start"), 2);
    }

    #[test]
    fn test_announcement_missing_clip_fails() {
        let (controller, _handle) = controller();
        let result = controller.play_announcement(Path::new("/nonexistent/1.mp3"));
        assert!(matches!(result, Err(EngineError::FileNotFound(_))));
    }

    #[test]
    fn test_notification_unconfigured_is_silent() {
        let (controller, _handle) = controller();
        controller.play_notification();
    }

    #[test]
    fn test_cleanup_stops_and_joins() {
        let (controller, handle) = controller();
        controller.start(&book(), 0.0).expect("start");
        controller.cleanup();
        assert_eq!(controller.status(), PlaybackStatus::Stopped);
        assert_eq!(handle.count("stop"), 1);
        controller.cleanup();
    }
}
