// FILE: crates/player-engine/src/decoder.rs

//! Decoder process backends
//!
//! The decoder is an opaque external program; BookBox never decodes audio
//! itself. Two control strategies cover the decoders found in the field:
//!
//! - [`SignalDecoder`] for players with no control channel (madplay): the
//!   whole process group is driven with SIGSTOP/SIGCONT/SIGTERM, and a seek
//!   restarts the process at the new offset.
//! - [`RemoteDecoder`] for players with a remote-control mode (mpg123 -R):
//!   one long-lived process receives textual commands over stdin and can
//!   jump in place.
//!
//! Each session child leads its own process group so that termination also
//! reaps any helper processes the decoder forks.

use crate::error::{EngineError, EngineResult};
use std::io::Write;
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// How long a graceful stop may take before the group is killed
const STOP_TIMEOUT: Duration = Duration::from_secs(2);

/// Poll interval while waiting on a child
const WAIT_POLL: Duration = Duration::from_millis(50);

/// Control surface over one decoder process at a time
pub trait DecoderControl: Send {
    /// Launches (or re-targets) the decoder at `position` seconds into `file`
    fn start(&mut self, file: &Path, position: f64) -> EngineResult<()>;

    /// Terminates the decoder, escalating to a kill on timeout; idempotent
    fn stop(&mut self) -> EngineResult<()>;

    /// Suspends audible output
    fn pause(&mut self) -> EngineResult<()>;

    /// Resumes audible output
    fn resume(&mut self) -> EngineResult<()>;

    /// Moves playback to an absolute position
    fn seek(&mut self, file: &Path, position: f64) -> EngineResult<()>;

    /// Non-blocking liveness poll; true once the decoder has exited
    fn poll_exited(&mut self) -> bool;
}

/// Sends `signal` to the child's process group
fn signal_group(child: &Child, signal: libc::c_int) -> EngineResult<()> {
    // The child leads its own group, so the group id is its pid.
    let pgid = child.id() as libc::pid_t;
    let rc = unsafe { libc::killpg(pgid, signal) };
    if rc == 0 {
        Ok(())
    } else {
        Err(EngineError::Signal(format!(
            "killpg({}, {}) failed: {}",
            pgid,
            signal,
            std::io::Error::last_os_error()
        )))
    }
}

/// Polls `try_wait` until the child exits or `timeout` elapses
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> EngineResult<Option<ExitStatus>> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(WAIT_POLL);
    }
}

/// SIGTERM the group, wait, then SIGKILL whatever is left
fn terminate_group(child: &mut Child) {
    match signal_group(child, libc::SIGTERM) {
        Ok(()) => match wait_with_timeout(child, STOP_TIMEOUT) {
            Ok(Some(_)) => return,
            Ok(None) => log::warn!("Decoder ignored SIGTERM, killing process group"),
            Err(e) => log::warn!("Wait after SIGTERM failed ({}), killing process group", e),
        },
        Err(e) => log::warn!("Graceful stop failed ({}), killing process group", e),
    }
    let _ = signal_group(child, libc::SIGKILL);
    let _ = child.wait();
}

/// Formats seconds as the H:MM:SS.mmm start offset madplay expects
fn format_start_offset(position: f64) -> String {
    let total = position.max(0.0);
    let hours = (total / 3600.0) as u64;
    let minutes = ((total % 3600.0) / 60.0) as u64;
    let seconds = total % 60.0;
    format!("{}:{:02}:{:06.3}", hours, minutes, seconds)
}

/// Signal-controlled decoder: one process per playback attempt
pub struct SignalDecoder {
    binary: PathBuf,
    args: Vec<String>,
    child: Option<Child>,
    suspended: bool,
}

impl SignalDecoder {
    pub fn new(binary: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            binary: binary.into(),
            args,
            child: None,
            suspended: false,
        }
    }
}

impl DecoderControl for SignalDecoder {
    fn start(&mut self, file: &Path, position: f64) -> EngineResult<()> {
        self.stop()?;

        if !file.exists() {
            return Err(EngineError::FileNotFound(file.to_path_buf()));
        }

        let mut cmd = Command::new(&self.binary);
        cmd.args(&self.args);
        if position > 0.0 {
            cmd.arg("--start").arg(format_start_offset(position));
        }
        cmd.arg(file)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .process_group(0);

        let child = cmd.spawn().map_err(EngineError::Spawn)?;
        log::info!(
            "Decoder started: {} at {:.1}s (pid {})",
            file.display(),
            position,
            child.id()
        );
        self.child = Some(child);
        self.suspended = false;
        Ok(())
    }

    fn stop(&mut self) -> EngineResult<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        // A stopped group never handles SIGTERM; wake it first.
        if self.suspended {
            let _ = signal_group(&child, libc::SIGCONT);
        }
        self.suspended = false;
        terminate_group(&mut child);
        Ok(())
    }

    fn pause(&mut self) -> EngineResult<()> {
        let child = self
            .child
            .as_ref()
            .ok_or_else(|| EngineError::InvalidState("no decoder running".to_string()))?;
        if !self.suspended {
            signal_group(child, libc::SIGSTOP)?;
            self.suspended = true;
        }
        Ok(())
    }

    fn resume(&mut self) -> EngineResult<()> {
        let child = self
            .child
            .as_ref()
            .ok_or_else(|| EngineError::InvalidState("no decoder running".to_string()))?;
        if self.suspended {
            signal_group(child, libc::SIGCONT)?;
            self.suspended = false;
        }
        Ok(())
    }

    fn seek(&mut self, file: &Path, position: f64) -> EngineResult<()> {
        // madplay has no in-place seek: relaunch at the new offset.
        self.start(file, position)
    }

    fn poll_exited(&mut self) -> bool {
        match self.child.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(Some(_))),
            None => true,
        }
    }
}

impl Drop for SignalDecoder {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Remote-controlled decoder: one long-lived process, commands over stdin
pub struct RemoteDecoder {
    binary: PathBuf,
    args: Vec<String>,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    paused: bool,
}

impl RemoteDecoder {
    pub fn new(binary: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            binary: binary.into(),
            args,
            child: None,
            stdin: None,
            paused: false,
        }
    }

    fn send(&mut self, command: &str) -> EngineResult<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| EngineError::InvalidState("decoder command channel closed".to_string()))?;
        writeln!(stdin, "{}", command)
            .and_then(|_| stdin.flush())
            .map_err(|e| EngineError::Command(format!("{}: {}", command, e)))
    }

    /// Spawns the decoder process if it is not already alive
    fn ensure_running(&mut self) -> EngineResult<()> {
        if let Some(child) = self.child.as_mut() {
            if !matches!(child.try_wait(), Ok(Some(_))) {
                return Ok(());
            }
            log::warn!("Decoder process died, relaunching");
            self.child = None;
            self.stdin = None;
        }

        let mut cmd = Command::new(&self.binary);
        cmd.args(&self.args)
            // Output is discarded rather than piped: an unread pipe could
            // fill up and stall the decoder.
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .process_group(0);

        let mut child = cmd.spawn().map_err(EngineError::Spawn)?;
        log::info!("Decoder started in remote mode (pid {})", child.id());
        self.stdin = child.stdin.take();
        self.child = Some(child);
        self.paused = false;
        Ok(())
    }
}

impl DecoderControl for RemoteDecoder {
    fn start(&mut self, file: &Path, position: f64) -> EngineResult<()> {
        if !file.exists() {
            return Err(EngineError::FileNotFound(file.to_path_buf()));
        }
        self.ensure_running()?;
        self.send(&format!("LOAD {}", file.display()))?;
        if position > 0.0 {
            self.send(&format!("JUMP {:.1}s", position))?;
        }
        self.paused = false;
        Ok(())
    }

    fn stop(&mut self) -> EngineResult<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        if let Some(mut stdin) = self.stdin.take() {
            let _ = writeln!(stdin, "QUIT");
            let _ = stdin.flush();
            // Dropping the handle closes the pipe, a second exit nudge.
        }
        self.paused = false;

        match wait_with_timeout(&mut child, STOP_TIMEOUT) {
            Ok(Some(_)) => Ok(()),
            Ok(None) => {
                log::warn!("Decoder ignored QUIT, terminating process group");
                terminate_group(&mut child);
                Ok(())
            }
            Err(e) => {
                log::warn!("Wait after QUIT failed ({}), terminating process group", e);
                terminate_group(&mut child);
                Ok(())
            }
        }
    }

    fn pause(&mut self) -> EngineResult<()> {
        if !self.paused {
            self.send("PAUSE")?;
            self.paused = true;
        }
        Ok(())
    }

    fn resume(&mut self) -> EngineResult<()> {
        if self.paused {
            self.send("PAUSE")?;
            self.paused = false;
        }
        Ok(())
    }

    fn seek(&mut self, _file: &Path, position: f64) -> EngineResult<()> {
        self.send(&format!("JUMP {:.1}s", position.max(0.0)))
    }

    fn poll_exited(&mut self) -> bool {
        match self.child.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(Some(_))),
            None => true,
        }
    }
}

impl Drop for RemoteDecoder {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Plays a short clip, blocking until it finishes or `timeout` elapses
pub fn play_clip_blocking(
    binary: &Path,
    clip_args: &[String],
    clip: &Path,
    timeout: Duration,
) -> EngineResult<()> {
    if !clip.exists() {
        return Err(EngineError::FileNotFound(clip.to_path_buf()));
    }

    let mut child = Command::new(binary)
        .args(clip_args)
        .arg(clip)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .process_group(0)
        .spawn()
        .map_err(EngineError::Spawn)?;

    match wait_with_timeout(&mut child, timeout) {
        Ok(Some(status)) if status.success() => Ok(()),
        Ok(Some(status)) => Err(EngineError::ClipFailed(format!(
            "{} exited with {}",
            clip.display(),
            status
        ))),
        Ok(None) => {
            let _ = signal_group(&child, libc::SIGKILL);
            let _ = child.wait();
            Err(EngineError::ClipTimeout(timeout))
        }
        Err(e) => {
            let _ = signal_group(&child, libc::SIGKILL);
            let _ = child.wait();
            Err(e)
        }
    }
}

/// Fires a clip in the background without waiting
pub fn spawn_clip_detached(binary: &Path, clip_args: &[String], clip: &Path) -> EngineResult<()> {
    if !clip.exists() {
        return Err(EngineError::FileNotFound(clip.to_path_buf()));
    }

    let child = Command::new(binary)
        .args(clip_args)
        .arg(clip)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .process_group(0)
        .spawn()
        .map_err(EngineError::Spawn)?;

    // Reap the clip from a detached thread so it never lingers as a zombie.
    thread::spawn(move || {
        let mut child = child;
        let _ = child.wait();
    });
    Ok(())
}
