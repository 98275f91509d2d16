// FILE: crates/cli/src/signals.rs

//! Interrupt/terminate handling
//!
//! The handler only flips a flag; the main loop polls it and runs the
//! ordinary shutdown sequence, so no cleanup happens in signal context.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

extern "C" fn handle_signal(_signal: libc::c_int) {
    SHUTDOWN.store(true, Ordering::SeqCst);
}

/// Routes SIGINT and SIGTERM to the shutdown flag
pub fn install_shutdown_handler() -> io::Result<()> {
    let handler: extern "C" fn(libc::c_int) = handle_signal;
    for signal in [libc::SIGINT, libc::SIGTERM] {
        let previous = unsafe { libc::signal(signal, handler as libc::sighandler_t) };
        if previous == libc::SIG_ERR {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

pub fn shutdown_requested() -> bool {
    SHUTDOWN.load(Ordering::SeqCst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_sets_flag_on_raise() {
        install_shutdown_handler().expect("install");
        unsafe {
            libc::raise(libc::SIGTERM);
        }
        assert!(shutdown_requested());
    }
}
