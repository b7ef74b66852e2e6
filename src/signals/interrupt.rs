/*!
 * Interrupt Guard
 * Scoped SIGINT handler that raises a process-wide stop flag
 *
 * Only the single-instance wait loop looks at the flag. An interrupt
 * during the final-liveness wait or during a running build is not
 * intercepted here; the build engine and the default disposition of its
 * own children deal with it.
 */

use super::types::{SignalError, SignalResult};
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

static STOP_BUILD: AtomicBool = AtomicBool::new(false);
static INSTALLED: AtomicBool = AtomicBool::new(false);

extern "C" fn on_interrupt(_signal: nix::libc::c_int) {
    // Async-signal-safe: a single atomic store.
    STOP_BUILD.store(true, Ordering::SeqCst);
}

/// True once an interrupt arrived while a guard was installed
pub fn stop_requested() -> bool {
    STOP_BUILD.load(Ordering::SeqCst)
}

/// Raise the stop flag without a signal
pub fn request_stop() {
    STOP_BUILD.store(true, Ordering::SeqCst);
}

/// Lower the stop flag
pub fn clear_stop() {
    STOP_BUILD.store(false, Ordering::SeqCst);
}

/// Installed SIGINT handler; restores the previous disposition on drop
///
/// At most one guard exists per process.
#[derive(Debug)]
pub struct InterruptGuard {
    previous: Option<SigAction>,
}

impl InterruptGuard {
    pub fn install() -> SignalResult<Self> {
        if INSTALLED.swap(true, Ordering::SeqCst) {
            return Err(SignalError::AlreadyInstalled);
        }

        let action = SigAction::new(
            SigHandler::Handler(on_interrupt),
            SaFlags::SA_RESTART,
            SigSet::empty(),
        );

        // SAFETY: the handler only performs an atomic store.
        let previous = match unsafe { sigaction(Signal::SIGINT, &action) } {
            Ok(previous) => previous,
            Err(errno) => {
                INSTALLED.store(false, Ordering::SeqCst);
                return Err(SignalError::Install(errno));
            }
        };

        debug!("interrupt handler registered");
        Ok(Self {
            previous: Some(previous),
        })
    }

    pub fn is_registered(&self) -> bool {
        self.previous.is_some()
    }

    /// Restore the previous SIGINT disposition; idempotent
    pub fn deregister(&mut self) -> SignalResult<()> {
        if let Some(previous) = self.previous.take() {
            // SAFETY: restores the disposition that was active before install.
            unsafe { sigaction(Signal::SIGINT, &previous) }.map_err(SignalError::Restore)?;
            INSTALLED.store(false, Ordering::SeqCst);
            debug!("interrupt handler deregistered");
        }
        Ok(())
    }
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        if let Err(e) = self.deregister() {
            tracing::warn!(error = %e, "failed to restore SIGINT disposition");
        }
    }
}
