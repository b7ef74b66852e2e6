/*!
 * Instance Acquisition
 * Poll loops over the primary instance and final-liveness mutexes
 *
 * Intervals are asymmetric: the instance wait polls every second and is
 * the only loop that honors an interrupt, while the liveness loops poll
 * every millisecond because they gate build start and result latency.
 */

use crate::config::PollIntervals;
use crate::ipc::{MutexResult, NamedMutex, SharedResult};
use crate::signals::stop_requested;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Result of the single-instance policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceOutcome {
    Acquired,
    /// Held elsewhere and `--wait` was not given
    AlreadyRunning,
    /// Interrupted while waiting
    Interrupted,
}

/// Result of the final role's wait on the liveness mutex
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalOutcome {
    Acquired,
    /// The primary mutex became free: main is gone
    MainGone,
}

/// Acquire the primary instance mutex, failing fast or waiting
pub fn acquire_instance(
    primary: &mut NamedMutex,
    wait: bool,
    interval: Duration,
    working_dir: &Path,
) -> MutexResult<InstanceOutcome> {
    if primary.try_lock()? {
        return Ok(InstanceOutcome::Acquired);
    }

    if !wait {
        println!(
            "build-relay: Error: Another build is already running in '{}'.",
            working_dir.display()
        );
        return Ok(InstanceOutcome::AlreadyRunning);
    }

    println!("build-relay: Waiting for another build to terminate due to --wait option.");
    loop {
        thread::sleep(interval);
        if stop_requested() {
            info!("instance wait interrupted");
            return Ok(InstanceOutcome::Interrupted);
        }
        if primary.try_lock()? {
            return Ok(InstanceOutcome::Acquired);
        }
    }
}

/// Final role: take the liveness mutex, bailing out if main disappeared
///
/// A previous final process of the same working directory may still hold
/// the liveness mutex, so this loop can legitimately wait a long time.
pub fn acquire_final(
    liveness: &mut NamedMutex,
    primary: &mut NamedMutex,
    interval: Duration,
) -> MutexResult<FinalOutcome> {
    let mut announced = false;
    while !liveness.try_lock()? {
        if !announced {
            println!("build-relay: Waiting for another build to terminate...");
            announced = true;
        }
        if primary.try_lock()? {
            return Ok(FinalOutcome::MainGone);
        }
        thread::sleep(interval);
    }
    Ok(FinalOutcome::Acquired)
}

/// Main role: wait for the final process to report `started`
///
/// Returns false only when `poll.start_timeout` is set and expires.
pub fn wait_for_started(shared: &SharedResult<'_>, poll: &PollIntervals) -> bool {
    let begin = Instant::now();
    while !shared.is_started() {
        if let Some(limit) = poll.start_timeout {
            if begin.elapsed() >= limit {
                return false;
            }
        }
        thread::sleep(poll.started);
    }
    debug!(waited_ms = begin.elapsed().as_millis() as u64, "final process started");
    true
}

/// Main role: block until the final process released the liveness mutex
///
/// Not interruptible; the final process always runs to completion.
pub fn wait_for_final_exit(liveness: &mut NamedMutex, interval: Duration) -> MutexResult<()> {
    while !liveness.try_lock()? {
        thread::sleep(interval);
    }
    debug!("final process exited");
    Ok(())
}
