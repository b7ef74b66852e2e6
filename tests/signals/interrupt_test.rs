/*!
 * Interrupt Guard Tests
 * Process-global signal state, so every test runs serially
 */

use build_relay::signals::{clear_stop, stop_requested, InterruptGuard, SignalError};
use nix::sys::signal::{raise, Signal};
use serial_test::serial;

#[test]
#[serial]
fn test_sigint_raises_stop_flag() {
    clear_stop();
    let guard = InterruptGuard::install().unwrap();
    assert!(guard.is_registered());
    assert!(!stop_requested());

    raise(Signal::SIGINT).unwrap();
    assert!(stop_requested());

    clear_stop();
    drop(guard);
}

#[test]
#[serial]
fn test_single_guard_per_process() {
    let guard = InterruptGuard::install().unwrap();
    assert!(matches!(
        InterruptGuard::install(),
        Err(SignalError::AlreadyInstalled)
    ));
    drop(guard);

    let again = InterruptGuard::install().unwrap();
    drop(again);
}

#[test]
#[serial]
fn test_deregister_is_idempotent() {
    let mut guard = InterruptGuard::install().unwrap();
    guard.deregister().unwrap();
    assert!(!guard.is_registered());
    guard.deregister().unwrap();

    // Deregistered guards free the slot even before they are dropped.
    let next = InterruptGuard::install().unwrap();
    drop(next);
    drop(guard);
}
