/*!
 * Signals Module
 * Interrupt handling for the single-instance wait
 */

mod interrupt;
pub mod types;

// Re-export public API
pub use interrupt::{clear_stop, request_stop, stop_requested, InterruptGuard};
pub use types::{SignalError, SignalResult};
