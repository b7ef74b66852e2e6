/*!
 * Process Module
 * OS-level child process spawning for the relay hops
 */

pub mod executor;
pub mod types;

pub use executor::ChildProcess;
pub use types::{ProcessError, ProcessResult, SpawnConfig};
