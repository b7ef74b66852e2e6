/*!
 * Build Relay Library
 *
 * Single-instance build launching with an optional three-process relay
 * (main, intermediate, final) that runs the build in a detached process
 * and still reports its exit code to the caller.
 */

pub mod config;
pub mod core;
pub mod engine;
pub mod ipc;
pub mod monitoring;
pub mod options;
pub mod orchestrator;
pub mod process;
pub mod signals;

// Re-exports
pub use crate::config::{PollIntervals, RelayConfig};
pub use crate::core::errors::{RelayError, RelayResult};
pub use crate::core::types::{ReturnCode, WrapperMode};
pub use engine::{BuildEngine, ScriptEngine};
pub use ipc::{NamedMutex, SharedResult, SharedSegment};
pub use monitoring::init_tracing;
pub use options::{parse_args, BuildAction, BuildOptions, InstanceNames, ParseOutcome};
pub use orchestrator::Orchestrator;
pub use process::{ChildProcess, SpawnConfig};
pub use signals::InterruptGuard;
