/*!
 * Process Types
 * Spawn configuration and errors for child processes
 */

use std::path::PathBuf;
use thiserror::Error;

/// Process operation result
pub type ProcessResult<T> = Result<T, ProcessError>;

/// Process errors
///
/// Spawn failures and wait failures are distinct variants so callers can
/// tell "never started" from "started but lost".
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Spawn of '{program}' failed: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Wait on '{program}' (pid {pid}) failed: {source}")]
    WaitFailed {
        program: String,
        pid: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' (pid {pid}) was terminated by signal {signal}")]
    Signaled { program: String, pid: u32, signal: i32 },
}

/// Configuration for spawning a child
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnConfig {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    /// Inherit our stdout/stderr instead of discarding the child's output
    pub forward_output: bool,
}

impl SpawnConfig {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: vec![],
            working_dir: None,
            forward_output: false,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_forward_output(mut self, forward: bool) -> Self {
        self.forward_output = forward;
        self
    }

    pub fn program_name(&self) -> String {
        self.program.display().to_string()
    }
}
