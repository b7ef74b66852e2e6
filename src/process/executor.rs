/*!
 * Child Process Handle
 * Spawns a child and either waits for it or lets it go
 */

use super::types::{ProcessError, ProcessResult, SpawnConfig};
use std::os::unix::process::ExitStatusExt;
use std::process::{Child, Command, Stdio};
use tracing::{debug, info, warn};

/// A spawned child process
///
/// Consumed by exactly one of [`ChildProcess::wait_for_exit`] or
/// [`ChildProcess::detach`]. Dropping the handle behaves like `detach`.
#[derive(Debug)]
pub struct ChildProcess {
    child: Child,
    program: String,
}

impl ChildProcess {
    /// Spawn a new OS process
    pub fn spawn(config: &SpawnConfig) -> ProcessResult<Self> {
        let program = config.program_name();
        if program.trim().is_empty() {
            return Err(ProcessError::InvalidCommand("Empty program path".to_string()));
        }

        let mut cmd = Command::new(&config.program);
        cmd.args(&config.args);

        if let Some(ref dir) = config.working_dir {
            cmd.current_dir(dir);
        }

        // Configure I/O
        cmd.stdin(Stdio::null());
        if config.forward_output {
            cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        } else {
            cmd.stdout(Stdio::null()).stderr(Stdio::null());
        }

        let child = cmd.spawn().map_err(|source| ProcessError::SpawnFailed {
            program: program.clone(),
            source,
        })?;

        info!(program = %program, os_pid = child.id(), "spawned child process");
        Ok(Self { child, program })
    }

    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// Block until the child exits and return its exit code
    pub fn wait_for_exit(mut self) -> ProcessResult<i32> {
        let pid = self.child.id();
        let status = self
            .child
            .wait()
            .map_err(|source| ProcessError::WaitFailed {
                program: self.program.clone(),
                pid,
                source,
            })?;

        match status.code() {
            Some(code) => {
                debug!(program = %self.program, pid, code, "child exited");
                Ok(code)
            }
            None => {
                let signal = status.signal().unwrap_or_default();
                warn!(program = %self.program, pid, signal, "child killed by signal");
                Err(ProcessError::Signaled {
                    program: self.program,
                    pid,
                    signal,
                })
            }
        }
    }

    /// Release all interest in the child; its exit code is never collected
    ///
    /// Returns the OS pid for logging. Once this process exits the child is
    /// re-parented and reaped by init.
    pub fn detach(self) -> u32 {
        let pid = self.child.id();
        debug!(program = %self.program, pid, "detached child process");
        pid
    }
}
