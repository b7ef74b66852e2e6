/*!
 * Role Handlers
 */

use super::instance::{
    acquire_final, acquire_instance, wait_for_final_exit, wait_for_started, FinalOutcome,
    InstanceOutcome,
};
use super::{report, Orchestrator};
use crate::core::types::{ReturnCode, WrapperMode};
use crate::engine::BuildEngine;
use crate::ipc::{NamedMutex, SharedResult, SharedSegment, ShmError, ShmResult};
use crate::process::{ChildProcess, SpawnConfig};
use tracing::{info, warn};

impl<E: BuildEngine> Orchestrator<E> {
    /// Single-instance policy shared by the None and Main roles
    ///
    /// `Ok` carries the held mutex; `Err` carries the code to return.
    fn claim_instance(&self) -> Result<NamedMutex, ReturnCode> {
        debug_assert!(self.options.wrapper_mode.owns_instance());
        let mut primary = self
            .mutex(&self.options.names.primary_mutex)
            .map_err(|e| report(e, ReturnCode::BuildFailed))?;

        match acquire_instance(
            &mut primary,
            self.options.wait,
            self.config.poll.instance_wait,
            &self.options.working_dir,
        ) {
            Ok(InstanceOutcome::Acquired) => Ok(primary),
            Ok(InstanceOutcome::AlreadyRunning) => Err(ReturnCode::AlreadyRunning),
            Ok(InstanceOutcome::Interrupted) => Err(ReturnCode::BuildFailed),
            Err(e) => Err(report(e, ReturnCode::BuildFailed)),
        }
    }

    fn child_spawn(&self, mode: WrapperMode) -> SpawnConfig {
        let program = self
            .config
            .relay_exe
            .as_ref()
            .unwrap_or(&self.options.program);
        SpawnConfig::new(program)
            .with_args(self.options.child_args(mode))
            .with_working_dir(&self.options.working_dir)
            .with_forward_output(true)
    }

    pub(super) fn run_standalone(&mut self) -> ReturnCode {
        let _primary = match self.claim_instance() {
            Ok(mutex) => mutex,
            Err(code) => return code,
        };
        self.execute()
    }

    pub(super) fn run_main(&mut self) -> ReturnCode {
        let _primary = match self.claim_instance() {
            Ok(mutex) => mutex,
            Err(code) => return code,
        };

        let mut liveness = match self.mutex(&self.options.names.final_mutex) {
            Ok(mutex) => mutex,
            Err(e) => return report(e, ReturnCode::BuildFailed),
        };

        let segment = match create_segment(&self.options.names.shared_segment) {
            Ok(segment) => segment,
            Err(e) => return report(e, ReturnCode::FailedToSpawnWrapper),
        };
        let shared = match SharedResult::new(&segment) {
            Ok(shared) => shared,
            Err(e) => return report(e, ReturnCode::FailedToSpawnWrapper),
        };
        shared.initialize();

        let child = match ChildProcess::spawn(&self.child_spawn(WrapperMode::Intermediate)) {
            Ok(child) => child,
            Err(e) => return report(e, ReturnCode::FailedToSpawnWrapper),
        };

        // The intermediate exits as soon as the final process is launched.
        match child.wait_for_exit() {
            Ok(0) => {}
            Ok(code) => {
                warn!(
                    code,
                    started = shared.is_started(),
                    "intermediate process could not launch the final process"
                );
                return ReturnCode::FailedToSpawnWrapperFinal;
            }
            Err(e) => {
                warn!(started = shared.is_started(), "intermediate process was lost");
                return report(e, ReturnCode::FailedToSpawnWrapperFinal);
            }
        }

        if !wait_for_started(&shared, &self.config.poll) {
            warn!(started = false, "final process never reported started");
            return ReturnCode::FailedToSpawnWrapperFinal;
        }

        if let Err(e) = wait_for_final_exit(&mut liveness, self.config.poll.final_liveness) {
            return report(e, ReturnCode::BuildFailed);
        }

        let code = shared.return_code();
        info!(code = code.code(), "final process result");
        code
    }

    pub(super) fn run_intermediate(&mut self) -> ReturnCode {
        match ChildProcess::spawn(&self.child_spawn(WrapperMode::Final)) {
            Ok(child) => {
                let pid = child.detach();
                info!(pid, "final process launched");
                ReturnCode::Ok
            }
            Err(e) => report(e, ReturnCode::FailedToSpawnWrapperFinal),
        }
    }

    pub(super) fn run_final(&mut self) -> ReturnCode {
        let names = self.options.names.clone();
        let (mut liveness, mut primary) =
            match (self.mutex(&names.final_mutex), self.mutex(&names.primary_mutex)) {
                (Ok(liveness), Ok(primary)) => (liveness, primary),
                (Err(e), _) | (_, Err(e)) => return report(e, ReturnCode::BuildFailed),
            };

        match acquire_final(&mut liveness, &mut primary, self.config.poll.final_liveness) {
            Ok(FinalOutcome::Acquired) => {}
            Ok(FinalOutcome::MainGone) => {
                warn!("main process exited before the final process started");
                return ReturnCode::FailedToSpawnWrapperFinal;
            }
            Err(e) => return report(e, ReturnCode::BuildFailed),
        }

        let segment = match SharedSegment::open(&names.shared_segment, SharedResult::SIZE) {
            Ok(Some(segment)) => segment,
            Ok(None) => {
                warn!("shared segment is gone, main process was killed while waiting");
                return ReturnCode::FailedToSpawnWrapperFinal;
            }
            Err(e) => return report(e, ReturnCode::FailedToSpawnWrapperFinal),
        };
        let shared = match SharedResult::new(&segment) {
            Ok(shared) => shared,
            Err(e) => return report(e, ReturnCode::FailedToSpawnWrapperFinal),
        };
        shared.mark_started();

        let code = self.execute();
        shared.store_return_code(code);
        code
    }
}

/// Create the result segment, replacing one left behind by a dead main
///
/// Only called while holding the primary mutex, so an existing segment of
/// the same name cannot belong to a live invocation.
fn create_segment(name: &str) -> ShmResult<SharedSegment> {
    match SharedSegment::create(name, SharedResult::SIZE) {
        Err(ShmError::AlreadyExists(_)) => {
            warn!(segment = name, "removing stale shared segment");
            SharedSegment::unlink(name)?;
            SharedSegment::create(name, SharedResult::SIZE)
        }
        other => other,
    }
}
