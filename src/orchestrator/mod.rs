/*!
 * Orchestrator
 * Decides which role this process plays and drives it to one return code
 *
 * Roles:
 * - None: take the primary instance mutex and build in-process
 * - Main: take the primary instance mutex, create the result segment,
 *   relay through an intermediate process and report the final result
 * - Intermediate: launch the final process detached and exit
 * - Final: take the liveness mutex, report `started`, build, store result
 *
 * All handles (mutexes, segment, interrupt guard) are owned by the running
 * role and released when it returns, on every path.
 */

pub mod instance;
mod roles;
pub mod timing;

pub use instance::{FinalOutcome, InstanceOutcome};
pub use timing::format_elapsed;

use crate::config::RelayConfig;
use crate::core::errors::RelayError;
use crate::core::types::{ReturnCode, WrapperMode};
use crate::engine::BuildEngine;
use crate::ipc::{MutexResult, NamedMutex};
use crate::monitoring::RoleSpan;
use crate::options::{BuildAction, BuildOptions};
use crate::signals::InterruptGuard;
use std::time::Instant;
use tracing::{debug, warn};

/// One invocation of the relay
///
/// Field order is drop order: the interrupt guard is released before the
/// build engine is torn down.
pub struct Orchestrator<E: BuildEngine> {
    interrupt: InterruptGuard,
    engine: E,
    options: BuildOptions,
    config: RelayConfig,
    started: Instant,
}

impl<E: BuildEngine> Orchestrator<E> {
    pub fn new(
        interrupt: InterruptGuard,
        engine: E,
        options: BuildOptions,
        config: RelayConfig,
    ) -> Self {
        Self {
            interrupt,
            engine,
            options,
            config,
            started: Instant::now(),
        }
    }

    /// Run the role selected by the options
    pub fn run(mut self) -> ReturnCode {
        let role = RoleSpan::new(self.options.wrapper_mode);
        let code = role.in_scope(|| match self.options.wrapper_mode {
            WrapperMode::None => self.run_standalone(),
            WrapperMode::Main => self.run_main(),
            WrapperMode::Intermediate => self.run_intermediate(),
            WrapperMode::Final => self.run_final(),
        });
        role.record_outcome(code);

        if let Err(e) = self.interrupt.deregister() {
            warn!(error = %e, "failed to deregister interrupt handler");
        }
        code
    }

    fn mutex(&self, name: &str) -> MutexResult<NamedMutex> {
        NamedMutex::new(name, &self.config.lock_dir)
    }

    /// Initialize the engine and perform the requested action
    ///
    /// Prints the timing line after every action except the target list.
    fn execute(&mut self) -> ReturnCode {
        if let Err(e) = self.engine.initialize() {
            return report(e, ReturnCode::ErrorLoadingConfig);
        }

        let targets = self.options.targets.clone();
        let result = match self.options.action {
            BuildAction::ShowTargets => {
                self.engine.display_target_list();
                return ReturnCode::Ok;
            }
            BuildAction::ShowDependencies => self.engine.display_dependency_info(&targets),
            BuildAction::CacheInfo => self.engine.cache_info(),
            BuildAction::CacheTrim { limit_mib } => self.engine.cache_trim(limit_mib),
            BuildAction::Build => self.engine.build(&targets),
        };

        let code = match result {
            Ok(()) => ReturnCode::Ok,
            Err(e) => report(e, ReturnCode::BuildFailed),
        };

        println!("{}", format_elapsed(self.started.elapsed()));
        code
    }
}

/// Print `err` as a diagnostic and return `code`
fn report(err: impl Into<RelayError>, code: ReturnCode) -> ReturnCode {
    let err: RelayError = err.into();
    debug!(error = %err, code = code.code(), "role step failed");
    eprintln!("{:?}", miette::Report::new(err));
    code
}
