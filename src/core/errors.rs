/*!
 * Error Types
 * Centralized error handling with thiserror and miette
 *
 * Errors never cross the process boundary. Each role folds whatever went
 * wrong into a single [`ReturnCode`] via [`RelayError::return_code`].
 */

use super::types::ReturnCode;
use miette::Diagnostic;
use thiserror::Error;

pub use crate::engine::EngineError;
pub use crate::ipc::mutex::MutexError;
pub use crate::ipc::shm::ShmError;
pub use crate::options::OptionsError;
pub use crate::process::ProcessError;
pub use crate::signals::SignalError;

/// Relay result type
pub type RelayResult<T> = Result<T, RelayError>;

/// Top-level error for one relay invocation
#[derive(Error, Debug, Diagnostic)]
pub enum RelayError {
    #[error(transparent)]
    #[diagnostic(
        code(relay::options),
        help("Run with --help to see the accepted flags.")
    )]
    Options(#[from] OptionsError),

    #[error(transparent)]
    #[diagnostic(
        code(relay::mutex),
        help("Check that the lock directory (RELAY_LOCK_DIR) is writable.")
    )]
    Mutex(#[from] MutexError),

    #[error(transparent)]
    #[diagnostic(
        code(relay::shared_memory),
        help("Check /dev/shm permissions and free space.")
    )]
    SharedMemory(#[from] ShmError),

    #[error(transparent)]
    #[diagnostic(
        code(relay::process),
        help("The relay re-launches its own executable; make sure it is still on disk.")
    )]
    Process(#[from] ProcessError),

    #[error(transparent)]
    #[diagnostic(code(relay::signal))]
    Signal(#[from] SignalError),

    #[error(transparent)]
    #[diagnostic(
        code(relay::engine),
        help("Check the build configuration file.")
    )]
    Engine(#[from] EngineError),
}

impl RelayError {
    /// Outcome code reported when this error ends a role outside of the
    /// wrapper-specific paths, which pick their own codes
    pub fn return_code(&self) -> ReturnCode {
        match self {
            RelayError::Options(_) => ReturnCode::BadArgs,
            RelayError::Engine(EngineError::Load { .. })
            | RelayError::Engine(EngineError::Parse { .. })
            | RelayError::Engine(EngineError::UnknownDependency { .. }) => {
                ReturnCode::ErrorLoadingConfig
            }
            RelayError::SharedMemory(_) | RelayError::Process(_) => {
                ReturnCode::FailedToSpawnWrapper
            }
            RelayError::Mutex(_) | RelayError::Signal(_) | RelayError::Engine(_) => {
                ReturnCode::BuildFailed
            }
        }
    }
}
