/*!
 * Signal Types
 */

use nix::errno::Errno;
use thiserror::Error;

/// Signal operation result
pub type SignalResult<T> = Result<T, SignalError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignalError {
    #[error("An interrupt handler is already installed in this process")]
    AlreadyInstalled,

    #[error("Failed to install interrupt handler: {0}")]
    Install(Errno),

    #[error("Failed to restore interrupt handler: {0}")]
    Restore(Errno),
}
