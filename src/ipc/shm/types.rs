/*!
 * Shared Memory Types
 * Errors for named shared segments
 */

use nix::errno::Errno;
use thiserror::Error;

/// Shared memory result type
pub type ShmResult<T> = Result<T, ShmError>;

/// Shared memory error types
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ShmError {
    /// Name is not a valid POSIX shared memory name
    #[error("Invalid segment name '{0}': must start with '/' and contain no other '/'")]
    InvalidName(String),

    /// Zero-sized segments cannot be mapped
    #[error("Invalid size: {0}")]
    InvalidSize(usize),

    /// A segment with this name is already present
    #[error("Segment already exists: {0}")]
    AlreadyExists(String),

    /// Existing segment is smaller than requested
    #[error("Segment {name} is {actual} bytes, expected at least {expected}")]
    SizeMismatch {
        name: String,
        expected: usize,
        actual: u64,
    },

    /// Underlying system call failed
    #[error("{op} on {name} failed: {errno}")]
    Sys {
        op: &'static str,
        name: String,
        errno: Errno,
    },

    /// Offset/size outside the mapping
    #[error("Invalid offset or size: offset {offset}, size {size}, segment size {segment_size}")]
    InvalidRange {
        offset: usize,
        size: usize,
        segment_size: usize,
    },
}

impl ShmError {
    pub(super) fn sys(op: &'static str, name: &str, errno: Errno) -> Self {
        ShmError::Sys {
            op,
            name: name.to_string(),
            errno,
        }
    }
}
