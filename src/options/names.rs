/*!
 * Instance Names
 * Machine-wide names derived from the working directory
 */

use crate::core::limits::{FINAL_MUTEX_PREFIX, PRIMARY_MUTEX_PREFIX, SHARED_SEGMENT_PREFIX};
use sha2::{Digest, Sha256};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

/// Names of the two mutexes and the shared segment for one working directory
///
/// Unrelated working directories get unrelated names, so concurrent builds
/// elsewhere on the machine never contend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstanceNames {
    pub primary_mutex: String,
    pub final_mutex: String,
    pub shared_segment: String,
}

impl InstanceNames {
    pub fn for_working_dir(working_dir: &Path) -> Self {
        Self::from_hash(working_dir_hash(working_dir))
    }

    pub fn from_hash(hash: u32) -> Self {
        Self {
            primary_mutex: format!("{}-{:08x}", PRIMARY_MUTEX_PREFIX, hash),
            final_mutex: format!("{}-{:08x}", FINAL_MUTEX_PREFIX, hash),
            shared_segment: format!("{}-{:08x}", SHARED_SEGMENT_PREFIX, hash),
        }
    }
}

/// First four bytes of the SHA-256 of the path's bytes
pub fn working_dir_hash(working_dir: &Path) -> u32 {
    let digest = Sha256::digest(working_dir.as_os_str().as_bytes());
    u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
}
