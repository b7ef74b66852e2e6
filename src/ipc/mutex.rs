/*!
 * Named Mutex
 * Machine-wide mutual exclusion identified by a string name
 *
 * Backed by `flock(LOCK_EX | LOCK_NB)` on `<lock_dir>/<name>.lock`. The
 * lock belongs to the open file description, which the kernel closes when
 * the holder exits for any reason, so a crashed holder never leaves the
 * mutex stuck. Lock files are opened close-on-exec and are never inherited
 * by spawned children.
 */

use crate::core::limits::LOCK_FILE_EXTENSION;
use nix::errno::Errno;
use nix::fcntl::{Flock, FlockArg};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, trace};

/// Named mutex result type
pub type MutexResult<T> = Result<T, MutexError>;

/// Named mutex errors
#[derive(Debug, Error)]
pub enum MutexError {
    #[error("Invalid mutex name '{0}'")]
    InvalidName(String),

    #[error("Failed to open lock file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("flock on {} failed: {errno}", path.display())]
    Lock { path: PathBuf, errno: Errno },

    #[error("Failed to release {}: {errno}", path.display())]
    Unlock { path: PathBuf, errno: Errno },
}

/// A system-wide mutex
///
/// `try_lock` never blocks. No re-entrant semantics: locking an already
/// held mutex from the same handle is a no-op that reports success.
pub struct NamedMutex {
    name: String,
    path: PathBuf,
    held: Option<Flock<File>>,
}

impl std::fmt::Debug for NamedMutex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamedMutex")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("locked", &self.held.is_some())
            .finish()
    }
}

impl NamedMutex {
    /// Create a handle for `name` whose lock file lives in `lock_dir`
    ///
    /// Nothing is touched on disk until the first `try_lock`.
    pub fn new(name: &str, lock_dir: &Path) -> MutexResult<Self> {
        if name.is_empty() || name.contains(['/', '\0']) {
            return Err(MutexError::InvalidName(name.to_string()));
        }

        let path = lock_dir.join(format!("{}.{}", name, LOCK_FILE_EXTENSION));
        Ok(Self {
            name: name.to_string(),
            path,
            held: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_locked(&self) -> bool {
        self.held.is_some()
    }

    /// Attempt to acquire without blocking
    ///
    /// Returns `Ok(false)` when any process, including an earlier handle in
    /// this process, already holds the mutex.
    pub fn try_lock(&mut self) -> MutexResult<bool> {
        if self.held.is_some() {
            return Ok(true);
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .map_err(|source| MutexError::Open {
                path: self.path.clone(),
                source,
            })?;

        match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
            Ok(lock) => {
                debug!(mutex = %self.name, "acquired named mutex");
                self.held = Some(lock);
                Ok(true)
            }
            Err((_, errno)) if errno == Errno::EWOULDBLOCK || errno == Errno::EINTR => {
                trace!(mutex = %self.name, "named mutex busy");
                Ok(false)
            }
            Err((_, errno)) => Err(MutexError::Lock {
                path: self.path.clone(),
                errno,
            }),
        }
    }

    /// Release the mutex if held
    pub fn unlock(&mut self) -> MutexResult<()> {
        if let Some(lock) = self.held.take() {
            lock.unlock().map_err(|(_, errno)| MutexError::Unlock {
                path: self.path.clone(),
                errno,
            })?;
            debug!(mutex = %self.name, "released named mutex");
        }
        Ok(())
    }
}
