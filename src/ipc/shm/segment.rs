/*!
 * Shared Memory Segment
 * A named, fixed-size block of memory mapped into several processes
 *
 * POSIX `shm_open` + `mmap(MAP_SHARED)`. The creating handle unlinks the
 * name when dropped; opening handles only unmap. A process that opens the
 * name after the creator is gone gets `None` rather than an error.
 */

use super::types::{ShmError, ShmResult};
use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::sys::mman::{mmap, munmap, shm_open, shm_unlink, MapFlags, ProtFlags};
use nix::sys::stat::Mode;
use nix::unistd::ftruncate;
use std::ffi::c_void;
use std::fs::File;
use std::num::NonZeroUsize;
use std::ptr::NonNull;
use tracing::{debug, warn};

/// Mapped view of a named segment
pub struct SharedSegment {
    name: String,
    ptr: NonNull<c_void>,
    size: NonZeroUsize,
    owner: bool,
}

impl SharedSegment {
    /// Create and map a zero-initialized segment
    ///
    /// Fails with [`ShmError::AlreadyExists`] when the name is taken.
    pub fn create(name: &str, size: usize) -> ShmResult<Self> {
        validate_name(name)?;
        let len = NonZeroUsize::new(size).ok_or(ShmError::InvalidSize(size))?;

        let fd = shm_open(
            name,
            OFlag::O_CREAT | OFlag::O_EXCL | OFlag::O_RDWR,
            Mode::S_IRUSR | Mode::S_IWUSR,
        )
        .map_err(|errno| match errno {
            Errno::EEXIST => ShmError::AlreadyExists(name.to_string()),
            other => ShmError::sys("shm_open", name, other),
        })?;

        if let Err(errno) = ftruncate(&fd, size as nix::libc::off_t) {
            let _ = shm_unlink(name);
            return Err(ShmError::sys("ftruncate", name, errno));
        }

        let ptr = match map(&File::from(fd), len) {
            Ok(ptr) => ptr,
            Err(errno) => {
                let _ = shm_unlink(name);
                return Err(ShmError::sys("mmap", name, errno));
            }
        };

        // SAFETY: `ptr` is a fresh mapping of exactly `size` writable bytes.
        unsafe {
            std::ptr::write_bytes(ptr.as_ptr().cast::<u8>(), 0, size);
        }

        debug!(segment = name, size, "created shared segment");
        Ok(Self {
            name: name.to_string(),
            ptr,
            size: len,
            owner: true,
        })
    }

    /// Map an existing segment
    ///
    /// Returns `Ok(None)` when no segment of that name exists, which is how a
    /// reader learns that the creator has already gone away.
    pub fn open(name: &str, size: usize) -> ShmResult<Option<Self>> {
        validate_name(name)?;
        let len = NonZeroUsize::new(size).ok_or(ShmError::InvalidSize(size))?;

        let fd = match shm_open(name, OFlag::O_RDWR, Mode::empty()) {
            Ok(fd) => fd,
            Err(Errno::ENOENT) => {
                debug!(segment = name, "shared segment not present");
                return Ok(None);
            }
            Err(errno) => return Err(ShmError::sys("shm_open", name, errno)),
        };

        let file = File::from(fd);
        let actual = file
            .metadata()
            .map(|m| m.len())
            .map_err(|e| ShmError::sys("fstat", name, errno_of(&e)))?;
        if actual < size as u64 {
            return Err(ShmError::SizeMismatch {
                name: name.to_string(),
                expected: size,
                actual,
            });
        }

        let ptr = map(&file, len).map_err(|errno| ShmError::sys("mmap", name, errno))?;

        debug!(segment = name, size, "opened shared segment");
        Ok(Some(Self {
            name: name.to_string(),
            ptr,
            size: len,
            owner: false,
        }))
    }

    /// Remove a segment name left behind by a creator that died
    ///
    /// Processes that still map the old segment keep their view.
    pub fn unlink(name: &str) -> ShmResult<bool> {
        validate_name(name)?;
        match shm_unlink(name) {
            Ok(()) => Ok(true),
            Err(Errno::ENOENT) => Ok(false),
            Err(errno) => Err(ShmError::sys("shm_unlink", name, errno)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> usize {
        self.size.get()
    }

    /// Raw read/write view of the whole segment
    ///
    /// Valid for the lifetime of `self`. Other processes may write through
    /// their own mapping at any time, so access must go through atomics.
    pub fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr().cast::<u8>()
    }

    /// Pointer to `size` bytes at `offset`, bounds-checked
    pub fn ptr_at(&self, offset: usize, size: usize) -> ShmResult<*mut u8> {
        let end = offset.checked_add(size);
        match end {
            Some(end) if end <= self.size.get() => {
                // SAFETY: `offset + size` is within the mapping.
                Ok(unsafe { self.as_ptr().add(offset) })
            }
            _ => Err(ShmError::InvalidRange {
                offset,
                size,
                segment_size: self.size.get(),
            }),
        }
    }
}

impl Drop for SharedSegment {
    fn drop(&mut self) {
        // SAFETY: `ptr`/`size` describe a mapping created in `map` and not yet
        // unmapped; no references into it outlive `self`.
        if let Err(errno) = unsafe { munmap(self.ptr, self.size.get()) } {
            warn!(segment = %self.name, error = %errno, "munmap failed");
        }

        if self.owner {
            if let Err(errno) = shm_unlink(self.name.as_str()) {
                if errno != Errno::ENOENT {
                    warn!(segment = %self.name, error = %errno, "shm_unlink failed");
                }
            }
            debug!(segment = %self.name, "destroyed shared segment");
        }
    }
}

impl std::fmt::Debug for SharedSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSegment")
            .field("name", &self.name)
            .field("size", &self.size)
            .field("owner", &self.owner)
            .finish()
    }
}

fn map(file: &File, len: NonZeroUsize) -> nix::Result<NonNull<c_void>> {
    // SAFETY: a new shared mapping does not alias any Rust object; the file
    // is at least `len` bytes long (ftruncate or the size check above).
    unsafe {
        mmap(
            None,
            len,
            ProtFlags::PROT_READ | ProtFlags::PROT_WRITE,
            MapFlags::MAP_SHARED,
            file,
            0,
        )
    }
}

fn validate_name(name: &str) -> ShmResult<()> {
    let valid = name.len() > 1
        && name.starts_with('/')
        && !name[1..].contains('/')
        && !name.contains('\0');
    if valid {
        Ok(())
    } else {
        Err(ShmError::InvalidName(name.to_string()))
    }
}

fn errno_of(err: &std::io::Error) -> Errno {
    err.raw_os_error()
        .map(Errno::from_raw)
        .unwrap_or(Errno::EIO)
}
