/*!
 * Shared Result Layout
 * Fixed-layout view over the segment that carries a build result
 *
 * | offset | size | field         |
 * |--------|------|---------------|
 * | 0      | 4    | started (u32) |
 * | 4      | 4    | return code   |
 *
 * Both fields are accessed only through atomics. The protocol never relies
 * on the segment for mutual exclusion: `started` is written once before any
 * build work, the return code once before a normal exit, and main reads the
 * return code only after the final-liveness mutex became acquirable.
 */

use super::segment::SharedSegment;
use super::types::ShmResult;
use crate::core::limits::{RETURN_CODE_OFFSET, SHARED_RESULT_SIZE, STARTED_OFFSET};
use crate::core::types::ReturnCode;
use std::sync::atomic::{AtomicI32, AtomicU32, Ordering};

/// Typed view of a mapped [`SharedSegment`]
#[derive(Debug)]
pub struct SharedResult<'a> {
    started: &'a AtomicU32,
    return_code: &'a AtomicI32,
}

impl<'a> SharedResult<'a> {
    pub const SIZE: usize = SHARED_RESULT_SIZE;

    /// Attach the view to a segment of at least [`Self::SIZE`] bytes
    pub fn new(segment: &'a SharedSegment) -> ShmResult<Self> {
        let started = segment.ptr_at(STARTED_OFFSET, std::mem::size_of::<u32>())?;
        let return_code = segment.ptr_at(RETURN_CODE_OFFSET, std::mem::size_of::<i32>())?;

        debug_assert_eq!(started as usize % std::mem::align_of::<AtomicU32>(), 0);
        debug_assert_eq!(return_code as usize % std::mem::align_of::<AtomicI32>(), 0);

        // SAFETY: both pointers are in bounds, 4-byte aligned (the mapping is
        // page aligned and the offsets are multiples of 4) and stay mapped
        // for `'a`. Atomics have the same layout as the plain integers.
        let (started, return_code) = unsafe {
            (
                &*(started as *const AtomicU32),
                &*(return_code as *const AtomicI32),
            )
        };

        Ok(Self {
            started,
            return_code,
        })
    }

    /// Reset to the pre-spawn state: not started, crashed sentinel
    pub fn initialize(&self) {
        self.started.store(0, Ordering::SeqCst);
        self.return_code
            .store(ReturnCode::CRASHED_SENTINEL.code(), Ordering::SeqCst);
    }

    /// Signal that the final process has mapped the segment
    pub fn mark_started(&self) {
        self.started.store(1, Ordering::SeqCst);
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst) != 0
    }

    pub fn store_return_code(&self, code: ReturnCode) {
        self.return_code.store(code.code(), Ordering::Release);
    }

    /// Raw return code; only meaningful once the final process has exited
    pub fn raw_return_code(&self) -> i32 {
        self.return_code.load(Ordering::Acquire)
    }

    /// Decoded return code; unknown values read as a crash
    pub fn return_code(&self) -> ReturnCode {
        ReturnCode::from_code(self.raw_return_code()).unwrap_or(ReturnCode::WrapperCrashed)
    }
}
