/*!
 * IPC Module
 * Cross-process primitives used by the relay: named mutexes and named
 * shared segments
 */

pub mod mutex;
pub mod shm;

pub use mutex::{MutexError, MutexResult, NamedMutex};
pub use shm::{SharedResult, SharedSegment, ShmError, ShmResult};
