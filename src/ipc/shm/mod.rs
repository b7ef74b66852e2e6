/*!
 * Shared Memory Module
 * Named segments and the build result layout carried over them
 */

pub mod layout;
pub mod segment;
pub mod types;

// Re-export public API
pub use layout::SharedResult;
pub use segment::SharedSegment;
pub use types::{ShmError, ShmResult};
