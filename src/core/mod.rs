/*!
 * Core Module
 * Shared types, limits and errors
 */

pub mod errors;
pub mod limits;
pub mod types;

pub use errors::{RelayError, RelayResult};
pub use types::{ReturnCode, WrapperMode};
