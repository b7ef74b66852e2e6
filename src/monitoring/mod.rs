/*!
 * Monitoring Module
 * Logging setup and role spans
 */

pub mod tracer;

pub use tracer::{init_tracing, RoleSpan, DEFAULT_FILTER};
