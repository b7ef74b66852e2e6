/*!
 * Build Engine
 *
 * The relay treats the build engine as an opaque collaborator: it asks for
 * one action and only looks at success or failure. [`ScriptEngine`] is the
 * reference engine shipped with the binary.
 */

mod cache;
mod script;
pub mod types;

pub use cache::{cache_stats, trim_cache};
pub use script::ScriptEngine;
pub use types::{BuildConfig, CacheStats, EngineError, EngineResult, TargetSpec};

/// Operations the relay needs from a build engine
pub trait BuildEngine {
    /// Load the build configuration
    fn initialize(&mut self) -> EngineResult<()>;

    /// Build `targets` (the default target when empty)
    fn build(&mut self, targets: &[String]) -> EngineResult<()>;

    fn display_target_list(&self);

    fn display_dependency_info(&self, targets: &[String]) -> EngineResult<()>;

    fn cache_info(&self) -> EngineResult<()>;

    /// Shrink the cache to at most `limit_mib` MiB
    fn cache_trim(&self, limit_mib: u64) -> EngineResult<()>;
}
