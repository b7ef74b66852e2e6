/*!
 * Build Engine Types
 * Configuration file schema and engine errors
 */

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

/// Engine result type
pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Failed to read build configuration {}: {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid build configuration {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Target '{target}' depends on unknown target '{dependency}'")]
    UnknownDependency { target: String, dependency: String },

    #[error("Unknown target '{0}'")]
    UnknownTarget(String),

    #[error("Dependency cycle through '{0}'")]
    Cycle(String),

    #[error("Build engine used before initialize()")]
    NotInitialized,

    #[error("Target '{target}' failed: {reason}")]
    TargetFailed { target: String, reason: String },

    #[error("No cache directory configured")]
    NoCache,

    #[error("Cache operation failed: {0}")]
    Cache(String),
}

/// Contents of the build configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct BuildConfig {
    /// Target built when none are named on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_target: Option<String>,
    /// Cache directory, relative to the working directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
    #[serde(default)]
    pub targets: BTreeMap<String, TargetSpec>,
}

/// One named target
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct TargetSpec {
    /// Program and arguments; a target without a command only groups others
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends: Vec<String>,
}

/// Usage summary for the cache directory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub files: u64,
    pub bytes: u64,
}

impl CacheStats {
    pub fn mib(&self) -> f64 {
        self.bytes as f64 / (1024.0 * 1024.0)
    }
}
