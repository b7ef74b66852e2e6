/*!
 * Cache Maintenance
 * Usage reporting and oldest-first trimming of the cache directory
 */

use super::types::{CacheStats, EngineError, EngineResult};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};
use walkdir::WalkDir;

struct CacheEntry {
    path: PathBuf,
    bytes: u64,
    modified: SystemTime,
}

fn entries(dir: &Path) -> EngineResult<Vec<CacheEntry>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut out = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(|e| EngineError::Cache(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let meta = entry
            .metadata()
            .map_err(|e| EngineError::Cache(e.to_string()))?;
        out.push(CacheEntry {
            path: entry.into_path(),
            bytes: meta.len(),
            modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        });
    }
    Ok(out)
}

/// File count and total size under `dir`; a missing directory is empty
pub fn cache_stats(dir: &Path) -> EngineResult<CacheStats> {
    Ok(entries(dir)?
        .iter()
        .fold(CacheStats::default(), |acc, e| CacheStats {
            files: acc.files + 1,
            bytes: acc.bytes + e.bytes,
        }))
}

/// Delete oldest files until the total is at most `limit_bytes`
///
/// Returns (removed, remaining).
pub fn trim_cache(dir: &Path, limit_bytes: u64) -> EngineResult<(CacheStats, CacheStats)> {
    let mut all = entries(dir)?;
    all.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.path.cmp(&b.path)));

    let mut remaining = CacheStats {
        files: all.len() as u64,
        bytes: all.iter().map(|e| e.bytes).sum(),
    };
    let mut removed = CacheStats::default();

    for entry in all {
        if remaining.bytes <= limit_bytes {
            break;
        }
        match std::fs::remove_file(&entry.path) {
            Ok(()) => {
                debug!(path = %entry.path.display(), bytes = entry.bytes, "trimmed cache entry");
                removed.files += 1;
                removed.bytes += entry.bytes;
                remaining.files -= 1;
                remaining.bytes -= entry.bytes;
            }
            Err(e) => {
                warn!(path = %entry.path.display(), error = %e, "could not remove cache entry");
            }
        }
    }

    Ok((removed, remaining))
}
