/*!
 * Relay Limits and Constants
 *
 * Poll intervals, name prefixes and segment geometry in one place.
 * Intervals trade CPU usage against latency and are overridable through
 * [`crate::config::RelayConfig`].
 */

use std::time::Duration;

// =============================================================================
// POLL INTERVALS
// =============================================================================

/// Instance-wait interval (1s)
/// A second build waiting on `--wait` is idle anyway; keep it cheap
pub const INSTANCE_WAIT_INTERVAL: Duration = Duration::from_secs(1);

/// Final-liveness interval (1ms)
/// Gates build start latency in the final process and result latency in main
/// [PERF] Deliberately 1000x tighter than the instance-wait interval
pub const FINAL_LIVENESS_INTERVAL: Duration = Duration::from_millis(1);

/// Interval at which main polls the `started` flag (1ms)
pub const STARTED_POLL_INTERVAL: Duration = Duration::from_millis(1);

// =============================================================================
// NAMING
// =============================================================================

/// Prefix for the primary instance mutex
pub const PRIMARY_MUTEX_PREFIX: &str = "build-relay";

/// Prefix for the final-liveness mutex
pub const FINAL_MUTEX_PREFIX: &str = "build-relay-final";

/// Prefix for the shared result segment (POSIX names start with '/')
pub const SHARED_SEGMENT_PREFIX: &str = "/build-relay-shm";

/// Extension of lock files backing named mutexes
pub const LOCK_FILE_EXTENSION: &str = "lock";

// =============================================================================
// SHARED RESULT LAYOUT
// =============================================================================

/// Byte offset of the `started` flag (u32, 0 or 1)
pub const STARTED_OFFSET: usize = 0;

/// Byte offset of the return code (i32)
pub const RETURN_CODE_OFFSET: usize = 4;

/// Total size of the shared result segment
pub const SHARED_RESULT_SIZE: usize = 8;

// =============================================================================
// COMMAND LINE
// =============================================================================

/// Flag selecting the main role
pub const FLAG_WRAPPER: &str = "--wrapper";

/// Internal flag selecting the intermediate role
pub const FLAG_WRAPPER_INTERMEDIATE: &str = "--wrapper-intermediate";

/// Internal flag selecting the final role
pub const FLAG_WRAPPER_FINAL: &str = "--wrapper-final";

/// Working directory flag, short and long form
pub const FLAG_WORKING_DIR_SHORT: &str = "-C";
pub const FLAG_WORKING_DIR_LONG: &str = "--working-dir";

/// Default build configuration file, relative to the working directory
pub const DEFAULT_CONFIG_FILE: &str = "relay.json";
