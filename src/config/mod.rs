/*!
 * Relay Configuration
 *
 * Runtime configuration read from the environment. Child roles inherit the
 * environment of the main process, so every role of one invocation sees the
 * same values.
 *
 * Environment variables:
 * - RELAY_TRACE_JSON: JSON log lines (default: false)
 * - RELAY_INSTANCE_POLL_MS: instance-wait interval (default: 1000)
 * - RELAY_LIVENESS_POLL_MS: final-liveness and started interval (default: 1)
 * - RELAY_START_TIMEOUT_MS: bound on main's wait for `started` (default: none)
 * - RELAY_LOCK_DIR: directory holding mutex lock files (default: temp dir)
 * - RELAY_EXE: executable launched for the intermediate and final roles
 *   (default: the running executable)
 */

use crate::core::limits::{
    FINAL_LIVENESS_INTERVAL, INSTANCE_WAIT_INTERVAL, STARTED_POLL_INTERVAL,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

pub const ENV_TRACE_JSON: &str = "RELAY_TRACE_JSON";
pub const ENV_INSTANCE_POLL_MS: &str = "RELAY_INSTANCE_POLL_MS";
pub const ENV_LIVENESS_POLL_MS: &str = "RELAY_LIVENESS_POLL_MS";
pub const ENV_START_TIMEOUT_MS: &str = "RELAY_START_TIMEOUT_MS";
pub const ENV_LOCK_DIR: &str = "RELAY_LOCK_DIR";
pub const ENV_RELAY_EXE: &str = "RELAY_EXE";

/// Poll intervals for every wait in the protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollIntervals {
    /// Between attempts on the primary instance mutex in `--wait` mode
    pub instance_wait: Duration,
    /// Between attempts on the final-liveness mutex (final and main)
    pub final_liveness: Duration,
    /// Between reads of the `started` flag in main
    pub started: Duration,
    /// Give up on `started` after this long; `None` waits forever
    pub start_timeout: Option<Duration>,
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            instance_wait: INSTANCE_WAIT_INTERVAL,
            final_liveness: FINAL_LIVENESS_INTERVAL,
            started: STARTED_POLL_INTERVAL,
            start_timeout: None,
        }
    }
}

impl PollIntervals {
    /// Short intervals for tests
    pub const fn fast() -> Self {
        Self {
            instance_wait: Duration::from_millis(10),
            final_liveness: Duration::from_millis(1),
            started: Duration::from_millis(1),
            start_timeout: None,
        }
    }
}

/// Relay configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub poll: PollIntervals,
    pub lock_dir: PathBuf,
    pub trace_json: bool,
    /// Replaces the running executable when launching child roles
    pub relay_exe: Option<PathBuf>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            poll: PollIntervals::default(),
            lock_dir: std::env::temp_dir(),
            trace_json: false,
            relay_exe: None,
        }
    }
}

impl RelayConfig {
    /// Build configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    ///
    /// Unparseable values are logged and replaced by the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let trace_json = lookup(ENV_TRACE_JSON)
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(defaults.trace_json);

        let millis = |key: &str, fallback: Duration| -> Duration {
            parse_millis(key, lookup(key)).unwrap_or(fallback)
        };

        let poll = PollIntervals {
            instance_wait: millis(ENV_INSTANCE_POLL_MS, defaults.poll.instance_wait),
            final_liveness: millis(ENV_LIVENESS_POLL_MS, defaults.poll.final_liveness),
            started: millis(ENV_LIVENESS_POLL_MS, defaults.poll.started),
            start_timeout: parse_millis(ENV_START_TIMEOUT_MS, lookup(ENV_START_TIMEOUT_MS)),
        };

        let lock_dir = lookup(ENV_LOCK_DIR)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.lock_dir);

        let relay_exe = lookup(ENV_RELAY_EXE)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        Self {
            poll,
            lock_dir,
            trace_json,
            relay_exe,
        }
    }

    pub fn with_poll(mut self, poll: PollIntervals) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_lock_dir(mut self, lock_dir: impl Into<PathBuf>) -> Self {
        self.lock_dir = lock_dir.into();
        self
    }

    pub fn with_relay_exe(mut self, exe: impl Into<PathBuf>) -> Self {
        self.relay_exe = Some(exe.into());
        self
    }
}

fn parse_millis(key: &str, value: Option<String>) -> Option<Duration> {
    let raw = value?;
    match raw.trim().parse::<u64>() {
        Ok(ms) => Some(Duration::from_millis(ms)),
        Err(e) => {
            warn!(variable = key, value = %raw, error = %e, "ignoring invalid duration");
            None
        }
    }
}
