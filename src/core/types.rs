/*!
 * Core Types
 * Roles and outcome codes shared by every part of the relay
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which role the current process plays for one build invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WrapperMode {
    /// No wrapper: build in-process
    #[default]
    None,
    /// Owns the user-visible lifetime and the final exit code
    Main,
    /// Throwaway hop that re-parents the final process
    Intermediate,
    /// Performs the actual build and reports back through shared memory
    Final,
}

impl WrapperMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WrapperMode::None => "none",
            WrapperMode::Main => "main",
            WrapperMode::Intermediate => "intermediate",
            WrapperMode::Final => "final",
        }
    }

    /// Roles that compete for the primary instance mutex
    pub fn owns_instance(&self) -> bool {
        matches!(self, WrapperMode::None | WrapperMode::Main)
    }
}

impl fmt::Display for WrapperMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Process exit codes surfaced to the invoking shell
///
/// The discriminants are part of the external contract. On Unix the shell
/// only observes the low eight bits, see [`ReturnCode::exit_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum ReturnCode {
    Ok = 0,
    BuildFailed = -1,
    ErrorLoadingConfig = -2,
    BadArgs = -3,
    AlreadyRunning = -4,
    FailedToSpawnWrapper = -5,
    FailedToSpawnWrapperFinal = -6,
    WrapperCrashed = -7,
}

impl ReturnCode {
    pub const ALL: [ReturnCode; 8] = [
        ReturnCode::Ok,
        ReturnCode::BuildFailed,
        ReturnCode::ErrorLoadingConfig,
        ReturnCode::BadArgs,
        ReturnCode::AlreadyRunning,
        ReturnCode::FailedToSpawnWrapper,
        ReturnCode::FailedToSpawnWrapperFinal,
        ReturnCode::WrapperCrashed,
    ];

    /// Sentinel written by the main process before any child is spawned
    pub const CRASHED_SENTINEL: ReturnCode = ReturnCode::WrapperCrashed;

    #[inline]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Exit status as seen by a parent process (low eight bits)
    #[inline]
    pub const fn exit_status(self) -> i32 {
        (self as i32) & 0xff
    }

    /// Decode a raw code, accepting both the full value and the 8-bit
    /// exit status form produced by `waitpid`
    pub fn from_code(raw: i32) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|rc| rc.code() == raw)
            .or_else(|| {
                if (0..=0xff).contains(&raw) {
                    let widened = (raw as u8) as i8 as i32;
                    Self::ALL.into_iter().find(|rc| rc.code() == widened)
                } else {
                    None
                }
            })
    }

    #[inline]
    pub const fn is_success(self) -> bool {
        matches!(self, ReturnCode::Ok)
    }

    pub fn description(self) -> &'static str {
        match self {
            ReturnCode::Ok => "build succeeded",
            ReturnCode::BuildFailed => "build failed",
            ReturnCode::ErrorLoadingConfig => "build configuration failed to load",
            ReturnCode::BadArgs => "invalid command line arguments",
            ReturnCode::AlreadyRunning => "another instance is already running",
            ReturnCode::FailedToSpawnWrapper => "failed to spawn the intermediate process",
            ReturnCode::FailedToSpawnWrapperFinal => "final process failed to start",
            ReturnCode::WrapperCrashed => "final process crashed without reporting a result",
        }
    }
}

impl fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.code(), self.description())
    }
}

impl From<ReturnCode> for i32 {
    fn from(rc: ReturnCode) -> Self {
        rc.code()
    }
}
