/*!
 * Build Options
 * Command line parsing into an immutable options record
 *
 * The relay re-launches its own executable for the intermediate and final
 * roles, forwarding the user's arguments verbatim (minus any wrapper flag
 * and working directory), pinning the canonical working directory and
 * appending the flag of the next role.
 */

mod names;

pub use names::InstanceNames;

use crate::core::limits::{
    DEFAULT_CONFIG_FILE, FLAG_WORKING_DIR_LONG, FLAG_WORKING_DIR_SHORT, FLAG_WRAPPER,
    FLAG_WRAPPER_FINAL, FLAG_WRAPPER_INTERMEDIATE,
};
use crate::core::types::WrapperMode;
use clap::error::ErrorKind;
use clap::Parser;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Options result type
pub type OptionsResult<T> = Result<T, OptionsError>;

#[derive(Error, Debug)]
pub enum OptionsError {
    #[error("{0}")]
    Parse(String),

    #[error("Working directory {} is not usable: {source}", path.display())]
    WorkingDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot locate the running executable: {0}")]
    CurrentExe(#[source] std::io::Error),
}

#[derive(Parser, Debug)]
#[command(
    name = "build-relay",
    version,
    about = "Single-instance build launcher with a detached worker relay"
)]
struct Cli {
    /// Targets to build (default target when empty)
    targets: Vec<String>,

    /// Run the build in a detached worker process and relay its exit code
    #[arg(long = "wrapper")]
    wrapper: bool,

    #[arg(long = "wrapper-intermediate", hide = true)]
    wrapper_intermediate: bool,

    #[arg(long = "wrapper-final", hide = true)]
    wrapper_final: bool,

    /// Wait for a running build in the same directory instead of failing
    #[arg(long)]
    wait: bool,

    /// Build configuration file, relative to the working directory
    #[arg(long, value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Working directory (defaults to the current directory)
    #[arg(short = 'C', long = "working-dir", value_name = "DIR")]
    working_dir: Option<PathBuf>,

    /// List the targets in the configuration and exit
    #[arg(long = "show-targets", conflicts_with_all = ["show_deps", "cache_info", "cache_trim"])]
    show_targets: bool,

    /// Print the dependency tree of the requested targets
    #[arg(long = "show-deps", conflicts_with_all = ["cache_info", "cache_trim"])]
    show_deps: bool,

    /// Print cache usage
    #[arg(long = "cache-info", conflicts_with = "cache_trim")]
    cache_info: bool,

    /// Trim the cache down to the given size in MiB
    #[arg(long = "cache-trim", value_name = "MIB")]
    cache_trim: Option<u64>,
}

/// What the build engine is asked to do once initialized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildAction {
    #[default]
    Build,
    ShowTargets,
    ShowDependencies,
    CacheInfo,
    CacheTrim { limit_mib: u64 },
}

/// Immutable options for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Executable re-launched for the intermediate and final roles
    pub program: PathBuf,
    /// Arguments forwarded to child roles (wrapper and working directory
    /// flags removed)
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub wrapper_mode: WrapperMode,
    pub wait: bool,
    pub targets: Vec<String>,
    pub action: BuildAction,
    pub config_file: PathBuf,
    pub names: InstanceNames,
}

/// Result of parsing: either run, or stop successfully (help/version)
#[derive(Debug)]
pub enum ParseOutcome {
    Run(Box<BuildOptions>),
    Quit,
}

impl BuildOptions {
    /// Options for a plain in-process build of `working_dir`
    pub fn new(program: impl Into<PathBuf>, working_dir: impl Into<PathBuf>) -> Self {
        let working_dir = working_dir.into();
        Self {
            program: program.into(),
            args: Vec::new(),
            names: InstanceNames::for_working_dir(&working_dir),
            config_file: working_dir.join(DEFAULT_CONFIG_FILE),
            working_dir,
            wrapper_mode: WrapperMode::None,
            wait: false,
            targets: Vec::new(),
            action: BuildAction::Build,
        }
    }

    pub fn with_mode(mut self, mode: WrapperMode) -> Self {
        self.wrapper_mode = mode;
        self
    }

    pub fn with_wait(mut self, wait: bool) -> Self {
        self.wait = wait;
        self
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = forwarded_args(args.into_iter().map(Into::into));
        self
    }

    pub fn with_targets<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.targets = targets.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_action(mut self, action: BuildAction) -> Self {
        self.action = action;
        self
    }

    pub fn with_config_file(mut self, path: impl AsRef<Path>) -> Self {
        self.config_file = self.working_dir.join(path);
        self
    }

    pub fn with_names(mut self, names: InstanceNames) -> Self {
        self.names = names;
        self
    }

    /// Arguments for re-launching this invocation in `mode`
    ///
    /// The working directory is always passed in canonical form, so a
    /// relative `-C` given by the user is not resolved a second time inside
    /// the child's own working directory.
    pub fn child_args(&self, mode: WrapperMode) -> Vec<String> {
        let mut args = vec![
            FLAG_WORKING_DIR_SHORT.to_string(),
            self.working_dir.display().to_string(),
        ];
        args.extend(self.args.iter().cloned());
        match mode {
            WrapperMode::Intermediate => args.push(FLAG_WRAPPER_INTERMEDIATE.to_string()),
            WrapperMode::Final => args.push(FLAG_WRAPPER_FINAL.to_string()),
            WrapperMode::None | WrapperMode::Main => {}
        }
        args
    }
}

/// Parse a full argument vector (including the program name)
pub fn parse_args<I>(argv: I) -> OptionsResult<ParseOutcome>
where
    I: IntoIterator<Item = String>,
{
    let argv: Vec<String> = argv.into_iter().collect();

    let cli = match Cli::try_parse_from(&argv) {
        Ok(cli) => cli,
        Err(err) => {
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    let _ = err.print();
                    Ok(ParseOutcome::Quit)
                }
                _ => Err(OptionsError::Parse(err.render().to_string())),
            };
        }
    };

    let program = std::env::current_exe().map_err(OptionsError::CurrentExe)?;

    let requested = match cli.working_dir {
        Some(dir) => dir,
        None => std::env::current_dir().map_err(|source| OptionsError::WorkingDir {
            path: PathBuf::from("."),
            source,
        })?,
    };
    let working_dir = requested
        .canonicalize()
        .map_err(|source| OptionsError::WorkingDir {
            path: requested.clone(),
            source,
        })?;

    let wrapper_mode = if cli.wrapper_final {
        WrapperMode::Final
    } else if cli.wrapper_intermediate {
        WrapperMode::Intermediate
    } else if cli.wrapper {
        WrapperMode::Main
    } else {
        WrapperMode::None
    };

    let action = if cli.show_targets {
        BuildAction::ShowTargets
    } else if cli.show_deps {
        BuildAction::ShowDependencies
    } else if cli.cache_info {
        BuildAction::CacheInfo
    } else if let Some(limit_mib) = cli.cache_trim {
        BuildAction::CacheTrim { limit_mib }
    } else {
        BuildAction::Build
    };

    let options = BuildOptions::new(program, working_dir)
        .with_args(argv.into_iter().skip(1))
        .with_mode(wrapper_mode)
        .with_wait(cli.wait)
        .with_targets(cli.targets)
        .with_action(action)
        .with_config_file(&cli.config);

    Ok(ParseOutcome::Run(Box::new(options)))
}

/// Drop role flags and every spelling of the working directory option
///
/// Everything after `--` is positional and kept as is.
fn forwarded_args(args: impl Iterator<Item = String>) -> Vec<String> {
    let mut forwarded = Vec::new();
    let mut args = args.peekable();
    let mut positional = false;

    while let Some(arg) = args.next() {
        if positional {
            forwarded.push(arg);
            continue;
        }
        if arg == "--" {
            positional = true;
            forwarded.push(arg);
            continue;
        }
        if arg == FLAG_WRAPPER || arg == FLAG_WRAPPER_INTERMEDIATE || arg == FLAG_WRAPPER_FINAL {
            continue;
        }
        if arg == FLAG_WORKING_DIR_SHORT || arg == FLAG_WORKING_DIR_LONG {
            args.next();
            continue;
        }
        let attached = arg
            .strip_prefix(FLAG_WORKING_DIR_LONG)
            .map(|rest| rest.starts_with('='))
            .unwrap_or(false)
            || (arg.starts_with(FLAG_WORKING_DIR_SHORT) && arg.len() > FLAG_WORKING_DIR_SHORT.len());
        if attached {
            continue;
        }
        forwarded.push(arg);
    }
    forwarded
}
