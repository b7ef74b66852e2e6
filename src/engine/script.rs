/*!
 * Script Engine
 * Reference build engine driven by a JSON target file
 *
 * Every target optionally runs one command and depends on other targets.
 * Builds walk dependencies first, run each target at most once, and stop at
 * the first failing command.
 */

use super::cache::{cache_stats, trim_cache};
use super::types::{BuildConfig, EngineError, EngineResult};
use super::BuildEngine;
use crate::options::BuildOptions;
use crate::process::{ChildProcess, SpawnConfig};
use std::collections::{BTreeSet, HashSet};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Engine over a `relay.json` style configuration
#[derive(Debug)]
pub struct ScriptEngine {
    config_path: PathBuf,
    working_dir: PathBuf,
    config: Option<BuildConfig>,
}

impl ScriptEngine {
    pub fn new(config_path: impl Into<PathBuf>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            working_dir: working_dir.into(),
            config: None,
        }
    }

    pub fn from_options(options: &BuildOptions) -> Self {
        Self::new(&options.config_file, &options.working_dir)
    }

    pub fn config(&self) -> Option<&BuildConfig> {
        self.config.as_ref()
    }

    fn loaded(&self) -> EngineResult<&BuildConfig> {
        self.config.as_ref().ok_or(EngineError::NotInitialized)
    }

    fn cache_dir(&self) -> EngineResult<PathBuf> {
        let dir = self.loaded()?.cache_dir.as_ref().ok_or(EngineError::NoCache)?;
        Ok(self.working_dir.join(dir))
    }

    fn run_target(&self, name: &str, command: &[String]) -> EngineResult<()> {
        let Some((program, args)) = command.split_first() else {
            debug!(target_name = name, "group target, nothing to run");
            return Ok(());
        };

        info!(target_name = name, program = %program, "running target");
        let spawn = SpawnConfig::new(program)
            .with_args(args.iter().cloned())
            .with_working_dir(&self.working_dir)
            .with_forward_output(true);

        let failed = |reason: String| EngineError::TargetFailed {
            target: name.to_string(),
            reason,
        };

        let child = ChildProcess::spawn(&spawn).map_err(|e| failed(e.to_string()))?;
        match child.wait_for_exit() {
            Ok(0) => Ok(()),
            Ok(code) => Err(failed(format!("exit code {}", code))),
            Err(e) => Err(failed(e.to_string())),
        }
    }
}

impl BuildEngine for ScriptEngine {
    #[instrument(skip(self), fields(config = %self.config_path.display()))]
    fn initialize(&mut self) -> EngineResult<()> {
        let config = load_config(&self.config_path)?;
        validate(&config)?;
        debug!(targets = config.targets.len(), "build configuration loaded");
        self.config = Some(config);
        Ok(())
    }

    fn build(&mut self, targets: &[String]) -> EngineResult<()> {
        let order = build_order(self.loaded()?, targets)?;
        let config = self.loaded()?;
        for name in &order {
            let command = config
                .targets
                .get(name)
                .map(|t| t.command.as_slice())
                .unwrap_or_default();
            self.run_target(name, command)?;
        }
        info!(built = order.len(), "build finished");
        Ok(())
    }

    fn display_target_list(&self) {
        match self.loaded() {
            Ok(config) => print!("{}", render_target_list(config)),
            Err(e) => debug!(error = %e, "no targets to list"),
        }
    }

    fn display_dependency_info(&self, targets: &[String]) -> EngineResult<()> {
        let text = render_dependency_info(self.loaded()?, targets)?;
        print!("{}", text);
        Ok(())
    }

    fn cache_info(&self) -> EngineResult<()> {
        let dir = self.cache_dir()?;
        let stats = cache_stats(&dir)?;
        println!(
            "Cache {}: {} files, {:.2} MiB",
            dir.display(),
            stats.files,
            stats.mib()
        );
        Ok(())
    }

    fn cache_trim(&self, limit_mib: u64) -> EngineResult<()> {
        let dir = self.cache_dir()?;
        let limit = limit_mib.saturating_mul(1024 * 1024);
        let (removed, remaining) = trim_cache(&dir, limit)?;
        println!(
            "Cache {}: removed {} files ({:.2} MiB), {:.2} MiB left",
            dir.display(),
            removed.files,
            removed.mib(),
            remaining.mib()
        );
        Ok(())
    }
}

/// Read and parse a configuration file
pub fn load_config(path: &Path) -> EngineResult<BuildConfig> {
    let text = std::fs::read_to_string(path).map_err(|source| EngineError::Load {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|e| EngineError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Reject dangling references
pub fn validate(config: &BuildConfig) -> EngineResult<()> {
    for (name, entry) in &config.targets {
        if let Some(missing) = entry.depends.iter().find(|d| !config.targets.contains_key(*d)) {
            return Err(EngineError::UnknownDependency {
                target: name.clone(),
                dependency: missing.clone(),
            });
        }
    }
    if let Some(default) = &config.default_target {
        if !config.targets.contains_key(default) {
            return Err(EngineError::UnknownTarget(default.clone()));
        }
    }
    Ok(())
}

/// Targets to build when the command line names none
fn requested(config: &BuildConfig, targets: &[String]) -> Vec<String> {
    if !targets.is_empty() {
        return targets.to_vec();
    }
    match &config.default_target {
        Some(default) => vec![default.clone()],
        None => config.targets.keys().cloned().collect(),
    }
}

/// Dependency-first order, each target once
pub fn build_order(config: &BuildConfig, targets: &[String]) -> EngineResult<Vec<String>> {
    fn visit(
        config: &BuildConfig,
        name: &str,
        visiting: &mut HashSet<String>,
        done: &mut HashSet<String>,
        order: &mut Vec<String>,
    ) -> EngineResult<()> {
        if done.contains(name) {
            return Ok(());
        }
        if !visiting.insert(name.to_string()) {
            return Err(EngineError::Cycle(name.to_string()));
        }
        let entry = config
            .targets
            .get(name)
            .ok_or_else(|| EngineError::UnknownTarget(name.to_string()))?;
        for dep in &entry.depends {
            visit(config, dep, visiting, done, order)?;
        }
        visiting.remove(name);
        done.insert(name.to_string());
        order.push(name.to_string());
        Ok(())
    }

    let mut visiting = HashSet::new();
    let mut done = HashSet::new();
    let mut order = Vec::new();
    for name in requested(config, targets) {
        visit(config, &name, &mut visiting, &mut done, &mut order)?;
    }
    Ok(order)
}

pub fn render_target_list(config: &BuildConfig) -> String {
    let mut out = String::new();
    for (name, entry) in &config.targets {
        let marker = if config.default_target.as_deref() == Some(name.as_str()) {
            " (default)"
        } else {
            ""
        };
        let _ = write!(out, "{}{}", name, marker);
        if !entry.depends.is_empty() {
            let _ = write!(out, ": {}", entry.depends.join(", "));
        }
        out.push('\n');
    }
    out
}

/// Indented dependency tree; repeated subtrees are printed once
pub fn render_dependency_info(config: &BuildConfig, targets: &[String]) -> EngineResult<String> {
    fn walk(
        config: &BuildConfig,
        name: &str,
        depth: usize,
        path: &mut Vec<String>,
        shown: &mut BTreeSet<String>,
        out: &mut String,
    ) -> EngineResult<()> {
        if path.iter().any(|p| p == name) {
            return Err(EngineError::Cycle(name.to_string()));
        }
        let entry = config
            .targets
            .get(name)
            .ok_or_else(|| EngineError::UnknownTarget(name.to_string()))?;

        let indent = "  ".repeat(depth);
        if !shown.insert(name.to_string()) && !entry.depends.is_empty() {
            let _ = writeln!(out, "{}{} (*)", indent, name);
            return Ok(());
        }
        let _ = writeln!(out, "{}{}", indent, name);

        path.push(name.to_string());
        for dep in &entry.depends {
            walk(config, dep, depth + 1, path, shown, out)?;
        }
        path.pop();
        Ok(())
    }

    let mut out = String::new();
    let mut shown = BTreeSet::new();
    for name in requested(config, targets) {
        walk(config, &name, 0, &mut Vec::new(), &mut shown, &mut out)?;
    }
    Ok(out)
}
