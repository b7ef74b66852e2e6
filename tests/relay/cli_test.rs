/*!
 * End-to-End Tests
 * Drive the built binary through every role and check its exit status
 */

use build_relay::config::{ENV_INSTANCE_POLL_MS, ENV_LOCK_DIR, ENV_RELAY_EXE, ENV_TRACE_JSON};
use build_relay::{InstanceNames, NamedMutex, ReturnCode};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

const BIN: &str = env!("CARGO_BIN_EXE_build-relay");

const RELAY_JSON: &str = r#"{
    "default_target": "ok",
    "targets": {
        "ok": { "command": ["sh", "-c", "true"] },
        "fail": { "command": ["sh", "-c", "exit 1"] },
        "crash": { "command": ["sh", "-c", "kill -9 $PPID"] },
        "marker": { "command": ["sh", "-c", "touch built.marker"] }
    }
}"#;

struct Project {
    dir: TempDir,
    locks: TempDir,
    root: PathBuf,
}

impl Project {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("relay.json"), RELAY_JSON).unwrap();
        let root = dir.path().canonicalize().unwrap();
        Self {
            dir,
            locks: TempDir::new().unwrap(),
            root,
        }
    }

    fn without_config() -> Self {
        let project = Self::new();
        std::fs::remove_file(project.dir.path().join("relay.json")).unwrap();
        project
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = self.bare_command();
        cmd.arg("-C").arg(&self.root).args(args);
        cmd
    }

    /// Command without a working directory argument
    fn bare_command(&self) -> Command {
        let mut cmd = Command::new(BIN);
        cmd.env(ENV_LOCK_DIR, self.locks.path())
            .env(ENV_INSTANCE_POLL_MS, "20")
            .env_remove("RUST_LOG")
            .env_remove(ENV_RELAY_EXE)
            .stdin(Stdio::null());
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.command(args).output().unwrap()
    }

    fn primary_mutex(&self) -> NamedMutex {
        let names = InstanceNames::for_working_dir(&self.root);
        NamedMutex::new(&names.primary_mutex, self.locks.path()).unwrap()
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

fn status(output: &Output) -> Option<i32> {
    output.status.code()
}

fn expect(code: ReturnCode) -> Option<i32> {
    Some(code.exit_status())
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn wait_for(path: &Path) {
    for _ in 0..500 {
        if path.exists() {
            return;
        }
        thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn test_plain_build_succeeds_and_releases() {
    let project = Project::new();

    let output = project.run(&["marker"]);
    assert_eq!(status(&output), expect(ReturnCode::Ok));
    assert!(project.path("built.marker").exists());
    assert!(stdout(&output).contains("Time: "));

    let mut primary = project.primary_mutex();
    assert!(primary.try_lock().unwrap());
}

#[test]
fn test_plain_build_failure() {
    let project = Project::new();
    let output = project.run(&["fail"]);
    assert_eq!(status(&output), expect(ReturnCode::BuildFailed));
}

#[test]
fn test_missing_config() {
    let project = Project::without_config();
    let output = project.run(&[]);
    assert_eq!(status(&output), expect(ReturnCode::ErrorLoadingConfig));
}

#[test]
fn test_bad_arguments() {
    let project = Project::new();
    let output = project.run(&["--definitely-not-a-flag"]);
    assert_eq!(status(&output), expect(ReturnCode::BadArgs));
}

#[test]
fn test_help_exits_cleanly() {
    let project = Project::new();
    let output = project.run(&["--help"]);
    assert_eq!(status(&output), Some(0));
    assert!(stdout(&output).contains("--wrapper"));
    assert!(!stdout(&output).contains("--wrapper-final"));
}

#[test]
fn test_contention_fails_fast() {
    let project = Project::new();
    let mut holder = project.primary_mutex();
    assert!(holder.try_lock().unwrap());

    let output = project.run(&["marker"]);
    assert_eq!(status(&output), expect(ReturnCode::AlreadyRunning));
    assert!(stdout(&output).contains("already running"));
    assert!(!project.path("built.marker").exists());

    let output = project.run(&["--wrapper", "marker"]);
    assert_eq!(status(&output), expect(ReturnCode::AlreadyRunning));
}

#[test]
fn test_wait_then_proceed() {
    let project = Project::new();
    let mut holder = project.primary_mutex();
    assert!(holder.try_lock().unwrap());

    let mut child = project
        .command(&["--wait", "marker"])
        .stdout(Stdio::null())
        .spawn()
        .unwrap();

    thread::sleep(Duration::from_millis(200));
    assert!(child.try_wait().unwrap().is_none());
    assert!(!project.path("built.marker").exists());

    holder.unlock().unwrap();
    let exit = child.wait().unwrap();
    assert_eq!(exit.code(), expect(ReturnCode::Ok));
    assert!(project.path("built.marker").exists());
}

#[test]
fn test_wait_interrupted() {
    let project = Project::new();
    let mut holder = project.primary_mutex();
    assert!(holder.try_lock().unwrap());

    let mut child = project
        .command(&["--wait", "marker"])
        .stdout(Stdio::null())
        .spawn()
        .unwrap();

    thread::sleep(Duration::from_millis(300));
    kill(Pid::from_raw(child.id() as i32), Signal::SIGINT).unwrap();

    let exit = child.wait().unwrap();
    assert_eq!(exit.code(), expect(ReturnCode::BuildFailed));
    assert!(!project.path("built.marker").exists());
    assert!(holder.is_locked());
}

#[test]
fn test_wrapper_round_trip_success() {
    let project = Project::new();
    let output = project.run(&["--wrapper", "marker"]);
    assert_eq!(status(&output), expect(ReturnCode::Ok));
    wait_for(&project.path("built.marker"));
    assert!(project.path("built.marker").exists());

    let mut primary = project.primary_mutex();
    assert!(primary.try_lock().unwrap());
}

#[test]
fn test_wrapper_round_trip_failure() {
    let project = Project::new();
    let output = project.run(&["--wrapper", "fail"]);
    assert_eq!(status(&output), expect(ReturnCode::BuildFailed));
}

#[test]
fn test_wrapper_config_failure() {
    let project = Project::without_config();
    let output = project.run(&["--wrapper"]);
    assert_eq!(status(&output), expect(ReturnCode::ErrorLoadingConfig));
}

#[test]
fn test_wrapper_show_targets() {
    let project = Project::new();
    let output = project.run(&["--wrapper", "--show-targets"]);
    assert_eq!(status(&output), expect(ReturnCode::Ok));
    assert!(stdout(&output).contains("ok (default)"));
}

#[test]
fn test_wrapper_final_crash() {
    let project = Project::new();
    let output = project.run(&["--wrapper", "crash"]);
    assert_eq!(status(&output), expect(ReturnCode::WrapperCrashed));
}

#[test]
fn test_wrapper_relative_working_dir() {
    let project = Project::new();
    let parent = project.root.parent().unwrap();
    let relative = project.root.file_name().unwrap();

    let output = project
        .bare_command()
        .current_dir(parent)
        .arg("-C")
        .arg(relative)
        .arg("marker")
        .output()
        .unwrap();
    assert_eq!(status(&output), expect(ReturnCode::Ok));
    std::fs::remove_file(project.path("built.marker")).unwrap();

    let output = project
        .bare_command()
        .current_dir(parent)
        .arg("-C")
        .arg(relative)
        .args(["--wrapper", "marker"])
        .output()
        .unwrap();
    assert_eq!(status(&output), expect(ReturnCode::Ok), "{}", stderr(&output));
    wait_for(&project.path("built.marker"));
    assert!(project.path("built.marker").exists());
}

#[test]
fn test_wrapper_final_never_starts() {
    let project = Project::new();

    // The real intermediate role, unable to launch the final role
    let bin_dir = TempDir::new().unwrap();
    let intermediate = bin_dir.path().join("relay-intermediate");
    std::fs::write(
        &intermediate,
        format!("#!/bin/sh\n{ENV_RELAY_EXE}=/nonexistent/build-relay exec '{BIN}' \"$@\"\n"),
    )
    .unwrap();
    std::fs::set_permissions(&intermediate, std::fs::Permissions::from_mode(0o755)).unwrap();

    let output = project
        .command(&["--wrapper", "marker"])
        .env(ENV_RELAY_EXE, &intermediate)
        .env(ENV_TRACE_JSON, "1")
        .output()
        .unwrap();

    assert_eq!(status(&output), expect(ReturnCode::FailedToSpawnWrapperFinal));
    let log = stderr(&output);
    assert!(log.contains("\"started\":false"), "{log}");
    assert!(!log.contains("\"started\":true"), "{log}");
    assert!(!project.path("built.marker").exists());

    let mut primary = project.primary_mutex();
    assert!(primary.try_lock().unwrap());
}
