//! Integration tests for the rangelog binary.
//!
//! These tests run the compiled binary against real git repositories and
//! check exit status and output.

use std::path::Path;
use std::process::Command as StdCommand;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn run_git(dir: &Path, args: &[&str]) {
    let output = StdCommand::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run git");
    assert!(output.status.success(), "git {:?} failed", args);
}

fn head(dir: &Path) -> String {
    let output = StdCommand::new("git")
        .args(["rev-parse", "HEAD"])
        .current_dir(dir)
        .output()
        .expect("git rev-parse failed");
    String::from_utf8(output.stdout).unwrap().trim().to_string()
}

/// Repository where `f.txt` line 2 was rewritten by the second commit.
/// Returns the temp dir and the id of that commit.
fn repo() -> (TempDir, String) {
    let dir = TempDir::new().unwrap();
    run_git(dir.path(), &["init"]);
    run_git(dir.path(), &["config", "user.email", "test@example.com"]);
    run_git(dir.path(), &["config", "user.name", "Test User"]);
    run_git(dir.path(), &["config", "commit.gpgsign", "false"]);

    std::fs::write(dir.path().join("f.txt"), "a\nb\nc\n").unwrap();
    run_git(dir.path(), &["add", "f.txt"]);
    run_git(dir.path(), &["commit", "-m", "Add f"]);

    std::fs::write(dir.path().join("f.txt"), "a\nB\nc\n").unwrap();
    run_git(dir.path(), &["commit", "-am", "Shout b"]);
    let id = head(dir.path());

    (dir, id)
}

/// The binary with user configuration isolated to `home`.
fn rangelog(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("rangelog").unwrap();
    cmd.env("HOME", home)
        .env_remove("XDG_CONFIG_HOME")
        .env_remove("RANGELOG_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_lists_commands() {
    let home = TempDir::new().unwrap();
    rangelog(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("track"))
        .stdout(predicate::str::contains("verify"));
}

#[test]
fn rejects_inverted_range() {
    let (dir, _) = repo();
    rangelog(dir.path())
        .args(["--cwd", dir.path().to_str().unwrap(), "track", "f.txt", "3", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid line range"));
}

#[test]
fn missing_file_fails() {
    let (dir, _) = repo();
    rangelog(dir.path())
        .args(["--cwd", dir.path().to_str().unwrap(), "log", "nope.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no such file"));
}

#[test]
fn track_reports_changing_revision() {
    let (dir, id) = repo();
    rangelog(dir.path())
        .args(["--cwd", dir.path().to_str().unwrap(), "-q", "track", "f.txt", "2", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains(id.as_str()));
}

#[test]
fn track_json_output() {
    let (dir, id) = repo();
    let output = rangelog(dir.path())
        .args(["--cwd", dir.path().to_str().unwrap(), "--json", "track", "f.txt", "2", "2"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["changes"][0]["revision"], id.as_str());
    assert_eq!(report["changes"][0]["author"], "Test User");
    assert_eq!(report["complete"], true);
}

#[test]
fn unchanged_range_reports_nothing() {
    let (dir, _) = repo();
    rangelog(dir.path())
        .args(["--cwd", dir.path().to_str().unwrap(), "track", "f.txt", "3", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No revisions changed lines 3-3"));
}

#[test]
fn log_lists_revisions() {
    let (dir, id) = repo();
    let output = rangelog(dir.path())
        .args(["--cwd", dir.path().to_str().unwrap(), "--json", "log", "f.txt"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let revisions: Vec<String> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(revisions.len(), 2);
    assert_eq!(revisions[0], id);
}

#[test]
fn show_prints_metadata() {
    let (dir, id) = repo();
    rangelog(dir.path())
        .args(["--cwd", dir.path().to_str().unwrap(), "show", "f.txt", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Author: Test User"))
        .stdout(predicate::str::contains("Shout b"));
}

#[test]
fn diff_prints_patch() {
    let (dir, id) = repo();
    rangelog(dir.path())
        .args(["--cwd", dir.path().to_str().unwrap(), "diff", "f.txt", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("+B"));
}

#[test]
fn invalid_repo_config_fails() {
    let (dir, _) = repo();
    std::fs::write(dir.path().join(".rangelog.toml"), "window_size = 0\n").unwrap();
    rangelog(dir.path())
        .args(["--cwd", dir.path().to_str().unwrap(), "log", "f.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration"));
}
