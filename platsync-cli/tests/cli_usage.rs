//! Usage failures that must surface before any network call.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

fn platsync_cmd(home: &Path, cwd: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("platsync"));
    cmd.env("HOME", home)
        .env("USERPROFILE", home)
        .env_remove("PLATSYNC_PROJECT")
        .env_remove("PLATSYNC_APPLICATION_NAME")
        .env("PLATSYNC_API_URL", "http://127.0.0.1:9")
        .current_dir(cwd);
    cmd
}

#[test]
fn help_lists_commands() {
    let home = TempDir::new().expect("home");
    platsync_cmd(home.path(), home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("branch"))
        .stdout(contains("checkout"))
        .stdout(contains("deploy"));
}

#[test]
fn branch_without_project_fails() {
    let home = TempDir::new().expect("home");
    platsync_cmd(home.path(), home.path())
        .args(["branch", "sprint-2", "develop"])
        .assert()
        .code(1)
        .stderr(contains("no project specified"))
        .stderr(contains("PLATSYNC_PROJECT"));
}

#[test]
fn branch_rejects_parent_argument_and_option_together() {
    let home = TempDir::new().expect("home");
    platsync_cmd(home.path(), home.path())
        .args(["branch", "sprint-2", "develop", "--environment", "master", "--project", "abc123"])
        .assert()
        .code(1)
        .stderr(contains("cannot use both"));
}

#[test]
fn branch_outside_a_project_needs_a_parent() {
    let home = TempDir::new().expect("home");
    platsync_cmd(home.path(), home.path())
        .args(["branch", "sprint-2"])
        .env("PLATSYNC_PROJECT", "abc123")
        .assert()
        .code(1)
        .stderr(contains("could not determine the parent environment"));
}

#[test]
fn checkout_requires_an_environment() {
    let home = TempDir::new().expect("home");
    platsync_cmd(home.path(), home.path())
        .args(["checkout", "--project", "abc123"])
        .assert()
        .code(1)
        .stderr(contains("must specify the environment"));
}

#[test]
fn checkout_outside_a_project_root_fails() {
    let home = TempDir::new().expect("home");
    platsync_cmd(home.path(), home.path())
        .args(["checkout", "sprint-2", "--project", "abc123"])
        .assert()
        .code(1)
        .stderr(contains("inside a local project root"));
}

#[test]
fn malformed_config_is_reported() {
    let home = TempDir::new().expect("home");
    let dir = home.path().join(".platsync");
    fs::create_dir_all(&dir).expect("mkdir .platsync");
    fs::write(dir.join("config.yaml"), "api_url: [unclosed\n").expect("write config");

    platsync_cmd(home.path(), home.path())
        .args(["deploy", "--project", "abc123"])
        .assert()
        .code(1)
        .stderr(contains("failed to load"));
}
