//! Smoke tests for the e2e-kit binary
//!
//! These never reach a real `cargo test` run; the subprocess path is
//! exercised with a missing cargo binary.

#![allow(deprecated)] // Allow deprecated Command::cargo_bin until assert_cmd is updated
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn e2e_kit() -> Command {
    Command::cargo_bin("e2e-kit").expect("e2e-kit binary should exist")
}

// ============================================================================
// Help and version
// ============================================================================

#[test]
fn test_version_flag() {
    e2e_kit()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.3.0"));
}

#[test]
fn test_help_flag() {
    e2e_kit()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--useLocalBrowser"))
        .stdout(predicate::str::contains("--slowmo"))
        .stdout(predicate::str::contains("EXAMPLES"));
}

#[test]
fn test_help_does_not_scaffold() {
    let temp = TempDir::new().unwrap();
    e2e_kit()
        .current_dir(temp.path())
        .arg("-h")
        .assert()
        .success();
    assert!(!temp.path().join("tests").exists());
}

// ============================================================================
// Init
// ============================================================================

#[test]
fn test_init_scaffolds_project() {
    let temp = TempDir::new().unwrap();
    e2e_kit()
        .current_dir(temp.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created: tests/example_login_success_e2e.rs"))
        .stdout(predicate::str::contains("Next steps"));

    assert!(temp.path().join("e2e.config.yaml").is_file());
    assert!(temp.path().join("tests/databuilders/mod.rs").is_file());
    assert!(temp.path().join("tests/example_form_validation_e2e.rs").is_file());
}

#[test]
fn test_init_twice_keeps_files() {
    let temp = TempDir::new().unwrap();
    e2e_kit().current_dir(temp.path()).arg("init").assert().success();

    let config = temp.path().join("e2e.config.yaml");
    fs::write(&config, "tests_dir: tests\n").unwrap();

    e2e_kit()
        .current_dir(temp.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Skipped (exists)"));
    assert_eq!(fs::read_to_string(&config).unwrap(), "tests_dir: tests\n");
}

// ============================================================================
// Run
// ============================================================================

#[test]
fn test_spawn_failure_exits_one() {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("tests")).unwrap();

    e2e_kit()
        .current_dir(temp.path())
        .env("CARGO", temp.path().join("no-such-cargo"))
        .arg("login-success")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Running test: login-success"))
        .stderr(predicate::str::contains("Error running cargo test"));
}

#[test]
fn test_auto_init_before_run() {
    let temp = TempDir::new().unwrap();

    e2e_kit()
        .current_dir(temp.path())
        .env("CARGO", temp.path().join("no-such-cargo"))
        .assert()
        .code(1)
        .stdout(predicate::str::contains("No e2e-kit configuration detected"))
        .stdout(predicate::str::contains("Running test: all tests"));
    assert!(temp.path().join("tests/example_login_invalid_e2e.rs").is_file());
}
