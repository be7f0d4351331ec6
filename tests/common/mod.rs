//! Shared test helpers for integration tests
//!
//! This module provides common utilities used across all test files.

#![allow(dead_code)]

use assert_cmd::cargo;
use assert_cmd::Command;
use tempfile::TempDir;

/// Helper to get a psvt command with a predictable environment
pub fn psvt() -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("psvt"));
    cmd.env_remove("PSVT_LOG")
        .env("PSVT_USER", "tester")
        .env("XDG_CONFIG_HOME", std::env::temp_dir().join("psvt-no-user-config"));
    cmd
}

/// Helper to run psvt inside a project as a given user
pub fn psvt_as(tmp: &TempDir, user: &str) -> Command {
    let mut cmd = psvt();
    cmd.current_dir(tmp.path()).env("PSVT_USER", user);
    cmd
}

/// Helper to create a test project in a temp directory
pub fn setup_test_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    psvt().current_dir(tmp.path()).arg("init").assert().success();
    tmp
}

/// Helper to create a project with one member per role
///
/// Usernames match the role names: admin, lead, approver, engineer, viewer.
pub fn setup_team_project() -> TempDir {
    let tmp = setup_test_project();
    psvt_as(&tmp, "admin")
        .args(["team", "init"])
        .assert()
        .success();
    for role in ["admin", "lead", "approver", "engineer", "viewer"] {
        psvt_as(&tmp, "admin")
            .args(["team", "add", "--name", role, "--username", role, "--role", role])
            .assert()
            .success();
    }
    tmp
}

/// Helper to create a record and return its ID
pub fn create_entity(tmp: &TempDir, kind: &str, title: &str, parent: Option<&str>) -> String {
    let mut cmd = psvt_as(tmp, "engineer");
    cmd.args(["--format", "id", "new", kind, "--title", title]);
    if let Some(parent) = parent {
        cmd.args(["--parent", parent]);
    }
    let output = cmd.output().unwrap();
    assert!(
        output.status.success(),
        "creating {} failed: {}",
        kind,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Helper to build customer → plant → unit → area → PSV and return the PSV ID
pub fn create_psv(tmp: &TempDir, tag: &str) -> String {
    let customer = create_entity(tmp, "customer", "Acme Refining", None);
    let plant = create_entity(tmp, "plant", "Bayport", Some(&customer));
    let unit = create_entity(tmp, "unit", "Crude Unit", Some(&plant));
    let area = create_entity(tmp, "area", "Atmospheric Column", Some(&unit));
    create_entity(tmp, "psv", tag, Some(&area))
}

/// Helper to get the ID of an entity's first revision
pub fn first_revision(tmp: &TempDir, entity_id: &str) -> String {
    let output = psvt_as(tmp, "viewer")
        .args(["--format", "id", "rev", "list", entity_id])
        .output()
        .unwrap();
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}
