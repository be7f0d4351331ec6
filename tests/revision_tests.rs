//! Revision ledger tests - codes, sign-off chain, revocation and deletion

mod common;

use common::{create_psv, first_revision, psvt, psvt_as, setup_team_project};
use predicates::prelude::*;

// ============================================================================
// Codes
// ============================================================================

#[test]
fn test_next_code_suggestions() {
    for (current, next) in [("O1", "O2"), ("A9", "B1"), ("N9", "P1"), ("Z9", "A1"), ("O9", "A1")] {
        psvt()
            .args(["rev", "next-code", current])
            .assert()
            .success()
            .stdout(predicate::str::diff(format!("{}\n", next)));
    }

    psvt()
        .args(["rev", "next-code"])
        .assert()
        .success()
        .stdout(predicate::str::diff("O1\n"));
}

#[test]
fn test_next_code_rejects_malformed_code() {
    for bad in ["A0", "AA", "1A", "A10"] {
        psvt()
            .args(["rev", "next-code", bad])
            .assert()
            .failure()
            .stderr(predicate::str::contains("psvt::revision::invalid_code"));
    }
}

// ============================================================================
// Creating revisions
// ============================================================================

#[test]
fn test_new_psv_starts_at_o1() {
    let tmp = setup_team_project();
    let psv = create_psv(&tmp, "PSV-101");

    psvt_as(&tmp, "viewer")
        .args(["rev", "current", &psv])
        .assert()
        .success()
        .stdout(predicate::str::contains("code: O1"));
}

#[test]
fn test_new_revision_suggests_next_code() {
    let tmp = setup_team_project();
    let psv = create_psv(&tmp, "PSV-101");

    psvt_as(&tmp, "engineer")
        .args(["rev", "new", &psv, "-d", "Rerated set pressure", "--current"])
        .assert()
        .success()
        .stdout(predicate::str::contains("O2"));

    psvt_as(&tmp, "viewer")
        .args(["rev", "current", &psv])
        .assert()
        .success()
        .stdout(predicate::str::contains("code: O2"))
        .stdout(predicate::str::contains("Rerated set pressure"));
}

#[test]
fn test_duplicate_code_is_rejected() {
    let tmp = setup_team_project();
    let psv = create_psv(&tmp, "PSV-101");

    psvt_as(&tmp, "engineer")
        .args(["rev", "new", &psv, "--code", "O1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_viewer_cannot_create_revision() {
    let tmp = setup_team_project();
    let psv = create_psv(&tmp, "PSV-101");

    psvt_as(&tmp, "viewer")
        .args(["rev", "new", &psv])
        .assert()
        .failure()
        .stderr(predicate::str::contains("psvt::permission"));
}

#[test]
fn test_hierarchy_nodes_have_no_revisions() {
    let tmp = setup_team_project();
    let customer = common::create_entity(&tmp, "customer", "Acme", None);

    psvt_as(&tmp, "engineer")
        .args(["rev", "new", &customer, "--code", "A1"])
        .assert()
        .failure();
}

#[test]
fn test_set_current_revision() {
    let tmp = setup_team_project();
    let psv = create_psv(&tmp, "PSV-101");
    let original = first_revision(&tmp, &psv);

    psvt_as(&tmp, "engineer")
        .args(["rev", "new", &psv, "--code", "A1", "--current"])
        .assert()
        .success();
    psvt_as(&tmp, "engineer")
        .args(["rev", "set-current", &original])
        .assert()
        .success()
        .stdout(predicate::str::contains("O1"));

    psvt_as(&tmp, "viewer")
        .args(["--format", "id", "rev", "current", &psv])
        .assert()
        .success()
        .stdout(predicate::str::diff(format!("{}\n", original)));
}

// ============================================================================
// Sign-off chain
// ============================================================================

#[test]
fn test_sign_off_in_order() {
    let tmp = setup_team_project();
    let psv = create_psv(&tmp, "PSV-101");
    let rev = first_revision(&tmp, &psv);

    psvt_as(&tmp, "engineer")
        .args(["rev", "sign", &rev, "originator"])
        .assert()
        .success();
    psvt_as(&tmp, "lead")
        .args(["rev", "sign", &rev, "checker"])
        .assert()
        .success();
    psvt_as(&tmp, "approver")
        .args(["rev", "sign", &rev, "approver"])
        .assert()
        .success();

    psvt_as(&tmp, "viewer")
        .args(["--format", "json", "rev", "list", &psv])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"originator\": \"engineer\""))
        .stdout(predicate::str::contains("\"checker\": \"lead\""))
        .stdout(predicate::str::contains("\"approver\": \"approver\""));
}

#[test]
fn test_sign_out_of_order_is_blocked() {
    let tmp = setup_team_project();
    let psv = create_psv(&tmp, "PSV-101");
    let rev = first_revision(&tmp, &psv);

    psvt_as(&tmp, "approver")
        .args(["rev", "sign", &rev, "approver"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("psvt::precondition"));

    psvt_as(&tmp, "lead")
        .args(["rev", "sign", &rev, "checker"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("originator"));
}

#[test]
fn test_signing_needs_slot_role() {
    let tmp = setup_team_project();
    let psv = create_psv(&tmp, "PSV-101");
    let rev = first_revision(&tmp, &psv);

    psvt_as(&tmp, "engineer")
        .args(["rev", "sign", &rev, "originator"])
        .assert()
        .success();
    psvt_as(&tmp, "engineer")
        .args(["rev", "sign", &rev, "checker"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("psvt::permission"));
}

#[test]
fn test_occupied_slot_cannot_be_resigned() {
    let tmp = setup_team_project();
    let psv = create_psv(&tmp, "PSV-101");
    let rev = first_revision(&tmp, &psv);

    psvt_as(&tmp, "engineer")
        .args(["rev", "sign", &rev, "originator"])
        .assert()
        .success();
    psvt_as(&tmp, "lead")
        .args(["rev", "sign", &rev, "originator"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("engineer"));
}

// ============================================================================
// Revocation and deletion
// ============================================================================

#[test]
fn test_revoke_own_or_with_override() {
    let tmp = setup_team_project();
    let psv = create_psv(&tmp, "PSV-101");
    let rev = first_revision(&tmp, &psv);

    psvt_as(&tmp, "engineer")
        .args(["rev", "sign", &rev, "originator"])
        .assert()
        .success();
    psvt_as(&tmp, "lead")
        .args(["rev", "sign", &rev, "checker"])
        .assert()
        .success();

    // Someone else's signature needs override rights
    psvt_as(&tmp, "engineer")
        .args(["rev", "revoke", &rev, "checker"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("psvt::permission"));

    // Revoking does not cascade to later slots
    psvt_as(&tmp, "engineer")
        .args(["rev", "revoke", &rev, "originator"])
        .assert()
        .success();
    psvt_as(&tmp, "viewer")
        .args(["--format", "json", "rev", "list", &psv])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"originator\": \"-\""))
        .stdout(predicate::str::contains("\"checker\": \"lead\""));

    psvt_as(&tmp, "lead")
        .args(["rev", "revoke", &rev, "originator"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not signed"));
}

#[test]
fn test_last_revision_cannot_be_deleted() {
    let tmp = setup_team_project();
    let psv = create_psv(&tmp, "PSV-101");
    let rev = first_revision(&tmp, &psv);

    for user in ["viewer", "engineer", "lead", "admin"] {
        psvt_as(&tmp, user)
            .args(["rev", "delete", &rev, "--yes"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("psvt::invariant"));
    }
}

#[test]
fn test_delete_revision_requires_override() {
    let tmp = setup_team_project();
    let psv = create_psv(&tmp, "PSV-101");

    let output = psvt_as(&tmp, "engineer")
        .args(["--format", "id", "rev", "new", &psv, "--current"])
        .output()
        .unwrap();
    let second = String::from_utf8_lossy(&output.stdout).trim().to_string();

    psvt_as(&tmp, "engineer")
        .args(["rev", "delete", &second, "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("psvt::permission"));

    psvt_as(&tmp, "lead")
        .args(["rev", "delete", &second, "--yes"])
        .assert()
        .success();

    // Current pointer falls back to the remaining revision
    psvt_as(&tmp, "viewer")
        .args(["rev", "current", &psv])
        .assert()
        .success()
        .stdout(predicate::str::contains("code: O1"));
}
