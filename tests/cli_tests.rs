//! Command line tests for the `shadow` binary

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn shadow(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("shadow").unwrap();
    cmd.env("SHADOW_TRAIL_DIR", dir.path())
        .env_remove("SHADOW_LOG");
    cmd
}

/// Initialize the sample schema, one user and one invoice edited by that user
fn seeded() -> TempDir {
    let dir = TempDir::new().unwrap();

    shadow(&dir)
        .args(["init", "--sample"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized shadow-trail"))
        .stdout(predicate::str::contains(
            "Created invoice_attribute_shadows and invoice_association_shadows",
        ));

    shadow(&dir)
        .args(["record", "save", "User", "name=Ada"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved User #1"));

    shadow(&dir)
        .args([
            "record", "save", "Invoice", "amount=100", "status=open", "--attach", "editor=User#1",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved Invoice #1 (version 1)"))
        .stdout(predicate::str::contains("Shadowed").not());

    dir
}

#[test]
fn test_no_command_prints_hint() {
    let dir = TempDir::new().unwrap();
    shadow(&dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("shadow init --sample"));
}

#[test]
fn test_init_twice_keeps_settings() {
    let dir = seeded();
    shadow(&dir)
        .args(["init", "--sample"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Settings already exist"));
}

#[test]
fn test_update_writes_attribute_shadow() {
    let dir = seeded();

    shadow(&dir)
        .args([
            "record", "save", "Invoice", "--id", "1", "amount=150", "--attach", "editor=User#1",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved Invoice #1 (version 2)"))
        .stdout(predicate::str::contains("Changes: amount: 100 -> 150"))
        .stdout(predicate::str::contains("Shadowed: shadow#1 (amount)"));

    shadow(&dir)
        .args(["log", "attributes", "Invoice"])
        .assert()
        .success()
        .stdout(predicate::str::contains("amount"))
        .stdout(predicate::str::contains("editor_id"));
}

#[test]
fn test_unchanged_update_writes_nothing() {
    let dir = seeded();

    shadow(&dir)
        .args([
            "record", "save", "Invoice", "--id", "1", "amount=100", "--attach", "editor=User#1",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Shadowed").not());

    shadow(&dir)
        .args(["log", "attributes", "Invoice"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No rows in invoice_attribute_shadows."));
}

#[test]
fn test_missing_editor_fails() {
    let dir = seeded();

    shadow(&dir)
        .args(["record", "save", "Invoice", "--id", "1", "amount=150"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Expected attached editor on Invoice."));

    shadow(&dir)
        .args(["log", "attributes", "Invoice"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No rows"));
}

#[test]
fn test_tables_show() {
    let dir = seeded();

    shadow(&dir)
        .args(["tables", "show", "Invoice"])
        .assert()
        .success()
        .stdout(predicate::str::contains("invoice_attribute_shadows: 0 rows"))
        .stdout(predicate::str::contains("invoice_association_shadows: 0 rows"));
}

#[test]
fn test_untracked_type_is_rejected() {
    let dir = seeded();

    shadow(&dir)
        .args(["log", "attributes", "User"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("User is not shadowed"));
}

#[test]
fn test_dropped_tables_block_saves() {
    let dir = seeded();

    shadow(&dir)
        .args(["tables", "drop", "Invoice"])
        .assert()
        .success();

    shadow(&dir)
        .args([
            "record", "save", "Invoice", "--id", "1", "amount=150", "--attach", "editor=User#1",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("shadow tables create Invoice"));
}

#[test]
fn test_link_and_unlink_write_association_shadows() {
    let dir = seeded();

    shadow(&dir)
        .args(["record", "save", "LineItem", "sku=A", "--attach", "editor=User#1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved LineItem #1"));

    shadow(&dir)
        .args([
            "record", "link", "Invoice", "1", "line_items", "1", "--attach", "editor=User#1",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Linked LineItem #1 to Invoice.line_items"))
        .stdout(predicate::str::contains("Shadowed: shadow#1 (added #1)"));

    shadow(&dir)
        .args([
            "record", "unlink", "Invoice", "1", "line_items", "1", "--attach", "editor=User#1",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Shadowed: shadow#2 (removed #1)"));

    shadow(&dir)
        .args(["log", "associations", "Invoice", "--limit", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("removed"))
        .stdout(predicate::str::contains("added").not());
}

#[test]
fn test_link_requires_editor_on_related_record() {
    let dir = seeded();

    shadow(&dir)
        .args(["record", "save", "LineItem", "sku=A"])
        .assert()
        .success();

    shadow(&dir)
        .args(["record", "link", "Invoice", "1", "line_items", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Expected attached editor on LineItem."));
}
