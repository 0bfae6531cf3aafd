//! End-to-end CLI tests exercising the compiled binary.

use assert_cmd::Command;
use predicates::prelude::*;

fn coinbrief() -> Command {
    Command::cargo_bin("coinbrief").expect("binary should build")
}

#[test]
fn test_help_describes_tool() {
    coinbrief()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("coinbrief"))
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("worker"))
        .stdout(predicate::str::contains("submit"));
}

#[test]
fn test_version_flag() {
    coinbrief()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_no_input_is_a_usage_error() {
    coinbrief()
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no URLs"));
}

#[test]
fn test_zero_workers_rejected() {
    coinbrief()
        .args(["-w", "0", "https://example.com/a"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_unknown_flag_rejected() {
    coinbrief()
        .arg("--definitely-not-a-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unexpected argument"));
}

#[test]
fn test_submit_enqueues_and_prints_batch_id() {
    let temp = tempfile::tempdir().expect("temp dir");
    let db_path = temp.path().join("broker.db");

    coinbrief()
        .args([
            "submit",
            "--db",
            db_path.to_str().expect("utf-8 path"),
            "https://example.com/a",
            "https://example.com/b",
        ])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("batch "));

    assert!(db_path.exists(), "broker database should be created");
}

#[test]
fn test_submit_without_urls_is_a_usage_error() {
    let temp = tempfile::tempdir().expect("temp dir");
    let db_path = temp.path().join("broker.db");

    coinbrief()
        .args(["submit", "--db", db_path.to_str().expect("utf-8 path")])
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no URLs"));
}
