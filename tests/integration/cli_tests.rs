//! Integration tests for the CLI binary.
//!
//! Verifies that the `dart` binary responds to basic flags and that a
//! policy built through the CLI can be searched and proven.
//!
//! This test is registered as a [[test]] in the dart-rt-cli crate
//! so that CARGO_BIN_EXE_dart is available.

use std::path::Path;
use std::process::{Command, Output};

/// Get a Command pointing to the `dart` binary.
fn dart_binary() -> Command {
    Command::new(env!("CARGO_BIN_EXE_dart"))
}

/// Run `dart --ledger <ledger> <args...>`.
fn dart(ledger: &Path, args: &[&str]) -> Output {
    dart_binary()
        .arg("--ledger")
        .arg(ledger)
        .args(args)
        .output()
        .expect("failed to execute dart")
}

fn assert_ok(output: &Output) -> String {
    assert!(
        output.status.success(),
        "dart should exit with success, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn cli_responds_to_help() {
    let output = dart_binary()
        .arg("--help")
        .output()
        .expect("failed to execute dart --help");

    let stdout = assert_ok(&output);
    assert!(
        stdout.contains("dart") || stdout.contains("DART-RT") || stdout.contains("Usage"),
        "dart --help output should contain usage information, got: {stdout}"
    );
}

#[test]
fn cli_responds_to_version() {
    let output = dart_binary()
        .arg("--version")
        .output()
        .expect("failed to execute dart --version");

    let stdout = assert_ok(&output);
    assert!(
        stdout.contains("0.1") || stdout.contains("dart"),
        "dart --version should contain version info, got: {stdout}"
    );
}

#[test]
fn cli_exits_with_error_on_unknown_flag() {
    let output = dart_binary()
        .arg("--nonexistent-flag")
        .output()
        .expect("failed to execute dart");

    assert!(
        !output.status.success(),
        "dart with unknown flag should exit with error"
    );
}

#[test]
fn cli_issue_requires_declared_role() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ledger = dir.path().join("ledger.json");

    let output = dart(&ledger, &["issue", "eorg", "member", "alice"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error:"), "stderr: {stderr}");
}

#[test]
fn cli_builds_searches_and_proves_a_policy() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ledger = dir.path().join("ledger.json");

    assert_ok(&dart(&ledger, &["role", "declare", "eorg", "member"]));
    assert_ok(&dart(&ledger, &["role", "declare", "lib", "reader"]));
    assert_ok(&dart(&ledger, &["issue", "eorg", "member", "alice"]));
    assert_ok(&dart(&ledger, &["issue", "eorg", "member", "bob", "--weight", "40"]));
    assert_ok(&dart(&ledger, &["issue", "lib", "reader", "eorg.member"]));
    assert!(ledger.exists());

    let roles = assert_ok(&dart(&ledger, &["role", "list"]));
    assert!(roles.contains("Roles (2)"), "got: {roles}");

    let credentials = assert_ok(&dart(&ledger, &["credentials", "--role", "eorg.member"]));
    assert!(credentials.contains("Credentials (2)"), "got: {credentials}");

    let found = assert_ok(&dart(&ledger, &["search", "lib.reader"]));
    assert!(found.contains("alice"), "got: {found}");
    assert!(found.contains("bob"), "got: {found}");

    let strong = assert_ok(&dart(&ledger, &["search", "lib.reader", "--min-weight", "50"]));
    assert!(strong.contains("alice"), "got: {strong}");
    assert!(!strong.contains("bob"), "got: {strong}");

    let json = assert_ok(&dart(&ledger, &["search", "lib.reader", "--json"]));
    let parsed: serde_json::Value = serde_json::from_str(&json).expect("valid JSON");
    assert_eq!(parsed.as_array().map(Vec::len), Some(2));

    let proven = assert_ok(&dart(&ledger, &["prove", "lib.reader"]));
    assert_eq!(proven.matches("Verified:").count(), 2, "got: {proven}");
}

#[test]
fn cli_scenario_proves_every_eligible() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ledger = dir.path().join("unused.json");

    let stdout = assert_ok(&dart(&ledger, &["scenario", "3", "1"]));
    assert!(stdout.contains("Solutions:    3"), "got: {stdout}");
    assert!(!stdout.contains("FAILED"), "got: {stdout}");
    assert!(!ledger.exists());
}

#[test]
fn cli_credentials_rejects_undeclared_role_filter() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ledger = dir.path().join("ledger.json");

    assert_ok(&dart(&ledger, &["role", "declare", "eorg", "member"]));
    let output = dart(&ledger, &["credentials", "--role", "eorg.student"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("has not been declared"), "stderr: {stderr}");
}

#[test]
fn cli_flat_proof_verifies_until_revoked() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ledger = dir.path().join("ledger.json");

    assert_ok(&dart(&ledger, &["role", "declare", "eorg", "member"]));
    assert_ok(&dart(&ledger, &["role", "declare", "lib", "reader"]));
    assert_ok(&dart(&ledger, &["issue", "eorg", "member", "alice"]));
    assert_ok(&dart(&ledger, &["issue", "lib", "reader", "eorg.member"]));

    let json = assert_ok(&dart(&ledger, &["prove", "lib.reader", "--json"]));
    let parsed: serde_json::Value = serde_json::from_str(&json).expect("valid JSON");
    let entry = &parsed[0];
    assert_eq!(entry["member"], "alice");
    let ids: Vec<String> = entry["proof"]
        .as_array()
        .expect("flat proof list")
        .iter()
        .map(|id| id.as_str().expect("string id").to_string())
        .collect();
    assert_eq!(ids.len(), 4);
    let stack = entry["req_stack_size"].to_string();

    let mut args = vec!["verify", "--stack", stack.as_str()];
    args.extend(ids.iter().map(String::as_str));
    let verified = assert_ok(&dart(&ledger, &args));
    assert!(verified.contains("Verified: alice"), "got: {verified}");

    let odd = dart(&ledger, &["verify", "--stack", "1", ids[0].as_str()]);
    assert!(!odd.status.success());

    // A later weight-0 credential revokes alice.
    assert_ok(&dart(&ledger, &["issue", "eorg", "member", "alice", "--weight", "0"]));
    let revoked = dart(&ledger, &args);
    assert!(!revoked.status.success());
    let found = assert_ok(&dart(&ledger, &["search", "lib.reader"]));
    assert!(!found.contains("alice"), "got: {found}");
}
