//! Binary-level tests for the `route-sentinel` command.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;

fn fixture_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/vuln-app")
}

fn sentinel() -> Command {
    let mut cmd = Command::cargo_bin("route-sentinel").unwrap();
    cmd.env("RUST_LOG", "error").env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_list_shows_rules() {
    sentinel()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("R001"))
        .stdout(predicate::str::contains("Missing Role Check"))
        .stdout(predicate::str::contains("R006"))
        .stdout(predicate::str::contains("Reference: CWE-89"));
}

#[test]
fn test_version() {
    sentinel()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_scan_json_writes_reports() {
    let out = tempfile::tempdir().unwrap();

    let assert = sentinel()
        .arg("scan")
        .arg(fixture_root())
        .args(["--format", "json", "--output"])
        .arg(out.path())
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let findings = report["findings"].as_array().unwrap();
    assert!(findings.iter().any(|f| f["route"] == "/api/tasks"
        && f["method"] == "POST"
        && f["vulnerability"] == "Missing Authentication"
        && f["confirmed"] == false));
    assert_eq!(report["summary"]["totalRoutes"], 5);

    assert!(out.path().join("security-report.json").is_file());
    assert!(out.path().join("final-report.json").is_file());
    assert!(!out.path().join("fuzzing-report.json").exists());
}

#[test]
fn test_scan_markdown_with_severity_filter() {
    let out = tempfile::tempdir().unwrap();

    sentinel()
        .arg("scan")
        .arg(fixture_root())
        .args(["--format", "markdown", "--severity", "critical", "--output"])
        .arg(out.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("# Route-Sentinel Security Report"))
        .stdout(predicate::str::contains("No vulnerabilities found."));
}

#[test]
fn test_scan_terminal_output() {
    let out = tempfile::tempdir().unwrap();

    sentinel()
        .arg("scan")
        .arg(fixture_root())
        .arg("--output")
        .arg(out.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Missing Authentication"))
        .stdout(predicate::str::contains("/api/tasks/[id]"));
}

#[test]
fn test_scan_rejects_unknown_severity() {
    let out = tempfile::tempdir().unwrap();

    sentinel()
        .arg("scan")
        .arg(fixture_root())
        .args(["--severity", "urgent", "--output"])
        .arg(out.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid severity"));
}

#[test]
fn test_scan_missing_directory_fails() {
    sentinel()
        .args(["scan", "/definitely/not/a/project"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not a directory"));
}

#[test]
fn test_scan_bad_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("broken.json");
    std::fs::write(&config, "{ not json").unwrap();

    sentinel()
        .arg("scan")
        .arg(fixture_root())
        .arg("--config")
        .arg(&config)
        .arg("--output")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load security config"));
}
