//! Integration tests for the sqlstep CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get the sqlstep binary, isolated from the caller's environment
#[allow(deprecated)]
fn sqlstep_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("sqlstep").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("DATABASE_URL")
        .env_remove("SQLSTEP_CONFIG")
        .env_remove("SQLSTEP_MIGRATIONS_DIR")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_command() {
    let dir = TempDir::new().unwrap();
    sqlstep_cmd(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("tamper-checked SQL migrations"))
        .stdout(predicate::str::contains("migrate"))
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("--database-url"));
}

#[test]
fn test_version_command() {
    let dir = TempDir::new().unwrap();
    sqlstep_cmd(&dir)
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("Version"))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_version_ignores_broken_config() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("sqlstep.toml"), "this is not toml [").unwrap();

    sqlstep_cmd(&dir).arg("version").assert().success();
}

#[test]
fn test_migrate_help() {
    let dir = TempDir::new().unwrap();
    sqlstep_cmd(&dir)
        .args(["migrate", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Apply every pending migration script"))
        .stdout(predicate::str::contains("--migrations-dir"));
}

#[test]
fn test_migrate_without_database_url() {
    let dir = TempDir::new().unwrap();
    sqlstep_cmd(&dir)
        .arg("migrate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Database URL not found"));
}

#[test]
fn test_invalid_config_file() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("sqlstep.toml"), "[database\nurl = ").unwrap();

    sqlstep_cmd(&dir)
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn test_missing_explicit_config() {
    let dir = TempDir::new().unwrap();
    sqlstep_cmd(&dir)
        .args(["plan", "--config", "missing.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.toml"));
}

#[test]
fn test_invalid_log_level() {
    let dir = TempDir::new().unwrap();
    sqlstep_cmd(&dir)
        .args(["status", "--log-level", "verbose"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid log level 'verbose'"));
}

#[test]
fn test_invalid_log_format() {
    let dir = TempDir::new().unwrap();
    sqlstep_cmd(&dir)
        .args(["status", "--log-format", "xml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value 'xml'"));
}

#[test]
fn test_unsupported_url_scheme() {
    let dir = TempDir::new().unwrap();
    sqlstep_cmd(&dir)
        .args(["status", "--database-url", "mysql://localhost/app"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn test_unreachable_database() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("migrations")).unwrap();
    fs::write(
        dir.path().join("migrations").join("1_init.sql"),
        "CREATE TABLE t (id INT);",
    )
    .unwrap();

    sqlstep_cmd(&dir)
        .args([
            "migrate",
            "--database-url",
            "postgresql://sqlstep@127.0.0.1:1/none",
            "--log-level",
            "off",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Database error"))
        .stderr(predicate::str::contains("help:"));
}

#[test]
fn test_database_url_from_config() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("sqlstep.toml"),
        "[database]\nurl = \"postgresql://sqlstep@127.0.0.1:1/none\"\n",
    )
    .unwrap();

    // The URL is picked up, so the failure is the connection, not a missing URL.
    sqlstep_cmd(&dir)
        .args(["status", "--log-level", "off"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Database error"))
        .stderr(predicate::str::contains("Database URL not found").not());
}
