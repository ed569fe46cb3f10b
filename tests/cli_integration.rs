//! Integration tests for the hbctl CLI.
//!
//! These tests exercise the binary end-to-end using `assert_cmd`. Nothing
//! here talks to Docker, MongoDB, or the issuer; start paths are only
//! exercised up to the point where they fail validation.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

/// Helper: a Command pointing at the hbctl binary with an isolated home.
fn hbctl(home: &TempDir) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("hbctl").expect("binary should exist");
    cmd.env("HOME", home.path())
        .env_remove("HBCTL_VAULT")
        .env_remove("HBCTL_PASSPHRASE")
        .env_remove("HBCTL_LOG");
    cmd
}

#[test]
fn help_lists_commands() {
    let home = TempDir::new().unwrap();
    hbctl(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("start"))
        .stdout(predicate::str::contains("elements"))
        .stdout(predicate::str::contains("units"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("completions"));
}

#[test]
fn version_flag_shows_version() {
    let home = TempDir::new().unwrap();
    hbctl(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("hbctl"));
}

#[test]
fn no_args_shows_usage() {
    let home = TempDir::new().unwrap();
    hbctl(&home)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn elements_json_lists_catalog() {
    let home = TempDir::new().unwrap();
    let out = hbctl(&home)
        .args(["elements", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();
    let names: Vec<&str> = parsed
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"herringbone-auth"));
    assert!(names.contains(&"operations-center"));
    assert!(parsed[0].get("compose_file").is_none());
}

#[test]
fn elements_filter_narrows_output() {
    let home = TempDir::new().unwrap();
    hbctl(&home)
        .args(["elements", "--json", "--filter", "PARSER"])
        .assert()
        .success()
        .stdout(predicate::str::contains("parser-cardset"))
        .stdout(predicate::str::contains("herringbone-auth").not());
}

#[test]
fn units_lists_database_and_parser() {
    let home = TempDir::new().unwrap();
    hbctl(&home)
        .arg("units")
        .assert()
        .success()
        .stdout(predicate::str::contains("database"))
        .stdout(predicate::str::contains("mongodb"))
        .stdout(predicate::str::contains("parser"));
}

#[test]
fn start_without_target_fails() {
    let home = TempDir::new().unwrap();
    hbctl(&home)
        .arg("start")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Specify --element"));
}

#[test]
fn start_unknown_unit_fails_without_a_vault() {
    let home = TempDir::new().unwrap();
    let vault = home.child("secrets.enc");
    hbctl(&home)
        .args(["start", "--unit", "nope"])
        .env("HBCTL_VAULT", vault.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown unit: nope"));
    vault.assert(predicate::path::missing());
}

#[test]
fn status_unknown_profile_fails_before_docker() {
    let home = TempDir::new().unwrap();
    hbctl(&home)
        .args(["status", "--profile", "nope"])
        .env("PATH", "")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown unit: nope"));
}

#[test]
fn start_receiver_without_type_fails() {
    let home = TempDir::new().unwrap();
    hbctl(&home)
        .args(["start", "--element", "logingestion-receiver"])
        .env("HBCTL_VAULT", home.child("secrets.enc").path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("--type is required"));
}

#[test]
fn login_jwtsecret_creates_vault() {
    let home = TempDir::new().unwrap();
    let vault = home.child("vault").child("secrets.enc");
    hbctl(&home)
        .args(["login", "jwtsecret", "--secret", "signing-key"])
        .env("HBCTL_VAULT", vault.path())
        .env("HBCTL_PASSPHRASE", "correct horse")
        .assert()
        .success()
        .stdout(predicate::str::contains("JWT secret saved"));

    vault.assert(predicate::path::is_file());
    let bytes = std::fs::read(vault.path()).unwrap();
    assert!(!String::from_utf8_lossy(&bytes).contains("signing-key"));
}

#[test]
fn login_with_wrong_passphrase_is_rejected() {
    let home = TempDir::new().unwrap();
    let vault = home.child("secrets.enc");
    hbctl(&home)
        .args(["login", "jwtsecret", "--secret", "one"])
        .env("HBCTL_VAULT", vault.path())
        .env("HBCTL_PASSPHRASE", "first")
        .assert()
        .success();

    hbctl(&home)
        .args(["login", "jwtsecret", "--secret", "two"])
        .env("HBCTL_VAULT", vault.path())
        .env("HBCTL_PASSPHRASE", "second")
        .assert()
        .failure()
        .stderr(predicate::str::contains("wrong passphrase"));
}

#[test]
fn login_servicekey_rejects_small_keys() {
    let home = TempDir::new().unwrap();
    let vault = home.child("secrets.enc");
    hbctl(&home)
        .args(["login", "servicekey", "--generate", "--bits", "1024"])
        .env("HBCTL_VAULT", vault.path())
        .env("HBCTL_PASSPHRASE", "pw")
        .assert()
        .failure()
        .stderr(predicate::str::contains(">= 2048"));
    vault.assert(predicate::path::missing());
}

#[test]
fn completions_bash_emits_script() {
    let home = TempDir::new().unwrap();
    hbctl(&home)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hbctl"));
}
