//! Integration tests for the `hcbridge` binary.
//!
//! These tests validate argument parsing, help output, shell completions,
//! config handling and error exit codes without touching the vendor cloud.
#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a command for the `hcbridge` binary with env isolation.
///
/// Clears all `HCBRIDGE_*` env vars and points config directories at
/// `home` so tests never touch the user's real configuration.
fn hcbridge_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("hcbridge");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("NO_COLOR", "1")
        .env_remove("HCBRIDGE_PROFILE")
        .env_remove("HCBRIDGE_OUTPUT")
        .env_remove("RUST_LOG");
    cmd
}

fn setup() -> tempfile::TempDir {
    tempfile::tempdir().unwrap()
}

fn config_file(home: &Path) -> PathBuf {
    home.join(".config").join("hcbridge").join("config.toml")
}

fn write_config(home: &Path, contents: &str) {
    let path = config_file(home);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn no_args_shows_help() {
    let home = setup();
    let output = hcbridge_cmd(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn help_lists_command_tree() {
    let home = setup();
    hcbridge_cmd(home.path()).arg("--help").assert().success().stdout(
        predicate::str::contains("Home Connect")
            .and(predicate::str::contains("auth"))
            .and(predicate::str::contains("appliances"))
            .and(predicate::str::contains("programs"))
            .and(predicate::str::contains("watch")),
    );
}

#[test]
fn version_flag() {
    let home = setup();
    hcbridge_cmd(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("hcbridge"));
}

#[test]
fn power_accepts_only_known_states() {
    let home = setup();
    hcbridge_cmd(home.path())
        .args(["power", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("on")
                .and(predicate::str::contains("off"))
                .and(predicate::str::contains("standby")),
        );

    let output = hcbridge_cmd(home.path())
        .args(["power", "SIEMENS-HCS02DWH1-6BE58C26DCC1", "sleep"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn auth_subcommands_exist() {
    let home = setup();
    hcbridge_cmd(home.path())
        .args(["auth", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("login")
                .and(predicate::str::contains("status"))
                .and(predicate::str::contains("logout")),
        );
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn completions_bash() {
    let home = setup();
    hcbridge_cmd(home.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn completions_zsh() {
    let home = setup();
    hcbridge_cmd(home.path())
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn config_path_follows_xdg() {
    let home = setup();
    hcbridge_cmd(home.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hcbridge").and(predicate::str::contains("config.toml")));
}

#[test]
fn config_show_without_file_renders_defaults() {
    let home = setup();
    hcbridge_cmd(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("default_profile"));
}

#[test]
fn config_show_redacts_plaintext_secret() {
    let home = setup();
    write_config(
        home.path(),
        r#"
[profiles.default]
client_id = "abc"
client_secret = "hunter2"
"#,
    );

    hcbridge_cmd(home.path())
        .args(["--output", "json", "config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("abc")
                .and(predicate::str::contains("hunter2").not())
                .and(predicate::str::contains("********")),
        );
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn invalid_subcommand() {
    let home = setup();
    let output = hcbridge_cmd(home.path()).arg("foobar").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn invalid_output_format() {
    let home = setup();
    let output = hcbridge_cmd(home.path())
        .args(["--output", "invalid", "appliances", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(
        text.contains("invalid") || text.contains("possible values"),
        "Expected error about valid output formats:\n{text}"
    );
}

#[test]
fn missing_profile_is_not_found() {
    let home = setup();
    hcbridge_cmd(home.path())
        .args(["status", "SIEMENS-HCS02DWH1-6BE58C26DCC1"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("config init"));
}

#[test]
fn profile_env_selects_profile() {
    let home = setup();
    write_config(
        home.path(),
        r#"
[profiles.default]
client_id = "abc"
client_secret = "s"
"#,
    );

    hcbridge_cmd(home.path())
        .env("HCBRIDGE_PROFILE", "holiday-home")
        .args(["appliances", "list"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("holiday-home"));
}

#[test]
fn profile_without_secret_is_auth_error() {
    let home = setup();
    write_config(
        home.path(),
        r#"
[profiles.hcbridge-cli-test-nosecret]
client_id = "abc"
"#,
    );

    hcbridge_cmd(home.path())
        .args([
            "--profile",
            "hcbridge-cli-test-nosecret",
            "appliances",
            "list",
        ])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("client secret"));
}
