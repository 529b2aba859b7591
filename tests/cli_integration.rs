//! Command-line surface tests that never reach the network or the keyring

mod common;

use assert_cmd::Command;
use predicates::prelude::*;

use common::temp_config_file;

#[test]
fn test_help_lists_commands() {
    let mut cmd = Command::cargo_bin("chatai").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("chats"))
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("location"));
}

#[test]
fn test_chats_help_lists_subcommands() {
    let mut cmd = Command::cargo_bin("chatai").unwrap();
    cmd.args(["chats", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rename"))
        .stdout(predicate::str::contains("search"));
}

#[test]
fn test_missing_command_fails() {
    let mut cmd = Command::cargo_bin("chatai").unwrap();
    cmd.assert().failure();
}

#[test]
fn test_rename_requires_title() {
    let mut cmd = Command::cargo_bin("chatai").unwrap();
    cmd.args(["chats", "rename", "abc"]).assert().failure();
}

#[test]
fn test_invalid_base_url_is_rejected() {
    let (_dir, path) = temp_config_file("api:\n  base_url: \"ftp://example.com\"\n");

    let mut cmd = Command::cargo_bin("chatai").unwrap();
    cmd.env_remove("CHATAI_API_URL")
        .arg("--config")
        .arg(&path)
        .arg("whoami")
        .assert()
        .failure()
        .stderr(predicate::str::contains("must use http or https"));
}

#[test]
fn test_zero_title_length_is_rejected() {
    let (_dir, path) = temp_config_file("chat:\n  title_max_chars: 0\n");

    let mut cmd = Command::cargo_bin("chatai").unwrap();
    cmd.arg("--config")
        .arg(&path)
        .arg("logout")
        .assert()
        .failure()
        .stderr(predicate::str::contains("title_max_chars"));
}

#[test]
fn test_cli_api_url_override_is_validated() {
    let mut cmd = Command::cargo_bin("chatai").unwrap();
    cmd.args(["--api-url", "not a url", "whoami"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("api.base_url"));
}
