//! Integration tests for the quill binary
//!
//! Each test points QUILL_CONFIG_DIR at its own temporary directory.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tempfile::tempdir;

const QUILL_BINARY: &str = env!("CARGO_BIN_EXE_quill");

fn quill(config_dir: &Path, args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(QUILL_BINARY)
        .args(args)
        .env("QUILL_CONFIG_DIR", config_dir)
        .env_remove("QUILL_SIGNING_KEY")
        .env_remove("JOURNAL_STREAM")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn quill");

    if let Some(mut input) = child.stdin.take() {
        let _ = input.write_all(stdin.as_bytes());
    }

    child.wait_with_output().expect("Failed to wait for quill")
}

fn init(config_dir: &Path) {
    let output = quill(
        config_dir,
        &["init", "--signing-key", "cli-test-signing-key", "--force"],
        "",
    );
    assert!(output.status.success(), "init should succeed: {:?}", output);
}

#[test]
fn test_help_lists_commands() {
    let dir = tempdir().unwrap();
    let output = quill(dir.path(), &["--help"], "");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["init", "check-config", "login", "signup"] {
        assert!(stdout.contains(command), "help should mention {}", command);
    }
}

#[test]
fn test_check_config_without_file_is_config_error() {
    let dir = tempdir().unwrap();
    let output = quill(dir.path(), &["check-config"], "");

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_init_then_check_config() {
    let dir = tempdir().unwrap();
    init(dir.path());

    assert!(dir.path().join("config.toml").exists());

    let output = quill(dir.path(), &["check-config"], "");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Configuration is valid"));
    assert!(!stdout.contains("cli-test-signing-key"));
}

#[test]
fn test_init_generates_key() {
    let dir = tempdir().unwrap();
    let output = quill(dir.path(), &["init", "--force"], "");
    assert!(output.status.success());

    let contents = std::fs::read_to_string(dir.path().join("config.toml")).unwrap();
    assert!(contents.contains("signing_key"));
}

#[test]
fn test_login_unknown_user_fails() {
    let dir = tempdir().unwrap();
    init(dir.path());

    let output = quill(
        dir.path(),
        &["login", "ghost", "--user", "alice@example.com"],
        "",
    );

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("📧"), "no mail should be sent");
}

#[test]
fn test_signup_malformed_code_fails() {
    let dir = tempdir().unwrap();
    init(dir.path());

    let output = quill(dir.path(), &["signup", "new@example.com"], "abcdef\n");

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Your login verification code is"));
}
