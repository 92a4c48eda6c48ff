// Tests for argument handling that fails before any browser work
use anyhow::Result;
use serde_json::Value;
use std::process::{Command, Output};

/// Run chatpilot with a clean environment for its own variables
fn run_chatpilot(args: &[&str], env: &[(&str, &str)]) -> Result<Output> {
    let mut command = Command::new(env!("CARGO_BIN_EXE_chatpilot"));
    command
        .args(args)
        .env_remove("TEST_ACCOUNTS")
        .env_remove("CHATPILOT_USER_PROMPTS")
        .env_remove("CHATPILOT_ACCOUNT")
        .env_remove("CHATPILOT_URL")
        .env_remove("CHATPILOT_WEBDRIVER_URL")
        .env("LOG_LEVEL", "error");
    for (key, value) in env {
        command.env(key, value);
    }
    Ok(command.output()?)
}

#[test]
fn test_help_lists_flags() -> Result<()> {
    let output = run_chatpilot(&["--help"], &[])?;
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    for flag in [
        "--system-prompt",
        "--user-prompts",
        "--account",
        "--accounts",
        "--temporary-chat",
        "--headless",
        "--url",
        "--webdriver-url",
        "--retrieval",
        "--response-timeout",
        "--format",
    ] {
        assert!(stdout.contains(flag), "--help does not mention {}", flag);
    }
    assert!(stdout.contains("CHATPILOT_USER_PROMPTS"));

    Ok(())
}

#[test]
fn test_version() -> Result<()> {
    let output = run_chatpilot(&["--version"], &[])?;

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains(env!("CARGO_PKG_VERSION")));

    Ok(())
}

#[test]
fn test_missing_user_prompts() -> Result<()> {
    let output = run_chatpilot(&[], &[])?;

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--user-prompts"));

    Ok(())
}

#[test]
fn test_invalid_account_bundle_fails_fast() -> Result<()> {
    // An unreachable WebDriver would give exit code 4; the bundle is checked first
    let output = run_chatpilot(
        &[
            "--user-prompts",
            "Hello",
            "--webdriver-url",
            "http://127.0.0.1:9",
        ],
        &[("TEST_ACCOUNTS", "this is not base64!")],
    )?;

    assert_eq!(output.status.code(), Some(2));

    let result: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(result["error"].as_bool(), Some(true));
    assert_eq!(result["exit_code"].as_i64(), Some(2));
    assert!(
        result["message"]
            .as_str()
            .unwrap_or_default()
            .contains("base64")
    );

    Ok(())
}

#[test]
fn test_account_bundle_that_is_not_json() -> Result<()> {
    // base64 of "not json"
    let output = run_chatpilot(
        &["--user-prompts", "Hello", "--accounts", "bm90IGpzb24="],
        &[],
    )?;

    assert_eq!(output.status.code(), Some(2));
    let result: Value = serde_json::from_slice(&output.stdout)?;
    assert!(
        result["message"]
            .as_str()
            .unwrap_or_default()
            .contains("JSON")
    );

    Ok(())
}

#[test]
fn test_unreachable_webdriver() -> Result<()> {
    let output = run_chatpilot(
        &[
            "--user-prompts",
            "Hello",
            "--webdriver-url",
            "http://127.0.0.1:9",
        ],
        &[],
    )?;

    assert_eq!(output.status.code(), Some(4));
    let result: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(result["exit_code"].as_i64(), Some(4));

    Ok(())
}
