//! CLI integration tests

use std::process::Command;

fn costctl(args: &[&str]) -> std::process::Output {
    Command::new("cargo")
        .args(["run", "-q", "-p", "estimator-cli", "--"])
        .args(args)
        .output()
        .expect("Failed to execute command")
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = costctl(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("Project Cost Advisor"), "Should show app name");
    for command in ["upload", "predict", "scenarios", "companies", "health"] {
        assert!(stdout.contains(command), "Should show {} command", command);
    }
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = costctl(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("costctl"), "Should show binary name");
}

#[test]
fn test_predict_help() {
    let output = costctl(&["predict", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Predict help should succeed");
    assert!(stdout.contains("--input"), "Should show input option");
    assert!(stdout.contains("--company"), "Should show company option");
    assert!(stdout.contains("COSTCTL_COMPANY"), "Should show company env var");
}

#[test]
fn test_scenarios_help() {
    let output = costctl(&["scenarios", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Scenarios help should succeed");
    assert!(stdout.contains("--input"), "Should show input option");
}

#[test]
fn test_upload_help() {
    let output = costctl(&["upload", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Upload help should succeed");
    assert!(stdout.contains("<COMPANY>"), "Should show company argument");
    assert!(stdout.contains("<FILE>"), "Should show file argument");
}

/// Test format and api-url options
#[test]
fn test_global_options() {
    let output = costctl(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(stdout.contains("--format"), "Should show format option");
    assert!(stdout.contains("table"), "Should show table format");
    assert!(stdout.contains("json"), "Should show json format");
    assert!(stdout.contains("--api-url"), "Should show api-url option");
    assert!(stdout.contains("COSTCTL_API_URL"), "Should show env var");
}

/// Test invalid command error handling
#[test]
fn test_invalid_command() {
    let output = costctl(&["invalid-command"]);
    assert!(!output.status.success(), "Invalid command should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("error") || stderr.contains("invalid"),
        "Should show error message"
    );
}

/// Test missing required argument error handling
#[test]
fn test_missing_input() {
    let output = costctl(&["predict"]);
    assert!(!output.status.success(), "Missing --input should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--input"), "Should name the missing option");
}
