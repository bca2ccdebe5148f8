mod common;

use common::{fixture_path, spawn_command};

#[test]
fn validate_valid_config() {
    let config = fixture_path("default_cycle.yaml");
    let output = spawn_command(&["validate", config.to_str().unwrap()]);
    assert!(
        output.status.success(),
        "validate should succeed for valid config: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("1 valid"));
}

#[test]
fn validate_negative_duration_fails_with_config_exit_code() {
    let config = fixture_path("negative_duration.yaml");
    let output = spawn_command(&["validate", config.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stdout).contains("sequence.ns_yellow_secs"));
}

#[test]
fn validate_unknown_section_fails() {
    let config = fixture_path("unknown_section.yaml");
    let output = spawn_command(&["validate", config.to_str().unwrap()]);
    assert!(!output.status.success());
}

#[test]
fn validate_json_output() {
    let good = fixture_path("fast_cycle.yaml");
    let bad = fixture_path("negative_duration.yaml");
    let output = spawn_command(&[
        "validate",
        "--format",
        "json",
        good.to_str().unwrap(),
        bad.to_str().unwrap(),
    ]);
    assert!(!output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value =
        serde_json::from_str(&stdout).expect("output should be valid JSON");
    assert_eq!(parsed["summary"]["total"], 2);
    assert_eq!(parsed["summary"]["valid"], 1);
    assert_eq!(parsed["files"][0]["valid"], true);
    assert_eq!(parsed["files"][1]["valid"], false);
}

#[test]
fn validate_missing_file() {
    let output = spawn_command(&["validate", "/tmp/nonexistent_crossway_test_file.yaml"]);
    assert!(!output.status.success());
}

#[test]
fn version_human() {
    let output = spawn_command(&["version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("crossway "));
}

#[test]
fn version_json() {
    let output = spawn_command(&["version", "--format", "json"]);
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["name"], "crossway");
}

#[test]
fn completions_bash() {
    let output = spawn_command(&["completions", "bash"]);
    assert!(output.status.success());
    assert!(!output.stdout.is_empty());
}

#[test]
fn run_with_invalid_config_exits_2() {
    let config = fixture_path("negative_duration.yaml");
    let output = spawn_command(&["run", "--config", config.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn unknown_subcommand_is_usage_error() {
    let output = spawn_command(&["launch"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn help_exits_zero() {
    let output = spawn_command(&["--help"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("run"));
}
