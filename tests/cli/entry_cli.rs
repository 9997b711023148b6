use predicates::prelude::predicate;
use serde_json::Value;

#[test]
fn help_is_available() {
    assert_cmd::cargo::cargo_bin_cmd!("apitester")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("assert"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("catalog"));
}

#[test]
fn version_is_available() {
    assert_cmd::cargo::cargo_bin_cmd!("apitester")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn unknown_subcommands_are_usage_errors_on_stderr() {
    let output = assert_cmd::cargo::cargo_bin_cmd!("apitester")
        .arg("nope")
        .output()
        .expect("run");

    assert_eq!(output.status.code(), Some(3));
    assert!(output.stdout.is_empty());
    let error: Value = serde_json::from_slice(&output.stderr).expect("stderr json");
    assert_eq!(error["error"], Value::from("input_usage_error"));
    assert_eq!(error["code"], Value::from(3));
    assert_eq!(error["details"]["kind"], Value::from("cli_parse_error"));
}

#[test]
fn unknown_environments_are_rejected_by_the_parser() {
    assert_cmd::cargo::cargo_bin_cmd!("apitester")
        .args(["--env", "staging", "catalog", "endpoints"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("cli_parse_error"));
}

#[test]
fn broken_config_files_are_reported_as_config_errors() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = dir.path().join("apitester.toml");
    std::fs::write(&config, "environment = \"staging\"\n").expect("write config");

    let output = assert_cmd::cargo::cargo_bin_cmd!("apitester")
        .arg("--config")
        .arg(&config)
        .args(["catalog", "environments"])
        .env_remove("APITESTER_ENV")
        .output()
        .expect("run");

    assert_eq!(output.status.code(), Some(3));
    let error: Value = serde_json::from_slice(&output.stderr).expect("stderr json");
    assert_eq!(error["details"]["kind"], Value::from("config_error"));
    assert_eq!(error["details"]["command"], Value::from("catalog"));
}
