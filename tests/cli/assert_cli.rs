use std::fs;
use std::io::Cursor;
use std::path::PathBuf;

use apitester::cmd::r#assert::{AssertCommandArgs, run_with_stdin};
use apitester::io::Format;
use serde_json::{Value, json};
use tempfile::tempdir;

fn write_rules(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, body).expect("write rules");
    path
}

#[test]
fn assert_api_reports_every_failure_in_order() {
    let dir = tempdir().expect("tempdir");
    let rules = write_rules(
        &dir,
        "rules.json",
        r#"{
            "statusCode": {"in": [200, 201]},
            "requiredFields": ["data.customers", "meta.total"],
            "arrayLength": {"path": "data.customers", "min": 3}
        }"#,
    );
    let args = AssertCommandArgs {
        rules,
        input: None,
        from: Some(Format::Json),
        status_code: 200,
        response_time_ms: 12.0,
    };

    let response = run_with_stdin(
        &args,
        Cursor::new(r#"{"data": {"customers": [{"id": 1}]}}"#),
    );
    assert_eq!(response.exit_code, 2);
    assert_eq!(response.payload["passed"], json!(false));
    assert_eq!(
        response.payload["failure_reason"],
        json!(
            "Missing required fields: meta.total; Array 'data.customers' length 1 is less than min 3"
        )
    );
    let kinds: Vec<&str> = response.payload["results"]
        .as_array()
        .expect("results")
        .iter()
        .filter_map(|result| result["kind"].as_str())
        .collect();
    assert_eq!(kinds, vec!["statusCode", "requiredFields", "arrayLength"]);
}

#[test]
fn assert_command_reads_yaml_rules_and_stdin() {
    let dir = tempdir().expect("tempdir");
    let rules = write_rules(
        &dir,
        "rules.yaml",
        "statusCode: 200\nfieldEquals:\n  path: items[0].price\n  value: 10\nfieldType:\n  path: items\n  type: array\n",
    );

    let output = assert_cmd::cargo::cargo_bin_cmd!("apitester")
        .arg("assert")
        .arg("--rules")
        .arg(&rules)
        .write_stdin(r#"{"items": [{"price": 10.0}]}"#)
        .output()
        .expect("run");

    assert_eq!(output.status.code(), Some(0));
    let report: Value = serde_json::from_slice(&output.stdout).expect("stdout json");
    assert_eq!(report["passed"], json!(true));
    assert!(report.get("failure_reason").is_none());
    assert_eq!(
        report["results"][1]["message"],
        json!("Field 'items[0].price' equals 10")
    );
}

#[test]
fn assert_command_accepts_a_test_definition_as_rules() {
    let dir = tempdir().expect("tempdir");
    let rules = write_rules(
        &dir,
        "test.json",
        r#"{"id": "t1", "name": "T", "endpoint": "orders",
            "assertions": {"responseTime": {"max": 500}, "forbiddenFields": ["error"]}}"#,
    );
    let input = dir.path().join("body.json");
    fs::write(&input, r#"{"error": "boom"}"#).expect("write body");

    let output = assert_cmd::cargo::cargo_bin_cmd!("apitester")
        .arg("assert")
        .arg("--rules")
        .arg(&rules)
        .arg("--input")
        .arg(&input)
        .args(["--status", "500", "--time-ms", "750"])
        .output()
        .expect("run");

    assert_eq!(output.status.code(), Some(2));
    let report: Value = serde_json::from_slice(&output.stdout).expect("stdout json");
    assert_eq!(
        report["failure_reason"],
        json!("Response time 750ms exceeds max 500ms; Forbidden fields found: error")
    );
}

#[test]
fn malformed_rule_configs_fail_without_aborting() {
    let dir = tempdir().expect("tempdir");
    let rules = write_rules(
        &dir,
        "rules.json",
        r#"{"fieldType": {"path": "id"}, "requiredFields": ["id"]}"#,
    );

    let output = assert_cmd::cargo::cargo_bin_cmd!("apitester")
        .arg("assert")
        .arg("--rules")
        .arg(&rules)
        .write_stdin(r#"{"id": 1}"#)
        .output()
        .expect("run");

    assert_eq!(output.status.code(), Some(2));
    let report: Value = serde_json::from_slice(&output.stdout).expect("stdout json");
    assert_eq!(
        report["failure_reason"],
        json!("Field type assertion must have 'path' and 'type' keys")
    );
    assert_eq!(report["results"][0]["passed"], json!(true));
}

#[test]
fn unknown_rule_keys_are_usage_errors() {
    let dir = tempdir().expect("tempdir");
    let rules = write_rules(&dir, "rules.json", r#"{"statusCodes": 200}"#);

    let output = assert_cmd::cargo::cargo_bin_cmd!("apitester")
        .arg("assert")
        .arg("--rules")
        .arg(&rules)
        .write_stdin("{}")
        .output()
        .expect("run");

    assert_eq!(output.status.code(), Some(3));
    assert!(output.stdout.is_empty());
    let error: Value = serde_json::from_slice(&output.stderr).expect("stderr json");
    assert_eq!(error["error"], json!("input_usage_error"));
    assert!(
        error["message"]
            .as_str()
            .is_some_and(|message| message.starts_with("invalid rules schema"))
    );
}
