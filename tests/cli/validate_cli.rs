use std::fs;

use serde_json::{Value, json};
use tempfile::tempdir;

fn validate(args: &[&str], file: &std::path::Path) -> (Option<i32>, Value) {
    let output = assert_cmd::cargo::cargo_bin_cmd!("apitester")
        .arg("validate")
        .args(args)
        .arg(file)
        .output()
        .expect("run");
    let stream = if output.status.code() == Some(3) {
        output.stderr
    } else {
        output.stdout
    };
    let payload = serde_json::from_slice(&stream).expect("json output");
    (output.status.code(), payload)
}

#[test]
fn payload_errors_are_listed_per_item() {
    let dir = tempdir().expect("tempdir");
    let file = dir.path().join("products.json");
    fs::write(
        &file,
        r#"{"products": [{"productName": "P", "skuCode": "S", "mrp": "100", "colour": "red"}, 3]}"#,
    )
    .expect("write payload");

    let (code, payload) = validate(&["payload", "products", "--payload"], &file);
    assert_eq!(code, Some(2));
    assert_eq!(payload["valid"], json!(false));
    let errors = payload["errors"].as_array().expect("errors");
    assert!(errors.contains(&json!("Item 0: Unknown field: colour")));
    assert!(errors.contains(&json!(
        "Item 0: Invalid type for 'mrp': expected number, got string"
    )));
    assert!(errors.contains(&json!("Item 1 must be an object")));
}

#[test]
fn valid_payloads_exit_zero() {
    let dir = tempdir().expect("tempdir");
    let file = dir.path().join("customers.yaml");
    fs::write(&file, "customers:\n  - firmName: Acme\n    creditLimit: 500\n").expect("write");

    let (code, payload) = validate(&["payload", "customers", "--payload"], &file);
    assert_eq!(code, Some(0));
    assert_eq!(payload, json!({"valid": true, "errors": []}));
}

#[test]
fn suites_report_prefixed_errors() {
    let dir = tempdir().expect("tempdir");
    let file = dir.path().join("suite.yaml");
    fs::write(
        &file,
        "id: smoke\nname: Smoke\ntests:\n  - id: a\n    name: A\n    endpoint: orders\n    params:\n      period: 14\n  - id: a\n    name: B\n    endpoint: trips\n    method: POST\n",
    )
    .expect("write suite");

    let (code, payload) = validate(&["test"], &file);
    assert_eq!(code, Some(2));
    assert_eq!(
        payload["errors"],
        json!([
            "tests.0.params.period: must be one of 7, 30, 90",
            "tests.1.method: Endpoint 'trips' does not support POST operations",
            "tests.1.id: duplicate test id 'a'"
        ])
    );
}

#[test]
fn valid_suites_report_their_size() {
    let dir = tempdir().expect("tempdir");
    let file = dir.path().join("suite.json");
    fs::write(
        &file,
        r#"{"id": "smoke", "name": "Smoke", "tests": [
            {"id": "a", "name": "A", "endpoint": "customers"},
            {"id": "b", "name": "B", "endpoint": "products", "assertions": {"statusCode": 200}}
        ]}"#,
    )
    .expect("write suite");

    let (code, payload) = validate(&["test"], &file);
    assert_eq!(code, Some(0));
    assert_eq!(
        payload,
        json!({"valid": true, "kind": "suite", "id": "smoke", "tests": 2})
    );
}

#[test]
fn unreadable_files_are_usage_errors() {
    let dir = tempdir().expect("tempdir");
    let (code, payload) = validate(&["test"], &dir.path().join("missing.json"));
    assert_eq!(code, Some(3));
    assert_eq!(payload["error"], json!("input_usage_error"));
}
