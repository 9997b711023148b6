use std::fs;

use predicates::prelude::predicate;
use serde_json::{Value, json};
use tempfile::tempdir;

#[test]
fn payload_templates_wrap_one_example_item() {
    let output = assert_cmd::cargo::cargo_bin_cmd!("apitester")
        .args(["template", "payload", "products"])
        .output()
        .expect("run");

    assert_eq!(output.status.code(), Some(0));
    let payload: Value = serde_json::from_slice(&output.stdout).expect("stdout json");
    assert_eq!(payload["endpoint"], json!("products"));
    let items = payload["template"]["products"]
        .as_array()
        .expect("wrapped items");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["skuCode"], json!("SKU001"));
}

#[test]
fn payload_templates_can_be_rendered_as_yaml() {
    assert_cmd::cargo::cargo_bin_cmd!("apitester")
        .args(["template", "payload", "pricelist", "--to", "yaml"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("priceList:"))
        .stdout(predicate::str::contains("code: PL001"));
}

#[test]
fn test_templates_validate_cleanly() {
    let dir = tempdir().expect("tempdir");
    let output = assert_cmd::cargo::cargo_bin_cmd!("apitester")
        .args(["template", "test", "orders"])
        .output()
        .expect("run");
    assert_eq!(output.status.code(), Some(0));

    let template: Value = serde_json::from_slice(&output.stdout).expect("stdout json");
    assert_eq!(template["id"], json!("test-orders-001"));
    assert_eq!(template["name"], json!("Orders GET Test"));
    assert_eq!(
        template["params"],
        json!({"pageSize": 10, "pageNo": 1, "period": 7})
    );

    let file = dir.path().join("orders.json");
    fs::write(&file, &output.stdout).expect("write template");
    assert_cmd::cargo::cargo_bin_cmd!("apitester")
        .args(["validate", "test"])
        .arg(&file)
        .assert()
        .code(0)
        .stdout(predicate::str::contains(r#""valid":true"#));
}

#[test]
fn post_templates_need_an_uploadable_endpoint() {
    let output = assert_cmd::cargo::cargo_bin_cmd!("apitester")
        .args(["template", "test", "trips", "--method", "POST"])
        .output()
        .expect("run");

    assert_eq!(output.status.code(), Some(3));
    assert!(output.stdout.is_empty());
    let error: Value = serde_json::from_slice(&output.stderr).expect("stderr json");
    assert_eq!(error["error"], json!("input_usage_error"));
}

#[test]
fn post_templates_opt_into_mutation() {
    let output = assert_cmd::cargo::cargo_bin_cmd!("apitester")
        .args(["template", "test", "customers", "--method", "post"])
        .output()
        .expect("run");

    assert_eq!(output.status.code(), Some(0));
    let template: Value = serde_json::from_slice(&output.stdout).expect("stdout json");
    assert_eq!(template["method"], json!("POST"));
    assert_eq!(template["allowMutation"], json!(true));
    assert_eq!(template["payload"], json!({"customers": []}));
}
