use serde_json::{Value, json};
use tempfile::tempdir;

fn catalog(args: &[&str]) -> (Option<i32>, Value) {
    let dir = tempdir().expect("tempdir");
    let output = assert_cmd::cargo::cargo_bin_cmd!("apitester")
        .current_dir(dir.path())
        .env_remove("APITESTER_CONFIG")
        .env_remove("APITESTER_ENV")
        .arg("catalog")
        .args(args)
        .output()
        .expect("run");
    let stream = if output.status.success() {
        output.stdout
    } else {
        output.stderr
    };
    let payload = serde_json::from_slice(&stream).expect("json output");
    (output.status.code(), payload)
}

#[test]
fn endpoints_are_listed_with_capabilities() {
    let (code, payload) = catalog(&["endpoints"]);
    assert_eq!(code, Some(0));
    assert_eq!(payload["orders"]["allowed_time_periods"], json!([7, 30, 90]));
    assert_eq!(payload["orders"]["supports_upload"], json!(false));
    assert_eq!(
        payload["salesman-attendance"]["api_name"],
        json!("salesman/attendance")
    );
    assert_eq!(payload.as_object().map(|map| map.len()), Some(7));
}

#[test]
fn environments_follow_the_env_flag() {
    let dir = tempdir().expect("tempdir");
    let output = assert_cmd::cargo::cargo_bin_cmd!("apitester")
        .current_dir(dir.path())
        .env_remove("APITESTER_CONFIG")
        .env_remove("APITESTER_ENV")
        .args(["--env", "prod", "catalog", "environments"])
        .output()
        .expect("run");

    assert_eq!(output.status.code(), Some(0));
    let payload: Value = serde_json::from_slice(&output.stdout).expect("stdout json");
    assert_eq!(payload[0]["name"], json!("qa"));
    assert_eq!(payload[0]["default"], json!(false));
    assert_eq!(payload[1]["name"], json!("prod"));
    assert_eq!(payload[1]["default"], json!(true));
    assert_eq!(
        payload[1]["base_url"],
        json!("https://api-prod.zono.digital")
    );
}

#[test]
fn upload_schemas_describe_wrappers_and_fields() {
    let (code, payload) = catalog(&["upload-schema", "pricelist"]);
    assert_eq!(code, Some(0));
    assert_eq!(payload["api_name"], json!("price-lists"));
    assert_eq!(payload["wrapper_key"], json!("priceList"));
    assert_eq!(payload["fields"]["name"]["required"], json!(true));
}

#[test]
fn unknown_upload_schemas_are_usage_errors() {
    let (code, payload) = catalog(&["upload-schema", "orders"]);
    assert_eq!(code, Some(3));
    assert_eq!(
        payload["message"],
        json!("No upload schema for: orders. Available: customers, products, pricelist")
    );
}
