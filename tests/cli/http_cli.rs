use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::{Value, json};
use tempfile::{TempDir, tempdir};

const FAKE_XH: &str = r#"#!/bin/sh
echo "$*" >> "$(dirname "$0")/calls.log"
for arg in "$@"; do
  case "$arg" in
    */auth/login)
      printf 'HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\r\n{"token":"tok-1","expiresAt":"2026-12-31T00:00:00Z"}\n'
      exit 0
      ;;
  esac
done
status="${FAKE_XH_STATUS:-200}"
printf 'HTTP/1.1 %s Whatever\r\nContent-Type: application/json\r\n\r\n{"customers":[{"id":1,"firmName":"Acme"}]}\n' "$status"
"#;

struct FakeApi {
    dir: TempDir,
    xh: PathBuf,
}

impl FakeApi {
    fn new() -> Self {
        let dir = tempdir().expect("tempdir");
        let xh = dir.path().join("fake-xh");
        write_exec_script(&xh, FAKE_XH);
        Self { dir, xh }
    }

    fn command(&self) -> Command {
        let mut command = assert_cmd::cargo::cargo_bin_cmd!("apitester");
        command
            .current_dir(self.dir.path())
            .env_remove("APITESTER_CONFIG")
            .env_remove("APITESTER_ENV")
            .env_remove("FAKE_XH_STATUS")
            .env("APITESTER_WORKSPACE_ID", "ws")
            .env("APITESTER_CLIENT_ID", "client")
            .env("APITESTER_CLIENT_SECRET", "secret")
            .env("APITESTER_XH_BIN", &self.xh);
        command
    }

    fn calls(&self) -> Vec<String> {
        fs::read_to_string(self.dir.path().join("calls.log"))
            .map(|log| log.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    fn write(&self, name: &str, body: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, body).expect("write file");
        path
    }
}

fn write_exec_script(path: &Path, body: &str) {
    fs::write(path, body).expect("write script");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).expect("chmod");
    }
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout json")
}

fn stderr_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stderr).expect("stderr json")
}

#[cfg(unix)]
#[test]
fn token_logs_in_with_a_signed_request() {
    let api = FakeApi::new();
    let output = api.command().arg("token").output().expect("run");

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        stdout_json(&output),
        json!({"environment": "qa", "token": "tok-1", "expires_at": "2026-12-31T00:00:00Z"})
    );
    let calls = api.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].contains("POST https://api-qa.zono.digital/mdm-integration/v1/api/auth/login"));
    assert!(calls[0].contains(r#""workspaceId":"ws""#));
    assert!(calls[0].contains("--timeout=30"));
}

#[cfg(unix)]
#[test]
fn fetch_sends_bearer_and_query() {
    let api = FakeApi::new();
    let output = api
        .command()
        .args(["fetch", "orders", "--period", "90", "--page-size", "5"])
        .output()
        .expect("run");

    assert_eq!(output.status.code(), Some(0));
    let envelope = stdout_json(&output);
    assert_eq!(envelope["success"], json!(true));
    assert_eq!(envelope["data"]["customers"][0]["firmName"], json!("Acme"));

    let calls = api.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[1].contains(
        "GET https://api-qa.zono.digital/hub/mdm-integration/v1/api/orders?pageSize=5&pageNo=1&period=90"
    ));
    assert!(calls[1].contains("Authorization:Bearer tok-1"));
}

#[cfg(unix)]
#[test]
fn api_errors_keep_the_envelope_on_stdout() {
    let api = FakeApi::new();
    let output = api
        .command()
        .env("FAKE_XH_STATUS", "503")
        .args(["pricelist", "items", "PL-9"])
        .output()
        .expect("run");

    assert_eq!(output.status.code(), Some(2));
    let envelope = stdout_json(&output);
    assert_eq!(envelope["success"], json!(false));
    assert!(
        envelope["error"]
            .as_str()
            .is_some_and(|error| error.starts_with("API Error (503): "))
    );
    assert!(api.calls()[1].contains("/pricelist-items/PL-9"));
}

#[cfg(unix)]
#[test]
fn uploads_wait_for_confirmation() {
    let api = FakeApi::new();
    let payload = api.write(
        "customers.json",
        r#"{"customers": [{"firmName": "A"}, {"firmName": "B"}]}"#,
    );

    let output = api
        .command()
        .args(["upload", "customers", "--payload"])
        .arg(&payload)
        .output()
        .expect("run");
    assert_eq!(output.status.code(), Some(3));
    let error = stderr_json(&output);
    assert_eq!(
        error["message"],
        json!("This will modify 2 item(s) in QA environment Re-run with --confirm to proceed.")
    );
    assert_eq!(error["details"]["confirmation"]["item_count"], json!(2));
    assert!(api.calls().is_empty());

    let confirmed = api
        .command()
        .args(["upload", "customers", "--confirm", "--payload"])
        .arg(&payload)
        .output()
        .expect("run");
    assert_eq!(confirmed.status.code(), Some(0));
    let calls = api.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[1].contains("POST https://api-qa.zono.digital/hub/mdm-integration/v1/api/customers"));
}

#[cfg(unix)]
#[test]
fn production_uploads_are_blocked() {
    let api = FakeApi::new();
    let payload = api.write("products.json", r#"{"products": [{"productName": "P", "skuCode": "S"}]}"#);

    let output = api
        .command()
        .args(["--env", "prod", "upload", "products", "--confirm", "--payload"])
        .arg(&payload)
        .output()
        .expect("run");

    assert_eq!(output.status.code(), Some(3));
    assert_eq!(
        stderr_json(&output)["message"],
        json!("Production mutations are blocked. Please use QA environment for testing.")
    );
    assert!(api.calls().is_empty());
}

#[cfg(unix)]
#[test]
fn run_executes_a_single_test() {
    let api = FakeApi::new();
    let test = api.write(
        "customers.yaml",
        "id: customers-list\nname: Customers\nendpoint: customers\nassertions:\n  statusCode: 200\n  arrayLength:\n    path: customers\n    min: 1\n  fieldType:\n    path: customers[0].firmName\n    type: string\n",
    );

    let output = api.command().arg("run").arg(&test).output().expect("run");

    assert_eq!(output.status.code(), Some(0));
    let report = stdout_json(&output);
    assert_eq!(report["test_id"], json!("customers-list"));
    assert_eq!(report["passed"], json!(true));
    assert_eq!(report["status_code"], json!(200));
    assert_eq!(report["results"].as_array().map(Vec::len), Some(3));
    assert!(report["executed_at"].as_str().is_some_and(|at| at.ends_with('Z')));
}

#[cfg(unix)]
#[test]
fn run_reports_failed_suites_with_exit_two() {
    let api = FakeApi::new();
    let suite = api.write(
        "suite.json",
        r#"{"id": "smoke", "name": "Smoke", "tests": [
            {"id": "ok", "name": "OK", "endpoint": "customers", "assertions": {"statusCode": 200}},
            {"id": "strict", "name": "Strict", "endpoint": "trips",
             "assertions": {"fieldEquals": {"path": "customers[0].id", "value": 2}}}
        ]}"#,
    );

    let output = api.command().arg("run").arg(&suite).output().expect("run");

    assert_eq!(output.status.code(), Some(2));
    let report = stdout_json(&output);
    assert_eq!(report["total"], json!(2));
    assert_eq!(report["passed"], json!(1));
    assert_eq!(report["failed"], json!(1));
    assert_eq!(
        report["results"][1]["failure_reason"],
        json!("Field 'customers[0].id' expected 2, got 1")
    );
    // one login shared by both tests
    let logins = api
        .calls()
        .iter()
        .filter(|call| call.contains("/auth/login"))
        .count();
    assert_eq!(logins, 1);
}

#[cfg(unix)]
#[test]
fn curl_uses_a_given_token_without_logging_in() {
    let api = FakeApi::new();
    let output = api
        .command()
        .args(["curl", "trips", "--period", "7", "--token", "abc"])
        .output()
        .expect("run");

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        stdout_json(&output)["curl"],
        json!(
            "curl \\\n  -H 'Content-Type: application/json' \\\n  -H 'Authorization: Bearer abc' \\\n  'https://api-qa.zono.digital/hub/mdm-integration/v1/api/trips?period=7'"
        )
    );
    assert!(api.calls().is_empty());
}

#[test]
fn missing_credentials_are_usage_errors() {
    let dir = tempdir().expect("tempdir");
    let output = assert_cmd::cargo::cargo_bin_cmd!("apitester")
        .current_dir(dir.path())
        .env_remove("APITESTER_CONFIG")
        .env_remove("APITESTER_ENV")
        .env_remove("APITESTER_WORKSPACE_ID")
        .env_remove("APITESTER_CLIENT_ID")
        .env_remove("APITESTER_CLIENT_SECRET")
        .arg("token")
        .output()
        .expect("run");

    assert_eq!(output.status.code(), Some(3));
    assert_eq!(
        stderr_json(&output)["message"],
        json!(
            "missing credentials: APITESTER_WORKSPACE_ID, APITESTER_CLIENT_ID, APITESTER_CLIENT_SECRET"
        )
    );
}

#[test]
fn missing_xh_binary_is_reported() {
    let dir = tempdir().expect("tempdir");
    let config = dir.path().join("settings.toml");
    fs::write(
        &config,
        "xh_bin = \"/nonexistent/xh\"\n[credentials]\nworkspace_id = \"ws\"\nclient_id = \"c\"\nclient_secret = \"s\"\n",
    )
    .expect("write config");

    let output = assert_cmd::cargo::cargo_bin_cmd!("apitester")
        .current_dir(dir.path())
        .env_remove("APITESTER_XH_BIN")
        .env_remove("APITESTER_ENV")
        .env_remove("APITESTER_WORKSPACE_ID")
        .env_remove("APITESTER_CLIENT_ID")
        .env_remove("APITESTER_CLIENT_SECRET")
        .arg("--config")
        .arg(&config)
        .arg("token")
        .output()
        .expect("run");

    assert_eq!(output.status.code(), Some(3));
    assert_eq!(
        stderr_json(&output)["message"],
        json!("login request failed: `/nonexistent/xh` is not available in PATH")
    );
}
