use std::cell::RefCell;
use std::collections::BTreeMap;

use apitester::adapters::xh::{HttpMethod, Transport, XhError, XhRequest, XhResponse};
use apitester::config::Settings;
use apitester::domain::report::SuiteTestOutcome;
use apitester::engine::runner::{RunError, RunOptions, Runner};
use apitester::engine::suite::{TestDocument, parse_document};
use serde_json::{Value, json};

/// Answers logins with a fixed token and everything else with `body`.
struct RecordingApi {
    body: &'static str,
    requests: RefCell<Vec<XhRequest>>,
}

impl RecordingApi {
    fn new(body: &'static str) -> Self {
        Self {
            body,
            requests: RefCell::new(Vec::new()),
        }
    }
}

impl Transport for RecordingApi {
    fn send(&self, request: &XhRequest) -> Result<XhResponse, XhError> {
        self.requests.borrow_mut().push(request.clone());
        let body = if request.url.ends_with("/auth/login") {
            r#"{"token":"secret-token","expiresAt":"2026-12-31T00:00:00Z"}"#
        } else {
            self.body
        };
        Ok(XhResponse {
            status: 200,
            headers: BTreeMap::new(),
            body: body.to_string(),
        })
    }
}

fn settings() -> Settings {
    Settings::from_toml_with(
        concat!(
            "[credentials]\n",
            "workspace_id = \"ws\"\n",
            "client_id = \"client\"\n",
            "client_secret = \"secret\"\n",
            "[environments.qa]\n",
            "base_url = \"http://qa.local\"\n",
        ),
        |_| None,
    )
    .expect("settings")
}

fn suite(value: Value) -> apitester::domain::test_definition::TestSuite {
    match parse_document(&value).expect("valid document") {
        TestDocument::Suite(suite) => suite,
        TestDocument::Single(_) => panic!("expected a suite"),
    }
}

#[test]
fn suite_runs_every_test_and_counts_outcomes() {
    let api = RecordingApi::new(r#"{"orders":[{"id":"O-1","total":12.5}]}"#);
    let settings = settings();
    let suite = suite(json!({
        "id": "orders-smoke",
        "name": "Orders smoke",
        "tests": [
            {
                "id": "orders-shape",
                "name": "Orders shape",
                "endpoint": "orders",
                "params": {"period": 90},
                "assertions": {
                    "statusCode": 200,
                    "hasStructure": {"orders": "array", "orders[0].total": "number"}
                }
            },
            {
                "id": "orders-empty",
                "name": "Orders empty",
                "endpoint": "orders",
                "assertions": {"arrayLength": {"path": "orders", "max": 0}}
            },
            {
                "id": "products-upload",
                "name": "Products upload",
                "endpoint": "products",
                "method": "POST",
                "payload": {"products": [{"productName": "P", "skuCode": "S"}]}
            }
        ]
    }));

    let mut runner = Runner::new(&api, &settings, RunOptions::default());
    let report = runner.run_suite(&suite);

    assert_eq!(report.suite_id, "orders-smoke");
    assert_eq!((report.total, report.passed, report.failed), (3, 1, 2));
    assert!(report.results[0].passed());
    match &report.results[1] {
        SuiteTestOutcome::Completed(test) => assert_eq!(
            test.failure_reason.as_deref(),
            Some("Array 'orders' length 1 exceeds max 0")
        ),
        other => panic!("unexpected outcome: {other:?}"),
    }
    match &report.results[2] {
        SuiteTestOutcome::Errored { test_id, error } => {
            assert_eq!(test_id, "products-upload");
            assert_eq!(
                error,
                "POST operations require allowMutation=true in test definition"
            );
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    let requests = api.requests.borrow();
    let urls: Vec<&str> = requests.iter().map(|request| request.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "http://qa.local/mdm-integration/v1/api/auth/login",
            "http://qa.local/hub/mdm-integration/v1/api/orders?pageSize=10&pageNo=1&period=90",
            "http://qa.local/hub/mdm-integration/v1/api/orders?pageSize=10&pageNo=1&period=30",
        ]
    );
    assert!(requests[1].headers.contains(&(
        "Authorization".to_string(),
        "Bearer secret-token".to_string()
    )));
}

#[test]
fn confirmed_mutations_post_their_payload() {
    let api = RecordingApi::new(r#"{"status":"accepted"}"#);
    let settings = settings();
    let document = json!({
        "id": "pricelist-update",
        "name": "Pricelist update",
        "endpoint": "pricelist",
        "method": "POST",
        "allowMutation": true,
        "payload": {"priceList": [{"name": "Standard", "code": "PL1", "products": []}]},
        "assertions": {"fieldEquals": {"path": "status", "value": "accepted"}}
    });
    let TestDocument::Single(test) = parse_document(&document).expect("valid test") else {
        panic!("expected a single test");
    };

    let mut unconfirmed = Runner::new(&api, &settings, RunOptions::default());
    match unconfirmed.run_test(&test) {
        Err(RunError::ConfirmationRequired(confirmation)) => {
            assert_eq!(confirmation.endpoint, "pricelist");
            assert_eq!(confirmation.item_count, 1);
        }
        other => panic!("expected confirmation request, got {other:?}"),
    }
    assert!(api.requests.borrow().is_empty());

    let mut confirmed = Runner::new(&api, &settings, RunOptions { confirm: true });
    let report = confirmed.run_test(&test).expect("report");
    assert!(report.passed);

    let requests = api.requests.borrow();
    let upload = requests.last().expect("upload request");
    assert_eq!(upload.method, HttpMethod::Post);
    assert_eq!(upload.url, "http://qa.local/hub/mdm-integration/v1/api/price-lists");
    let sent: Value = serde_json::from_str(upload.body.as_deref().expect("body")).expect("json");
    assert_eq!(sent["priceList"][0]["code"], json!("PL1"));
}
