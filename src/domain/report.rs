use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::rules::Verdict;

/// Envelope returned by data fetch and upload operations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<Value>,
    pub error: Option<String>,
}

impl ApiResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// Result of validating an upload payload against its schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PayloadValidation {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl PayloadValidation {
    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// Summary shown before a mutating request is sent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MutationConfirmation {
    pub endpoint: String,
    pub environment: String,
    pub item_count: usize,
    pub preview_items: Vec<Value>,
    pub warning: String,
}

/// Outcome of running one test definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestRunReport {
    pub test_id: String,
    pub name: String,
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    pub status_code: i64,
    pub response_time_ms: f64,
    pub results: Vec<Verdict>,
    pub executed_at: String,
}

/// Outcome of running every test in a suite.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SuiteRunReport {
    pub suite_id: String,
    pub name: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub results: Vec<SuiteTestOutcome>,
}

/// Per-test entry of a suite run: a report, or the error that stopped it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum SuiteTestOutcome {
    Completed(TestRunReport),
    Errored { test_id: String, error: String },
}

impl SuiteTestOutcome {
    pub fn passed(&self) -> bool {
        matches!(self, Self::Completed(report) if report.passed)
    }
}
