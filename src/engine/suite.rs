//! Test definition and suite validation, plus definition templates.

use std::collections::BTreeSet;

use jsonschema::validator_for;
use regex::Regex;
use serde_json::{Value, json};
use thiserror::Error;

use crate::domain::endpoints::{DEFAULT_PAGE_NO, DEFAULT_PAGE_SIZE, Environment};
use crate::domain::rules::RuleSet;
use crate::domain::test_definition::{RequestMethod, RequestParams, TestDefinition, TestSuite};
use crate::domain::upload::{upload_schema, uploadable_endpoints};
use crate::engine::request::{self, RequestError};

pub const TEST_ID_PATTERN: &str = "^[A-Za-z0-9][A-Za-z0-9_.-]*$";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SuiteError {
    #[error("{}", .errors.join("; "))]
    Invalid { errors: Vec<String> },

    #[error("internal validation error: {0}")]
    Internal(String),
}

impl SuiteError {
    fn invalid(errors: Vec<String>) -> Self {
        Self::Invalid { errors }
    }
}

/// A document holding either one test or a suite of tests.
#[derive(Debug, Clone, PartialEq)]
pub enum TestDocument {
    Single(TestDefinition),
    Suite(TestSuite),
}

/// Suites are recognised by a top-level `tests` key.
pub fn parse_document(value: &Value) -> Result<TestDocument, SuiteError> {
    if value.get("tests").is_some() {
        validate_suite(value).map(TestDocument::Suite)
    } else {
        validate_definition(value).map(TestDocument::Single)
    }
}

/// Structural check, then endpoint-capability checks.
pub fn validate_definition(value: &Value) -> Result<TestDefinition, SuiteError> {
    check_schema(&definition_schema(), value)?;
    let definition: TestDefinition = serde_json::from_value(value.clone())
        .map_err(|error| SuiteError::invalid(vec![error.to_string()]))?;

    let id_pattern = id_pattern()?;
    let errors = capability_errors(&definition, &id_pattern, "");
    if errors.is_empty() {
        Ok(definition)
    } else {
        Err(SuiteError::invalid(errors))
    }
}

pub fn validate_suite(value: &Value) -> Result<TestSuite, SuiteError> {
    check_schema(&suite_schema(), value)?;
    let suite: TestSuite = serde_json::from_value(value.clone())
        .map_err(|error| SuiteError::invalid(vec![error.to_string()]))?;

    let id_pattern = id_pattern()?;
    let mut errors = Vec::new();
    if !id_pattern.is_match(&suite.id) {
        errors.push(format!("id: must match {TEST_ID_PATTERN}"));
    }
    let mut seen = BTreeSet::new();
    for (index, test) in suite.tests.iter().enumerate() {
        let prefix = format!("tests.{index}.");
        errors.extend(capability_errors(test, &id_pattern, &prefix));
        if !seen.insert(test.id.as_str()) {
            errors.push(format!("{prefix}id: duplicate test id '{}'", test.id));
        }
    }

    if errors.is_empty() {
        Ok(suite)
    } else {
        Err(SuiteError::invalid(errors))
    }
}

fn capability_errors(definition: &TestDefinition, id_pattern: &Regex, prefix: &str) -> Vec<String> {
    let mut errors = Vec::new();
    if !id_pattern.is_match(&definition.id) {
        errors.push(format!("{prefix}id: must match {TEST_ID_PATTERN}"));
    }

    let config = match request::lookup(&definition.endpoint) {
        Ok(config) => config,
        Err(error) => {
            errors.push(format!("{prefix}endpoint: {error}"));
            return errors;
        }
    };
    if definition.method.is_mutation() && !config.supports_upload {
        errors.push(format!(
            "{prefix}method: Endpoint '{}' does not support POST operations",
            definition.endpoint
        ));
    }
    if let Some(period) = definition.params.and_then(|params| params.period) {
        if config.supports_time_period && !config.allowed_time_periods.contains(&period) {
            let allowed: Vec<String> = config
                .allowed_time_periods
                .iter()
                .map(u32::to_string)
                .collect();
            errors.push(format!(
                "{prefix}params.period: must be one of {}",
                allowed.join(", ")
            ));
        }
    }
    errors
}

fn check_schema(schema: &Value, instance: &Value) -> Result<(), SuiteError> {
    let validator = validator_for(schema)
        .map_err(|error| SuiteError::Internal(format!("invalid schema: {error}")))?;
    let errors: Vec<String> = validator
        .iter_errors(instance)
        .map(|error| {
            let pointer = error.instance_path().as_str().to_string();
            format!("{}: {error}", dotted_path(&pointer))
        })
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(SuiteError::invalid(errors))
    }
}

fn dotted_path(pointer: &str) -> String {
    if pointer.is_empty() {
        return "(root)".to_string();
    }
    pointer
        .trim_start_matches('/')
        .split('/')
        .map(|token| token.replace("~1", "/").replace("~0", "~"))
        .collect::<Vec<_>>()
        .join(".")
}

fn id_pattern() -> Result<Regex, SuiteError> {
    Regex::new(TEST_ID_PATTERN).map_err(|error| SuiteError::Internal(error.to_string()))
}

fn definition_schema() -> Value {
    let positive_or_null = json!({"type": ["integer", "null"], "minimum": 1});
    json!({
        "type": "object",
        "required": ["id", "name", "endpoint"],
        "additionalProperties": false,
        "properties": {
            "id": {"type": "string", "minLength": 1},
            "name": {"type": "string", "minLength": 1},
            "description": {"type": ["string", "null"]},
            "environment": {"enum": ["qa", "prod"]},
            "endpoint": {"type": "string", "minLength": 1},
            "method": {"enum": ["GET", "POST"]},
            "params": {
                "type": ["object", "null"],
                "additionalProperties": false,
                "properties": {
                    "pageSize": positive_or_null,
                    "pageNo": positive_or_null,
                    "period": positive_or_null
                }
            },
            "payload": {"type": ["object", "null"]},
            "assertions": {
                "type": "object",
                "additionalProperties": false,
                "properties": {
                    "statusCode": {},
                    "responseTime": {},
                    "requiredFields": {},
                    "forbiddenFields": {},
                    "arrayLength": {},
                    "fieldEquals": {},
                    "fieldType": {},
                    "hasStructure": {}
                }
            },
            "allowMutation": {"type": "boolean"}
        }
    })
}

fn suite_schema() -> Value {
    json!({
        "type": "object",
        "required": ["id", "name", "tests"],
        "additionalProperties": false,
        "properties": {
            "id": {"type": "string", "minLength": 1},
            "name": {"type": "string", "minLength": 1},
            "description": {"type": ["string", "null"]},
            "tests": {"type": "array", "items": definition_schema()}
        }
    })
}

/// Starting-point definition for an endpoint: status 200 within 3000ms.
pub fn test_template(endpoint: &str, method: RequestMethod) -> Result<TestDefinition, RequestError> {
    let config = request::lookup(endpoint)?;

    let mut definition = TestDefinition {
        id: format!("test-{endpoint}-001"),
        name: format!("{} {method} Test", title_case(endpoint)),
        description: None,
        environment: Environment::Qa,
        endpoint: endpoint.to_string(),
        method,
        params: None,
        payload: None,
        assertions: RuleSet {
            status_code: Some(json!(200)),
            response_time: Some(json!({"max": 3000})),
            ..RuleSet::default()
        },
        allow_mutation: false,
    };

    match method {
        RequestMethod::Get => {
            let mut params = RequestParams::default();
            if config.supports_pagination {
                params.page_size = Some(DEFAULT_PAGE_SIZE);
                params.page_no = Some(DEFAULT_PAGE_NO);
            }
            if config.supports_time_period {
                params.period = config.allowed_time_periods.first().copied();
            }
            if params != RequestParams::default() {
                definition.params = Some(params);
            }
        }
        RequestMethod::Post => {
            let schema = upload_schema(endpoint).ok_or_else(|| RequestError::NotUploadable {
                name: endpoint.to_string(),
                available: uploadable_endpoints(),
            })?;
            definition.payload = Some(json!({ schema.wrapper_key: [] }));
            definition.allow_mutation = true;
        }
    }

    Ok(definition)
}

/// Capitalises the first letter of every alphabetic run.
fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut at_word_start = true;
    for ch in name.chars() {
        if at_word_start {
            out.extend(ch.to_uppercase());
        } else {
            out.extend(ch.to_lowercase());
        }
        at_word_start = !ch.is_alphabetic();
    }
    out
}
