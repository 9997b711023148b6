//! Executes test definitions against the live API.

use std::collections::HashMap;
use std::time::Instant;

use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::adapters::xh::{HttpMethod, Transport, XhError, XhRequest};
use crate::config::{ConfigError, Settings};
use crate::domain::endpoints::Environment;
use crate::domain::report::{MutationConfirmation, SuiteRunReport, SuiteTestOutcome, TestRunReport};
use crate::domain::rules::ResponseContext;
use crate::domain::test_definition::{RequestMethod, TestDefinition, TestSuite};
use crate::engine::assert::{evaluate_all, reduce};
use crate::engine::auth::{self, AuthError};
use crate::engine::mutation::{self, MutationError, MutationRequest};
use crate::engine::request::{self, RequestError};

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Mutation(#[from] MutationError),

    #[error("{} Re-run with --confirm to proceed.", .0.warning)]
    ConfirmationRequired(Box<MutationConfirmation>),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error("request failed: {0}")]
    Transport(#[from] XhError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Proceed with mutating requests that passed every guard.
    pub confirm: bool,
}

/// Runs tests with one transport, caching one token per environment.
pub struct Runner<'a> {
    transport: &'a dyn Transport,
    settings: &'a Settings,
    options: RunOptions,
    tokens: HashMap<Environment, String>,
}

impl<'a> Runner<'a> {
    pub fn new(transport: &'a dyn Transport, settings: &'a Settings, options: RunOptions) -> Self {
        Self {
            transport,
            settings,
            options,
            tokens: HashMap::new(),
        }
    }

    pub fn run_test(&mut self, test: &TestDefinition) -> Result<TestRunReport, RunError> {
        info!(test_id = %test.id, endpoint = %test.endpoint, method = %test.method, "running test");

        let confirmation = mutation::check(
            &MutationRequest {
                endpoint: &test.endpoint,
                method: test.method,
                environment: test.environment,
                payload: test.payload.as_ref(),
                allow_mutation: test.allow_mutation,
            },
            self.settings.allow_prod_mutations,
        )?;
        if let Some(confirmation) = confirmation {
            if !self.options.confirm {
                return Err(RunError::ConfirmationRequired(Box::new(confirmation)));
            }
            warn!(warning = %confirmation.warning, "executing confirmed mutation");
        }

        let urls = self.settings.urls(test.environment);
        let (method, url, body) = match test.method {
            RequestMethod::Get => (
                HttpMethod::Get,
                request::fetch_url(&urls, &test.endpoint, &test.params.unwrap_or_default())?,
                None,
            ),
            RequestMethod::Post => (
                HttpMethod::Post,
                request::upload_url(&urls, &test.endpoint)?,
                test.payload.as_ref().map(Value::to_string),
            ),
        };

        let token = self.token(test.environment)?;
        let mut request = XhRequest::json(method, url, Some(&token));
        request.body = body;

        let started = Instant::now();
        let response = self.transport.send(&request)?;
        let response_time_ms = started.elapsed().as_secs_f64() * 1000.0;
        debug!(
            test_id = %test.id,
            status = response.status,
            response_time_ms,
            "response received"
        );

        let body = parse_body(&response.body);
        let status_code = i64::from(response.status);
        let context = ResponseContext::new(&body, status_code, response_time_ms);
        let results = evaluate_all(&test.assertions, &context);
        let aggregate = reduce(&results);
        info!(test_id = %test.id, passed = aggregate.passed, "test finished");

        Ok(TestRunReport {
            test_id: test.id.clone(),
            name: test.name.clone(),
            passed: aggregate.passed,
            failure_reason: aggregate.failure_reason,
            status_code,
            response_time_ms,
            results,
            executed_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        })
    }

    /// Runs every test in file order. A test that cannot run is recorded as
    /// errored and counted as failed; the remaining tests still run.
    pub fn run_suite(&mut self, suite: &TestSuite) -> SuiteRunReport {
        info!(suite_id = %suite.id, tests = suite.tests.len(), "running suite");
        let mut results = Vec::with_capacity(suite.tests.len());
        for test in &suite.tests {
            let outcome = match self.run_test(test) {
                Ok(report) => SuiteTestOutcome::Completed(report),
                Err(error) => {
                    warn!(test_id = %test.id, error = %error, "test errored");
                    SuiteTestOutcome::Errored {
                        test_id: test.id.clone(),
                        error: error.to_string(),
                    }
                }
            };
            results.push(outcome);
        }

        let passed = results.iter().filter(|outcome| outcome.passed()).count();
        SuiteRunReport {
            suite_id: suite.id.clone(),
            name: suite.name.clone(),
            total: results.len(),
            passed,
            failed: results.len() - passed,
            results,
        }
    }

    fn token(&mut self, environment: Environment) -> Result<String, RunError> {
        if let Some(token) = self.tokens.get(&environment) {
            return Ok(token.clone());
        }
        let credentials = self.settings.credentials_for(environment)?;
        let urls = self.settings.urls(environment);
        let token = auth::acquire_token(self.transport, &credentials, &urls)?.token;
        self.tokens.insert(environment, token.clone());
        Ok(token)
    }
}

/// JSON bodies parse as-is; anything else is kept as a JSON string.
pub fn parse_body(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}
