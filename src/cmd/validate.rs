use std::path::{Path, PathBuf};

use serde_json::{Value, json};

use crate::cmd::{CommandError, CommandResponse, respond};
use crate::engine::suite::{SuiteError, TestDocument, parse_document};
use crate::engine::upload::validate_payload;
use crate::io;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidateTarget {
    /// Upload payload checked against the endpoint's schema.
    Payload { endpoint: String, file: PathBuf },
    /// Test definition or suite file.
    Test { file: PathBuf },
}

pub fn run(target: &ValidateTarget) -> CommandResponse {
    respond(execute(target))
}

fn execute(target: &ValidateTarget) -> Result<CommandResponse, CommandError> {
    match target {
        ValidateTarget::Payload { endpoint, file } => {
            let payload = load(file)?;
            let validation = validate_payload(endpoint, &payload);
            Ok(CommandResponse::report(&validation, validation.valid))
        }
        ValidateTarget::Test { file } => {
            let document = load(file)?;
            match parse_document(&document) {
                Ok(TestDocument::Single(test)) => Ok(CommandResponse {
                    exit_code: 0,
                    payload: json!({"valid": true, "kind": "test", "id": test.id}),
                }),
                Ok(TestDocument::Suite(suite)) => Ok(CommandResponse {
                    exit_code: 0,
                    payload: json!({
                        "valid": true,
                        "kind": "suite",
                        "id": suite.id,
                        "tests": suite.tests.len(),
                    }),
                }),
                Err(SuiteError::Invalid { errors }) => Ok(CommandResponse {
                    exit_code: 2,
                    payload: json!({"valid": false, "errors": errors}),
                }),
                Err(SuiteError::Internal(message)) => Err(CommandError::Internal(message)),
            }
        }
    }
}

fn load(path: &Path) -> Result<Value, CommandError> {
    io::reader::read_path(path).map_err(|error| CommandError::InputUsage(error.to_string()))
}
