pub mod r#assert;
pub mod catalog;
pub mod curl;
pub mod data;
pub mod run;
pub mod template;
pub mod token;
pub mod validate;

use serde::Serialize;
use serde_json::{Value, json};

use crate::adapters::xh::Transport;
use crate::config::{ConfigError, Settings};
use crate::domain::endpoints::{Environment, EnvironmentUrls};
use crate::engine::auth::{self, AuthError};

/// Structured command response that carries exit-code mapping and JSON payload.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CommandResponse {
    pub exit_code: i32,
    pub payload: Value,
}

impl CommandResponse {
    /// Serializes `report` with exit code 0 when `ok`, otherwise 2.
    pub fn report<T: Serialize>(report: &T, ok: bool) -> Self {
        let exit_code = if ok { 0 } else { 2 };
        match serde_json::to_value(report) {
            Ok(payload) => Self { exit_code, payload },
            Err(error) => CommandError::Internal(format!("failed to serialize report: {error}"))
                .into_response(),
        }
    }
}

pub(crate) enum CommandError {
    InputUsage(String),
    /// Usage error that carries extra context for the caller.
    InputUsageWithDetails(String, Value),
    Internal(String),
}

impl CommandError {
    pub(crate) fn into_response(self) -> CommandResponse {
        match self {
            Self::InputUsage(message) => CommandResponse {
                exit_code: 3,
                payload: json!({
                    "error": "input_usage_error",
                    "message": message,
                }),
            },
            Self::InputUsageWithDetails(message, details) => CommandResponse {
                exit_code: 3,
                payload: json!({
                    "error": "input_usage_error",
                    "message": message,
                    "details": details,
                }),
            },
            Self::Internal(message) => CommandResponse {
                exit_code: 1,
                payload: json!({
                    "error": "internal_error",
                    "message": message,
                }),
            },
        }
    }
}

impl From<ConfigError> for CommandError {
    fn from(error: ConfigError) -> Self {
        Self::InputUsage(error.to_string())
    }
}

impl From<AuthError> for CommandError {
    fn from(error: AuthError) -> Self {
        Self::InputUsage(error.to_string())
    }
}

pub(crate) fn respond(result: Result<CommandResponse, CommandError>) -> CommandResponse {
    result.unwrap_or_else(CommandError::into_response)
}

/// Resolves URLs for `environment` and logs in.
pub(crate) fn authenticate(
    settings: &Settings,
    transport: &dyn Transport,
    environment: Environment,
) -> Result<(EnvironmentUrls, String), CommandError> {
    let credentials = settings.credentials_for(environment)?;
    let urls = settings.urls(environment);
    let token = auth::acquire_token(transport, &credentials, &urls)?;
    Ok((urls, token.token))
}
