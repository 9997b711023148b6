use std::path::PathBuf;

use serde_json::json;

use crate::adapters::xh::Transport;
use crate::cmd::{CommandError, CommandResponse, authenticate, respond};
use crate::config::Settings;
use crate::domain::test_definition::{RequestMethod, RequestParams};
use crate::engine::request::{self, CurlOptions};
use crate::io;

#[derive(Debug, Clone)]
pub struct CurlCommandArgs {
    pub endpoint: String,
    pub method: RequestMethod,
    pub params: RequestParams,
    pub payload: Option<PathBuf>,
    /// Use this token instead of logging in.
    pub token: Option<String>,
}

pub fn run(args: &CurlCommandArgs, settings: &Settings, transport: &dyn Transport) -> CommandResponse {
    respond(execute(args, settings, transport))
}

fn execute(
    args: &CurlCommandArgs,
    settings: &Settings,
    transport: &dyn Transport,
) -> Result<CommandResponse, CommandError> {
    request::lookup(&args.endpoint).map_err(|error| CommandError::InputUsage(error.to_string()))?;
    let payload = args
        .payload
        .as_deref()
        .map(io::reader::read_path)
        .transpose()
        .map_err(|error| CommandError::InputUsage(error.to_string()))?;

    let (urls, token) = match &args.token {
        Some(token) => (settings.urls(settings.environment), token.clone()),
        None => authenticate(settings, transport, settings.environment)?,
    };

    let options = CurlOptions {
        method: args.method,
        params: args.params,
        payload: payload.as_ref(),
    };
    let command = request::curl_command(&urls, &args.endpoint, &token, &options)
        .map_err(|error| CommandError::InputUsage(error.to_string()))?;
    Ok(CommandResponse {
        exit_code: 0,
        payload: json!({"success": true, "curl": command}),
    })
}
