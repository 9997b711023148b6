use serde_json::json;

use crate::adapters::xh::Transport;
use crate::cmd::{CommandError, CommandResponse, respond};
use crate::config::Settings;
use crate::engine::auth;

/// Logs in with the configured credentials and prints the issued token.
pub fn run(settings: &Settings, transport: &dyn Transport) -> CommandResponse {
    respond(execute(settings, transport))
}

fn execute(settings: &Settings, transport: &dyn Transport) -> Result<CommandResponse, CommandError> {
    let environment = settings.environment;
    let credentials = settings.credentials_for(environment)?;
    let token = auth::acquire_token(transport, &credentials, &settings.urls(environment))?;
    Ok(CommandResponse {
        exit_code: 0,
        payload: json!({
            "environment": environment.as_str(),
            "token": token.token,
            "expires_at": token.expires_at,
        }),
    })
}
