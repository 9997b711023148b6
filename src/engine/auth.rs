use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::json;
use sha2::Sha256;
use thiserror::Error;
use tracing::{debug, info};

use crate::adapters::xh::{HttpMethod, Transport, XhError, XhRequest};
use crate::domain::credentials::{Credentials, TokenResponse};
use crate::domain::endpoints::EnvironmentUrls;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("login request failed: {0}")]
    Transport(#[from] XhError),

    #[error("login rejected ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("invalid login response: {0}")]
    InvalidResponse(String),

    #[error("cannot sign login request: {0}")]
    Signing(#[from] InvalidLength),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    token: String,
    expires_at: String,
}

/// Lowercase hex HMAC-SHA256 of `"{workspace_id}_{client_id}"` keyed by the
/// client secret.
pub fn signature(
    workspace_id: &str,
    client_id: &str,
    client_secret: &str,
) -> Result<String, AuthError> {
    let message = format!("{workspace_id}_{client_id}");
    Ok(hex::encode(hmac_sha256(
        client_secret.as_bytes(),
        message.as_bytes(),
    )?))
}

fn hmac_sha256(key: &[u8], message: &[u8]) -> Result<Vec<u8>, InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(key)?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Exchanges credentials for a bearer token at the environment's login URL.
pub fn acquire_token(
    transport: &dyn Transport,
    credentials: &Credentials,
    urls: &EnvironmentUrls,
) -> Result<TokenResponse, AuthError> {
    let signed = signature(
        &credentials.workspace_id,
        &credentials.client_id,
        &credentials.client_secret,
    )?;
    let body = json!({
        "workspaceId": credentials.workspace_id,
        "clientId": credentials.client_id,
        "signature": signed,
    });
    let request =
        XhRequest::json(HttpMethod::Post, urls.login_url(), None).with_body(body.to_string());

    debug!(
        environment = %credentials.environment,
        workspace_id = %credentials.workspace_id,
        "requesting token"
    );
    let response = transport.send(&request)?;
    if response.status >= 400 {
        return Err(AuthError::Rejected {
            status: response.status,
            body: response.body,
        });
    }

    let login: LoginResponse = serde_json::from_str(&response.body)
        .map_err(|error| AuthError::InvalidResponse(error.to_string()))?;
    info!(environment = %credentials.environment, "token acquired");
    Ok(TokenResponse {
        token: login.token,
        expires_at: login.expires_at,
    })
}
