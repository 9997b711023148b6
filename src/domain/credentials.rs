use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::endpoints::Environment;

/// Client credentials exchanged for a bearer token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub workspace_id: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub environment: Environment,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("workspace_id", &self.workspace_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("environment", &self.environment)
            .finish()
    }
}

/// Bearer token issued by the login endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    pub expires_at: String,
}
