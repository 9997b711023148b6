//! Runtime settings: optional `apitester.toml`, then `APITESTER_*`
//! environment variables, then CLI flags.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::adapters::xh::{DEFAULT_XH_BIN, XhClient};
use crate::domain::credentials::Credentials;
use crate::domain::endpoints::{Environment, EnvironmentUrls};

pub const DEFAULT_CONFIG_FILE: &str = "apitester.toml";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const ENV_CONFIG: &str = "APITESTER_CONFIG";
pub const ENV_ENVIRONMENT: &str = "APITESTER_ENV";
pub const ENV_WORKSPACE_ID: &str = "APITESTER_WORKSPACE_ID";
pub const ENV_CLIENT_ID: &str = "APITESTER_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "APITESTER_CLIENT_SECRET";
pub const ENV_XH_BIN: &str = "APITESTER_XH_BIN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file `{path}`: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config file `{path}`: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },

    #[error("invalid environment in {origin}: {message}")]
    InvalidEnvironment { origin: String, message: String },

    #[error("timeout_secs must be greater than zero")]
    InvalidTimeout,

    #[error("missing credentials: {}", .missing.join(", "))]
    MissingCredentials { missing: Vec<&'static str> },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    environment: Option<String>,
    allow_prod_mutations: Option<bool>,
    timeout_secs: Option<u64>,
    xh_bin: Option<String>,
    #[serde(default)]
    credentials: CredentialSettings,
    #[serde(default)]
    environments: BTreeMap<String, EnvironmentSettings>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialSettings {
    pub workspace_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct EnvironmentSettings {
    base_url: Option<String>,
}

/// Fully resolved settings.
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    pub environment: Environment,
    pub allow_prod_mutations: bool,
    pub timeout_secs: u64,
    pub xh_bin: String,
    pub credentials: CredentialSettings,
    base_urls: BTreeMap<&'static str, String>,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("environment", &self.environment)
            .field("allow_prod_mutations", &self.allow_prod_mutations)
            .field("timeout_secs", &self.timeout_secs)
            .field("xh_bin", &self.xh_bin)
            .field("base_urls", &self.base_urls)
            .finish_non_exhaustive()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            allow_prod_mutations: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            xh_bin: DEFAULT_XH_BIN.to_string(),
            credentials: CredentialSettings::default(),
            base_urls: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Loads settings from the process environment and the config file it
    /// points at. An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    pub fn load_with<F>(path: Option<&Path>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| non_empty(env(ENV_CONFIG)).map(PathBuf::from));
        let file = match explicit {
            Some(path) => Some(read_settings_file(&path)?),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.is_file() {
                    Some(read_settings_file(default_path)?)
                } else {
                    None
                }
            }
        };
        Self::resolve(file.unwrap_or_default(), env)
    }

    /// Parses TOML settings text and applies environment overrides.
    pub fn from_toml_with<F>(text: &str, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file: SettingsFile = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: "<inline>".to_string(),
            source,
        })?;
        Self::resolve(file, env)
    }

    fn resolve<F>(file: SettingsFile, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(name) = file.environment.as_deref() {
            settings.environment = parse_environment(name, "config file")?;
        }
        if let Some(allow) = file.allow_prod_mutations {
            settings.allow_prod_mutations = allow;
        }
        if let Some(timeout) = file.timeout_secs {
            if timeout == 0 {
                return Err(ConfigError::InvalidTimeout);
            }
            settings.timeout_secs = timeout;
        }
        if let Some(bin) = non_empty(file.xh_bin) {
            settings.xh_bin = bin;
        }
        settings.credentials = file.credentials;
        for (name, overrides) in file.environments {
            let environment = parse_environment(&name, "[environments] table")?;
            if let Some(base_url) = non_empty(overrides.base_url) {
                settings.base_urls.insert(environment.as_str(), base_url);
            }
        }

        if let Some(name) = non_empty(env(ENV_ENVIRONMENT)) {
            settings.environment = parse_environment(&name, ENV_ENVIRONMENT)?;
        }
        if let Some(value) = non_empty(env(ENV_WORKSPACE_ID)) {
            settings.credentials.workspace_id = Some(value);
        }
        if let Some(value) = non_empty(env(ENV_CLIENT_ID)) {
            settings.credentials.client_id = Some(value);
        }
        if let Some(value) = non_empty(env(ENV_CLIENT_SECRET)) {
            settings.credentials.client_secret = Some(value);
        }
        if let Some(bin) = non_empty(env(ENV_XH_BIN)) {
            settings.xh_bin = bin;
        }

        Ok(settings)
    }

    /// Applies the `--env` flag, which overrides every other source.
    pub fn with_environment(mut self, environment: Option<Environment>) -> Self {
        if let Some(environment) = environment {
            self.environment = environment;
        }
        self
    }

    pub fn urls(&self, environment: Environment) -> EnvironmentUrls {
        match self.base_urls.get(environment.as_str()) {
            Some(base_url) => EnvironmentUrls::new(base_url.as_str()),
            None => EnvironmentUrls::defaults(environment),
        }
    }

    /// Credentials bound to `environment`.
    pub fn credentials_for(&self, environment: Environment) -> Result<Credentials, ConfigError> {
        let mut missing = Vec::new();
        if self.credentials.workspace_id.is_none() {
            missing.push(ENV_WORKSPACE_ID);
        }
        if self.credentials.client_id.is_none() {
            missing.push(ENV_CLIENT_ID);
        }
        if self.credentials.client_secret.is_none() {
            missing.push(ENV_CLIENT_SECRET);
        }
        match (
            self.credentials.workspace_id.clone(),
            self.credentials.client_id.clone(),
            self.credentials.client_secret.clone(),
        ) {
            (Some(workspace_id), Some(client_id), Some(client_secret)) => Ok(Credentials {
                workspace_id,
                client_id,
                client_secret,
                environment,
            }),
            _ => Err(ConfigError::MissingCredentials { missing }),
        }
    }

    pub fn transport(&self) -> XhClient {
        XhClient::new(self.xh_bin.as_str(), self.timeout_secs)
    }
}

fn read_settings_file(path: &Path) -> Result<SettingsFile, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    toml::from_str(text.as_str()).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

fn parse_environment(name: &str, origin: &str) -> Result<Environment, ConfigError> {
    name.parse()
        .map_err(|message| ConfigError::InvalidEnvironment {
            origin: origin.to_string(),
            message,
        })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}
