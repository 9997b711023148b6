use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const DEFAULT_PAGE_NO: u32 = 1;

const LOGIN_ENDPOINT: &str = "/mdm-integration/v1/api/auth/login";
const DATA_ENDPOINT: &str = "/hub/mdm-integration/v1/api";

/// Target platform environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Qa,
    Prod,
}

impl Environment {
    pub const ALL: [Self; 2] = [Self::Qa, Self::Prod];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Qa => "qa",
            Self::Prod => "prod",
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::Qa => "https://api-qa.zono.digital",
            Self::Prod => "https://api-prod.zono.digital",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "qa" => Ok(Self::Qa),
            "prod" => Ok(Self::Prod),
            other => Err(format!("unknown environment `{other}`; expected qa or prod")),
        }
    }
}

/// Resolved URLs for one environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentUrls {
    pub base_url: String,
    pub login_endpoint: String,
    pub data_endpoint: String,
}

impl EnvironmentUrls {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            login_endpoint: LOGIN_ENDPOINT.to_string(),
            data_endpoint: DATA_ENDPOINT.to_string(),
        }
    }

    pub fn defaults(environment: Environment) -> Self {
        Self::new(environment.default_base_url())
    }

    pub fn login_url(&self) -> String {
        format!("{}{}", self.base_url, self.login_endpoint)
    }

    /// `{base}{data}/{route}` for a data API route such as `customers`.
    pub fn data_url(&self, route: &str) -> String {
        format!("{}{}/{route}", self.base_url, self.data_endpoint)
    }
}

/// Capabilities of one data endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EndpointConfig {
    #[serde(skip)]
    pub name: &'static str,
    pub api_name: &'static str,
    pub supports_pagination: bool,
    pub supports_time_period: bool,
    pub allowed_time_periods: &'static [u32],
    pub default_period: Option<u32>,
    pub supports_upload: bool,
}

const PERIODS: &[u32] = &[7, 30, 90];

pub static ENDPOINTS: [EndpointConfig; 7] = [
    EndpointConfig {
        name: "customers",
        api_name: "customers",
        supports_pagination: true,
        supports_time_period: true,
        allowed_time_periods: PERIODS,
        default_period: Some(30),
        supports_upload: true,
    },
    EndpointConfig {
        name: "products",
        api_name: "products",
        supports_pagination: true,
        supports_time_period: false,
        allowed_time_periods: &[],
        default_period: None,
        supports_upload: true,
    },
    EndpointConfig {
        name: "orders",
        api_name: "orders",
        supports_pagination: true,
        supports_time_period: true,
        allowed_time_periods: PERIODS,
        default_period: Some(30),
        supports_upload: false,
    },
    EndpointConfig {
        name: "trips",
        api_name: "trips",
        supports_pagination: true,
        supports_time_period: true,
        allowed_time_periods: PERIODS,
        default_period: Some(30),
        supports_upload: false,
    },
    EndpointConfig {
        name: "supply-tracker",
        api_name: "supply-tracker",
        supports_pagination: true,
        supports_time_period: true,
        allowed_time_periods: PERIODS,
        default_period: Some(30),
        supports_upload: false,
    },
    EndpointConfig {
        name: "salesman-attendance",
        api_name: "salesman/attendance",
        supports_pagination: true,
        supports_time_period: false,
        allowed_time_periods: &[],
        default_period: None,
        supports_upload: false,
    },
    EndpointConfig {
        name: "pricelist",
        api_name: "pricelist",
        supports_pagination: true,
        supports_time_period: false,
        allowed_time_periods: &[],
        default_period: None,
        supports_upload: true,
    },
];

pub fn endpoint(name: &str) -> Option<&'static EndpointConfig> {
    ENDPOINTS.iter().find(|config| config.name == name)
}

pub fn endpoint_names() -> Vec<&'static str> {
    ENDPOINTS.iter().map(|config| config.name).collect()
}

/// Capability table keyed by endpoint name, in table order.
pub fn endpoints_catalog() -> Value {
    let mut catalog = Map::new();
    for config in &ENDPOINTS {
        catalog.insert(
            config.name.to_string(),
            serde_json::to_value(config).unwrap_or(Value::Null),
        );
    }
    Value::Object(catalog)
}
