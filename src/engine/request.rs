//! Request URLs and cURL rendering for data endpoints.

use serde_json::Value;
use thiserror::Error;

use crate::domain::endpoints::{
    DEFAULT_PAGE_NO, DEFAULT_PAGE_SIZE, EndpointConfig, EnvironmentUrls, endpoint,
    endpoint_names,
};
use crate::domain::test_definition::{RequestMethod, RequestParams};
use crate::domain::upload::{upload_schema, uploadable_endpoints};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("Unknown endpoint: {name}. Available: {}", .available.join(", "))]
    UnknownEndpoint {
        name: String,
        available: Vec<&'static str>,
    },

    #[error("Endpoint '{name}' does not support upload. Available: {}", .available.join(", "))]
    NotUploadable {
        name: String,
        available: Vec<&'static str>,
    },

    #[error("Invalid period {period} for endpoint '{name}'. Allowed: {allowed}")]
    InvalidPeriod {
        name: String,
        period: u32,
        allowed: String,
    },
}

pub fn lookup(name: &str) -> Result<&'static EndpointConfig, RequestError> {
    endpoint(name).ok_or_else(|| RequestError::UnknownEndpoint {
        name: name.to_string(),
        available: endpoint_names(),
    })
}

/// GET URL with pagination defaults and the requested or default period.
pub fn fetch_url(
    urls: &EnvironmentUrls,
    name: &str,
    params: &RequestParams,
) -> Result<String, RequestError> {
    let config = lookup(name)?;
    let mut query = Vec::new();

    if config.supports_pagination {
        query.push(format!(
            "pageSize={}",
            params.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
        ));
        query.push(format!("pageNo={}", params.page_no.unwrap_or(DEFAULT_PAGE_NO)));
    }
    if config.supports_time_period {
        let period = match params.period {
            Some(period) => Some(check_period(config, period)?),
            None => config.default_period,
        };
        if let Some(period) = period {
            query.push(format!("period={period}"));
        }
    }

    Ok(with_query(urls.data_url(config.api_name), &query))
}

/// POST URL for an entity upload.
pub fn upload_url(urls: &EnvironmentUrls, name: &str) -> Result<String, RequestError> {
    let schema = upload_schema(name).ok_or_else(|| RequestError::NotUploadable {
        name: name.to_string(),
        available: uploadable_endpoints(),
    })?;
    Ok(urls.data_url(schema.api_name))
}

pub fn pricelist_list_url(urls: &EnvironmentUrls, page_size: u32, page_no: u32) -> String {
    format!(
        "{}?pageSize={page_size}&pageNo={page_no}",
        urls.data_url("pricelist")
    )
}

pub fn pricelist_items_url(urls: &EnvironmentUrls, pricelist_id: &str) -> String {
    urls.data_url(&format!("pricelist-items/{pricelist_id}"))
}

pub fn pricelist_update_url(urls: &EnvironmentUrls) -> String {
    urls.data_url("pricelist")
}

/// Options for [`curl_command`]. Only explicitly provided query values are
/// rendered.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurlOptions<'a> {
    pub method: RequestMethod,
    pub params: RequestParams,
    pub payload: Option<&'a Value>,
}

pub fn curl_command(
    urls: &EnvironmentUrls,
    name: &str,
    token: &str,
    options: &CurlOptions<'_>,
) -> Result<String, RequestError> {
    let config = lookup(name)?;

    let mut query = Vec::new();
    if options.method == RequestMethod::Get {
        if config.supports_pagination {
            if let Some(page_size) = options.params.page_size.filter(|value| *value > 0) {
                query.push(format!("pageSize={page_size}"));
            }
            if let Some(page_no) = options.params.page_no.filter(|value| *value > 0) {
                query.push(format!("pageNo={page_no}"));
            }
        }
        if config.supports_time_period {
            if let Some(period) = options.params.period.filter(|value| *value > 0) {
                query.push(format!("period={period}"));
            }
        }
    }
    let url = with_query(urls.data_url(config.api_name), &query);

    let mut parts = vec!["curl".to_string()];
    if options.method == RequestMethod::Post {
        parts.push("-X POST".to_string());
    }
    parts.push("-H 'Content-Type: application/json'".to_string());
    parts.push(format!("-H 'Authorization: Bearer {token}'"));
    if options.method == RequestMethod::Post {
        if let Some(payload) = options.payload.filter(|payload| !payload.is_null()) {
            parts.push(format!("-d {}", shell_quote(&payload.to_string())));
        }
    }
    parts.push(shell_quote(&url));

    Ok(parts.join(" \\\n  "))
}

fn check_period(config: &EndpointConfig, period: u32) -> Result<u32, RequestError> {
    if config.allowed_time_periods.contains(&period) {
        return Ok(period);
    }
    Err(RequestError::InvalidPeriod {
        name: config.name.to_string(),
        period,
        allowed: config
            .allowed_time_periods
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(", "),
    })
}

fn with_query(url: String, query: &[String]) -> String {
    if query.is_empty() {
        url
    } else {
        format!("{url}?{}", query.join("&"))
    }
}

fn shell_quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', r"'\''"))
}
