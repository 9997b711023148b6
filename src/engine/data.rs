//! Authenticated data operations: fetch, upload and pricelist calls.

use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::adapters::xh::{HttpMethod, Transport, XhError, XhRequest, XhResponse};
use crate::domain::endpoints::EnvironmentUrls;
use crate::domain::report::ApiResponse;
use crate::domain::test_definition::RequestParams;
use crate::engine::request::{self, RequestError};
use crate::engine::upload::validate_payload;

#[derive(Debug, Error)]
pub enum DataError {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error("request failed: {0}")]
    Transport(#[from] XhError),
}

/// Bearer-authenticated client for one environment.
pub struct DataClient<'a> {
    pub transport: &'a dyn Transport,
    pub urls: &'a EnvironmentUrls,
    pub token: &'a str,
}

impl DataClient<'_> {
    pub fn fetch(&self, endpoint: &str, params: &RequestParams) -> Result<ApiResponse, DataError> {
        let url = request::fetch_url(self.urls, endpoint, params)?;
        self.get(url)
    }

    /// Validates the payload locally before sending; invalid payloads never
    /// reach the network.
    pub fn upload(&self, endpoint: &str, payload: &Value) -> Result<ApiResponse, DataError> {
        let url = request::upload_url(self.urls, endpoint)?;
        let validation = validate_payload(endpoint, payload);
        if !validation.valid {
            return Ok(ApiResponse::failed(format!(
                "Validation failed: {}",
                validation.errors.join(", ")
            )));
        }
        self.post(url, payload)
    }

    pub fn pricelists(&self, page_size: u32, page_no: u32) -> Result<ApiResponse, DataError> {
        self.get(request::pricelist_list_url(self.urls, page_size, page_no))
    }

    pub fn pricelist_items(&self, pricelist_id: &str) -> Result<ApiResponse, DataError> {
        self.get(request::pricelist_items_url(self.urls, pricelist_id))
    }

    pub fn update_pricelist(&self, payload: &Value) -> Result<ApiResponse, DataError> {
        self.post(request::pricelist_update_url(self.urls), payload)
    }

    fn get(&self, url: String) -> Result<ApiResponse, DataError> {
        let request = XhRequest::json(HttpMethod::Get, url, Some(self.token));
        Ok(api_response(self.transport.send(&request)?))
    }

    fn post(&self, url: String, payload: &Value) -> Result<ApiResponse, DataError> {
        info!(url = %url, "sending mutation");
        let request = XhRequest::json(HttpMethod::Post, url, Some(self.token))
            .with_body(payload.to_string());
        Ok(api_response(self.transport.send(&request)?))
    }
}

/// Maps an HTTP response onto the `{success, data, error}` envelope.
pub fn api_response(response: XhResponse) -> ApiResponse {
    if response.status >= 400 {
        return ApiResponse::failed(format!(
            "API Error ({}): {}",
            response.status, response.body
        ));
    }
    match serde_json::from_str(&response.body) {
        Ok(data) => ApiResponse::ok(data),
        Err(error) => ApiResponse::failed(format!("invalid JSON response: {error}")),
    }
}
