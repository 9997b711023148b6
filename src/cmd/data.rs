use std::path::{Path, PathBuf};

use serde_json::{Value, json};

use crate::adapters::xh::Transport;
use crate::cmd::{CommandError, CommandResponse, authenticate, respond};
use crate::config::Settings;
use crate::domain::report::ApiResponse;
use crate::domain::test_definition::{RequestMethod, RequestParams};
use crate::engine::data::{DataClient, DataError};
use crate::engine::mutation::{self, MutationRequest};
use crate::engine::request;
use crate::io;

#[derive(Debug, Clone, PartialEq)]
pub enum DataOperation {
    Fetch {
        endpoint: String,
        params: RequestParams,
    },
    Upload {
        endpoint: String,
        payload: PathBuf,
        confirm: bool,
    },
    PricelistList {
        page_size: u32,
        page_no: u32,
    },
    PricelistItems {
        pricelist_id: String,
    },
    PricelistUpdate {
        payload: PathBuf,
        confirm: bool,
    },
}

/// Runs one data operation. API errors keep the `{success, data, error}`
/// envelope on stdout and exit with 2.
pub fn run(
    operation: &DataOperation,
    settings: &Settings,
    transport: &dyn Transport,
) -> CommandResponse {
    respond(execute(operation, settings, transport))
}

fn execute(
    operation: &DataOperation,
    settings: &Settings,
    transport: &dyn Transport,
) -> Result<CommandResponse, CommandError> {
    let response = match operation {
        DataOperation::Fetch { endpoint, params } => {
            let urls = settings.urls(settings.environment);
            request::fetch_url(&urls, endpoint, params).map_err(map_request_error)?;
            with_client(settings, transport, |client| client.fetch(endpoint, params))?
        }
        DataOperation::Upload {
            endpoint,
            payload,
            confirm,
        } => {
            let payload = load_payload(payload)?;
            guard_mutation(settings, endpoint, &payload, *confirm)?;
            with_client(settings, transport, |client| client.upload(endpoint, &payload))?
        }
        DataOperation::PricelistList { page_size, page_no } => {
            with_client(settings, transport, |client| client.pricelists(*page_size, *page_no))?
        }
        DataOperation::PricelistItems { pricelist_id } => {
            with_client(settings, transport, |client| client.pricelist_items(pricelist_id))?
        }
        DataOperation::PricelistUpdate { payload, confirm } => {
            let payload = load_payload(payload)?;
            guard_mutation(settings, "pricelist", &payload, *confirm)?;
            with_client(settings, transport, |client| client.update_pricelist(&payload))?
        }
    };
    Ok(CommandResponse::report(&response, response.success))
}

fn with_client<F>(
    settings: &Settings,
    transport: &dyn Transport,
    call: F,
) -> Result<ApiResponse, CommandError>
where
    F: FnOnce(&DataClient<'_>) -> Result<ApiResponse, DataError>,
{
    let (urls, token) = authenticate(settings, transport, settings.environment)?;
    let client = DataClient {
        transport,
        urls: &urls,
        token: &token,
    };
    call(&client).map_err(|error| CommandError::InputUsage(error.to_string()))
}

/// Applies the POST guards; the explicit command counts as `allowMutation`.
fn guard_mutation(
    settings: &Settings,
    endpoint: &str,
    payload: &Value,
    confirm: bool,
) -> Result<(), CommandError> {
    let confirmation = mutation::check(
        &MutationRequest {
            endpoint,
            method: RequestMethod::Post,
            environment: settings.environment,
            payload: Some(payload),
            allow_mutation: true,
        },
        settings.allow_prod_mutations,
    )
    .map_err(|error| CommandError::InputUsage(error.to_string()))?;

    match confirmation {
        Some(confirmation) if !confirm => Err(CommandError::InputUsageWithDetails(
            format!("{} Re-run with --confirm to proceed.", confirmation.warning),
            json!({ "confirmation": confirmation }),
        )),
        _ => Ok(()),
    }
}

fn load_payload(path: &Path) -> Result<Value, CommandError> {
    io::reader::read_path(path).map_err(|error| CommandError::InputUsage(error.to_string()))
}

fn map_request_error(error: request::RequestError) -> CommandError {
    CommandError::InputUsage(error.to_string())
}
