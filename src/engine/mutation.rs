//! Guards in front of every POST request.

use serde_json::Value;
use thiserror::Error;

use crate::domain::endpoints::Environment;
use crate::domain::report::MutationConfirmation;
use crate::domain::test_definition::RequestMethod;
use crate::domain::upload::upload_schema;
use crate::engine::upload::validate_payload;

pub const POST_WHITELIST: [&str; 3] = ["customers", "products", "pricelist"];
const PREVIEW_LIMIT: usize = 3;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MutationError {
    #[error(
        "Endpoint '{endpoint}' does not support POST operations. Allowed: customers, products, pricelist"
    )]
    NotWhitelisted { endpoint: String },

    #[error("POST operations require allowMutation=true in test definition")]
    MutationNotAllowed,

    #[error("Production mutations are blocked. Please use QA environment for testing.")]
    ProductionBlocked,

    #[error("POST requests must have a payload")]
    MissingPayload,

    #[error("{label} payload must have '{wrapper}' wrapper: {{\"{wrapper}\": [...]}}")]
    MissingWrapper { label: String, wrapper: &'static str },

    #[error("Validation failed: {}", .errors.join(", "))]
    InvalidPayload { errors: Vec<String> },
}

/// A prospective request as seen by the guards.
#[derive(Debug, Clone, Copy)]
pub struct MutationRequest<'a> {
    pub endpoint: &'a str,
    pub method: RequestMethod,
    pub environment: Environment,
    pub payload: Option<&'a Value>,
    pub allow_mutation: bool,
}

/// Runs the guards in order and returns confirmation data for POST requests.
/// GET requests always pass with no confirmation.
pub fn check(
    request: &MutationRequest<'_>,
    allow_prod_mutations: bool,
) -> Result<Option<MutationConfirmation>, MutationError> {
    if !request.method.is_mutation() {
        return Ok(None);
    }

    if !POST_WHITELIST.contains(&request.endpoint) {
        return Err(MutationError::NotWhitelisted {
            endpoint: request.endpoint.to_string(),
        });
    }
    if !request.allow_mutation {
        return Err(MutationError::MutationNotAllowed);
    }
    if request.environment == Environment::Prod && !allow_prod_mutations {
        return Err(MutationError::ProductionBlocked);
    }

    let Some(payload) = request.payload.filter(|payload| !is_empty_payload(payload)) else {
        return Err(MutationError::MissingPayload);
    };
    let Some(schema) = upload_schema(request.endpoint) else {
        return Err(MutationError::NotWhitelisted {
            endpoint: request.endpoint.to_string(),
        });
    };
    if payload.get(schema.wrapper_key).is_none() {
        return Err(MutationError::MissingWrapper {
            label: title_case(request.endpoint),
            wrapper: schema.wrapper_key,
        });
    }

    let validation = validate_payload(request.endpoint, payload);
    if !validation.valid {
        return Err(MutationError::InvalidPayload {
            errors: validation.errors,
        });
    }

    Ok(Some(confirmation(
        request.endpoint,
        request.environment,
        payload,
    )))
}

/// Item count and preview for the wrapped item array.
pub fn confirmation(endpoint: &str, environment: Environment, payload: &Value) -> MutationConfirmation {
    let items = upload_schema(endpoint)
        .and_then(|schema| payload.get(schema.wrapper_key))
        .and_then(Value::as_array);
    let item_count = items.map_or(0, Vec::len);
    let preview_items = items
        .map(|items| items.iter().take(PREVIEW_LIMIT).cloned().collect())
        .unwrap_or_default();
    let environment = environment.as_str().to_ascii_uppercase();

    MutationConfirmation {
        endpoint: endpoint.to_string(),
        warning: format!("This will modify {item_count} item(s) in {environment} environment"),
        environment,
        item_count,
        preview_items,
    }
}

fn is_empty_payload(payload: &Value) -> bool {
    match payload {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
