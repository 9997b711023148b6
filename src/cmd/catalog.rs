use serde_json::{Value, json};

use crate::cmd::{CommandError, CommandResponse, respond};
use crate::config::Settings;
use crate::domain::endpoints::{Environment, endpoints_catalog};
use crate::domain::upload::{upload_schema, upload_schemas_catalog, uploadable_endpoints};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogTarget {
    Endpoints,
    Environments,
    UploadSchemas,
    UploadSchema(String),
}

pub fn run(target: &CatalogTarget, settings: &Settings) -> CommandResponse {
    respond(execute(target, settings).map(|payload| CommandResponse {
        exit_code: 0,
        payload,
    }))
}

fn execute(target: &CatalogTarget, settings: &Settings) -> Result<Value, CommandError> {
    match target {
        CatalogTarget::Endpoints => Ok(endpoints_catalog()),
        CatalogTarget::Environments => Ok(Value::Array(
            Environment::ALL
                .iter()
                .map(|environment| {
                    let urls = settings.urls(*environment);
                    json!({
                        "name": environment.as_str(),
                        "base_url": urls.base_url,
                        "login_endpoint": urls.login_endpoint,
                        "data_endpoint": urls.data_endpoint,
                        "default": *environment == settings.environment,
                    })
                })
                .collect(),
        )),
        CatalogTarget::UploadSchemas => Ok(upload_schemas_catalog()),
        CatalogTarget::UploadSchema(name) => upload_schema(name)
            .map(|schema| schema.to_value())
            .ok_or_else(|| {
                CommandError::InputUsage(format!(
                    "No upload schema for: {name}. Available: {}",
                    uploadable_endpoints().join(", ")
                ))
            }),
    }
}
