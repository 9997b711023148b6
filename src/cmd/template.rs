use serde_json::json;

use crate::cmd::{CommandError, CommandResponse, respond};
use crate::domain::test_definition::RequestMethod;
use crate::domain::upload::uploadable_endpoints;
use crate::engine::suite::test_template;
use crate::engine::upload::generate_template;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateKind {
    /// Upload payload with one example item.
    Payload { endpoint: String },
    /// Test definition skeleton.
    Test {
        endpoint: String,
        method: RequestMethod,
    },
}

pub fn run(kind: &TemplateKind) -> CommandResponse {
    respond(execute(kind))
}

fn execute(kind: &TemplateKind) -> Result<CommandResponse, CommandError> {
    match kind {
        TemplateKind::Payload { endpoint } => {
            let template = generate_template(endpoint).ok_or_else(|| {
                CommandError::InputUsage(format!(
                    "No upload schema found for endpoint: {endpoint}. Available: {}",
                    uploadable_endpoints().join(", ")
                ))
            })?;
            Ok(CommandResponse {
                exit_code: 0,
                payload: json!({"endpoint": endpoint, "template": template}),
            })
        }
        TemplateKind::Test { endpoint, method } => {
            let definition = test_template(endpoint, *method)
                .map_err(|error| CommandError::InputUsage(error.to_string()))?;
            Ok(CommandResponse::report(&definition, true))
        }
    }
}
