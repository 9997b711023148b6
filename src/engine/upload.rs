use serde_json::{Map, Value, json};

use crate::domain::report::PayloadValidation;
use crate::domain::rules::FieldType;
use crate::domain::upload::{UploadSchema, upload_schema};

/// Sample payload with one item holding every field's example value.
pub fn generate_template(endpoint: &str) -> Option<Value> {
    let schema = upload_schema(endpoint)?;
    let mut item = Map::new();
    for field in schema.fields {
        item.insert(field.name.to_string(), field.example_value());
    }
    Some(json!({ schema.wrapper_key: [item] }))
}

/// Checks an upload payload against the endpoint's schema.
///
/// Null and empty-string values skip the type check. Errors are collected
/// for every item; structural problems with the wrapper stop early.
pub fn validate_payload(endpoint: &str, payload: &Value) -> PayloadValidation {
    let Some(schema) = upload_schema(endpoint) else {
        return PayloadValidation::from_errors(vec![format!("Unknown endpoint: {endpoint}")]);
    };
    PayloadValidation::from_errors(collect_errors(schema, payload))
}

fn collect_errors(schema: &UploadSchema, payload: &Value) -> Vec<String> {
    let wrapper = schema.wrapper_key;
    let Some(items) = payload.get(wrapper) else {
        return vec![format!(
            "Payload must contain '{wrapper}' key with array of items"
        )];
    };
    let Some(items) = items.as_array() else {
        return vec![format!("'{wrapper}' must be an array")];
    };

    let mut errors = Vec::new();
    for (index, item) in items.iter().enumerate() {
        let Some(object) = item.as_object() else {
            errors.push(format!("Item {index} must be an object"));
            continue;
        };

        for field in schema.fields.iter().filter(|field| field.required) {
            if !object.contains_key(field.name) {
                errors.push(format!(
                    "Item {index}: Missing required field: {}",
                    field.name
                ));
            }
        }

        for (name, value) in object {
            let Some(field) = schema.field(name) else {
                errors.push(format!("Item {index}: Unknown field: {name}"));
                continue;
            };
            if value.is_null() || value.as_str() == Some("") {
                continue;
            }
            if !field.field_type.matches(value) {
                errors.push(format!(
                    "Item {index}: Invalid type for '{name}': expected {}, got {}",
                    field.field_type,
                    FieldType::of(value)
                ));
            }
        }
    }
    errors
}
