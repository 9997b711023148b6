use serde_json::{Map, Number, Value};
use thiserror::Error;

use crate::domain::rules::{AssertionKind, FieldType};

/// Typed assertion configuration, validated from the raw rule set entry.
#[derive(Debug, Clone, PartialEq)]
pub enum AssertionRule {
    StatusCode(StatusCodeRule),
    ResponseTime(ResponseTimeRule),
    RequiredFields(Vec<String>),
    ForbiddenFields(Vec<String>),
    ArrayLength(ArrayLengthRule),
    FieldEquals(FieldEqualsRule),
    FieldType(FieldTypeRule),
    HasStructure(StructureRule),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusCodeRule {
    Exact(i64),
    OneOf(Vec<i64>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResponseTimeRule {
    pub max: Number,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayLengthRule {
    pub path: String,
    pub min: Option<u64>,
    pub max: Option<u64>,
    /// Original configuration, echoed as `expected` in verdicts.
    pub config: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldEqualsRule {
    pub path: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldTypeRule {
    pub path: String,
    pub expected: FieldType,
}

/// Field path -> raw type name, in document order. Entries are validated
/// one by one during evaluation so a bad entry fails only itself.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureRule {
    pub entries: Vec<(String, Value)>,
    pub schema: Value,
}

/// Rule configuration that does not match the shape of its kind.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct RuleFormatError {
    pub kind: AssertionKind,
    pub message: String,
}

impl RuleFormatError {
    fn new(kind: AssertionKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl AssertionRule {
    pub fn parse(kind: AssertionKind, config: &Value) -> Result<Self, RuleFormatError> {
        match kind {
            AssertionKind::StatusCode => parse_status_code(config).map(Self::StatusCode),
            AssertionKind::ResponseTime => parse_response_time(config).map(Self::ResponseTime),
            AssertionKind::RequiredFields => parse_field_list(config)
                .map(Self::RequiredFields)
                .ok_or_else(|| {
                    RuleFormatError::new(
                        kind,
                        "Required fields assertion must be a list of field paths",
                    )
                }),
            AssertionKind::ForbiddenFields => parse_field_list(config)
                .map(Self::ForbiddenFields)
                .ok_or_else(|| {
                    RuleFormatError::new(
                        kind,
                        "Forbidden fields assertion must be a list of field paths",
                    )
                }),
            AssertionKind::ArrayLength => parse_array_length(config).map(Self::ArrayLength),
            AssertionKind::FieldEquals => parse_field_equals(config).map(Self::FieldEquals),
            AssertionKind::FieldType => {
                FieldTypeRule::from_parts(config.get("path"), config.get("type"))
                    .map(Self::FieldType)
            }
            AssertionKind::HasStructure => parse_structure(config).map(Self::HasStructure),
        }
    }

    pub fn kind(&self) -> AssertionKind {
        match self {
            Self::StatusCode(_) => AssertionKind::StatusCode,
            Self::ResponseTime(_) => AssertionKind::ResponseTime,
            Self::RequiredFields(_) => AssertionKind::RequiredFields,
            Self::ForbiddenFields(_) => AssertionKind::ForbiddenFields,
            Self::ArrayLength(_) => AssertionKind::ArrayLength,
            Self::FieldEquals(_) => AssertionKind::FieldEquals,
            Self::FieldType(_) => AssertionKind::FieldType,
            Self::HasStructure(_) => AssertionKind::HasStructure,
        }
    }
}

impl FieldTypeRule {
    /// Builds a `fieldType` rule from its `path` and `type` values.
    pub fn from_parts(
        path: Option<&Value>,
        type_name: Option<&Value>,
    ) -> Result<Self, RuleFormatError> {
        let kind = AssertionKind::FieldType;
        let type_value = type_name.filter(|value| is_set(value));
        let (Some(path), Some(type_value)) = (non_empty_str(path), type_value) else {
            return Err(RuleFormatError::new(
                kind,
                "Field type assertion must have 'path' and 'type' keys",
            ));
        };

        let Some(expected) = type_value.as_str().and_then(FieldType::parse) else {
            let shown = match type_value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            let valid = FieldType::ALL.map(FieldType::as_str).join(", ");
            return Err(RuleFormatError::new(
                kind,
                format!("Invalid type '{shown}'. Must be one of: {valid}"),
            ));
        };

        Ok(Self {
            path: path.to_string(),
            expected,
        })
    }
}

fn parse_status_code(config: &Value) -> Result<StatusCodeRule, RuleFormatError> {
    let invalid = || {
        RuleFormatError::new(
            AssertionKind::StatusCode,
            "Invalid status code assertion format",
        )
    };

    match config {
        Value::Number(number) => number.as_i64().map(StatusCodeRule::Exact).ok_or_else(invalid),
        Value::Object(map) => {
            let allowed = map.get("in").and_then(Value::as_array).ok_or_else(invalid)?;
            allowed
                .iter()
                .map(Value::as_i64)
                .collect::<Option<Vec<_>>>()
                .map(StatusCodeRule::OneOf)
                .ok_or_else(invalid)
        }
        _ => Err(invalid()),
    }
}

fn parse_response_time(config: &Value) -> Result<ResponseTimeRule, RuleFormatError> {
    let kind = AssertionKind::ResponseTime;
    match config.get("max") {
        None | Some(Value::Null) => Err(RuleFormatError::new(
            kind,
            "Response time threshold must have 'max' key",
        )),
        Some(Value::Number(max)) => Ok(ResponseTimeRule { max: max.clone() }),
        Some(_) => Err(RuleFormatError::new(
            kind,
            "Response time threshold 'max' must be a number",
        )),
    }
}

fn parse_field_list(config: &Value) -> Option<Vec<String>> {
    config
        .as_array()?
        .iter()
        .map(|item| item.as_str().map(ToOwned::to_owned))
        .collect()
}

fn parse_array_length(config: &Value) -> Result<ArrayLengthRule, RuleFormatError> {
    let (Some(object), Some(path)) = (config.as_object(), non_empty_str(config.get("path"))) else {
        return Err(RuleFormatError::new(
            AssertionKind::ArrayLength,
            "Array length assertion must have 'path' key",
        ));
    };

    Ok(ArrayLengthRule {
        path: path.to_string(),
        min: length_bound(object, "min")?,
        max: length_bound(object, "max")?,
        config: config.clone(),
    })
}

fn length_bound(object: &Map<String, Value>, key: &str) -> Result<Option<u64>, RuleFormatError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value.as_u64().map(Some).ok_or_else(|| {
            RuleFormatError::new(
                AssertionKind::ArrayLength,
                format!("Array length assertion '{key}' must be a non-negative integer"),
            )
        }),
    }
}

fn parse_field_equals(config: &Value) -> Result<FieldEqualsRule, RuleFormatError> {
    let Some(path) = non_empty_str(config.get("path")) else {
        return Err(RuleFormatError::new(
            AssertionKind::FieldEquals,
            "Field equals assertion must have 'path' key",
        ));
    };

    Ok(FieldEqualsRule {
        path: path.to_string(),
        value: config.get("value").cloned().unwrap_or(Value::Null),
    })
}

fn parse_structure(config: &Value) -> Result<StructureRule, RuleFormatError> {
    match config.as_object() {
        Some(map) if !map.is_empty() => Ok(StructureRule {
            entries: map
                .iter()
                .map(|(path, type_name)| (path.clone(), type_name.clone()))
                .collect(),
            schema: config.clone(),
        }),
        _ => Err(RuleFormatError::new(
            AssertionKind::HasStructure,
            "Structure assertion must have schema definition",
        )),
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|text| !text.is_empty())
}

/// `null`, `false`, zero and empty strings or collections count as unset.
fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
