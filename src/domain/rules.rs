use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declarative assertion set attached to one test definition.
///
/// Each entry holds the raw configuration for one assertion kind; `None`
/// (absent or `null` in the document) means the kind is not checked.
/// Shapes are validated per kind when the set is evaluated.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct RuleSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_fields: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forbidden_fields: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub array_length: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_equals: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_type: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_structure: Option<Value>,
}

impl RuleSet {
    /// Configuration for `kind`, treating an explicit `null` as absent.
    pub fn get(&self, kind: AssertionKind) -> Option<&Value> {
        let entry = match kind {
            AssertionKind::StatusCode => &self.status_code,
            AssertionKind::ResponseTime => &self.response_time,
            AssertionKind::RequiredFields => &self.required_fields,
            AssertionKind::ForbiddenFields => &self.forbidden_fields,
            AssertionKind::ArrayLength => &self.array_length,
            AssertionKind::FieldEquals => &self.field_equals,
            AssertionKind::FieldType => &self.field_type,
            AssertionKind::HasStructure => &self.has_structure,
        };
        entry.as_ref().filter(|value| !value.is_null())
    }

    pub fn is_empty(&self) -> bool {
        AssertionKind::ALL.iter().all(|kind| self.get(*kind).is_none())
    }
}

/// Assertion kinds in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AssertionKind {
    StatusCode,
    ResponseTime,
    RequiredFields,
    ForbiddenFields,
    ArrayLength,
    FieldEquals,
    FieldType,
    HasStructure,
}

impl AssertionKind {
    pub const ALL: [Self; 8] = [
        Self::StatusCode,
        Self::ResponseTime,
        Self::RequiredFields,
        Self::ForbiddenFields,
        Self::ArrayLength,
        Self::FieldEquals,
        Self::FieldType,
        Self::HasStructure,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::StatusCode => "statusCode",
            Self::ResponseTime => "responseTime",
            Self::RequiredFields => "requiredFields",
            Self::ForbiddenFields => "forbiddenFields",
            Self::ArrayLength => "arrayLength",
            Self::FieldEquals => "fieldEquals",
            Self::FieldType => "fieldType",
            Self::HasStructure => "hasStructure",
        }
    }
}

impl fmt::Display for AssertionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expected JSON value type for `fieldType` and `hasStructure`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Array,
    Object,
    Null,
}

impl FieldType {
    pub const ALL: [Self; 6] = [
        Self::String,
        Self::Number,
        Self::Boolean,
        Self::Array,
        Self::Object,
        Self::Null,
    ];

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|candidate| candidate.as_str() == name)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
            Self::Null => "null",
        }
    }

    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Boolean,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }

    pub fn matches(self, value: &Value) -> bool {
        Self::of(value) == self
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response data a rule set is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResponseContext<'a> {
    pub body: &'a Value,
    pub status_code: i64,
    pub response_time_ms: f64,
}

impl<'a> ResponseContext<'a> {
    pub fn new(body: &'a Value, status_code: i64, response_time_ms: f64) -> Self {
        Self {
            body,
            status_code,
            response_time_ms,
        }
    }
}

/// Outcome of evaluating one assertion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Verdict {
    pub passed: bool,
    pub message: String,
    pub kind: AssertionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<Value>,
}

impl Verdict {
    pub fn pass(kind: AssertionKind, message: impl Into<String>) -> Self {
        Self::new(true, kind, message)
    }

    pub fn fail(kind: AssertionKind, message: impl Into<String>) -> Self {
        Self::new(false, kind, message)
    }

    pub fn new(passed: bool, kind: AssertionKind, message: impl Into<String>) -> Self {
        Self {
            passed,
            message: message.into(),
            kind,
            expected: None,
            actual: None,
        }
    }

    pub fn with_expected(mut self, expected: impl Into<Value>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    pub fn with_actual(mut self, actual: impl Into<Value>) -> Self {
        self.actual = Some(actual.into());
        self
    }
}

/// Aggregate pass/fail across all evaluated verdicts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AggregateResult {
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}
