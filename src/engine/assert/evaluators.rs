use serde_json::{Number, Value};

use crate::domain::field_path;
use crate::domain::rules::{AssertionKind, FieldType, ResponseContext, Verdict};

use super::rule::{
    ArrayLengthRule, AssertionRule, FieldEqualsRule, FieldTypeRule, ResponseTimeRule,
    StatusCodeRule, StructureRule,
};

/// Dispatches a validated rule to its evaluator.
pub fn evaluate(rule: &AssertionRule, context: &ResponseContext<'_>) -> Verdict {
    match rule {
        AssertionRule::StatusCode(rule) => status_code(rule, context.status_code),
        AssertionRule::ResponseTime(rule) => response_time(rule, context.response_time_ms),
        AssertionRule::RequiredFields(fields) => required_fields(fields, context.body),
        AssertionRule::ForbiddenFields(fields) => forbidden_fields(fields, context.body),
        AssertionRule::ArrayLength(rule) => array_length(rule, context.body),
        AssertionRule::FieldEquals(rule) => field_equals(rule, context.body),
        AssertionRule::FieldType(rule) => field_type(rule, context.body),
        AssertionRule::HasStructure(rule) => structure(rule, context.body),
    }
}

pub fn status_code(rule: &StatusCodeRule, actual: i64) -> Verdict {
    let kind = AssertionKind::StatusCode;
    match rule {
        StatusCodeRule::Exact(expected) => {
            let verdict = if actual == *expected {
                Verdict::pass(kind, format!("Status code is {actual}"))
            } else {
                Verdict::fail(
                    kind,
                    format!("Expected status code {expected}, got {actual}"),
                )
            };
            verdict.with_expected(*expected).with_actual(actual)
        }
        StatusCodeRule::OneOf(allowed) => {
            let verdict = if allowed.contains(&actual) {
                Verdict::pass(kind, format!("Status code {actual} is in allowed list"))
            } else {
                let listed = allowed
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                Verdict::fail(
                    kind,
                    format!("Expected status code in [{listed}], got {actual}"),
                )
            };
            verdict.with_expected(allowed.clone()).with_actual(actual)
        }
    }
}

pub fn response_time(rule: &ResponseTimeRule, actual_ms: f64) -> Verdict {
    let kind = AssertionKind::ResponseTime;
    let max = &rule.max;
    let within = max.as_f64().is_some_and(|limit| actual_ms <= limit);
    let verdict = if within {
        Verdict::pass(kind, format!("Response time {actual_ms:.0}ms is within {max}ms"))
    } else {
        Verdict::fail(
            kind,
            format!("Response time {actual_ms:.0}ms exceeds max {max}ms"),
        )
    };
    verdict
        .with_expected(Value::Number(max.clone()))
        .with_actual(float_value(actual_ms))
}

pub fn required_fields(fields: &[String], body: &Value) -> Verdict {
    let kind = AssertionKind::RequiredFields;
    let missing: Vec<String> = fields
        .iter()
        .filter(|field| field_path::resolve(body, field).is_none())
        .cloned()
        .collect();

    if missing.is_empty() {
        Verdict::pass(
            kind,
            format!("All required fields present: {}", fields.join(", ")),
        )
        .with_expected(fields.to_vec())
    } else {
        Verdict::fail(
            kind,
            format!("Missing required fields: {}", missing.join(", ")),
        )
        .with_expected(fields.to_vec())
        .with_actual(missing)
    }
}

pub fn forbidden_fields(fields: &[String], body: &Value) -> Verdict {
    let kind = AssertionKind::ForbiddenFields;
    let found: Vec<String> = fields
        .iter()
        .filter(|field| field_path::resolve(body, field).is_some())
        .cloned()
        .collect();

    if found.is_empty() {
        Verdict::pass(kind, "No forbidden fields present").with_expected(fields.to_vec())
    } else {
        Verdict::fail(
            kind,
            format!("Forbidden fields found: {}", found.join(", ")),
        )
        .with_expected(fields.to_vec())
        .with_actual(found)
    }
}

pub fn array_length(rule: &ArrayLengthRule, body: &Value) -> Verdict {
    let kind = AssertionKind::ArrayLength;
    let path = rule.path.as_str();

    let Some(value) = field_path::resolve(body, path) else {
        return Verdict::fail(kind, format!("Field '{path}' not found in response"))
            .with_expected(rule.config.clone())
            .with_actual(Value::Null);
    };

    let Value::Array(items) = value else {
        let actual_type = FieldType::of(value);
        return Verdict::fail(
            kind,
            format!("Field '{path}' is not an array (got {actual_type})"),
        )
        .with_expected(rule.config.clone())
        .with_actual(actual_type.as_str());
    };

    let length = items.len() as u64;
    let verdict = match (rule.min, rule.max) {
        (Some(min), _) if length < min => Verdict::fail(
            kind,
            format!("Array '{path}' length {length} is less than min {min}"),
        ),
        (_, Some(max)) if length > max => Verdict::fail(
            kind,
            format!("Array '{path}' length {length} exceeds max {max}"),
        ),
        _ => Verdict::pass(kind, format!("Array '{path}' length {length} is valid")),
    };
    verdict.with_expected(rule.config.clone()).with_actual(length)
}

pub fn field_equals(rule: &FieldEqualsRule, body: &Value) -> Verdict {
    let kind = AssertionKind::FieldEquals;
    let path = rule.path.as_str();

    let Some(actual) = field_path::resolve(body, path) else {
        return Verdict::fail(kind, format!("Field '{path}' not found in response"))
            .with_expected(rule.value.clone())
            .with_actual(Value::Null);
    };

    let expected_literal = render_literal(&rule.value);
    let verdict = if values_equal(actual, &rule.value) {
        Verdict::pass(kind, format!("Field '{path}' equals {expected_literal}"))
    } else {
        Verdict::fail(
            kind,
            format!(
                "Field '{path}' expected {expected_literal}, got {}",
                render_literal(actual)
            ),
        )
    };
    verdict
        .with_expected(rule.value.clone())
        .with_actual(actual.clone())
}

pub fn field_type(rule: &FieldTypeRule, body: &Value) -> Verdict {
    let kind = AssertionKind::FieldType;
    let path = rule.path.as_str();
    let expected = rule.expected;

    let Some(value) = field_path::resolve(body, path) else {
        return Verdict::fail(kind, format!("Field '{path}' not found in response"))
            .with_expected(expected.as_str())
            .with_actual(Value::Null);
    };

    let actual_type = FieldType::of(value);
    let verdict = if expected.matches(value) {
        Verdict::pass(kind, format!("Field '{path}' is of type '{expected}'"))
    } else {
        Verdict::fail(
            kind,
            format!("Field '{path}' expected type '{expected}', got '{actual_type}'"),
        )
    };
    verdict
        .with_expected(expected.as_str())
        .with_actual(actual_type.as_str())
}

pub fn structure(rule: &StructureRule, body: &Value) -> Verdict {
    let kind = AssertionKind::HasStructure;
    let errors: Vec<String> = rule
        .entries
        .iter()
        .filter_map(|(field, type_name)| {
            let path = Value::String(field.clone());
            let verdict = match FieldTypeRule::from_parts(Some(&path), Some(type_name)) {
                Ok(entry) => field_type(&entry, body),
                Err(error) => Verdict::fail(AssertionKind::FieldType, error.message),
            };
            (!verdict.passed).then(|| format!("{field}: {}", verdict.message))
        })
        .collect();

    if errors.is_empty() {
        Verdict::pass(
            kind,
            format!(
                "Response structure matches schema ({} fields validated)",
                rule.entries.len()
            ),
        )
        .with_expected(rule.schema.clone())
    } else {
        Verdict::fail(
            kind,
            format!("Structure validation failed: {}", errors.join("; ")),
        )
        .with_expected(rule.schema.clone())
        .with_actual(errors)
    }
}

/// Deep structural equality; numbers compare by exact value regardless of
/// integer or float representation.
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(left), Value::Number(right)) => numbers_equal(left, right),
        (Value::Array(left), Value::Array(right)) => {
            left.len() == right.len()
                && left
                    .iter()
                    .zip(right)
                    .all(|(left, right)| values_equal(left, right))
        }
        (Value::Object(left), Value::Object(right)) => {
            left.len() == right.len()
                && left.iter().all(|(key, left)| {
                    right
                        .get(key)
                        .is_some_and(|right| values_equal(left, right))
                })
        }
        _ => left == right,
    }
}

fn numbers_equal(left: &Number, right: &Number) -> bool {
    match (exact_integer(left), exact_integer(right)) {
        (Some(left), Some(right)) => left == right,
        (None, None) => left.as_f64() == right.as_f64(),
        _ => false,
    }
}

/// Integer value of `number` when it has no fractional part.
fn exact_integer(number: &Number) -> Option<i128> {
    if let Some(value) = number.as_i64() {
        return Some(i128::from(value));
    }
    if let Some(value) = number.as_u64() {
        return Some(i128::from(value));
    }
    let value = number.as_f64()?;
    (value.is_finite() && value.fract() == 0.0 && value.abs() < 1e38).then(|| value as i128)
}

fn render_literal(value: &Value) -> String {
    match value {
        Value::String(text) => format!("'{text}'"),
        other => other.to_string(),
    }
}

fn float_value(value: f64) -> Value {
    Number::from_f64(value).map_or(Value::Null, Value::Number)
}
