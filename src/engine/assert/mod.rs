//! Assertion evaluation: rule sets in, verdicts and an aggregate result out.
//!
//! Evaluation is pure. Malformed rule configuration and missing or
//! misshaped response data both become failing verdicts; nothing here
//! returns an error or panics.

pub mod evaluators;
pub mod rule;

use crate::domain::rules::{
    AggregateResult, AssertionKind, ResponseContext, RuleSet, Verdict,
};

pub use rule::{AssertionRule, RuleFormatError};

/// Evaluates every configured assertion kind in declaration order.
pub fn evaluate_all(rules: &RuleSet, context: &ResponseContext<'_>) -> Vec<Verdict> {
    AssertionKind::ALL
        .iter()
        .filter_map(|kind| {
            rules
                .get(*kind)
                .map(|config| evaluate_rule(*kind, config, context))
        })
        .collect()
}

/// Validates one raw configuration and evaluates it.
pub fn evaluate_rule(
    kind: AssertionKind,
    config: &serde_json::Value,
    context: &ResponseContext<'_>,
) -> Verdict {
    match AssertionRule::parse(kind, config) {
        Ok(rule) => evaluators::evaluate(&rule, context),
        Err(error) => Verdict::fail(error.kind, error.message),
    }
}

/// Reduces verdicts to one pass/fail. No verdicts is a pass.
pub fn reduce(verdicts: &[Verdict]) -> AggregateResult {
    let failures: Vec<&str> = verdicts
        .iter()
        .filter(|verdict| !verdict.passed)
        .map(|verdict| verdict.message.as_str())
        .collect();

    if failures.is_empty() {
        AggregateResult {
            passed: true,
            failure_reason: None,
        }
    } else {
        AggregateResult {
            passed: false,
            failure_reason: Some(failures.join("; ")),
        }
    }
}
