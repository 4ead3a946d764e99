//! # Error Narrowing
//!
//! A schema violation over a policy document arrives as a flat sequence
//! of raw violations, frequently dozens deep for a single authoring
//! mistake (every `anyOf` branch that failed to match contributes its
//! own). Narrowing reduces that sequence to the one error worth showing,
//! scoped to the enclosing policy.
//!
//! The reduction is an explicit ordered list of strategies, tried in
//! sequence; each inspects the violations and either produces a result
//! or declines. Narrowing is best-effort: if every strategy declines,
//! the failure is logged and the raw first violation is surfaced —
//! validation never crashes on its own error reporting.

use serde_json::Value;

use crate::validate::{RawViolation, ValidationError, UNKNOWN_POLICY};

/// A single narrowing strategy: inspect the violations, produce errors
/// or decline.
pub type NarrowingStrategy = fn(&[RawViolation], &Value) -> Option<Vec<ValidationError>>;

/// Strategies in the order they are tried.
pub const NARROWING_STRATEGIES: &[NarrowingStrategy] =
    &[policy_scoped_specific, first_with_best_match];

/// Reduce raw violations to the errors worth reporting.
///
/// Tries each strategy in [`NARROWING_STRATEGIES`] order; the first
/// non-empty result wins. Exhaustion falls back to the raw first
/// violation so a result is always produced.
pub fn narrow(violations: &[RawViolation], document: &Value) -> Vec<ValidationError> {
    if violations.is_empty() {
        return Vec::new();
    }
    for strategy in NARROWING_STRATEGIES {
        if let Some(errors) = strategy(violations, document) {
            if !errors.is_empty() {
                return errors;
            }
        }
    }
    tracing::warn!(
        violations = violations.len(),
        "error narrowing produced no result, falling back to first raw violation"
    );
    vec![attribute(&violations[0], document)]
}

/// Most specific violation inside the first offending policy.
///
/// Declines when the first violation is not scoped under a policy entry
/// (document-level violations have no policy to attribute).
pub fn policy_scoped_specific(
    violations: &[RawViolation],
    document: &Value,
) -> Option<Vec<ValidationError>> {
    let first = violations.first()?;
    let index = policy_index(&first.instance_path)?;
    let specific = violations
        .iter()
        .filter(|v| policy_index(&v.instance_path) == Some(index))
        .max_by_key(|v| (depth(&v.instance_path), depth(&v.schema_path)))?;
    Some(vec![ValidationError {
        message: specific.message.clone(),
        policy: policy_name_at(document, index),
        instance_path: specific.instance_path.clone(),
    }])
}

/// Fallback: the first raw violation plus the best-match pick over the
/// whole sequence, with a duplicate second element filtered out.
pub fn first_with_best_match(
    violations: &[RawViolation],
    document: &Value,
) -> Option<Vec<ValidationError>> {
    let first = violations.first()?;
    let mut errors = vec![attribute(first, document)];
    if let Some(best) = best_match(violations) {
        if best != first {
            errors.push(attribute(best, document));
        }
    }
    Some(errors)
}

/// Heuristic pick of the most relevant violation: the one that got
/// deepest into the document before failing, ties broken by schema-path
/// depth.
pub fn best_match(violations: &[RawViolation]) -> Option<&RawViolation> {
    violations
        .iter()
        .max_by_key(|v| (depth(&v.instance_path), depth(&v.schema_path)))
}

/// Policy index from an instance path like `/policies/3/filters/0`.
fn policy_index(instance_path: &str) -> Option<usize> {
    instance_path
        .strip_prefix("/policies/")?
        .split('/')
        .next()?
        .parse()
        .ok()
}

fn policy_name_at(document: &Value, index: usize) -> String {
    document
        .get("policies")
        .and_then(Value::as_array)
        .and_then(|policies| policies.get(index))
        .and_then(|policy| policy.get("name"))
        .and_then(Value::as_str)
        .unwrap_or(UNKNOWN_POLICY)
        .to_string()
}

fn depth(pointer: &str) -> usize {
    pointer.split('/').filter(|s| !s.is_empty()).count()
}

fn attribute(violation: &RawViolation, document: &Value) -> ValidationError {
    let policy = policy_index(&violation.instance_path)
        .map(|index| policy_name_at(document, index))
        .unwrap_or_else(|| UNKNOWN_POLICY.to_string());
    ValidationError {
        message: violation.message.clone(),
        policy,
        instance_path: violation.instance_path.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn violation(instance_path: &str, schema_path: &str, message: &str) -> RawViolation {
        RawViolation {
            instance_path: instance_path.to_string(),
            schema_path: schema_path.to_string(),
            message: message.to_string(),
        }
    }

    fn document() -> Value {
        json!({"policies": [
            {"name": "p1", "resource": "ec2"},
            {"name": "p2", "resource": "s3"}
        ]})
    }

    #[test]
    fn specific_strategy_picks_deepest_in_policy_scope() {
        let violations = vec![
            violation("/policies/0", "/properties/policies/items", "entry invalid"),
            violation(
                "/policies/0/filters/0/type",
                "/properties/policies/items/properties/filters",
                "\"taged\" is not valid",
            ),
            violation("/policies/1", "/properties/policies/items", "other entry"),
        ];
        let errors = policy_scoped_specific(&violations, &document()).unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].policy, "p1");
        assert_eq!(errors[0].instance_path, "/policies/0/filters/0/type");
        assert!(errors[0].message.contains("taged"));
    }

    #[test]
    fn specific_strategy_declines_on_document_level_violation() {
        let violations = vec![violation("", "/required", "\"policies\" is required")];
        assert!(policy_scoped_specific(&violations, &document()).is_none());
    }

    #[test]
    fn specific_strategy_unknown_policy_name() {
        let violations = vec![violation("/policies/7/name", "/x", "bad name")];
        let errors = policy_scoped_specific(&violations, &document()).unwrap();
        assert_eq!(errors[0].policy, UNKNOWN_POLICY);
    }

    #[test]
    fn fallback_strategy_keeps_first_and_best() {
        let violations = vec![
            violation("", "/type", "document not object"),
            violation("/policies/1/resource", "/a/b/c", "bad resource"),
        ];
        let errors = first_with_best_match(&violations, &document()).unwrap();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].policy, UNKNOWN_POLICY);
        assert_eq!(errors[1].policy, "p2");
        assert_eq!(errors[1].instance_path, "/policies/1/resource");
    }

    #[test]
    fn fallback_strategy_filters_duplicate_best() {
        let violations = vec![violation("/policies/0/name", "/x", "only one")];
        let errors = first_with_best_match(&violations, &document()).unwrap();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn best_match_prefers_deeper_instance_path() {
        let violations = vec![
            violation("/policies", "/a", "shallow"),
            violation("/policies/0/actions/2", "/a", "deep"),
        ];
        assert_eq!(best_match(&violations).unwrap().message, "deep");
    }

    #[test]
    fn narrow_uses_strategy_order() {
        // Policy-scoped first violation: strategy one wins and produces
        // a single attributed error.
        let violations = vec![
            violation("/policies/0/execution-mode", "/a/b", "bad mode"),
            violation("", "/type", "noise"),
        ];
        let errors = narrow(&violations, &document());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].policy, "p1");
    }

    #[test]
    fn narrow_of_nothing_is_nothing() {
        assert!(narrow(&[], &document()).is_empty());
    }

    #[test]
    fn policy_index_parsing() {
        assert_eq!(policy_index("/policies/3/filters/0"), Some(3));
        assert_eq!(policy_index("/policies/12"), Some(12));
        assert_eq!(policy_index("/variables/x"), None);
        assert_eq!(policy_index(""), None);
        assert_eq!(policy_index("/policies/x"), None);
    }
}
