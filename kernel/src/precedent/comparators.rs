//! L2 field comparators: five typed similarity primitives, dispatched by a
//! field's declared [`crate::domain::ComparisonFn`].
//!
//! Grounded on `examples/original_source/decisiongraph-complete/src/kernel/
//! precedent/field_comparators.py`, translated formula-for-formula.

use std::collections::BTreeSet;

use crate::domain::{ComparisonFn, FieldDefinition};

/// Case-insensitive string equality. `0.0` if either value is absent.
pub fn compare_exact(case_value: Option<&str>, precedent_value: Option<&str>) -> f64 {
    match (case_value, precedent_value) {
        (Some(a), Some(b)) => {
            if a.eq_ignore_ascii_case(b) {
                1.0
            } else {
                0.0
            }
        }
        _ => 0.0,
    }
}

/// Equivalence-class membership. Falls back to exact match if either value
/// is unclassifiable under `field`.
pub fn compare_equivalence_class(field: &FieldDefinition, case_value: Option<&str>, precedent_value: Option<&str>) -> f64 {
    match (case_value, precedent_value) {
        (Some(a), Some(b)) => match (field.classify(a), field.classify(b)) {
            (Some(ca), Some(cb)) => {
                if ca == cb {
                    1.0
                } else {
                    0.0
                }
            }
            _ => compare_exact(Some(a), Some(b)),
        },
        _ => 0.0,
    }
}

/// `max(0, 1 - |a - b| / max_distance)`. When `max_distance <= 0`, falls
/// back to an exact-equality check (there is no meaningful decay curve to
/// compute).
pub fn compare_distance_decay(max_distance: f64, case_value: Option<f64>, precedent_value: Option<f64>) -> f64 {
    match (case_value, precedent_value) {
        (Some(a), Some(b)) => {
            if max_distance <= 0.0 {
                return if a == b { 1.0 } else { 0.0 };
            }
            (1.0 - (a - b).abs() / max_distance).max(0.0)
        }
        _ => 0.0,
    }
}

/// Ordered-list index distance, normalized by the list length. Falls back
/// to exact match if a value is not present in the declared order.
pub fn compare_step(ordered_values: &[String], case_value: Option<&str>, precedent_value: Option<&str>) -> f64 {
    match (case_value, precedent_value) {
        (Some(a), Some(b)) => {
            let ia = ordered_values.iter().position(|v| v.eq_ignore_ascii_case(a));
            let ib = ordered_values.iter().position(|v| v.eq_ignore_ascii_case(b));
            match (ia, ib) {
                (Some(ia), Some(ib)) if ordered_values.len() > 1 => {
                    let max_index = (ordered_values.len() - 1) as f64;
                    (1.0 - (ia as f64 - ib as f64).abs() / max_index).max(0.0)
                }
                _ => compare_exact(Some(a), Some(b)),
            }
        }
        _ => 0.0,
    }
}

/// Jaccard similarity over two sets; both-empty is defined as perfectly
/// similar (`1.0`), since "nothing vs nothing" is not evidence of
/// difference.
pub fn compare_jaccard(case_value: &BTreeSet<String>, precedent_value: &BTreeSet<String>) -> f64 {
    if case_value.is_empty() && precedent_value.is_empty() {
        return 1.0;
    }
    let intersection = case_value.intersection(precedent_value).count();
    let union = case_value.union(precedent_value).count();
    if union == 0 {
        1.0
    } else {
        intersection as f64 / union as f64
    }
}

/// A loosely-typed field value as used by the scorer, before the
/// comparator-specific typed form is extracted.
#[derive(Debug, Clone)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Set(BTreeSet<String>),
}

impl FieldValue {
    fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    fn as_set(&self) -> Option<&BTreeSet<String>> {
        match self {
            FieldValue::Set(s) => Some(s),
            _ => None,
        }
    }
}

/// Dispatch to the correct comparator for `field`.
pub fn compare_field(field: &FieldDefinition, case_value: Option<&FieldValue>, precedent_value: Option<&FieldValue>) -> f64 {
    match field.comparison {
        ComparisonFn::Exact => compare_exact(
            case_value.and_then(FieldValue::as_str),
            precedent_value.and_then(FieldValue::as_str),
        ),
        ComparisonFn::EquivalenceClass => match (case_value.and_then(FieldValue::as_str), precedent_value.and_then(FieldValue::as_str)) {
            (Some(a), Some(b)) => compare_equivalence_class(field, Some(a), Some(b)),
            _ => 0.0,
        },
        ComparisonFn::DistanceDecay => compare_distance_decay(
            field.max_distance,
            case_value.and_then(FieldValue::as_f64),
            precedent_value.and_then(FieldValue::as_f64),
        ),
        ComparisonFn::Step => compare_step(
            &field.ordered_values,
            case_value.and_then(FieldValue::as_str),
            precedent_value.and_then(FieldValue::as_str),
        ),
        ComparisonFn::Jaccard => {
            let empty = BTreeSet::new();
            let a = case_value.and_then(FieldValue::as_set).unwrap_or(&empty);
            let b = precedent_value.and_then(FieldValue::as_set).unwrap_or(&empty);
            compare_jaccard(a, b)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_is_case_insensitive() {
        assert_eq!(compare_exact(Some("ALLOW"), Some("allow")), 1.0);
        assert_eq!(compare_exact(Some("ALLOW"), Some("block")), 0.0);
        assert_eq!(compare_exact(None, Some("allow")), 0.0);
    }

    #[test]
    fn distance_decay_scales_linearly() {
        assert_eq!(compare_distance_decay(40.0, Some(50.0), Some(50.0)), 1.0);
        assert_eq!(compare_distance_decay(40.0, Some(50.0), Some(30.0)), 0.5);
        assert_eq!(compare_distance_decay(40.0, Some(50.0), Some(10.0)), 0.0);
    }

    #[test]
    fn distance_decay_falls_back_to_exact_when_max_distance_non_positive() {
        assert_eq!(compare_distance_decay(0.0, Some(5.0), Some(5.0)), 1.0);
        assert_eq!(compare_distance_decay(0.0, Some(5.0), Some(6.0)), 0.0);
    }

    #[test]
    fn step_falls_back_to_exact_for_unknown_value() {
        let order = vec!["low".to_string(), "moderate".to_string(), "high".to_string()];
        assert_eq!(compare_step(&order, Some("unknown"), Some("low")), 0.0);
        assert_eq!(compare_step(&order, Some("unknown"), Some("unknown")), 1.0);
    }

    #[test]
    fn step_scales_by_index_distance() {
        let order = vec!["low".to_string(), "moderate".to_string(), "high".to_string()];
        assert_eq!(compare_step(&order, Some("low"), Some("high")), 0.0);
        assert_eq!(compare_step(&order, Some("low"), Some("moderate")), 0.5);
    }

    #[test]
    fn jaccard_both_empty_is_perfect_similarity() {
        let a = BTreeSet::new();
        let b = BTreeSet::new();
        assert_eq!(compare_jaccard(&a, &b), 1.0);
    }

    #[test]
    fn jaccard_computes_intersection_over_union() {
        let a: BTreeSet<String> = ["x", "y"].iter().map(|s| s.to_string()).collect();
        let b: BTreeSet<String> = ["y", "z"].iter().map(|s| s.to_string()).collect();
        assert_eq!(compare_jaccard(&a, &b), 1.0 / 3.0);
    }
}
