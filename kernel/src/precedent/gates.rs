//! L1: comparability gates. Before any similarity score is computed, every
//! gate field must partition the case and the precedent into the same
//! equivalence class — gates answer "are these even comparable?", never
//! "how similar are these?".
//!
//! Grounded on `examples/original_source/decisiongraph-complete/src/kernel/
//! precedent/comparability_gate.py`. The subtle edge case preserved from
//! there: when a present value cannot be classified into any equivalence
//! class, the gate *passes* — an unclassifiable value is not evidence of
//! incomparability, only of an incomplete taxonomy, so it must not block a
//! precedent lookup. `disposition_basis` carries no equivalence classes at
//! all (MANDATORY and DISCRETIONARY review bases are a structural
//! invariant, never merely "similar"), so its gate falls back to direct
//! equality instead of class comparison.

use std::collections::BTreeMap;

use crate::domain::DomainRegistry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateResult {
    pub gate_field: String,
    pub passed: bool,
    pub case_class: Option<String>,
    pub precedent_class: Option<String>,
    pub fallback_used: bool,
    pub warning: Option<String>,
}

/// Evaluate every comparability gate for `domain` against `case_facts` and
/// `precedent_facts`. Returns `(all_passed, per_gate_results)`.
pub fn evaluate_gates(
    domain: &DomainRegistry,
    case_facts: &BTreeMap<String, String>,
    precedent_facts: &BTreeMap<String, String>,
) -> (bool, Vec<GateResult>) {
    let mut results = Vec::with_capacity(domain.comparability_gates.len());
    let mut all_passed = true;

    for gate in &domain.comparability_gates {
        let field_def = domain.fields.get(&gate.field);
        let case_value = case_facts.get(&gate.field);
        let prec_value = precedent_facts.get(&gate.field);

        let result = match (case_value, prec_value) {
            (None, _) | (_, None) => {
                let fallback = field_def.and_then(|f| f.broadest_class()).map(|s| s.to_string());
                tracing::warn!(gate_field = %gate.field, "gate field missing on one side; falling back to broadest class");
                GateResult {
                    gate_field: gate.field.clone(),
                    passed: true,
                    case_class: fallback.clone(),
                    precedent_class: fallback,
                    fallback_used: true,
                    warning: Some(format!("gate field '{}' missing; broadest-class fallback applied", gate.field)),
                }
            }
            (Some(cv), Some(pv)) => {
                let field_def = match field_def {
                    Some(f) => f,
                    None => {
                        // Gate references a field the registry never defined.
                        all_passed = false;
                        results.push(GateResult {
                            gate_field: gate.field.clone(),
                            passed: false,
                            case_class: None,
                            precedent_class: None,
                            fallback_used: false,
                            warning: Some(format!("gate field '{}' has no FieldDefinition", gate.field)),
                        });
                        continue;
                    }
                };
                if field_def.equivalence_classes.is_empty() {
                    let passed = cv.eq_ignore_ascii_case(pv);
                    GateResult {
                        gate_field: gate.field.clone(),
                        passed,
                        case_class: Some(cv.clone()),
                        precedent_class: Some(pv.clone()),
                        fallback_used: false,
                        warning: None,
                    }
                } else {
                    let case_class = field_def.classify(cv).map(|s| s.to_string());
                    let prec_class = field_def.classify(pv).map(|s| s.to_string());
                    let passed = match (&case_class, &prec_class) {
                        (Some(a), Some(b)) => a == b,
                        // An unclassifiable value cannot prove incomparability.
                        _ => true,
                    };
                    GateResult {
                        gate_field: gate.field.clone(),
                        passed,
                        case_class,
                        precedent_class: prec_class,
                        fallback_used: false,
                        warning: None,
                    }
                }
            }
        };

        if !result.passed {
            all_passed = false;
        }
        results.push(result);
    }

    (all_passed, results)
}

/// Extract the four standard gate facts from a case's fact map, under the
/// virtual gate-field names the registry's gates reference.
pub fn extract_gate_facts(facts: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    const GATE_FIELDS: [&str; 4] = ["jurisdiction_regime", "customer_segment", "channel_family", "disposition_basis"];
    GATE_FIELDS
        .iter()
        .filter_map(|f| facts.get(*f).map(|v| (f.to_string(), v.clone())))
        .collect()
}
