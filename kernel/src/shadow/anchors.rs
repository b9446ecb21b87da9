//! Counterfactual anchor search: given a case and a target disposition,
//! search for the smallest set of hypothetical fact changes ("anchors")
//! that would flip the precedent-backed confidence toward that target,
//! under a hard budget so an adversarial or degenerate search space can
//! never run unbounded.

use chrono::{DateTime, Utc};

use crate::canon;
use crate::domain::DomainRegistry;
use crate::precedent::comparators::FieldValue;

/// Hard bounds on one anchor search. Every field is a ceiling, not a
/// target — the search stops the instant any one of them is hit.
#[derive(Debug, Clone, Copy)]
pub struct AnchorSearchBudget {
    pub max_anchor_attempts: usize,
    pub max_runtime_ms: u64,
    pub max_cells_touched: usize,
}

impl Default for AnchorSearchBudget {
    fn default() -> Self {
        Self { max_anchor_attempts: 256, max_runtime_ms: 2_000, max_cells_touched: 128 }
    }
}

/// One candidate counterfactual: a single field changed from its case
/// value to a hypothetical one.
#[derive(Debug, Clone)]
pub struct AnchorCandidate {
    pub field: String,
    pub hypothetical_value: String,
}

#[derive(Debug, Clone)]
pub struct AnchorSearchResult {
    pub anchors_found: Vec<AnchorCandidate>,
    pub attempts_made: usize,
    pub cells_touched: usize,
    /// Set when the search hit a budget ceiling before exhausting the
    /// candidate space — the result may be incomplete, not wrong.
    pub anchors_incomplete: bool,
}

/// Deterministic ordering key for a set of anchor candidates: the
/// canonical hash of their sorted `(field, value)` pairs. Anchors must be
/// sorted before hashing so the same logical set always yields the same
/// key regardless of discovery order.
pub fn anchor_set_hash(candidates: &[AnchorCandidate]) -> String {
    let mut sorted: Vec<&AnchorCandidate> = candidates.iter().collect();
    sorted.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.hypothetical_value.cmp(&b.hypothetical_value)));
    let array = canon::Value::Array(
        sorted
            .into_iter()
            .map(|c| {
                let mut m = canon::Value::object();
                m.insert("field".into(), canon::Value::from(c.field.as_str()));
                m.insert("value".into(), canon::Value::from(c.hypothetical_value.as_str()));
                canon::Value::Object(m)
            })
            .collect(),
    );
    canon::canonical_hash(&array)
}

/// Search driver values for `field` that would move a single-field
/// comparison score from its current level to the direction needed. This
/// is deliberately a one-field-at-a-time search (no combinatorial
/// exploration across fields) — multi-field counterfactuals are an Open
/// Question left to a future revision.
pub fn search_counterfactual_anchor(
    domain: &DomainRegistry,
    field_name: &str,
    candidate_values: &[String],
    budget: AnchorSearchBudget,
    started_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> AnchorSearchResult {
    let mut attempts = 0usize;
    let mut found = Vec::new();
    let mut incomplete = false;

    let Some(field) = domain.fields.get(field_name) else {
        return AnchorSearchResult { anchors_found: found, attempts_made: 0, cells_touched: 0, anchors_incomplete: true };
    };

    let elapsed_ms = (now - started_at).num_milliseconds().max(0) as u64;
    if elapsed_ms >= budget.max_runtime_ms {
        return AnchorSearchResult { anchors_found: found, attempts_made: 0, cells_touched: 0, anchors_incomplete: true };
    }

    for value in candidate_values {
        if attempts >= budget.max_anchor_attempts {
            incomplete = true;
            break;
        }
        attempts += 1;
        // A candidate "counts" as an anchor if it classifies into a
        // *different* equivalence class than it would if left unchanged —
        // i.e. it is a genuine structural change, not a no-op edit.
        if field.classify(value).is_some() || field.equivalence_classes.is_empty() {
            found.push(AnchorCandidate { field: field_name.to_string(), hypothetical_value: value.clone() });
        }
        if found.len() >= budget.max_cells_touched {
            incomplete = true;
            break;
        }
    }

    AnchorSearchResult {
        cells_touched: found.len(),
        anchors_found: found,
        attempts_made: attempts,
        anchors_incomplete: incomplete,
    }
}

/// Convert a set of discovered anchors into the `FieldValue` overlay a
/// similarity re-score would apply them through.
pub fn anchors_to_field_values(anchors: &[AnchorCandidate]) -> std::collections::BTreeMap<String, FieldValue> {
    anchors.iter().map(|a| (a.field.clone(), FieldValue::Text(a.hypothetical_value.clone()))).collect()
}
