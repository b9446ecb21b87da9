//! L2 scoring: combine field comparisons into one similarity score per
//! precedent, with driver-aware weighting and non-transferability
//! detection; plus `classify_match_v3`, which labels a precedent's
//! relevance to the case's eventual decision.
//!
//! Grounded on `examples/original_source/decisiongraph-complete/src/
//! decisiongraph/precedent_scorer_v3.py`. "Driver" fields (declared via
//! [`crate::domain::FieldDefinition::driver`]) get a 2x weight multiplier
//! over context fields, and a driver mismatch makes the whole precedent
//! non-transferable rather than merely low-scoring — a precedent where the
//! risk driver doesn't match the case is not weak evidence, it is the
//! wrong precedent.

use std::collections::BTreeMap;

use crate::domain::DomainRegistry;

use super::comparators::{compare_field, FieldValue};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchClass {
    Supporting,
    Contrary,
    Neutral,
}

impl MatchClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchClass::Supporting => "supporting",
            MatchClass::Contrary => "contrary",
            MatchClass::Neutral => "neutral",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimilarityResult {
    pub score: f64,
    pub raw_score: f64,
    pub total_weight: f64,
    pub non_transferable: bool,
    pub non_transferable_reasons: Vec<String>,
    pub matched_drivers: Vec<String>,
    pub mismatched_drivers: Vec<String>,
    pub matched_context: Vec<String>,
    pub field_scores: BTreeMap<String, f64>,
    pub evaluable_fields: Vec<String>,
    pub missing_fields: Vec<String>,
}

/// The threshold above which a per-field score counts as "matched" rather
/// than merely partial, for the matched/mismatched bookkeeping.
const MATCH_THRESHOLD: f64 = 0.999;

/// Score one precedent's scoring fields (i.e. every field the registry
/// does not use as a comparability gate) against the case.
pub fn score_similarity(
    domain: &DomainRegistry,
    case_facts: &BTreeMap<String, FieldValue>,
    precedent_facts: &BTreeMap<String, FieldValue>,
) -> SimilarityResult {
    let mut raw_score = 0.0;
    let mut total_weight = 0.0;
    let mut non_transferable = false;
    let mut non_transferable_reasons = Vec::new();
    let mut matched_drivers = Vec::new();
    let mut mismatched_drivers = Vec::new();
    let mut matched_context = Vec::new();
    let mut field_scores = BTreeMap::new();
    let mut evaluable_fields = Vec::new();
    let mut missing_fields = Vec::new();

    for field in domain.get_scoring_fields() {
        let case_value = case_facts.get(&field.name);
        let precedent_value = precedent_facts.get(&field.name);

        if case_value.is_none() && precedent_value.is_none() {
            continue;
        }

        if field.driver && case_value.is_none() {
            non_transferable = true;
            non_transferable_reasons.push(format!("driver field '{}' absent from case", field.name));
            missing_fields.push(field.name.clone());
            continue;
        }

        if precedent_value.is_none() {
            missing_fields.push(field.name.clone());
            continue;
        }

        if case_value.is_none() && !field.driver {
            missing_fields.push(field.name.clone());
            continue;
        }

        let match_score = compare_field(field, case_value, precedent_value);
        let multiplier = if field.driver { 2.0 } else { 1.0 };

        evaluable_fields.push(field.name.clone());
        field_scores.insert(field.name.clone(), match_score);

        if field.driver && match_score == 0.0 {
            non_transferable = true;
            non_transferable_reasons.push(format!("driver field '{}' mismatches between case and precedent", field.name));
            mismatched_drivers.push(field.name.clone());
        } else if field.driver {
            if match_score >= MATCH_THRESHOLD {
                matched_drivers.push(field.name.clone());
            } else {
                mismatched_drivers.push(field.name.clone());
            }
        } else if match_score >= MATCH_THRESHOLD {
            matched_context.push(field.name.clone());
        }

        raw_score += match_score * field.weight * multiplier;
        total_weight += field.weight * multiplier;
    }

    let score = if total_weight > 0.0 { raw_score / total_weight } else { 0.0 };

    SimilarityResult {
        score,
        raw_score,
        total_weight,
        non_transferable,
        non_transferable_reasons,
        matched_drivers,
        mismatched_drivers,
        matched_context,
        field_scores,
        evaluable_fields,
        missing_fields,
    }
}

/// Classify a precedent's relevance to the case's eventual disposition.
///
/// Rule order (each is a hard short-circuit, evaluated top to bottom):
/// 1. Either disposition is `UNKNOWN` -> neutral.
/// 2. Either disposition is `EDD` and they are not both `EDD` -> neutral.
/// 3. The case and precedent sit on different disposition bases
///    (MANDATORY vs DISCRETIONARY) -> neutral: a basis mismatch is a
///    structural incomparability, never evidence either way.
/// 4. Same disposition -> supporting, unless the precedent was already
///    flagged non-transferable, in which case it stays neutral.
/// 5. `ALLOW` vs `BLOCK` (either order) -> contrary.
/// 6. Otherwise -> neutral.
pub fn classify_match_v3(
    case_disposition: &str,
    precedent_disposition: &str,
    case_basis: &str,
    precedent_basis: &str,
    non_transferable: bool,
) -> MatchClass {
    if case_disposition.eq_ignore_ascii_case("UNKNOWN") || precedent_disposition.eq_ignore_ascii_case("UNKNOWN") {
        return MatchClass::Neutral;
    }
    let case_is_edd = case_disposition.eq_ignore_ascii_case("EDD");
    let precedent_is_edd = precedent_disposition.eq_ignore_ascii_case("EDD");
    if (case_is_edd || precedent_is_edd) && !(case_is_edd && precedent_is_edd) {
        return MatchClass::Neutral;
    }
    if !case_basis.eq_ignore_ascii_case(precedent_basis) {
        return MatchClass::Neutral;
    }
    if case_disposition.eq_ignore_ascii_case(precedent_disposition) {
        return if non_transferable { MatchClass::Neutral } else { MatchClass::Supporting };
    }
    let disjoint_pair = {
        let a = case_disposition.to_ascii_uppercase();
        let b = precedent_disposition.to_ascii_uppercase();
        (a == "ALLOW" && b == "BLOCK") || (a == "BLOCK" && b == "ALLOW")
    };
    if disjoint_pair {
        MatchClass::Contrary
    } else {
        MatchClass::Neutral
    }
}

/// Priority order: sanctions > structuring > adverse_media. Checks both
/// reason-code substrings and boolean-like case facts.
pub fn detect_primary_typology(reason_codes: &[String], case_facts: &BTreeMap<String, String>) -> Option<String> {
    const TYPOLOGIES: [(&str, &[&str]); 3] = [
        ("sanctions", &["sanctions_match"]),
        ("structuring", &["structuring_pattern", "structuring"]),
        ("adverse_media", &["adverse_media_flags", "adverse_media"]),
    ];
    for (typology, flag_fields) in TYPOLOGIES {
        let reason_hit = reason_codes.iter().any(|r| r.to_ascii_lowercase().contains(typology));
        let flag_hit = flag_fields.iter().any(|field| {
            case_facts
                .get(*field)
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "yes" | "1"))
                .unwrap_or(false)
        });
        if reason_hit || flag_hit {
            return Some(typology.to_string());
        }
    }
    None
}
