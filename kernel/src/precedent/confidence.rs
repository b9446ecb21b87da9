//! L3: governed confidence. Combines four independent dimensions — pool
//! adequacy, similarity quality, outcome consistency, evidence
//! completeness — into one governed confidence level, never a raw blended
//! number. `final_level = min(dimensions)`, then five hard rules can
//! override that result outright.
//!
//! Grounded on `examples/original_source/decisiongraph-complete/src/
//! decisiongraph/governed_confidence.py`, with its exact numeric
//! thresholds preserved.

use crate::domain::ConfidenceLevel;

#[derive(Debug, Clone)]
pub struct ConfidenceDimension {
    pub name: String,
    pub value: f64,
    pub level: ConfidenceLevel,
    pub bottleneck: bool,
    pub note: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GovernedConfidenceResult {
    pub level: ConfidenceLevel,
    pub numeric_value: f64,
    pub dimensions: Vec<ConfidenceDimension>,
    pub hard_rule_applied: Option<String>,
    pub bottleneck: String,
}

fn score_pool_adequacy(pool_size: usize) -> ConfidenceDimension {
    let level = match pool_size {
        0 => ConfidenceLevel::None,
        1..=4 => ConfidenceLevel::Low,
        5..=14 => ConfidenceLevel::Moderate,
        15..=49 => ConfidenceLevel::High,
        _ => ConfidenceLevel::VeryHigh,
    };
    ConfidenceDimension {
        name: "pool_adequacy".to_string(),
        value: pool_size as f64,
        level,
        bottleneck: false,
        note: None,
    }
}

fn score_similarity_quality(average_similarity: f64) -> ConfidenceDimension {
    let level = if average_similarity < 0.50 {
        ConfidenceLevel::Low
    } else if average_similarity < 0.70 {
        ConfidenceLevel::Moderate
    } else if average_similarity < 0.85 {
        ConfidenceLevel::High
    } else {
        ConfidenceLevel::VeryHigh
    };
    ConfidenceDimension {
        name: "similarity_quality".to_string(),
        value: average_similarity,
        level,
        bottleneck: false,
        note: None,
    }
}

fn score_outcome_consistency(terminal_precedents: usize, agreement_ratio: f64) -> ConfidenceDimension {
    if terminal_precedents == 0 {
        return ConfidenceDimension {
            name: "outcome_consistency".to_string(),
            value: 0.0,
            level: ConfidenceLevel::Moderate,
            bottleneck: false,
            note: Some("no terminal precedents available; treated as neutral".to_string()),
        };
    }
    let level = if agreement_ratio < 0.60 {
        ConfidenceLevel::Low
    } else if agreement_ratio < 0.80 {
        ConfidenceLevel::Moderate
    } else if agreement_ratio < 0.95 {
        ConfidenceLevel::High
    } else {
        ConfidenceLevel::VeryHigh
    };
    ConfidenceDimension {
        name: "outcome_consistency".to_string(),
        value: agreement_ratio,
        level,
        bottleneck: false,
        note: None,
    }
}

fn score_evidence_completeness(required_fields: &[String], missing_fields: &[String], critical_fields: &[String]) -> ConfidenceDimension {
    if required_fields.is_empty() {
        return ConfidenceDimension {
            name: "evidence_completeness".to_string(),
            value: 1.0,
            level: ConfidenceLevel::VeryHigh,
            bottleneck: false,
            note: None,
        };
    }
    let missing_critical: Vec<&String> = missing_fields.iter().filter(|f| critical_fields.contains(f)).collect();
    let completeness = 1.0 - (missing_fields.len() as f64 / required_fields.len() as f64);
    if !missing_critical.is_empty() {
        let mut names: Vec<String> = missing_critical.into_iter().cloned().collect();
        names.sort();
        return ConfidenceDimension {
            name: "evidence_completeness".to_string(),
            value: completeness,
            level: ConfidenceLevel::Low,
            bottleneck: false,
            note: Some(format!("missing critical field(s): {}", names.join(", "))),
        };
    }
    let level = if completeness < 0.80 {
        ConfidenceLevel::Low
    } else if completeness < 0.90 {
        ConfidenceLevel::Moderate
    } else if completeness < 0.95 {
        ConfidenceLevel::High
    } else {
        ConfidenceLevel::VeryHigh
    };
    let note = if level == ConfidenceLevel::Low {
        let mut names = missing_fields.clone();
        names.sort();
        Some(format!("missing field(s): {}", names.join(", ")))
    } else {
        None
    };
    ConfidenceDimension { name: "evidence_completeness".to_string(), value: completeness, level, bottleneck: false, note }
}

pub struct GovernedConfidenceInput<'a> {
    pub pool_size: usize,
    pub pool_minimum: usize,
    pub average_similarity: f64,
    pub terminal_precedents: usize,
    pub decisive_precedents: usize,
    pub agreement_ratio: f64,
    pub required_fields: &'a [String],
    pub missing_fields: &'a [String],
    pub critical_fields: &'a [String],
}

/// Compute the governed confidence result for one precedent-backed
/// judgment. Hard rules are applied in order and short-circuit; the last
/// one considered is the pool-minimum cap, which runs only if none of the
/// earlier rules fired.
pub fn compute_governed_confidence(input: &GovernedConfidenceInput) -> GovernedConfidenceResult {
    let mut dimensions = vec![
        score_pool_adequacy(input.pool_size),
        score_similarity_quality(input.average_similarity),
        score_outcome_consistency(input.terminal_precedents, input.agreement_ratio),
        score_evidence_completeness(input.required_fields, input.missing_fields, input.critical_fields),
    ];

    let mut hard_rule_applied = None;
    let mut level = None;

    if input.pool_size == 0 {
        level = Some(ConfidenceLevel::None);
        hard_rule_applied = Some("empty_precedent_pool".to_string());
    } else if input.average_similarity < 0.50 {
        level = Some(ConfidenceLevel::Low);
        hard_rule_applied = Some("similarity_below_floor".to_string());
    } else if input.missing_fields.iter().any(|f| input.critical_fields.contains(f)) {
        level = Some(ConfidenceLevel::Low);
        hard_rule_applied = Some("missing_critical_field".to_string());
    } else if input.decisive_precedents == 0 {
        level = Some(ConfidenceLevel::Moderate);
        hard_rule_applied = Some("no_decisive_precedents".to_string());
    } else if input.pool_size < input.pool_minimum {
        level = Some(ConfidenceLevel::Low);
        hard_rule_applied = Some("pool_below_minimum".to_string());
    }

    let final_level = level.unwrap_or_else(|| dimensions.iter().map(|d| d.level).min().unwrap());

    let bottleneck_index = dimensions
        .iter()
        .enumerate()
        .min_by_key(|(_, d)| d.level)
        .map(|(i, _)| i)
        .unwrap_or(0);
    dimensions[bottleneck_index].bottleneck = true;
    let bottleneck_name = dimensions[bottleneck_index].name.clone();

    GovernedConfidenceResult {
        level: final_level,
        numeric_value: final_level.numeric_value(),
        dimensions,
        hard_rule_applied,
        bottleneck: bottleneck_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_input() -> (Vec<String>, Vec<String>, Vec<String>) {
        (vec!["a".to_string(), "b".to_string()], vec![], vec![])
    }

    #[test]
    fn empty_pool_forces_none() {
        let (required, missing, critical) = base_input();
        let input = GovernedConfidenceInput {
            pool_size: 0,
            pool_minimum: 5,
            average_similarity: 0.9,
            terminal_precedents: 3,
            decisive_precedents: 3,
            agreement_ratio: 0.9,
            required_fields: &required,
            missing_fields: &missing,
            critical_fields: &critical,
        };
        let result = compute_governed_confidence(&input);
        assert_eq!(result.level, ConfidenceLevel::None);
        assert_eq!(result.hard_rule_applied.as_deref(), Some("empty_precedent_pool"));
    }

    #[test]
    fn low_average_similarity_caps_at_low() {
        let (required, missing, critical) = base_input();
        let input = GovernedConfidenceInput {
            pool_size: 20,
            pool_minimum: 5,
            average_similarity: 0.3,
            terminal_precedents: 10,
            decisive_precedents: 10,
            agreement_ratio: 0.9,
            required_fields: &required,
            missing_fields: &missing,
            critical_fields: &critical,
        };
        let result = compute_governed_confidence(&input);
        assert_eq!(result.level, ConfidenceLevel::Low);
    }

    #[test]
    fn missing_critical_field_caps_at_low() {
        let required = vec!["sanctions_match".to_string()];
        let missing = vec!["sanctions_match".to_string()];
        let critical = vec!["sanctions_match".to_string()];
        let input = GovernedConfidenceInput {
            pool_size: 20,
            pool_minimum: 5,
            average_similarity: 0.9,
            terminal_precedents: 10,
            decisive_precedents: 10,
            agreement_ratio: 0.9,
            required_fields: &required,
            missing_fields: &missing,
            critical_fields: &critical,
        };
        let result = compute_governed_confidence(&input);
        assert_eq!(result.level, ConfidenceLevel::Low);
        assert_eq!(result.hard_rule_applied.as_deref(), Some("missing_critical_field"));
    }

    #[test]
    fn zero_decisive_precedents_caps_at_moderate() {
        let (required, missing, critical) = base_input();
        let input = GovernedConfidenceInput {
            pool_size: 20,
            pool_minimum: 5,
            average_similarity: 0.9,
            terminal_precedents: 10,
            decisive_precedents: 0,
            agreement_ratio: 0.9,
            required_fields: &required,
            missing_fields: &missing,
            critical_fields: &critical,
        };
        let result = compute_governed_confidence(&input);
        assert_eq!(result.level, ConfidenceLevel::Moderate);
        assert_eq!(result.hard_rule_applied.as_deref(), Some("no_decisive_precedents"));
    }

    #[test]
    fn pool_below_minimum_caps_at_low() {
        let (required, missing, critical) = base_input();
        let input = GovernedConfidenceInput {
            pool_size: 3,
            pool_minimum: 5,
            average_similarity: 0.9,
            terminal_precedents: 3,
            decisive_precedents: 3,
            agreement_ratio: 0.9,
            required_fields: &required,
            missing_fields: &missing,
            critical_fields: &critical,
        };
        let result = compute_governed_confidence(&input);
        assert_eq!(result.level, ConfidenceLevel::Low);
        assert_eq!(result.hard_rule_applied.as_deref(), Some("pool_below_minimum"));
    }

    #[test]
    fn healthy_inputs_take_the_minimum_dimension_with_no_hard_rule() {
        let (required, missing, critical) = base_input();
        let input = GovernedConfidenceInput {
            pool_size: 60,
            pool_minimum: 5,
            average_similarity: 0.95,
            terminal_precedents: 40,
            decisive_precedents: 40,
            agreement_ratio: 0.55,
            required_fields: &required,
            missing_fields: &missing,
            critical_fields: &critical,
        };
        let result = compute_governed_confidence(&input);
        assert!(result.hard_rule_applied.is_none());
        // agreement_ratio 0.55 -> outcome_consistency is Low, the bottleneck.
        assert_eq!(result.level, ConfidenceLevel::Low);
        assert_eq!(result.bottleneck, "outcome_consistency");
    }

    #[test]
    fn numeric_value_matches_the_frozen_mapping() {
        assert_eq!(ConfidenceLevel::None.numeric_value(), 0.0);
        assert_eq!(ConfidenceLevel::Low.numeric_value(), 0.25);
        assert_eq!(ConfidenceLevel::Moderate.numeric_value(), 0.50);
        assert_eq!(ConfidenceLevel::High.numeric_value(), 0.75);
        assert_eq!(ConfidenceLevel::VeryHigh.numeric_value(), 0.95);
    }
}
