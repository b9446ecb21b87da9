//! The one concrete domain this crate ships out of the box: banking
//! AML/KYC case review. Reason-code tables and jurisdiction-specific
//! mappings are out of scope; this registry supplies only the generic
//! gate/field shape the precedent engine needs to run end to end.
//!
//! Gate field names (`jurisdiction_regime`, `customer_segment`,
//! `channel_family`, `disposition_basis`) are grounded on
//! `examples/original_source/decisiongraph-complete/src/kernel/precedent/
//! comparability_gate.py`'s `extract_gate_facts_from_case` /
//! `extract_gate_facts_from_precedent`.

use std::collections::BTreeMap;

use super::registry::{ComparabilityGate, ComparisonFn, DomainRegistry, FieldDefinition, FieldTier, FieldType};

fn classes(pairs: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
    pairs
        .iter()
        .map(|(name, members)| (name.to_string(), members.iter().map(|m| m.to_string()).collect()))
        .collect()
}

pub fn registry() -> DomainRegistry {
    let jurisdiction_regime = FieldDefinition::new(
        "jurisdiction_regime",
        "Jurisdiction regulatory regime",
        FieldType::Categorical,
        ComparisonFn::EquivalenceClass,
        0.0,
        FieldTier::Structural,
    )
    .unwrap()
    .with_equivalence_classes(classes(&[
        ("fatf_member", &["US", "UK", "EU", "CA", "AU", "JP"]),
        ("fatf_observer", &["SG", "HK", "AE"]),
        ("high_risk", &["IR", "KP", "MM"]),
    ]));

    let customer_segment = FieldDefinition::new(
        "customer_segment",
        "Customer segment",
        FieldType::Categorical,
        ComparisonFn::EquivalenceClass,
        0.0,
        FieldTier::Structural,
    )
    .unwrap()
    .with_equivalence_classes(classes(&[
        ("retail", &["retail_individual", "retail_joint"]),
        ("business", &["smb", "corporate"]),
        ("institutional", &["correspondent_bank", "fund"]),
    ]));

    let channel_family = FieldDefinition::new(
        "channel_family",
        "Transaction channel family",
        FieldType::Categorical,
        ComparisonFn::EquivalenceClass,
        0.0,
        FieldTier::Structural,
    )
    .unwrap()
    .with_equivalence_classes(classes(&[
        ("digital", &["online", "mobile", "api"]),
        ("branch", &["teller", "atm"]),
        ("wire", &["swift", "ach", "fedwire"]),
    ]));

    // disposition_basis is structural by nature: MANDATORY vs DISCRETIONARY
    // review bases are never comparable, so it never gets equivalence
    // classes — the gate in comparability_gate.rs treats any mismatch
    // here as an automatic fail, not a classified fallback.
    let disposition_basis = FieldDefinition::new(
        "disposition_basis",
        "Disposition basis",
        FieldType::Categorical,
        ComparisonFn::Exact,
        0.0,
        FieldTier::Structural,
    )
    .unwrap();

    let risk_score = FieldDefinition::new(
        "risk_score",
        "Composite risk score (0-100)",
        FieldType::Numeric,
        ComparisonFn::DistanceDecay,
        0.25,
        FieldTier::Behavioral,
    )
    .unwrap()
    .with_max_distance(40.0)
    .driver(true);

    let transaction_velocity = FieldDefinition::new(
        "transaction_velocity",
        "Transaction velocity tier",
        FieldType::Ordinal,
        ComparisonFn::Step,
        0.15,
        FieldTier::Behavioral,
    )
    .unwrap()
    .with_ordered_values(vec!["low".into(), "moderate".into(), "elevated".into(), "high".into(), "extreme".into()]);

    let sanctions_match = FieldDefinition::new(
        "sanctions_match",
        "Sanctions list match",
        FieldType::Boolean,
        ComparisonFn::Exact,
        0.30,
        FieldTier::Behavioral,
    )
    .unwrap()
    .driver(true)
    .critical(true);

    let adverse_media_flags = FieldDefinition::new(
        "adverse_media_flags",
        "Adverse media flag set",
        FieldType::Set,
        ComparisonFn::Jaccard,
        0.15,
        FieldTier::Contextual,
    )
    .unwrap();

    let counterparty_country = FieldDefinition::new(
        "counterparty_country",
        "Counterparty country",
        FieldType::Categorical,
        ComparisonFn::Exact,
        0.15,
        FieldTier::Contextual,
    )
    .unwrap();

    DomainRegistry::new("banking_aml", "1")
        .with_field(jurisdiction_regime.clone())
        .with_field(customer_segment.clone())
        .with_field(channel_family.clone())
        .with_field(disposition_basis.clone())
        .with_field(risk_score)
        .with_field(transaction_velocity)
        .with_field(sanctions_match)
        .with_field(adverse_media_flags)
        .with_field(counterparty_country)
        .with_gate(ComparabilityGate::new(jurisdiction_regime.name.clone()))
        .with_gate(ComparabilityGate::new(customer_segment.name.clone()))
        .with_gate(ComparabilityGate::new(channel_family.name.clone()))
        .with_gate(ComparabilityGate::new(disposition_basis.name.clone()))
        .with_pool_minimum(5)
}
