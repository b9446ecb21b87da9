//! Domain registries: per-domain field typing, comparability gates, and
//! thresholds that parameterize the precedent engine. One registry per
//! regulated domain (banking AML/KYC, insurance claims, ...); the engine
//! itself never hardcodes a domain's fields.
//!
//! Grounded on `examples/original_source/decisiongraph-complete/src/kernel/
//! precedent/domain_registry.py`.

pub mod banking_aml;
pub mod registry;

pub use registry::{
    ComparabilityGate, ComparisonFn, ConfidenceLevel, DomainRegistry, FieldDefinition, FieldTier, FieldType,
};

use std::collections::BTreeMap;
use std::sync::OnceLock;

/// The built-in domain registries this crate ships, keyed by domain name.
/// Loading a YAML policy pack that adds further domains at runtime is out
/// of scope here; this is the fixed, code-defined set.
fn builtin_registries() -> &'static BTreeMap<String, DomainRegistry> {
    static REGISTRIES: OnceLock<BTreeMap<String, DomainRegistry>> = OnceLock::new();
    REGISTRIES.get_or_init(|| {
        let mut m = BTreeMap::new();
        let aml = banking_aml::registry();
        m.insert(aml.domain.clone(), aml);
        m
    })
}

pub fn get_registry(domain: &str) -> Option<&'static DomainRegistry> {
    builtin_registries().get(domain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banking_aml_registry_is_registered() {
        assert!(get_registry("banking_aml").is_some());
    }

    #[test]
    fn unknown_domain_returns_none() {
        assert!(get_registry("no_such_domain").is_none());
    }
}
