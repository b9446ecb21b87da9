//! Tri-state evidence evaluation: `Tribool` distinguishes "known false"
//! from "unknown", a distinction evidence-completeness scoring needs and a
//! plain `bool` erases.
//!
//! Grounded on `examples/original_source/decisiongraph-complete/src/kernel/
//! evidence/tribool.py`.

use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tribool {
    True,
    False,
    Unknown,
}

impl Tribool {
    pub fn from_option(value: Option<bool>) -> Self {
        match value {
            Some(true) => Tribool::True,
            Some(false) => Tribool::False,
            None => Tribool::Unknown,
        }
    }

    pub fn is_known(self) -> bool {
        !matches!(self, Tribool::Unknown)
    }

    /// Three-valued AND: `Unknown` propagates unless the other side is
    /// already a hard `False`, matching SQL/Kleene semantics.
    pub fn and(self, other: Tribool) -> Tribool {
        match (self, other) {
            (Tribool::False, _) | (_, Tribool::False) => Tribool::False,
            (Tribool::Unknown, _) | (_, Tribool::Unknown) => Tribool::Unknown,
            (Tribool::True, Tribool::True) => Tribool::True,
        }
    }

    /// Three-valued OR: mirror of `and`.
    pub fn or(self, other: Tribool) -> Tribool {
        match (self, other) {
            (Tribool::True, _) | (_, Tribool::True) => Tribool::True,
            (Tribool::Unknown, _) | (_, Tribool::Unknown) => Tribool::Unknown,
            (Tribool::False, Tribool::False) => Tribool::False,
        }
    }
}

/// One required evidence item and whether it was supplied.
#[derive(Debug, Clone)]
pub struct EvidenceRequirement {
    pub field: String,
    pub present: Tribool,
}

/// Evaluates a set of evidence requirements against what a case actually
/// supplied, used by L3 dimension 4 (evidence completeness) instead of
/// collapsing "we don't know" into "missing".
#[derive(Debug, Clone, Default)]
pub struct EvidenceGate {
    requirements: Vec<EvidenceRequirement>,
}

impl EvidenceGate {
    pub fn new() -> Self {
        Self { requirements: Vec::new() }
    }

    pub fn require(mut self, field: impl Into<String>, present: Tribool) -> Self {
        self.requirements.push(EvidenceRequirement { field: field.into(), present });
        self
    }

    /// Fraction of requirements that are hard-`True`, `Unknown` counted as
    /// neither satisfied nor violated (it is not penalized the way `False`
    /// is, but it does not count toward completeness either).
    pub fn completeness_ratio(&self) -> f64 {
        if self.requirements.is_empty() {
            return 1.0;
        }
        let satisfied = self.requirements.iter().filter(|r| r.present == Tribool::True).count();
        satisfied as f64 / self.requirements.len() as f64
    }

    pub fn missing_fields(&self) -> Vec<&str> {
        self.requirements
            .iter()
            .filter(|r| r.present != Tribool::True)
            .map(|r| r.field.as_str())
            .collect()
    }

    pub fn unknown_fields(&self) -> Vec<&str> {
        self.requirements
            .iter()
            .filter(|r| r.present == Tribool::Unknown)
            .map(|r| r.field.as_str())
            .collect()
    }
}

/// Build an `EvidenceGate` from a field -> supplied-value map, treating a
/// present-and-non-empty string as `True` and an absent key as `Unknown`
/// (not `False` — silence is not proof of absence).
pub fn gate_from_facts(required_fields: &[String], facts: &BTreeMap<String, String>) -> EvidenceGate {
    required_fields.iter().fold(EvidenceGate::new(), |gate, field| {
        let present = match facts.get(field) {
            Some(v) if !v.is_empty() => Tribool::True,
            Some(_) => Tribool::False,
            None => Tribool::Unknown,
        };
        gate.require(field.clone(), present)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_propagates_unknown_unless_false_present() {
        assert_eq!(Tribool::Unknown.and(Tribool::True), Tribool::Unknown);
        assert_eq!(Tribool::Unknown.and(Tribool::False), Tribool::False);
        assert_eq!(Tribool::True.and(Tribool::True), Tribool::True);
    }

    #[test]
    fn or_propagates_unknown_unless_true_present() {
        assert_eq!(Tribool::Unknown.or(Tribool::False), Tribool::Unknown);
        assert_eq!(Tribool::Unknown.or(Tribool::True), Tribool::True);
    }

    #[test]
    fn completeness_ratio_counts_only_hard_true() {
        let gate = EvidenceGate::new()
            .require("a", Tribool::True)
            .require("b", Tribool::Unknown)
            .require("c", Tribool::False);
        assert!((gate.completeness_ratio() - (1.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn gate_from_facts_distinguishes_absent_from_empty() {
        let mut facts = BTreeMap::new();
        facts.insert("risk_score".to_string(), "0.8".to_string());
        facts.insert("adverse_media_flags".to_string(), "".to_string());
        let required = vec!["risk_score".to_string(), "adverse_media_flags".to_string(), "sanctions_match".to_string()];
        let gate = gate_from_facts(&required, &facts);
        assert_eq!(gate.unknown_fields(), vec!["sanctions_match"]);
        assert!(gate.missing_fields().contains(&"adverse_media_flags"));
    }
}
