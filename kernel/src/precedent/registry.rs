//! `PrecedentRegistry`: a stateless query layer over `JUDGMENT` cells in a
//! chain. Always rebuilds from chain state — no caching, because the chain
//! is the only source of truth and a cache could silently diverge from it
//! after a WAL-level rollback or a fork.
//!
//! Grounded on `examples/original_source/decisiongraph-complete/src/kernel/
//! precedent/precedent_registry.py`'s module docstring (the
//! "WitnessRegistry pattern": stateless, chain-sourced, bitemporal via
//! `header.system_time <= evaluated_at`, namespace-prefix scoped).

use chrono::{DateTime, Utc};

use crate::cell::{Cell, CellType};
use crate::chain::Chain;
use crate::judgment::{is_judgment_cell, parse_judgment_payload, JudgmentPayload};

/// Parameters for a precedent lookup.
pub struct PrecedentQuery<'a> {
    pub namespace_prefix: &'a str,
    pub as_of: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PrecedentStatistics {
    pub total: usize,
    pub terminal: usize,
    pub by_disposition: Vec<(String, usize)>,
    pub appealed: usize,
    pub overturned: usize,
}

/// A stateless view over a `Chain`'s `JUDGMENT` cells. Holds only a
/// reference; every query re-scans the chain, so results always reflect
/// its current state.
pub struct PrecedentRegistry<'a> {
    chain: &'a Chain,
}

impl<'a> PrecedentRegistry<'a> {
    pub fn new(chain: &'a Chain) -> Self {
        Self { chain }
    }

    /// Every judgment cell visible as of `query.as_of`, scoped to
    /// `query.namespace_prefix`, paired with its parsed payload. Cells
    /// whose payload fails to parse are skipped rather than propagated as
    /// an error — a precedent search should degrade, not abort, when one
    /// historical record is malformed.
    pub fn find_precedents(&self, query: &PrecedentQuery) -> Vec<(&'a Cell, JudgmentPayload)> {
        self.chain
            .cells()
            .iter()
            .filter(|c| is_judgment_cell(c))
            .filter(|c| c.header.system_time <= query.as_of)
            .filter(|c| c.fact.namespace.starts_with(query.namespace_prefix))
            .filter_map(|c| parse_judgment_payload(c).ok().map(|p| (c, p)))
            .collect()
    }

    pub fn get_statistics(&self, query: &PrecedentQuery) -> PrecedentStatistics {
        let precedents = self.find_precedents(query);
        let total = precedents.len();
        let terminal = precedents
            .iter()
            .filter(|(_, p)| matches!(p.disposition.as_str(), "ALLOW" | "BLOCK"))
            .count();
        let appealed = precedents
            .iter()
            .filter(|(_, p)| matches!(p.appeal_status.as_deref(), Some("appealed") | Some("overturned")))
            .count();
        let overturned = precedents.iter().filter(|(_, p)| p.appeal_status.as_deref() == Some("overturned")).count();
        let mut counts: Vec<(String, usize)> = Vec::new();
        for (_, payload) in &precedents {
            if let Some(entry) = counts.iter_mut().find(|(d, _)| d == &payload.disposition) {
                entry.1 += 1;
            } else {
                counts.push((payload.disposition.clone(), 1));
            }
        }
        counts.sort();
        PrecedentStatistics { total, terminal, by_disposition: counts, appealed, overturned }
    }

    /// Tier-0 exact match: precedents whose judgment was rendered against
    /// exactly this case fingerprint.
    pub fn find_by_fingerprint(&self, fingerprint_hash: &str, query: &PrecedentQuery) -> Vec<(&'a Cell, JudgmentPayload)> {
        self.find_precedents(query)
            .into_iter()
            .filter(|(_, p)| p.fingerprint_hash.as_deref() == Some(fingerprint_hash))
            .collect()
    }

    /// Precedents whose reason codes overlap any of `codes`, case-insensitively.
    pub fn find_by_exclusion_codes(&self, codes: &[String], query: &PrecedentQuery) -> Vec<(&'a Cell, JudgmentPayload)> {
        self.find_precedents(query)
            .into_iter()
            .filter(|(_, p)| p.reason_codes.iter().any(|c| codes.iter().any(|code| code.eq_ignore_ascii_case(c))))
            .collect()
    }

    pub fn find_by_type(&self, cell_type: CellType) -> Vec<&'a Cell> {
        self.chain.find_by_type(cell_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{create_genesis_cell, HASH_SCHEME_CANONICAL};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    fn judgment_child(graph_id: &str, prev: &Cell, namespace: &str, object: &str, when: DateTime<Utc>) -> Cell {
        let header = crate::cell::Header {
            schema_version: "1".to_string(),
            graph_id: graph_id.to_string(),
            cell_type: CellType::Judgment,
            system_time: when,
            prev_cell_hash: prev.cell_id.clone(),
            hash_scheme: HASH_SCHEME_CANONICAL.to_string(),
        };
        let fact = crate::cell::Fact {
            namespace: namespace.to_string(),
            subject: "case:CA-1".to_string(),
            predicate: "judgment".to_string(),
            object: object.to_string(),
            confidence: "1.0".to_string(),
            source_quality: crate::cell::SourceQuality::Verified,
            valid_from: Some(when),
            valid_to: None,
        };
        let anchor = crate::cell::LogicAnchor { rule_id: "r1".to_string(), rule_logic_hash: "abc".to_string() };
        crate::cell::build_cell(header, fact, anchor, Vec::new(), crate::cell::Proof::default()).unwrap()
    }

    #[test]
    fn finds_precedents_within_namespace_and_as_of() {
        let mut chain = Chain::new("g1", HASH_SCHEME_CANONICAL);
        let g = create_genesis_cell("g1".to_string(), HASH_SCHEME_CANONICAL, "root", "system:test", now()).unwrap();
        chain.append(g.clone()).unwrap();
        let j1 = judgment_child("g1", &g, "banking_aml.case", "BLOCK|MANDATORY|sanctions_hit", now());
        chain.append(j1).unwrap();

        let registry = PrecedentRegistry::new(&chain);
        let query = PrecedentQuery { namespace_prefix: "banking_aml", as_of: now() };
        let precedents = registry.find_precedents(&query);
        assert_eq!(precedents.len(), 1);
        assert_eq!(precedents[0].1.disposition, "BLOCK");
    }

    #[test]
    fn statistics_count_terminal_dispositions() {
        let mut chain = Chain::new("g1", HASH_SCHEME_CANONICAL);
        let g = create_genesis_cell("g1".to_string(), HASH_SCHEME_CANONICAL, "root", "system:test", now()).unwrap();
        chain.append(g.clone()).unwrap();
        let j1 = judgment_child("g1", &g, "banking_aml.case", "BLOCK|MANDATORY|x", now());
        let j1_id = j1.cell_id.clone();
        chain.append(j1).unwrap();
        let j2 = {
            let prev = chain.get(&j1_id).unwrap();
            judgment_child("g1", prev, "banking_aml.case", "ALLOW|MANDATORY|y", now())
        };
        chain.append(j2).unwrap();

        let registry = PrecedentRegistry::new(&chain);
        let query = PrecedentQuery { namespace_prefix: "banking_aml", as_of: now() };
        let stats = registry.get_statistics(&query);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.terminal, 2);
        assert_eq!(stats.appealed, 0);
        assert_eq!(stats.overturned, 0);
    }

    #[test]
    fn finds_precedent_by_exact_fingerprint() {
        let mut chain = Chain::new("g1", HASH_SCHEME_CANONICAL);
        let g = create_genesis_cell("g1".to_string(), HASH_SCHEME_CANONICAL, "root", "system:test", now()).unwrap();
        chain.append(g.clone()).unwrap();
        let j1 = judgment_child("g1", &g, "banking_aml.case", "BLOCK|MANDATORY|sanctions_hit|MANDATORY_SAR|fp-1", now());
        let j1_id = j1.cell_id.clone();
        chain.append(j1).unwrap();
        let j2 = {
            let prev = chain.get(&j1_id).unwrap();
            judgment_child("g1", prev, "banking_aml.case", "ALLOW|MANDATORY|y|NONE|fp-2", now())
        };
        chain.append(j2).unwrap();

        let registry = PrecedentRegistry::new(&chain);
        let query = PrecedentQuery { namespace_prefix: "banking_aml", as_of: now() };
        let matches = registry.find_by_fingerprint("fp-2", &query);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].1.disposition, "ALLOW");
    }

    #[test]
    fn finds_precedents_by_overlapping_exclusion_codes() {
        let mut chain = Chain::new("g1", HASH_SCHEME_CANONICAL);
        let g = create_genesis_cell("g1".to_string(), HASH_SCHEME_CANONICAL, "root", "system:test", now()).unwrap();
        chain.append(g.clone()).unwrap();
        let j1 = judgment_child("g1", &g, "banking_aml.case", "BLOCK|MANDATORY|sanctions_hit,structuring", now());
        let j1_id = j1.cell_id.clone();
        chain.append(j1).unwrap();
        let j2 = {
            let prev = chain.get(&j1_id).unwrap();
            judgment_child("g1", prev, "banking_aml.case", "ALLOW|MANDATORY|low_risk", now())
        };
        chain.append(j2).unwrap();

        let registry = PrecedentRegistry::new(&chain);
        let query = PrecedentQuery { namespace_prefix: "banking_aml", as_of: now() };
        let matches = registry.find_by_exclusion_codes(&["structuring".to_string()], &query);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].1.disposition, "BLOCK");
    }

    #[test]
    fn statistics_count_appealed_and_overturned() {
        let mut chain = Chain::new("g1", HASH_SCHEME_CANONICAL);
        let g = create_genesis_cell("g1".to_string(), HASH_SCHEME_CANONICAL, "root", "system:test", now()).unwrap();
        chain.append(g.clone()).unwrap();
        let j1 = judgment_child("g1", &g, "banking_aml.case", "BLOCK|MANDATORY|x|NONE|fp-1|US|reviewer|banking_aml|overturned", now());
        let j1_id = j1.cell_id.clone();
        chain.append(j1).unwrap();
        let j2 = {
            let prev = chain.get(&j1_id).unwrap();
            judgment_child("g1", prev, "banking_aml.case", "ALLOW|MANDATORY|y|NONE|fp-2|US|reviewer|banking_aml|appealed", now())
        };
        chain.append(j2).unwrap();

        let registry = PrecedentRegistry::new(&chain);
        let query = PrecedentQuery { namespace_prefix: "banking_aml", as_of: now() };
        let stats = registry.get_statistics(&query);
        assert_eq!(stats.appealed, 2);
        assert_eq!(stats.overturned, 1);
    }
}
