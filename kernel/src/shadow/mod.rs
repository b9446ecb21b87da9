//! The shadow/simulation layer: run a decision or a policy change against a
//! forked, non-contaminating view of a chain without ever mutating it.
//!
//! Grounded on `examples/original_source/decisiongraph-complete/tests/
//! test_shadow_cells.py` (shadow cell convenience constructors, base-chain
//! immutability) and `tests/test_contamination_prevention.py` (the
//! zero-contamination invariant this module must uphold end to end).

pub mod anchors;
pub mod overlay;
pub mod simulate;

pub use anchors::{search_counterfactual_anchor, AnchorSearchBudget, AnchorSearchResult};
pub use overlay::OverlayContext;
pub use simulate::{simulate_rfa, DeltaReport, ProofOrigin, ProofPacket, SimulationResult};

use crate::cell::{Cell, CellType, Fact, Header, LogicAnchor, Proof, SourceQuality};
use crate::chain::Chain;
use crate::error::Result;

/// Fork a non-contaminating shadow chain from `base`: a fresh in-memory
/// `Chain` bound to the same `graph_id`, seeded with `base`'s current head
/// as its notional ancestor. The shadow chain is never written back to
/// `base`; it exists only for the lifetime of a simulation.
pub fn fork_shadow_chain(base: &Chain) -> Chain {
    let mut shadow = Chain::new(base.graph_id(), base.hash_scheme());
    for cell in base.cells() {
        // `append` re-validates every rule, so replaying the base chain
        // into the fork is itself a proof that the fork starts from an
        // identical, untampered history.
        shadow.append(cell.clone()).expect("base chain cells already passed the commit gate once");
    }
    shadow
}

/// Build a shadow cell that carries `fact` but otherwise mirrors `template`
/// (same graph, hash scheme, and chain link), recomputing `cell_id` from
/// the new content. This never mutates `template`.
pub fn create_shadow_fact(template: &Cell, fact: Fact, system_time: chrono::DateTime<chrono::Utc>) -> Result<Cell> {
    let header = Header {
        schema_version: template.header.schema_version.clone(),
        graph_id: template.header.graph_id.clone(),
        cell_type: CellType::Fact,
        system_time,
        prev_cell_hash: template.cell_id.clone(),
        hash_scheme: template.header.hash_scheme.clone(),
    };
    let anchor = LogicAnchor { rule_id: "shadow".to_string(), rule_logic_hash: template.logic_anchor.rule_logic_hash.clone() };
    crate::cell::build_cell(header, fact, anchor, Vec::new(), Proof::default())
}

/// A shadow-only fact asserting `predicate = object` for `subject`, used
/// when a simulation needs to inject a hypothetical fact without
/// constructing a full [`Fact`] by hand.
pub fn create_shadow_assertion(
    template: &Cell,
    namespace: &str,
    subject: &str,
    predicate: &str,
    object: &str,
    confidence: &str,
    system_time: chrono::DateTime<chrono::Utc>,
) -> Result<Cell> {
    let fact = Fact {
        namespace: namespace.to_string(),
        subject: subject.to_string(),
        predicate: predicate.to_string(),
        object: object.to_string(),
        confidence: confidence.to_string(),
        source_quality: SourceQuality::Inferred,
        valid_from: Some(system_time),
        valid_to: None,
    };
    create_shadow_fact(template, fact, system_time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{create_genesis_cell, HASH_SCHEME_CANONICAL};
    use chrono::TimeZone;

    fn now() -> chrono::DateTime<chrono::Utc> {
        chrono::Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn fork_does_not_mutate_base() {
        let mut base = Chain::new("g1", HASH_SCHEME_CANONICAL);
        let g = create_genesis_cell("g1".to_string(), HASH_SCHEME_CANONICAL, "root", "system:test", now()).unwrap();
        base.append(g).unwrap();
        let base_len_before = base.len();
        let shadow = fork_shadow_chain(&base);
        assert_eq!(shadow.len(), base.len());
        assert_eq!(base.len(), base_len_before);
    }

    #[test]
    fn shadow_assertion_has_distinct_id_from_template() {
        let g = create_genesis_cell("g1".to_string(), HASH_SCHEME_CANONICAL, "root", "system:test", now()).unwrap();
        let shadow = create_shadow_assertion(&g, "banking_aml.case", "case:CA-1", "risk_level", "High", "0.9", now()).unwrap();
        assert_ne!(shadow.cell_id, g.cell_id);
        assert_eq!(shadow.header.prev_cell_hash, g.cell_id);
    }
}
