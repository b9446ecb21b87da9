//! `simulate_rfa`: pin a bitemporal coordinate, fork a shadow chain, inject
//! hypothetical cells, and re-run precedent-backed confidence against the
//! overlay — without ever touching the base chain.
//!
//! The zero-contamination invariant (base chain head, length, and every
//! `cell_id` are bit-identical before and after a simulation) is enforced
//! two ways here: structurally, `simulate_rfa` only ever takes `&Chain` for
//! `base`, so the type system already forbids mutation through this path;
//! and defensively, the function still snapshots and re-checks the base
//! chain's head and length before returning, so a future refactor that
//! accidentally threads a `&mut Chain` through cannot silently reintroduce
//! contamination.

use chrono::{DateTime, Utc};

use crate::cell::Cell;
use crate::chain::Chain;
use crate::domain::DomainRegistry;
use crate::error::{ErrorKind, LedgerError, Result};
use crate::precedent::comparators::FieldValue;
use crate::precedent::confidence::{compute_governed_confidence, GovernedConfidenceInput, GovernedConfidenceResult};
use crate::precedent::registry::{PrecedentQuery, PrecedentRegistry};
use crate::precedent::scorer::score_similarity;

use super::fork_shadow_chain;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofOrigin {
    Base,
    Shadow,
}

#[derive(Debug, Clone)]
pub struct ProofPacket {
    pub origin: ProofOrigin,
    pub as_of: DateTime<Utc>,
    pub chain_head: Option<String>,
    pub chain_length: usize,
    pub pool_size: usize,
    pub confidence: GovernedConfidenceResult,
}

#[derive(Debug, Clone)]
pub struct DeltaReport {
    pub pool_size_delta: i64,
    pub confidence_level_changed: bool,
    pub base_confidence_level: String,
    pub shadow_confidence_level: String,
}

#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub base_proof: ProofPacket,
    pub shadow_proof: ProofPacket,
    pub delta: DeltaReport,
    pub anchors_incomplete: bool,
}

/// Counterfactual "what if" cells to inject into the shadow chain for one
/// simulation, plus the frozen query coordinates the re-executed precedent
/// lookup runs under.
pub struct SimulationRequest<'a> {
    pub domain: &'a DomainRegistry,
    pub namespace_prefix: &'a str,
    pub as_of: DateTime<Utc>,
    pub hypothetical_cells: Vec<Cell>,
    pub case_facts: &'a std::collections::BTreeMap<String, FieldValue>,
    pub case_gate_facts: &'a std::collections::BTreeMap<String, String>,
    /// The disposition the case is being evaluated towards, fed to
    /// `classify_match_v3` against each scored precedent's own disposition.
    pub case_disposition: &'a str,
    pub required_fields: &'a [String],
    pub critical_fields: &'a [String],
}

#[allow(clippy::too_many_arguments)]
fn run_confidence(
    chain: &Chain,
    domain: &DomainRegistry,
    namespace_prefix: &str,
    as_of: DateTime<Utc>,
    case_facts: &std::collections::BTreeMap<String, FieldValue>,
    case_gate_facts: &std::collections::BTreeMap<String, String>,
    case_disposition: &str,
    required_fields: &[String],
    critical_fields: &[String],
) -> ProofPacket {
    use crate::precedent::gates::evaluate_gates;
    use crate::precedent::scorer::{classify_match_v3, detect_primary_typology, MatchClass};

    let case_basis = case_gate_facts.get("disposition_basis").map(String::as_str).unwrap_or("UNKNOWN");

    let registry = PrecedentRegistry::new(chain);
    let query = PrecedentQuery { namespace_prefix, as_of };
    let precedents = registry.find_precedents(&query);

    // The scored pool: precedents that pass the L1 comparability gate AND
    // clear the domain's similarity floor for their detected typology.
    // Incomparable and below-floor precedents never reach this point, so
    // they cannot influence pool_size, average_similarity, or the terminal
    // counts below.
    struct ScoredPrecedent {
        score: f64,
        non_transferable: bool,
        disposition: String,
        disposition_basis: String,
    }
    let mut scored_pool: Vec<ScoredPrecedent> = Vec::new();
    let mut missing_fields: Vec<String> = Vec::new();

    for (judgment_cell, payload) in &precedents {
        // Reconstruct the precedent's facts from the FACT cells sharing
        // its subject, visible as of its own system_time.
        let precedent_gate_facts: std::collections::BTreeMap<String, String> = chain
            .cells()
            .iter()
            .filter(|c| c.fact.subject == judgment_cell.fact.subject && c.header.system_time <= judgment_cell.header.system_time)
            .map(|c| (c.fact.predicate.clone(), c.fact.object.clone()))
            .collect();
        let (gate_passed, _) = evaluate_gates(domain, case_gate_facts, &precedent_gate_facts);
        if !gate_passed {
            continue;
        }
        let precedent_fields: std::collections::BTreeMap<String, FieldValue> = precedent_gate_facts
            .iter()
            .map(|(k, v)| (k.clone(), FieldValue::Text(v.clone())))
            .collect();
        let similarity = score_similarity(domain, case_facts, &precedent_fields);

        let typology = detect_primary_typology(&payload.reason_codes, case_gate_facts);
        let floor = domain.get_similarity_floor_for_typology(typology.as_deref());
        if similarity.score < floor {
            continue;
        }

        missing_fields.extend(similarity.missing_fields.iter().cloned());
        scored_pool.push(ScoredPrecedent {
            score: similarity.score,
            non_transferable: similarity.non_transferable,
            disposition: payload.disposition.clone(),
            disposition_basis: payload.disposition_basis.clone(),
        });
    }

    let pool_size = scored_pool.len();
    let average_similarity = if pool_size > 0 { scored_pool.iter().map(|p| p.score).sum::<f64>() / pool_size as f64 } else { 0.0 };

    let mut terminal = 0usize;
    let mut decisive = 0usize;
    let mut agreeing = 0usize;
    for precedent in &scored_pool {
        if !matches!(precedent.disposition.as_str(), "ALLOW" | "BLOCK") {
            continue;
        }
        terminal += 1;
        match classify_match_v3(case_disposition, &precedent.disposition, case_basis, &precedent.disposition_basis, precedent.non_transferable) {
            MatchClass::Supporting => {
                agreeing += 1;
                decisive += 1;
            }
            MatchClass::Contrary => decisive += 1,
            MatchClass::Neutral => {}
        }
    }

    let agreement_ratio = if terminal > 0 { agreeing as f64 / terminal as f64 } else { 0.0 };

    let input = GovernedConfidenceInput {
        pool_size,
        pool_minimum: domain.pool_minimum,
        average_similarity,
        terminal_precedents: terminal,
        decisive_precedents: decisive,
        agreement_ratio,
        required_fields,
        missing_fields: &missing_fields,
        critical_fields,
    };
    let confidence = compute_governed_confidence(&input);

    ProofPacket {
        // Caller sets the real origin; this function only measures.
        origin: ProofOrigin::Base,
        as_of,
        chain_head: chain.last().map(|c| c.cell_id.clone()),
        chain_length: chain.len(),
        pool_size,
        confidence,
    }
}

/// Run a counterfactual simulation: fork `base`, inject the request's
/// hypothetical cells into the fork, and compare governed confidence
/// between the unmodified base and the modified shadow at the same pinned
/// `as_of`.
pub fn simulate_rfa(base: &Chain, request: &SimulationRequest) -> Result<SimulationResult> {
    let base_head_before = base.last().map(|c| c.cell_id.clone());
    let base_len_before = base.len();

    let mut shadow = fork_shadow_chain(base);
    for cell in &request.hypothetical_cells {
        shadow.append(cell.clone())?;
    }

    let mut base_proof = run_confidence(
        base,
        request.domain,
        request.namespace_prefix,
        request.as_of,
        request.case_facts,
        request.case_gate_facts,
        request.case_disposition,
        request.required_fields,
        request.critical_fields,
    );
    base_proof.origin = ProofOrigin::Base;

    let mut shadow_proof = run_confidence(
        &shadow,
        request.domain,
        request.namespace_prefix,
        request.as_of,
        request.case_facts,
        request.case_gate_facts,
        request.case_disposition,
        request.required_fields,
        request.critical_fields,
    );
    shadow_proof.origin = ProofOrigin::Shadow;

    if base.last().map(|c| c.cell_id.clone()) != base_head_before || base.len() != base_len_before {
        return Err(LedgerError::new(ErrorKind::Internal, "base chain was contaminated by a simulation"));
    }

    let delta = DeltaReport {
        pool_size_delta: shadow_proof.pool_size as i64 - base_proof.pool_size as i64,
        confidence_level_changed: shadow_proof.confidence.level != base_proof.confidence.level,
        base_confidence_level: base_proof.confidence.level.as_str().to_string(),
        shadow_confidence_level: shadow_proof.confidence.level.as_str().to_string(),
    };

    Ok(SimulationResult { base_proof, shadow_proof, delta, anchors_incomplete: false })
}
