//! `Chain` — an ordered, hash-linked sequence of cells rooted at one Genesis.
//!
//! `Chain::append` is the commit gate: every cell admitted to a chain passes
//! eight ordered checks before it becomes part of history. The order
//! matters — cheaper, more fundamental checks run first so a bad cell fails
//! fast on the check that actually explains what's wrong with it, not on an
//! incidental downstream one.
//!
//! Grounded on `examples/original_source/decisiongraph-complete/tests/
//! test_commit_gate.py` (Genesis-first, single-Genesis, graph_id match) and
//! generalized with the remaining rules, keeping a `BTreeMap`-index-over-
//! `Vec` pattern for O(1) `cell_id` lookup.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::cell::{signing_preimage, verify_integrity, Cell, CellType, NULL_HASH};
use crate::error::{ErrorKind, LedgerError, Result};
use crate::witness::WitnessSet;

/// An append-only, hash-linked sequence of cells bound to exactly one
/// `graph_id` and one `hash_scheme`.
#[derive(Debug, Clone)]
pub struct Chain {
    graph_id: String,
    hash_scheme: String,
    cells: Vec<Cell>,
    /// `cell_id -> index into cells`, maintained alongside `cells` so
    /// lookup by id never re-scans the chain.
    index: BTreeMap<String, usize>,
    witness_set: Option<WitnessSet>,
}

impl Chain {
    /// An empty chain awaiting its Genesis cell.
    pub fn new(graph_id: impl Into<String>, hash_scheme: impl Into<String>) -> Self {
        Self {
            graph_id: graph_id.into(),
            hash_scheme: hash_scheme.into(),
            cells: Vec::new(),
            index: BTreeMap::new(),
            witness_set: None,
        }
    }

    pub fn graph_id(&self) -> &str {
        &self.graph_id
    }

    pub fn hash_scheme(&self) -> &str {
        &self.hash_scheme
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn last(&self) -> Option<&Cell> {
        self.cells.last()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn get(&self, cell_id: &str) -> Option<&Cell> {
        self.index.get(cell_id).map(|&i| &self.cells[i])
    }

    pub fn witness_set(&self) -> Option<&WitnessSet> {
        self.witness_set.as_ref()
    }

    pub fn set_witness_set(&mut self, witness_set: WitnessSet) {
        self.witness_set = Some(witness_set);
    }

    /// Attempt to admit `cell` to the chain, running all eight commit-gate
    /// rules in order. WAL durability (the eighth rule — "don't acknowledge
    /// a commit until the record is fsynced") is enforced by the caller:
    /// `Chain::append` only mutates in-memory state, so a ledger
    /// orchestrator must call [`crate::wal`] append-and-sync *before*
    /// calling this, and must discard the in-memory append if the sync
    /// fails.
    pub fn append(&mut self, cell: Cell) -> Result<()> {
        // Rule 1: Genesis must be first, and only first.
        if self.cells.is_empty() {
            if cell.header.cell_type != CellType::Genesis {
                return Err(LedgerError::new(
                    ErrorKind::GenesisViolation,
                    "first cell appended to a chain must be GENESIS",
                ));
            }
            if cell.header.prev_cell_hash != NULL_HASH {
                return Err(LedgerError::new(
                    ErrorKind::GenesisViolation,
                    "GENESIS cell must have a null prev_cell_hash",
                ));
            }
        } else if cell.header.cell_type == CellType::Genesis {
            return Err(LedgerError::new(
                ErrorKind::GenesisViolation,
                "a chain may contain only one GENESIS cell",
            ));
        }

        // Rule 2: graph boundary.
        if cell.header.graph_id != self.graph_id {
            return Err(LedgerError::new(
                ErrorKind::GraphIdMismatch,
                format!(
                    "cell graph_id '{}' does not match chain graph_id '{}'",
                    cell.header.graph_id, self.graph_id
                ),
            )
            .with_detail("cell_graph_id", &cell.header.graph_id)
            .with_detail("chain_graph_id", &self.graph_id));
        }

        // Rule 3: hash-scheme constancy.
        if !self.cells.is_empty() && cell.header.hash_scheme != self.hash_scheme {
            return Err(LedgerError::new(
                ErrorKind::HashSchemeMismatch,
                format!(
                    "cell hash_scheme '{}' does not match chain hash_scheme '{}'",
                    cell.header.hash_scheme, self.hash_scheme
                ),
            ));
        }

        // Rule 4: chain continuity.
        let expected_prev = self.cells.last().map(|c| c.cell_id.as_str()).unwrap_or(NULL_HASH);
        if cell.header.prev_cell_hash != expected_prev {
            return Err(LedgerError::new(
                ErrorKind::ChainBreak,
                "cell.header.prev_cell_hash does not match the chain's current head",
            )
            .with_detail("expected", expected_prev)
            .with_detail("actual", &cell.header.prev_cell_hash));
        }

        // Rule 5: content integrity.
        if !verify_integrity(&cell) {
            return Err(LedgerError::new(
                ErrorKind::IntegrityFail,
                "cell.cell_id does not match the hash of its own content",
            ));
        }

        // Rule 6: soft temporal monotonicity — a regression is logged, not
        // rejected, since clock skew across writers is expected in
        // practice and must not halt the ledger.
        if let Some(prev) = self.cells.last() {
            if cell.header.system_time < prev.header.system_time {
                tracing::warn!(
                    prev_system_time = %prev.header.system_time,
                    cell_system_time = %cell.header.system_time,
                    cell_id = %cell.cell_id,
                    "cell system_time regresses relative to chain head"
                );
            }
        }

        // Rule 7: signature verification, opt-in per cell.
        if cell.proof.signature_required {
            self.verify_signature(&cell)?;
        }

        if cell.header.cell_type == CellType::Genesis {
            self.hash_scheme = cell.header.hash_scheme.clone();
        }
        self.index.insert(cell.cell_id.clone(), self.cells.len());
        self.cells.push(cell);
        Ok(())
    }

    fn verify_signature(&self, cell: &Cell) -> Result<()> {
        use ed25519_dalek::{Signature, Verifier, VerifyingKey};

        let signer = cell.proof.signer_key_id.as_deref().ok_or_else(|| {
            LedgerError::new(ErrorKind::SignatureInvalid, "signature_required but signer_key_id is absent")
        })?;
        let signature_hex = cell.proof.signature.as_deref().ok_or_else(|| {
            LedgerError::new(ErrorKind::SignatureInvalid, "signature_required but signature is absent")
        })?;
        if let Some(witness_set) = &self.witness_set {
            if !witness_set.recognizes(signer) {
                return Err(LedgerError::new(
                    ErrorKind::SignatureInvalid,
                    format!("signer '{signer}' is not a recognized witness for this chain"),
                ));
            }
        }

        let key_bytes: [u8; 32] = hex::decode(signer)
            .ok()
            .and_then(|v| v.try_into().ok())
            .ok_or_else(|| LedgerError::new(ErrorKind::SignatureInvalid, "signer_key_id is not a 32-byte hex Ed25519 public key"))?;
        let verifying_key = VerifyingKey::from_bytes(&key_bytes)
            .map_err(|e| LedgerError::new(ErrorKind::SignatureInvalid, format!("invalid Ed25519 public key: {e}")))?;

        let sig_bytes: [u8; 64] = hex::decode(signature_hex)
            .ok()
            .and_then(|v| v.try_into().ok())
            .ok_or_else(|| LedgerError::new(ErrorKind::SignatureInvalid, "signature is not 64-byte hex"))?;
        let signature = Signature::from_bytes(&sig_bytes);

        verifying_key
            .verify(&signing_preimage(cell), &signature)
            .map_err(|_| LedgerError::new(ErrorKind::SignatureInvalid, "Ed25519 signature verification failed"))
    }

    /// All cells of the given type, in chain order.
    pub fn find_by_type(&self, cell_type: CellType) -> Vec<&Cell> {
        self.cells.iter().filter(|c| c.header.cell_type == cell_type).collect()
    }

    /// Walk `prev_cell_hash` links back from `cell_id` to Genesis,
    /// returning the path in root-first order.
    pub fn trace_to_genesis(&self, cell_id: &str) -> Result<Vec<&Cell>> {
        let mut path = Vec::new();
        let mut current = self.get(cell_id).ok_or_else(|| {
            LedgerError::new(ErrorKind::InputInvalid, format!("no such cell '{cell_id}' in this chain"))
        })?;
        path.push(current);
        while current.header.cell_type != CellType::Genesis {
            let prev_id = &current.header.prev_cell_hash;
            current = self.get(prev_id).ok_or_else(|| {
                LedgerError::new(ErrorKind::ChainBreak, format!("dangling prev_cell_hash '{prev_id}'"))
            })?;
            path.push(current);
        }
        path.reverse();
        Ok(path)
    }

    /// Cells visible as of `as_of`: `system_time <= as_of` and, when a
    /// validity window is present on the fact, `valid_from <= as_of <
    /// valid_to`.
    pub fn query_as_of(&self, as_of: DateTime<Utc>) -> Vec<&Cell> {
        self.cells
            .iter()
            .filter(|c| {
                if c.header.system_time > as_of {
                    return false;
                }
                if let Some(valid_from) = c.fact.valid_from {
                    if valid_from > as_of {
                        return false;
                    }
                }
                if let Some(valid_to) = c.fact.valid_to {
                    if valid_to <= as_of {
                        return false;
                    }
                }
                true
            })
            .collect()
    }

    /// Export the chain to a JSON array of canonical-shaped cell objects,
    /// in append order, for snapshotting or transport.
    pub fn export_json(&self) -> Result<serde_json::Value> {
        let mut out = Vec::with_capacity(self.cells.len());
        for cell in &self.cells {
            out.push(serde_json::to_value(cell)?);
        }
        Ok(serde_json::Value::Array(out))
    }

    /// Rebuild a chain from an exported JSON array, replaying every cell
    /// through the full commit gate so a tampered export is rejected the
    /// same way a tampered live append would be.
    pub fn import_json(graph_id: impl Into<String>, hash_scheme: impl Into<String>, json: &serde_json::Value) -> Result<Self> {
        let graph_id = graph_id.into();
        let hash_scheme = hash_scheme.into();
        let serde_json::Value::Array(items) = json else {
            return Err(LedgerError::new(ErrorKind::SchemaInvalid, "chain export must be a JSON array"));
        };
        let mut chain = Chain::new(graph_id, hash_scheme);
        for item in items {
            let cell: Cell = serde_json::from_value(item.clone())?;
            chain.append(cell)?;
        }
        Ok(chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{create_genesis_cell, Evidence, Fact, LogicAnchor, Proof, SourceQuality};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    fn genesis(graph_id: &str) -> Cell {
        create_genesis_cell(graph_id.to_string(), crate::cell::HASH_SCHEME_CANONICAL, "root", "system:test", now()).unwrap()
    }

    fn child_cell(graph_id: &str, prev: &Cell, when: DateTime<Utc>) -> Cell {
        let header = crate::cell::Header {
            schema_version: "1".to_string(),
            graph_id: graph_id.to_string(),
            cell_type: CellType::Fact,
            system_time: when,
            prev_cell_hash: prev.cell_id.clone(),
            hash_scheme: crate::cell::HASH_SCHEME_CANONICAL.to_string(),
        };
        let fact = Fact {
            namespace: "banking_aml.case".to_string(),
            subject: "case:CA-1".to_string(),
            predicate: "risk_level".to_string(),
            object: "Medium".to_string(),
            confidence: "0.8".to_string(),
            source_quality: SourceQuality::Verified,
            valid_from: Some(when),
            valid_to: None,
        };
        let anchor = LogicAnchor { rule_id: "r1".to_string(), rule_logic_hash: "abc".to_string() };
        crate::cell::build_cell(header, fact, anchor, Vec::<Evidence>::new(), Proof::default()).unwrap()
    }

    #[test]
    fn genesis_must_be_first_cell() {
        let mut chain = Chain::new("g1", crate::cell::HASH_SCHEME_CANONICAL);
        let g = genesis("g1");
        let child = child_cell("g1", &g, now());
        let err = chain.append(child).unwrap_err();
        assert_eq!(err.kind, ErrorKind::GenesisViolation);
    }

    #[test]
    fn only_one_genesis_allowed() {
        let mut chain = Chain::new("g1", crate::cell::HASH_SCHEME_CANONICAL);
        chain.append(genesis("g1")).unwrap();
        let err = chain.append(genesis("g1")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::GenesisViolation);
    }

    #[test]
    fn foreign_graph_id_is_rejected() {
        let mut chain = Chain::new("g1", crate::cell::HASH_SCHEME_CANONICAL);
        let g = genesis("g1");
        chain.append(g.clone()).unwrap();
        let mut foreign = child_cell("g2", &g, now());
        foreign.header.prev_cell_hash = g.cell_id.clone();
        foreign.cell_id = crate::cell::compute_cell_id(&foreign);
        let err = chain.append(foreign).unwrap_err();
        assert_eq!(err.kind, ErrorKind::GraphIdMismatch);
    }

    #[test]
    fn wrong_prev_hash_breaks_the_chain() {
        let mut chain = Chain::new("g1", crate::cell::HASH_SCHEME_CANONICAL);
        let g = chain_with_genesis();
        chain.append(g.clone()).unwrap();
        let mut bad = child_cell("g1", &g, now());
        bad.header.prev_cell_hash = "deadbeef".to_string();
        bad.cell_id = crate::cell::compute_cell_id(&bad);
        let err = chain.append(bad).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ChainBreak);
    }

    fn chain_with_genesis() -> Cell {
        genesis("g1")
    }

    #[test]
    fn tampered_cell_fails_integrity_before_reaching_chain_link_check() {
        let mut chain = Chain::new("g1", crate::cell::HASH_SCHEME_CANONICAL);
        let g = genesis("g1");
        chain.append(g.clone()).unwrap();
        let mut bad = child_cell("g1", &g, now());
        bad.fact.object = "tampered".to_string();
        let err = chain.append(bad).unwrap_err();
        assert_eq!(err.kind, ErrorKind::IntegrityFail);
    }

    #[test]
    fn valid_chain_appends_and_indexes_by_id() {
        let mut chain = Chain::new("g1", crate::cell::HASH_SCHEME_CANONICAL);
        let g = genesis("g1");
        chain.append(g.clone()).unwrap();
        let c1 = child_cell("g1", &g, now());
        let c1_id = c1.cell_id.clone();
        chain.append(c1).unwrap();
        assert_eq!(chain.len(), 2);
        assert!(chain.get(&c1_id).is_some());
    }

    #[test]
    fn trace_to_genesis_walks_root_first() {
        let mut chain = Chain::new("g1", crate::cell::HASH_SCHEME_CANONICAL);
        let g = genesis("g1");
        chain.append(g.clone()).unwrap();
        let c1 = child_cell("g1", &g, now());
        let c1_id = c1.cell_id.clone();
        chain.append(c1).unwrap();
        let path = chain.trace_to_genesis(&c1_id).unwrap();
        assert_eq!(path.len(), 2);
        assert_eq!(path[0].header.cell_type, CellType::Genesis);
    }

    #[test]
    fn signed_cell_with_recognized_witness_verifies() {
        use ed25519_dalek::{Signer, SigningKey};
        use std::collections::BTreeSet;

        let signing_key = SigningKey::from_bytes(&[7u8; 32]);
        let signer_key_id = hex::encode(signing_key.verifying_key().to_bytes());

        let mut chain = Chain::new("g1", crate::cell::HASH_SCHEME_CANONICAL);
        let g = genesis("g1");
        chain.append(g.clone()).unwrap();

        let mut witnesses = BTreeSet::new();
        witnesses.insert(signer_key_id.clone());
        chain.set_witness_set(crate::witness::WitnessSet::new("root", 1, witnesses).unwrap());

        let mut unsigned = child_cell("g1", &g, now());
        unsigned.proof.signer_key_id = Some(signer_key_id);
        unsigned.proof.signature_required = true;
        unsigned.cell_id = crate::cell::compute_cell_id(&unsigned);

        let signature = signing_key.sign(&crate::cell::signing_preimage(&unsigned));
        unsigned.proof.signature = Some(hex::encode(signature.to_bytes()));
        unsigned.cell_id = crate::cell::compute_cell_id(&unsigned);

        chain.append(unsigned).unwrap();
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn signed_cell_from_unrecognized_witness_is_rejected() {
        use ed25519_dalek::{Signer, SigningKey};
        use std::collections::BTreeSet;

        let signing_key = SigningKey::from_bytes(&[7u8; 32]);
        let signer_key_id = hex::encode(signing_key.verifying_key().to_bytes());

        let mut chain = Chain::new("g1", crate::cell::HASH_SCHEME_CANONICAL);
        let g = genesis("g1");
        chain.append(g.clone()).unwrap();

        let mut witnesses = BTreeSet::new();
        witnesses.insert("someone-else".to_string());
        chain.set_witness_set(crate::witness::WitnessSet::new("root", 1, witnesses).unwrap());

        let mut unsigned = child_cell("g1", &g, now());
        unsigned.proof.signer_key_id = Some(signer_key_id);
        unsigned.proof.signature_required = true;
        unsigned.cell_id = crate::cell::compute_cell_id(&unsigned);

        let signature = signing_key.sign(&crate::cell::signing_preimage(&unsigned));
        unsigned.proof.signature = Some(hex::encode(signature.to_bytes()));
        unsigned.cell_id = crate::cell::compute_cell_id(&unsigned);

        let err = chain.append(unsigned).unwrap_err();
        assert_eq!(err.kind, ErrorKind::SignatureInvalid);
    }

    #[test]
    fn export_then_import_round_trips() {
        let mut chain = Chain::new("g1", crate::cell::HASH_SCHEME_CANONICAL);
        let g = genesis("g1");
        chain.append(g.clone()).unwrap();
        let c1 = child_cell("g1", &g, now());
        chain.append(c1).unwrap();
        let json = chain.export_json().unwrap();
        let reimported = Chain::import_json("g1", crate::cell::HASH_SCHEME_CANONICAL, &json).unwrap();
        assert_eq!(reimported.len(), chain.len());
    }
}
