//! `Cell` — the immutable, content-addressed atomic record of the ledger.
//!
//! Typed fields, a frozen canonical field order documented in this module
//! doc comment, and `compute_cell_id` as the single source of identity.
//!
//! # Invariants
//! - `cell_id` is a pure function of every other field. Mutating any field
//!   and recomputing yields a different id.
//! - Genesis has `prev_cell_hash == NULL_HASH` and no ancestor.
//! - Floats never appear in the canonical payload — enforced by `canon::Value`
//!   having no float variant, so a `Cell` cannot be built with one.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::canon::{self, Value};
use crate::error::{ErrorKind, LedgerError, Result};

/// 64 zero hex characters (32 zero bytes) — the sentinel `prev_cell_hash`
/// for Genesis.
pub const NULL_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

fn null_hash() -> String {
    NULL_HASH.to_string()
}

/// Legacy string-concatenation hash scheme, retained only so a chain can
/// detect and reject a mix of schemes (`HashSchemeMismatch`); no new chain
/// should be created with it.
pub const HASH_SCHEME_LEGACY: &str = "legacy:concat:v0";
/// The only hash scheme new chains should use.
pub const HASH_SCHEME_CANONICAL: &str = "canon:rfc8785:v1";
pub const HASH_SCHEME_DEFAULT: &str = HASH_SCHEME_CANONICAL;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellType {
    #[serde(rename = "GENESIS")]
    Genesis,
    #[serde(rename = "FACT")]
    Fact,
    #[serde(rename = "RULE")]
    Rule,
    #[serde(rename = "DECISION")]
    Decision,
    #[serde(rename = "EVIDENCE")]
    Evidence,
    #[serde(rename = "POLICY_REF")]
    PolicyRef,
    #[serde(rename = "JUDGMENT")]
    Judgment,
}

impl CellType {
    pub fn as_str(self) -> &'static str {
        match self {
            CellType::Genesis => "GENESIS",
            CellType::Fact => "FACT",
            CellType::Rule => "RULE",
            CellType::Decision => "DECISION",
            CellType::Evidence => "EVIDENCE",
            CellType::PolicyRef => "POLICY_REF",
            CellType::Judgment => "JUDGMENT",
        }
    }
}

/// Provenance quality of a `Fact`'s `object` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceQuality {
    #[serde(rename = "verified")]
    Verified,
    #[serde(rename = "self_reported")]
    SelfReported,
    #[serde(rename = "third_party")]
    ThirdParty,
    #[serde(rename = "inferred")]
    Inferred,
    #[serde(rename = "unknown")]
    Unknown,
}

impl SourceQuality {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceQuality::Verified => "verified",
            SourceQuality::SelfReported => "self_reported",
            SourceQuality::ThirdParty => "third_party",
            SourceQuality::Inferred => "inferred",
            SourceQuality::Unknown => "unknown",
        }
    }
}

/// Header shared by every cell: schema version, graph binding, type,
/// timestamp, chain link, and hash-scheme tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub schema_version: String,
    pub graph_id: String,
    pub cell_type: CellType,
    /// ISO 8601 UTC.
    pub system_time: DateTime<Utc>,
    pub prev_cell_hash: String,
    pub hash_scheme: String,
}

/// A single asserted fact: namespace, subject, predicate/object triple with
/// provenance and optional bitemporal validity window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    /// Dot-separated namespace, e.g. `"banking_aml.case"`.
    pub namespace: String,
    /// `type:identifier`, e.g. `"case:CA-2026-0001"`.
    pub subject: String,
    /// snake_case, ≤64 chars.
    pub predicate: String,
    /// ≤4096 chars, no control characters.
    pub object: String,
    /// String-encoded decimal in `[0,1]` — never a raw float (see `canon`).
    pub confidence: String,
    pub source_quality: SourceQuality,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_to: Option<DateTime<Utc>>,
}

impl Fact {
    pub fn validate(&self) -> Result<()> {
        if self.predicate.len() > 64 {
            return Err(LedgerError::new(
                ErrorKind::InputInvalid,
                "fact.predicate exceeds 64 characters",
            ));
        }
        if self.object.len() > 4096 {
            return Err(LedgerError::new(
                ErrorKind::InputInvalid,
                "fact.object exceeds 4096 characters",
            ));
        }
        if self.object.chars().any(|c| (c as u32) < 0x20) {
            return Err(LedgerError::new(
                ErrorKind::InputInvalid,
                "fact.object contains control characters",
            ));
        }
        match self.confidence.parse::<f64>() {
            Ok(c) if (0.0..=1.0).contains(&c) => {}
            _ => {
                return Err(LedgerError::new(
                    ErrorKind::InputInvalid,
                    format!("fact.confidence must be a decimal string in [0,1], got '{}'", self.confidence),
                ))
            }
        }
        if let (Some(from), Some(to)) = (self.valid_from, self.valid_to) {
            if from >= to {
                return Err(LedgerError::new(
                    ErrorKind::InputInvalid,
                    "fact.valid_from must precede fact.valid_to",
                ));
            }
        }
        Ok(())
    }
}

/// Rule provenance: which rule produced this cell, bound by the hash of the
/// rule logic itself so a rule change cannot silently reinterpret history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicAnchor {
    pub rule_id: String,
    pub rule_logic_hash: String,
}

/// A reference to a supporting cell or external artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub reference: String,
    pub content_hash: String,
}

/// Optional signature over the cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Proof {
    pub signer_key_id: Option<String>,
    pub signature: Option<String>,
    pub signature_required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub header: Header,
    pub fact: Fact,
    pub logic_anchor: LogicAnchor,
    #[serde(default)]
    pub evidence: Vec<Evidence>,
    #[serde(default)]
    pub proof: Proof,
    pub cell_id: String,
}

/// Sort key used to normalize an evidence list before it enters the
/// canonical dict — determinism requires a defined order for what is
/// logically an unordered set of supporting references.
fn evidence_sort_key(e: &Evidence) -> (&str, &str) {
    (e.content_hash.as_str(), e.reference.as_str())
}

fn header_to_value(h: &Header) -> Value {
    let mut m = Value::object();
    m.insert("schema_version".into(), Value::from(h.schema_version.as_str()));
    m.insert("graph_id".into(), Value::from(h.graph_id.as_str()));
    m.insert("cell_type".into(), Value::from(h.cell_type.as_str()));
    m.insert("system_time".into(), Value::from(h.system_time.to_rfc3339()));
    m.insert("prev_cell_hash".into(), Value::from(h.prev_cell_hash.as_str()));
    m.insert("hash_scheme".into(), Value::from(h.hash_scheme.as_str()));
    Value::Object(m)
}

fn fact_to_value(f: &Fact) -> Value {
    let mut m = Value::object();
    m.insert("namespace".into(), Value::from(f.namespace.as_str()));
    m.insert("subject".into(), Value::from(f.subject.as_str()));
    m.insert("predicate".into(), Value::from(f.predicate.as_str()));
    m.insert("object".into(), Value::from(f.object.as_str()));
    m.insert("confidence".into(), Value::from(f.confidence.as_str()));
    m.insert("source_quality".into(), Value::from(f.source_quality.as_str()));
    m.insert(
        "valid_from".into(),
        Value::from(f.valid_from.map(|t| t.to_rfc3339())),
    );
    m.insert(
        "valid_to".into(),
        Value::from(f.valid_to.map(|t| t.to_rfc3339())),
    );
    Value::Object(m)
}

fn logic_anchor_to_value(la: &LogicAnchor) -> Value {
    let mut m = Value::object();
    m.insert("rule_id".into(), Value::from(la.rule_id.as_str()));
    m.insert("rule_logic_hash".into(), Value::from(la.rule_logic_hash.as_str()));
    Value::Object(m)
}

fn evidence_to_value(evidence: &[Evidence]) -> Value {
    let mut sorted: Vec<&Evidence> = evidence.iter().collect();
    sorted.sort_by_key(|e| evidence_sort_key(e));
    Value::Array(
        sorted
            .into_iter()
            .map(|e| {
                let mut m = Value::object();
                m.insert("reference".into(), Value::from(e.reference.as_str()));
                m.insert("content_hash".into(), Value::from(e.content_hash.as_str()));
                Value::Object(m)
            })
            .collect(),
    )
}

fn proof_to_value(p: &Proof) -> Value {
    let mut m = Value::object();
    m.insert("signer_key_id".into(), Value::from(p.signer_key_id.clone()));
    m.insert("signature".into(), Value::from(p.signature.clone()));
    m.insert("signature_required".into(), Value::from(p.signature_required));
    Value::Object(m)
}

/// Build the canonical dict for a cell, `cell_id` excluded.
pub fn cell_to_canonical_dict(cell: &Cell) -> Value {
    let mut m: BTreeMap<String, Value> = Value::object();
    m.insert("header".into(), header_to_value(&cell.header));
    m.insert("fact".into(), fact_to_value(&cell.fact));
    m.insert("logic_anchor".into(), logic_anchor_to_value(&cell.logic_anchor));
    m.insert("evidence".into(), evidence_to_value(&cell.evidence));
    m.insert("proof".into(), proof_to_value(&cell.proof));
    Value::Object(m)
}

/// `compute_cell_id(cell) = canonical_hash(cell_to_canonical_dict(cell))`.
pub fn compute_cell_id(cell: &Cell) -> String {
    canon::canonical_hash(&cell_to_canonical_dict(cell))
}

/// The bytes an Ed25519 signature over this cell is computed over: the
/// canonical dict with `proof.signature` cleared, since the signature
/// cannot cover itself.
pub fn signing_preimage(cell: &Cell) -> Vec<u8> {
    let mut dict = cell_to_canonical_dict(cell);
    if let Value::Object(m) = &mut dict {
        if let Some(Value::Object(proof)) = m.get_mut("proof") {
            proof.insert("signature".into(), Value::from(None::<String>));
        }
    }
    canon::canonical_json_bytes(&dict)
}

/// `verify_integrity(cell) <=> compute_cell_id(cell) == cell.cell_id`.
pub fn verify_integrity(cell: &Cell) -> bool {
    compute_cell_id(cell) == cell.cell_id
}

/// Construct a new non-Genesis cell, deriving `cell_id` from its content.
pub fn build_cell(
    header: Header,
    fact: Fact,
    logic_anchor: LogicAnchor,
    evidence: Vec<Evidence>,
    proof: Proof,
) -> Result<Cell> {
    fact.validate()?;
    let mut cell = Cell {
        header,
        fact,
        logic_anchor,
        evidence,
        proof,
        cell_id: String::new(),
    };
    cell.cell_id = compute_cell_id(&cell);
    Ok(cell)
}

/// Generate a fresh `graph_id` (UUID v4), matching
/// `examples/original_source` `cell.generate_graph_id`.
pub fn generate_graph_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Construct the unique first cell of a chain. `prev_cell_hash` is always
/// `NULL_HASH`; there is no ancestor.
pub fn create_genesis_cell(
    graph_id: String,
    hash_scheme: &str,
    root_namespace: &str,
    creator: &str,
    now: DateTime<Utc>,
) -> Result<Cell> {
    let header = Header {
        schema_version: "1".to_string(),
        graph_id,
        cell_type: CellType::Genesis,
        system_time: now,
        prev_cell_hash: null_hash(),
        hash_scheme: hash_scheme.to_string(),
    };
    let fact = Fact {
        namespace: root_namespace.to_string(),
        subject: format!("system:{creator}"),
        predicate: "genesis_created".to_string(),
        object: "High".to_string(),
        confidence: "1.0".to_string(),
        source_quality: SourceQuality::Verified,
        valid_from: Some(now),
        valid_to: None,
    };
    let logic_anchor = LogicAnchor {
        rule_id: "genesis".to_string(),
        rule_logic_hash: canon::canonical_hash(&Value::Str("genesis".to_string())),
    };
    build_cell(header, fact, logic_anchor, Vec::new(), Proof::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_cell(object: &str) -> Cell {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let graph_id = "g1".to_string();
        let mut cell = create_genesis_cell(graph_id, HASH_SCHEME_CANONICAL, "root", "system:demo", now).unwrap();
        cell.fact.object = object.to_string();
        cell.cell_id = compute_cell_id(&cell);
        cell
    }

    #[test]
    fn genesis_has_null_prev_hash() {
        let cell = sample_cell("High");
        assert_eq!(cell.header.prev_cell_hash, NULL_HASH);
        assert_eq!(NULL_HASH.len(), 64);
    }

    #[test]
    fn genesis_tamper_detection() {
        let mut cell = sample_cell("High");
        assert!(verify_integrity(&cell));

        // Mutate fact.object directly (bypassing recompute): integrity fails.
        cell.fact.object = "Low".to_string();
        assert!(!verify_integrity(&cell));

        // Restoring content restores integrity once cell_id is recomputed.
        cell.fact.object = "High".to_string();
        cell.cell_id = compute_cell_id(&cell);
        assert!(verify_integrity(&cell));
    }

    #[test]
    fn mutating_any_field_changes_cell_id() {
        let cell = sample_cell("High");
        let mut mutated = cell.clone();
        mutated.fact.predicate = "other_predicate".to_string();
        assert_ne!(compute_cell_id(&cell), compute_cell_id(&mutated));
    }

    #[test]
    fn fact_rejects_oversized_object() {
        let mut f = sample_cell("High").fact;
        f.object = "x".repeat(4097);
        assert!(f.validate().is_err());
    }

    #[test]
    fn fact_rejects_control_characters() {
        let mut f = sample_cell("High").fact;
        f.object = "bad\u{0001}value".to_string();
        assert!(f.validate().is_err());
    }

    #[test]
    fn fact_rejects_confidence_out_of_range() {
        let mut f = sample_cell("High").fact;
        f.confidence = "1.5".to_string();
        assert!(f.validate().is_err());
    }

    #[test]
    fn evidence_order_is_normalized_before_hashing() {
        let mut c1 = sample_cell("High");
        c1.evidence = vec![
            Evidence { reference: "b".into(), content_hash: "bbb".into() },
            Evidence { reference: "a".into(), content_hash: "aaa".into() },
        ];
        let mut c2 = c1.clone();
        c2.evidence.reverse();
        assert_eq!(compute_cell_id(&c1), compute_cell_id(&c2));
    }
}
