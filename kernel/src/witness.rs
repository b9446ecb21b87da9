//! Genesis witness quorum: who is allowed to attest the founding of a chain.
//!
//! A chain's Genesis cell has no ancestor to inherit trust from, so it
//! embeds its own governance: a `WitnessSet` naming which keys may attest
//! it and how many of them must agree. This sidesteps the chicken-and-egg
//! problem of needing a trust root to validate the trust root — the
//! witness set ships inside the object it governs.
//!
//! Grounded on `examples/original_source/decisiongraph-complete/tests/
//! test_witnessset.py` and `tests/test_bootstrap.py` (frozen-dataclass
//! validation semantics, `validate_threshold`/`is_bootstrap_threshold`/
//! `is_production_threshold`, `create_genesis_cell_with_witness_set`,
//! `parse_genesis_witness_set`, `has_witness_set`), reworked as an
//! idiomatic Rust value type in the style of `kernel/src/state/witness.rs`
//! (frozen struct + explicit constructor validation rather than a public
//! mutable struct literal).

use std::collections::BTreeSet;

use crate::canon::Value;
use crate::error::{ErrorKind, LedgerError, Result};

/// `1-of-1`: a single witness is sufficient. Used only to bootstrap a chain
/// before a production quorum can be established.
pub fn is_bootstrap_threshold(threshold: u32, member_count: usize) -> bool {
    threshold == 1 && member_count == 1
}

/// `k-of-n` with `k >= 2` and `n >= k`: a genuine multi-party quorum.
pub fn is_production_threshold(threshold: u32, member_count: usize) -> bool {
    threshold >= 2 && member_count >= threshold as usize
}

pub fn validate_threshold(threshold: u32, member_count: usize) -> Result<()> {
    if threshold == 0 {
        return Err(LedgerError::new(ErrorKind::InputInvalid, "witness threshold must be at least 1"));
    }
    if member_count == 0 {
        return Err(LedgerError::new(ErrorKind::InputInvalid, "witness set must name at least one member"));
    }
    if threshold as usize > member_count {
        return Err(LedgerError::new(
            ErrorKind::InputInvalid,
            format!("witness threshold {threshold} exceeds member count {member_count}"),
        ));
    }
    Ok(())
}

/// A namespaced quorum of key identifiers required to attest a Genesis cell.
///
/// Immutable by construction: every field is set once in [`WitnessSet::new`]
/// and validated there; there is no setter.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WitnessSet {
    namespace: String,
    threshold: u32,
    members: BTreeSet<String>,
}

impl WitnessSet {
    pub fn new(namespace: impl Into<String>, threshold: u32, members: BTreeSet<String>) -> Result<Self> {
        let namespace = namespace.into();
        if namespace.is_empty() {
            return Err(LedgerError::new(ErrorKind::InputInvalid, "witness set namespace must not be empty"));
        }
        validate_threshold(threshold, members.len())?;
        Ok(Self { namespace, threshold, members })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn members(&self) -> &BTreeSet<String> {
        &self.members
    }

    pub fn is_bootstrap(&self) -> bool {
        is_bootstrap_threshold(self.threshold, self.members.len())
    }

    pub fn is_production(&self) -> bool {
        is_production_threshold(self.threshold, self.members.len())
    }

    /// Does `signer_key_id` satisfy membership in this set?
    pub fn recognizes(&self, signer_key_id: &str) -> bool {
        self.members.contains(signer_key_id)
    }

    pub fn to_value(&self) -> Value {
        let mut m = Value::object();
        m.insert("namespace".into(), Value::from(self.namespace.as_str()));
        m.insert("threshold".into(), Value::from(self.threshold as u64));
        m.insert(
            "members".into(),
            Value::Array(self.members.iter().map(|m| Value::from(m.as_str())).collect()),
        );
        Value::Object(m)
    }

    pub fn from_value(value: &Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(LedgerError::new(ErrorKind::InputInvalid, "witness set must be an object"));
        };
        let namespace = match map.get("namespace") {
            Some(Value::Str(s)) => s.clone(),
            _ => return Err(LedgerError::new(ErrorKind::InputInvalid, "witness set missing 'namespace'")),
        };
        let threshold = match map.get("threshold") {
            Some(Value::Int(n)) if *n >= 0 => *n as u32,
            _ => return Err(LedgerError::new(ErrorKind::InputInvalid, "witness set missing 'threshold'")),
        };
        let members = match map.get("members") {
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| match v {
                    Value::Str(s) => Ok(s.clone()),
                    _ => Err(LedgerError::new(ErrorKind::InputInvalid, "witness set member must be a string")),
                })
                .collect::<Result<BTreeSet<String>>>()?,
            _ => return Err(LedgerError::new(ErrorKind::InputInvalid, "witness set missing 'members'")),
        };
        WitnessSet::new(namespace, threshold, members)
    }
}
