//! Crate-level error taxonomy.
//!
//! One enum, one stable `code()` per variant, a human `Display` message, and
//! a `details` bag for structured context — this is the `{code, message,
//! details}` contract every external boundary returns. Internal
//! code never constructs an ad-hoc error type; everything funnels through
//! `LedgerError` so the CLI can map a code to an exit status without knowing
//! which subsystem raised it.
//!
//! `details` is a `BTreeMap`, not a `HashMap` — iteration order must be
//! deterministic wherever an error is serialized into a hash or a golden
//! comparison, matching the determinism rule the rest of this crate holds
//! to throughout.

use std::collections::BTreeMap;
use std::fmt;

pub type Result<T> = std::result::Result<T, LedgerError>;

/// A `{code, message, details}` error, stable across process boundaries.
#[derive(Debug, Clone, thiserror::Error)]
pub struct LedgerError {
    pub kind: ErrorKind,
    pub message: String,
    pub details: BTreeMap<String, String>,
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind.code(), self.message)
    }
}

impl LedgerError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), details: BTreeMap::new() }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Exit code used by the CLI's user-visible failure reporting.
    pub fn exit_code(&self) -> i32 {
        self.kind.exit_code()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "code": self.kind.code(),
            "message": self.message,
            "details": self.details,
        })
    }
}

/// The crate-wide error taxonomy. Kinds, not type names — every failure
/// in the kernel is one of these, never a bespoke variant hiding in a
/// submodule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorKind {
    SchemaInvalid,
    InputInvalid,
    Unauthorized,
    IntegrityFail,
    ChainBreak,
    GenesisViolation,
    GraphIdMismatch,
    HashSchemeMismatch,
    TemporalViolation,
    SignatureInvalid,
    FloatNotAllowed,
    CanonicalEncoding,
    WALCorruption,
    WALHeader,
    WALChain,
    WALSequence,
    PackValidation,
    JudgmentValidation,
    SchemaNotFound,
    Internal,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::SchemaInvalid => "SCHEMA_INVALID",
            ErrorKind::InputInvalid => "INPUT_INVALID",
            ErrorKind::Unauthorized => "UNAUTHORIZED",
            ErrorKind::IntegrityFail => "INTEGRITY_FAIL",
            ErrorKind::ChainBreak => "CHAIN_BREAK",
            ErrorKind::GenesisViolation => "GENESIS_VIOLATION",
            ErrorKind::GraphIdMismatch => "GRAPH_ID_MISMATCH",
            ErrorKind::HashSchemeMismatch => "HASH_SCHEME_MISMATCH",
            ErrorKind::TemporalViolation => "TEMPORAL_VIOLATION",
            ErrorKind::SignatureInvalid => "SIGNATURE_INVALID",
            ErrorKind::FloatNotAllowed => "FLOAT_NOT_ALLOWED",
            ErrorKind::CanonicalEncoding => "CANONICAL_ENCODING",
            ErrorKind::WALCorruption => "WAL_CORRUPTION",
            ErrorKind::WALHeader => "WAL_HEADER",
            ErrorKind::WALChain => "WAL_CHAIN",
            ErrorKind::WALSequence => "WAL_SEQUENCE",
            ErrorKind::PackValidation => "PACK_VALIDATION",
            ErrorKind::JudgmentValidation => "JUDGMENT_VALIDATION",
            ErrorKind::SchemaNotFound => "SCHEMA_NOT_FOUND",
            ErrorKind::Internal => "INTERNAL",
        }
    }

    /// CLI exit code mapping.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorKind::InputInvalid | ErrorKind::SchemaInvalid => 10,
            ErrorKind::PackValidation => 11,
            ErrorKind::IntegrityFail
            | ErrorKind::ChainBreak
            | ErrorKind::GenesisViolation
            | ErrorKind::GraphIdMismatch
            | ErrorKind::HashSchemeMismatch
            | ErrorKind::SignatureInvalid => 12,
            ErrorKind::Internal => 20,
            _ => 1,
        }
    }
}

/// Wrap any other error as `Internal`, preserving its message as context.
/// The only place a foreign error is allowed to enter the crate.
impl From<std::io::Error> for LedgerError {
    fn from(e: std::io::Error) -> Self {
        LedgerError::new(ErrorKind::Internal, e.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(e: serde_json::Error) -> Self {
        LedgerError::new(ErrorKind::SchemaInvalid, e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_match_taxonomy() {
        assert_eq!(ErrorKind::InputInvalid.exit_code(), 10);
        assert_eq!(ErrorKind::PackValidation.exit_code(), 11);
        assert_eq!(ErrorKind::ChainBreak.exit_code(), 12);
        assert_eq!(ErrorKind::Internal.exit_code(), 20);
    }

    #[test]
    fn details_are_deterministically_ordered() {
        let err = LedgerError::new(ErrorKind::ChainBreak, "prev hash mismatch")
            .with_detail("z", "1")
            .with_detail("a", "2");
        let keys: Vec<&String> = err.details.keys().collect();
        assert_eq!(keys, vec!["a", "z"]);
    }

    #[test]
    fn to_json_round_trips_code_and_message() {
        let err = LedgerError::new(ErrorKind::FloatNotAllowed, "float at fact.confidence");
        let json = err.to_json();
        assert_eq!(json["code"], "FLOAT_NOT_ALLOWED");
        assert_eq!(json["message"], "float at fact.confidence");
    }
}
