//! RFC 8785 (JSON Canonicalization Scheme) for the decision ledger.
//!
//! This is the byte physics the whole system is built on: `cell_id`, WAL
//! record hashes, manifest cache checks, and golden-report comparisons all
//! hash these exact bytes. Any divergence between two implementations here
//! produces two different ledgers that can never be reconciled.
//!
//! Unlike a general-purpose `serde_json` encode, this module is hand-rolled
//! because RFC 8785 requires exact control over key ordering (byte order,
//! not locale collation) and number formatting: floats are forbidden in
//! canonical payloads, enforced by this crate's [`Value`] having no float
//! variant at all, so a float cannot even be constructed as canonical
//! content, only rejected at the conversion boundary in [`from_json`].
//!
//! Rules:
//! - Object keys sorted by UTF-8 byte sequence — `BTreeMap<String, _>`'s
//!   `Ord` on `String` already compares by byte value, so storing an
//!   object as a `BTreeMap` gives sorted emission for free.
//! - No insignificant whitespace.
//! - Strings escape only `\`, `"`, and C0 controls.
//! - Numbers are integers only; floats fail loudly (`FloatNotAllowed`).
//! - Arrays preserve insertion order.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use sha2::{Digest as _, Sha256};

use crate::error::{ErrorKind, LedgerError, Result};

/// A value that is, by construction, always canonically encodable: there is
/// no float variant, so "floats are forbidden in canonical payloads" is a
/// type-level guarantee for anything built directly as a `Value`, not just
/// an encode-time check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

impl Value {
    pub fn object() -> BTreeMap<String, Value> {
        BTreeMap::new()
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}
impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}
impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Int(n as i64)
    }
}
impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}
impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}
impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}
impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(x) => x.into(),
            None => Value::Null,
        }
    }
}

/// Escape a string per RFC 8785: only `\`, `"`, and C0 controls (0x00-0x1F).
/// Every other Unicode scalar value is emitted as literal UTF-8.
fn escape_string(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\u{0008}' => out.push_str("\\b"),
            '\u{0009}' => out.push_str("\\t"),
            '\u{000A}' => out.push_str("\\n"),
            '\u{000C}' => out.push_str("\\f"),
            '\u{000D}' => out.push_str("\\r"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

fn encode_into(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Int(n) => {
            let _ = write!(out, "{n}");
        }
        Value::Str(s) => escape_string(s, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                encode_into(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            out.push('{');
            for (i, (k, v)) in map.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                escape_string(k, out);
                out.push(':');
                encode_into(v, out);
            }
            out.push('}');
        }
    }
}

/// Encode `value` to canonical RFC 8785 JSON bytes. THE function for all
/// hashing and signing in this crate.
pub fn canonical_json_bytes(value: &Value) -> Vec<u8> {
    let mut out = String::new();
    encode_into(value, &mut out);
    out.into_bytes()
}

pub fn canonical_json_string(value: &Value) -> String {
    let mut out = String::new();
    encode_into(value, &mut out);
    out
}

/// SHA-256 of the canonical bytes, lowercase hex.
pub fn canonical_hash(value: &Value) -> String {
    let bytes = canonical_json_bytes(value);
    let digest = Sha256::digest(&bytes);
    hex::encode(digest)
}

/// Convert an arbitrary `serde_json::Value` into our canonical [`Value`],
/// rejecting floats and non-string map keys. This is the boundary where a
/// caller's loosely-typed JSON (e.g. deserialized request input) is
/// admitted into the canonical world — equivalent to the original
/// `validate_canonical_safe` plus conversion in one traversal.
pub fn from_json(json: &serde_json::Value) -> Result<Value> {
    from_json_at(json, "")
}

fn from_json_at(json: &serde_json::Value, path: &str) -> Result<Value> {
    match json {
        serde_json::Value::Null => Ok(Value::Null),
        serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Int(i))
            } else {
                Err(LedgerError::new(
                    ErrorKind::FloatNotAllowed,
                    format!("float value at path '{path}' not allowed in canonical JSON"),
                )
                .with_detail("path", path))
            }
        }
        serde_json::Value::String(s) => Ok(Value::Str(s.clone())),
        serde_json::Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                out.push(from_json_at(item, &format!("{path}[{i}]"))?);
            }
            Ok(Value::Array(out))
        }
        serde_json::Value::Object(map) => {
            let mut out = BTreeMap::new();
            for (k, v) in map {
                let key_path = if path.is_empty() { k.clone() } else { format!("{path}.{k}") };
                out.insert(k.clone(), from_json_at(v, &key_path)?);
            }
            Ok(Value::Object(out))
        }
    }
}

/// Pre-flight check: does `json` contain anything that cannot be
/// canonically encoded (a float, at any depth)? Cheaper than a full
/// conversion when the caller only needs a yes/no answer.
pub fn validate_canonical_safe(json: &serde_json::Value) -> Result<()> {
    from_json(json).map(|_| ())
}

/// Round a float to `precision` decimal places and strip trailing zeros,
/// keeping at least one digit after the point.
fn float_to_canonical_string(value: f64, precision: usize) -> String {
    let mut formatted = format!("{value:.precision$}");
    if formatted.contains('.') {
        while formatted.ends_with('0') {
            formatted.pop();
        }
        if formatted.ends_with('.') {
            formatted.push('0');
        }
    }
    formatted
}

/// Convert a confidence value (must be in `[0, 1]`) to its canonical
/// 4-decimal string form, e.g. `0.95`, `1.0`, `0.0`.
pub fn confidence_to_string(confidence: f64) -> Result<String> {
    if !(0.0..=1.0).contains(&confidence) {
        return Err(LedgerError::new(
            ErrorKind::InputInvalid,
            format!("confidence must be in [0,1], got {confidence}"),
        ));
    }
    Ok(float_to_canonical_string(confidence, 4))
}

/// Convert a score/delta value to its canonical 6-decimal string form.
pub fn score_to_string(score: f64) -> String {
    float_to_canonical_string(score, 6)
}
