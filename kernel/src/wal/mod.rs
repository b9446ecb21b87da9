//! Segmented write-ahead log: append-only, crash-safe, hash-chained
//! persistence for cells, independent of the in-memory [`crate::chain::Chain`].
//!
//! Grounded on `examples/original_source/decisiongraph-complete/src/kernel/
//! foundation/wal.py`'s byte format docstring, reworked as typed Rust
//! read/write paths instead of `struct.pack`/`struct.unpack` calls. CRC32C
//! is supplied by the `crc32c` crate (the pack's own choice — see
//! `other_examples/manifests/{soilSpoon-pi_agent_rust,
//! Dicklesworthstone-frankensqlite}/Cargo.toml`) rather than a hand-rolled
//! implementation.
//!
//! # Format
//! ```text
//! HEADER (68 bytes):
//!   magic:        8 bytes   b"DGWAL\x00\x01\x00"
//!   version:      2 bytes   u16 LE
//!   hash_scheme: 32 bytes   UTF-8, zero-padded
//!   graph_id:    20 bytes   UTF-8, zero-padded
//!   flags:        2 bytes   reserved, 0x0000
//!   header_crc:   4 bytes   CRC32C of the preceding 64 bytes
//!
//! RECORD (variable):
//!   record_len:      4 bytes   u32 LE, total size including this field
//!   sequence:        8 bytes   u64 LE, monotonic, 0-indexed
//!   flags:           2 bytes   u16 LE, reserved
//!   prev_hash:      32 bytes   SHA-256 of the previous record's hash input
//!   cell_hash:      32 bytes   SHA-256 of canonical_bytes
//!   canonical_bytes: N bytes   RFC 8785 cell payload
//!   record_crc:      4 bytes   CRC32C of [record_len..canonical_bytes]
//! ```
//!
//! The record hash used for chaining is
//! `SHA256(record_len || sequence || flags || prev_hash || cell_hash ||
//! canonical_bytes || record_crc)`.

pub mod manifest;
pub mod segment;

pub use manifest::{Manifest, SegmentMetadata};
pub use segment::{SegmentReader, SegmentWriter};

use std::path::{Path, PathBuf};

use sha2::{Digest as _, Sha256};

use crate::error::{ErrorKind, LedgerError, Result};

pub const MAGIC: &[u8; 8] = b"DGWAL\x00\x01\x00";
pub const WAL_VERSION: u16 = 1;
pub const HEADER_LEN: usize = 68;
pub const HASH_SCHEME_FIELD_LEN: usize = 32;
pub const GRAPH_ID_FIELD_LEN: usize = 20;
pub const RECORD_HASH_LEN: usize = 32;

/// The all-zero record hash that seeds the chain of the first record in a
/// segment.
pub const NULL_RECORD_HASH: [u8; RECORD_HASH_LEN] = [0u8; RECORD_HASH_LEN];

pub fn sha256(data: &[u8]) -> [u8; 32] {
    let digest = Sha256::digest(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

fn crc32c_of(data: &[u8]) -> u32 {
    crc32c::crc32c(data)
}

/// A fixed-width, zero-padded UTF-8 field, as used for `hash_scheme` and
/// `graph_id` in the segment header.
pub fn pad_field(value: &str, width: usize) -> Result<[u8; 32]> {
    debug_assert!(width <= 32);
    let bytes = value.as_bytes();
    if bytes.len() > width {
        return Err(LedgerError::new(
            ErrorKind::WALHeader,
            format!("field '{value}' exceeds fixed width {width}"),
        ));
    }
    let mut out = [0u8; 32];
    out[..bytes.len()].copy_from_slice(bytes);
    Ok(out)
}

pub fn unpad_field(bytes: &[u8]) -> Result<String> {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8(bytes[..end].to_vec())
        .map_err(|e| LedgerError::new(ErrorKind::WALHeader, format!("field is not valid UTF-8: {e}")))
}

/// Encode the 68-byte segment header.
pub fn encode_header(hash_scheme: &str, graph_id: &str) -> Result<[u8; HEADER_LEN]> {
    let mut out = [0u8; HEADER_LEN];
    out[0..8].copy_from_slice(MAGIC);
    out[8..10].copy_from_slice(&WAL_VERSION.to_le_bytes());
    let hs = pad_field(hash_scheme, HASH_SCHEME_FIELD_LEN)?;
    out[10..42].copy_from_slice(&hs[..HASH_SCHEME_FIELD_LEN]);
    let gid = pad_field(graph_id, GRAPH_ID_FIELD_LEN)?;
    out[42..62].copy_from_slice(&gid[..GRAPH_ID_FIELD_LEN]);
    out[62..64].copy_from_slice(&0u16.to_le_bytes()); // flags, reserved
    let crc = crc32c_of(&out[0..64]);
    out[64..68].copy_from_slice(&crc.to_le_bytes());
    Ok(out)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentHeader {
    pub version: u16,
    pub hash_scheme: String,
    pub graph_id: String,
}

pub fn decode_header(bytes: &[u8]) -> Result<SegmentHeader> {
    if bytes.len() != HEADER_LEN {
        return Err(LedgerError::new(
            ErrorKind::WALHeader,
            format!("segment header must be {HEADER_LEN} bytes, got {}", bytes.len()),
        ));
    }
    if &bytes[0..8] != MAGIC {
        return Err(LedgerError::new(ErrorKind::WALHeader, "bad WAL magic"));
    }
    let version = u16::from_le_bytes([bytes[8], bytes[9]]);
    let hash_scheme = unpad_field(&bytes[10..42])?;
    let graph_id = unpad_field(&bytes[42..62])?;
    let expected_crc = u32::from_le_bytes([bytes[64], bytes[65], bytes[66], bytes[67]]);
    let actual_crc = crc32c_of(&bytes[0..64]);
    if expected_crc != actual_crc {
        return Err(LedgerError::new(ErrorKind::WALHeader, "segment header CRC mismatch").with_detail(
            "expected",
            expected_crc.to_string(),
        ));
    }
    Ok(SegmentHeader { version, hash_scheme, graph_id })
}

/// One WAL record before it is framed into bytes.
#[derive(Debug, Clone)]
pub struct RecordPlain {
    pub sequence: u64,
    pub flags: u16,
    pub prev_hash: [u8; RECORD_HASH_LEN],
    pub cell_hash: [u8; RECORD_HASH_LEN],
    pub canonical_bytes: Vec<u8>,
}

impl RecordPlain {
    /// Frame this record into its on-disk byte representation.
    pub fn encode(&self) -> Vec<u8> {
        let body_len = 4 + 8 + 2 + 32 + 32 + self.canonical_bytes.len() + 4;
        let mut out = Vec::with_capacity(body_len);
        out.extend_from_slice(&(body_len as u32).to_le_bytes());
        out.extend_from_slice(&self.sequence.to_le_bytes());
        out.extend_from_slice(&self.flags.to_le_bytes());
        out.extend_from_slice(&self.prev_hash);
        out.extend_from_slice(&self.cell_hash);
        out.extend_from_slice(&self.canonical_bytes);
        let crc = crc32c_of(&out);
        out.extend_from_slice(&crc.to_le_bytes());
        out
    }

    /// The hash used to chain this record to the next: SHA-256 over the
    /// full framed bytes (including the trailing CRC).
    pub fn record_hash(&self) -> [u8; 32] {
        sha256(&self.encode())
    }
}

/// A decoded record, as read back from a segment.
#[derive(Debug, Clone)]
pub struct RecordView {
    pub sequence: u64,
    pub flags: u16,
    pub prev_hash: [u8; RECORD_HASH_LEN],
    pub cell_hash: [u8; RECORD_HASH_LEN],
    pub canonical_bytes: Vec<u8>,
    pub record_hash: [u8; 32],
}

/// Parse one framed record out of `buf`, returning the view and the number
/// of bytes consumed. `buf` may contain trailing bytes belonging to later
/// records.
pub fn decode_record(buf: &[u8]) -> Result<(RecordView, usize)> {
    if buf.len() < 4 {
        return Err(LedgerError::new(ErrorKind::WALCorruption, "truncated record length prefix"));
    }
    let record_len = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
    if record_len < 4 + 8 + 2 + 32 + 32 + 4 || record_len > buf.len() {
        return Err(LedgerError::new(
            ErrorKind::WALCorruption,
            format!("invalid or truncated record length {record_len}"),
        ));
    }
    let frame = &buf[..record_len];
    let crc_offset = record_len - 4;
    let expected_crc = u32::from_le_bytes([
        frame[crc_offset],
        frame[crc_offset + 1],
        frame[crc_offset + 2],
        frame[crc_offset + 3],
    ]);
    let actual_crc = crc32c_of(&frame[..crc_offset]);
    if expected_crc != actual_crc {
        return Err(LedgerError::new(ErrorKind::WALCorruption, "record CRC mismatch"));
    }
    let sequence = u64::from_le_bytes(frame[4..12].try_into().unwrap());
    let flags = u16::from_le_bytes([frame[12], frame[13]]);
    let mut prev_hash = [0u8; 32];
    prev_hash.copy_from_slice(&frame[14..46]);
    let mut cell_hash = [0u8; 32];
    cell_hash.copy_from_slice(&frame[46..78]);
    let canonical_bytes = frame[78..crc_offset].to_vec();
    let record_hash = sha256(frame);
    Ok((
        RecordView { sequence, flags, prev_hash, cell_hash, canonical_bytes, record_hash },
        record_len,
    ))
}

/// Default segment size cap (64 MiB) before the writer rolls to a new file.
pub const DEFAULT_SEGMENT_BYTES: u64 = 64 * 1024 * 1024;

pub fn segment_path(dir: &Path, index: u64) -> PathBuf {
    dir.join(format!("segment-{index:020}.wal"))
}

pub fn manifest_path(dir: &Path) -> PathBuf {
    dir.join("manifest.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trips() {
        let encoded = encode_header("canon:rfc8785:v1", "g1").unwrap();
        let decoded = decode_header(&encoded).unwrap();
        assert_eq!(decoded.version, WAL_VERSION);
        assert_eq!(decoded.hash_scheme, "canon:rfc8785:v1");
        assert_eq!(decoded.graph_id, "g1");
    }

    #[test]
    fn header_rejects_bad_magic() {
        let mut encoded = encode_header("canon:rfc8785:v1", "g1").unwrap();
        encoded[0] = b'X';
        assert!(decode_header(&encoded).is_err());
    }

    #[test]
    fn oversized_graph_id_is_rejected() {
        let long_id = "x".repeat(21);
        assert!(encode_header("canon:rfc8785:v1", &long_id).is_err());
    }

    #[test]
    fn record_round_trips_through_encode_decode() {
        let record = RecordPlain {
            sequence: 7,
            flags: 0,
            prev_hash: NULL_RECORD_HASH,
            cell_hash: sha256(b"cell-content"),
            canonical_bytes: br#"{"a":1}"#.to_vec(),
        };
        let encoded = record.encode();
        let (decoded, consumed) = decode_record(&encoded).unwrap();
        assert_eq!(consumed, encoded.len());
        assert_eq!(decoded.sequence, 7);
        assert_eq!(decoded.cell_hash, record.cell_hash);
        assert_eq!(decoded.canonical_bytes, record.canonical_bytes);
    }

    #[test]
    fn tampered_record_fails_crc() {
        let record = RecordPlain {
            sequence: 0,
            flags: 0,
            prev_hash: NULL_RECORD_HASH,
            cell_hash: sha256(b"x"),
            canonical_bytes: b"{}".to_vec(),
        };
        let mut encoded = record.encode();
        let last = encoded.len() - 1;
        encoded[14] ^= 0xFF; // flip a byte inside prev_hash
        let _ = last;
        assert!(decode_record(&encoded).is_err());
    }

    #[test]
    fn record_hash_chains_sequentially() {
        let r0 = RecordPlain {
            sequence: 0,
            flags: 0,
            prev_hash: NULL_RECORD_HASH,
            cell_hash: sha256(b"c0"),
            canonical_bytes: b"{}".to_vec(),
        };
        let h0 = r0.record_hash();
        let r1 = RecordPlain {
            sequence: 1,
            flags: 0,
            prev_hash: h0,
            cell_hash: sha256(b"c1"),
            canonical_bytes: b"{}".to_vec(),
        };
        let (decoded, _) = decode_record(&r1.encode()).unwrap();
        assert_eq!(decoded.prev_hash, h0);
    }
}
