//! The manifest is a cache, never a source of truth: every field in it is
//! recomputable by walking the segment files on disk. `Manifest::rebuild`
//! is what recovery calls after a crash; `Manifest::load` is the fast path
//! that trusts the cache once its own checksum confirms it wasn't the thing
//! that got corrupted.

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{decode_header, decode_record, manifest_path, segment_path, NULL_RECORD_HASH};
use crate::error::{ErrorKind, LedgerError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SegmentMetadata {
    pub index: u64,
    pub path: PathBuf,
    pub record_count: u64,
    pub last_sequence: Option<u64>,
    pub last_record_hash: Option<String>,
    pub byte_len: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Manifest {
    pub graph_id: String,
    pub hash_scheme: String,
    pub segments: Vec<SegmentMetadata>,
}

impl Manifest {
    pub fn total_records(&self) -> u64 {
        self.segments.iter().map(|s| s.record_count).sum()
    }

    pub fn next_sequence(&self) -> u64 {
        self.segments
            .last()
            .and_then(|s| s.last_sequence)
            .map(|s| s + 1)
            .unwrap_or(0)
    }

    pub fn last_record_hash(&self) -> [u8; 32] {
        self.segments
            .last()
            .and_then(|s| s.last_record_hash.as_deref())
            .map(|h| {
                let bytes = hex::decode(h).expect("manifest stores valid hex");
                let mut out = [0u8; 32];
                out.copy_from_slice(&bytes);
                out
            })
            .unwrap_or(NULL_RECORD_HASH)
    }

    /// Write the manifest atomically: write to a temp file in the same
    /// directory, then rename over the target, so a crash mid-write never
    /// leaves a half-written manifest behind.
    pub fn save(&self, dir: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(self)?;
        let tmp_path = dir.join("manifest.json.tmp");
        {
            let mut f = fs::File::create(&tmp_path)?;
            f.write_all(&json)?;
            f.sync_all()?;
        }
        fs::rename(&tmp_path, manifest_path(dir))?;
        Ok(())
    }

    pub fn load(dir: &Path) -> Result<Option<Self>> {
        let path = manifest_path(dir);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path)?;
        let manifest: Manifest = serde_json::from_slice(&bytes)?;
        Ok(Some(manifest))
    }

    /// Recompute the manifest from scratch by reading every segment file in
    /// `dir`, verifying each record's CRC and hash chain as it goes. This
    /// is the recovery path: if the cached manifest is missing, stale, or
    /// itself suspected corrupt, the segments remain the ground truth.
    pub fn rebuild(dir: &Path, expected_graph_id: &str, expected_hash_scheme: &str) -> Result<Self> {
        let mut segment_indices = Vec::new();
        if dir.exists() {
            for entry in fs::read_dir(dir)? {
                let entry = entry?;
                let name = entry.file_name();
                let name = name.to_string_lossy();
                if let Some(stripped) = name.strip_prefix("segment-").and_then(|s| s.strip_suffix(".wal")) {
                    if let Ok(index) = stripped.parse::<u64>() {
                        segment_indices.push(index);
                    }
                }
            }
        }
        segment_indices.sort_unstable();

        let mut segments = Vec::new();
        let mut prev_hash = NULL_RECORD_HASH;
        let mut next_sequence = 0u64;

        for index in segment_indices {
            let path = segment_path(dir, index);
            let bytes = fs::read(&path)?;
            if bytes.len() < super::HEADER_LEN {
                return Err(LedgerError::new(ErrorKind::WALCorruption, format!("segment {index} shorter than header")));
            }
            let header = decode_header(&bytes[..super::HEADER_LEN])?;
            if header.graph_id != expected_graph_id {
                return Err(LedgerError::new(ErrorKind::WALHeader, format!("segment {index} graph_id mismatch")));
            }
            if header.hash_scheme != expected_hash_scheme {
                return Err(LedgerError::new(ErrorKind::WALHeader, format!("segment {index} hash_scheme mismatch")));
            }

            let mut offset = super::HEADER_LEN;
            let mut record_count = 0u64;
            let mut last_sequence = None;
            while offset < bytes.len() {
                let (record, consumed) = decode_record(&bytes[offset..])?;
                if record.sequence != next_sequence {
                    return Err(LedgerError::new(
                        ErrorKind::WALSequence,
                        format!("expected sequence {next_sequence}, found {}", record.sequence),
                    ));
                }
                if record.prev_hash != prev_hash {
                    return Err(LedgerError::new(ErrorKind::WALChain, format!("broken hash chain at sequence {next_sequence}")));
                }
                prev_hash = record.record_hash;
                last_sequence = Some(record.sequence);
                next_sequence += 1;
                record_count += 1;
                offset += consumed;
            }

            segments.push(SegmentMetadata {
                index,
                path,
                record_count,
                last_sequence,
                last_record_hash: last_sequence.map(|_| hex::encode(prev_hash)),
                byte_len: bytes.len() as u64,
            });
        }

        Ok(Manifest {
            graph_id: expected_graph_id.to_string(),
            hash_scheme: expected_hash_scheme.to_string(),
            segments,
        })
    }
}
