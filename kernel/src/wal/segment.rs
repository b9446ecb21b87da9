//! Segment-level reader and writer: the only code in this crate allowed to
//! call `fsync`.

use std::fs::{File, OpenOptions};
use std::io::{Read as _, Write as _};
use std::path::{Path, PathBuf};

use crate::canon;
use crate::error::{ErrorKind, LedgerError, Result};

use super::{decode_record, encode_header, segment_path, RecordPlain, NULL_RECORD_HASH};

/// Appends records to one segment file, rolling to the next segment once
/// `max_bytes` is exceeded.
pub struct SegmentWriter {
    dir: PathBuf,
    hash_scheme: String,
    graph_id: String,
    max_bytes: u64,
    segment_index: u64,
    file: File,
    bytes_written: u64,
    next_sequence: u64,
    prev_hash: [u8; 32],
}

impl SegmentWriter {
    /// Open (creating if absent) the segment at `segment_index`, writing a
    /// fresh header if the file is new.
    pub fn open(
        dir: &Path,
        hash_scheme: &str,
        graph_id: &str,
        segment_index: u64,
        max_bytes: u64,
        next_sequence: u64,
        prev_hash: [u8; 32],
    ) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let path = segment_path(dir, segment_index);
        let is_new = !path.exists();
        let mut file = OpenOptions::new().create(true).append(true).read(true).open(&path)?;
        let bytes_written = file.metadata()?.len();
        if is_new {
            let header = encode_header(hash_scheme, graph_id)?;
            file.write_all(&header)?;
            file.sync_all()?;
        }
        let bytes_written = if is_new { super::HEADER_LEN as u64 } else { bytes_written };
        Ok(Self {
            dir: dir.to_path_buf(),
            hash_scheme: hash_scheme.to_string(),
            graph_id: graph_id.to_string(),
            max_bytes,
            segment_index,
            file,
            bytes_written,
            next_sequence,
            prev_hash,
        })
    }

    /// Append `cell_hash`/`canonical_value` as the next record and fsync
    /// before returning. The caller must not acknowledge a commit until
    /// this returns `Ok` — that is the durability half of the commit gate.
    pub fn append(&mut self, cell_hash: [u8; 32], canonical_value: &canon::Value) -> Result<[u8; 32]> {
        if self.bytes_written >= self.max_bytes {
            self.roll()?;
        }
        let record = RecordPlain {
            sequence: self.next_sequence,
            flags: 0,
            prev_hash: self.prev_hash,
            cell_hash,
            canonical_bytes: canon::canonical_json_bytes(canonical_value),
        };
        let encoded = record.encode();
        self.file.write_all(&encoded)?;
        self.file.sync_all()?;
        self.bytes_written += encoded.len() as u64;
        self.next_sequence += 1;
        let hash = record.record_hash();
        self.prev_hash = hash;
        Ok(hash)
    }

    fn roll(&mut self) -> Result<()> {
        self.segment_index += 1;
        let path = segment_path(&self.dir, self.segment_index);
        let mut file = OpenOptions::new().create(true).append(true).read(true).open(&path)?;
        let header = encode_header(&self.hash_scheme, &self.graph_id)?;
        file.write_all(&header)?;
        file.sync_all()?;
        self.file = file;
        self.bytes_written = super::HEADER_LEN as u64;
        Ok(())
    }

    pub fn segment_index(&self) -> u64 {
        self.segment_index
    }

    pub fn last_hash(&self) -> [u8; 32] {
        self.prev_hash
    }
}

/// Sequentially reads every record out of one segment file.
pub struct SegmentReader {
    records: Vec<super::RecordView>,
    position: usize,
}

impl SegmentReader {
    pub fn open(path: &Path) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        if bytes.len() < super::HEADER_LEN {
            return Err(LedgerError::new(ErrorKind::WALCorruption, "segment shorter than header"));
        }
        let _header = super::decode_header(&bytes[..super::HEADER_LEN])?;
        let mut records = Vec::new();
        let mut offset = super::HEADER_LEN;
        let mut expected_prev = NULL_RECORD_HASH;
        while offset < bytes.len() {
            let (record, consumed) = decode_record(&bytes[offset..])?;
            if record.prev_hash != expected_prev {
                return Err(LedgerError::new(ErrorKind::WALChain, "segment record chain broken"));
            }
            expected_prev = record.record_hash;
            records.push(record);
            offset += consumed;
        }
        Ok(Self { records, position: 0 })
    }

    pub fn records(&self) -> &[super::RecordView] {
        &self.records
    }
}

impl Iterator for SegmentReader {
    type Item = super::RecordView;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.records.len() {
            return None;
        }
        let record = self.records[self.position].clone();
        self.position += 1;
        Some(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canon::Value;

    #[test]
    fn append_then_read_back_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let mut writer = SegmentWriter::open(tmp.path(), "canon:rfc8785:v1", "g1", 0, super::super::DEFAULT_SEGMENT_BYTES, 0, NULL_RECORD_HASH).unwrap();
        let value = Value::from("hello");
        let cell_hash = crate::wal::sha256(b"cell-1");
        writer.append(cell_hash, &value).unwrap();

        let path = segment_path(tmp.path(), 0);
        let reader = SegmentReader::open(&path).unwrap();
        let records: Vec<_> = reader.collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].cell_hash, cell_hash);
    }

    #[test]
    fn writer_rolls_to_new_segment_past_size_cap() {
        let tmp = tempfile::tempdir().unwrap();
        let mut writer = SegmentWriter::open(tmp.path(), "canon:rfc8785:v1", "g1", 0, 100, 0, NULL_RECORD_HASH).unwrap();
        for i in 0..20 {
            let value = Value::from(format!("payload-{i}"));
            writer.append(crate::wal::sha256(format!("c{i}").as_bytes()), &value).unwrap();
        }
        assert!(writer.segment_index() > 0);
    }

    #[test]
    fn reader_rejects_broken_chain_mid_segment() {
        let tmp = tempfile::tempdir().unwrap();
        let mut bytes = encode_header("canon:rfc8785:v1", "g1").unwrap().to_vec();
        let r0 = RecordPlain {
            sequence: 0,
            flags: 0,
            prev_hash: NULL_RECORD_HASH,
            cell_hash: crate::wal::sha256(b"c0"),
            canonical_bytes: b"{}".to_vec(),
        };
        bytes.extend_from_slice(&r0.encode());
        let r1 = RecordPlain {
            sequence: 1,
            flags: 0,
            prev_hash: [0x11; 32],
            cell_hash: crate::wal::sha256(b"c1"),
            canonical_bytes: b"{}".to_vec(),
        };
        bytes.extend_from_slice(&r1.encode());
        let path = segment_path(tmp.path(), 0);
        std::fs::write(&path, &bytes).unwrap();
        assert!(SegmentReader::open(&path).is_err());
    }
}
