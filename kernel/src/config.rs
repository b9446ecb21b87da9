//! `EngineConfig`: the small set of operator-tunable knobs — WAL segment
//! cap, default similarity floor, pool minimum, engine version string — all
//! overridable from an optional TOML file so a deployment never has to
//! touch code to retune them.
//!
//! Grounded on the general "load settings via `serde` + an on-disk format"
//! idiom (`toml`, as `examples/CodeChain-io-codechain/Cargo.toml` depends
//! on `toml = "0.4"`).

use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, LedgerError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub engine_version: String,
    pub wal_segment_bytes: u64,
    pub default_similarity_floor: f64,
    pub default_pool_minimum: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            wal_segment_bytes: crate::wal::DEFAULT_SEGMENT_BYTES as u64,
            default_similarity_floor: 0.60,
            default_pool_minimum: 5,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(text)
            .map_err(|e| LedgerError::new(ErrorKind::SchemaInvalid, format!("invalid engine config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &std::path::Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.wal_segment_bytes == 0 {
            return Err(LedgerError::new(ErrorKind::InputInvalid, "wal_segment_bytes must be positive"));
        }
        if !(0.0..=1.0).contains(&self.default_similarity_floor) {
            return Err(LedgerError::new(ErrorKind::InputInvalid, "default_similarity_floor must be in [0,1]"));
        }
        if self.default_pool_minimum == 0 {
            return Err(LedgerError::new(ErrorKind::InputInvalid, "default_pool_minimum must be at least 1"));
        }
        Ok(())
    }
}

/// Context an engine call carries end to end: the resolved config plus the
/// `graph_id`/domain it is currently operating against. Kept separate from
/// `EngineConfig` itself so the same config can back many contexts.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: EngineConfig,
    pub graph_id: String,
    pub domain: String,
}

impl Context {
    pub fn new(config: EngineConfig, graph_id: impl Into<String>, domain: impl Into<String>) -> Self {
        Self { config, graph_id: graph_id.into(), domain: domain.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn toml_round_trips_overrides() {
        let text = r#"
            wal_segment_bytes = 1048576
            default_similarity_floor = 0.75
            default_pool_minimum = 3
        "#;
        let config = EngineConfig::from_toml_str(text).unwrap();
        assert_eq!(config.wal_segment_bytes, 1_048_576);
        assert_eq!(config.default_pool_minimum, 3);
    }

    #[test]
    fn rejects_out_of_range_similarity_floor() {
        let text = "default_similarity_floor = 1.5";
        assert!(EngineConfig::from_toml_str(text).is_err());
    }
}
