//! Decision Pack: the output contract of a decision, built for transport
//! and golden-file comparison rather than on-chain storage — it is
//! serialized with `serde_json`, not canonical bytes, because it is
//! consumed by humans and downstream reporting, not re-hashed on-chain.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackMeta {
    pub case_id: String,
    pub input_hash: String,
    pub engine_version: String,
    pub policy_version: String,
    pub report_timestamp: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackDecision {
    pub verdict: String,
    pub str_required: bool,
    pub escalation: Option<String>,
    pub path: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationTraceEntry {
    pub evidence_reference: String,
    pub weight: f64,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrecedentAnalysis {
    pub pool_size: usize,
    pub confidence_level: String,
    pub bottleneck: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionPack {
    pub meta: PackMeta,
    pub decision: PackDecision,
    pub evaluation_trace: Vec<EvaluationTraceEntry>,
    /// Layer name ("layer_1" .. "layer_6") -> free-form fact map for that
    /// layer, from structural facts through suspicion scoring.
    pub layers: BTreeMap<String, BTreeMap<String, String>>,
    pub precedent_analysis: Option<PrecedentAnalysis>,
    pub policy_regime: Option<String>,
}

impl DecisionPack {
    /// Serialize for golden-file comparison: `report_timestamp` stripped
    /// (it is wall-clock and never reproducible across runs) and object
    /// keys sorted, since `serde_json::Value`'s `Map` preserves insertion
    /// order by default.
    pub fn golden_json(&self) -> crate::error::Result<serde_json::Value> {
        let mut value = serde_json::to_value(self)?;
        if let Some(meta) = value.get_mut("meta").and_then(|m| m.as_object_mut()) {
            meta.remove("report_timestamp");
        }
        Ok(sort_keys(value))
    }
}

fn sort_keys(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let sorted: std::collections::BTreeMap<String, serde_json::Value> =
                map.into_iter().map(|(k, v)| (k, sort_keys(v))).collect();
            let mut out = serde_json::Map::new();
            for (k, v) in sorted {
                out.insert(k, v);
            }
            serde_json::Value::Object(out)
        }
        serde_json::Value::Array(items) => serde_json::Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}
