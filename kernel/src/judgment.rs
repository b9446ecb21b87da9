//! `JudgmentPayload`: the structured content a `JUDGMENT` cell's `Fact`
//! carries, parsed out of the cell's canonical fields.
//!
//! Grounded on references to `kernel.foundation.judgment` in
//! `examples/original_source/decisiongraph-complete/src/kernel/precedent/
//! precedent_registry.py` (`parse_judgment_payload`, `is_judgment_cell`).

use crate::cell::{Cell, CellType};
use crate::error::{ErrorKind, LedgerError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JudgmentPayload {
    pub disposition: String,
    pub disposition_basis: String,
    pub reason_codes: Vec<String>,
    pub reporting_obligation: Option<String>,
    /// Tier-0 exact-match key: the case fingerprint this judgment was
    /// rendered against, used by `PrecedentRegistry::find_by_fingerprint`.
    pub fingerprint_hash: Option<String>,
    pub jurisdiction_code: Option<String>,
    pub decision_level: Option<String>,
    pub policy_regime: Option<String>,
    /// `None` if never appealed, `Some("appealed")` if appealed and still
    /// standing, `Some("overturned")` if the appeal succeeded.
    pub appeal_status: Option<String>,
}

pub fn is_judgment_cell(cell: &Cell) -> bool {
    cell.header.cell_type == CellType::Judgment
}

/// Parse the judgment payload out of a `JUDGMENT` cell's fact. The fact's
/// `object` field carries a `|`-delimited encoding:
/// `disposition|disposition_basis|reason_code_1,reason_code_2,...` followed
/// by five optional trailing fields, in order: `reporting_obligation`,
/// `fingerprint_hash`, `jurisdiction_code`, `decision_level`,
/// `policy_regime`, `appeal_status`. Any suffix may be omitted, matching
/// the compact inline encoding the fact model already uses for
/// string-only values — older two- or three-part judgment objects still
/// parse, with every trailing field defaulting to `None`.
pub fn parse_judgment_payload(cell: &Cell) -> Result<JudgmentPayload> {
    if !is_judgment_cell(cell) {
        return Err(LedgerError::new(ErrorKind::JudgmentValidation, "cell is not a JUDGMENT cell"));
    }
    let parts: Vec<&str> = cell.fact.object.split('|').collect();
    if parts.len() < 2 {
        return Err(LedgerError::new(
            ErrorKind::JudgmentValidation,
            "judgment fact.object must encode at least disposition|disposition_basis",
        ));
    }
    let disposition = parts[0].to_string();
    let disposition_basis = parts[1].to_string();
    let reason_codes = parts
        .get(2)
        .map(|s| s.split(',').filter(|c| !c.is_empty()).map(|c| c.to_string()).collect())
        .unwrap_or_default();
    let opt = |i: usize| parts.get(i).filter(|s| !s.is_empty()).map(|s| s.to_string());
    let reporting_obligation = opt(3);
    let fingerprint_hash = opt(4);
    let jurisdiction_code = opt(5);
    let decision_level = opt(6);
    let policy_regime = opt(7);
    let appeal_status = opt(8);

    if disposition.is_empty() || disposition_basis.is_empty() {
        return Err(LedgerError::new(ErrorKind::JudgmentValidation, "disposition and disposition_basis must be non-empty"));
    }

    Ok(JudgmentPayload {
        disposition,
        disposition_basis,
        reason_codes,
        reporting_obligation,
        fingerprint_hash,
        jurisdiction_code,
        decision_level,
        policy_regime,
        appeal_status,
    })
}

/// Encode a payload back into the `|`-delimited `fact.object` form
/// `parse_judgment_payload` reads. Trailing fields that are all `None` are
/// dropped rather than emitted as empty segments, so a payload with no
/// optional data round-trips to the same compact form older callers wrote.
pub fn encode_judgment_object(payload: &JudgmentPayload) -> String {
    let mut fields = vec![
        payload.disposition.clone(),
        payload.disposition_basis.clone(),
        payload.reason_codes.join(","),
        payload.reporting_obligation.clone().unwrap_or_default(),
        payload.fingerprint_hash.clone().unwrap_or_default(),
        payload.jurisdiction_code.clone().unwrap_or_default(),
        payload.decision_level.clone().unwrap_or_default(),
        payload.policy_regime.clone().unwrap_or_default(),
        payload.appeal_status.clone().unwrap_or_default(),
    ];
    while fields.last().is_some_and(|f| f.is_empty()) {
        fields.pop();
    }
    fields.join("|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{create_genesis_cell, HASH_SCHEME_CANONICAL};
    use chrono::{TimeZone, Utc};

    fn judgment_cell(object: &str) -> Cell {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let mut cell = create_genesis_cell("g1".to_string(), HASH_SCHEME_CANONICAL, "root", "system:test", now).unwrap();
        cell.header.cell_type = CellType::Judgment;
        cell.fact.object = object.to_string();
        cell.cell_id = crate::cell::compute_cell_id(&cell);
        cell
    }

    #[test]
    fn parses_disposition_and_basis() {
        let cell = judgment_cell("BLOCK|MANDATORY|sanctions_hit,structuring");
        let payload = parse_judgment_payload(&cell).unwrap();
        assert_eq!(payload.disposition, "BLOCK");
        assert_eq!(payload.disposition_basis, "MANDATORY");
        assert_eq!(payload.reason_codes, vec!["sanctions_hit".to_string(), "structuring".to_string()]);
    }

    #[test]
    fn rejects_malformed_payload() {
        let cell = judgment_cell("BLOCK");
        assert!(parse_judgment_payload(&cell).is_err());
    }

    #[test]
    fn rejects_non_judgment_cell() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let cell = create_genesis_cell("g1".to_string(), HASH_SCHEME_CANONICAL, "root", "system:test", now).unwrap();
        assert!(parse_judgment_payload(&cell).is_err());
    }

    #[test]
    fn parses_trailing_regime_and_appeal_fields() {
        let cell = judgment_cell("BLOCK|MANDATORY|sanctions_hit|MANDATORY_SAR|fp-abc123|US|senior_reviewer|banking_aml|overturned");
        let payload = parse_judgment_payload(&cell).unwrap();
        assert_eq!(payload.fingerprint_hash.as_deref(), Some("fp-abc123"));
        assert_eq!(payload.jurisdiction_code.as_deref(), Some("US"));
        assert_eq!(payload.decision_level.as_deref(), Some("senior_reviewer"));
        assert_eq!(payload.policy_regime.as_deref(), Some("banking_aml"));
        assert_eq!(payload.appeal_status.as_deref(), Some("overturned"));
    }

    #[test]
    fn omitted_trailing_fields_default_to_none() {
        let cell = judgment_cell("BLOCK|MANDATORY|sanctions_hit");
        let payload = parse_judgment_payload(&cell).unwrap();
        assert_eq!(payload.fingerprint_hash, None);
        assert_eq!(payload.appeal_status, None);
    }

    #[test]
    fn encode_then_parse_round_trips_all_fields() {
        let payload = JudgmentPayload {
            disposition: "ALLOW".to_string(),
            disposition_basis: "DISCRETIONARY".to_string(),
            reason_codes: vec!["low_risk".to_string()],
            reporting_obligation: None,
            fingerprint_hash: Some("fp-xyz".to_string()),
            jurisdiction_code: Some("UK".to_string()),
            decision_level: None,
            policy_regime: Some("banking_aml".to_string()),
            appeal_status: None,
        };
        let cell = judgment_cell(&encode_judgment_object(&payload));
        let parsed = parse_judgment_payload(&cell).unwrap();
        assert_eq!(parsed, payload);
    }

    #[test]
    fn encode_drops_trailing_empty_fields() {
        let payload = JudgmentPayload {
            disposition: "BLOCK".to_string(),
            disposition_basis: "MANDATORY".to_string(),
            reason_codes: vec!["sanctions_hit".to_string()],
            reporting_obligation: None,
            fingerprint_hash: None,
            jurisdiction_code: None,
            decision_level: None,
            policy_regime: None,
            appeal_status: None,
        };
        assert_eq!(encode_judgment_object(&payload), "BLOCK|MANDATORY|sanctions_hit");
    }
}
