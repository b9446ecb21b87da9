//! The three-layer precedent engine: comparability gates (L1), typed field
//! comparison and scoring (L2), and governed confidence (L3).
//!
//! Grounded on `examples/original_source/decisiongraph-complete/src/kernel/
//! precedent/` (`comparability_gate.py`, `field_comparators.py`) and
//! `examples/original_source/decisiongraph-complete/src/decisiongraph/`
//! (`precedent_scorer_v3.py`, `governed_confidence.py`).

pub mod comparators;
pub mod confidence;
pub mod gates;
pub mod registry;
pub mod scorer;

pub use comparators::compare_field;
pub use confidence::{compute_governed_confidence, ConfidenceDimension, GovernedConfidenceResult};
pub use gates::{evaluate_gates, GateResult};
pub use registry::{PrecedentQuery, PrecedentRegistry, PrecedentStatistics};
pub use scorer::{classify_match_v3, detect_primary_typology, score_similarity, MatchClass, SimilarityResult};
