//! `DomainRegistry`, `FieldDefinition`, and `ComparabilityGate` — the typed
//! schema a domain hands the precedent engine so it never special-cases a
//! domain's field names directly.
//!
//! Grounded on `examples/original_source/decisiongraph-complete/src/kernel/
//! precedent/domain_registry.py` (`FieldType`, `ComparisonFn`, `FieldTier`,
//! `ConfidenceLevel` with its `_LEVEL_ORDER`-based total order,
//! `FieldDefinition.__post_init__` weight validation, `DomainRegistry`'s
//! helper accessors). The Python `__lt__`/`__le__`/... methods on
//! `ConfidenceLevel` become a derived `Ord` here since the five variants
//! already enumerate in rank order.

use std::collections::BTreeMap;

use crate::error::{ErrorKind, LedgerError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldType {
    Boolean,
    Categorical,
    Numeric,
    Ordinal,
    Set,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ComparisonFn {
    Exact,
    EquivalenceClass,
    DistanceDecay,
    Step,
    Jaccard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldTier {
    Structural,
    Behavioral,
    Contextual,
}

/// Governed confidence levels, in ascending strength. Deriving `Ord` here
/// gives exactly the total order the precedent engine relies on when it
/// takes `min()` across dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConfidenceLevel {
    None,
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl ConfidenceLevel {
    /// The frozen numeric mapping: the only legal confidence numbers this
    /// engine ever emits.
    pub fn numeric_value(self) -> f64 {
        match self {
            ConfidenceLevel::None => 0.0,
            ConfidenceLevel::Low => 0.25,
            ConfidenceLevel::Moderate => 0.50,
            ConfidenceLevel::High => 0.75,
            ConfidenceLevel::VeryHigh => 0.95,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConfidenceLevel::None => "NONE",
            ConfidenceLevel::Low => "LOW",
            ConfidenceLevel::Moderate => "MODERATE",
            ConfidenceLevel::High => "HIGH",
            ConfidenceLevel::VeryHigh => "VERY_HIGH",
        }
    }
}

/// One field a domain's precedent comparisons can reference.
#[derive(Debug, Clone)]
pub struct FieldDefinition {
    pub name: String,
    pub label: String,
    pub field_type: FieldType,
    pub comparison: ComparisonFn,
    /// In `[0, 1]`; validated at construction.
    pub weight: f64,
    pub tier: FieldTier,
    pub required: bool,
    pub critical: bool,
    /// For `EquivalenceClass`: class name -> member values.
    pub equivalence_classes: BTreeMap<String, Vec<String>>,
    /// For `Step`: the ordered value sequence.
    pub ordered_values: Vec<String>,
    /// For `DistanceDecay`: the distance at which similarity reaches zero.
    pub max_distance: f64,
    /// Whether a mismatch on this field makes a precedent non-transferable
    /// to the case (a "driver" field, in precedent-scoring terms).
    pub driver: bool,
}

impl FieldDefinition {
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        field_type: FieldType,
        comparison: ComparisonFn,
        weight: f64,
        tier: FieldTier,
    ) -> Result<Self> {
        if !(0.0..=1.0).contains(&weight) {
            return Err(LedgerError::new(ErrorKind::InputInvalid, format!("field weight must be in [0,1], got {weight}")));
        }
        Ok(Self {
            name: name.into(),
            label: label.into(),
            field_type,
            comparison,
            weight,
            tier,
            required: false,
            critical: false,
            equivalence_classes: BTreeMap::new(),
            ordered_values: Vec::new(),
            max_distance: 0.0,
            driver: false,
        })
    }

    pub fn required(mut self, value: bool) -> Self {
        self.required = value;
        self
    }

    pub fn critical(mut self, value: bool) -> Self {
        self.critical = value;
        self
    }

    pub fn driver(mut self, value: bool) -> Self {
        self.driver = value;
        self
    }

    pub fn with_equivalence_classes(mut self, classes: BTreeMap<String, Vec<String>>) -> Self {
        self.equivalence_classes = classes;
        self
    }

    pub fn with_ordered_values(mut self, values: Vec<String>) -> Self {
        self.ordered_values = values;
        self
    }

    pub fn with_max_distance(mut self, max_distance: f64) -> Self {
        self.max_distance = max_distance;
        self
    }

    /// Which equivalence class (if any) `value` belongs to.
    pub fn classify(&self, value: &str) -> Option<&str> {
        for (class_name, members) in &self.equivalence_classes {
            if members.iter().any(|m| m.eq_ignore_ascii_case(value)) {
                return Some(class_name);
            }
        }
        None
    }

    /// The broadest (first-declared) equivalence class, used as a fallback
    /// when a gate field is missing from one side of a comparison.
    pub fn broadest_class(&self) -> Option<&str> {
        self.equivalence_classes.keys().next().map(|s| s.as_str())
    }
}

/// A gate field and the equivalence classes that partition it into
/// mutually-incomparable buckets: two facts in different classes can never
/// be treated as precedent for one another.
#[derive(Debug, Clone)]
pub struct ComparabilityGate {
    pub field: String,
}

impl ComparabilityGate {
    pub fn new(field: impl Into<String>) -> Self {
        Self { field: field.into() }
    }
}

/// The full typed schema for one domain: its fields, its comparability
/// gates, and the thresholds that govern precedent pool adequacy.
#[derive(Debug, Clone)]
pub struct DomainRegistry {
    pub domain: String,
    pub version: String,
    pub fields: BTreeMap<String, FieldDefinition>,
    pub comparability_gates: Vec<ComparabilityGate>,
    pub similarity_floor: f64,
    pub similarity_floor_overrides: BTreeMap<String, f64>,
    pub pool_minimum: usize,
    pub critical_fields: Vec<String>,
}

impl DomainRegistry {
    pub fn new(domain: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            version: version.into(),
            fields: BTreeMap::new(),
            comparability_gates: Vec::new(),
            similarity_floor: 0.60,
            similarity_floor_overrides: BTreeMap::new(),
            pool_minimum: 5,
            critical_fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: FieldDefinition) -> Self {
        if field.critical {
            self.critical_fields.push(field.name.clone());
        }
        self.fields.insert(field.name.clone(), field);
        self
    }

    pub fn with_gate(mut self, gate: ComparabilityGate) -> Self {
        self.comparability_gates.push(gate);
        self
    }

    pub fn with_pool_minimum(mut self, pool_minimum: usize) -> Self {
        self.pool_minimum = pool_minimum;
        self
    }

    pub fn get_gate_fields(&self) -> Vec<&str> {
        self.comparability_gates.iter().map(|g| g.field.as_str()).collect()
    }

    pub fn get_structural_fields(&self) -> Vec<&FieldDefinition> {
        self.fields.values().filter(|f| f.tier == FieldTier::Structural).collect()
    }

    pub fn get_behavioral_fields(&self) -> Vec<&FieldDefinition> {
        self.fields.values().filter(|f| f.tier == FieldTier::Behavioral).collect()
    }

    pub fn get_contextual_fields(&self) -> Vec<&FieldDefinition> {
        self.fields.values().filter(|f| f.tier == FieldTier::Contextual).collect()
    }

    /// Fields that participate in L2 scoring: every field except the ones
    /// that exist purely to gate comparability (L1).
    pub fn get_scoring_fields(&self) -> Vec<&FieldDefinition> {
        let gate_fields: Vec<&str> = self.get_gate_fields();
        self.fields.values().filter(|f| !gate_fields.contains(&f.name.as_str())).collect()
    }

    pub fn get_similarity_floor_for_typology(&self, typology: Option<&str>) -> f64 {
        match typology {
            Some(t) => *self.similarity_floor_overrides.get(t).unwrap_or(&self.similarity_floor),
            None => self.similarity_floor,
        }
    }

    pub fn total_weight(&self) -> f64 {
        self.get_scoring_fields().iter().map(|f| f.weight).sum()
    }
}
