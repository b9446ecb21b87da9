//! `OverlayContext`: a read-through index over a shadow chain's cells,
//! keyed by `(namespace, subject, predicate)`, that falls back to the base
//! chain whenever the shadow has no override for a key.

use std::collections::BTreeMap;

use crate::cell::Cell;
use crate::chain::Chain;

type FactKey = (String, String, String);

/// Looks up the latest fact for a `(namespace, subject, predicate)` triple,
/// preferring the shadow chain's own cells and falling back to the base
/// chain only when the shadow has nothing for that key.
pub struct OverlayContext<'a> {
    base: &'a Chain,
    shadow_index: BTreeMap<FactKey, &'a Cell>,
    base_index: BTreeMap<FactKey, &'a Cell>,
}

impl<'a> OverlayContext<'a> {
    /// Build an overlay over `shadow`, falling back to `base` for facts
    /// the shadow does not override. Later cells for the same key win, so
    /// the most recent system_time is always what callers observe.
    pub fn new(base: &'a Chain, shadow: &'a Chain) -> Self {
        Self {
            base,
            shadow_index: index_by_key(shadow.cells()),
            base_index: index_by_key(base.cells()),
        }
    }

    pub fn base(&self) -> &'a Chain {
        self.base
    }

    /// The cell that answers `(namespace, subject, predicate)`, overlay
    /// first, base second.
    pub fn lookup(&self, namespace: &str, subject: &str, predicate: &str) -> Option<&'a Cell> {
        let key = (namespace.to_string(), subject.to_string(), predicate.to_string());
        self.shadow_index.get(&key).or_else(|| self.base_index.get(&key)).copied()
    }

    /// `true` if the shadow chain has its own entry for this key (as
    /// opposed to inheriting it from the base chain).
    pub fn is_overridden(&self, namespace: &str, subject: &str, predicate: &str) -> bool {
        let key = (namespace.to_string(), subject.to_string(), predicate.to_string());
        self.shadow_index.contains_key(&key)
    }
}

fn index_by_key(cells: &[Cell]) -> BTreeMap<FactKey, &Cell> {
    let mut index = BTreeMap::new();
    for cell in cells {
        let key = (cell.fact.namespace.clone(), cell.fact.subject.clone(), cell.fact.predicate.clone());
        // Later cells (chain order = append order = time order) overwrite
        // earlier ones for the same key, giving "latest wins" semantics.
        index.insert(key, cell);
    }
    index
}
