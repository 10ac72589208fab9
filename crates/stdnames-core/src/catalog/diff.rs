//! Semantic diff between the persisted baseline and the pending state.

use serde::Serialize;

/// A rename tracked as an explicit (old, new) pair so it is excluded from
/// the added/removed sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenamePair {
    /// Name in the persisted baseline.
    pub from: String,
    /// Current pending name.
    pub to: String,
}

/// Per-class change counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffCounts {
    /// Names added since the baseline.
    pub added: usize,
    /// Names removed since the baseline.
    pub removed: usize,
    /// Names present in both whose content differs.
    pub updated: usize,
    /// Rename pairs.
    pub renamed: usize,
    /// Sum of the above.
    pub total_pending: usize,
}

/// JSON-serializable diff of the pending state against the baseline.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CatalogDiff {
    /// Names added since the baseline (excluding rename targets).
    pub added: Vec<String>,
    /// Names removed since the baseline (excluding rename sources).
    pub removed: Vec<String>,
    /// Names present in both baseline and pending whose serialized form
    /// differs.
    pub updated: Vec<String>,
    /// Explicit rename pairs.
    pub renamed: Vec<RenamePair>,
    /// Change counts.
    pub counts: DiffCounts,
}

impl CatalogDiff {
    /// Assemble a diff, filling in counts.
    pub fn new(
        added: Vec<String>,
        removed: Vec<String>,
        updated: Vec<String>,
        renamed: Vec<RenamePair>,
    ) -> Self {
        let counts = DiffCounts {
            added: added.len(),
            removed: removed.len(),
            updated: updated.len(),
            renamed: renamed.len(),
            total_pending: added.len() + removed.len() + updated.len() + renamed.len(),
        };
        Self {
            added,
            removed,
            updated,
            renamed,
            counts,
        }
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.counts.total_pending == 0
    }
}
