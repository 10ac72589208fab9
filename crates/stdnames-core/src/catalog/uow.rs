//! The staged mutation session.
//!
//! A unit of work is an ordered log of intents layered over the persisted
//! baseline. The current pending state is obtained by replaying the log, so
//! single-step undo is a pop, rollback is dropping the log, and the
//! pre-batch snapshot needed for atomic batches is just the log length.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::entry::Entry;

/// One staged mutation intent.
#[derive(Debug, Clone)]
pub enum Intent {
    /// Stage a new entry.
    Add(Entry),
    /// Replace the entry under `name`; `entry.name == name`.
    Update {
        /// Name being updated.
        name: String,
        /// Full replacement entry.
        entry: Entry,
    },
    /// Rename `old` to `entry.name`, replacing content with `entry`.
    Rename {
        /// Name being renamed away from.
        old: String,
        /// Full entry under its new name.
        entry: Entry,
    },
    /// Stage removal of `name`.
    Remove {
        /// Name being removed.
        name: String,
    },
}

/// The pending state derived by replaying a unit of work over the baseline.
pub struct Projection {
    /// Current name → entry view (baseline ⊕ pending).
    pub entries: IndexMap<String, Entry>,
    /// Current name → persisted origin name. `None` for names born in this
    /// session; differs from the key when the entry was renamed.
    pub origins: HashMap<String, Option<String>>,
}

impl Projection {
    /// Rename pairs (persisted old name, current name).
    pub fn renamed_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .origins
            .iter()
            .filter_map(|(current, origin)| match origin {
                Some(old) if old != current => Some((old.clone(), current.clone())),
                _ => None,
            })
            .collect();
        pairs.sort();
        pairs
    }
}

/// An in-memory staged transaction over the catalog.
///
/// At most one unit of work is open per [`super::EditCatalog`] at a time;
/// it exists from the first staged mutation until commit or rollback.
#[derive(Debug, Default)]
pub struct UnitOfWork {
    intents: Vec<Intent>,
}

impl UnitOfWork {
    /// Start an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage an intent.
    pub fn push(&mut self, intent: Intent) {
        self.intents.push(intent);
    }

    /// Revert the most recently staged intent.
    pub fn pop_last(&mut self) -> Option<Intent> {
        self.intents.pop()
    }

    /// Number of staged intents.
    pub fn len(&self) -> usize {
        self.intents.len()
    }

    /// Whether nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }

    /// Drop intents staged after a snapshot point.
    pub fn truncate(&mut self, len: usize) {
        self.intents.truncate(len);
    }

    /// Replay the log over a baseline to produce the pending state.
    pub fn project(&self, baseline: &IndexMap<String, Entry>) -> Projection {
        let mut entries = baseline.clone();
        let mut origins: HashMap<String, Option<String>> = baseline
            .keys()
            .map(|name| (name.clone(), Some(name.clone())))
            .collect();

        for intent in &self.intents {
            match intent {
                Intent::Add(entry) => {
                    origins.insert(entry.name.clone(), None);
                    entries.insert(entry.name.clone(), entry.clone());
                }
                Intent::Update { name, entry } => {
                    entries.insert(name.clone(), entry.clone());
                }
                Intent::Rename { old, entry } => {
                    let origin = origins.remove(old).unwrap_or(None);
                    entries.shift_remove(old);
                    origins.insert(entry.name.clone(), origin);
                    entries.insert(entry.name.clone(), entry.clone());
                }
                Intent::Remove { name } => {
                    origins.remove(name);
                    entries.shift_remove(name);
                }
            }
        }

        Projection { entries, origins }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{Kind, Status};

    fn entry(name: &str) -> Entry {
        Entry {
            name: name.to_string(),
            kind: Kind::Scalar,
            unit: "none".to_string(),
            status: Status::Draft,
            description: String::new(),
            tags: vec!["equilibrium".to_string()],
            links: Vec::new(),
            superseded_by: None,
            provenance: None,
        }
    }

    fn baseline(names: &[&str]) -> IndexMap<String, Entry> {
        names
            .iter()
            .map(|n| (n.to_string(), entry(n)))
            .collect()
    }

    #[test]
    fn test_replay_add_update_remove() {
        let base = baseline(&["plasma_current"]);
        let mut uow = UnitOfWork::new();
        uow.push(Intent::Add(entry("loop_voltage")));
        uow.push(Intent::Update {
            name: "plasma_current".to_string(),
            entry: {
                let mut e = entry("plasma_current");
                e.unit = "A".to_string();
                e
            },
        });
        uow.push(Intent::Remove {
            name: "loop_voltage".to_string(),
        });

        let proj = uow.project(&base);
        assert_eq!(proj.entries.len(), 1);
        assert_eq!(proj.entries["plasma_current"].unit, "A");
        assert!(!proj.origins.contains_key("loop_voltage"));
    }

    #[test]
    fn test_rename_tracks_persisted_origin() {
        let base = baseline(&["plasma_current"]);
        let mut uow = UnitOfWork::new();
        uow.push(Intent::Rename {
            old: "plasma_current".to_string(),
            entry: entry("total_plasma_current"),
        });

        let proj = uow.project(&base);
        assert_eq!(
            proj.renamed_pairs(),
            vec![("plasma_current".to_string(), "total_plasma_current".to_string())]
        );
    }

    #[test]
    fn test_rename_of_session_added_entry_has_no_origin() {
        let base = baseline(&[]);
        let mut uow = UnitOfWork::new();
        uow.push(Intent::Add(entry("loop_voltage")));
        uow.push(Intent::Rename {
            old: "loop_voltage".to_string(),
            entry: entry("surface_loop_voltage"),
        });

        let proj = uow.project(&base);
        assert!(proj.renamed_pairs().is_empty());
        assert_eq!(proj.origins["surface_loop_voltage"], None);
    }

    #[test]
    fn test_chained_rename_collapses_to_one_pair() {
        let base = baseline(&["a_name"]);
        let mut uow = UnitOfWork::new();
        uow.push(Intent::Rename {
            old: "a_name".to_string(),
            entry: entry("b_name"),
        });
        uow.push(Intent::Rename {
            old: "b_name".to_string(),
            entry: entry("c_name"),
        });

        let proj = uow.project(&base);
        assert_eq!(
            proj.renamed_pairs(),
            vec![("a_name".to_string(), "c_name".to_string())]
        );
    }

    #[test]
    fn test_truncate_restores_snapshot() {
        let base = baseline(&["plasma_current"]);
        let mut uow = UnitOfWork::new();
        uow.push(Intent::Add(entry("loop_voltage")));
        let mark = uow.len();
        uow.push(Intent::Remove {
            name: "plasma_current".to_string(),
        });

        uow.truncate(mark);
        let proj = uow.project(&base);
        assert!(proj.entries.contains_key("plasma_current"));
        assert!(proj.entries.contains_key("loop_voltage"));
    }
}
