//! Read-oriented facade over the store.

use crate::entry::{Entry, Kind, Status};
use crate::error::Error;
use crate::store::Store;

/// Optional filters for [`Catalog::search`].
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    /// Restrict to one kind.
    pub kind: Option<Kind>,
    /// Restrict to one status.
    pub status: Option<Status>,
    /// Restrict to entries carrying this tag (primary or secondary).
    pub tag: Option<String>,
}

/// Read facade over the current on-disk-backed state.
///
/// Mutation goes through [`super::EditCatalog`], which wraps a catalog and
/// stages changes in a unit of work; the store underneath is only written by
/// a successful commit.
pub struct Catalog<S: Store> {
    store: S,
}

impl<S: Store> Catalog<S> {
    /// Wrap a store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Get an entry by name.
    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.store.get(name)
    }

    /// Whether an entry exists.
    pub fn exists(&self, name: &str) -> bool {
        self.store.get(name).is_some()
    }

    /// All entries, optionally restricted to one kind.
    pub fn list(&self, kind: Option<Kind>) -> Vec<&Entry> {
        self.store
            .list()
            .into_iter()
            .filter(|e| kind.map_or(true, |k| e.kind == k))
            .collect()
    }

    /// All entry names.
    pub fn list_names(&self) -> Vec<String> {
        self.store.names()
    }

    /// Substring search over name and description, with optional filters.
    pub fn search(&self, query: &str, filter: &SearchFilter) -> Vec<&Entry> {
        let needle = query.to_lowercase();
        self.store
            .list()
            .into_iter()
            .filter(|e| {
                (needle.is_empty()
                    || e.name.contains(&needle)
                    || e.description.to_lowercase().contains(&needle))
                    && filter.kind.map_or(true, |k| e.kind == k)
                    && filter.status.map_or(true, |s| e.status == s)
                    && filter
                        .tag
                        .as_ref()
                        .map_or(true, |t| e.tags.iter().any(|tag| tag == t))
            })
            .collect()
    }

    /// Resync from durable storage after external writes.
    pub fn reload_from_disk(&mut self) -> Result<(), Error> {
        self.store.reload()
    }

    pub(super) fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::YamlStore;

    fn entry(name: &str, kind: Kind, description: &str) -> Entry {
        Entry {
            name: name.to_string(),
            kind,
            unit: "none".to_string(),
            status: Status::Active,
            description: description.to_string(),
            tags: vec!["equilibrium".to_string()],
            links: Vec::new(),
            superseded_by: None,
            provenance: None,
        }
    }

    fn sample_catalog(dir: &std::path::Path) -> Catalog<YamlStore> {
        let mut store = YamlStore::open(dir).unwrap();
        store
            .write(&entry("plasma_current", Kind::Scalar, "Total plasma current."))
            .unwrap();
        store
            .write(&entry("magnetic_field", Kind::Vector, "Magnetic field vector."))
            .unwrap();
        Catalog::new(store)
    }

    #[test]
    fn test_get_and_exists() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = sample_catalog(dir.path());
        assert!(catalog.exists("plasma_current"));
        assert!(!catalog.exists("loop_voltage"));
        assert_eq!(catalog.get("plasma_current").unwrap().kind, Kind::Scalar);
    }

    #[test]
    fn test_list_filters_by_kind() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = sample_catalog(dir.path());
        assert_eq!(catalog.list(None).len(), 2);
        let vectors = catalog.list(Some(Kind::Vector));
        assert_eq!(vectors.len(), 1);
        assert_eq!(vectors[0].name, "magnetic_field");
    }

    #[test]
    fn test_search_matches_name_and_description() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = sample_catalog(dir.path());
        assert_eq!(catalog.search("current", &SearchFilter::default()).len(), 1);
        assert_eq!(catalog.search("vector", &SearchFilter::default()).len(), 1);
        let filter = SearchFilter {
            kind: Some(Kind::Scalar),
            ..Default::default()
        };
        assert!(catalog.search("vector", &filter).is_empty());
    }

    #[test]
    fn test_reload_picks_up_external_writes() {
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = sample_catalog(dir.path());
        {
            let mut other = YamlStore::open(dir.path()).unwrap();
            other
                .write(&entry("loop_voltage", Kind::Scalar, "Loop voltage."))
                .unwrap();
        }
        assert!(!catalog.exists("loop_voltage"));
        catalog.reload_from_disk().unwrap();
        assert!(catalog.exists("loop_voltage"));
    }
}
