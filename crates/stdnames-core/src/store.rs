//! Durable per-name entry storage.
//!
//! Entries are persisted one per file, grouped into a subdirectory named
//! after the entry's primary tag. Changing an entry's primary tag moves the
//! file: the rewrite under the new directory also deletes the old file so no
//! orphans are left behind.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::entry::Entry;
use crate::error::Error;

/// Durable record storage keyed by entry name.
pub trait Store {
    /// Get an entry by name.
    fn get(&self, name: &str) -> Option<&Entry>;

    /// All entries in load order.
    fn list(&self) -> Vec<&Entry>;

    /// All names in load order.
    fn names(&self) -> Vec<String>;

    /// Persist an entry, replacing any previous record under the same name.
    fn write(&mut self, entry: &Entry) -> Result<(), Error>;

    /// Delete an entry; returns whether it existed.
    fn delete(&mut self, name: &str) -> Result<bool, Error>;

    /// Re-read everything from durable storage.
    fn reload(&mut self) -> Result<(), Error>;
}

struct StoredEntry {
    entry: Entry,
    path: PathBuf,
}

/// File-backed store: one YAML file per entry under `root/<primary_tag>/`.
pub struct YamlStore {
    root: PathBuf,
    entries: IndexMap<String, StoredEntry>,
}

impl YamlStore {
    /// Open a store rooted at a directory, creating it if needed, and load
    /// every entry file found.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, Error> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        let mut store = Self {
            root,
            entries: IndexMap::new(),
        };
        store.reload()?;
        Ok(store)
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, entry: &Entry) -> Result<PathBuf, Error> {
        let primary = entry
            .primary_tag()
            .ok_or_else(|| Error::validation("tags", "entry has no primary tag"))?;
        Ok(self
            .root
            .join(primary)
            .join(format!("{}.yml", entry.name)))
    }
}

impl Store for YamlStore {
    fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name).map(|s| &s.entry)
    }

    fn list(&self) -> Vec<&Entry> {
        self.entries.values().map(|s| &s.entry).collect()
    }

    fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    fn write(&mut self, entry: &Entry) -> Result<(), Error> {
        let path = self.entry_path(entry)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(entry)?;
        std::fs::write(&path, yaml)?;

        // A primary-tag change relocates the file; remove the old one.
        if let Some(prev) = self.entries.get(&entry.name) {
            if prev.path != path && prev.path.exists() {
                std::fs::remove_file(&prev.path)?;
                debug!(name = %entry.name, "moved entry file to new primary tag directory");
            }
        }

        self.entries.insert(
            entry.name.clone(),
            StoredEntry {
                entry: entry.clone(),
                path,
            },
        );
        Ok(())
    }

    fn delete(&mut self, name: &str) -> Result<bool, Error> {
        match self.entries.shift_remove(name) {
            Some(stored) => {
                if stored.path.exists() {
                    std::fs::remove_file(&stored.path)?;
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn reload(&mut self) -> Result<(), Error> {
        self.entries.clear();
        let mut loaded: Vec<(String, StoredEntry)> = Vec::new();

        for dir in std::fs::read_dir(&self.root)? {
            let dir = dir?;
            if !dir.file_type()?.is_dir() {
                continue;
            }
            for file in std::fs::read_dir(dir.path())? {
                let file = file?;
                let path = file.path();
                if path.extension().and_then(|e| e.to_str()) != Some("yml") {
                    continue;
                }
                let text = std::fs::read_to_string(&path)?;
                match serde_yaml::from_str::<Entry>(&text) {
                    Ok(entry) => loaded.push((
                        entry.name.clone(),
                        StoredEntry { entry, path },
                    )),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "skipping unreadable entry file");
                    }
                }
            }
        }

        // Deterministic order regardless of directory iteration order.
        loaded.sort_by(|a, b| a.0.cmp(&b.0));
        for (name, stored) in loaded {
            self.entries.insert(name, stored);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{Kind, Status};

    fn sample_entry(name: &str, primary_tag: &str) -> Entry {
        Entry {
            name: name.to_string(),
            kind: Kind::Scalar,
            unit: "eV".to_string(),
            status: Status::Draft,
            description: String::new(),
            tags: vec![primary_tag.to_string()],
            links: Vec::new(),
            superseded_by: None,
            provenance: None,
        }
    }

    #[test]
    fn test_write_groups_by_primary_tag() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = YamlStore::open(dir.path()).unwrap();
        store
            .write(&sample_entry("electron_temperature", "kinetic"))
            .unwrap();

        assert!(dir
            .path()
            .join("kinetic")
            .join("electron_temperature.yml")
            .exists());
    }

    #[test]
    fn test_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = YamlStore::open(dir.path()).unwrap();
            store.write(&sample_entry("plasma_current", "equilibrium")).unwrap();
            store.write(&sample_entry("loop_voltage", "equilibrium")).unwrap();
        }
        let store = YamlStore::open(dir.path()).unwrap();
        assert_eq!(store.names(), vec!["loop_voltage", "plasma_current"]);
        assert_eq!(store.get("plasma_current").unwrap().unit, "eV");
    }

    #[test]
    fn test_write_without_primary_tag_is_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = YamlStore::open(dir.path()).unwrap();
        let mut entry = sample_entry("plasma_current", "kinetic");
        entry.tags.clear();
        let err = store.write(&entry).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert!(store.get("plasma_current").is_none());
    }

    #[test]
    fn test_primary_tag_change_moves_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = YamlStore::open(dir.path()).unwrap();
        store.write(&sample_entry("plasma_current", "draft")).unwrap();
        store
            .write(&sample_entry("plasma_current", "equilibrium"))
            .unwrap();

        assert!(!dir.path().join("draft").join("plasma_current.yml").exists());
        assert!(dir
            .path()
            .join("equilibrium")
            .join("plasma_current.yml")
            .exists());
        // Exactly one file for the entry across the whole tree.
        let count = walk_yaml_count(dir.path());
        assert_eq!(count, 1);
    }

    #[test]
    fn test_delete_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = YamlStore::open(dir.path()).unwrap();
        store.write(&sample_entry("plasma_current", "equilibrium")).unwrap();

        assert!(store.delete("plasma_current").unwrap());
        assert!(!dir
            .path()
            .join("equilibrium")
            .join("plasma_current.yml")
            .exists());
        assert!(!store.delete("plasma_current").unwrap());
    }

    #[test]
    fn test_unreadable_file_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("kinetic")).unwrap();
        std::fs::write(dir.path().join("kinetic").join("broken.yml"), ": not yaml [").unwrap();
        let store = YamlStore::open(dir.path()).unwrap();
        assert!(store.names().is_empty());
    }

    fn walk_yaml_count(root: &Path) -> usize {
        let mut count = 0;
        for dir in std::fs::read_dir(root).unwrap() {
            let dir = dir.unwrap();
            if dir.file_type().unwrap().is_dir() {
                for file in std::fs::read_dir(dir.path()).unwrap() {
                    let file = file.unwrap();
                    if file.path().extension().and_then(|e| e.to_str()) == Some("yml") {
                        count += 1;
                    }
                }
            }
        }
        count
    }
}
