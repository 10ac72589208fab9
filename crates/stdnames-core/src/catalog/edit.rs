//! Session-level editing facade over the catalog.

use indexmap::IndexMap;
use tracing::{debug, info};

use super::catalog::Catalog;
use super::diff::{CatalogDiff, RenamePair};
use super::uow::{Intent, Projection, UnitOfWork};
use crate::entry::{self, Entry};
use crate::error::{Error, ValidationIssue};
use crate::store::Store;

/// Result of a [`EditCatalog::write`] call.
///
/// `ok == false` means validation failed; the store was not touched and all
/// pending edits remain staged for correction.
#[derive(Debug, serde::Serialize)]
pub struct WriteReport {
    /// Whether the commit happened.
    pub ok: bool,
    /// Entries written to the store.
    pub written: usize,
    /// Entries deleted from the store.
    pub deleted: usize,
    /// Validation issues, when `ok` is false.
    pub issues: Vec<ValidationIssue>,
}

/// Staged editing over an otherwise eagerly-persisted store.
///
/// Wraps a [`Catalog`] plus a lazily-created [`UnitOfWork`]; the store is
/// only ever mutated by [`EditCatalog::write`]'s commit step, so external
/// readers never observe partial edit state.
pub struct EditCatalog<S: Store> {
    catalog: Catalog<S>,
    baseline: IndexMap<String, Entry>,
    uow: Option<UnitOfWork>,
}

impl<S: Store> EditCatalog<S> {
    /// Wrap a catalog, capturing the current persisted state as baseline.
    pub fn new(catalog: Catalog<S>) -> Self {
        let baseline = snapshot(&catalog);
        Self {
            catalog,
            baseline,
            uow: None,
        }
    }

    /// Wrap a store directly.
    pub fn from_store(store: S) -> Self {
        Self::new(Catalog::new(store))
    }

    /// The wrapped read facade. Note this reflects the persisted state, not
    /// pending edits; use [`EditCatalog::resolve`] for the pending view.
    pub fn catalog(&self) -> &Catalog<S> {
        &self.catalog
    }

    /// Whether a unit of work is open with staged intents.
    pub fn has_pending(&self) -> bool {
        self.uow.as_ref().is_some_and(|u| !u.is_empty())
    }

    /// Pending view of the catalog: baseline with the intent log replayed.
    pub fn projection(&self) -> Projection {
        match &self.uow {
            Some(uow) => uow.project(&self.baseline),
            None => UnitOfWork::new().project(&self.baseline),
        }
    }

    /// Resolve a name against the pending view.
    pub fn resolve(&self, name: &str) -> Option<Entry> {
        self.projection().entries.get(name).cloned()
    }

    /// All names in the pending view.
    pub fn current_names(&self) -> Vec<String> {
        self.projection().entries.keys().cloned().collect()
    }

    fn session(&mut self) -> &mut UnitOfWork {
        self.uow.get_or_insert_with(UnitOfWork::new)
    }

    /// Validate and stage a new entry.
    ///
    /// Structural validation failures propagate immediately; nothing is
    /// staged on error.
    pub fn add(&mut self, entry_data: serde_json::Value) -> Result<Entry, Error> {
        let entry = entry::validate(entry_data)?;
        if self.projection().entries.contains_key(&entry.name) {
            return Err(Error::Conflict(format!(
                "entry '{}' already exists",
                entry.name
            )));
        }
        debug!(name = %entry.name, "staging add");
        self.session().push(Intent::Add(entry.clone()));
        Ok(entry)
    }

    /// Validate and stage a full replacement of an existing entry.
    pub fn modify(&mut self, name: &str, entry_data: serde_json::Value) -> Result<Entry, Error> {
        if !self.projection().entries.contains_key(name) {
            return Err(Error::NotFound(name.to_string()));
        }
        let entry = entry::validate(entry_data)?;
        if entry.name != name {
            return Err(Error::InvalidOperation(format!(
                "modify cannot change the name ('{name}' -> '{}'); use rename",
                entry.name
            )));
        }
        debug!(name = %name, "staging update");
        self.session().push(Intent::Update {
            name: name.to_string(),
            entry: entry.clone(),
        });
        Ok(entry)
    }

    /// Stage a rename (and content replacement) of an existing entry.
    ///
    /// The new name is `entry_data`'s `name` field; when it equals
    /// `old_name` this delegates to [`EditCatalog::modify`].
    pub fn rename(&mut self, old_name: &str, entry_data: serde_json::Value) -> Result<Entry, Error> {
        let entry = entry::validate(entry_data)?;
        if entry.name == old_name {
            return self.modify(old_name, entry.to_value());
        }
        let view = self.projection();
        if !view.entries.contains_key(old_name) {
            return Err(Error::NotFound(old_name.to_string()));
        }
        if view.entries.contains_key(&entry.name) {
            return Err(Error::Conflict(format!(
                "rename target '{}' already exists",
                entry.name
            )));
        }
        debug!(old = %old_name, new = %entry.name, "staging rename");
        self.session().push(Intent::Rename {
            old: old_name.to_string(),
            entry: entry.clone(),
        });
        Ok(entry)
    }

    /// Stage removal of an entry; returns whether it existed beforehand.
    pub fn delete(&mut self, name: &str) -> bool {
        let existed = self.projection().entries.contains_key(name);
        if existed {
            debug!(name = %name, "staging remove");
            self.session().push(Intent::Remove {
                name: name.to_string(),
            });
        }
        existed
    }

    /// Revert only the most recently staged intent.
    ///
    /// Returns false when no unit of work is open or nothing is staged.
    pub fn undo_last(&mut self) -> bool {
        match &mut self.uow {
            Some(uow) => uow.pop_last().is_some(),
            None => false,
        }
    }

    /// Abandon the open unit of work entirely.
    pub fn discard_pending(&mut self) {
        if self.uow.take().is_some() {
            info!("discarded pending edits");
        }
        self.baseline = snapshot(&self.catalog);
    }

    /// Alias for [`EditCatalog::discard_pending`].
    pub fn rollback(&mut self) {
        self.discard_pending();
    }

    /// Diff the pending state against the persisted baseline.
    pub fn diff(&self) -> CatalogDiff {
        let proj = self.projection();
        let renamed: Vec<RenamePair> = proj
            .renamed_pairs()
            .into_iter()
            .map(|(from, to)| RenamePair { from, to })
            .collect();
        let rename_targets: Vec<&str> = renamed.iter().map(|p| p.to.as_str()).collect();
        let rename_sources: Vec<&str> = renamed.iter().map(|p| p.from.as_str()).collect();

        let mut added = Vec::new();
        let mut updated = Vec::new();
        for (name, entry) in &proj.entries {
            match self.baseline.get(name) {
                None => {
                    if !rename_targets.contains(&name.as_str()) {
                        added.push(name.clone());
                    }
                }
                Some(base) => {
                    if base.to_value() != entry.to_value() {
                        updated.push(name.clone());
                    }
                }
            }
        }

        let removed: Vec<String> = self
            .baseline
            .keys()
            .filter(|name| {
                !proj.entries.contains_key(*name) && !rename_sources.contains(&name.as_str())
            })
            .cloned()
            .collect();

        CatalogDiff::new(added, removed, updated, renamed)
    }

    /// Validate all pending changes and, if clean, commit them to the store.
    ///
    /// On validation failure nothing is written and the pending state is
    /// left intact for correction. On success the store is updated, the
    /// catalog reloads from disk, and the baseline resets to the new
    /// persisted state.
    pub fn write(&mut self) -> Result<WriteReport, Error> {
        if !self.has_pending() {
            return Ok(WriteReport {
                ok: true,
                written: 0,
                deleted: 0,
                issues: Vec::new(),
            });
        }

        let proj = self.projection();
        let issues = validate_view(&proj);
        if !issues.is_empty() {
            info!(issues = issues.len(), "write rejected; pending edits kept");
            return Ok(WriteReport {
                ok: false,
                written: 0,
                deleted: 0,
                issues,
            });
        }

        let mut deleted = 0;
        for name in self.baseline.keys() {
            if !proj.entries.contains_key(name) {
                self.catalog.store_mut().delete(name)?;
                deleted += 1;
            }
        }

        let mut written = 0;
        for (name, entry) in &proj.entries {
            let unchanged = self
                .baseline
                .get(name)
                .is_some_and(|base| base.to_value() == entry.to_value());
            if !unchanged {
                self.catalog.store_mut().write(entry)?;
                written += 1;
            }
        }

        self.catalog.reload_from_disk()?;
        self.baseline = snapshot(&self.catalog);
        self.uow = None;
        info!(written, deleted, "committed pending edits");

        Ok(WriteReport {
            ok: true,
            written,
            deleted,
            issues: Vec::new(),
        })
    }

    /// Snapshot marker for atomic batch rollback: the intent-log length, or
    /// `None` when no session is open.
    pub(crate) fn mark(&self) -> Option<usize> {
        self.uow.as_ref().map(UnitOfWork::len)
    }

    /// Restore the session to a snapshot marker, dropping later intents.
    pub(crate) fn restore(&mut self, mark: Option<usize>) {
        match mark {
            None => {
                self.uow = None;
            }
            Some(len) => {
                if let Some(uow) = &mut self.uow {
                    uow.truncate(len);
                }
            }
        }
    }
}

/// Capture the persisted state as an ordered name → entry map.
fn snapshot<S: Store>(catalog: &Catalog<S>) -> IndexMap<String, Entry> {
    catalog
        .list(None)
        .into_iter()
        .map(|e| (e.name.clone(), e.clone()))
        .collect()
}

/// Write-time validation of the whole pending view: structural re-check of
/// each entry plus referential integrity for provenance, internal links,
/// and supersession.
fn validate_view(proj: &Projection) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    for (name, entry) in &proj.entries {
        if let Err(err) = entry::validate(entry.to_value()) {
            issues.push(match err {
                Error::Validation { field, message } => {
                    ValidationIssue::for_entry(name.clone(), field, message)
                }
                other => ValidationIssue::for_entry(name.clone(), None, other.to_string()),
            });
        }
        if let Some(prov) = &entry.provenance {
            for reference in prov.references() {
                if !proj.entries.contains_key(reference) {
                    issues.push(ValidationIssue::for_entry(
                        name.clone(),
                        Some("provenance".to_string()),
                        format!("provenance references unknown entry '{reference}'"),
                    ));
                }
            }
        }
        for link in &entry.links {
            if let Some(target) = link.target_name() {
                if !proj.entries.contains_key(target) {
                    issues.push(ValidationIssue::for_entry(
                        name.clone(),
                        Some("links".to_string()),
                        format!("link references unknown entry '{target}'"),
                    ));
                }
            }
        }
        if let Some(by) = &entry.superseded_by {
            if !proj.entries.contains_key(by) {
                issues.push(ValidationIssue::for_entry(
                    name.clone(),
                    Some("superseded_by".to_string()),
                    format!("superseding entry '{by}' does not exist"),
                ));
            }
        }
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::YamlStore;
    use serde_json::json;

    fn entry_data(name: &str, tag: &str) -> serde_json::Value {
        json!({
            "name": name,
            "kind": "scalar",
            "unit": "A",
            "tags": [tag],
        })
    }

    fn edit_catalog(dir: &std::path::Path) -> EditCatalog<YamlStore> {
        EditCatalog::from_store(YamlStore::open(dir).unwrap())
    }

    #[test]
    fn test_add_then_write_persists() {
        let dir = tempfile::tempdir().unwrap();
        let mut edit = edit_catalog(dir.path());
        edit.add(entry_data("plasma_current", "equilibrium")).unwrap();

        let report = edit.write().unwrap();
        assert!(report.ok);
        assert_eq!(report.written, 1);
        assert!(edit.catalog().exists("plasma_current"));
        assert!(edit.diff().is_empty());
    }

    #[test]
    fn test_add_duplicate_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let mut edit = edit_catalog(dir.path());
        edit.add(entry_data("plasma_current", "equilibrium")).unwrap();
        let err = edit.add(entry_data("plasma_current", "equilibrium")).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn test_invalid_add_propagates_and_stages_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut edit = edit_catalog(dir.path());
        let err = edit
            .add(json!({"name": "x_y", "kind": "scalar", "tags": []}))
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert!(!edit.has_pending());
    }

    #[test]
    fn test_modify_absent_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut edit = edit_catalog(dir.path());
        let err = edit
            .modify("plasma_current", entry_data("plasma_current", "equilibrium"))
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_modify_pending_add_is_visible() {
        let dir = tempfile::tempdir().unwrap();
        let mut edit = edit_catalog(dir.path());
        edit.add(entry_data("plasma_current", "equilibrium")).unwrap();
        // The pending add resolves even though nothing is persisted yet.
        let mut data = entry_data("plasma_current", "equilibrium");
        data["unit"] = json!("kA");
        let updated = edit.modify("plasma_current", data).unwrap();
        assert_eq!(updated.unit, "kA");
    }

    #[test]
    fn test_rename_same_name_delegates_to_modify() {
        let dir = tempfile::tempdir().unwrap();
        let mut edit = edit_catalog(dir.path());
        edit.add(entry_data("plasma_current", "equilibrium")).unwrap();
        edit.write().unwrap();

        let mut data = entry_data("plasma_current", "equilibrium");
        data["unit"] = json!("kA");
        edit.rename("plasma_current", data).unwrap();
        let diff = edit.diff();
        assert_eq!(diff.updated, vec!["plasma_current"]);
        assert!(diff.renamed.is_empty());
    }

    #[test]
    fn test_rename_target_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let mut edit = edit_catalog(dir.path());
        edit.add(entry_data("plasma_current", "equilibrium")).unwrap();
        edit.add(entry_data("loop_voltage", "equilibrium")).unwrap();
        let err = edit
            .rename("plasma_current", entry_data("loop_voltage", "equilibrium"))
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn test_diff_classifies_rename() {
        let dir = tempfile::tempdir().unwrap();
        let mut edit = edit_catalog(dir.path());
        edit.add(entry_data("plasma_current", "equilibrium")).unwrap();
        edit.write().unwrap();

        edit.rename("plasma_current", entry_data("total_plasma_current", "equilibrium"))
            .unwrap();
        let diff = edit.diff();
        assert!(diff.added.is_empty());
        assert!(diff.removed.is_empty());
        assert_eq!(diff.renamed.len(), 1);
        assert_eq!(diff.renamed[0].from, "plasma_current");
        assert_eq!(diff.renamed[0].to, "total_plasma_current");
    }

    #[test]
    fn test_rename_of_session_add_surfaces_only_final_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut edit = edit_catalog(dir.path());
        edit.add(entry_data("loop_voltage", "equilibrium")).unwrap();
        edit.rename("loop_voltage", entry_data("surface_loop_voltage", "equilibrium"))
            .unwrap();

        let diff = edit.diff();
        assert_eq!(diff.added, vec!["surface_loop_voltage"]);
        assert!(diff.removed.is_empty());
        assert!(diff.renamed.is_empty());
    }

    #[test]
    fn test_undo_last_reverts_one_step() {
        let dir = tempfile::tempdir().unwrap();
        let mut edit = edit_catalog(dir.path());
        assert!(!edit.undo_last());

        edit.add(entry_data("plasma_current", "equilibrium")).unwrap();
        edit.add(entry_data("loop_voltage", "equilibrium")).unwrap();
        assert!(edit.undo_last());

        let diff = edit.diff();
        assert_eq!(diff.added, vec!["plasma_current"]);
    }

    #[test]
    fn test_discard_pending_abandons_session() {
        let dir = tempfile::tempdir().unwrap();
        let mut edit = edit_catalog(dir.path());
        edit.add(entry_data("plasma_current", "equilibrium")).unwrap();
        edit.discard_pending();
        assert!(!edit.has_pending());
        assert!(edit.diff().is_empty());
    }

    #[test]
    fn test_write_failure_keeps_pending_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut edit = edit_catalog(dir.path());
        let mut data = entry_data("gradient_of_density", "kinetic");
        data["kind"] = json!("derived-scalar");
        data["provenance"] = json!({
            "mode": "operator",
            "operator": "gradient",
            "base": "electron_density",
        });
        edit.add(data).unwrap();

        let before = edit.diff().counts;
        let report = edit.write().unwrap();
        assert!(!report.ok);
        assert!(!report.issues.is_empty());
        assert_eq!(edit.diff().counts, before);
        assert!(edit.catalog().list_names().is_empty());
    }

    #[test]
    fn test_delete_returns_prior_existence() {
        let dir = tempfile::tempdir().unwrap();
        let mut edit = edit_catalog(dir.path());
        edit.add(entry_data("plasma_current", "equilibrium")).unwrap();
        assert!(edit.delete("plasma_current"));
        assert!(!edit.delete("plasma_current"));
    }

    #[test]
    fn test_write_deletes_removed_entries() {
        let dir = tempfile::tempdir().unwrap();
        let mut edit = edit_catalog(dir.path());
        edit.add(entry_data("plasma_current", "equilibrium")).unwrap();
        edit.write().unwrap();

        edit.delete("plasma_current");
        let report = edit.write().unwrap();
        assert!(report.ok);
        assert_eq!(report.deleted, 1);
        assert!(edit.catalog().list_names().is_empty());
    }
}
