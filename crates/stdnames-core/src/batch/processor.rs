//! Batch execution over an [`EditCatalog`] session.

use std::collections::HashSet;
use std::time::Instant;

use serde_json::json;
use tracing::{debug, info, warn};

use super::operation::{
    BatchDeleteResult, BatchMode, BatchResult, BatchSummary, DeleteResult, ModifyResult,
    Operation, OperationError, OperationResult, OperationStatus, Outcome, RenameResult,
};
use super::sort::dependency_order;
use crate::catalog::{EditCatalog, Projection};
use crate::entry;
use crate::error::Error;
use crate::store::Store;

impl<S: Store> EditCatalog<S> {
    /// Dispatch a typed operation. Single-operation errors propagate;
    /// batch-member errors are captured into the batch result instead.
    pub fn apply(&mut self, operation: Operation) -> Result<Outcome, Error> {
        apply_operation(self, operation)
    }

    /// Parse a JSON operation document and dispatch it.
    pub fn apply_value(&mut self, value: serde_json::Value) -> Result<Outcome, Error> {
        let operation: Operation = serde_json::from_value(value)
            .map_err(|e| Error::InvalidOperation(format!("unparseable operation: {e}")))?;
        self.apply(operation)
    }

    /// Apply a list of operations as a unit (see [`apply_batch`]).
    pub fn apply_batch(
        &mut self,
        operations: Vec<Operation>,
        mode: BatchMode,
        dry_run: bool,
        resume_from_index: Option<usize>,
    ) -> BatchResult {
        apply_batch(self, operations, mode, dry_run, resume_from_index)
    }

    /// Remove several entries, reporting missing ones instead of failing.
    pub fn apply_batch_delete(
        &mut self,
        names: &[String],
        dry_run: bool,
    ) -> BatchDeleteResult {
        apply_batch_delete(self, names, dry_run)
    }
}

/// Dispatch one operation against the session.
pub fn apply_operation<S: Store>(
    edit: &mut EditCatalog<S>,
    operation: Operation,
) -> Result<Outcome, Error> {
    match operation {
        Operation::Modify { name, model } => {
            apply_modify(edit, &name, model).map(Outcome::Modify)
        }
        Operation::Rename {
            old_name,
            new_name,
            dry_run,
        } => apply_rename(edit, &old_name, &new_name, dry_run).map(Outcome::Rename),
        Operation::Delete { name, dry_run } => {
            apply_delete(edit, &name, dry_run).map(Outcome::Delete)
        }
        Operation::BatchDelete { names, dry_run } => {
            Ok(Outcome::BatchDelete(apply_batch_delete(edit, &names, dry_run)))
        }
        Operation::Batch {
            operations,
            mode,
            dry_run,
            resume_from_index,
        } => Ok(Outcome::Batch(apply_batch(
            edit,
            operations,
            mode,
            dry_run,
            resume_from_index,
        ))),
    }
}

/// Upsert: create the entry when absent, replace it when present. A model
/// whose `name` differs from the target stages a rename instead.
fn apply_modify<S: Store>(
    edit: &mut EditCatalog<S>,
    name: &str,
    mut model: serde_json::Value,
) -> Result<ModifyResult, Error> {
    // A non-object model falls through to validation for a proper error.
    if let Some(obj) = model.as_object_mut() {
        obj.entry("name").or_insert_with(|| json!(name));
    }
    let model_name = model
        .get("name")
        .and_then(|v| v.as_str())
        .unwrap_or(name)
        .to_string();

    if model_name != name {
        let before = edit.resolve(name).map(|e| e.to_value());
        let entry = edit.rename(name, model)?;
        return Ok(ModifyResult {
            name: entry.name.clone(),
            created: false,
            renamed_from: Some(name.to_string()),
            before,
            after: entry.to_value(),
            dependencies: entry.dependencies().iter().map(|s| s.to_string()).collect(),
        });
    }

    let before = edit.resolve(name).map(|e| e.to_value());
    let entry = match &before {
        Some(_) => edit.modify(name, model)?,
        None => edit.add(model)?,
    };
    Ok(ModifyResult {
        name: entry.name.clone(),
        created: before.is_none(),
        renamed_from: None,
        before,
        after: entry.to_value(),
        dependencies: entry.dependencies().iter().map(|s| s.to_string()).collect(),
    })
}

fn apply_rename<S: Store>(
    edit: &mut EditCatalog<S>,
    old_name: &str,
    new_name: &str,
    dry_run: bool,
) -> Result<RenameResult, Error> {
    let proj = edit.projection();
    let entry = proj
        .entries
        .get(old_name)
        .cloned()
        .ok_or_else(|| Error::NotFound(old_name.to_string()))?;
    if proj.entries.contains_key(new_name) {
        return Err(Error::Conflict(format!(
            "rename target '{new_name}' already exists"
        )));
    }
    let dependents = dependents_of(&proj, old_name);

    if !dry_run {
        let mut value = entry.to_value();
        value["name"] = json!(new_name);
        edit.rename(old_name, value)?;
    }
    Ok(RenameResult {
        old_name: old_name.to_string(),
        new_name: new_name.to_string(),
        dry_run,
        dependents,
    })
}

fn apply_delete<S: Store>(
    edit: &mut EditCatalog<S>,
    name: &str,
    dry_run: bool,
) -> Result<DeleteResult, Error> {
    let proj = edit.projection();
    if !proj.entries.contains_key(name) {
        return Err(Error::NotFound(name.to_string()));
    }
    let dependents = dependents_of(&proj, name);
    if !dependents.is_empty() {
        warn!(name = %name, dependents = dependents.len(), "deleting a referenced entry");
    }
    if !dry_run {
        edit.delete(name);
    }
    Ok(DeleteResult {
        name: name.to_string(),
        existed: true,
        dry_run,
        dependents,
    })
}

/// Remove several entries; missing names are reported, not errors.
pub fn apply_batch_delete<S: Store>(
    edit: &mut EditCatalog<S>,
    names: &[String],
    dry_run: bool,
) -> BatchDeleteResult {
    let mut deleted = Vec::new();
    let mut missing = Vec::new();
    for name in names {
        if edit.resolve(name).is_some() {
            if !dry_run {
                edit.delete(name);
            }
            deleted.push(name.clone());
        } else {
            missing.push(name.clone());
        }
    }
    BatchDeleteResult {
        requested: names.len(),
        deleted,
        missing,
        dry_run,
    }
}

/// Apply a list of heterogeneous operations as a unit.
///
/// Operations run in dependency order. In `continue` mode a failure only
/// marks its own slot; in `atomic` mode the first failure restores the
/// pre-batch snapshot and skips everything not yet processed. Cycle errors
/// fail the whole batch before anything is applied.
pub fn apply_batch<S: Store>(
    edit: &mut EditCatalog<S>,
    operations: Vec<Operation>,
    mode: BatchMode,
    dry_run: bool,
    resume_from_index: Option<usize>,
) -> BatchResult {
    let started = Instant::now();
    let total = operations.len();
    let (order, cycles) = dependency_order(&operations);

    if !cycles.is_empty() {
        return cycle_failure(operations, cycles, mode, dry_run, started);
    }

    // Snapshot taken before any operation runs; atomic rollback restores it.
    let mark = edit.mark();
    let resume_before = resume_from_index.unwrap_or(0);

    let mut slots: Vec<Option<OperationResult>> = (0..total).map(|_| None).collect();
    let mut successful = 0;
    let mut failed = 0;
    let mut last_successful_index = None;
    let mut aborted = false;

    for (pos, &i) in order.iter().enumerate() {
        let op = &operations[i];

        if i < resume_before {
            slots[i] = Some(skipped_slot(i, op.clone()));
            continue;
        }

        let effective_dry = dry_run || op_dry_run(op);
        let outcome: Result<serde_json::Value, Error> = if matches!(op, Operation::Batch { .. }) {
            Err(Error::InvalidOperation(
                "nested batch operations are not supported".to_string(),
            ))
        } else if effective_dry {
            dry_run_check(edit, op)
        } else {
            apply_operation(edit, op.clone())
                .map(|o| serde_json::to_value(&o).unwrap_or(serde_json::Value::Null))
        };

        match outcome {
            Ok(result) => {
                debug!(index = i, op = %op.summary(), "batch operation applied");
                slots[i] = Some(OperationResult {
                    index: i,
                    operation: op.clone(),
                    status: OperationStatus::Success,
                    result: Some(result),
                    error: None,
                });
                successful += 1;
                last_successful_index = Some(i);
            }
            Err(err) => {
                warn!(index = i, op = %op.summary(), error = %err, "batch operation failed");
                slots[i] = Some(OperationResult {
                    index: i,
                    operation: op.clone(),
                    status: OperationStatus::Error,
                    result: None,
                    error: Some(OperationError::from_error(&err)),
                });
                failed += 1;
                if mode == BatchMode::Atomic {
                    if !dry_run {
                        edit.restore(mark);
                    }
                    // Everything applied so far was rolled back; what was
                    // not yet processed is skipped.
                    for &j in &order[pos + 1..] {
                        slots[j] = Some(skipped_slot(j, operations[j].clone()));
                    }
                    aborted = true;
                    break;
                }
            }
        }
    }

    let results: Vec<OperationResult> = slots
        .into_iter()
        .enumerate()
        .map(|(i, slot)| slot.unwrap_or_else(|| skipped_slot(i, operations[i].clone())))
        .collect();
    let skipped = results
        .iter()
        .filter(|r| r.status == OperationStatus::Skipped)
        .count();

    let summary = BatchSummary {
        total,
        successful,
        failed,
        skipped,
        duration_ms: started.elapsed().as_millis() as u64,
        mode,
        dry_run,
        circular_dependencies: None,
    };
    info!(
        total,
        successful, failed, skipped, aborted, "batch finished"
    );

    BatchResult {
        summary,
        results,
        last_successful_index,
    }
}

fn cycle_failure(
    operations: Vec<Operation>,
    cycles: Vec<super::sort::CycleError>,
    mode: BatchMode,
    dry_run: bool,
    started: Instant,
) -> BatchResult {
    let cyclic: HashSet<usize> = cycles.iter().map(|e| e.index).collect();
    let messages: Vec<String> = cycles.iter().map(|e| e.message.clone()).collect();
    warn!(cycles = cyclic.len(), "batch rejected: circular dependencies");

    let results: Vec<OperationResult> = operations
        .iter()
        .cloned()
        .enumerate()
        .map(|(i, operation)| {
            if cyclic.contains(&i) {
                let message = cycles
                    .iter()
                    .find(|e| e.index == i)
                    .map(|e| e.message.clone())
                    .unwrap_or_default();
                OperationResult {
                    index: i,
                    operation,
                    status: OperationStatus::Error,
                    result: None,
                    error: Some(OperationError {
                        error_type: "circular_dependency".to_string(),
                        message,
                        field: None,
                        suggestion: Some(
                            "break the cycle by splitting the batch or removing one of the \
                             mutual provenance references"
                                .to_string(),
                        ),
                    }),
                }
            } else {
                skipped_slot(i, operation)
            }
        })
        .collect();

    let failed = cyclic.len();
    BatchResult {
        summary: BatchSummary {
            total: results.len(),
            successful: 0,
            failed,
            skipped: results.len() - failed,
            duration_ms: started.elapsed().as_millis() as u64,
            mode,
            dry_run,
            circular_dependencies: Some(messages),
        },
        results,
        last_successful_index: None,
    }
}

fn skipped_slot(index: usize, operation: Operation) -> OperationResult {
    OperationResult {
        index,
        operation,
        status: OperationStatus::Skipped,
        result: None,
        error: None,
    }
}

fn op_dry_run(op: &Operation) -> bool {
    match op {
        Operation::Rename { dry_run, .. }
        | Operation::Delete { dry_run, .. }
        | Operation::BatchDelete { dry_run, .. }
        | Operation::Batch { dry_run, .. } => *dry_run,
        Operation::Modify { .. } => false,
    }
}

/// Validate an operation without staging anything: existence checks,
/// duplicate targets, and structural model validation.
fn dry_run_check<S: Store>(
    edit: &EditCatalog<S>,
    op: &Operation,
) -> Result<serde_json::Value, Error> {
    let proj = edit.projection();
    match op {
        Operation::Modify { name, model } => {
            let mut model = model.clone();
            if let Some(obj) = model.as_object_mut() {
                obj.entry("name").or_insert_with(|| json!(name));
            }
            let entry = entry::validate(model)?;
            let exists = proj.entries.contains_key(name);
            if entry.name != *name && proj.entries.contains_key(&entry.name) {
                return Err(Error::Conflict(format!(
                    "target '{}' already exists",
                    entry.name
                )));
            }
            Ok(json!({
                "action": if exists { "modify" } else { "add" },
                "name": entry.name,
                "dry_run": true,
            }))
        }
        Operation::Rename {
            old_name, new_name, ..
        } => {
            if !proj.entries.contains_key(old_name) {
                return Err(Error::NotFound(old_name.clone()));
            }
            if proj.entries.contains_key(new_name) {
                return Err(Error::Conflict(format!(
                    "rename target '{new_name}' already exists"
                )));
            }
            Ok(json!({
                "action": "rename",
                "old_name": old_name,
                "new_name": new_name,
                "dry_run": true,
            }))
        }
        Operation::Delete { name, .. } => {
            if !proj.entries.contains_key(name) {
                return Err(Error::NotFound(name.clone()));
            }
            Ok(json!({"action": "delete", "name": name, "dry_run": true}))
        }
        Operation::BatchDelete { names, .. } => {
            let (found, missing): (Vec<&String>, Vec<&String>) = names
                .iter()
                .partition(|n| proj.entries.contains_key(n.as_str()));
            Ok(json!({
                "action": "batch_delete",
                "found": found,
                "missing": missing,
                "dry_run": true,
            }))
        }
        Operation::Batch { .. } => Err(Error::InvalidOperation(
            "nested batch operations are not supported".to_string(),
        )),
    }
}

/// Entries in the view whose provenance, links, or supersession reference
/// `name`.
fn dependents_of(proj: &Projection, name: &str) -> Vec<String> {
    proj.entries
        .values()
        .filter(|e| e.name != name && e.dependencies().contains(&name))
        .map(|e| e.name.clone())
        .collect()
}
