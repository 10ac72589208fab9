//! The typed edit-operation union and its mirrored result types.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Failure policy for a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchMode {
    /// A failing operation only marks its own result slot; siblings run.
    #[default]
    Continue,
    /// First failure rolls back everything already applied and skips the
    /// rest: all-or-nothing for the whole batch.
    Atomic,
}

impl std::fmt::Display for BatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchMode::Continue => f.write_str("continue"),
            BatchMode::Atomic => f.write_str("atomic"),
        }
    }
}

/// A single edit request, dispatched by `apply()`.
///
/// `Modify` is an upsert: it creates the entry when absent and replaces it
/// when present, which is what lets batch siblings depend on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Create or replace an entry with a full model.
    Modify {
        /// Target entry name.
        name: String,
        /// Full entry model.
        model: serde_json::Value,
    },
    /// Rename an entry, keeping its content.
    Rename {
        /// Current name.
        old_name: String,
        /// New name.
        new_name: String,
        /// Validate only, stage nothing.
        #[serde(default)]
        dry_run: bool,
    },
    /// Remove an entry.
    Delete {
        /// Target entry name.
        name: String,
        /// Validate only, stage nothing.
        #[serde(default)]
        dry_run: bool,
    },
    /// Remove several entries, reporting missing ones instead of failing.
    BatchDelete {
        /// Target entry names.
        names: Vec<String>,
        /// Validate only, stage nothing.
        #[serde(default)]
        dry_run: bool,
    },
    /// Apply a list of operations as a unit.
    Batch {
        /// Member operations; nesting another `Batch` is rejected.
        operations: Vec<Operation>,
        /// Failure policy.
        #[serde(default)]
        mode: BatchMode,
        /// Validate every member without staging anything.
        #[serde(default)]
        dry_run: bool,
        /// Skip members before this index (marked `skipped`), for
        /// retry-after-partial-failure workflows.
        #[serde(default)]
        resume_from_index: Option<usize>,
    },
}

impl Operation {
    /// Short human-readable description, used in diagnostics.
    pub fn summary(&self) -> String {
        match self {
            Operation::Modify { name, .. } => format!("modify {name}"),
            Operation::Rename {
                old_name, new_name, ..
            } => format!("rename {old_name} -> {new_name}"),
            Operation::Delete { name, .. } => format!("delete {name}"),
            Operation::BatchDelete { names, .. } => {
                format!("batch_delete {} entries", names.len())
            }
            Operation::Batch { operations, .. } => {
                format!("batch of {} operations", operations.len())
            }
        }
    }

    /// Names this operation produces or updates. Only modify (upsert) and
    /// rename targets count; deletes produce nothing.
    pub fn produced_names(&self) -> Vec<&str> {
        match self {
            Operation::Modify { name, model } => {
                let mut names = vec![name.as_str()];
                if let Some(model_name) = model.get("name").and_then(|v| v.as_str()) {
                    if model_name != name {
                        names.push(model_name);
                    }
                }
                names
            }
            Operation::Rename { new_name, .. } => vec![new_name.as_str()],
            _ => Vec::new(),
        }
    }

    /// Names this operation's provenance references.
    pub fn provenance_references(&self) -> Vec<&str> {
        let Operation::Modify { model, .. } = self else {
            return Vec::new();
        };
        let Some(prov) = model.get("provenance") else {
            return Vec::new();
        };
        let mut refs = Vec::new();
        if let Some(base) = prov.get("base").and_then(|v| v.as_str()) {
            refs.push(base);
        }
        if let Some(deps) = prov.get("dependencies").and_then(|v| v.as_array()) {
            refs.extend(deps.iter().filter_map(|d| d.as_str()));
        }
        refs
    }
}

/// Result of a `Modify` operation.
#[derive(Debug, Clone, Serialize)]
pub struct ModifyResult {
    /// Final entry name.
    pub name: String,
    /// Whether the entry was created rather than replaced.
    pub created: bool,
    /// Previous name when the model's name differed from the target.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub renamed_from: Option<String>,
    /// Snapshot before the operation, when one existed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<serde_json::Value>,
    /// Snapshot after the operation.
    pub after: serde_json::Value,
    /// Names the entry depends on.
    pub dependencies: Vec<String>,
}

/// Result of a `Rename` operation.
#[derive(Debug, Clone, Serialize)]
pub struct RenameResult {
    /// Previous name.
    pub old_name: String,
    /// New name.
    pub new_name: String,
    /// Whether this was a dry run.
    pub dry_run: bool,
    /// Entries whose provenance or links reference the old name.
    pub dependents: Vec<String>,
}

/// Result of a `Delete` operation.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResult {
    /// Deleted name.
    pub name: String,
    /// Whether the entry existed.
    pub existed: bool,
    /// Whether this was a dry run.
    pub dry_run: bool,
    /// Entries that reference the deleted name.
    pub dependents: Vec<String>,
}

/// Result of a `BatchDelete` operation.
#[derive(Debug, Clone, Serialize)]
pub struct BatchDeleteResult {
    /// Number of names requested.
    pub requested: usize,
    /// Names actually staged for deletion.
    pub deleted: Vec<String>,
    /// Names that did not exist.
    pub missing: Vec<String>,
    /// Whether this was a dry run.
    pub dry_run: bool,
}

/// Per-operation execution status inside a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationStatus {
    /// Applied (or validated, in a dry run).
    Success,
    /// Failed; see the structured error.
    Error,
    /// Not processed: resume skip, atomic abort, or cycle member.
    Skipped,
}

/// Structured failure description with a human-actionable suggestion.
#[derive(Debug, Clone, Serialize)]
pub struct OperationError {
    /// Machine-readable failure class.
    #[serde(rename = "type")]
    pub error_type: String,
    /// Failure message.
    pub message: String,
    /// Offending field, when it can be extracted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Suggested fix, when a known failure pattern matches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl OperationError {
    /// Classify an error and attach a suggestion for common patterns.
    pub fn from_error(err: &Error) -> Self {
        match err {
            Error::NotFound(name) => Self {
                error_type: "not_found".to_string(),
                message: err.to_string(),
                field: Some("name".to_string()),
                suggestion: Some(format!(
                    "create '{name}' first, or reorder the batch so its producer runs earlier"
                )),
            },
            Error::Conflict(_) => Self {
                error_type: "conflict".to_string(),
                message: err.to_string(),
                field: Some("name".to_string()),
                suggestion: Some(
                    "choose a different target name or delete the existing entry first"
                        .to_string(),
                ),
            },
            Error::Validation { field, message } => Self {
                error_type: "validation".to_string(),
                message: message.clone(),
                field: field.clone(),
                suggestion: suggest_for_validation(field.as_deref(), message),
            },
            Error::InvalidOperation(_) => Self {
                error_type: "invalid_operation".to_string(),
                message: err.to_string(),
                field: None,
                suggestion: None,
            },
            other => Self {
                error_type: "internal".to_string(),
                message: other.to_string(),
                field: None,
                suggestion: None,
            },
        }
    }
}

fn suggest_for_validation(field: Option<&str>, message: &str) -> Option<String> {
    if field == Some("provenance") || message.contains("provenance") {
        return Some(
            "ensure the provenance base/dependencies name existing entries and the kind is a \
             derived kind"
                .to_string(),
        );
    }
    if field == Some("tags") || message.contains("primary tag") {
        return Some("set tags[0] to the single primary tag".to_string());
    }
    if field == Some("name") || message.contains("token") {
        return Some(
            "names are lowercase [a-z0-9_] tokens with no double or edge underscores".to_string(),
        );
    }
    None
}

/// Execution summary for a whole batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    /// Total operations submitted.
    pub total: usize,
    /// Operations applied (or validated in a dry run).
    pub successful: usize,
    /// Operations that failed.
    pub failed: usize,
    /// Operations not processed.
    pub skipped: usize,
    /// Wall-clock duration.
    pub duration_ms: u64,
    /// Failure policy used.
    pub mode: BatchMode,
    /// Whether this was a dry run.
    pub dry_run: bool,
    /// Cycle diagnostics; non-empty means nothing was applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub circular_dependencies: Option<Vec<String>>,
}

/// One result slot per submitted operation, in original order.
#[derive(Debug, Clone, Serialize)]
pub struct OperationResult {
    /// Index in the submitted list.
    pub index: usize,
    /// The operation as submitted.
    pub operation: Operation,
    /// Execution status.
    pub status: OperationStatus,
    /// Variant-specific result payload, on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Structured error, on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<OperationError>,
}

/// Result of a `Batch` operation.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    /// Aggregate summary.
    pub summary: BatchSummary,
    /// Per-operation results in original order.
    pub results: Vec<OperationResult>,
    /// Original index of the last successfully processed operation.
    pub last_successful_index: Option<usize>,
}

/// Result union mirroring [`Operation`].
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Outcome {
    /// Result of `Modify`.
    Modify(ModifyResult),
    /// Result of `Rename`.
    Rename(RenameResult),
    /// Result of `Delete`.
    Delete(DeleteResult),
    /// Result of `BatchDelete`.
    BatchDelete(BatchDeleteResult),
    /// Result of `Batch`.
    Batch(BatchResult),
}
