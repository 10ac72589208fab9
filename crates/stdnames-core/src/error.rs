//! Core error types.

use thiserror::Error;

/// Core catalog errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Entry data failed structural validation.
    #[error("validation error{}: {message}", field_suffix(.field))]
    Validation {
        /// Offending field, when it can be attributed.
        field: Option<String>,
        /// Human-readable description of the problem.
        message: String,
    },

    /// Lookup failure: the named entry does not exist.
    #[error("entry not found: {0}")]
    NotFound(String),

    /// Target already exists or duplicate staging.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The requested vocabulary is not part of the grammar.
    #[error("unknown vocabulary: {0}")]
    UnknownVocabulary(String),

    /// An operation that cannot be dispatched in the current context.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Filesystem error from the store or vocabulary files.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML (de)serialization error.
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON (de)serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Build a validation error attributed to a field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Validation {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    /// Build a validation error with no field attribution.
    pub fn validation_msg(message: impl Into<String>) -> Self {
        Error::Validation {
            field: None,
            message: message.into(),
        }
    }
}

fn field_suffix(field: &Option<String>) -> String {
    match field {
        Some(f) => format!(" on field '{f}'"),
        None => String::new(),
    }
}

/// A single validation issue, attributable to an entry and field.
///
/// Collected by `write()` so a failed commit can report every problem at
/// once while leaving the pending state intact.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ValidationIssue {
    /// Name of the entry the issue belongs to, when known.
    pub name: Option<String>,
    /// Offending field, when it can be attributed.
    pub field: Option<String>,
    /// Human-readable description.
    pub message: String,
}

impl ValidationIssue {
    /// Build an issue for a named entry.
    pub fn for_entry(
        name: impl Into<String>,
        field: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            field,
            message: message.into(),
        }
    }
}

impl From<&Error> for ValidationIssue {
    fn from(err: &Error) -> Self {
        match err {
            Error::Validation { field, message } => Self {
                name: None,
                field: field.clone(),
                message: message.clone(),
            },
            other => Self {
                name: None,
                field: None,
                message: other.to_string(),
            },
        }
    }
}
