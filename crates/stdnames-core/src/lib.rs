//! Standard Names Core - Catalog, staged editing, and vocabulary tooling.
//!
//! This crate provides the core functionality for curating a controlled
//! vocabulary of standard names for plasma-physics quantities: a YAML-backed
//! catalog with staged mutation sessions, a dependency-ordered batch
//! operation engine, and vocabulary gap mining plus vocabulary file editing.

pub mod audit;
pub mod batch;
pub mod catalog;
pub mod entry;
pub mod error;
pub mod grammar;
pub mod store;
pub mod vocab;

pub use audit::{
    AuditOptions, AuditReport, CheckReport, GapSource, LexiconTagger, NameGap, Priority,
    SemanticTagger, TokenCandidate, VocabularyAuditor, VocabularyGaps,
};
pub use batch::{
    BatchDeleteResult, BatchMode, BatchResult, BatchSummary, CycleError, DeleteResult,
    ModifyResult, Operation, OperationError, OperationResult, OperationStatus, Outcome,
    RenameResult,
};
pub use catalog::{
    Catalog, CatalogDiff, DiffCounts, EditCatalog, RenamePair, SearchFilter, UnitOfWork,
    WriteReport,
};
pub use entry::{Entry, Kind, Link, Provenance, Status};
pub use error::{Error, ValidationIssue};
pub use store::{Store, YamlStore};
pub use vocab::{
    is_valid_token, validate_token, CodegenCommand, EditStatus, VocabEditOutcome, VocabKind,
    Vocabulary, VocabularyEditor, VocabularySet,
};
