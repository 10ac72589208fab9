//! Controlled vocabularies for the naming grammar.
//!
//! Each grammar segment (components, subjects, bases, objects, positions,
//! processes) draws its values from a YAML-backed vocabulary of lowercase
//! tokens. Vocabularies are loaded once at process start as an immutable
//! snapshot; mutations go through the [`VocabularyEditor`], which rewrites
//! the YAML file and regenerates grammar enumerations via an external
//! codegen step. A process restart is required for edits to take effect.

mod editor;
mod token;
mod vocabulary;

pub use editor::{CodegenCommand, EditStatus, VocabEditOutcome, VocabularyEditor};
pub use token::{is_valid_token, validate_token};
pub use vocabulary::{VocabKind, Vocabulary, VocabularySet};
