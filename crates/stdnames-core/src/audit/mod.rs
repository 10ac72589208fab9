//! Vocabulary gap detection over the name corpus.

mod auditor;
pub(crate) mod patterns;
mod tagger;

pub use auditor::{
    AuditOptions, AuditReport, CheckReport, GapSource, NameGap, Priority, TokenCandidate,
    VocabularyAuditor, VocabularyGaps,
};
pub use patterns::{extract, Strategy, TokenHit};
pub use tagger::{LexiconTagger, SemanticTagger};
