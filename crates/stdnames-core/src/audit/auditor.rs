//! Corpus-wide vocabulary gap detection.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info};

use super::patterns;
use super::tagger::{LexiconTagger, SemanticTagger};
use crate::grammar;
use crate::vocab::{VocabKind, VocabularySet};

/// Priority tier derived from corpus frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// 10 or more occurrences.
    High,
    /// 5 to 9 occurrences.
    Medium,
    /// 3 to 4 occurrences.
    Low,
    /// Below the default threshold.
    Weak,
}

impl Priority {
    /// Tier for an occurrence count.
    pub fn from_frequency(frequency: usize) -> Self {
        match frequency {
            f if f >= 10 => Priority::High,
            5..=9 => Priority::Medium,
            3..=4 => Priority::Low,
            _ => Priority::Weak,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
            Priority::Weak => "weak",
        };
        f.write_str(s)
    }
}

/// Knobs for a corpus audit.
#[derive(Debug, Clone)]
pub struct AuditOptions {
    /// Restrict the audit to one vocabulary.
    pub vocabulary: Option<VocabKind>,
    /// Minimum occurrence count for a token to be reported.
    pub frequency_threshold: usize,
    /// Maximum candidates reported per vocabulary.
    pub max_results: usize,
}

impl Default for AuditOptions {
    fn default() -> Self {
        Self {
            vocabulary: None,
            frequency_threshold: 3,
            max_results: 20,
        }
    }
}

/// One mined token absent from its vocabulary.
#[derive(Debug, Clone, Serialize)]
pub struct TokenCandidate {
    /// The mined token.
    pub token: String,
    /// Occurrences across the corpus.
    pub frequency: usize,
    /// Priority tier.
    pub priority: Priority,
    /// Names the token was extracted from.
    pub affected_names: Vec<String>,
}

/// Candidates for one vocabulary, sorted by frequency descending.
///
/// Priority tiers are frequency bands, so the sort also groups candidates
/// by tier: every `high` candidate precedes every `medium` one, and so on
/// down to `weak`.
#[derive(Debug, Clone, Serialize)]
pub struct VocabularyGaps {
    /// The vocabulary the candidates are missing from.
    pub vocabulary: VocabKind,
    /// Candidate tokens.
    pub candidates: Vec<TokenCandidate>,
}

/// JSON-serializable audit result.
#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    /// Number of names scanned.
    pub corpus_size: usize,
    /// Threshold the audit ran with.
    pub frequency_threshold: usize,
    /// Per-vocabulary gap groups; vocabularies with no candidates are
    /// omitted.
    pub gaps: Vec<VocabularyGaps>,
}

impl AuditReport {
    /// Whether no gaps were found.
    pub fn is_clean(&self) -> bool {
        self.gaps.is_empty()
    }
}

/// Which analysis path found a gap in [`VocabularyAuditor::check_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GapSource {
    /// A structurally recognized segment with an unknown value.
    Grammar,
    /// Raw-string pattern extraction.
    Pattern,
}

/// One gap found while checking a single name.
#[derive(Debug, Clone, Serialize)]
pub struct NameGap {
    /// The unknown token.
    pub token: String,
    /// Vocabulary it is missing from.
    pub vocabulary: VocabKind,
    /// Occurrences across the corpus.
    pub frequency: usize,
    /// Priority tier.
    pub priority: Priority,
    /// Analysis path that found it.
    pub source: GapSource,
}

/// Result of checking a single name.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    /// The checked name.
    pub name: String,
    /// Gaps found, empty when the name is fully covered.
    pub gaps: Vec<NameGap>,
}

impl CheckReport {
    /// Whether any gap was found.
    pub fn has_gaps(&self) -> bool {
        !self.gaps.is_empty()
    }
}

type Counts = HashMap<VocabKind, HashMap<String, usize>>;

/// Mines the name corpus for tokens missing from the controlled
/// vocabularies.
///
/// Extraction counts are cached across calls; the caller must call
/// [`VocabularyAuditor::invalidate_cache`] whenever the corpus changes, and
/// must do so before the next audit when mutating concurrently is possible.
pub struct VocabularyAuditor {
    vocabs: VocabularySet,
    tagger: Box<dyn SemanticTagger>,
    cache: Option<Counts>,
}

impl VocabularyAuditor {
    /// Auditor with the default fixed-lexicon tagger.
    pub fn new(vocabs: VocabularySet) -> Self {
        Self::with_tagger(vocabs, Box::new(LexiconTagger))
    }

    /// Auditor with a caller-supplied tagger.
    pub fn with_tagger(vocabs: VocabularySet, tagger: Box<dyn SemanticTagger>) -> Self {
        Self {
            vocabs,
            tagger,
            cache: None,
        }
    }

    /// The vocabulary snapshot the auditor checks against.
    pub fn vocabularies(&self) -> &VocabularySet {
        &self.vocabs
    }

    /// Drop the cached extraction counts.
    pub fn invalidate_cache(&mut self) {
        if self.cache.take().is_some() {
            debug!("audit cache invalidated");
        }
    }

    fn ensure_cache(&mut self, corpus: &[String]) {
        if self.cache.is_some() {
            return;
        }
        let mut counts: Counts = HashMap::new();
        for name in corpus {
            for hit in patterns::extract(name, self.tagger.as_ref()) {
                *counts
                    .entry(hit.vocabulary)
                    .or_default()
                    .entry(hit.token)
                    .or_insert(0) += 1;
            }
        }
        debug!(names = corpus.len(), "audit cache built");
        self.cache = Some(counts);
    }

    fn frequency(&self, kind: VocabKind, token: &str) -> usize {
        self.cache
            .as_ref()
            .and_then(|c| c.get(&kind))
            .and_then(|m| m.get(token))
            .copied()
            .unwrap_or(0)
    }

    /// Names whose extraction yields the given (vocabulary, token) pair.
    fn affected_names(&self, corpus: &[String], kind: VocabKind, token: &str) -> Vec<String> {
        corpus
            .iter()
            .filter(|name| {
                patterns::extract(name, self.tagger.as_ref())
                    .iter()
                    .any(|h| h.vocabulary == kind && h.token == token)
            })
            .cloned()
            .collect()
    }

    /// Scan the corpus and report frequent tokens missing from the
    /// vocabularies.
    pub fn audit(&mut self, corpus: &[String], options: &AuditOptions) -> AuditReport {
        self.ensure_cache(corpus);
        let kinds: Vec<VocabKind> = match options.vocabulary {
            Some(kind) => vec![kind],
            None => VocabKind::ALL.to_vec(),
        };

        let empty = HashMap::new();
        let mut gaps = Vec::new();
        for kind in kinds {
            let vocab = self.vocabs.get(kind);
            let counted = self
                .cache
                .as_ref()
                .and_then(|c| c.get(&kind))
                .unwrap_or(&empty);

            let mut ranked: Vec<(String, usize)> = counted
                .iter()
                .filter(|(token, &n)| {
                    n >= options.frequency_threshold && !vocab.contains(token)
                })
                .map(|(token, &n)| (token.clone(), n))
                .collect();
            ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            ranked.truncate(options.max_results);

            let candidates: Vec<TokenCandidate> = ranked
                .into_iter()
                .map(|(token, frequency)| TokenCandidate {
                    affected_names: self.affected_names(corpus, kind, &token),
                    priority: Priority::from_frequency(frequency),
                    token,
                    frequency,
                })
                .collect();
            if !candidates.is_empty() {
                gaps.push(VocabularyGaps {
                    vocabulary: kind,
                    candidates,
                });
            }
        }

        info!(
            corpus = corpus.len(),
            vocabularies = gaps.len(),
            "vocabulary audit finished"
        );
        AuditReport {
            corpus_size: corpus.len(),
            frequency_threshold: options.frequency_threshold,
            gaps,
        }
    }

    /// Check one name for vocabulary gaps.
    ///
    /// Structurally recognized segments with unknown-but-frequent values are
    /// reported first; only when that path finds nothing does raw-pattern
    /// extraction run as a fallback.
    pub fn check_name(
        &mut self,
        name: &str,
        corpus: &[String],
        frequency_threshold: usize,
    ) -> CheckReport {
        self.ensure_cache(corpus);

        let mut gaps = Vec::new();
        for (kind, value) in grammar::parse(name, &self.vocabs).segments() {
            if self.vocabs.contains(kind, value) {
                continue;
            }
            let frequency = self.frequency(kind, value);
            if frequency >= frequency_threshold {
                gaps.push(NameGap {
                    token: value.to_string(),
                    vocabulary: kind,
                    frequency,
                    priority: Priority::from_frequency(frequency),
                    source: GapSource::Grammar,
                });
            }
        }

        if gaps.is_empty() {
            for hit in patterns::extract(name, self.tagger.as_ref()) {
                if self.vocabs.contains(hit.vocabulary, &hit.token) {
                    continue;
                }
                let frequency = self.frequency(hit.vocabulary, &hit.token);
                if frequency >= frequency_threshold {
                    gaps.push(NameGap {
                        token: hit.token,
                        vocabulary: hit.vocabulary,
                        frequency,
                        priority: Priority::from_frequency(frequency),
                        source: GapSource::Pattern,
                    });
                }
            }
        }

        CheckReport {
            name: name.to_string(),
            gaps,
        }
    }
}
