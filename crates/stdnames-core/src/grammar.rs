//! Structural segmentation of standard names.
//!
//! A name is composed as component + subject + geometric base + object +
//! position + process. Marker-delimited slots (`_component_of_`, `_of_`,
//! `_at_`, `_due_to_`) are recognized structurally, so their values may be
//! tokens the vocabularies do not know yet. Subject and base slots have no
//! marker and are only filled by vocabulary membership; unknown candidates
//! for those are left to raw-pattern mining.

use crate::audit::patterns::{BASE_RE, COMPONENT_RE, OF_RE, POSITION_RE, PROCESS_RE};
use crate::vocab::{VocabKind, VocabularySet};

/// Segments recognized in one name. Any slot may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameParts {
    /// Vector component prefix.
    pub component: Option<String>,
    /// Particle species or population.
    pub subject: Option<String>,
    /// Geometric base prefix.
    pub base: Option<String>,
    /// Object of a generic `_of_` clause.
    pub object: Option<String>,
    /// Spatial location.
    pub position: Option<String>,
    /// Physical process.
    pub process: Option<String>,
}

impl NameParts {
    /// Filled slots as (vocabulary, value) pairs, in grammar order.
    pub fn segments(&self) -> Vec<(VocabKind, &str)> {
        let slots = [
            (VocabKind::Components, &self.component),
            (VocabKind::Subjects, &self.subject),
            (VocabKind::Bases, &self.base),
            (VocabKind::Objects, &self.object),
            (VocabKind::Positions, &self.position),
            (VocabKind::Processes, &self.process),
        ];
        slots
            .into_iter()
            .filter_map(|(kind, slot)| slot.as_ref().map(|v| (kind, v.as_str())))
            .collect()
    }

    /// Whether no slot was recognized.
    pub fn is_empty(&self) -> bool {
        self.segments().is_empty()
    }
}

/// Segment a name against the vocabulary snapshot.
pub fn parse(name: &str, vocabs: &VocabularySet) -> NameParts {
    let mut parts = NameParts::default();

    if let Some(caps) = COMPONENT_RE.captures(name) {
        parts.component = Some(caps[1].to_string());
    }
    if let Some(caps) = POSITION_RE.captures(name) {
        parts.position = Some(caps[1].to_string());
    }
    if let Some(caps) = PROCESS_RE.captures(name) {
        parts.process = Some(caps[1].to_string());
    }

    // The `_of_` value lands in the position slot when the positions
    // vocabulary already knows it, otherwise in the object slot.
    if let Some(caps) = OF_RE.captures(name) {
        let value = caps[1].to_string();
        if parts.position.is_none() && vocabs.contains(VocabKind::Positions, &value) {
            parts.position = Some(value);
        } else {
            parts.object = Some(value);
        }
    }

    if parts.component.is_none() {
        if let Some(caps) = BASE_RE.captures(name) {
            let value = &caps[1];
            if vocabs.contains(VocabKind::Bases, value) {
                parts.base = Some(value.to_string());
            }
        }
    }

    parts.subject = leading_subject(name, vocabs);
    parts
}

/// Longest subjects-vocabulary match among the first few tokens, after any
/// leading component prefix.
fn leading_subject(name: &str, vocabs: &VocabularySet) -> Option<String> {
    let rest = COMPONENT_RE
        .captures(name)
        .and_then(|c| c.get(0))
        .map_or(name, |m| &name[m.end()..]);
    let tokens: Vec<&str> = rest.split('_').take(4).collect();
    for i in 0..tokens.len() {
        // Two-word compounds (fast_ion) take priority over their tail word.
        if i + 1 < tokens.len() {
            let pair = format!("{}_{}", tokens[i], tokens[i + 1]);
            if vocabs.contains(VocabKind::Subjects, &pair) {
                return Some(pair);
            }
        }
        if vocabs.contains(VocabKind::Subjects, tokens[i]) {
            return Some(tokens[i].to_string());
        }
    }
    None
}
