//! Raw-string token extraction strategies.
//!
//! Every strategy works on the name string itself, independent of whether
//! the grammar can currently parse it; otherwise unrecognized tokens would
//! be dropped before they could be mined. Strategies run in a fixed
//! precedence order and claim the character span of each extracted token,
//! so a later strategy never re-extracts a substring an earlier one already
//! accounted for.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::tagger::{SemanticTagger, SPECIES_COMPOUNDS, SPECIES_LEMMAS};
use crate::vocab::{is_valid_token, VocabKind};

/// Which extraction strategy produced a hit, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// `^<token>_component_of_` prefix.
    ComponentPrefix,
    /// `_at_<token>` suffix, stopping before `_due_to_`.
    PositionSuffix,
    /// `_due_to_<token>` suffix.
    ProcessSuffix,
    /// Two-word compound before `_averaged`/`_area`/`_volume`/`_derivative`.
    GeometryCompound,
    /// Species lemma or compound among the leading tokens. Runs before the
    /// generic `_of_` match because the species lexicon is higher precision
    /// than the tagger's default classification.
    Subject,
    /// Generic `_of_<token>`, classified by the semantic tagger.
    GenericOf,
    /// Leading `<token>_of_` geometric-base prefix.
    GeometricBase,
}

/// One token extracted from a name.
#[derive(Debug, Clone)]
pub struct TokenHit {
    /// The extracted token.
    pub token: String,
    /// Vocabulary the token is a candidate for.
    pub vocabulary: VocabKind,
    /// Strategy that produced it.
    pub strategy: Strategy,
}

pub(crate) static COMPONENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([a-z0-9]+(?:_[a-z0-9]+)*?)_component_of_").unwrap());

// Non-greedy up to the next marker; the regex crate has no lookahead.
pub(crate) static POSITION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_at_([a-z0-9]+(?:_[a-z0-9]+)*?)(?:_due_to_|$)").unwrap());

pub(crate) static PROCESS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_due_to_([a-z0-9]+(?:_[a-z0-9]+)*)$").unwrap());

static GEOMETRY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|_)([a-z0-9]+_[a-z0-9]+)_(?:averaged|area|volume|derivative)(?:_|$)").unwrap()
});

pub(crate) static OF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_of_([a-z0-9]+(?:_[a-z0-9]+)*?)(?:_at_|_due_to_|$)").unwrap());

pub(crate) static BASE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([a-z0-9]+(?:_[a-z0-9]+)?)_of_").unwrap());

/// Tracks which character ranges of the name have been claimed.
struct SpanClaims(Vec<(usize, usize)>);

impl SpanClaims {
    fn new() -> Self {
        Self(Vec::new())
    }

    fn overlaps(&self, start: usize, end: usize) -> bool {
        self.0.iter().any(|&(s, e)| start < e && s < end)
    }

    fn claim(&mut self, start: usize, end: usize) {
        self.0.push((start, end));
    }
}

/// Extract every candidate token from one name.
///
/// Hits are returned in strategy-precedence order; each token has already
/// passed lexical validation.
pub fn extract(name: &str, tagger: &dyn SemanticTagger) -> Vec<TokenHit> {
    let mut hits = Vec::new();
    let mut claims = SpanClaims::new();

    let mut push = |claims: &mut SpanClaims,
                    hits: &mut Vec<TokenHit>,
                    start: usize,
                    end: usize,
                    token: &str,
                    vocabulary: VocabKind,
                    strategy: Strategy| {
        if claims.overlaps(start, end) || !is_valid_token(token) {
            return;
        }
        claims.claim(start, end);
        hits.push(TokenHit {
            token: token.to_string(),
            vocabulary,
            strategy,
        });
    };

    if let Some(caps) = COMPONENT_RE.captures(name) {
        let m = caps.get(1).unwrap();
        push(
            &mut claims,
            &mut hits,
            m.start(),
            m.end(),
            m.as_str(),
            VocabKind::Components,
            Strategy::ComponentPrefix,
        );
    }

    if let Some(caps) = POSITION_RE.captures(name) {
        let m = caps.get(1).unwrap();
        push(
            &mut claims,
            &mut hits,
            m.start(),
            m.end(),
            m.as_str(),
            VocabKind::Positions,
            Strategy::PositionSuffix,
        );
    }

    if let Some(caps) = PROCESS_RE.captures(name) {
        let m = caps.get(1).unwrap();
        push(
            &mut claims,
            &mut hits,
            m.start(),
            m.end(),
            m.as_str(),
            VocabKind::Processes,
            Strategy::ProcessSuffix,
        );
    }

    if let Some(caps) = GEOMETRY_RE.captures(name) {
        let m = caps.get(1).unwrap();
        push(
            &mut claims,
            &mut hits,
            m.start(),
            m.end(),
            m.as_str(),
            tagger.classify(m.as_str()),
            Strategy::GeometryCompound,
        );
    }

    for (start, end, token) in subject_candidates(name) {
        push(
            &mut claims,
            &mut hits,
            start,
            end,
            token,
            VocabKind::Subjects,
            Strategy::Subject,
        );
    }

    if let Some(caps) = OF_RE.captures(name) {
        let m = caps.get(1).unwrap();
        push(
            &mut claims,
            &mut hits,
            m.start(),
            m.end(),
            m.as_str(),
            tagger.classify(m.as_str()),
            Strategy::GenericOf,
        );
    }

    if let Some(caps) = BASE_RE.captures(name) {
        let m = caps.get(1).unwrap();
        push(
            &mut claims,
            &mut hits,
            m.start(),
            m.end(),
            m.as_str(),
            VocabKind::Bases,
            Strategy::GeometricBase,
        );
    }

    hits
}

/// Species lemmas and compounds among the first few tokens, after any
/// leading `<component>_component_of_` prefix.
fn subject_candidates(name: &str) -> Vec<(usize, usize, &str)> {
    let scan_from = COMPONENT_RE
        .captures(name)
        .and_then(|c| c.get(0))
        .map_or(0, |m| m.end());
    let window = &name[scan_from..];

    let mut offsets = Vec::new();
    let mut pos = 0;
    for segment in window.split('_').take(4) {
        offsets.push((scan_from + pos, scan_from + pos + segment.len()));
        pos += segment.len() + 1;
    }

    let mut found = Vec::new();
    let mut i = 0;
    while i < offsets.len() {
        // Compounds first so fast_ion is not mined as bare "ion".
        if i + 1 < offsets.len() {
            let (s, _) = offsets[i];
            let (_, e) = offsets[i + 1];
            let pair = &name[s..e];
            if SPECIES_COMPOUNDS.contains(&pair) {
                found.push((s, e, pair));
                i += 2;
                continue;
            }
        }
        let (s, e) = offsets[i];
        let single = &name[s..e];
        if SPECIES_LEMMAS.contains(single) {
            found.push((s, e, single));
        }
        i += 1;
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::tagger::LexiconTagger;

    fn hits(name: &str) -> Vec<(VocabKind, String)> {
        extract(name, &LexiconTagger)
            .into_iter()
            .map(|h| (h.vocabulary, h.token))
            .collect()
    }

    #[test]
    fn test_component_prefix() {
        let found = hits("radial_component_of_magnetic_field");
        assert!(found.contains(&(VocabKind::Components, "radial".to_string())));
    }

    #[test]
    fn test_position_suffix_stops_before_process() {
        let found = hits("electron_temperature_at_magnetic_axis_due_to_ohmic_heating");
        assert!(found.contains(&(VocabKind::Positions, "magnetic_axis".to_string())));
        assert!(found.contains(&(VocabKind::Processes, "ohmic_heating".to_string())));
    }

    #[test]
    fn test_generic_of_routed_by_tagger() {
        assert!(hits("area_of_flux_surface")
            .contains(&(VocabKind::Positions, "flux_surface".to_string())));
        assert!(hits("current_of_poloidal_field_coil")
            .contains(&(VocabKind::Objects, "poloidal_field_coil".to_string())));
    }

    #[test]
    fn test_geometry_compound_before_averaged() {
        let found = hits("flux_surface_averaged_density");
        assert!(found.contains(&(VocabKind::Positions, "flux_surface".to_string())));
    }

    #[test]
    fn test_subject_species_and_compound() {
        assert!(hits("electron_temperature").contains(&(VocabKind::Subjects, "electron".to_string())));
        let found = hits("fast_ion_pressure");
        assert!(found.contains(&(VocabKind::Subjects, "fast_ion".to_string())));
        assert!(!found.contains(&(VocabKind::Subjects, "ion".to_string())));
    }

    #[test]
    fn test_subject_scan_skips_component_prefix() {
        let found = hits("radial_component_of_electron_velocity");
        assert!(found.contains(&(VocabKind::Subjects, "electron".to_string())));
    }

    #[test]
    fn test_geometric_base_prefix() {
        let found = hits("centroid_of_plasma_boundary");
        assert!(found.contains(&(VocabKind::Bases, "centroid".to_string())));
        assert!(found.contains(&(VocabKind::Positions, "plasma_boundary".to_string())));
    }

    #[test]
    fn test_component_span_blocks_base_prefix() {
        // "radial" is claimed by the component strategy; the base-prefix
        // strategy must not re-extract "radial_component".
        let found = hits("radial_component_of_velocity");
        assert!(!found.iter().any(|(k, _)| *k == VocabKind::Bases));
    }
}
