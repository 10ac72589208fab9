//! Semantic classification of mined tokens.
//!
//! `_of_<token>` is ambiguous between a spatial location and a physical
//! object; a [`SemanticTagger`] decides which vocabulary the token belongs
//! to. The default implementation is a fixed-lexicon lookup; a model-backed
//! tagger can be swapped in at construction as long as it honors the same
//! classification contract.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use tracing::debug;

use crate::vocab::VocabKind;

/// Spatial-noun lemmas that route an `_of_` token to the positions
/// vocabulary.
static SPATIAL_LEMMAS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "surface",
        "boundary",
        "axis",
        "edge",
        "wall",
        "midplane",
        "separatrix",
        "core",
        "pedestal",
        "region",
        "plane",
        "layer",
        "point",
        "center",
        "centre",
    ])
});

/// Equipment-noun lemmas that route an `_of_` token to the objects
/// vocabulary.
static EQUIPMENT_LEMMAS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "coil",
        "antenna",
        "probe",
        "limiter",
        "divertor",
        "sensor",
        "detector",
        "electrode",
        "magnet",
        "chamber",
        "vessel",
        "plate",
        "loop",
        "camera",
    ])
});

/// Particle-species lemmas recognized as subject candidates.
pub(crate) static SPECIES_LEMMAS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "electron",
        "ion",
        "deuterium",
        "tritium",
        "hydrogen",
        "helium",
        "neutron",
        "photon",
        "impurity",
        "alpha",
        "carbon",
        "tungsten",
    ])
});

/// Two-word species compounds checked before single lemmas.
pub(crate) const SPECIES_COMPOUNDS: [&str; 3] = ["fast_ion", "runaway_electron", "thermal_ion"];

/// Decides whether an ambiguous token names a location or an object.
pub trait SemanticTagger {
    /// Classify a token as [`VocabKind::Positions`] or [`VocabKind::Objects`].
    fn classify(&self, token: &str) -> VocabKind;
}

/// Fixed keyword-membership tagger. Classification looks at the token's
/// head noun (the last underscore-delimited segment), with a trailing
/// plural `s` stripped; anything unrecognized defaults to objects.
#[derive(Debug, Default, Clone, Copy)]
pub struct LexiconTagger;

impl LexiconTagger {
    fn lemma(segment: &str) -> &str {
        // "coils" -> "coil", but keep short words like "gas" intact.
        match segment.strip_suffix('s') {
            Some(stem) if stem.len() > 3 => stem,
            _ => segment,
        }
    }
}

impl SemanticTagger for LexiconTagger {
    fn classify(&self, token: &str) -> VocabKind {
        let head = token.rsplit('_').next().unwrap_or(token);
        let lemma = Self::lemma(head);
        if SPATIAL_LEMMAS.contains(lemma) {
            return VocabKind::Positions;
        }
        if !EQUIPMENT_LEMMAS.contains(lemma) {
            debug!(token, lemma, "head not in any lexicon; defaulting to objects");
        }
        VocabKind::Objects
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spatial_head_routes_to_positions() {
        let tagger = LexiconTagger;
        assert_eq!(tagger.classify("flux_surface"), VocabKind::Positions);
        assert_eq!(tagger.classify("plasma_boundary"), VocabKind::Positions);
        assert_eq!(tagger.classify("magnetic_axis"), VocabKind::Positions);
    }

    #[test]
    fn test_equipment_head_routes_to_objects() {
        let tagger = LexiconTagger;
        assert_eq!(tagger.classify("poloidal_field_coil"), VocabKind::Objects);
        assert_eq!(tagger.classify("langmuir_probe"), VocabKind::Objects);
    }

    #[test]
    fn test_plural_head_is_lemmatized() {
        let tagger = LexiconTagger;
        assert_eq!(tagger.classify("field_coils"), VocabKind::Objects);
        assert_eq!(tagger.classify("flux_surfaces"), VocabKind::Positions);
    }

    #[test]
    fn test_unknown_head_defaults_to_objects() {
        let tagger = LexiconTagger;
        assert_eq!(tagger.classify("pellet"), VocabKind::Objects);
    }
}
