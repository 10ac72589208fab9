//! Vocabulary snapshot types.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// The grammar segment a vocabulary supplies tokens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VocabKind {
    /// Vector component prefixes (`radial`, `toroidal`, ...).
    Components,
    /// Particle species and populations (`electron`, `fast_ion`, ...).
    Subjects,
    /// Geometric bases (`position`, `vertex`, `centroid`, ...).
    Bases,
    /// Physical equipment and devices (`coil`, `antenna`, ...).
    Objects,
    /// Spatial locations (`flux_surface`, `boundary`, ...).
    Positions,
    /// Physical processes (`ohmic_heating`, `radiation`, ...).
    Processes,
}

impl VocabKind {
    /// All vocabulary kinds, in grammar order.
    pub const ALL: [VocabKind; 6] = [
        VocabKind::Components,
        VocabKind::Subjects,
        VocabKind::Bases,
        VocabKind::Objects,
        VocabKind::Positions,
        VocabKind::Processes,
    ];

    /// Lowercase name of the vocabulary.
    pub fn as_str(&self) -> &'static str {
        match self {
            VocabKind::Components => "components",
            VocabKind::Subjects => "subjects",
            VocabKind::Bases => "bases",
            VocabKind::Objects => "objects",
            VocabKind::Positions => "positions",
            VocabKind::Processes => "processes",
        }
    }

    /// YAML file name backing this vocabulary.
    pub fn file_name(&self) -> String {
        format!("{}.yml", self.as_str())
    }
}

impl fmt::Display for VocabKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VocabKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "components" => Ok(VocabKind::Components),
            "subjects" => Ok(VocabKind::Subjects),
            "bases" => Ok(VocabKind::Bases),
            "objects" => Ok(VocabKind::Objects),
            "positions" => Ok(VocabKind::Positions),
            "processes" => Ok(VocabKind::Processes),
            other => Err(Error::UnknownVocabulary(other.to_string())),
        }
    }
}

/// An ordered set of tokens for one grammar segment.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    /// Which grammar segment this vocabulary supplies.
    pub kind: VocabKind,
    tokens: IndexSet<String>,
}

impl Vocabulary {
    /// Build a vocabulary from an ordered token list.
    pub fn new(kind: VocabKind, tokens: impl IntoIterator<Item = String>) -> Self {
        Self {
            kind,
            tokens: tokens.into_iter().collect(),
        }
    }

    /// Whether the vocabulary contains a token.
    pub fn contains(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    /// Tokens in file order.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }

    /// Number of tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the vocabulary is empty.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Immutable snapshot of every vocabulary, loaded once at process start.
///
/// Edits made through the [`super::VocabularyEditor`] are not reflected in a
/// live snapshot; the hosting process must restart to observe them.
#[derive(Debug, Clone)]
pub struct VocabularySet {
    root: PathBuf,
    vocabs: IndexMap<VocabKind, Vocabulary>,
}

impl VocabularySet {
    /// Load all vocabulary files from a directory.
    ///
    /// Missing files load as empty vocabularies so a fresh catalog can start
    /// without seed data.
    pub fn load(root: impl AsRef<Path>) -> Result<Self, Error> {
        let root = root.as_ref().to_path_buf();
        let mut vocabs = IndexMap::new();
        for kind in VocabKind::ALL {
            let path = root.join(kind.file_name());
            let tokens: Vec<String> = if path.exists() {
                let text = std::fs::read_to_string(&path)?;
                // A comments-only file parses as null, not an empty list.
                serde_yaml::from_str::<Option<Vec<String>>>(&text)?.unwrap_or_default()
            } else {
                Vec::new()
            };
            vocabs.insert(kind, Vocabulary::new(kind, tokens));
        }
        Ok(Self { root, vocabs })
    }

    /// Build an in-memory snapshot, mainly for tests.
    pub fn in_memory(entries: impl IntoIterator<Item = (VocabKind, Vec<String>)>) -> Self {
        let mut vocabs: IndexMap<VocabKind, Vocabulary> = VocabKind::ALL
            .into_iter()
            .map(|kind| (kind, Vocabulary::new(kind, Vec::new())))
            .collect();
        for (kind, tokens) in entries {
            vocabs.insert(kind, Vocabulary::new(kind, tokens));
        }
        Self {
            root: PathBuf::new(),
            vocabs,
        }
    }

    /// Directory the snapshot was loaded from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get one vocabulary.
    pub fn get(&self, kind: VocabKind) -> &Vocabulary {
        &self.vocabs[&kind]
    }

    /// Whether a token is present in the given vocabulary.
    pub fn contains(&self, kind: VocabKind, token: &str) -> bool {
        self.get(kind).contains(token)
    }

    /// Iterate over all vocabularies in grammar order.
    pub fn iter(&self) -> impl Iterator<Item = &Vocabulary> {
        self.vocabs.values()
    }
}
