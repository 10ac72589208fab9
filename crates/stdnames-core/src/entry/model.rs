//! The `Entry` record and its component types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What sort of quantity an entry names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Kind {
    /// A scalar quantity.
    Scalar,
    /// A vector quantity.
    Vector,
    /// A scalar derived from other entries via provenance.
    DerivedScalar,
    /// A vector derived from other entries via provenance.
    DerivedVector,
    /// Non-physical bookkeeping data.
    Metadata,
}

impl Kind {
    /// Whether this kind must carry provenance.
    pub fn is_derived(&self) -> bool {
        matches!(self, Kind::DerivedScalar | Kind::DerivedVector)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Kind::Scalar => "scalar",
            Kind::Vector => "vector",
            Kind::DerivedScalar => "derived-scalar",
            Kind::DerivedVector => "derived-vector",
            Kind::Metadata => "metadata",
        };
        f.write_str(s)
    }
}

/// Curation lifecycle state of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Proposed, not yet ratified.
    #[default]
    Draft,
    /// Ratified and in use.
    Active,
    /// Discouraged, kept for backwards compatibility.
    Deprecated,
    /// Replaced by another entry, named by `superseded_by`.
    Superseded,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Draft => "draft",
            Status::Active => "active",
            Status::Deprecated => "deprecated",
            Status::Superseded => "superseded",
        };
        f.write_str(s)
    }
}

/// An external URL or an internal `name:`-prefixed reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Link(pub String);

impl Link {
    /// The referenced entry name, if this is an internal link.
    pub fn target_name(&self) -> Option<&str> {
        self.0.strip_prefix("name:")
    }
}

/// How a derived entry was produced from other entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Provenance {
    /// A pointwise operator applied to a base entry.
    Operator {
        /// Operator name (e.g. `gradient`, `divergence`).
        operator: String,
        /// Name of the base entry.
        base: String,
    },
    /// A reduction over a base entry.
    Reduction {
        /// Reduction name (e.g. `volume_average`, `maximum`).
        reduction: String,
        /// Name of the base entry.
        base: String,
    },
    /// A free-form expression over multiple entries.
    Expression {
        /// The expression text.
        expression: String,
        /// Names of every entry the expression references.
        dependencies: Vec<String>,
    },
}

impl Provenance {
    /// Every entry name this provenance references.
    pub fn references(&self) -> Vec<&str> {
        match self {
            Provenance::Operator { base, .. } | Provenance::Reduction { base, .. } => {
                vec![base.as_str()]
            }
            Provenance::Expression { dependencies, .. } => {
                dependencies.iter().map(String::as_str).collect()
            }
        }
    }
}

/// One validated standard-name record.
///
/// Construct via [`super::validate`]; the raw struct derives `Deserialize`
/// only so the validator can decode incoming data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Unique name, the primary key within a catalog.
    pub name: String,
    /// What sort of quantity this names.
    pub kind: Kind,
    /// Physical unit; `"none"` for unitless, `"1"` for dimensionless.
    #[serde(default = "default_unit")]
    pub unit: String,
    /// Curation lifecycle state.
    #[serde(default)]
    pub status: Status,
    /// Prose description.
    #[serde(default)]
    pub description: String,
    /// Ordered tags; the first is the primary tag controlling storage
    /// grouping, the rest are secondary tags.
    pub tags: Vec<String>,
    /// External URLs or internal `name:` references.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
    /// Name of the replacing entry, required when `status` is superseded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superseded_by: Option<String>,
    /// Derivation metadata, required for derived kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<Provenance>,
}

fn default_unit() -> String {
    "none".to_string()
}

impl Entry {
    /// The primary tag, which controls storage grouping. `None` only for an
    /// entry that bypassed [`validate`](crate::entry::validate), which
    /// requires a non-empty tag list.
    pub fn primary_tag(&self) -> Option<&str> {
        self.tags.first().map(String::as_str)
    }

    /// Secondary tags, in order.
    pub fn secondary_tags(&self) -> &[String] {
        self.tags.get(1..).unwrap_or_default()
    }

    /// Every other entry name this entry depends on: provenance references,
    /// internal links, and the superseding entry.
    pub fn dependencies(&self) -> Vec<&str> {
        let mut deps: Vec<&str> = self
            .provenance
            .as_ref()
            .map(|p| p.references())
            .unwrap_or_default();
        deps.extend(self.links.iter().filter_map(Link::target_name));
        if let Some(by) = &self.superseded_by {
            deps.push(by.as_str());
        }
        deps
    }

    /// Serialize to a JSON value, the canonical form used for diffing.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).expect("entry serializes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_entry() -> Entry {
        Entry {
            name: "electron_temperature".to_string(),
            kind: Kind::Scalar,
            unit: "eV".to_string(),
            status: Status::Active,
            description: "Electron temperature.".to_string(),
            tags: vec!["kinetic".to_string(), "core".to_string()],
            links: vec![Link("https://example.org/te".to_string())],
            superseded_by: None,
            provenance: None,
        }
    }

    #[test]
    fn test_primary_and_secondary_tags() {
        let entry = plain_entry();
        assert_eq!(entry.primary_tag(), Some("kinetic"));
        assert_eq!(entry.secondary_tags(), ["core".to_string()]);
    }

    #[test]
    fn test_empty_tags_have_no_primary() {
        let mut entry = plain_entry();
        entry.tags.clear();
        assert_eq!(entry.primary_tag(), None);
        assert!(entry.secondary_tags().is_empty());
    }

    #[test]
    fn test_dependencies_collect_all_references() {
        let mut entry = plain_entry();
        entry.kind = Kind::DerivedScalar;
        entry.provenance = Some(Provenance::Reduction {
            reduction: "volume_average".to_string(),
            base: "electron_density".to_string(),
        });
        entry.links.push(Link("name:plasma_volume".to_string()));
        assert_eq!(
            entry.dependencies(),
            vec!["electron_density", "plasma_volume"]
        );
    }

    #[test]
    fn test_link_target() {
        assert_eq!(
            Link("name:ion_temperature".to_string()).target_name(),
            Some("ion_temperature")
        );
        assert_eq!(Link("https://example.org".to_string()).target_name(), None);
    }

    #[test]
    fn test_serde_round_trip() {
        let entry = plain_entry();
        let yaml = serde_yaml::to_string(&entry).unwrap();
        let back: Entry = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(entry, back);
    }

    #[test]
    fn test_kind_serde_names() {
        assert_eq!(
            serde_json::to_value(Kind::DerivedScalar).unwrap(),
            serde_json::json!("derived-scalar")
        );
    }
}
