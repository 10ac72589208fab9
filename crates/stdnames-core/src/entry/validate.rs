//! The entry validator: raw field mapping in, validated `Entry` out.

use super::model::{Entry, Status};
use crate::error::Error;
use crate::vocab::validate_token;

/// Validate a raw field mapping into an immutable [`Entry`].
///
/// Structural rules enforced here, before anything is staged:
/// - the name follows the token lexical pattern,
/// - exactly one primary tag (`tags` non-empty, every tag a valid token),
/// - derived kinds carry provenance and non-derived kinds do not,
/// - `superseded` status requires `superseded_by` (and vice versa),
/// - a blank unit is normalized to `"none"`.
///
/// Referential rules (provenance targets existing, links resolving) are
/// checked at `write()` time against the pending view, not here.
pub fn validate(value: serde_json::Value) -> Result<Entry, Error> {
    let mut entry: Entry = serde_json::from_value(value)
        .map_err(|e| Error::validation_msg(format!("malformed entry data: {e}")))?;

    validate_token(&entry.name).map_err(|msg| Error::validation("name", msg))?;

    if entry.tags.is_empty() {
        return Err(Error::validation(
            "tags",
            "exactly one primary tag is required; tags must not be empty",
        ));
    }
    for tag in &entry.tags {
        validate_token(tag).map_err(|msg| Error::validation("tags", msg))?;
    }

    if entry.kind.is_derived() && entry.provenance.is_none() {
        return Err(Error::validation(
            "provenance",
            format!("kind '{}' requires provenance", entry.kind),
        ));
    }
    if !entry.kind.is_derived() && entry.provenance.is_some() {
        return Err(Error::validation(
            "provenance",
            format!("kind '{}' must not carry provenance", entry.kind),
        ));
    }

    if let Some(prov) = &entry.provenance {
        for reference in prov.references() {
            validate_token(reference)
                .map_err(|msg| Error::validation("provenance", msg))?;
        }
    }

    match (entry.status, &entry.superseded_by) {
        (Status::Superseded, None) => {
            return Err(Error::validation(
                "superseded_by",
                "superseded entries must name their replacement",
            ));
        }
        (Status::Superseded, Some(by)) => {
            validate_token(by).map_err(|msg| Error::validation("superseded_by", msg))?;
        }
        (_, Some(_)) => {
            return Err(Error::validation(
                "superseded_by",
                "superseded_by is only valid with status 'superseded'",
            ));
        }
        _ => {}
    }

    if entry.unit.trim().is_empty() {
        entry.unit = "none".to_string();
    }

    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Kind;
    use serde_json::json;

    fn base_data() -> serde_json::Value {
        json!({
            "name": "electron_temperature",
            "kind": "scalar",
            "unit": "eV",
            "status": "active",
            "description": "Electron temperature.",
            "tags": ["kinetic", "core"],
        })
    }

    #[test]
    fn test_valid_entry() {
        let entry = validate(base_data()).unwrap();
        assert_eq!(entry.name, "electron_temperature");
        assert_eq!(entry.kind, Kind::Scalar);
    }

    #[test]
    fn test_missing_primary_tag_fails_immediately() {
        let mut data = base_data();
        data["tags"] = json!([]);
        let err = validate(data).unwrap_err();
        match err {
            Error::Validation { field, .. } => assert_eq!(field.as_deref(), Some("tags")),
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn test_bad_name_rejected() {
        let mut data = base_data();
        data["name"] = json!("Electron_Temperature");
        assert!(validate(data).is_err());
    }

    #[test]
    fn test_derived_requires_provenance() {
        let mut data = base_data();
        data["kind"] = json!("derived-scalar");
        let err = validate(data).unwrap_err();
        match err {
            Error::Validation { field, .. } => assert_eq!(field.as_deref(), Some("provenance")),
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn test_derived_with_provenance_accepted() {
        let mut data = base_data();
        data["kind"] = json!("derived-scalar");
        data["provenance"] = json!({
            "mode": "reduction",
            "reduction": "volume_average",
            "base": "electron_density",
        });
        let entry = validate(data).unwrap();
        assert!(entry.provenance.is_some());
    }

    #[test]
    fn test_plain_kind_rejects_provenance() {
        let mut data = base_data();
        data["provenance"] = json!({
            "mode": "operator",
            "operator": "gradient",
            "base": "electron_density",
        });
        assert!(validate(data).is_err());
    }

    #[test]
    fn test_superseded_requires_replacement() {
        let mut data = base_data();
        data["status"] = json!("superseded");
        assert!(validate(data).is_err());

        let mut data = base_data();
        data["status"] = json!("superseded");
        data["superseded_by"] = json!("electron_temperature_core");
        assert!(validate(data).is_ok());
    }

    #[test]
    fn test_superseded_by_needs_superseded_status() {
        let mut data = base_data();
        data["superseded_by"] = json!("electron_temperature_core");
        assert!(validate(data).is_err());
    }

    #[test]
    fn test_blank_unit_normalized() {
        let mut data = base_data();
        data["unit"] = json!("  ");
        let entry = validate(data).unwrap();
        assert_eq!(entry.unit, "none");
    }

    #[test]
    fn test_unknown_kind_is_malformed() {
        let mut data = base_data();
        data["kind"] = json!("tensor");
        assert!(validate(data).is_err());
    }
}
