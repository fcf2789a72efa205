//! JSON Schema validation for catalog documents.
//!
//! Catalog documents posted to the API or read by the CLI are checked
//! against an embedded JSON Schema (Draft 7) before deserialization, so that
//! malformed input is reported field by field instead of as the first serde
//! error.
//!
//! # Embedded Schemas
//!
//! Schemas are embedded at compile time from `schemas/` directory:
//! - `catalog.schema.json`
//!
//! # Example
//!
//! ```rust,ignore
//! use serde_json::json;
//! use cwrgen::validation::validate_catalog;
//!
//! let catalog = json!({
//!     "settings": { "name": "Nightfall Music" },
//!     "works": [{ "id": "w-1", "title": "Midnight City" }]
//! });
//! assert!(validate_catalog(&catalog).is_ok());
//! ```

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::error::{CatalogError, CatalogResult};
use crate::models::Catalog;

static CATALOG_SCHEMA: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../schemas/catalog.schema.json")).expect("Invalid embedded schema")
});

/// Validate a JSON value against a schema.
///
/// # Returns
/// * `Ok(())` if valid
/// * `Err(Vec<String>)` with one message per violation
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator = jsonschema::draft7::new(schema).map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator
        .iter_errors(data)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Quick check, true/false only.
pub fn is_valid(schema: &Value, data: &Value) -> bool {
    jsonschema::draft7::is_valid(schema, data)
}

/// Validate against the catalog schema.
pub fn validate_catalog(data: &Value) -> Result<(), Vec<String>> {
    validate(&CATALOG_SCHEMA, data)
}

/// Quick check against the catalog schema.
pub fn is_valid_catalog(data: &Value) -> bool {
    is_valid(&CATALOG_SCHEMA, data)
}

/// Schema-check a catalog document, deserialize it, and resolve its share
/// references. Dangling references are left unresolved unless `strict`.
pub fn load_catalog(data: Value, strict: bool) -> CatalogResult<Catalog> {
    validate_catalog(&data).map_err(|errors| CatalogError::SchemaError { errors })?;
    let mut catalog: Catalog = serde_json::from_value(data)?;
    if strict {
        catalog.resolve_strict()?;
    } else {
        catalog.resolve();
    }
    Ok(catalog)
}

/// Read, check and resolve a catalog file.
pub fn load_catalog_file(path: &std::path::Path, strict: bool) -> CatalogResult<Catalog> {
    let content = std::fs::read_to_string(path)?;
    let data: Value = serde_json::from_str(&content)?;
    load_catalog(data, strict)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalog() -> Value {
        json!({
            "settings": { "name": "Nightfall Music", "ipiNameNumber": "00123456789", "deliveryCode": "NFM" },
            "writers": [
                { "id": "w1", "firstName": "Ada", "lastName": "Stone", "controlled": true, "ipiNameNumber": "00012345678" }
            ],
            "publishers": [{ "id": "p1", "name": "Nightfall Music" }],
            "works": [{
                "id": "work-1",
                "workId": "RWOR10001",
                "title": "Midnight City",
                "iswc": "T-123.456.789-0",
                "writerShares": [{ "writerId": "w1", "capacity": "CA", "prOwnership": 50, "mrOwnership": 0, "srOwnership": 0 }],
                "publisherShares": [{
                    "publisherId": "p1",
                    "role": "E",
                    "prOwnership": 50, "prCollection": 100,
                    "territories": [{ "code": "2136" }]
                }],
                "alternateTitles": [{ "title": "Minuit", "type": "AT", "language": "FR" }],
                "recordings": [{ "title": "Midnight City", "isrc": "US-AB1-24-00001", "durationSeconds": 215, "releaseDate": "2024-02-01" }]
            }]
        })
    }

    #[test]
    fn test_valid_catalog() {
        assert!(validate_catalog(&catalog()).is_ok());
        assert!(is_valid_catalog(&catalog()));
    }

    #[test]
    fn test_invalid_catalog_reports_every_violation() {
        let mut doc = catalog();
        doc["works"][0]["writerShares"][0]["prOwnership"] = json!(150);
        doc["works"][0]["publisherShares"][0]["role"] = json!("XX");
        doc["works"][0]["iswc"] = json!("BAD");

        let errors = validate_catalog(&doc).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.contains("\"BAD\"")));
    }

    #[test]
    fn test_works_required() {
        assert!(!is_valid_catalog(&json!({ "settings": { "name": "X" } })));
    }

    #[test]
    fn test_load_catalog_resolves_shares() {
        let catalog = load_catalog(catalog(), true).unwrap();
        let share = &catalog.works[0].writer_shares[0];
        assert_eq!(share.writer.as_ref().map(|w| w.last_name.as_str()), Some("Stone"));
        assert!(share.is_controlled());
        assert!(catalog.works[0].publisher_shares[0].publisher.is_some());
    }

    #[test]
    fn test_load_catalog_strict_rejects_dangling_reference() {
        let mut doc = catalog();
        doc["works"][0]["writerShares"][0]["writerId"] = json!("ghost");

        assert!(matches!(
            load_catalog(doc.clone(), true),
            Err(CatalogError::UnresolvedReference { kind: "writer", .. })
        ));
        let lenient = load_catalog(doc, false).unwrap();
        assert!(lenient.works[0].writer_shares[0].writer.is_none());
    }

    #[test]
    fn test_load_catalog_schema_error() {
        let err = load_catalog(json!({ "works": [{ "id": "" }] }), false).unwrap_err();
        assert!(matches!(err, CatalogError::SchemaError { .. }));
    }

    #[test]
    fn test_load_catalog_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, catalog().to_string()).unwrap();

        let catalog = load_catalog_file(&path, false).unwrap();
        assert_eq!(catalog.works.len(), 1);
        assert!(matches!(
            load_catalog_file(&dir.path().join("missing.json"), false),
            Err(CatalogError::IoError(_))
        ));
    }
}
