//! Structural schema conformance
//!
//! The schema is embedded at build time and compiled once per process.

use crate::document::Submodel;
use crate::error::{DocumentError, DocumentResult};
use jsonschema::{Draft, JSONSchema};
use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::Value;

/// Embedded JSON Schema (draft 7) for submodel instances
pub const SCHEMA_SOURCE: &str = include_str!("../schema/submodel.schema.json");

static SCHEMA: Lazy<Result<JSONSchema, String>> = Lazy::new(|| {
    let schema: Value = serde_json::from_str(SCHEMA_SOURCE).map_err(|e| e.to_string())?;
    JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(&schema)
        .map_err(|e| e.to_string())
});

/// One schema violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaViolation {
    /// JSON pointer into the document (`/submodelElements/0/value`)
    pub path: String,
    pub message: String,
}

/// Check a typed document against the schema
///
/// # Errors
/// Returns error if the document cannot be serialized or the schema does
/// not compile; violations themselves are returned, not raised
pub fn check_conformance(submodel: &Submodel) -> DocumentResult<Vec<SchemaViolation>> {
    let instance = serde_json::to_value(submodel)?;
    check_value(&instance)
}

/// Check raw JSON against the schema
///
/// # Errors
/// Returns error if the schema does not compile
pub fn check_value(instance: &Value) -> DocumentResult<Vec<SchemaViolation>> {
    let schema = SCHEMA
        .as_ref()
        .map_err(|e| DocumentError::Schema(e.clone()))?;

    let violations = match schema.validate(instance) {
        Ok(()) => Vec::new(),
        Err(errors) => errors
            .map(|error| SchemaViolation {
                path: error.instance_path.to_string(),
                message: error.to_string(),
            })
            .collect(),
    };

    if !violations.is_empty() {
        tracing::debug!("Document violates schema in {} places", violations.len());
    }
    Ok(violations)
}
