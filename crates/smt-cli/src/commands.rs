//! Subcommand implementations
//!
//! Each command reads its inputs, runs the pipeline and returns a value
//! for `main` to print; nothing here writes to stdout.

use crate::config::CliConfig;
use anyhow::{bail, Context};
use serde::Serialize;
use serde_json::Value;
use smt_backend::{
    upsert, CachedTemplateSource, DocumentStore, HttpDocumentStore, HttpTemplateSource,
    TemplateCache, TemplateSource, UpsertOutcome,
};
use smt_document::{
    check_conformance, check_value, import_json, parse_document, ExportResult, SchemaViolation,
};
use smt_form::{FieldErrors, FormController};
use smt_model::{ElementTree, FlatValues, TemplateParser};
use smt_ui::UiTree;
use std::path::Path;
use std::sync::Arc;

/// Read and parse a JSON file
///
/// # Errors
/// Returns error if the file is unreadable or not JSON
pub fn read_json(path: &Path) -> anyhow::Result<Value> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Parse a template file
///
/// # Errors
/// Returns error if the file is unreadable or holds no template
pub fn load_template(path: &Path) -> anyhow::Result<ElementTree> {
    let raw = read_json(path)?;
    TemplateParser::new()
        .parse(&raw)
        .with_context(|| format!("parsing template {}", path.display()))
}

/// Read a flat value map (`{"Path.0.Field": value, ...}`)
///
/// # Errors
/// Returns error if the file is unreadable or not a value map
pub fn load_values(path: &Path) -> anyhow::Result<FlatValues> {
    let raw = read_json(path)?;
    serde_json::from_value(raw).with_context(|| format!("reading values from {}", path.display()))
}

/// UI tree of a template
///
/// # Errors
/// See [`load_template`]
pub fn render(template: &Path) -> anyhow::Result<UiTree> {
    let tree = load_template(template)?;
    Ok(smt_ui::generate(&tree))
}

/// Whole-form validation result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    /// No field failed
    pub valid: bool,
    /// Messages by value path
    pub errors: FieldErrors,
}

/// Validate values against a template
///
/// # Errors
/// Returns error if either input cannot be loaded
pub fn validate(template: &Path, values: &Path) -> anyhow::Result<ValidationReport> {
    let mut form = FormController::new(Arc::new(load_template(template)?), load_values(values)?);
    let valid = form.validate_all();
    Ok(ValidationReport {
        valid,
        errors: form.errors().clone(),
    })
}

/// Export values into a submodel document
///
/// Refuses invalid values unless `force` is set.
///
/// # Errors
/// Returns error if inputs cannot be loaded, validation fails without
/// `force`, or the export itself fails
pub fn export(template: &Path, values: &Path, config: &CliConfig, force: bool) -> anyhow::Result<ExportResult> {
    let mut form = FormController::new(Arc::new(load_template(template)?), load_values(values)?);
    if !form.validate_all() && !force {
        for (path, message) in form.errors() {
            tracing::error!(path = %path, "{message}");
        }
        bail!("{} fields failed validation", form.errors().len());
    }
    Ok(form.export(config.export_options())?)
}

/// Flatten a document into form values
///
/// # Errors
/// Returns error if the file holds no submodel
pub fn import(document: &Path) -> anyhow::Result<FlatValues> {
    let raw = read_json(document)?;
    import_json(&raw).with_context(|| format!("importing {}", document.display()))
}

/// Schema violations of a document
///
/// Documents that do not even decode are checked as raw JSON.
///
/// # Errors
/// Returns error if the file is unreadable or the schema does not compile
pub fn check(document: &Path) -> anyhow::Result<Vec<SchemaViolation>> {
    let raw = read_json(document)?;
    let violations = match parse_document(&raw) {
        Ok(submodel) => check_conformance(&submodel)?,
        Err(e) => {
            tracing::debug!("Checking undecodable document as raw JSON: {e}");
            check_value(&raw)?
        }
    };
    Ok(violations)
}

/// Fetch a template from the configured repository
///
/// # Errors
/// Returns error on transport failure or a non-success status
pub async fn fetch(id: &str, config: &CliConfig) -> anyhow::Result<Value> {
    let source = CachedTemplateSource::new(
        HttpTemplateSource::new(&config.template_url),
        TemplateCache::new(config.cache_capacity),
    );
    source
        .fetch(id)
        .await
        .with_context(|| format!("fetching template '{id}'"))
}

/// Store a document in the configured repository
///
/// # Errors
/// Returns error if the file holds no submodel or the store fails
pub async fn push(document: &Path, config: &CliConfig) -> anyhow::Result<UpsertOutcome> {
    let submodel = parse_document(&read_json(document)?)?;
    let store = HttpDocumentStore::new(&config.repository_url);
    push_to(&store, &submodel).await
}

/// Upsert into any store
///
/// # Errors
/// Returns any store error
pub async fn push_to(store: &dyn DocumentStore, submodel: &smt_document::Submodel) -> anyhow::Result<UpsertOutcome> {
    upsert(store, submodel)
        .await
        .with_context(|| format!("storing document '{}'", submodel.id))
}
