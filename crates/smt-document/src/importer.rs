//! Document importer
//!
//! Inverse of the exporter: flattens a submodel into the path-addressed
//! value map a form is seeded from. List items are addressed by their
//! position, so keys come out exactly as the exporter would read them.

use crate::document::{Submodel, SubmodelElement};
use crate::error::{DocumentError, DocumentResult};
use serde_json::Value;
use smt_model::path;
use smt_model::{FieldValue, FileValue, FlatValues, RangeValue};

/// Flatten a submodel into form values
#[must_use]
pub fn import(submodel: &Submodel) -> FlatValues {
    let mut values = FlatValues::new();
    for element in &submodel.submodel_elements {
        match element.id_short() {
            Some(id_short) => visit(element, id_short, &mut values),
            None => tracing::debug!("Skipping top-level {} without idShort", element.kind()),
        }
    }
    tracing::debug!(
        "Imported {} values from submodel '{}'",
        values.len(),
        submodel.id_short
    );
    values
}

/// Read a submodel or an environment holding one
///
/// # Errors
/// Returns error if no submodel is found or it does not deserialize
pub fn parse_document(document: &Value) -> DocumentResult<Submodel> {
    let submodel = match document.get("submodels") {
        Some(Value::Array(submodels)) => submodels
            .iter()
            .find(|s| s.get("kind").and_then(Value::as_str) != Some("Template"))
            .or_else(|| submodels.first())
            .ok_or_else(|| DocumentError::import("environment lists no submodels"))?,
        Some(_) => return Err(DocumentError::import("submodels is not an array")),
        None => document,
    };
    Ok(serde_json::from_value(submodel.clone())?)
}

/// Flatten raw JSON (submodel or environment) into form values
///
/// # Errors
/// See [`parse_document`]
pub fn import_json(document: &Value) -> DocumentResult<FlatValues> {
    parse_document(document).map(|submodel| import(&submodel))
}

fn visit(element: &SubmodelElement, key: &str, values: &mut FlatValues) {
    match element {
        SubmodelElement::Property(property) => {
            if let Some(raw) = &property.value {
                values.insert(key.to_string(), FieldValue::parse_typed(Some(property.value_type), raw));
            }
        }
        SubmodelElement::MultiLanguageProperty(mlp) => {
            if !mlp.value.is_empty() {
                values.insert(key.to_string(), FieldValue::LangStrings(mlp.value.clone()));
            }
        }
        SubmodelElement::Range(range) => {
            let bound = |raw: &Option<String>| {
                raw.as_deref()
                    .and_then(|s| FieldValue::parse_typed(Some(range.value_type), s).as_f64())
            };
            let value = RangeValue {
                min: bound(&range.min),
                max: bound(&range.max),
            };
            if value.min.is_some() || value.max.is_some() {
                values.insert(key.to_string(), FieldValue::Range(value));
            }
        }
        SubmodelElement::File(file) | SubmodelElement::Blob(file) => {
            if let Some(path) = &file.value {
                values.insert(
                    key.to_string(),
                    FieldValue::File(FileValue {
                        path: path.clone(),
                        content_type: file.content_type.clone(),
                    }),
                );
            }
        }
        SubmodelElement::ReferenceElement(reference) => {
            if let Some(value) = &reference.value {
                values.insert(key.to_string(), FieldValue::Reference(value.clone()));
            }
        }
        SubmodelElement::SubmodelElementCollection(collection) => {
            visit_named(&collection.value, key, values);
        }
        SubmodelElement::Entity(entity) => {
            if let Some(id) = &entity.global_asset_id {
                values.insert(key.to_string(), FieldValue::Text(id.clone()));
            }
            visit_named(&entity.statements, key, values);
        }
        SubmodelElement::SubmodelElementList(list) => {
            for (position, item) in list.value.iter().enumerate() {
                visit(item, &path::index_key(key, position), values);
            }
        }
        SubmodelElement::Capability(_)
        | SubmodelElement::RelationshipElement(_)
        | SubmodelElement::AnnotatedRelationshipElement(_)
        | SubmodelElement::Operation(_)
        | SubmodelElement::BasicEventElement(_) => {}
    }
}

fn visit_named(children: &[SubmodelElement], prefix: &str, values: &mut FlatValues) {
    for child in children {
        if let Some(id_short) = child.id_short() {
            visit(child, &path::join(prefix, id_short), values);
        }
    }
}
