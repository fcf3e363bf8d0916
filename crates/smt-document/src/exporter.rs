//! Document exporter
//!
//! Walks the element tree and reads the flat value map into a nested
//! [`Submodel`]. Arrays (declared lists as well as repeatable leaves and
//! groups) are exported by discovering their live indices, scoping the value
//! map to one index at a time and running the ordinary single-item
//! conversion for each.

use crate::document::{
    BinaryElement, Collection, ElementHeader, Entity, List, MultiLanguageProperty, Passthrough,
    Property, Range, ReferenceElement, Submodel, SubmodelElement,
};
use crate::error::DocumentResult;
use crate::schema::{check_conformance, SchemaViolation};
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use smt_model::path;
use smt_model::{
    ElementKind, ElementTree, FieldValue, FlatValues, LangString, RangeValue, Reference,
    TemplateElement, ValueType, DEFAULT_LANGUAGE,
};
use std::collections::{BTreeMap, BTreeSet};

/// Content type assumed for files and blobs without one
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Export options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportOptions {
    /// Emit optional elements without a value
    pub include_empty_optional: bool,
    /// Mint a fresh `urn:uuid:` id instead of reusing the template id
    pub generate_new_id: bool,
    /// Check the result against the embedded schema
    pub check_schema: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_empty_optional: false,
            generate_new_id: false,
            check_schema: true,
        }
    }
}

impl ExportOptions {
    /// Also export optional fields without a value
    #[must_use]
    pub fn with_include_empty_optional(mut self, include: bool) -> Self {
        self.include_empty_optional = include;
        self
    }

    /// Give the document a fresh `urn:uuid:` id
    #[must_use]
    pub fn with_generate_new_id(mut self, generate: bool) -> Self {
        self.generate_new_id = generate;
        self
    }

    /// Run the structural schema check on the result
    #[must_use]
    pub fn with_check_schema(mut self, check: bool) -> Self {
        self.check_schema = check;
        self
    }
}

/// Non-fatal problem met while exporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportWarning {
    /// Value key of the element
    pub path: String,
    /// Kind of the skipped element
    pub kind: ElementKind,
    /// What went wrong
    pub message: String,
}

/// Exported document with its warnings and schema violations
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportResult {
    /// The exported document
    pub submodel: Submodel,
    /// Elements skipped or degraded
    pub warnings: Vec<ExportWarning>,
    /// Schema findings; empty when unchecked
    pub violations: Vec<SchemaViolation>,
}

impl ExportResult {
    /// No schema violation was found
    #[inline]
    #[must_use]
    pub fn is_conformant(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Document exporter over one element tree
#[derive(Debug, Clone, Copy)]
pub struct Exporter<'a> {
    tree: &'a ElementTree,
    options: ExportOptions,
    order: Option<&'a BTreeMap<String, Vec<usize>>>,
}

impl<'a> Exporter<'a> {
    /// Create exporter with default options
    #[must_use]
    pub fn new(tree: &'a ElementTree) -> Self {
        Self {
            tree,
            options: ExportOptions::default(),
            order: None,
        }
    }

    /// Replace the export options
    #[must_use]
    pub fn with_options(mut self, options: ExportOptions) -> Self {
        self.options = options;
        self
    }

    /// Item order per array instance key, as kept by a form
    ///
    /// Without it items are exported in ascending index order.
    #[must_use]
    pub fn with_index_order(mut self, order: &'a BTreeMap<String, Vec<usize>>) -> Self {
        self.order = Some(order);
        self
    }

    /// Export values into a submodel document
    ///
    /// # Errors
    /// Returns error only if schema checking is enabled and the document
    /// cannot be serialized or the schema fails to compile
    pub fn export(&self, values: &FlatValues) -> DocumentResult<ExportResult> {
        let mut walk = Walk {
            options: self.options,
            order: self.order,
            warnings: Vec::new(),
        };
        let root = Scope::root();
        let elements: Vec<SubmodelElement> = self
            .tree
            .roots()
            .iter()
            .filter_map(|element| walk.element(element, values, &root))
            .collect();

        let header = &self.tree.header;
        let id = if self.options.generate_new_id || header.id.is_empty() {
            format!("urn:uuid:{}", uuid::Uuid::new_v4())
        } else {
            header.id.clone()
        };

        let submodel = Submodel {
            id,
            id_short: header.id_short.clone(),
            kind: Some("Instance".to_string()),
            semantic_id: header.semantic_id.clone(),
            description: header.description.clone(),
            display_name: header.display_name.clone(),
            administration: header.administration.clone(),
            submodel_elements: elements,
        };

        let violations = if self.options.check_schema {
            check_conformance(&submodel)?
        } else {
            Vec::new()
        };

        for warning in &walk.warnings {
            tracing::warn!(path = %warning.path, "{}", warning.message);
        }
        tracing::info!(
            "Exported submodel '{}' ({} top-level elements, {} warnings, {} violations)",
            submodel.id_short,
            submodel.submodel_elements.len(),
            walk.warnings.len(),
            violations.len()
        );

        Ok(ExportResult {
            submodel,
            warnings: walk.warnings,
            violations,
        })
    }
}

/// Export with default item order
///
/// # Errors
/// See [`Exporter::export`]
pub fn export(tree: &ElementTree, values: &FlatValues, options: ExportOptions) -> DocumentResult<ExportResult> {
    Exporter::new(tree).with_options(options).export(values)
}

/// Maps scoped template keys back to instance keys
///
/// Inside item `Contacts.2` the scoped map addresses `Contacts.Name`; the
/// instance key is `Contacts.2.Name`.
#[derive(Debug, Clone)]
struct Scope {
    template: String,
    instance: String,
}

impl Scope {
    fn root() -> Self {
        Self {
            template: String::new(),
            instance: String::new(),
        }
    }

    fn instance_key(&self, key: &str) -> String {
        if self.template.is_empty() || !path::is_under(key, &self.template) {
            return key.to_string();
        }
        format!("{}{}", self.instance, &key[self.template.len()..])
    }

    fn item(&self, key: &str, index: usize) -> Self {
        Self {
            template: key.to_string(),
            instance: path::index_key(&self.instance_key(key), index),
        }
    }
}

struct Walk<'a> {
    options: ExportOptions,
    order: Option<&'a BTreeMap<String, Vec<usize>>>,
    warnings: Vec<ExportWarning>,
}

impl Walk<'_> {
    fn warn(&mut self, element: &TemplateElement, scope: &Scope, message: impl Into<String>) {
        self.warnings.push(ExportWarning {
            path: scope.instance_key(&element.key()),
            kind: element.kind,
            message: message.into(),
        });
    }

    fn keep_empty(&self, element: &TemplateElement, as_item: bool) -> bool {
        self.options.include_empty_optional || (element.required && !as_item)
    }

    fn element(&mut self, element: &TemplateElement, values: &FlatValues, scope: &Scope) -> Option<SubmodelElement> {
        if element.is_array() {
            self.array(element, values, scope)
        } else {
            self.single(element, values, scope, false)
        }
    }

    /// Live indices under `key`, in form order when one is known
    fn indices(&self, key: &str, values: &FlatValues, scope: &Scope) -> Vec<usize> {
        let discovered: BTreeSet<usize> = values
            .keys()
            .filter_map(|k| path::index_after(k, key))
            .collect();

        let Some(order) = self.order.and_then(|o| o.get(&scope.instance_key(key))) else {
            return discovered.into_iter().collect();
        };
        let mut ordered: Vec<usize> = order
            .iter()
            .copied()
            .filter(|i| discovered.contains(i))
            .collect();
        ordered.extend(discovered.iter().filter(|i| !order.contains(i)));
        ordered
    }

    fn array(&mut self, element: &TemplateElement, values: &FlatValues, scope: &Scope) -> Option<SubmodelElement> {
        let key = element.key();
        let item_template = if element.kind == ElementKind::SubmodelElementList {
            match element.item_template() {
                Some(item) => item,
                None => {
                    self.warn(element, scope, "list without item template exported empty");
                    return self.keep_empty(element, false).then(|| list_of(element, Vec::new()));
                }
            }
        } else {
            element
        };

        let mut items = Vec::new();
        for index in self.indices(&key, values, scope) {
            let scoped = scope_values(values, &key, index);
            let item_scope = scope.item(&key, index);
            if let Some(item) = self.single(item_template, &scoped, &item_scope, true) {
                items.push(item);
            }
        }

        if items.is_empty() && !self.keep_empty(element, false) {
            return None;
        }
        Some(list_of(element, items))
    }

    /// Convert one occurrence; `as_item` marks an array item, whose
    /// required-ness belongs to the array
    #[allow(clippy::too_many_lines)]
    fn single(
        &mut self,
        element: &TemplateElement,
        values: &FlatValues,
        scope: &Scope,
        as_item: bool,
    ) -> Option<SubmodelElement> {
        let key = element.key();
        let value = values.get(&key).filter(|v| !v.is_empty());
        let keep_empty = self.keep_empty(element, as_item);
        let header = header_of(element);

        match element.kind {
            ElementKind::Property => {
                if value.is_none() && !keep_empty {
                    return None;
                }
                let value_type = element.value_type.unwrap_or(ValueType::String);
                let text = match value {
                    Some(v) => match format_scalar(value_type, v) {
                        Some(text) => Some(text),
                        None => {
                            self.warn(element, scope, "value of unexpected shape ignored");
                            None
                        }
                    },
                    None => None,
                };
                Some(SubmodelElement::Property(Property {
                    header,
                    value_type,
                    value: text,
                }))
            }
            ElementKind::MultiLanguageProperty => {
                let strings: Vec<LangString> = match value {
                    Some(FieldValue::LangStrings(strings)) => {
                        strings.iter().filter(|s| !s.text.is_empty()).cloned().collect()
                    }
                    Some(FieldValue::Text(text)) => vec![LangString::new(DEFAULT_LANGUAGE, text.clone())],
                    Some(_) => {
                        self.warn(element, scope, "value of unexpected shape ignored");
                        Vec::new()
                    }
                    None => Vec::new(),
                };
                if strings.is_empty() && !keep_empty {
                    return None;
                }
                Some(SubmodelElement::MultiLanguageProperty(MultiLanguageProperty {
                    header,
                    value: strings,
                }))
            }
            ElementKind::Range => {
                let value_type = element.value_type.unwrap_or(ValueType::Double);
                let range = match value {
                    Some(FieldValue::Range(range)) => *range,
                    Some(_) => {
                        self.warn(element, scope, "value of unexpected shape ignored");
                        RangeValue::default()
                    }
                    None => RangeValue::default(),
                };
                if range.min.is_none() && range.max.is_none() && !keep_empty {
                    return None;
                }
                let bound = |b: Option<f64>| b.and_then(|n| format_scalar(value_type, &FieldValue::Number(n)));
                Some(SubmodelElement::Range(Range {
                    header,
                    value_type,
                    min: bound(range.min),
                    max: bound(range.max),
                }))
            }
            ElementKind::File | ElementKind::Blob => {
                let (path, content_type) = match value {
                    Some(FieldValue::File(file)) => (Some(file.path.clone()), file.content_type.clone()),
                    Some(FieldValue::Text(text)) => (Some(text.clone()), None),
                    Some(_) => {
                        self.warn(element, scope, "value of unexpected shape ignored");
                        (None, None)
                    }
                    None => (None, None),
                };
                if path.is_none() && !keep_empty {
                    return None;
                }
                let binary = BinaryElement {
                    header,
                    content_type: Some(
                        content_type
                            .or_else(|| element.constraints.content_type.clone())
                            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
                    ),
                    value: path,
                };
                Some(if element.kind == ElementKind::File {
                    SubmodelElement::File(binary)
                } else {
                    SubmodelElement::Blob(binary)
                })
            }
            ElementKind::ReferenceElement => {
                let reference = match value {
                    Some(FieldValue::Reference(reference)) => Some(reference.clone()),
                    Some(FieldValue::Text(text)) => Some(Reference::external(text.clone())),
                    Some(_) => {
                        self.warn(element, scope, "value of unexpected shape ignored");
                        None
                    }
                    None => None,
                };
                if reference.is_none() && !keep_empty {
                    return None;
                }
                Some(SubmodelElement::ReferenceElement(ReferenceElement {
                    header,
                    value: reference,
                }))
            }
            ElementKind::SubmodelElementCollection => {
                let children = self.children(element, values, scope);
                if children.is_empty() && !keep_empty {
                    return None;
                }
                Some(SubmodelElement::SubmodelElementCollection(Collection {
                    header,
                    value: children,
                }))
            }
            ElementKind::Entity => {
                let statements = self.children(element, values, scope);
                let global_asset_id = match value {
                    Some(FieldValue::Text(id)) => Some(id.clone()),
                    _ => element.entity.as_ref().and_then(|e| e.global_asset_id.clone()),
                };
                if statements.is_empty() && value.is_none() && !keep_empty {
                    return None;
                }
                Some(SubmodelElement::Entity(Entity {
                    header,
                    entity_type: element
                        .entity
                        .as_ref()
                        .map_or_else(|| "SelfManagedEntity".to_string(), |e| e.entity_type.clone()),
                    global_asset_id,
                    statements,
                }))
            }
            // Item template of a list of lists
            ElementKind::SubmodelElementList => self.array(element, values, scope),
            ElementKind::Capability => Some(SubmodelElement::Capability(self.passthrough(element))),
            ElementKind::RelationshipElement => {
                Some(SubmodelElement::RelationshipElement(self.passthrough(element)))
            }
            ElementKind::AnnotatedRelationshipElement => Some(
                SubmodelElement::AnnotatedRelationshipElement(self.passthrough(element)),
            ),
            ElementKind::Operation | ElementKind::BasicEventElement | ElementKind::Unknown => {
                self.warn(element, scope, format!("{} elements are not exported", element.kind));
                None
            }
        }
    }

    fn children(&mut self, element: &TemplateElement, values: &FlatValues, scope: &Scope) -> Vec<SubmodelElement> {
        element
            .children
            .iter()
            .filter_map(|child| self.element(child, values, scope))
            .collect()
    }

    fn passthrough(&self, element: &TemplateElement) -> Passthrough {
        element
            .raw
            .as_ref()
            .map(Passthrough::from_raw)
            .unwrap_or_default()
    }
}

/// Sub-map of one array item with its index segment removed
fn scope_values(values: &FlatValues, key: &str, index: usize) -> FlatValues {
    values
        .iter()
        .filter_map(|(k, v)| path::scope_to_index(k, key, index).map(|scoped| (scoped, v.clone())))
        .collect()
}

fn header_of(element: &TemplateElement) -> ElementHeader {
    ElementHeader {
        id_short: Some(element.id_short.clone()),
        category: element.category.clone(),
        description: element.description.clone(),
        display_name: element.display_name.clone(),
        semantic_id: element.semantic_id.clone(),
        qualifiers: Vec::new(),
    }
}

/// Declared list, or a list synthesized around a repeatable element
fn list_of(element: &TemplateElement, items: Vec<SubmodelElement>) -> SubmodelElement {
    let (type_value, value_type, order_relevant) = match &element.list {
        Some(list) => (
            list.type_value_list_element,
            list.value_type_list_element,
            list.order_relevant,
        ),
        None => (element.kind, element.value_type, true),
    };
    let value_type = value_type.filter(|_| matches!(type_value, ElementKind::Property | ElementKind::Range));
    SubmodelElement::SubmodelElementList(List {
        header: header_of(element),
        order_relevant: Some(order_relevant),
        type_value_list_element: type_value,
        value_type_list_element: value_type,
        value: items,
    })
}

/// Canonical string form of a scalar value
///
/// Booleans become `true`/`false`, integer types a whole number (digit
/// strings are kept exact, other numbers rounded), dates a calendar date;
/// anything else is plain string coercion.
#[must_use]
pub fn format_scalar(value_type: ValueType, value: &FieldValue) -> Option<String> {
    if value_type.is_integer() {
        if let Some(whole) = whole_number(value) {
            return Some(whole);
        }
    }

    match (value_type, value) {
        (_, FieldValue::Bool(b)) => Some(b.to_string()),
        (ValueType::Date, FieldValue::Text(text)) => Some(calendar_date(text)),
        _ => value.as_plain_string(),
    }
}

/// Integer text without passing through a float
fn whole_number(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Integer(i) => Some(i.to_string()),
        FieldValue::Text(text) => {
            let text = text.trim();
            digit_string(text).or_else(|| text.parse::<f64>().ok().and_then(rounded))
        }
        _ => value.as_f64().and_then(rounded),
    }
}

/// `[+-]?[0-9]+` normalized: no plus sign, no leading zeros, no `-0`
fn digit_string(text: &str) -> Option<String> {
    let (negative, digits) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let digits = digits.trim_start_matches('0');
    Some(match (negative, digits.is_empty()) {
        (_, true) => "0".to_string(),
        (true, false) => format!("-{digits}"),
        (false, false) => digits.to_string(),
    })
}

/// Nearest whole number printed in full, never clamped to a machine integer
fn rounded(n: f64) -> Option<String> {
    if !n.is_finite() {
        return None;
    }
    let n = n.round();
    Some(if n.abs() < 1.0 { "0".to_string() } else { format!("{n:.0}") })
}

fn calendar_date(text: &str) -> String {
    let trimmed = text.trim();
    if NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").is_ok() {
        return trimmed.to_string();
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.date_naive().format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_formatting() {
        assert_eq!(format_scalar(ValueType::Boolean, &FieldValue::Bool(true)).as_deref(), Some("true"));
        assert_eq!(format_scalar(ValueType::Int, &FieldValue::Number(2.6)).as_deref(), Some("3"));
        assert_eq!(format_scalar(ValueType::Long, &FieldValue::from("41.2")).as_deref(), Some("41"));
        assert_eq!(format_scalar(ValueType::Int, &FieldValue::Integer(-7)).as_deref(), Some("-7"));
        assert_eq!(format_scalar(ValueType::Int, &FieldValue::from("-0.2")).as_deref(), Some("0"));
        assert_eq!(format_scalar(ValueType::Decimal, &FieldValue::Number(12.5)).as_deref(), Some("12.5"));
        assert_eq!(
            format_scalar(ValueType::Date, &FieldValue::from("2024-03-01T12:00:00Z")).as_deref(),
            Some("2024-03-01")
        );
        assert_eq!(format_scalar(ValueType::String, &FieldValue::from("x")).as_deref(), Some("x"));
        assert_eq!(format_scalar(ValueType::String, &FieldValue::Range(RangeValue::default())), None);
    }

    #[test]
    fn integer_text_is_exported_exactly() {
        assert_eq!(
            format_scalar(ValueType::Long, &FieldValue::from("9007199254740993")).as_deref(),
            Some("9007199254740993")
        );
        assert_eq!(
            format_scalar(ValueType::Integer, &FieldValue::from(" 123456789012345678901 ")).as_deref(),
            Some("123456789012345678901")
        );
        assert_eq!(
            format_scalar(ValueType::UnsignedLong, &FieldValue::from("+0018446744073709551615")).as_deref(),
            Some("18446744073709551615")
        );
        assert_eq!(format_scalar(ValueType::Integer, &FieldValue::from("-000")).as_deref(), Some("0"));
        assert_eq!(
            format_scalar(ValueType::Integer, &FieldValue::Number(1e20)).as_deref(),
            Some("100000000000000000000")
        );
    }

    #[test]
    fn scope_maps_item_keys_back() {
        let scope = Scope::root().item("Contacts", 2);
        assert_eq!(scope.instance_key("Contacts.Name"), "Contacts.2.Name");
        let nested = scope.item("Contacts.Phones", 0);
        assert_eq!(nested.instance_key("Contacts.Phones"), "Contacts.2.Phones.0");
    }

    #[test]
    fn scope_values_strips_one_index() {
        let values: FlatValues = [
            ("Tags.0".to_string(), FieldValue::from("a")),
            ("Tags.1".to_string(), FieldValue::from("b")),
            ("Other".to_string(), FieldValue::from("c")),
        ]
        .into();
        let scoped = scope_values(&values, "Tags", 1);
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped.get("Tags"), Some(&FieldValue::from("b")));
    }
}
