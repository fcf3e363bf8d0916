//! Template parser
//!
//! Depth-first transform of a raw AAS template document into an
//! [`ElementTree`]. The transform never aborts on a malformed node: it
//! substitutes defaults, records a [`ParseIssue`] and carries on, so even a
//! broken template yields a renderable tree.

use crate::element::{
    ElementTree, EntityInfo, ListInfo, ParseIssue, Severity, SubmodelHeader, TemplateElement,
};
use crate::error::{ModelError, ModelResult};
use crate::kind::{Cardinality, ElementKind, InputKind, ValueType};
use crate::path::{is_index_segment, ElementPath};
use crate::qualifier::{types, Constraints, Qualifier, QualifierMap};
use crate::value::{Key, LangString, Reference};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Parser for template documents
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateParser;

impl TemplateParser {
    /// Create new template parser
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Parse template JSON text
    ///
    /// # Errors
    /// Returns error if the text is not JSON or carries no submodel
    pub fn parse_str(&self, content: &str) -> ModelResult<ElementTree> {
        let document: Value = serde_json::from_str(content)?;
        self.parse(&document)
    }

    /// Parse a template document
    ///
    /// Accepts an environment (`submodels`), a bare submodel, or a bare
    /// element list.
    ///
    /// # Errors
    /// Returns [`ModelError::NoSubmodel`] if none of those shapes is found
    pub fn parse(&self, document: &Value) -> ModelResult<ElementTree> {
        let (header, elements) = select_source(document)?;

        let mut ctx = ParseContext::default();
        let roots = ctx.parse_elements(elements, &ElementPath::root());

        for issue in &ctx.issues {
            match issue.severity {
                Severity::Warning => tracing::warn!(path = %issue.path, "{}", issue.message),
                Severity::Info => tracing::debug!(path = %issue.path, "{}", issue.message),
            }
        }

        let tree = ElementTree::new(header, roots, ctx.issues);
        tracing::debug!(
            "Parsed template '{}': {} paths, {} issues",
            tree.header.id_short,
            tree.len(),
            tree.issues().len()
        );
        Ok(tree)
    }
}

/// Parse a template document with the default parser
///
/// # Errors
/// See [`TemplateParser::parse`]
pub fn parse(document: &Value) -> ModelResult<ElementTree> {
    TemplateParser::new().parse(document)
}

fn select_source(document: &Value) -> ModelResult<(SubmodelHeader, &[Value])> {
    if let Some(submodels) = document.get("submodels").and_then(Value::as_array) {
        let submodel = submodels
            .iter()
            .find(|s| s.get("kind").and_then(Value::as_str) == Some("Template"))
            .or_else(|| submodels.first())
            .ok_or_else(|| ModelError::NoSubmodel("environment lists no submodels".to_string()))?;
        return Ok((parse_header(submodel), element_list(submodel, "submodelElements")));
    }

    if let Some(elements) = document.as_array() {
        return Ok((SubmodelHeader::default(), elements.as_slice()));
    }

    let is_submodel = document.get("submodelElements").is_some()
        || document.get("modelType").and_then(Value::as_str) == Some("Submodel");
    if is_submodel {
        return Ok((parse_header(document), element_list(document, "submodelElements")));
    }

    Err(ModelError::NoSubmodel(
        "expected an environment, a submodel or an element list".to_string(),
    ))
}

fn parse_header(submodel: &Value) -> SubmodelHeader {
    SubmodelHeader {
        id: str_field(submodel, "id").unwrap_or_default(),
        id_short: str_field(submodel, "idShort").unwrap_or_else(|| "Submodel".to_string()),
        semantic_id: reference(submodel.get("semanticId")),
        description: lang_strings(submodel.get("description")),
        display_name: lang_strings(submodel.get("displayName")),
        administration: submodel.get("administration").cloned(),
    }
}

#[derive(Debug, Default)]
struct ParseContext {
    issues: Vec<ParseIssue>,
    unnamed: usize,
}

impl ParseContext {
    fn issue(&mut self, path: &ElementPath, severity: Severity, message: impl Into<String>) {
        self.issues.push(ParseIssue {
            path: path.key(),
            severity,
            message: message.into(),
        });
    }

    fn parse_elements(&mut self, raw: &[Value], parent: &ElementPath) -> Vec<TemplateElement> {
        let mut seen = HashSet::new();
        let mut elements = Vec::with_capacity(raw.len());
        for node in raw {
            if let Some(element) = self.parse_element(node, parent, &mut seen) {
                elements.push(element);
            }
        }
        elements
    }

    fn parse_element(
        &mut self,
        node: &Value,
        parent: &ElementPath,
        seen: &mut HashSet<String>,
    ) -> Option<TemplateElement> {
        if !node.is_object() {
            self.issue(parent, Severity::Warning, "skipped non-object element entry");
            return None;
        }

        let kind = self.kind_of(node, parent);

        let id_short = match str_field(node, "idShort") {
            Some(name) if is_index_segment(&name) => {
                let renamed = format!("E{name}");
                self.issue(
                    parent,
                    Severity::Warning,
                    format!("idShort '{name}' is numeric; renamed to '{renamed}'"),
                );
                renamed
            }
            Some(name) => name,
            None => {
                self.unnamed += 1;
                let placeholder = format!("Unnamed{}", self.unnamed);
                self.issue(
                    parent,
                    Severity::Warning,
                    format!("{kind} without idShort; named '{placeholder}'"),
                );
                placeholder
            }
        };

        let id_short = self.dedupe(id_short, parent, seen);
        let path = parent.child(id_short.as_str());
        Some(self.build(node, kind, id_short, path, false, None))
    }

    fn parse_list_item(
        &mut self,
        node: &Value,
        list_path: &ElementPath,
        list_id_short: &str,
        value_type_hint: Option<ValueType>,
    ) -> Option<TemplateElement> {
        if !node.is_object() {
            self.issue(list_path, Severity::Warning, "skipped non-object list item");
            return None;
        }
        let kind = self.kind_of(node, list_path);
        let id_short = str_field(node, "idShort").unwrap_or_else(|| list_id_short.to_string());
        Some(self.build(node, kind, id_short, list_path.clone(), true, value_type_hint))
    }

    fn kind_of(&mut self, node: &Value, parent: &ElementPath) -> ElementKind {
        let tag = match node.get("modelType") {
            Some(Value::String(tag)) => Some(tag.as_str()),
            // V2 serializations wrap the tag: {"modelType": {"name": "Property"}}
            Some(Value::Object(wrapped)) => wrapped.get("name").and_then(Value::as_str),
            _ => None,
        };
        match tag {
            Some(tag) => ElementKind::from_model_type(tag).unwrap_or_else(|| {
                self.issue(parent, Severity::Warning, format!("unknown modelType '{tag}'"));
                ElementKind::Unknown
            }),
            None => {
                self.issue(parent, Severity::Warning, "element without modelType");
                ElementKind::Unknown
            }
        }
    }

    fn dedupe(&mut self, id_short: String, parent: &ElementPath, seen: &mut HashSet<String>) -> String {
        if seen.insert(id_short.clone()) {
            return id_short;
        }
        let mut n = 2;
        let renamed = loop {
            let candidate = format!("{id_short}_{n}");
            if !seen.contains(&candidate) {
                break candidate;
            }
            n += 1;
        };
        self.issue(
            parent,
            Severity::Warning,
            format!("duplicate idShort '{id_short}'; renamed to '{renamed}'"),
        );
        seen.insert(renamed.clone());
        renamed
    }

    #[allow(clippy::too_many_lines)]
    fn build(
        &mut self,
        node: &Value,
        kind: ElementKind,
        id_short: String,
        path: ElementPath,
        is_list_item: bool,
        value_type_hint: Option<ValueType>,
    ) -> TemplateElement {
        let qualifiers = QualifierMap::from_qualifiers(&parse_qualifiers(node));

        let value_type = if matches!(kind, ElementKind::Property | ElementKind::Range) {
            match str_field(node, "valueType") {
                Some(raw) => ValueType::parse(&raw).or_else(|| {
                    self.issue(
                        &path,
                        Severity::Info,
                        format!("unknown value type '{raw}'; treated as text"),
                    );
                    None
                }),
                None => value_type_hint,
            }
        } else {
            None
        };

        let cardinality = if is_list_item {
            Cardinality::ZeroToOne
        } else {
            if let Some(raw) = qualifiers.get_any(types::CARDINALITY_ALIASES) {
                if Cardinality::from_qualifier_value(raw).is_none() {
                    self.issue(
                        &path,
                        Severity::Info,
                        format!("unrecognized cardinality '{raw}'; using ZeroToOne"),
                    );
                }
            }
            qualifiers.cardinality()
        };

        let (mut constraints, problems) = Constraints::from_qualifiers(&qualifiers, value_type);
        for problem in problems {
            self.issue(&path, Severity::Warning, problem);
        }
        if matches!(kind, ElementKind::File | ElementKind::Blob) && constraints.content_type.is_none() {
            constraints.content_type = str_field(node, "contentType");
        }

        let mut examples: Vec<String> = qualifiers
            .all(types::EXAMPLE_VALUE)
            .iter()
            .filter(|v| !v.is_empty())
            .cloned()
            .collect();
        if examples.is_empty() && kind == ElementKind::Property {
            // Template values are samples, not defaults
            examples.extend(str_field(node, "value"));
        }

        let read_only = kind.is_read_only()
            || qualifiers
                .get(types::ACCESS_MODE)
                .is_some_and(|mode| mode.eq_ignore_ascii_case("ReadOnly"));

        let mut list = None;
        let mut entity = None;
        let children = match kind {
            ElementKind::SubmodelElementCollection => {
                self.parse_elements(element_list(node, "value"), &path)
            }
            ElementKind::Entity => {
                entity = Some(EntityInfo {
                    entity_type: str_field(node, "entityType")
                        .unwrap_or_else(|| "SelfManagedEntity".to_string()),
                    global_asset_id: str_field(node, "globalAssetId"),
                });
                self.parse_elements(element_list(node, "statements"), &path)
            }
            ElementKind::SubmodelElementList => {
                let declared_kind =
                    str_field(node, "typeValueListElement").and_then(|t| ElementKind::from_model_type(&t));
                let declared_value_type =
                    str_field(node, "valueTypeListElement").and_then(|t| ValueType::parse(&t));
                let item = self.list_item_template(node, &path, &id_short, declared_kind, declared_value_type);
                list = Some(ListInfo {
                    type_value_list_element: declared_kind
                        .or_else(|| item.as_ref().map(|i| i.kind))
                        .unwrap_or(ElementKind::Unknown),
                    value_type_list_element: declared_value_type
                        .or_else(|| item.as_ref().and_then(|i| i.value_type)),
                    order_relevant: node
                        .get("orderRelevant")
                        .and_then(Value::as_bool)
                        .unwrap_or(true),
                });
                item.into_iter().collect()
            }
            _ => Vec::new(),
        };

        let reference = if kind == ElementKind::ReferenceElement {
            reference(node.get("value"))
        } else {
            None
        };

        TemplateElement {
            id_short,
            path,
            kind,
            value_type,
            input_kind: InputKind::derive(kind, value_type),
            cardinality,
            required: cardinality.is_required(),
            repeatable: cardinality.is_repeatable(),
            constraints,
            semantic_id: reference_field(node, "semanticId"),
            description: lang_strings(node.get("description")),
            display_name: lang_strings(node.get("displayName")),
            category: str_field(node, "category"),
            examples,
            default_value: qualifiers.get(types::DEFAULT_VALUE).map(ToString::to_string),
            read_only,
            form_title: qualifiers.get(types::FORM_TITLE).map(ToString::to_string),
            form_info: qualifiers.get(types::FORM_INFO).map(ToString::to_string),
            list,
            entity,
            reference,
            raw: kind.is_read_only().then(|| node.clone()),
            is_list_item,
            children,
        }
    }

    fn list_item_template(
        &mut self,
        node: &Value,
        path: &ElementPath,
        id_short: &str,
        declared_kind: Option<ElementKind>,
        declared_value_type: Option<ValueType>,
    ) -> Option<TemplateElement> {
        let items = element_list(node, "value");
        match items.split_first() {
            Some((first, rest)) => {
                if !rest.is_empty() {
                    self.issue(
                        path,
                        Severity::Info,
                        format!("list declares {} items; the first is the item template", items.len()),
                    );
                }
                self.parse_list_item(first, path, id_short, declared_value_type)
            }
            None => match declared_kind {
                Some(kind) => {
                    self.issue(
                        path,
                        Severity::Info,
                        "list has no item template; synthesized from typeValueListElement",
                    );
                    let empty = Value::Object(Map::new());
                    Some(self.build(&empty, kind, id_short.to_string(), path.clone(), true, declared_value_type))
                }
                None => {
                    self.issue(path, Severity::Warning, "list has no item template");
                    None
                }
            },
        }
    }
}

fn element_list<'a>(node: &'a Value, key: &str) -> &'a [Value] {
    node.get(key)
        .and_then(Value::as_array)
        .map_or(&[], Vec::as_slice)
}

fn str_field(node: &Value, key: &str) -> Option<String> {
    match node.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn parse_qualifiers(node: &Value) -> Vec<Qualifier> {
    element_list(node, "qualifiers")
        .iter()
        .filter_map(|q| {
            Some(Qualifier {
                qualifier_type: str_field(q, "type")?,
                value: str_field(q, "value"),
                value_type: str_field(q, "valueType"),
            })
        })
        .collect()
}

/// Language strings; non-conforming entries are dropped
fn lang_strings(value: Option<&Value>) -> Vec<LangString> {
    value
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| {
                    Some(LangString::new(
                        entry.get("language")?.as_str()?,
                        entry.get("text")?.as_str()?,
                    ))
                })
                .collect()
        })
        .unwrap_or_default()
}

fn reference_field(node: &Value, key: &str) -> Option<Reference> {
    reference(node.get(key))
}

/// Lenient reference reading: V2 references omit the reference type
fn reference(value: Option<&Value>) -> Option<Reference> {
    let value = value?;
    let keys: Vec<Key> = value
        .get("keys")?
        .as_array()?
        .iter()
        .filter_map(|k| {
            Some(Key {
                key_type: str_field(k, "type").unwrap_or_else(|| "GlobalReference".to_string()),
                value: str_field(k, "value")?,
            })
        })
        .collect();
    if keys.is_empty() {
        return None;
    }
    Some(Reference {
        reference_type: str_field(value, "type").unwrap_or_else(|| "ExternalReference".to_string()),
        keys,
    })
}
