//! Parsed template elements and the element tree

use crate::kind::{Cardinality, ElementKind, InputKind, ValueType};
use crate::path::{self, ElementPath};
use crate::qualifier::Constraints;
use crate::value::{lang_text, FieldValue, FlatValues, LangString, Reference};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Language used for labels when several are declared
pub const DEFAULT_LANGUAGE: &str = "en";

/// List-specific metadata of a `SubmodelElementList`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListInfo {
    /// Kind of every item
    pub type_value_list_element: ElementKind,
    /// Primitive type of every item (scalar items only)
    pub value_type_list_element: Option<ValueType>,
    /// Whether item order carries meaning
    pub order_relevant: bool,
}

/// Entity-specific metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityInfo {
    /// `SelfManagedEntity` or `CoManagedEntity`
    pub entity_type: String,
    /// Global asset id declared in the template
    pub global_asset_id: Option<String>,
}

/// One field or group defined by the template
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateElement {
    pub id_short: String,
    pub path: ElementPath,
    pub kind: ElementKind,
    pub value_type: Option<ValueType>,
    pub input_kind: InputKind,
    pub cardinality: Cardinality,
    pub required: bool,
    pub repeatable: bool,
    pub constraints: Constraints,
    pub semantic_id: Option<Reference>,
    pub description: Vec<LangString>,
    pub display_name: Vec<LangString>,
    pub category: Option<String>,
    pub examples: Vec<String>,
    pub default_value: Option<String>,
    pub read_only: bool,
    pub form_title: Option<String>,
    pub form_info: Option<String>,
    pub list: Option<ListInfo>,
    pub entity: Option<EntityInfo>,
    /// Template value of reference elements
    pub reference: Option<Reference>,
    /// Source node of read-only kinds, copied through on export
    pub raw: Option<serde_json::Value>,
    /// Item template of a list: shares the list's path
    pub is_list_item: bool,
    pub children: Vec<TemplateElement>,
}

impl TemplateElement {
    /// Value key of this element (no index segments)
    #[inline]
    #[must_use]
    pub fn key(&self) -> String {
        self.path.key()
    }

    /// Owns child elements
    #[inline]
    #[must_use]
    pub fn is_grouping(&self) -> bool {
        self.kind.is_grouping()
    }

    /// Values live in index-addressed items (`path.N`)
    ///
    /// True for repeatable elements and for declared lists.
    #[inline]
    #[must_use]
    pub fn is_array(&self) -> bool {
        self.repeatable || self.kind == ElementKind::SubmodelElementList
    }

    /// Minimum live items at mount
    #[inline]
    #[must_use]
    pub fn min_items(&self) -> usize {
        usize::from(self.is_array() && self.required)
    }

    /// Item template of a list
    #[must_use]
    pub fn item_template(&self) -> Option<&TemplateElement> {
        if self.kind == ElementKind::SubmodelElementList {
            self.children.first()
        } else {
            None
        }
    }

    /// Form label: form title, display name, then idShort
    #[must_use]
    pub fn label(&self) -> &str {
        self.form_title
            .as_deref()
            .or_else(|| lang_text(&self.display_name, DEFAULT_LANGUAGE))
            .unwrap_or(&self.id_short)
    }

    /// Help text: form info, then description
    #[must_use]
    pub fn help_text(&self) -> Option<&str> {
        self.form_info
            .as_deref()
            .or_else(|| lang_text(&self.description, DEFAULT_LANGUAGE))
    }

    /// Depth-first iterator over this element and its descendants
    pub fn walk(&self) -> impl Iterator<Item = &TemplateElement> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            stack.extend(next.children.iter().rev());
            Some(next)
        })
    }
}

/// Severity of a parse issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
}

/// Structural problem found while parsing; never fatal
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseIssue {
    pub path: String,
    pub severity: Severity,
    pub message: String,
}

/// Submodel-level metadata copied from the template
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SubmodelHeader {
    pub id: String,
    pub id_short: String,
    pub semantic_id: Option<Reference>,
    pub description: Vec<LangString>,
    pub display_name: Vec<LangString>,
    pub administration: Option<serde_json::Value>,
}

/// Parsed template: immutable once built
#[derive(Debug, Clone, Serialize)]
pub struct ElementTree {
    pub header: SubmodelHeader,
    roots: Vec<TemplateElement>,
    #[serde(skip)]
    lookup: HashMap<String, Vec<usize>>,
    issues: Vec<ParseIssue>,
}

impl ElementTree {
    /// Build tree and its path lookup
    #[must_use]
    pub fn new(header: SubmodelHeader, roots: Vec<TemplateElement>, issues: Vec<ParseIssue>) -> Self {
        let mut lookup = HashMap::new();
        for (i, root) in roots.iter().enumerate() {
            index_element(root, vec![i], &mut lookup);
        }
        Self {
            header,
            roots,
            lookup,
            issues,
        }
    }

    /// Top-level elements
    #[inline]
    #[must_use]
    pub fn roots(&self) -> &[TemplateElement] {
        &self.roots
    }

    /// Issues recorded during parsing
    #[inline]
    #[must_use]
    pub fn issues(&self) -> &[ParseIssue] {
        &self.issues
    }

    /// Number of addressable paths
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    /// No elements
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Element at a template path key (no index segments)
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&TemplateElement> {
        let positions = self.lookup.get(key)?;
        let (first, rest) = positions.split_first()?;
        let mut element = self.roots.get(*first)?;
        for p in rest {
            element = element.children.get(*p)?;
        }
        Some(element)
    }

    /// Element governing a value key
    ///
    /// Index segments are stripped so every instance of a repeated field
    /// shares one element. A key ending in an index under a declared list
    /// resolves to the list's item template.
    #[must_use]
    pub fn find(&self, key: &str) -> Option<&TemplateElement> {
        let element = self.get(&path::strip_indices(key))?;
        if path::ends_with_index(key) {
            if let Some(item) = element.item_template() {
                return Some(item);
            }
        }
        Some(element)
    }

    /// Depth-first iterator over every element
    pub fn walk(&self) -> impl Iterator<Item = &TemplateElement> {
        self.roots.iter().flat_map(TemplateElement::walk)
    }

    /// Minimum live items per array path, for arrays outside other arrays
    #[must_use]
    pub fn array_minimums(&self) -> BTreeMap<String, usize> {
        let mut minimums = BTreeMap::new();
        for root in &self.roots {
            collect_minimums(root, "", &root.path, &mut minimums);
        }
        minimums
    }

    /// Minimum live items for arrays nested directly inside one array item
    ///
    /// `instance` is an item key such as `Contacts.0`; returned keys are
    /// instance keys such as `Contacts.0.Phones`.
    #[must_use]
    pub fn nested_minimums(&self, instance: &str) -> BTreeMap<String, usize> {
        let mut minimums = BTreeMap::new();
        let Some(element) = self.find(instance) else {
            return minimums;
        };
        // A list item key resolves to the item template; a repeatable group
        // item resolves to the group itself. Either way its children are the
        // instance's fields.
        let bare_list = element.kind == ElementKind::SubmodelElementList && !element.is_list_item;
        if element.is_grouping() && !bare_list {
            for child in &element.children {
                collect_minimums(child, instance, &element.path, &mut minimums);
            }
        }
        minimums
    }

    /// Default values for fields outside arrays
    #[must_use]
    pub fn initial_values(&self) -> FlatValues {
        let mut values = FlatValues::new();
        for root in &self.roots {
            collect_defaults(root, &mut values);
        }
        values
    }
}

fn index_element(element: &TemplateElement, positions: Vec<usize>, lookup: &mut HashMap<String, Vec<usize>>) {
    lookup.entry(element.key()).or_insert_with(|| positions.clone());
    for (i, child) in element.children.iter().enumerate() {
        let mut child_positions = positions.clone();
        child_positions.push(i);
        index_element(child, child_positions, lookup);
    }
}

/// Record required arrays under `element`, not descending into arrays
///
/// `instance` is the key of the enclosing item (empty at top level) and
/// `base` the template path that item corresponds to.
fn collect_minimums(
    element: &TemplateElement,
    instance: &str,
    base: &ElementPath,
    minimums: &mut BTreeMap<String, usize>,
) {
    if element.is_array() {
        if element.min_items() > 0 {
            minimums.insert(instance_key(element, instance, base), element.min_items());
        }
        return;
    }
    for child in &element.children {
        collect_minimums(child, instance, base, minimums);
    }
}

fn instance_key(element: &TemplateElement, instance: &str, base: &ElementPath) -> String {
    if instance.is_empty() {
        return element.key();
    }
    match element.path.relative_to(base) {
        Ok(relative) => path::join(instance, &relative.key()),
        Err(_) => element.key(),
    }
}

fn collect_defaults(element: &TemplateElement, values: &mut FlatValues) {
    if element.is_array() {
        return;
    }
    if element.children.is_empty() {
        if let Some(default) = &element.default_value {
            values.insert(element.key(), FieldValue::parse_typed(element.value_type, default));
        }
        return;
    }
    for child in &element.children {
        collect_defaults(child, values);
    }
}
