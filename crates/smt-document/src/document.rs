//! Typed AAS V3 submodel document
//!
//! Elements are internally tagged by `modelType`, so serialization yields
//! the standard JSON shape and deserialization rejects unknown kinds.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use smt_model::{ElementKind, LangString, Qualifier, Reference, ValueType};

/// Submodel instance document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "modelType", rename = "Submodel", rename_all = "camelCase")]
pub struct Submodel {
    pub id: String,
    pub id_short: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_id: Option<Reference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<LangString>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub display_name: Vec<LangString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub administration: Option<Value>,
    #[serde(default)]
    pub submodel_elements: Vec<SubmodelElement>,
}

impl Submodel {
    /// Top-level element by idShort
    #[must_use]
    pub fn element(&self, id_short: &str) -> Option<&SubmodelElement> {
        self.submodel_elements
            .iter()
            .find(|e| e.id_short() == Some(id_short))
    }

    /// Element by idShort path; list items are addressed by position
    #[must_use]
    pub fn find(&self, path: &str) -> Option<&SubmodelElement> {
        let mut segments = path.split(smt_model::path::SEPARATOR);
        let mut current = self.element(segments.next()?)?;
        for segment in segments {
            current = match smt_model::path::parse_index(segment) {
                Some(position) => current.children().get(position)?,
                None => current
                    .children()
                    .iter()
                    .find(|e| e.id_short() == Some(segment))?,
            };
        }
        Some(current)
    }
}

/// Attributes shared by every element
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementHeader {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_short: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<LangString>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub display_name: Vec<LangString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_id: Option<Reference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub qualifiers: Vec<Qualifier>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    #[serde(flatten)]
    pub header: ElementHeader,
    pub value_type: ValueType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiLanguageProperty {
    #[serde(flatten)]
    pub header: ElementHeader,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub value: Vec<LangString>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Range {
    #[serde(flatten)]
    pub header: ElementHeader,
    pub value_type: ValueType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<String>,
}

/// File reference or inline blob
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinaryElement {
    #[serde(flatten)]
    pub header: ElementHeader,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceElement {
    #[serde(flatten)]
    pub header: ElementHeader,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Reference>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    #[serde(flatten)]
    pub header: ElementHeader,
    #[serde(default)]
    pub value: Vec<SubmodelElement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct List {
    #[serde(flatten)]
    pub header: ElementHeader,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_relevant: Option<bool>,
    pub type_value_list_element: ElementKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type_list_element: Option<ValueType>,
    #[serde(default)]
    pub value: Vec<SubmodelElement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    #[serde(flatten)]
    pub header: ElementHeader,
    pub entity_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_asset_id: Option<String>,
    #[serde(default)]
    pub statements: Vec<SubmodelElement>,
}

/// Element copied through untouched (relationships, capabilities, ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Passthrough(pub Map<String, Value>);

impl Passthrough {
    /// Copy of a raw node without its `modelType` tag
    #[must_use]
    pub fn from_raw(raw: &Value) -> Self {
        let mut map = raw.as_object().cloned().unwrap_or_default();
        map.remove("modelType");
        Self(map)
    }

    /// `idShort` of the copied node
    #[must_use]
    pub fn id_short(&self) -> Option<&str> {
        self.0.get("idShort").and_then(Value::as_str)
    }
}

/// One submodel element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "modelType")]
pub enum SubmodelElement {
    Property(Property),
    MultiLanguageProperty(MultiLanguageProperty),
    Range(Range),
    File(BinaryElement),
    Blob(BinaryElement),
    ReferenceElement(ReferenceElement),
    SubmodelElementCollection(Collection),
    SubmodelElementList(List),
    Entity(Entity),
    Capability(Passthrough),
    RelationshipElement(Passthrough),
    AnnotatedRelationshipElement(Passthrough),
    Operation(Passthrough),
    BasicEventElement(Passthrough),
}

impl SubmodelElement {
    /// Shared attributes; `None` for copied-through kinds
    #[must_use]
    pub fn header(&self) -> Option<&ElementHeader> {
        match self {
            Self::Property(e) => Some(&e.header),
            Self::MultiLanguageProperty(e) => Some(&e.header),
            Self::Range(e) => Some(&e.header),
            Self::File(e) | Self::Blob(e) => Some(&e.header),
            Self::ReferenceElement(e) => Some(&e.header),
            Self::SubmodelElementCollection(e) => Some(&e.header),
            Self::SubmodelElementList(e) => Some(&e.header),
            Self::Entity(e) => Some(&e.header),
            Self::Capability(_)
            | Self::RelationshipElement(_)
            | Self::AnnotatedRelationshipElement(_)
            | Self::Operation(_)
            | Self::BasicEventElement(_) => None,
        }
    }

    #[must_use]
    pub fn id_short(&self) -> Option<&str> {
        match self {
            Self::Capability(raw)
            | Self::RelationshipElement(raw)
            | Self::AnnotatedRelationshipElement(raw)
            | Self::Operation(raw)
            | Self::BasicEventElement(raw) => raw.id_short(),
            _ => self.header().and_then(|h| h.id_short.as_deref()),
        }
    }

    /// Element kind of this node
    #[must_use]
    pub fn kind(&self) -> ElementKind {
        match self {
            Self::Property(_) => ElementKind::Property,
            Self::MultiLanguageProperty(_) => ElementKind::MultiLanguageProperty,
            Self::Range(_) => ElementKind::Range,
            Self::File(_) => ElementKind::File,
            Self::Blob(_) => ElementKind::Blob,
            Self::ReferenceElement(_) => ElementKind::ReferenceElement,
            Self::SubmodelElementCollection(_) => ElementKind::SubmodelElementCollection,
            Self::SubmodelElementList(_) => ElementKind::SubmodelElementList,
            Self::Entity(_) => ElementKind::Entity,
            Self::Capability(_) => ElementKind::Capability,
            Self::RelationshipElement(_) => ElementKind::RelationshipElement,
            Self::AnnotatedRelationshipElement(_) => ElementKind::AnnotatedRelationshipElement,
            Self::Operation(_) => ElementKind::Operation,
            Self::BasicEventElement(_) => ElementKind::BasicEventElement,
        }
    }

    /// Nested elements of collections, lists and entities
    #[must_use]
    pub fn children(&self) -> &[SubmodelElement] {
        match self {
            Self::SubmodelElementCollection(e) => &e.value,
            Self::SubmodelElementList(e) => &e.value,
            Self::Entity(e) => &e.statements,
            _ => &[],
        }
    }
}
