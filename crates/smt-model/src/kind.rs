//! Element kinds, primitive value types, cardinality and input kinds

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Submodel element kind (`modelType`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    /// Single typed scalar
    Property,
    /// Text in several languages
    MultiLanguageProperty,
    /// Numeric interval
    Range,
    /// File reference (path or URL plus content type)
    File,
    /// Inline binary content
    Blob,
    /// Reference to another element or external entity
    ReferenceElement,
    /// Unordered group of named elements
    SubmodelElementCollection,
    /// Ordered list of elements sharing one item template
    SubmodelElementList,
    /// Sub-entity with statements
    Entity,
    /// Operation (read-only)
    Operation,
    /// Capability (read-only)
    Capability,
    /// Event element (read-only)
    BasicEventElement,
    /// Relationship between two references (read-only)
    RelationshipElement,
    /// Relationship with annotations (read-only)
    AnnotatedRelationshipElement,
    /// Unrecognized `modelType`
    Unknown,
}

impl ElementKind {
    /// Resolve a `modelType` tag
    #[must_use]
    pub fn from_model_type(tag: &str) -> Option<Self> {
        let kind = match tag {
            "Property" => Self::Property,
            "MultiLanguageProperty" => Self::MultiLanguageProperty,
            "Range" => Self::Range,
            "File" => Self::File,
            "Blob" => Self::Blob,
            "ReferenceElement" => Self::ReferenceElement,
            "SubmodelElementCollection" => Self::SubmodelElementCollection,
            "SubmodelElementList" => Self::SubmodelElementList,
            "Entity" => Self::Entity,
            "Operation" => Self::Operation,
            "Capability" => Self::Capability,
            "BasicEventElement" => Self::BasicEventElement,
            "RelationshipElement" => Self::RelationshipElement,
            "AnnotatedRelationshipElement" => Self::AnnotatedRelationshipElement,
            _ => return None,
        };
        Some(kind)
    }

    /// `modelType` tag
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Property => "Property",
            Self::MultiLanguageProperty => "MultiLanguageProperty",
            Self::Range => "Range",
            Self::File => "File",
            Self::Blob => "Blob",
            Self::ReferenceElement => "ReferenceElement",
            Self::SubmodelElementCollection => "SubmodelElementCollection",
            Self::SubmodelElementList => "SubmodelElementList",
            Self::Entity => "Entity",
            Self::Operation => "Operation",
            Self::Capability => "Capability",
            Self::BasicEventElement => "BasicEventElement",
            Self::RelationshipElement => "RelationshipElement",
            Self::AnnotatedRelationshipElement => "AnnotatedRelationshipElement",
            Self::Unknown => "Unknown",
        }
    }

    /// Kinds that own child elements
    #[inline]
    #[must_use]
    pub fn is_grouping(&self) -> bool {
        matches!(
            self,
            Self::SubmodelElementCollection | Self::SubmodelElementList | Self::Entity
        )
    }

    /// Kinds the form shows but never edits
    #[inline]
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            Self::Operation
                | Self::Capability
                | Self::BasicEventElement
                | Self::RelationshipElement
                | Self::AnnotatedRelationshipElement
                | Self::Unknown
        )
    }
}

impl Display for ElementKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Primitive value type (XSD subset used by AAS)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    #[serde(rename = "xs:string")]
    String,
    #[serde(rename = "xs:boolean")]
    Boolean,
    #[serde(rename = "xs:byte")]
    Byte,
    #[serde(rename = "xs:short")]
    Short,
    #[serde(rename = "xs:int")]
    Int,
    #[serde(rename = "xs:long")]
    Long,
    #[serde(rename = "xs:unsignedByte")]
    UnsignedByte,
    #[serde(rename = "xs:unsignedShort")]
    UnsignedShort,
    #[serde(rename = "xs:unsignedInt")]
    UnsignedInt,
    #[serde(rename = "xs:unsignedLong")]
    UnsignedLong,
    #[serde(rename = "xs:integer")]
    Integer,
    #[serde(rename = "xs:positiveInteger")]
    PositiveInteger,
    #[serde(rename = "xs:nonNegativeInteger")]
    NonNegativeInteger,
    #[serde(rename = "xs:negativeInteger")]
    NegativeInteger,
    #[serde(rename = "xs:nonPositiveInteger")]
    NonPositiveInteger,
    #[serde(rename = "xs:decimal")]
    Decimal,
    #[serde(rename = "xs:double")]
    Double,
    #[serde(rename = "xs:float")]
    Float,
    #[serde(rename = "xs:date")]
    Date,
    #[serde(rename = "xs:dateTime")]
    DateTime,
    #[serde(rename = "xs:time")]
    Time,
    #[serde(rename = "xs:anyURI")]
    AnyUri,
    #[serde(rename = "xs:base64Binary")]
    Base64Binary,
    #[serde(rename = "xs:hexBinary")]
    HexBinary,
}

const VALUE_TYPES: &[(ValueType, &str)] = &[
    (ValueType::String, "xs:string"),
    (ValueType::Boolean, "xs:boolean"),
    (ValueType::Byte, "xs:byte"),
    (ValueType::Short, "xs:short"),
    (ValueType::Int, "xs:int"),
    (ValueType::Long, "xs:long"),
    (ValueType::UnsignedByte, "xs:unsignedByte"),
    (ValueType::UnsignedShort, "xs:unsignedShort"),
    (ValueType::UnsignedInt, "xs:unsignedInt"),
    (ValueType::UnsignedLong, "xs:unsignedLong"),
    (ValueType::Integer, "xs:integer"),
    (ValueType::PositiveInteger, "xs:positiveInteger"),
    (ValueType::NonNegativeInteger, "xs:nonNegativeInteger"),
    (ValueType::NegativeInteger, "xs:negativeInteger"),
    (ValueType::NonPositiveInteger, "xs:nonPositiveInteger"),
    (ValueType::Decimal, "xs:decimal"),
    (ValueType::Double, "xs:double"),
    (ValueType::Float, "xs:float"),
    (ValueType::Date, "xs:date"),
    (ValueType::DateTime, "xs:dateTime"),
    (ValueType::Time, "xs:time"),
    (ValueType::AnyUri, "xs:anyURI"),
    (ValueType::Base64Binary, "xs:base64Binary"),
    (ValueType::HexBinary, "xs:hexBinary"),
];

impl ValueType {
    /// Resolve a declared value type, with or without the `xs:` prefix,
    /// ignoring case
    #[must_use]
    pub fn parse(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        let bare = tag
            .strip_prefix("xs:")
            .or_else(|| tag.strip_prefix("xsd:"))
            .unwrap_or(tag);
        VALUE_TYPES
            .iter()
            .find(|(_, name)| name[3..].eq_ignore_ascii_case(bare))
            .map(|(value_type, _)| *value_type)
    }

    /// Canonical `xs:` name
    #[must_use]
    pub fn as_xsd(&self) -> &'static str {
        VALUE_TYPES
            .iter()
            .find(|(value_type, _)| value_type == self)
            .map_or("xs:string", |(_, name)| name)
    }

    /// Integer family
    #[must_use]
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::Byte
                | Self::Short
                | Self::Int
                | Self::Long
                | Self::UnsignedByte
                | Self::UnsignedShort
                | Self::UnsignedInt
                | Self::UnsignedLong
                | Self::Integer
                | Self::PositiveInteger
                | Self::NonNegativeInteger
                | Self::NegativeInteger
                | Self::NonPositiveInteger
        )
    }

    /// Decimal family
    #[inline]
    #[must_use]
    pub fn is_decimal(&self) -> bool {
        matches!(self, Self::Decimal | Self::Double | Self::Float)
    }

    /// Integer or decimal family
    #[inline]
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_decimal()
    }

    /// Bounds implied by the type itself
    #[must_use]
    pub fn implied_bounds(&self) -> (Option<f64>, Option<f64>) {
        match self {
            Self::Byte => (Some(-128.0), Some(127.0)),
            Self::Short => (Some(-32_768.0), Some(32_767.0)),
            Self::Int => (Some(-2_147_483_648.0), Some(2_147_483_647.0)),
            Self::UnsignedByte => (Some(0.0), Some(255.0)),
            Self::UnsignedShort => (Some(0.0), Some(65_535.0)),
            Self::UnsignedInt => (Some(0.0), Some(4_294_967_295.0)),
            Self::UnsignedLong | Self::NonNegativeInteger => (Some(0.0), None),
            Self::PositiveInteger => (Some(1.0), None),
            Self::NegativeInteger => (None, Some(-1.0)),
            Self::NonPositiveInteger => (None, Some(0.0)),
            _ => (None, None),
        }
    }
}

impl Display for ValueType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_xsd())
    }
}

/// Declared occurrence constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cardinality {
    /// Exactly one
    One,
    /// Optional
    #[default]
    ZeroToOne,
    /// At least one, repeatable
    OneToMany,
    /// Any number, repeatable
    ZeroToMany,
}

impl Cardinality {
    /// Resolve a qualifier value; unknown values yield `None`
    #[must_use]
    pub fn from_qualifier_value(value: &str) -> Option<Self> {
        match value.trim() {
            "One" => Some(Self::One),
            "ZeroToOne" => Some(Self::ZeroToOne),
            "OneToMany" => Some(Self::OneToMany),
            "ZeroToMany" => Some(Self::ZeroToMany),
            _ => None,
        }
    }

    /// At least one value must exist
    #[inline]
    #[must_use]
    pub fn is_required(&self) -> bool {
        matches!(self, Self::One | Self::OneToMany)
    }

    /// Element may occur 0..N times
    #[inline]
    #[must_use]
    pub fn is_repeatable(&self) -> bool {
        matches!(self, Self::OneToMany | Self::ZeroToMany)
    }
}

/// Rendering input kind derived from `(kind, value type)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Text,
    Integer,
    Decimal,
    Boolean,
    Date,
    DateTime,
    Time,
    Uri,
    Binary,
    MultiLanguage,
    Range,
    File,
    Blob,
    Reference,
    Group,
    List,
    Entity,
    ReadOnly,
}

impl InputKind {
    /// Fixed lookup table over element kind and primitive type
    ///
    /// Scalars without a known primitive type fall back to plain text.
    #[must_use]
    pub fn derive(kind: ElementKind, value_type: Option<ValueType>) -> Self {
        match kind {
            ElementKind::Property => match value_type {
                Some(ValueType::Boolean) => Self::Boolean,
                Some(vt) if vt.is_integer() => Self::Integer,
                Some(vt) if vt.is_decimal() => Self::Decimal,
                Some(ValueType::Date) => Self::Date,
                Some(ValueType::DateTime) => Self::DateTime,
                Some(ValueType::Time) => Self::Time,
                Some(ValueType::AnyUri) => Self::Uri,
                Some(ValueType::Base64Binary | ValueType::HexBinary) => Self::Binary,
                _ => Self::Text,
            },
            ElementKind::MultiLanguageProperty => Self::MultiLanguage,
            ElementKind::Range => Self::Range,
            ElementKind::File => Self::File,
            ElementKind::Blob => Self::Blob,
            ElementKind::ReferenceElement => Self::Reference,
            ElementKind::SubmodelElementCollection => Self::Group,
            ElementKind::SubmodelElementList => Self::List,
            ElementKind::Entity => Self::Entity,
            ElementKind::Operation
            | ElementKind::Capability
            | ElementKind::BasicEventElement
            | ElementKind::RelationshipElement
            | ElementKind::AnnotatedRelationshipElement
            | ElementKind::Unknown => Self::ReadOnly,
        }
    }
}
