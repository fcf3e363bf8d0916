//! Component kinds
//!
//! Closed set of renderable components. A renderer dispatches on
//! [`ComponentKind`] with an exhaustive `match`; there is no string-keyed
//! component registry.

use serde::Serialize;
use smt_model::InputKind;
use std::fmt::{self, Display, Formatter};

/// A component capable of rendering one kind of field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    /// Synthetic root wrapping the whole form
    Form,
    /// Dynamically sized list; its child is the stamp cloned per index
    ArrayContainer,
    TextField,
    TextArea,
    IntegerField,
    DecimalField,
    Checkbox,
    DatePicker,
    DateTimePicker,
    TimePicker,
    UrlField,
    /// Enumerated choices
    Select,
    BinaryField,
    MultiLanguageField,
    RangeField,
    FileField,
    BlobField,
    ReferenceField,
    CollectionGroup,
    EntityGroup,
    ReadOnlyField,
}

impl ComponentKind {
    /// Fixed input-kind → component table
    ///
    /// `Select` and `TextArea` are refinements chosen from constraints by
    /// the generator; they never come out of this table.
    #[must_use]
    pub fn for_input(input: InputKind) -> Self {
        match input {
            InputKind::Text => Self::TextField,
            InputKind::Integer => Self::IntegerField,
            InputKind::Decimal => Self::DecimalField,
            InputKind::Boolean => Self::Checkbox,
            InputKind::Date => Self::DatePicker,
            InputKind::DateTime => Self::DateTimePicker,
            InputKind::Time => Self::TimePicker,
            InputKind::Uri => Self::UrlField,
            InputKind::Binary => Self::BinaryField,
            InputKind::MultiLanguage => Self::MultiLanguageField,
            InputKind::Range => Self::RangeField,
            InputKind::File => Self::FileField,
            InputKind::Blob => Self::BlobField,
            InputKind::Reference => Self::ReferenceField,
            InputKind::Group => Self::CollectionGroup,
            InputKind::List => Self::ArrayContainer,
            InputKind::Entity => Self::EntityGroup,
            InputKind::ReadOnly => Self::ReadOnlyField,
        }
    }

    /// Holds nested nodes
    #[inline]
    #[must_use]
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            Self::Form | Self::ArrayContainer | Self::CollectionGroup | Self::EntityGroup
        )
    }

    /// Edits a single value
    #[inline]
    #[must_use]
    pub fn is_input(&self) -> bool {
        !self.is_container() && *self != Self::ReadOnlyField
    }

    /// Snake-case name as serialized
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Form => "form",
            Self::ArrayContainer => "array_container",
            Self::TextField => "text_field",
            Self::TextArea => "text_area",
            Self::IntegerField => "integer_field",
            Self::DecimalField => "decimal_field",
            Self::Checkbox => "checkbox",
            Self::DatePicker => "date_picker",
            Self::DateTimePicker => "date_time_picker",
            Self::TimePicker => "time_picker",
            Self::UrlField => "url_field",
            Self::Select => "select",
            Self::BinaryField => "binary_field",
            Self::MultiLanguageField => "multi_language_field",
            Self::RangeField => "range_field",
            Self::FileField => "file_field",
            Self::BlobField => "blob_field",
            Self::ReferenceField => "reference_field",
            Self::CollectionGroup => "collection_group",
            Self::EntityGroup => "entity_group",
            Self::ReadOnlyField => "read_only_field",
        }
    }
}

impl Display for ComponentKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
