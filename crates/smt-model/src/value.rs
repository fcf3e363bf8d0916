//! Value shapes carried by forms and documents
//!
//! [`FieldValue`] is the closed set of shapes a form field can hold. Each
//! element kind accepts a subset: scalars take `Text`/`Bool`/`Integer`/`Number`,
//! multilingual properties take `LangStrings`, ranges take `Range`, files and
//! blobs take `File`, reference elements take `Reference`.

use crate::kind::ValueType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Flat path-addressed value map
///
/// Ordered so that every walk over it is deterministic.
pub type FlatValues = BTreeMap<String, FieldValue>;

/// Text in one language
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LangString {
    /// Language tag (`en`, `de`, ...)
    pub language: String,
    /// Text in that language
    pub text: String,
}

impl LangString {
    /// Create a language/text pair
    #[inline]
    #[must_use]
    pub fn new(language: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            text: text.into(),
        }
    }
}

/// Pick the text for `language`, falling back to the first entry
#[must_use]
pub fn lang_text<'a>(strings: &'a [LangString], language: &str) -> Option<&'a str> {
    strings
        .iter()
        .find(|s| s.language.eq_ignore_ascii_case(language))
        .or_else(|| {
            strings.iter().find(|s| {
                s.language
                    .split('-')
                    .next()
                    .is_some_and(|primary| primary.eq_ignore_ascii_case(language))
            })
        })
        .or_else(|| strings.first())
        .map(|s| s.text.as_str())
}

/// One key of a reference
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key {
    /// Key type (`GlobalReference`, `Submodel`, ...)
    #[serde(rename = "type")]
    pub key_type: String,
    /// Key value
    pub value: String,
}

/// Reference to an element or external entity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    /// `ExternalReference` or `ModelReference`
    #[serde(rename = "type")]
    pub reference_type: String,
    /// Ordered keys
    pub keys: Vec<Key>,
}

impl Reference {
    /// External reference with a single global key
    #[must_use]
    pub fn external(value: impl Into<String>) -> Self {
        Self {
            reference_type: "ExternalReference".to_string(),
            keys: vec![Key {
                key_type: "GlobalReference".to_string(),
                value: value.into(),
            }],
        }
    }

    /// Value of the first key
    #[inline]
    #[must_use]
    pub fn first_value(&self) -> Option<&str> {
        self.keys.first().map(|k| k.value.as_str())
    }
}

/// Value of a range element
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RangeValue {
    /// Lower bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Upper bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// Value of a file or blob element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileValue {
    /// Path, URL or base64 content
    pub path: String,
    /// MIME type
    #[serde(
        default,
        rename = "contentType",
        skip_serializing_if = "Option::is_none"
    )]
    pub content_type: Option<String>,
}

/// Form field value
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Explicitly cleared
    #[default]
    Empty,
    Bool(bool),
    Integer(i64),
    Number(f64),
    Text(String),
    LangStrings(Vec<LangString>),
    File(FileValue),
    Reference(Reference),
    Range(RangeValue),
}

impl FieldValue {
    /// Undefined, null or empty string
    ///
    /// Structured shapes count as empty when they carry nothing to export.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.is_empty(),
            Self::LangStrings(list) => list.iter().all(|s| s.text.is_empty()),
            Self::Range(range) => range.min.is_none() && range.max.is_none(),
            Self::File(file) => file.path.is_empty(),
            Self::Reference(reference) => reference.keys.iter().all(|k| k.value.is_empty()),
            Self::Bool(_) | Self::Integer(_) | Self::Number(_) => false,
        }
    }

    /// Scalar rendered as plain text
    #[must_use]
    pub fn as_plain_string(&self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s.clone()),
            Self::Bool(b) => Some(b.to_string()),
            Self::Integer(i) => Some(i.to_string()),
            Self::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Scalar interpreted as a number
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            #[allow(clippy::cast_precision_loss)]
            Self::Integer(i) => Some(*i as f64),
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Parse a document/template string according to its primitive type
    ///
    /// Numeric types become numbers and `xs:boolean` accepts the literals
    /// `true`/`false`; everything else, and anything that fails to parse,
    /// stays text.
    #[must_use]
    pub fn parse_typed(value_type: Option<ValueType>, raw: &str) -> Self {
        match value_type {
            Some(vt) if vt.is_integer() => {
                let trimmed = raw.trim();
                match trimmed.parse::<i64>() {
                    Ok(i) => Self::Integer(i),
                    // wider than i64: keep the digits exact
                    Err(_) if is_digit_string(trimmed) => Self::Text(trimmed.to_string()),
                    Err(_) => trimmed
                        .parse::<f64>()
                        .map(Self::Number)
                        .unwrap_or_else(|_| Self::Text(raw.to_string())),
                }
            }
            Some(vt) if vt.is_decimal() => raw
                .trim()
                .parse::<f64>()
                .map(Self::Number)
                .unwrap_or_else(|_| Self::Text(raw.to_string())),
            Some(ValueType::Boolean) => match raw.trim() {
                "true" => Self::Bool(true),
                "false" => Self::Bool(false),
                _ => Self::Text(raw.to_string()),
            },
            _ => Self::Text(raw.to_string()),
        }
    }
}

fn is_digit_string(text: &str) -> bool {
    let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<RangeValue> for FieldValue {
    fn from(value: RangeValue) -> Self {
        Self::Range(value)
    }
}

impl From<Vec<LangString>> for FieldValue {
    fn from(value: Vec<LangString>) -> Self {
        Self::LangStrings(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_detection() {
        assert!(FieldValue::Empty.is_empty());
        assert!(FieldValue::from("").is_empty());
        assert!(!FieldValue::from("x").is_empty());
        assert!(!FieldValue::Bool(false).is_empty());
        assert!(FieldValue::Range(RangeValue::default()).is_empty());
        assert!(FieldValue::LangStrings(vec![]).is_empty());
    }

    #[test]
    fn untagged_deserialization_picks_shape() {
        let values: Vec<FieldValue> = serde_json::from_value(json!([
            null,
            true,
            3,
            2.5,
            "text",
            [{"language": "en", "text": "hi"}],
            {"path": "/a.pdf", "contentType": "application/pdf"},
            {"type": "ExternalReference", "keys": [{"type": "GlobalReference", "value": "urn:x"}]},
            {"min": 1.0, "max": 2.0}
        ]))
        .unwrap();

        assert_eq!(values[0], FieldValue::Empty);
        assert_eq!(values[1], FieldValue::Bool(true));
        assert_eq!(values[2], FieldValue::Integer(3));
        assert_eq!(values[3], FieldValue::Number(2.5));
        assert_eq!(values[4], FieldValue::from("text"));
        assert!(matches!(values[5], FieldValue::LangStrings(_)));
        assert!(matches!(values[6], FieldValue::File(_)));
        assert_eq!(values[7], FieldValue::Reference(Reference::external("urn:x")));
        assert_eq!(
            values[8],
            FieldValue::Range(RangeValue {
                min: Some(1.0),
                max: Some(2.0)
            })
        );
    }

    #[test]
    fn parse_typed_coerces_by_type() {
        assert_eq!(
            FieldValue::parse_typed(Some(ValueType::Decimal), "12.5"),
            FieldValue::Number(12.5)
        );
        assert_eq!(
            FieldValue::parse_typed(Some(ValueType::Int), "7"),
            FieldValue::Integer(7)
        );
        assert_eq!(
            FieldValue::parse_typed(Some(ValueType::Boolean), "false"),
            FieldValue::Bool(false)
        );
        assert_eq!(
            FieldValue::parse_typed(Some(ValueType::Boolean), "yes"),
            FieldValue::from("yes")
        );
        assert_eq!(
            FieldValue::parse_typed(Some(ValueType::Int), "n/a"),
            FieldValue::from("n/a")
        );
        assert_eq!(
            FieldValue::parse_typed(None, "12"),
            FieldValue::from("12")
        );
    }

    #[test]
    fn parse_typed_keeps_wide_integers_exact() {
        assert_eq!(
            FieldValue::parse_typed(Some(ValueType::Integer), " 123456789012345678901 "),
            FieldValue::from("123456789012345678901")
        );
        assert_eq!(
            FieldValue::parse_typed(Some(ValueType::Long), "9007199254740993"),
            FieldValue::Integer(9_007_199_254_740_993)
        );
        assert_eq!(
            FieldValue::parse_typed(Some(ValueType::Int), "2.0"),
            FieldValue::Number(2.0)
        );
    }

    #[test]
    fn lang_text_prefers_requested_language() {
        let strings = vec![LangString::new("de", "Hallo"), LangString::new("en-US", "Hello")];
        assert_eq!(lang_text(&strings, "en"), Some("Hello"));
        assert_eq!(lang_text(&strings, "fr"), Some("Hallo"));
        assert_eq!(lang_text(&[], "en"), None);
    }
}
