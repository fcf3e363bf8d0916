//! Template qualifiers and the constraints derived from them

use crate::kind::{Cardinality, ValueType};
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Qualifier type names understood by the parser
pub mod types {
    pub const CARDINALITY: &str = "SMT/Cardinality";
    pub const CARDINALITY_ALIASES: &[&str] = &["SMT/Cardinality", "Cardinality", "Multiplicity"];
    pub const ALLOWED_RANGE: &str = "SMT/AllowedRange";
    pub const ALLOWED_VALUE: &str = "SMT/AllowedValue";
    pub const MIN_LENGTH: &str = "SMT/MinLength";
    pub const MAX_LENGTH: &str = "SMT/MaxLength";
    pub const FORM_CHOICES: &str = "SMT/FormChoices";
    pub const EXAMPLE_VALUE: &str = "SMT/ExampleValue";
    pub const DEFAULT_VALUE: &str = "SMT/DefaultValue";
    pub const ACCESS_MODE: &str = "SMT/AccessMode";
    pub const FORM_TITLE: &str = "SMT/FormTitle";
    pub const FORM_INFO: &str = "SMT/FormInfo";
    pub const REQUIRED_LANG: &str = "SMT/RequiredLang";
}

/// One declared qualifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Qualifier {
    /// Qualifier type
    #[serde(rename = "type")]
    pub qualifier_type: String,
    /// Declared value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Declared value type
    #[serde(rename = "valueType", default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
}

/// Qualifier values keyed by type, in declaration order
///
/// Several qualifiers of the same type (e.g. `SMT/ExampleValue`) keep every
/// value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QualifierMap(IndexMap<String, Vec<String>>);

impl QualifierMap {
    /// Build from declared qualifiers
    #[must_use]
    pub fn from_qualifiers(qualifiers: &[Qualifier]) -> Self {
        let mut map: IndexMap<String, Vec<String>> = IndexMap::new();
        for q in qualifiers {
            map.entry(q.qualifier_type.trim().to_string())
                .or_default()
                .push(q.value.clone().unwrap_or_default());
        }
        Self(map)
    }

    /// First value declared for a type
    #[must_use]
    pub fn get(&self, qualifier_type: &str) -> Option<&str> {
        self.0
            .get(qualifier_type)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// First value declared under any of the given types
    #[must_use]
    pub fn get_any(&self, qualifier_types: &[&str]) -> Option<&str> {
        qualifier_types.iter().find_map(|t| self.get(t))
    }

    /// Every value declared for a type
    #[must_use]
    pub fn all(&self, qualifier_type: &str) -> &[String] {
        self.0.get(qualifier_type).map_or(&[], Vec::as_slice)
    }

    /// Number of distinct qualifier types
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// No qualifiers declared
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Cardinality qualifier, or `ZeroToOne` when missing or unrecognized
    #[must_use]
    pub fn cardinality(&self) -> Cardinality {
        self.get_any(types::CARDINALITY_ALIASES)
            .and_then(Cardinality::from_qualifier_value)
            .unwrap_or_default()
    }
}

/// Anchored regular expression constraint
#[derive(Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compile a pattern that must match the whole value
    ///
    /// # Errors
    /// Returns the regex error if the pattern is invalid
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{source})$"))?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    /// Pattern as declared
    #[inline]
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whole-value match
    #[inline]
    #[must_use]
    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.source).finish()
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

/// Value constraints of one element
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Constraints {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<Pattern>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub allowed_values: Vec<String>,
    pub content_type: Option<String>,
    pub required_languages: Vec<String>,
}

impl Constraints {
    /// Derive constraints from qualifiers
    ///
    /// Malformed qualifier values are skipped and described in the returned
    /// messages; the remaining constraints still apply.
    #[must_use]
    pub fn from_qualifiers(
        qualifiers: &QualifierMap,
        value_type: Option<ValueType>,
    ) -> (Self, Vec<String>) {
        let mut constraints = Self::default();
        let mut problems = Vec::new();

        if let Some(raw) = qualifiers.get(types::ALLOWED_RANGE) {
            match parse_range(raw) {
                Ok((min, max)) => {
                    constraints.min = min;
                    constraints.max = max;
                }
                Err(msg) => problems.push(msg),
            }
        }

        if let Some(raw) = qualifiers.get(types::ALLOWED_VALUE) {
            match Pattern::new(raw) {
                Ok(pattern) => constraints.pattern = Some(pattern),
                Err(e) => problems.push(format!("invalid {} pattern '{raw}': {e}", types::ALLOWED_VALUE)),
            }
        }

        for (qualifier_type, slot) in [
            (types::MIN_LENGTH, &mut constraints.min_length),
            (types::MAX_LENGTH, &mut constraints.max_length),
        ] {
            if let Some(raw) = qualifiers.get(qualifier_type) {
                match raw.trim().parse::<usize>() {
                    Ok(n) => *slot = Some(n),
                    Err(_) => problems.push(format!("invalid {qualifier_type} '{raw}'")),
                }
            }
        }

        if let Some(raw) = qualifiers.get(types::FORM_CHOICES) {
            constraints.allowed_values = split_list(raw);
        }

        if let Some(raw) = qualifiers.get(types::REQUIRED_LANG) {
            constraints.required_languages = split_list(raw);
        }

        if let (Some(min), Some(max)) = (constraints.min, constraints.max) {
            if min > max {
                problems.push(format!("allowed range minimum {min} exceeds maximum {max}"));
            }
        }

        if value_type.is_some_and(|vt| !vt.is_numeric())
            && (constraints.min.is_some() || constraints.max.is_some())
        {
            problems.push("numeric range declared on a non-numeric value type".to_string());
        }

        (constraints, problems)
    }

    /// No constraint declared
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Parse `[min, max]`, `min..max` or `min,max`; either side may be empty
fn parse_range(raw: &str) -> Result<(Option<f64>, Option<f64>), String> {
    let inner = raw
        .trim()
        .trim_start_matches(['[', '('])
        .trim_end_matches([']', ')']);
    let (lo, hi) = inner
        .split_once("..")
        .or_else(|| inner.split_once(','))
        .or_else(|| inner.split_once(';'))
        .ok_or_else(|| format!("invalid {} '{raw}'", types::ALLOWED_RANGE))?;

    let bound = |side: &str| -> Result<Option<f64>, String> {
        let side = side.trim();
        if side.is_empty() || side == "*" {
            Ok(None)
        } else {
            side.parse::<f64>()
                .map(Some)
                .map_err(|_| format!("invalid {} bound '{side}'", types::ALLOWED_RANGE))
        }
    };

    Ok((bound(lo)?, bound(hi)?))
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(['|', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}
