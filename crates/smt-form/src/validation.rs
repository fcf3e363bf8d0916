//! Validation engine
//!
//! [`validate`] checks one value against its element and never fails on an
//! empty value; required-ness is a whole-form concern handled by
//! [`validate_form`], which collects every problem instead of stopping at
//! the first.

use crate::array_state::{FieldErrors, IndexSets};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use smt_model::path;
use smt_model::{
    Constraints, ElementKind, ElementTree, FieldValue, FlatValues, RangeValue, TemplateElement,
    ValueType,
};

static URI: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:[^\s]*$").expect("valid URI regex"));

static DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date regex"));

static TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2}):(\d{2})(?::(\d{2})(?:\.\d+)?)?$").expect("valid time regex")
});

const NAIVE_DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Message for a missing required value
pub const REQUIRED_MESSAGE: &str = "This field is required";

/// Message for a required array without items
pub const REQUIRED_ITEMS_MESSAGE: &str = "At least one item is required";

/// Check one value against its element
///
/// Returns a human-readable message, or `None` if the value passes.
#[must_use]
pub fn validate(element: &TemplateElement, value: &FieldValue) -> Option<String> {
    if value.is_empty() {
        return None;
    }

    match element.kind {
        ElementKind::MultiLanguageProperty => validate_lang_strings(&element.constraints, value),
        ElementKind::Range => validate_range(element, value),
        ElementKind::File | ElementKind::Blob => validate_file(&element.constraints, value),
        ElementKind::ReferenceElement => match value {
            FieldValue::Reference(reference) if reference.keys.iter().any(|k| k.value.is_empty()) => {
                Some("Every reference key needs a value".to_string())
            }
            FieldValue::Reference(_) | FieldValue::Text(_) => None,
            _ => Some("Expected a reference".to_string()),
        },
        ElementKind::Property => validate_scalar(element, value),
        // Entities carry their global asset id as their own value
        ElementKind::Entity => match value {
            FieldValue::Text(id) => check_uri(id),
            _ => Some("Expected a global asset id".to_string()),
        },
        _ => None,
    }
}

fn validate_lang_strings(constraints: &Constraints, value: &FieldValue) -> Option<String> {
    let FieldValue::LangStrings(strings) = value else {
        return Some("Expected a list of language and text pairs".to_string());
    };
    if strings
        .iter()
        .any(|s| s.language.trim().is_empty() || s.text.trim().is_empty())
    {
        return Some("Every entry needs both a language and a text".to_string());
    }
    let missing: Vec<&str> = constraints
        .required_languages
        .iter()
        .filter(|lang| !strings.iter().any(|s| s.language.eq_ignore_ascii_case(lang)))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        return Some(format!("Missing text for language: {}", missing.join(", ")));
    }
    strings
        .iter()
        .find_map(|s| check_length(constraints, &s.text))
}

fn validate_range(element: &TemplateElement, value: &FieldValue) -> Option<String> {
    let FieldValue::Range(RangeValue { min, max }) = value else {
        return Some("Expected a range with optional min and max".to_string());
    };
    if let (Some(lo), Some(hi)) = (min, max) {
        if lo > hi {
            return Some("Minimum must not exceed maximum".to_string());
        }
    }
    let whole = element.value_type.is_some_and(|vt| vt.is_integer());
    [min, max]
        .into_iter()
        .flatten()
        .find_map(|bound| {
            if !bound.is_finite() || (whole && bound.fract() != 0.0) {
                return Some("Range bounds must be valid numbers".to_string());
            }
            check_bounds(element, *bound)
        })
}

fn validate_file(constraints: &Constraints, value: &FieldValue) -> Option<String> {
    let content_type = match value {
        FieldValue::File(file) => file.content_type.as_deref(),
        FieldValue::Text(_) => None,
        _ => return Some("Expected a file path".to_string()),
    };
    match (constraints.content_type.as_deref(), content_type) {
        (Some(expected), Some(actual)) if !mime_matches(expected, actual) => {
            Some(format!("Content type must be {expected}"))
        }
        _ => None,
    }
}

fn mime_matches(expected: &str, actual: &str) -> bool {
    let actual = actual.split(';').next().unwrap_or(actual).trim();
    match expected.strip_suffix("/*") {
        Some(family) => actual
            .split('/')
            .next()
            .is_some_and(|f| f.eq_ignore_ascii_case(family)),
        None => expected.eq_ignore_ascii_case(actual),
    }
}

fn validate_scalar(element: &TemplateElement, value: &FieldValue) -> Option<String> {
    let value_type = element.value_type.unwrap_or(ValueType::String);

    if value_type == ValueType::Boolean {
        return match value {
            FieldValue::Bool(_) => None,
            _ => Some("Must be true or false".to_string()),
        };
    }

    let Some(text) = value.as_plain_string() else {
        return Some("Expected a single value".to_string());
    };

    let problem = if value_type.is_integer() {
        check_integer(element, value)
    } else if value_type.is_decimal() {
        match value.as_f64() {
            Some(n) if n.is_finite() => check_bounds(element, n),
            _ => Some("Must be a number".to_string()),
        }
    } else {
        match value_type {
            ValueType::AnyUri => check_uri(&text),
            ValueType::Date => check_date(&text),
            ValueType::DateTime => check_date_time(&text),
            ValueType::Time => check_time(&text),
            _ => check_length(&element.constraints, &text).or_else(|| {
                element
                    .constraints
                    .pattern
                    .as_ref()
                    .filter(|pattern| !pattern.is_match(&text))
                    .map(|pattern| format!("Must match the pattern {}", pattern.source()))
            }),
        }
    };

    problem.or_else(|| check_choices(&element.constraints, value, &text))
}

fn check_integer(element: &TemplateElement, value: &FieldValue) -> Option<String> {
    let whole = match value {
        FieldValue::Integer(_) => true,
        FieldValue::Number(n) => n.is_finite() && n.fract() == 0.0,
        FieldValue::Text(s) => {
            let s = s.trim();
            s.parse::<i64>().is_ok() || s.parse::<f64>().is_ok_and(|n| n.is_finite() && n.fract() == 0.0)
        }
        _ => false,
    };
    if !whole {
        return Some("Must be a whole number".to_string());
    }
    value.as_f64().and_then(|n| check_bounds(element, n))
}

/// Declared bounds, tightened by the bounds the integer type implies
fn check_bounds(element: &TemplateElement, n: f64) -> Option<String> {
    let (implied_min, implied_max) = element
        .value_type
        .map_or((None, None), |vt| vt.implied_bounds());
    let min = max_opt(element.constraints.min, implied_min);
    let max = min_opt(element.constraints.max, implied_max);

    if let Some(min) = min {
        if n < min {
            return Some(format!("Must be at least {min}"));
        }
    }
    if let Some(max) = max {
        if n > max {
            return Some(format!("Must be at most {max}"));
        }
    }
    None
}

fn max_opt(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

fn min_opt(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

fn check_uri(text: &str) -> Option<String> {
    (!URI.is_match(text.trim())).then(|| "Must be a valid URI".to_string())
}

fn check_date(text: &str) -> Option<String> {
    let valid = DATE.is_match(text) && NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok();
    (!valid).then(|| "Must be a valid date (YYYY-MM-DD)".to_string())
}

fn check_date_time(text: &str) -> Option<String> {
    let text = text.trim();
    let valid = DateTime::parse_from_rfc3339(text).is_ok()
        || NAIVE_DATE_TIME_FORMATS
            .iter()
            .any(|format| NaiveDateTime::parse_from_str(text, format).is_ok());
    (!valid).then(|| "Must be a valid date and time".to_string())
}

fn check_time(text: &str) -> Option<String> {
    let invalid = || Some("Must be a valid time (HH:MM[:SS])".to_string());
    let Some(captures) = TIME.captures(text) else {
        return invalid();
    };
    let part = |i: usize| {
        captures
            .get(i)
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .unwrap_or(0)
    };
    if part(1) > 23 || part(2) > 59 || part(3) > 59 {
        return invalid();
    }
    None
}

fn check_length(constraints: &Constraints, text: &str) -> Option<String> {
    let len = text.chars().count();
    if let Some(min) = constraints.min_length {
        if len < min {
            return Some(format!("Must be at least {min} characters"));
        }
    }
    if let Some(max) = constraints.max_length {
        if len > max {
            return Some(format!("Must be at most {max} characters"));
        }
    }
    None
}

fn check_choices(constraints: &Constraints, value: &FieldValue, text: &str) -> Option<String> {
    if constraints.allowed_values.is_empty() {
        return None;
    }
    let numeric = value.as_f64();
    let allowed = constraints.allowed_values.iter().any(|choice| {
        choice == text || numeric.is_some_and(|n| choice.trim().parse::<f64>() == Ok(n))
    });
    (!allowed).then(|| format!("Must be one of: {}", constraints.allowed_values.join(", ")))
}

/// Whole-form validation
///
/// Re-validates every stored value, then enforces required-ness over live
/// array items. Values whose key no longer resolves to an element are
/// ignored.
#[must_use]
pub fn validate_form(tree: &ElementTree, values: &FlatValues, index_sets: &IndexSets) -> FieldErrors {
    let mut errors = FieldErrors::new();

    for (key, value) in values {
        match tree.find(key) {
            Some(element) => {
                if let Some(message) = validate(element, value) {
                    errors.insert(key.clone(), message);
                }
            }
            None => tracing::debug!("Skipping value for unknown path '{key}'"),
        }
    }

    let mut required = RequiredCheck {
        values,
        index_sets,
        errors: &mut errors,
    };
    for root in tree.roots() {
        required.element(root, &root.key());
    }

    errors
}

struct RequiredCheck<'a> {
    values: &'a FlatValues,
    index_sets: &'a IndexSets,
    errors: &'a mut FieldErrors,
}

impl RequiredCheck<'_> {
    fn flag(&mut self, key: &str, message: &str) {
        self.errors
            .entry(key.to_string())
            .or_insert_with(|| message.to_string());
    }

    fn has_value_under(&self, prefix: &str) -> bool {
        self.values
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .any(|(key, value)| path::is_under(key, prefix) && !value.is_empty())
    }

    /// `key` is the element's instance key (indices of enclosing items
    /// included, its own index not yet)
    fn element(&mut self, element: &TemplateElement, key: &str) {
        if element.kind.is_read_only() || element.read_only {
            return;
        }

        if !element.is_array() {
            self.instance(element, key, false);
            return;
        }

        let indices = self.index_sets.get(key).to_vec();
        if element.required
            && !indices
                .iter()
                .any(|i| self.has_value_under(&path::index_key(key, *i)))
        {
            self.flag(key, REQUIRED_ITEMS_MESSAGE);
        }

        let item = if element.kind == ElementKind::SubmodelElementList {
            element.item_template()
        } else {
            Some(element)
        };
        if let Some(item) = item {
            for index in indices {
                self.instance(item, &path::index_key(key, index), true);
            }
        }
    }

    /// One occurrence; `live_item` marks an array item, whose own
    /// required-ness is carried by the array
    fn instance(&mut self, element: &TemplateElement, key: &str, live_item: bool) {
        if element.kind == ElementKind::SubmodelElementList {
            // Nested list inside a list item
            self.element(element, key);
            return;
        }

        let required = element.required && !live_item;

        if element.is_grouping() {
            if element.children.is_empty() {
                return;
            }
            let present = self.has_value_under(key);
            if required && !present {
                self.flag(key, REQUIRED_MESSAGE);
            }
            // Children of an absent optional group are not demanded
            if required || present || live_item {
                for child in &element.children {
                    self.element(child, &path::join(key, &child.id_short));
                }
            }
            return;
        }

        if required && self.values.get(key).map_or(true, FieldValue::is_empty) {
            self.flag(key, REQUIRED_MESSAGE);
        }
    }
}
