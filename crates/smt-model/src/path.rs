//! Element paths and flat value keys
//!
//! Template elements are addressed by [`ElementPath`]: the idShorts from the
//! submodel root down to the element. Form values use the same segments joined
//! with [`SEPARATOR`] and interleave array item indices for repeated positions,
//! e.g. `Measurements.0.Value`.
//!
//! Template paths never contain index segments. Indices only appear in value
//! keys, and [`is_index_segment`] is the one place that decides what an index
//! segment is.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Separator between path segments in value keys
pub const SEPARATOR: char = '.';

/// Path of a template element
///
/// # Examples
/// - `["Address", "Street"]` → `Address.Street`
/// - `["Measurements", "Value"]` → `Measurements.Value`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementPath(Vec<String>);

impl ElementPath {
    /// Create new path from segments
    #[inline]
    #[must_use]
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// Create path from a single segment
    #[inline]
    #[must_use]
    pub fn single(segment: impl Into<String>) -> Self {
        Self(vec![segment.into()])
    }

    /// Empty path (submodel root)
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Get path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Get number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if path is empty (root)
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get parent path (if not root)
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Get last segment (if not root)
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Append a segment, returning new path
    #[inline]
    #[must_use]
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut new = self.clone();
        new.0.push(segment.into());
        new
    }

    /// Check if this path is a prefix of another
    #[inline]
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        if self.0.len() > other.0.len() {
            return false;
        }
        self.0 == other.0[..self.0.len()]
    }

    /// Check if this path is a strict ancestor of another
    #[inline]
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        self.0.len() < other.0.len() && self.is_prefix_of(other)
    }

    /// Get relative path from ancestor
    ///
    /// # Errors
    /// Returns error if `self` is not a descendant of `ancestor`
    pub fn relative_to(&self, ancestor: &Self) -> Result<Self, PathError> {
        if !ancestor.is_prefix_of(self) {
            return Err(PathError::NotDescendant {
                path: self.to_string(),
                ancestor: ancestor.to_string(),
            });
        }
        Ok(Self(self.0[ancestor.0.len()..].to_vec()))
    }

    /// Iterator over segments from root to leaf
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Value key for this path (segments joined with [`SEPARATOR`])
    #[inline]
    #[must_use]
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl Display for ElementPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for segment in &self.0 {
            if !first {
                write!(f, "{SEPARATOR}")?;
            }
            f.write_str(segment)?;
            first = false;
        }
        Ok(())
    }
}

impl FromStr for ElementPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::root());
        }

        let segments: Vec<String> = s
            .split(SEPARATOR)
            .map(|seg| {
                if seg.is_empty() {
                    Err(PathError::EmptySegment)
                } else if is_index_segment(seg) {
                    Err(PathError::IndexSegment(seg.to_string()))
                } else {
                    Ok(seg.to_string())
                }
            })
            .collect::<Result<_, _>>()?;

        Ok(Self(segments))
    }
}

impl From<Vec<String>> for ElementPath {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}

/// Errors related to element paths
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    /// Empty segment in path
    #[error("path contains empty segment")]
    EmptySegment,

    /// Template paths cannot carry array indices
    #[error("template path contains index segment: {0}")]
    IndexSegment(String),

    /// Not a descendant path
    #[error("path '{path}' is not a descendant of '{ancestor}'")]
    NotDescendant { path: String, ancestor: String },
}

/// Whether a key segment is an array item index
#[inline]
#[must_use]
pub fn is_index_segment(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

/// Parse a key segment as an array item index
#[inline]
#[must_use]
pub fn parse_index(segment: &str) -> Option<usize> {
    if is_index_segment(segment) {
        segment.parse().ok()
    } else {
        None
    }
}

/// Join a key prefix and a segment, treating an empty prefix as the root
#[must_use]
pub fn join(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else if segment.is_empty() {
        prefix.to_string()
    } else {
        format!("{prefix}{SEPARATOR}{segment}")
    }
}

/// Key addressing one array item: `path.index`
#[inline]
#[must_use]
pub fn index_key(path: &str, index: usize) -> String {
    join(path, &index.to_string())
}

/// Remove every index segment from a value key
///
/// `Measurements.0.Value` becomes `Measurements.Value`, the template path
/// shared by all instances.
#[must_use]
pub fn strip_indices(key: &str) -> String {
    key.split(SEPARATOR)
        .filter(|seg| !is_index_segment(seg))
        .collect::<Vec<_>>()
        .join(&SEPARATOR.to_string())
}

/// Whether the key's last segment is an index
#[inline]
#[must_use]
pub fn ends_with_index(key: &str) -> bool {
    key.rsplit(SEPARATOR).next().is_some_and(is_index_segment)
}

/// Key equals `prefix` or lies beneath it
#[must_use]
pub fn is_under(key: &str, prefix: &str) -> bool {
    if prefix.is_empty() {
        return true;
    }
    match key.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with(SEPARATOR),
        None => false,
    }
}

/// Key lies strictly beneath `prefix`
#[inline]
#[must_use]
pub fn is_strictly_under(key: &str, prefix: &str) -> bool {
    key != prefix && is_under(key, prefix)
}

/// Index directly following `path` in `key`, if any
///
/// `index_after("Tags.3", "Tags")` and `index_after("Tags.3.Name", "Tags")`
/// both yield `Some(3)`.
#[must_use]
pub fn index_after(key: &str, path: &str) -> Option<usize> {
    let rest = if path.is_empty() {
        key
    } else {
        key.strip_prefix(path)?.strip_prefix(SEPARATOR)?
    };
    let segment = rest.split(SEPARATOR).next()?;
    parse_index(segment)
}

/// Rewrite `path.index[.rest]` to `path[.rest]`
///
/// Returns `None` for keys that do not address the given item.
#[must_use]
pub fn scope_to_index(key: &str, path: &str, index: usize) -> Option<String> {
    let item = index_key(path, index);
    let rest = key.strip_prefix(item.as_str())?;
    if rest.is_empty() {
        Some(path.to_string())
    } else {
        let rest = rest.strip_prefix(SEPARATOR)?;
        Some(join(path, rest))
    }
}

/// Every `(prefix, index)` pair found in a key
///
/// `Contacts.0.Phones.1` yields `("Contacts", 0)` and `("Contacts.0.Phones", 1)`.
#[must_use]
pub fn array_positions(key: &str) -> Vec<(String, usize)> {
    let mut positions = Vec::new();
    let mut prefix = String::new();
    for segment in key.split(SEPARATOR) {
        if let Some(index) = parse_index(segment) {
            positions.push((prefix.clone(), index));
        }
        prefix = join(&prefix, segment);
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_new_and_segments() {
        let path = ElementPath::new(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(path.segments(), &["a", "b"]);
        assert_eq!(path.len(), 2);
    }

    #[test]
    fn path_parent_and_root() {
        let path = ElementPath::from_str("Address.Street").unwrap();
        assert_eq!(path.parent().unwrap().segments(), &["Address"]);
        assert!(ElementPath::root().parent().is_none());
    }

    #[test]
    fn path_child_and_display() {
        let child = ElementPath::single("Address").child("Street");
        assert_eq!(child.to_string(), "Address.Street");
        assert_eq!(child.key(), "Address.Street");
        assert_eq!(ElementPath::root().to_string(), "");
    }

    #[test]
    fn path_relative_to() {
        let full = ElementPath::from_str("a.b.c.d").unwrap();
        let ancestor = ElementPath::from_str("a.b").unwrap();
        assert_eq!(full.relative_to(&ancestor).unwrap().segments(), &["c", "d"]);

        let not_ancestor = ElementPath::from_str("x").unwrap();
        assert!(matches!(
            full.relative_to(&not_ancestor),
            Err(PathError::NotDescendant { .. })
        ));
    }

    #[test]
    fn path_is_ancestor_of() {
        let parent = ElementPath::from_str("a").unwrap();
        let child = ElementPath::from_str("a.b").unwrap();
        assert!(parent.is_ancestor_of(&child));
        assert!(!child.is_ancestor_of(&parent));
        assert!(!parent.is_ancestor_of(&parent.clone()));
    }

    #[test]
    fn path_from_str_rejects_index_and_empty() {
        assert!(matches!(
            "Tags.0".parse::<ElementPath>(),
            Err(PathError::IndexSegment(_))
        ));
        assert!(matches!(
            "a..b".parse::<ElementPath>(),
            Err(PathError::EmptySegment)
        ));
    }

    #[test]
    fn index_segment_predicate() {
        assert!(is_index_segment("0"));
        assert!(is_index_segment("42"));
        assert!(!is_index_segment(""));
        assert!(!is_index_segment("a1"));
        assert!(!is_index_segment("-1"));
    }

    #[test]
    fn strip_indices_removes_interior_and_trailing() {
        assert_eq!(strip_indices("Measurements.0.Value"), "Measurements.Value");
        assert_eq!(strip_indices("Tags.3"), "Tags");
        assert_eq!(strip_indices("A.1.B.2.C"), "A.B.C");
        assert_eq!(strip_indices("Plain"), "Plain");
    }

    #[test]
    fn is_under_respects_segment_boundaries() {
        assert!(is_under("Tags.1", "Tags.1"));
        assert!(is_under("Tags.1.Name", "Tags.1"));
        assert!(!is_under("Tags.10", "Tags.1"));
        assert!(!is_under("TagsX", "Tags"));
        assert!(is_strictly_under("Tags.1", "Tags"));
        assert!(!is_strictly_under("Tags", "Tags"));
    }

    #[test]
    fn index_after_reads_next_segment() {
        assert_eq!(index_after("Tags.3", "Tags"), Some(3));
        assert_eq!(index_after("Tags.3.Name", "Tags"), Some(3));
        assert_eq!(index_after("Tags", "Tags"), None);
        assert_eq!(index_after("Tagsx.3", "Tags"), None);
        assert_eq!(index_after("Address.Street", "Address"), None);
    }

    #[test]
    fn scope_to_index_rewrites_item_keys() {
        assert_eq!(scope_to_index("Tags.2", "Tags", 2), Some("Tags".to_string()));
        assert_eq!(
            scope_to_index("M.2.Value", "M", 2),
            Some("M.Value".to_string())
        );
        assert_eq!(scope_to_index("M.20.Value", "M", 2), None);
        assert_eq!(scope_to_index("M.3.Value", "M", 2), None);
    }

    #[test]
    fn array_positions_finds_every_level() {
        assert_eq!(
            array_positions("Contacts.0.Phones.1"),
            vec![
                ("Contacts".to_string(), 0),
                ("Contacts.0.Phones".to_string(), 1)
            ]
        );
        assert!(array_positions("Address.Street").is_empty());
    }

    #[test]
    fn join_handles_root() {
        assert_eq!(join("", "A"), "A");
        assert_eq!(join("A", "B"), "A.B");
        assert_eq!(index_key("Tags", 4), "Tags.4");
    }
}
