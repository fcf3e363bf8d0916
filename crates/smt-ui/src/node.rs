//! UI nodes and the UI tree

use crate::component::ComponentKind;
use serde::Serialize;

/// Visual variant derived from nesting depth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Primary,
    Nested,
    Alternate,
}

impl Variant {
    /// `Primary` at the top level, alternating below
    #[must_use]
    pub fn for_depth(depth: usize) -> Self {
        match depth {
            0 => Self::Primary,
            d if d % 2 == 1 => Self::Nested,
            _ => Self::Alternate,
        }
    }
}

/// Display-only properties of a node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayProps {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
    pub required: bool,
    pub read_only: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
    pub default_collapsed: bool,
    pub variant: Variant,
}

/// Array-container specifics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArrayProps {
    /// Items present at mount
    pub min_items: usize,
    /// Caption of the add action
    pub add_label: String,
}

/// One renderable unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UiNode {
    pub component: ComponentKind,
    /// Value key of the referenced element; empty for the form root
    pub key: String,
    pub depth: usize,
    pub props: DisplayProps,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub array: Option<ArrayProps>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<UiNode>,
}

impl UiNode {
    /// Stamp cloned per live index of an array container
    #[must_use]
    pub fn stamp(&self) -> Option<&UiNode> {
        if self.component == ComponentKind::ArrayContainer {
            self.children.first()
        } else {
            None
        }
    }

    /// Depth-first iterator over this node and its descendants
    pub fn walk(&self) -> impl Iterator<Item = &UiNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            stack.extend(next.children.iter().rev());
            Some(next)
        })
    }
}

/// Renderable tree rooted in a [`ComponentKind::Form`] node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UiTree {
    pub root: UiNode,
}

impl UiTree {
    /// Top-level nodes
    #[inline]
    #[must_use]
    pub fn nodes(&self) -> &[UiNode] {
        &self.root.children
    }

    /// First node bound to a value key
    ///
    /// Array containers and their stamps share a key; the container wins.
    #[must_use]
    pub fn find(&self, key: &str) -> Option<&UiNode> {
        self.walk().find(|node| node.key == key)
    }

    /// Depth-first iterator including the root
    pub fn walk(&self) -> impl Iterator<Item = &UiNode> {
        self.root.walk()
    }

    /// Total number of nodes including the root
    #[must_use]
    pub fn len(&self) -> usize {
        self.walk().count()
    }

    /// Form without fields
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_alternates_below_top_level() {
        assert_eq!(Variant::for_depth(0), Variant::Primary);
        assert_eq!(Variant::for_depth(1), Variant::Nested);
        assert_eq!(Variant::for_depth(2), Variant::Alternate);
        assert_eq!(Variant::for_depth(3), Variant::Nested);
    }
}
