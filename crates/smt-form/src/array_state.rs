//! Array item index sets
//!
//! Each array path owns an ordered list of live item indices. Indices are
//! decoupled from display positions: removing an item only reorders the
//! list, stored values stay addressed by their original index, and an index
//! is never handed out twice for the same path within a session.

use serde::{Deserialize, Serialize};
use smt_model::path;
use smt_model::FlatValues;
use std::collections::BTreeMap;

/// Path-keyed validation messages
pub type FieldErrors = BTreeMap<String, String>;

/// Path-keyed touched flags
pub type Touched = BTreeMap<String, bool>;

/// Ordered live indices per array path
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSets {
    live: BTreeMap<String, Vec<usize>>,
    /// Next index to hand out per path; only ever grows
    next: BTreeMap<String, usize>,
}

impl IndexSets {
    /// Create empty index sets
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconstruct membership from the index segments of stored keys
    ///
    /// `{Tags.0, Tags.3}` yields `Tags: [0, 3]`; nested keys record every
    /// level (`Contacts.1.Phones.0` also yields `Contacts.1.Phones: [0]`).
    #[must_use]
    pub fn derive_from_values(values: &FlatValues) -> Self {
        let mut sets = Self::new();
        for key in values.keys() {
            for (prefix, index) in path::array_positions(key) {
                sets.insert(&prefix, index);
            }
        }
        for indices in sets.live.values_mut() {
            indices.sort_unstable();
        }
        sets
    }

    /// Live indices of a path in display order
    #[must_use]
    pub fn get(&self, path: &str) -> &[usize] {
        self.live.get(path).map_or(&[], Vec::as_slice)
    }

    /// Whether `index` is live under `path`
    #[must_use]
    pub fn contains(&self, path: &str, index: usize) -> bool {
        self.get(path).contains(&index)
    }

    /// Whether `index` was handed out under `path` and has since been removed
    #[must_use]
    pub fn is_retired(&self, path: &str, index: usize) -> bool {
        !self.contains(path, index) && self.next.get(path).is_some_and(|next| index < *next)
    }

    /// Every path with an index list, live items or not
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.live.keys().map(String::as_str)
    }

    /// Plain view of the ordering
    #[inline]
    #[must_use]
    pub fn as_map(&self) -> &BTreeMap<String, Vec<usize>> {
        &self.live
    }

    /// Register an index found in stored data; returns whether it was new
    pub fn insert(&mut self, path: &str, index: usize) -> bool {
        let next = self.next.entry(path.to_string()).or_insert(0);
        *next = (*next).max(index + 1);
        let indices = self.live.entry(path.to_string()).or_default();
        if indices.contains(&index) {
            false
        } else {
            indices.push(index);
            true
        }
    }

    /// Append the next available index and return it
    ///
    /// `max(current) + 1`, or `0` for an empty path, and never below an
    /// index handed out earlier for the same path.
    pub fn add(&mut self, path: &str) -> usize {
        let indices = self.live.entry(path.to_string()).or_default();
        let next = self.next.entry(path.to_string()).or_insert(0);
        let index = indices
            .iter()
            .max()
            .map_or(0, |max| max + 1)
            .max(*next);
        indices.push(index);
        *next = index + 1;
        index
    }

    /// Remove the item at display `position`; returns the removed index
    ///
    /// `None` when the position is out of bounds.
    pub fn remove(&mut self, path: &str, position: usize) -> Option<usize> {
        let indices = self.live.get_mut(path)?;
        if position >= indices.len() {
            return None;
        }
        Some(indices.remove(position))
    }

    /// Move one item; returns `false` (and changes nothing) when either
    /// position is out of bounds
    pub fn reorder(&mut self, path: &str, from: usize, to: usize) -> bool {
        let Some(indices) = self.live.get_mut(path) else {
            return false;
        };
        if from >= indices.len() || to >= indices.len() {
            return false;
        }
        let index = indices.remove(from);
        indices.insert(to, index);
        true
    }

    /// Pad every listed path up to its minimum number of live items
    pub fn ensure_minimum(&mut self, minimums: &BTreeMap<String, usize>) {
        for (path, minimum) in minimums {
            while self.get(path).len() < *minimum {
                self.add(path);
            }
        }
    }

    /// Drop the index lists of arrays nested in one removed item
    pub fn remove_nested(&mut self, path: &str, index: usize) {
        let item = path::index_key(path, index);
        self.live.retain(|key, _| !path::is_under(key, &item));
        self.next.retain(|key, _| !path::is_under(key, &item));
    }
}

/// Remove every entry addressed by one removed array item
///
/// Keys equal to `path.index` or beneath it are dropped from all three maps.
pub fn purge_values_for_removed_index(
    values: &mut FlatValues,
    errors: &mut FieldErrors,
    touched: &mut Touched,
    path: &str,
    index: usize,
) {
    let item = path::index_key(path, index);
    values.retain(|key, _| !path::is_under(key, &item));
    errors.retain(|key, _| !path::is_under(key, &item));
    touched.retain(|key, _| !path::is_under(key, &item));
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use smt_model::FieldValue;

    fn values(keys: &[&str]) -> FlatValues {
        keys.iter()
            .map(|k| ((*k).to_string(), FieldValue::from("x")))
            .collect()
    }

    #[test]
    fn derive_collects_every_level() {
        let sets = IndexSets::derive_from_values(&values(&[
            "Tags.3",
            "Tags.0",
            "Contacts.1.Name",
            "Contacts.1.Phones.0",
            "Contacts.0.Name",
            "Serial",
        ]));
        assert_eq!(sets.get("Tags"), &[0, 3]);
        assert_eq!(sets.get("Contacts"), &[0, 1]);
        assert_eq!(sets.get("Contacts.1.Phones"), &[0]);
        assert!(sets.get("Serial").is_empty());
    }

    #[test]
    fn add_appends_next_index() {
        let mut sets = IndexSets::new();
        assert_eq!(sets.add("Tags"), 0);
        assert_eq!(sets.add("Tags"), 1);
        sets.remove("Tags", 0);
        assert_eq!(sets.add("Tags"), 2);
        assert_eq!(sets.get("Tags"), &[1, 2]);
    }

    #[test]
    fn add_never_reuses_removed_maximum() {
        let mut sets = IndexSets::new();
        sets.add("Tags");
        sets.add("Tags");
        assert_eq!(sets.remove("Tags", 1), Some(1));
        assert_eq!(sets.add("Tags"), 2);
    }

    #[test]
    fn removed_indices_are_retired() {
        let mut sets = IndexSets::new();
        sets.add("Tags");
        sets.add("Tags");
        sets.remove("Tags", 0);
        assert!(sets.is_retired("Tags", 0));
        assert!(!sets.is_retired("Tags", 1));
        assert!(!sets.is_retired("Tags", 2));
        assert!(!sets.is_retired("Other", 0));
    }

    #[test]
    fn remove_out_of_bounds_is_none() {
        let mut sets = IndexSets::new();
        sets.add("Tags");
        assert_eq!(sets.remove("Tags", 4), None);
        assert_eq!(sets.remove("Other", 0), None);
        assert_eq!(sets.get("Tags"), &[0]);
    }

    #[test]
    fn reorder_moves_or_is_noop() {
        let mut sets = IndexSets::new();
        for _ in 0..3 {
            sets.add("Tags");
        }
        assert!(sets.reorder("Tags", 0, 2));
        assert_eq!(sets.get("Tags"), &[1, 2, 0]);

        let before = sets.clone();
        assert!(!sets.reorder("Tags", 0, 3));
        assert_eq!(sets, before);
    }

    #[test]
    fn ensure_minimum_pads() {
        let mut sets = IndexSets::new();
        sets.insert("Tags", 4);
        sets.ensure_minimum(&BTreeMap::from([
            ("Tags".to_string(), 2),
            ("Phones".to_string(), 1),
        ]));
        assert_eq!(sets.get("Tags"), &[4, 5]);
        assert_eq!(sets.get("Phones"), &[0]);
    }

    #[test]
    fn purge_drops_only_the_removed_item() {
        let mut vals = values(&["Tags.1", "Tags.10", "Tags.1.Sub", "Other"]);
        let mut errors: FieldErrors = [("Tags.1".to_string(), "bad".to_string())].into();
        let mut touched: Touched = [("Tags.1.Sub".to_string(), true), ("Tags.10".to_string(), true)].into();

        purge_values_for_removed_index(&mut vals, &mut errors, &mut touched, "Tags", 1);

        assert_eq!(vals.keys().collect::<Vec<_>>(), vec!["Other", "Tags.10"]);
        assert!(errors.is_empty());
        assert_eq!(touched.keys().collect::<Vec<_>>(), vec!["Tags.10"]);
    }

    #[test]
    fn remove_nested_drops_inner_sets() {
        let mut sets = IndexSets::derive_from_values(&values(&["C.0.P.0", "C.1.P.0", "C.1.P.1"]));
        sets.remove_nested("C", 1);
        assert!(sets.paths().all(|p| !p.starts_with("C.1")));
        assert_eq!(sets.get("C.0.P"), &[0]);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add,
        Remove(usize),
        Reorder(usize, usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Add),
            (0usize..6).prop_map(Op::Remove),
            (0usize..6, 0usize..6).prop_map(|(a, b)| Op::Reorder(a, b)),
        ]
    }

    proptest! {
        #[test]
        fn prop_indices_unique_and_never_reused(ops in prop::collection::vec(op(), 0..60)) {
            let mut sets = IndexSets::new();
            let mut handed_out = std::collections::HashSet::new();

            for op in ops {
                match op {
                    Op::Add => {
                        let index = sets.add("Tags");
                        prop_assert!(handed_out.insert(index), "index {} reused", index);
                    }
                    Op::Remove(position) => {
                        let len = sets.get("Tags").len();
                        let removed = sets.remove("Tags", position);
                        prop_assert_eq!(removed.is_some(), position < len);
                    }
                    Op::Reorder(from, to) => {
                        sets.reorder("Tags", from, to);
                    }
                }
                let live = sets.get("Tags");
                let unique: std::collections::HashSet<_> = live.iter().collect();
                prop_assert_eq!(unique.len(), live.len());
            }
        }
    }
}
