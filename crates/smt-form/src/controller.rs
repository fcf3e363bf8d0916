//! Form state controller
//!
//! The single mutable aggregate behind a form. Every change to values,
//! errors, touched flags or array index sets goes through a method here;
//! rendering layers only read.

use crate::array_state::{purge_values_for_removed_index, FieldErrors, IndexSets, Touched};
use crate::error::{FormError, FormResult, HandlerError};
use crate::validation::{validate, validate_form};
use async_trait::async_trait;
use serde::Serialize;
use smt_document::{ExportOptions, ExportResult, Exporter};
use smt_model::path;
use smt_model::{ElementTree, FieldValue, FlatValues};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Receives the values of a valid form
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubmitHandler: Send + Sync {
    /// Persist or forward the submitted values
    async fn submit(&self, values: FlatValues) -> Result<(), HandlerError>;
}

/// Result of [`FormController::submit`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// Whole-form validation failed; the handler was not called
    Invalid {
        /// Number of fields that failed
        error_count: usize,
    },
    /// Handler accepted the values
    Submitted,
}

/// Read-only view of the form state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormSnapshot {
    /// Stored values
    pub values: FlatValues,
    /// Error messages by path
    pub errors: FieldErrors,
    /// Visited fields
    pub touched: Touched,
    /// Live item indices per array, in display order
    pub index_sets: BTreeMap<String, Vec<usize>>,
    /// Mutated since mount
    pub dirty: bool,
    /// Whole-form validity
    pub valid: bool,
    /// Submit in flight
    pub submitting: bool,
}

/// State captured at mount, restored by [`FormController::reset`]
#[derive(Debug, Clone)]
struct Initial {
    values: FlatValues,
    index_sets: IndexSets,
}

/// Form state machine over one parsed template
#[derive(Debug, Clone)]
pub struct FormController {
    tree: Arc<ElementTree>,
    values: FlatValues,
    errors: FieldErrors,
    touched: Touched,
    index_sets: IndexSets,
    dirty: bool,
    valid: bool,
    submitting: bool,
    initial: Initial,
}

impl FormController {
    /// Mount a form
    ///
    /// Empty `values` are replaced by the template defaults. Index sets are
    /// derived from the values and padded so every required array (and
    /// every required array inside a live item) starts with its minimum
    /// number of items.
    #[must_use]
    pub fn new(tree: Arc<ElementTree>, values: FlatValues) -> Self {
        let values = if values.is_empty() {
            tree.initial_values()
        } else {
            values
        };

        let mut index_sets = IndexSets::derive_from_values(&values);
        index_sets.ensure_minimum(&tree.array_minimums());
        pad_all_items(&tree, &mut index_sets);

        let valid = validate_form(&tree, &values, &index_sets).is_empty();
        tracing::debug!(
            "Mounted form for '{}': {} values, {} arrays",
            tree.header.id_short,
            values.len(),
            index_sets.paths().count()
        );

        Self {
            initial: Initial {
                values: values.clone(),
                index_sets: index_sets.clone(),
            },
            tree,
            values,
            errors: FieldErrors::new(),
            touched: Touched::new(),
            index_sets,
            dirty: false,
            valid,
            submitting: false,
        }
    }

    /// Store a value and re-run its field rule
    ///
    /// Index segments in `path` beyond anything handed out so far are
    /// registered as live items. Removed items stay removed.
    ///
    /// # Errors
    /// Returns error if the path resolves to no element, to a read-only one,
    /// or into a removed array item
    pub fn set_value(&mut self, path: &str, value: FieldValue) -> FormResult<()> {
        let element = self
            .tree
            .find(path)
            .ok_or_else(|| FormError::UnknownPath(path.to_string()))?;
        if element.read_only || element.kind.is_read_only() {
            return Err(FormError::ReadOnly(path.to_string()));
        }

        let positions = path::array_positions(path);
        if let Some((prefix, index)) = positions
            .iter()
            .find(|(prefix, index)| self.index_sets.is_retired(prefix, *index))
        {
            tracing::debug!("Rejected write to removed item {index} of '{prefix}'");
            return Err(FormError::RemovedItem(path.to_string()));
        }
        for (prefix, index) in positions {
            if self.index_sets.insert(&prefix, index) {
                tracing::debug!("Registered item {index} of '{prefix}'");
            }
        }

        match validate(element, &value) {
            Some(message) => {
                self.errors.insert(path.to_string(), message);
            }
            None => {
                self.errors.remove(path);
            }
        }
        self.values.insert(path.to_string(), value);
        self.dirty = true;
        self.refresh_valid();
        Ok(())
    }

    /// Mark a field as visited
    pub fn set_touched(&mut self, path: &str) {
        self.touched.insert(path.to_string(), true);
    }

    /// Set or clear one error message directly
    pub fn set_error(&mut self, path: &str, message: Option<String>) {
        match message {
            Some(message) => {
                self.errors.insert(path.to_string(), message);
            }
            None => {
                self.errors.remove(path);
            }
        }
    }

    /// Append an item to the array at `path`; returns its index
    ///
    /// Required arrays inside the new item are padded to their minimum.
    ///
    /// # Errors
    /// Returns error if the path is unknown or does not repeat
    pub fn add_array_item(&mut self, path: &str) -> FormResult<usize> {
        let element = self
            .tree
            .find(path)
            .ok_or_else(|| FormError::UnknownPath(path.to_string()))?;
        // `Tags.2` is one item of `Tags`, not an array of its own
        let item_of_repeatable = path::ends_with_index(path) && !element.is_list_item;
        if !element.is_array() || item_of_repeatable {
            return Err(FormError::NotAnArray(path.to_string()));
        }

        let index = self.index_sets.add(path);
        pad_item(&self.tree, &mut self.index_sets, path, index);
        self.dirty = true;
        self.refresh_valid();
        tracing::debug!("Added item {index} to '{path}'");
        Ok(index)
    }

    /// Remove the item at display `position`; returns the removed index
    ///
    /// Values, errors and touched flags of the item are purged. `None` when
    /// the position is out of bounds.
    pub fn remove_array_item(&mut self, path: &str, position: usize) -> Option<usize> {
        let index = self.index_sets.remove(path, position)?;
        purge_values_for_removed_index(
            &mut self.values,
            &mut self.errors,
            &mut self.touched,
            path,
            index,
        );
        self.index_sets.remove_nested(path, index);
        self.dirty = true;
        self.refresh_valid();
        tracing::debug!("Removed item {index} (position {position}) from '{path}'");
        Some(index)
    }

    /// Move one item; `false` when either position is out of bounds
    pub fn reorder_array_item(&mut self, path: &str, from: usize, to: usize) -> bool {
        let moved = self.index_sets.reorder(path, from, to);
        if moved {
            self.dirty = true;
        }
        moved
    }

    /// Re-validate the whole form, replacing the error map
    pub fn validate_all(&mut self) -> bool {
        self.errors = validate_form(&self.tree, &self.values, &self.index_sets);
        self.valid = self.errors.is_empty();
        tracing::debug!("Form validation: {} errors", self.errors.len());
        self.valid
    }

    /// Enter the submitting window
    ///
    /// Returns the values to hand off, or `None` (window closed again) if
    /// the form is invalid.
    pub fn begin_submit(&mut self) -> Option<FlatValues> {
        self.submitting = true;
        if self.validate_all() {
            Some(self.values.clone())
        } else {
            self.submitting = false;
            None
        }
    }

    /// Leave the submitting window
    pub fn finish_submit(&mut self) {
        self.submitting = false;
    }

    /// Validate and hand the values to `handler`
    ///
    /// The submitting flag is cleared whatever the outcome.
    ///
    /// # Errors
    /// Returns error if the handler fails
    pub async fn submit(&mut self, handler: &dyn SubmitHandler) -> FormResult<SubmitOutcome> {
        let Some(values) = self.begin_submit() else {
            tracing::info!("Submit blocked by {} validation errors", self.errors.len());
            return Ok(SubmitOutcome::Invalid {
                error_count: self.errors.len(),
            });
        };

        let result = handler.submit(values).await;
        self.finish_submit();
        result.map_err(FormError::Handler)?;

        tracing::info!("Submitted form '{}'", self.tree.header.id_short);
        Ok(SubmitOutcome::Submitted)
    }

    /// Restore the state captured at mount
    pub fn reset(&mut self) {
        self.values = self.initial.values.clone();
        self.index_sets = self.initial.index_sets.clone();
        self.errors.clear();
        self.touched.clear();
        self.dirty = false;
        self.refresh_valid();
    }

    /// Export the current values in live item order
    ///
    /// # Errors
    /// See [`Exporter::export`]
    pub fn export(&self, options: ExportOptions) -> FormResult<ExportResult> {
        Ok(Exporter::new(&self.tree)
            .with_options(options)
            .with_index_order(self.index_sets.as_map())
            .export(&self.values)?)
    }

    /// Serializable copy of the whole state
    #[must_use]
    pub fn snapshot(&self) -> FormSnapshot {
        FormSnapshot {
            values: self.values.clone(),
            errors: self.errors.clone(),
            touched: self.touched.clone(),
            index_sets: self.index_sets.as_map().clone(),
            dirty: self.dirty,
            valid: self.valid,
            submitting: self.submitting,
        }
    }

    /// Template the form was mounted with
    #[inline]
    #[must_use]
    pub fn tree(&self) -> &ElementTree {
        &self.tree
    }

    /// Every stored value
    #[inline]
    #[must_use]
    pub fn values(&self) -> &FlatValues {
        &self.values
    }

    /// Stored value of one field
    #[must_use]
    pub fn value(&self, path: &str) -> Option<&FieldValue> {
        self.values.get(path)
    }

    /// Current error messages by path
    #[inline]
    #[must_use]
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Error message of one field
    #[must_use]
    pub fn error(&self, path: &str) -> Option<&str> {
        self.errors.get(path).map(String::as_str)
    }

    /// Whether the field was visited
    #[must_use]
    pub fn is_touched(&self, path: &str) -> bool {
        self.touched.get(path).copied().unwrap_or(false)
    }

    /// Live item indices of every array
    #[inline]
    #[must_use]
    pub fn index_sets(&self) -> &IndexSets {
        &self.index_sets
    }

    /// Live indices of one array in display order
    #[must_use]
    pub fn items(&self, path: &str) -> &[usize] {
        self.index_sets.get(path)
    }

    /// Any mutation since mount or the last reset
    #[inline]
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whole-form validity as of the last mutation
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// A submit is in flight
    #[inline]
    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    fn refresh_valid(&mut self) {
        self.valid = validate_form(&self.tree, &self.values, &self.index_sets).is_empty();
    }
}

/// Pad nested required arrays of every live item
fn pad_all_items(tree: &ElementTree, sets: &mut IndexSets) {
    let items: Vec<(String, usize)> = sets
        .paths()
        .flat_map(|p| sets.get(p).iter().map(move |i| (p.to_string(), *i)))
        .collect();
    for (path, index) in items {
        pad_item(tree, sets, &path, index);
    }
}

/// Pad required arrays directly inside one item, then inside their items
fn pad_item(tree: &ElementTree, sets: &mut IndexSets, path: &str, index: usize) {
    let item = path::index_key(path, index);
    for (nested, minimum) in tree.nested_minimums(&item) {
        while sets.get(&nested).len() < minimum {
            sets.add(&nested);
        }
        for nested_index in sets.get(&nested).to_vec() {
            pad_item(tree, sets, &nested, nested_index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use smt_test_utils as fixtures;

    fn controller(template: &serde_json::Value) -> FormController {
        FormController::new(Arc::new(fixtures::tree(template)), FlatValues::new())
    }

    #[test]
    fn mount_pads_required_arrays_recursively() {
        let form = controller(&fixtures::contacts());
        assert_eq!(form.items("Contacts"), &[0]);
        assert_eq!(form.items("Contacts.0.Phones"), &[0]);
        assert!(!form.is_dirty());
        assert!(!form.is_valid());
        assert!(form.errors().is_empty());
    }

    #[test]
    fn mount_seeds_template_defaults() {
        let form = controller(&fixtures::nameplate());
        assert_eq!(form.value("Revision"), Some(&FieldValue::from("A")));
    }

    #[test]
    fn set_value_validates_and_registers_indices() {
        let mut form = controller(&fixtures::serial_and_tags());

        form.set_value("Tags.4", FieldValue::from("x")).unwrap();
        assert_eq!(form.items("Tags"), &[4]);
        assert!(form.is_dirty());

        let mut form = controller(&fixtures::nameplate());
        form.set_value("YearOfConstruction", FieldValue::Integer(1800)).unwrap();
        assert_eq!(form.error("YearOfConstruction"), Some("Must be at least 1900"));
        form.set_value("YearOfConstruction", FieldValue::Integer(1999)).unwrap();
        assert_eq!(form.error("YearOfConstruction"), None);
    }

    #[test]
    fn set_value_rejects_unknown_and_read_only() {
        let mut form = controller(&fixtures::all_kinds());
        assert!(matches!(
            form.set_value("Nope", FieldValue::from("x")),
            Err(FormError::UnknownPath(_))
        ));
        assert!(matches!(
            form.set_value("Rel", FieldValue::from("x")),
            Err(FormError::ReadOnly(_))
        ));
        assert!(form.values().is_empty());
    }

    #[test]
    fn add_rejects_non_arrays() {
        let mut form = controller(&fixtures::serial_and_tags());
        assert!(matches!(form.add_array_item("SerialNumber"), Err(FormError::NotAnArray(_))));
        assert!(matches!(form.add_array_item("Tags.0"), Err(FormError::NotAnArray(_))));
        assert_eq!(form.add_array_item("Tags").unwrap(), 0);
    }

    #[test]
    fn add_pads_nested_required_arrays() {
        let mut form = controller(&fixtures::contacts());
        let index = form.add_array_item("Contacts").unwrap();
        assert_eq!(index, 1);
        assert_eq!(form.items("Contacts.1.Phones"), &[0]);
    }

    #[test]
    fn reset_restores_mount_state() {
        let mut form = controller(&fixtures::serial_and_tags());
        form.set_value("SerialNumber", FieldValue::from("SN-1")).unwrap();
        form.add_array_item("Tags").unwrap();
        form.set_touched("SerialNumber");
        form.validate_all();

        form.reset();

        assert!(form.values().is_empty());
        assert!(form.items("Tags").is_empty());
        assert!(!form.is_touched("SerialNumber"));
        assert!(form.errors().is_empty());
        assert!(!form.is_dirty());
    }

    #[test]
    fn snapshot_serializes_state() {
        let mut form = controller(&fixtures::serial_and_tags());
        form.set_value("Tags.0", FieldValue::from("a")).unwrap();
        let json = serde_json::to_value(form.snapshot()).unwrap();
        assert_eq!(json["values"], json!({"Tags.0": "a"}));
        assert_eq!(json["index_sets"], json!({"Tags": [0]}));
        assert_eq!(json["dirty"], json!(true));
        assert_eq!(json["submitting"], json!(false));
    }

    #[tokio::test]
    async fn submit_invalid_skips_handler() {
        let mut form = controller(&fixtures::serial_and_tags());
        let mut handler = MockSubmitHandler::new();
        handler.expect_submit().never();

        let outcome = form.submit(&handler).await.unwrap();

        assert_eq!(outcome, SubmitOutcome::Invalid { error_count: 1 });
        assert!(!form.is_submitting());
    }

    #[tokio::test]
    async fn submit_hands_values_to_handler() {
        let mut form = controller(&fixtures::serial_and_tags());
        form.set_value("SerialNumber", FieldValue::from("SN-1")).unwrap();

        let mut handler = MockSubmitHandler::new();
        handler
            .expect_submit()
            .withf(|values| values.get("SerialNumber") == Some(&FieldValue::from("SN-1")))
            .times(1)
            .returning(|_| Ok(()));

        assert_eq!(form.submit(&handler).await.unwrap(), SubmitOutcome::Submitted);
        assert!(!form.is_submitting());
    }

    #[tokio::test]
    async fn submit_failure_clears_flag() {
        let mut form = controller(&fixtures::serial_and_tags());
        form.set_value("SerialNumber", FieldValue::from("SN-1")).unwrap();

        let mut handler = MockSubmitHandler::new();
        handler
            .expect_submit()
            .returning(|_| Err("repository unavailable".into()));

        let err = form.submit(&handler).await.unwrap_err();
        assert!(matches!(err, FormError::Handler(_)));
        assert!(!form.is_submitting());
    }

    #[test]
    fn begin_submit_exposes_window() {
        let mut form = controller(&fixtures::serial_and_tags());
        form.set_value("SerialNumber", FieldValue::from("SN-1")).unwrap();

        let values = form.begin_submit().unwrap();
        assert!(form.is_submitting());
        assert_eq!(values.len(), 1);

        // Mutations stay allowed while a submit is in flight
        form.set_value("Tags.0", FieldValue::from("late")).unwrap();
        form.finish_submit();
        assert!(!form.is_submitting());
    }
}
