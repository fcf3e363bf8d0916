//! SMT Form - form state over a parsed Submodel Template
//!
//! - [`IndexSets`]: live item indices per array path, decoupled from
//!   display positions
//! - [`validate`] / [`validate_form`]: per-field rules and the whole-form
//!   required check
//! - [`FormController`]: the single mutator of values, errors, touched
//!   flags and index sets
//!
//! # Example
//!
//! ```rust,ignore
//! use smt_form::FormController;
//! use smt_model::{FieldValue, FlatValues};
//! use std::sync::Arc;
//!
//! let mut form = FormController::new(Arc::new(tree), FlatValues::new());
//! form.set_value("SerialNumber", FieldValue::from("SN-1"))?;
//! let tag = form.add_array_item("Tags")?;
//! form.set_value(&format!("Tags.{tag}"), FieldValue::from("blue"))?;
//! if form.validate_all() {
//!     let document = form.export(Default::default())?;
//! }
//! ```

#![warn(unreachable_pub)]

pub mod array_state;
pub mod controller;
pub mod error;
pub mod validation;

// Re-exports for convenience
pub use array_state::{purge_values_for_removed_index, FieldErrors, IndexSets, Touched};
pub use controller::{FormController, FormSnapshot, SubmitHandler, SubmitOutcome};
pub use error::{FormError, FormResult, HandlerError};
pub use validation::{validate, validate_form, REQUIRED_ITEMS_MESSAGE, REQUIRED_MESSAGE};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
