//! SMT Document - AAS Submodel export and import
//!
//! - [`Exporter`]: element tree + flat values → [`Submodel`], with
//!   warnings and schema violations returned alongside
//! - [`import`]: [`Submodel`] → flat values for seeding a form
//! - [`check_conformance`]: embedded structural schema
//!
//! # Example
//!
//! ```rust,ignore
//! use smt_document::{export, ExportOptions};
//!
//! let result = export(&tree, &values, ExportOptions::default())?;
//! if !result.is_conformant() {
//!     for violation in &result.violations {
//!         eprintln!("{}: {}", violation.path, violation.message);
//!     }
//! }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod document;
pub mod error;
pub mod exporter;
pub mod importer;
pub mod schema;

// Re-exports for convenience
pub use document::{
    BinaryElement, Collection, ElementHeader, Entity, List, MultiLanguageProperty, Passthrough,
    Property, Range, ReferenceElement, Submodel, SubmodelElement,
};
pub use error::{DocumentError, DocumentResult};
pub use exporter::{
    export, format_scalar, ExportOptions, ExportResult, ExportWarning, Exporter,
    DEFAULT_CONTENT_TYPE,
};
pub use importer::{import, import_json, parse_document};
pub use schema::{check_conformance, check_value, SchemaViolation, SCHEMA_SOURCE};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
