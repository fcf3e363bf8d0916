//! SMT Backend - collaborators at the edge of the form pipeline
//!
//! - [`DocumentStore`] with [`HttpDocumentStore`] and
//!   [`InMemoryDocumentStore`], plus [`upsert`]
//! - [`TemplateSource`] with [`HttpTemplateSource`] and
//!   [`CachedTemplateSource`] over an explicit [`TemplateCache`]
//! - [`Packager`] with [`JsonPackager`]
//!
//! No client retries; failures propagate as [`BackendError`].

#![warn(unreachable_pub)]

pub mod cache;
pub mod error;
pub mod package;
pub mod store;
pub mod template;

// Re-exports for convenience
pub use cache::{TemplateCache, DEFAULT_CAPACITY};
pub use error::{BackendError, BackendResult, StoreError};
pub use package::{JsonPackager, Packager};
pub use store::{
    encode_id, upsert, DocumentStore, HttpDocumentStore, InMemoryDocumentStore, UpsertOutcome,
};
pub use template::{CachedTemplateSource, HttpTemplateSource, TemplateSource, TemplateSummary};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
