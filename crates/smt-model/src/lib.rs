//! SMT Model - normalized element model of Submodel Templates
//!
//! Turns an IDTA Submodel Template (AAS V3 JSON) into an [`ElementTree`]:
//! - Path addressing for every element ([`ElementPath`], value keys)
//! - Cardinality, value types and input kinds
//! - Constraints derived from `SMT/*` qualifiers
//! - Parse issues collected instead of aborting
//!
//! # Example
//!
//! ```rust,ignore
//! use smt_model::prelude::*;
//!
//! let tree = TemplateParser::new().parse_str(&template_json)?;
//! for element in tree.walk() {
//!     println!("{} -> {:?}", element.key(), element.input_kind);
//! }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod element;
pub mod error;
pub mod kind;
pub mod parser;
pub mod path;
pub mod qualifier;
pub mod value;

// Re-exports for convenience
pub use element::{
    ElementTree, EntityInfo, ListInfo, ParseIssue, Severity, SubmodelHeader, TemplateElement,
    DEFAULT_LANGUAGE,
};
pub use error::{ModelError, ModelResult};
pub use kind::{Cardinality, ElementKind, InputKind, ValueType};
pub use parser::{parse, TemplateParser};
pub use path::{ElementPath, PathError};
pub use qualifier::{Constraints, Pattern, Qualifier, QualifierMap};
pub use value::{
    lang_text, FieldValue, FileValue, FlatValues, Key, LangString, RangeValue, Reference,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with templates
    pub use crate::{
        Cardinality, ElementKind, ElementPath, ElementTree, FieldValue, FlatValues, InputKind,
        TemplateElement, TemplateParser, ValueType,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
