//! SMT UI - renderable component tree
//!
//! Maps an [`ElementTree`](smt_model::ElementTree) onto a tree of
//! [`UiNode`]s. Rendering itself (widgets, layout, styling) belongs to the
//! consumer; this crate only decides which component renders which field
//! and with what display properties. It holds no value state.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod component;
pub mod generator;
pub mod node;

// Re-exports for convenience
pub use component::ComponentKind;
pub use generator::{generate, UiGenerator, COLLAPSE_DEPTH, DEFAULT_TEXT_AREA_THRESHOLD};
pub use node::{ArrayProps, DisplayProps, UiNode, UiTree, Variant};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
