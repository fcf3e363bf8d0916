//! Error types for form state

use smt_document::DocumentError;

/// Error raised by a submit handler
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Form controller error
///
/// Validation failures are not errors; they live in the error map.
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    /// Path resolves to no element of the template
    #[error("unknown path: {0}")]
    UnknownPath(String),

    /// Array operation on a path that does not repeat
    #[error("not an array: {0}")]
    NotAnArray(String),

    /// Value set on a read-only element
    #[error("read-only field: {0}")]
    ReadOnly(String),

    /// Value written into an array item that was removed
    #[error("removed item: {0}")]
    RemovedItem(String),

    /// Submit handler failed
    #[error("submit failed: {0}")]
    Handler(HandlerError),

    /// Export from form state failed
    #[error("export failed: {0}")]
    Export(#[from] DocumentError),
}

/// Result type for form operations
pub type FormResult<T> = Result<T, FormError>;
