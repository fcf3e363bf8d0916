//! Error types for template parsing
//!
//! Structural problems inside a template are [`ParseIssue`](crate::ParseIssue)s,
//! not errors. Errors here mean the input could not be read at all.

use crate::path::PathError;

/// Errors reading a template document
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Input is not valid JSON
    #[error("template is not valid JSON: {0}")]
    Syntax(#[from] serde_json::Error),

    /// Input is JSON but carries no submodel or element list
    #[error("template has no submodel: {0}")]
    NoSubmodel(String),

    /// Malformed element path
    #[error("path error: {0}")]
    Path(#[from] PathError),
}

/// Result type alias for model operations
pub type ModelResult<T> = Result<T, ModelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_error_display() {
        let err: ModelError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(err.to_string().starts_with("template is not valid JSON"));
    }

    #[test]
    fn path_error_conversion() {
        let err: ModelError = PathError::EmptySegment.into();
        assert!(matches!(err, ModelError::Path(_)));
    }
}
