//! Error types for document export and import
//!
//! Export warnings and schema violations are returned as values alongside
//! the document; these errors mean no document could be produced or read.

/// Errors producing or reading documents
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// JSON (de)serialization failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Embedded schema could not be compiled
    #[error("schema error: {0}")]
    Schema(String),

    /// Input is not a submodel document
    #[error("import error: {0}")]
    Import(String),
}

impl DocumentError {
    /// Create import error
    pub fn import(msg: impl Into<String>) -> Self {
        Self::Import(msg.into())
    }
}

/// Result type alias for document operations
pub type DocumentResult<T> = Result<T, DocumentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn import_error_display() {
        let err = DocumentError::import("no submodels");
        assert_eq!(err.to_string(), "import error: no submodels");
    }
}
