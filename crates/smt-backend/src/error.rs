//! Error types for external collaborators

/// Non-success answer from a document store
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("store returned {status}: {message}")]
pub struct StoreError {
    /// HTTP-style status code
    pub status: u16,
    /// Human-readable detail
    pub message: String,
}

impl StoreError {
    /// Status of a missing document
    pub const NOT_FOUND: u16 = 404;
    /// Status of a create over an existing id
    pub const CONFLICT: u16 = 409;

    /// Error with any status
    #[must_use]
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Missing document `id`
    #[must_use]
    pub fn not_found(id: &str) -> Self {
        Self::new(Self::NOT_FOUND, format!("no document with id '{id}'"))
    }

    /// Document `id` already exists
    #[must_use]
    pub fn conflict(id: &str) -> Self {
        Self::new(Self::CONFLICT, format!("document '{id}' already exists"))
    }

    /// Whether the status means the document is missing
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status == Self::NOT_FOUND
    }
}

/// Backend error
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Store answered with an error status
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Transport failure
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not decode
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Packaging failed
    #[error("package error: {0}")]
    Package(String),
}

impl BackendError {
    /// Whether the store reported the document as missing
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_not_found())
    }

    /// Status code, if the failure carries one
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Store(e) => Some(e.status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::Decode(_) | Self::Package(_) => None,
        }
    }
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;
