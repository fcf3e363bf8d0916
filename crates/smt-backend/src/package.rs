//! Document packaging
//!
//! A packager turns one submodel into the bytes of a downloadable file.

use crate::error::{BackendError, BackendResult};
use serde_json::json;
use smt_document::Submodel;

/// Serializes a document into a container file
pub trait Packager: Send + Sync {
    /// MIME type of the produced file
    fn content_type(&self) -> &'static str;

    /// File name extension, without the dot
    fn extension(&self) -> &'static str;

    /// Produce the file bytes
    ///
    /// # Errors
    /// Returns error if the document cannot be encoded
    fn pack(&self, submodel: &Submodel) -> BackendResult<Vec<u8>>;

    /// Suggested file name for a document
    fn file_name(&self, submodel: &Submodel) -> String {
        format!("{}.{}", submodel.id_short, self.extension())
    }
}

/// AAS environment JSON holding the one submodel
#[derive(Debug, Clone, Copy)]
pub struct JsonPackager {
    pretty: bool,
}

impl Default for JsonPackager {
    fn default() -> Self {
        Self { pretty: true }
    }
}

impl JsonPackager {
    /// Compact JSON packager
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Indent the written JSON
    #[must_use]
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl Packager for JsonPackager {
    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn extension(&self) -> &'static str {
        "json"
    }

    fn pack(&self, submodel: &Submodel) -> BackendResult<Vec<u8>> {
        let environment = json!({
            "assetAdministrationShells": [],
            "submodels": [submodel],
            "conceptDescriptions": []
        });
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(&environment)
        } else {
            serde_json::to_vec(&environment)
        };
        let bytes = bytes.map_err(|e| BackendError::Package(e.to_string()))?;
        tracing::debug!("Packed '{}' into {} bytes", submodel.id_short, bytes.len());
        Ok(bytes)
    }
}
