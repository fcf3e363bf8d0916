//! CLI configuration
//!
//! Optional TOML file; every key may be omitted.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use smt_document::ExportOptions;
use std::path::Path;

/// Settings for `smt-forms`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Submodel repository receiving pushed documents
    pub repository_url: String,
    /// Repository serving Submodel Templates
    pub template_url: String,
    /// Emit optional elements without a value
    pub include_empty_optional: bool,
    /// Mint a fresh document id on export
    pub generate_new_id: bool,
    /// `tracing` filter used when `RUST_LOG` is unset
    pub log_filter: String,
    /// Templates kept in the fetch cache
    pub cache_capacity: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            repository_url: "http://localhost:8081/api/v3.0".to_string(),
            template_url: "https://smt-repo.admin-shell-io.com/api/v3.0".to_string(),
            include_empty_optional: false,
            generate_new_id: false,
            log_filter: "info".to_string(),
            cache_capacity: smt_backend::DEFAULT_CAPACITY,
        }
    }
}

impl CliConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a TOML file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or is not valid TOML
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Read `path` if given, defaults otherwise
    ///
    /// # Errors
    /// See [`CliConfig::load`]
    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    /// Export options the config selects
    #[must_use]
    pub fn export_options(&self) -> ExportOptions {
        ExportOptions::default()
            .with_include_empty_optional(self.include_empty_optional)
            .with_generate_new_id(self.generate_new_id)
    }

    /// Set the document repository
    #[must_use]
    pub fn with_repository_url(mut self, url: impl Into<String>) -> Self {
        self.repository_url = url.into();
        self
    }

    /// Set the template repository
    #[must_use]
    pub fn with_template_url(mut self, url: impl Into<String>) -> Self {
        self.template_url = url.into();
        self
    }

    /// Export empty optional fields
    #[inline]
    #[must_use]
    pub fn with_include_empty_optional(mut self, include: bool) -> Self {
        self.include_empty_optional = include;
        self
    }

    /// Give exported documents fresh ids
    #[inline]
    #[must_use]
    pub fn with_generate_new_id(mut self, generate: bool) -> Self {
        self.generate_new_id = generate;
        self
    }

    /// Set the fallback log filter
    #[must_use]
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }
}
