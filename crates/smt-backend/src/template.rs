//! Template retrieval
//!
//! Templates are handed out as raw JSON; parsing belongs to the model crate.

use crate::cache::TemplateCache;
use crate::error::BackendResult;
use crate::store::{check_status, encode_id, paged_items};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Listing entry for one published template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSummary {
    /// Template identifier
    pub id: String,
    /// Template short-name
    pub id_short: String,
    /// First semantic id key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_id: Option<String>,
    /// `version.revision` from the administration block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl TemplateSummary {
    /// Summary without semantic id or version
    #[must_use]
    pub fn new(id: impl Into<String>, id_short: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            id_short: id_short.into(),
            semantic_id: None,
            version: None,
        }
    }

    /// Summary of a raw submodel document; `None` without an id
    #[must_use]
    pub fn from_document(document: &Value) -> Option<Self> {
        let id = document.get("id")?.as_str()?;
        let text = |v: Option<&Value>| v.and_then(Value::as_str).map(str::to_string);
        let administration = document.get("administration");
        let version = match (
            text(administration.and_then(|a| a.get("version"))),
            text(administration.and_then(|a| a.get("revision"))),
        ) {
            (Some(v), Some(r)) => Some(format!("{v}.{r}")),
            (v, _) => v,
        };

        Some(Self {
            id: id.to_string(),
            id_short: text(document.get("idShort")).unwrap_or_default(),
            semantic_id: text(document.pointer("/semanticId/keys/0/value")),
            version,
        })
    }
}

/// Source of Submodel Templates
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TemplateSource: Send + Sync {
    /// Published templates
    async fn list(&self) -> BackendResult<Vec<TemplateSummary>>;

    /// Raw template document
    async fn fetch(&self, id: &str) -> BackendResult<Value>;
}

/// Template repository over HTTP
///
/// Same addressing as the document store: `{base}/submodels` and
/// `{base}/submodels/{base64url(id)}`.
#[derive(Debug, Clone)]
pub struct HttpTemplateSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTemplateSource {
    /// Source for the repository at `base_url`
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Source sharing an existing `reqwest::Client`
    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// `{base}/submodels/{base64url(id)}`
    #[must_use]
    pub fn template_url(&self, id: &str) -> String {
        format!("{}/submodels/{}", self.base_url, encode_id(id))
    }
}

#[async_trait]
impl TemplateSource for HttpTemplateSource {
    async fn list(&self) -> BackendResult<Vec<TemplateSummary>> {
        let url = format!("{}/submodels", self.base_url);
        let response = self.client.get(url).send().await?;
        let body: Value = check_status(response).await?.json().await?;
        Ok(paged_items(body)
            .iter()
            .filter_map(TemplateSummary::from_document)
            .collect())
    }

    async fn fetch(&self, id: &str) -> BackendResult<Value> {
        tracing::debug!("Fetching template '{id}'");
        let response = self.client.get(self.template_url(id)).send().await?;
        Ok(check_status(response).await?.json().await?)
    }
}

/// Any source fronted by a [`TemplateCache`]
#[derive(Debug, Clone)]
pub struct CachedTemplateSource<S> {
    inner: S,
    cache: TemplateCache,
}

impl<S: TemplateSource> CachedTemplateSource<S> {
    /// Front `inner` with `cache`
    #[must_use]
    pub fn new(inner: S, cache: TemplateCache) -> Self {
        Self { inner, cache }
    }

    /// The cache, for explicit `clear`
    #[inline]
    #[must_use]
    pub fn cache(&self) -> &TemplateCache {
        &self.cache
    }

    /// The wrapped source
    #[inline]
    #[must_use]
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: TemplateSource> TemplateSource for CachedTemplateSource<S> {
    async fn list(&self) -> BackendResult<Vec<TemplateSummary>> {
        if let Some(listing) = self.cache.listing() {
            return Ok(listing);
        }
        let listing = self.inner.list().await?;
        self.cache.set_listing(listing.clone());
        Ok(listing)
    }

    async fn fetch(&self, id: &str) -> BackendResult<Value> {
        if let Some(cached) = self.cache.get(id).await {
            tracing::debug!("Template '{id}' served from cache");
            return Ok((*cached).clone());
        }
        let template = self.inner.fetch(id).await?;
        self.cache.set(id, template.clone()).await;
        Ok(template)
    }
}
