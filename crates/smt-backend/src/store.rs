//! Document persistence
//!
//! [`DocumentStore`] is the seam; [`HttpDocumentStore`] talks to an AAS
//! submodel repository and [`InMemoryDocumentStore`] backs tests and
//! offline use.

use crate::error::{BackendResult, StoreError};
use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use smt_document::Submodel;

/// Submodel document persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Store a new document; conflicts on an existing id
    async fn create(&self, submodel: &Submodel) -> BackendResult<()>;
    /// Document by id
    async fn get(&self, id: &str) -> BackendResult<Submodel>;
    /// Replace a stored document
    async fn update(&self, submodel: &Submodel) -> BackendResult<()>;
    /// Remove a document by id
    async fn delete(&self, id: &str) -> BackendResult<()>;
    /// Every stored document
    async fn list(&self) -> BackendResult<Vec<Submodel>>;
}

/// Which branch [`upsert`] took
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    /// No document with the id existed
    Created,
    /// An existing document was replaced
    Updated,
}

/// Create the document, or update it if the id is already stored
///
/// # Errors
/// Returns any store error other than the not-found probe
pub async fn upsert(store: &dyn DocumentStore, submodel: &Submodel) -> BackendResult<UpsertOutcome> {
    match store.get(&submodel.id).await {
        Ok(_) => {
            store.update(submodel).await?;
            tracing::info!("Updated document '{}'", submodel.id);
            Ok(UpsertOutcome::Updated)
        }
        Err(e) if e.is_not_found() => {
            store.create(submodel).await?;
            tracing::info!("Created document '{}'", submodel.id);
            Ok(UpsertOutcome::Created)
        }
        Err(e) => Err(e),
    }
}

/// Path segment for a document id (unpadded base64url)
#[must_use]
pub fn encode_id(id: &str) -> String {
    URL_SAFE_NO_PAD.encode(id)
}

/// Submodel repository over HTTP
///
/// Documents live at `{base}/submodels/{base64url(id)}`; listing reads the
/// `result` array of the paged response.
#[derive(Debug, Clone)]
pub struct HttpDocumentStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDocumentStore {
    /// Client for the repository at `base_url`
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Client sharing an existing `reqwest::Client`
    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// `{base}/submodels`
    #[must_use]
    pub fn collection_url(&self) -> String {
        format!("{}/submodels", self.base_url)
    }

    /// `{base}/submodels/{base64url(id)}`
    #[must_use]
    pub fn document_url(&self, id: &str) -> String {
        format!("{}/{}", self.collection_url(), encode_id(id))
    }
}

/// Success passes through; anything else becomes a [`StoreError`]
pub(crate) async fn check_status(response: reqwest::Response) -> BackendResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        status.canonical_reason().unwrap_or("request failed").to_string()
    } else {
        body
    };
    Err(StoreError::new(status.as_u16(), message).into())
}

/// Items of a paged `{ "result": [...] }` body, or a bare array
pub(crate) fn paged_items(body: Value) -> Vec<Value> {
    match body {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("result") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn create(&self, submodel: &Submodel) -> BackendResult<()> {
        let response = self
            .client
            .post(self.collection_url())
            .json(submodel)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn get(&self, id: &str) -> BackendResult<Submodel> {
        let response = self.client.get(self.document_url(id)).send().await?;
        let body: Value = check_status(response).await?.json().await?;
        Ok(serde_json::from_value(body)?)
    }

    async fn update(&self, submodel: &Submodel) -> BackendResult<()> {
        let response = self
            .client
            .put(self.document_url(&submodel.id))
            .json(submodel)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> BackendResult<()> {
        let response = self.client.delete(self.document_url(id)).send().await?;
        check_status(response).await?;
        Ok(())
    }

    async fn list(&self) -> BackendResult<Vec<Submodel>> {
        let response = self.client.get(self.collection_url()).send().await?;
        let body: Value = check_status(response).await?.json().await?;
        let mut documents = Vec::new();
        for item in paged_items(body) {
            match serde_json::from_value(item) {
                Ok(submodel) => documents.push(submodel),
                Err(e) => tracing::warn!("Skipping undecodable listed document: {e}"),
            }
        }
        Ok(documents)
    }
}

/// Process-local store keyed by document id
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    documents: DashMap<String, Submodel>,
}

impl InMemoryDocumentStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// No document is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn create(&self, submodel: &Submodel) -> BackendResult<()> {
        match self.documents.entry(submodel.id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(StoreError::conflict(&submodel.id).into()),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(submodel.clone());
                Ok(())
            }
        }
    }

    async fn get(&self, id: &str) -> BackendResult<Submodel> {
        self.documents
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::not_found(id).into())
    }

    async fn update(&self, submodel: &Submodel) -> BackendResult<()> {
        match self.documents.get_mut(&submodel.id) {
            Some(mut entry) => {
                *entry = submodel.clone();
                Ok(())
            }
            None => Err(StoreError::not_found(&submodel.id).into()),
        }
    }

    async fn delete(&self, id: &str) -> BackendResult<()> {
        self.documents
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(id).into())
    }

    async fn list(&self) -> BackendResult<Vec<Submodel>> {
        let mut documents: Vec<Submodel> = self.documents.iter().map(|e| e.value().clone()).collect();
        documents.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(documents)
    }
}
