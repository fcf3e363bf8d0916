//! Template cache using moka
//!
//! Fetched templates are kept in a bounded concurrent cache; the template
//! listing is a single slot behind a lock. Owned by whoever builds the
//! fetcher, never process-global.

use crate::template::TemplateSummary;
use moka::future::Cache;
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Default number of cached templates
pub const DEFAULT_CAPACITY: u64 = 64;

/// Cache of fetched templates and the template listing
#[derive(Debug, Clone)]
pub struct TemplateCache {
    templates: Cache<String, Arc<Value>>,
    listing: Arc<RwLock<Option<Vec<TemplateSummary>>>>,
}

impl Default for TemplateCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl TemplateCache {
    /// Create cache with max capacity
    #[inline]
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            templates: Cache::new(max_capacity),
            listing: Arc::new(RwLock::new(None)),
        }
    }

    /// Create cache whose templates expire after `ttl`
    #[must_use]
    pub fn with_ttl(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            templates: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
            listing: Arc::new(RwLock::new(None)),
        }
    }

    /// Cached template, if present
    pub async fn get(&self, id: &str) -> Option<Arc<Value>> {
        self.templates.get(id).await
    }

    /// Store a template and return the shared copy
    pub async fn set(&self, id: impl Into<String>, template: Value) -> Arc<Value> {
        let template = Arc::new(template);
        self.templates.insert(id.into(), Arc::clone(&template)).await;
        template
    }

    /// Forget one template
    pub async fn invalidate(&self, id: &str) {
        self.templates.invalidate(id).await;
    }

    /// Cached template listing, if present
    #[must_use]
    pub fn listing(&self) -> Option<Vec<TemplateSummary>> {
        self.listing.read().clone()
    }

    /// Replace the cached listing
    pub fn set_listing(&self, listing: Vec<TemplateSummary>) {
        *self.listing.write() = Some(listing);
    }

    /// Drop every cached template and the listing
    pub fn clear(&self) {
        self.templates.invalidate_all();
        *self.listing.write() = None;
        tracing::debug!("Template cache cleared");
    }
}
