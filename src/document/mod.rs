//! API description document loading
//!
//! Documents come from the backend (`<base>/openapi.json`) through a TTL
//! cache, or from a local JSON/YAML file.

mod store;

pub use store::{FileStore, KeyValueStore, MemoryStore};

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::catalog::HttpMethod;
use crate::config::DiscoveryConfig;
use crate::failsafe::{DEFAULT_RETRY_DELAY, RetryPolicy};
use crate::transport::{ApiRequest, Transport, normalize_base_url};
use crate::{Error, Result};

/// A description document with the time it was fetched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedDocument {
    /// The document itself
    pub schema: Value,
    /// Fetch time
    pub saved_at: DateTime<Utc>,
}

impl CachedDocument {
    /// Whether this entry is younger than `ttl` at `now`
    #[must_use]
    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(self.saved_at);
        age.to_std().is_ok_and(|age| age < ttl)
    }
}

/// Cache key for the document of `base_url`
#[must_use]
pub fn cache_key(base_url: &str) -> String {
    format!("openapi:{base_url}")
}

/// Reject anything that is not an object with a `paths` object
pub fn validate_document(document: &Value) -> Result<()> {
    match document.as_object() {
        Some(map) if map.get("paths").is_some_and(Value::is_object) => Ok(()),
        Some(_) => Err(Error::InvalidDocument(
            "document has no 'paths' section".to_string(),
        )),
        None => Err(Error::InvalidDocument(
            "document is not a JSON object".to_string(),
        )),
    }
}

/// Read a description document from disk (YAML, which also covers JSON)
pub fn load_document_file(path: &Path) -> Result<Value> {
    let raw = std::fs::read_to_string(path)?;
    let document: Value = match serde_yaml::from_str(&raw) {
        Ok(document) => document,
        Err(yaml_err) => serde_json::from_str(&raw).map_err(|_| Error::Yaml(yaml_err))?,
    };
    validate_document(&document)?;
    debug!(path = %path.display(), "Loaded description document from file");
    Ok(document)
}

/// Fetches the description document of one backend
pub struct DocumentLoader {
    base_url: String,
    transport: Arc<dyn Transport>,
    store: Option<Arc<dyn KeyValueStore>>,
    document_path: String,
    ttl: Duration,
    retry: RetryPolicy,
}

impl DocumentLoader {
    /// Loader for `base_url` without a cache
    pub fn new(base_url: impl AsRef<str>, transport: Arc<dyn Transport>) -> Self {
        let defaults = DiscoveryConfig::default();
        Self {
            base_url: normalize_base_url(base_url.as_ref()).to_string(),
            transport,
            store: None,
            document_path: defaults.document_path,
            ttl: defaults.cache_ttl,
            retry: RetryPolicy {
                retries: defaults.fetch_retries,
                delay: DEFAULT_RETRY_DELAY,
            },
        }
    }

    /// Loader configured from the discovery section
    pub fn from_config(
        base_url: impl AsRef<str>,
        transport: Arc<dyn Transport>,
        config: &DiscoveryConfig,
    ) -> Self {
        let mut loader = Self::new(base_url, transport);
        loader.document_path.clone_from(&config.document_path);
        loader.ttl = config.cache_ttl;
        loader.retry.retries = config.fetch_retries;
        if config.cache_enabled {
            if let Some(dir) = config.cache_dir() {
                loader.store = Some(Arc::new(FileStore::new(dir)));
            }
        }
        loader
    }

    /// Use `store` as the document cache
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Backend base URL (normalized)
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn cached(&self) -> Option<CachedDocument> {
        let raw = self.store.as_ref()?.get(&cache_key(&self.base_url))?;
        serde_json::from_value(raw).ok()
    }

    /// The backend's description document.
    ///
    /// A cached copy younger than the TTL wins unless `force` is set.
    pub async fn load(&self, force: bool) -> Result<Value> {
        if !force {
            if let Some(entry) = self.cached() {
                if entry.is_fresh(self.ttl, Utc::now()) {
                    debug!(base_url = %self.base_url, "Using cached description document");
                    return Ok(entry.schema);
                }
            }
        }

        let request = ApiRequest::new(&self.base_url, HttpMethod::Get, &self.document_path)
            .with_retry(self.retry);
        let document = self.transport.execute(request).await?.into_data();
        validate_document(&document)?;

        info!(base_url = %self.base_url, "Fetched description document");

        if let Some(store) = &self.store {
            let entry = CachedDocument {
                schema: document.clone(),
                saved_at: Utc::now(),
            };
            match serde_json::to_value(&entry) {
                Ok(value) => store.set(&cache_key(&self.base_url), &value),
                Err(e) => debug!(error = %e, "Could not encode cache entry"),
            }
        }

        Ok(document)
    }
}
