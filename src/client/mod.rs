//! Capability-keyed invocation facade
//!
//! [`ApiClient`] is built once per description document. Discovery runs in
//! the constructor and the result never changes; refreshing means building
//! a new client (see [`crate::session::Session`]).

mod bulk;

pub use bulk::{BulkFailure, BulkOptions, BulkReport};

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::capability::{Capability, CapabilityMap, discover};
use crate::catalog::{OperationRecord, build_path};
use crate::config::RequestConfig;
use crate::failsafe::RetryPolicy;
use crate::transport::{ApiRequest, Query, Transport};
use crate::{Error, Result};

/// Default number of cards requested for today's session
pub const DEFAULT_SESSION_LIMIT: u32 = 30;

/// Default file name for a backup taken at `at`: `vocab-sync-<ISO time>.json`
/// with `:` and `.` replaced by `-`
#[must_use]
pub fn export_file_name(at: DateTime<Utc>) -> String {
    let stamp = at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("vocab-sync-{stamp}.json")
}

/// Per-call settings applied by the facade
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestDefaults {
    /// Retry policy for every capability call
    pub retry: RetryPolicy,
}

impl RequestDefaults {
    /// Defaults from the request config section
    #[must_use]
    pub fn from_config(config: &RequestConfig) -> Self {
        Self {
            retry: RetryPolicy::new(config),
        }
    }
}

/// Arguments for a generic operation call
#[derive(Debug, Clone, Default)]
pub struct OperationCall {
    /// Values for path placeholders
    pub path_params: BTreeMap<String, String>,
    /// Query parameters
    pub query: Query,
    /// JSON body
    pub body: Option<Value>,
    /// Caller-driven cancellation
    pub cancel: Option<CancellationToken>,
}

impl OperationCall {
    /// Call with only a body
    #[must_use]
    pub fn body(body: Value) -> Self {
        Self {
            body: Some(body),
            ..Self::default()
        }
    }

    /// Call with only query parameters
    #[must_use]
    pub fn query(query: Query) -> Self {
        Self {
            query,
            ..Self::default()
        }
    }

    /// Call with one path parameter
    #[must_use]
    pub fn path_param(name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut path_params = BTreeMap::new();
        path_params.insert(name.into(), value.into());
        Self {
            path_params,
            ..Self::default()
        }
    }
}

/// Facade over one discovered backend
pub struct ApiClient {
    document: Value,
    base_url: String,
    operations: Vec<OperationRecord>,
    capabilities: CapabilityMap,
    transport: Arc<dyn Transport>,
    defaults: RequestDefaults,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("operations", &self.operations.len())
            .field("capabilities", &self.capabilities)
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Discover capabilities in `document` and bind them to `base_url`
    pub fn new(
        document: Value,
        base_url: impl Into<String>,
        transport: Arc<dyn Transport>,
        defaults: RequestDefaults,
    ) -> Result<Self> {
        let discovery = discover(&document)?;

        Ok(Self {
            document,
            base_url: base_url.into(),
            operations: discovery.operations,
            capabilities: discovery.capabilities,
            transport,
            defaults,
        })
    }

    /// Description document this client was built from
    #[must_use]
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Backend base URL
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Every operation in catalog order
    #[must_use]
    pub fn operations(&self) -> &[OperationRecord] {
        &self.operations
    }

    /// Winning operation per discovered capability
    #[must_use]
    pub fn capabilities(&self) -> &CapabilityMap {
        &self.capabilities
    }

    /// Whether the backend exposes `capability`
    #[must_use]
    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(capability)
    }

    /// Catalog entry with the given id
    #[must_use]
    pub fn find_operation(&self, id: &str) -> Option<&OperationRecord> {
        self.operations.iter().find(|op| op.id == id)
    }

    /// Catalog entry with the given id, or [`Error::OperationNotFound`]
    pub fn operation(&self, id: &str) -> Result<&OperationRecord> {
        self.find_operation(id)
            .ok_or_else(|| Error::OperationNotFound(id.to_string()))
    }

    fn require(&self, capability: Capability) -> Result<&OperationRecord> {
        self.capabilities
            .get(capability)
            .ok_or(Error::CapabilityUnavailable(capability))
    }

    /// Invoke any catalog operation
    pub async fn call_operation(&self, op: &OperationRecord, call: OperationCall) -> Result<Value> {
        let path = build_path(&op.path, &call.path_params);
        debug!(operation = %op.id, method = %op.method, path = %path, "Calling operation");

        let request = ApiRequest::new(&self.base_url, op.method, path)
            .with_query(call.query)
            .with_body(call.body)
            .with_retry(self.defaults.retry)
            .with_cancel(call.cancel);

        let outcome = self.transport.execute(request).await?;
        Ok(outcome.into_data())
    }

    async fn invoke(&self, capability: Capability, call: OperationCall) -> Result<Value> {
        let op = self.require(capability)?;
        self.call_operation(op, call).await
    }

    /// Invoke an id-addressed capability; the id fills the first placeholder
    async fn invoke_by_id(
        &self,
        capability: Capability,
        id: &str,
        body: Option<Value>,
    ) -> Result<Value> {
        let op = self.require(capability)?;
        let mut call = match op.path_params().into_iter().next() {
            Some(key) => OperationCall::path_param(key, id),
            None => OperationCall::default(),
        };
        call.body = body;
        self.call_operation(op, call).await
    }

    /// Backend liveness probe
    pub async fn health(&self) -> Result<Value> {
        self.invoke(Capability::Health, OperationCall::default()).await
    }

    /// Create a vocab record
    pub async fn add_vocab(&self, payload: &Value) -> Result<Value> {
        self.invoke(Capability::AddVocab, OperationCall::body(payload.clone()))
            .await
    }

    /// Create or update a vocab record
    pub async fn upsert_vocab(&self, payload: &Value) -> Result<Value> {
        self.invoke(Capability::UpsertVocab, OperationCall::body(payload.clone()))
            .await
    }

    /// List vocab records
    pub async fn list_vocab(&self, query: Query) -> Result<Value> {
        self.invoke(Capability::ListVocab, OperationCall::query(query))
            .await
    }

    /// Fetch one vocab record
    pub async fn get_vocab(&self, id: &str) -> Result<Value> {
        self.invoke_by_id(Capability::GetVocab, id, None).await
    }

    /// Replace or patch one vocab record
    pub async fn update_vocab(&self, id: &str, payload: &Value) -> Result<Value> {
        self.invoke_by_id(Capability::UpdateVocab, id, Some(payload.clone()))
            .await
    }

    /// Delete one vocab record
    pub async fn delete_vocab(&self, id: &str) -> Result<Value> {
        self.invoke_by_id(Capability::DeleteVocab, id, None).await
    }

    /// Cards due today, at most `limit`
    pub async fn session_today(&self, limit: u32) -> Result<Value> {
        let mut query = Query::new();
        query.insert("limit".to_string(), json!(limit));
        self.invoke(Capability::SessionToday, OperationCall::query(query))
            .await
    }

    /// Record a review result
    pub async fn submit_review(&self, payload: &Value) -> Result<Value> {
        self.invoke(Capability::SubmitReview, OperationCall::body(payload.clone()))
            .await
    }

    /// Ask the backend to enrich a term
    pub async fn ai_enrich(&self, payload: &Value) -> Result<Value> {
        self.invoke(Capability::AiEnrich, OperationCall::body(payload.clone()))
            .await
    }

    /// Ask the backend to judge an answer
    pub async fn ai_judge(&self, payload: &Value) -> Result<Value> {
        self.invoke(Capability::AiJudge, OperationCall::body(payload.clone()))
            .await
    }

    /// Full backup of the learner's data
    pub async fn sync_export(&self) -> Result<Value> {
        self.invoke(Capability::SyncExport, OperationCall::default())
            .await
    }

    /// Restore a backup
    pub async fn sync_import(&self, payload: &Value) -> Result<Value> {
        self.invoke(Capability::SyncImport, OperationCall::body(payload.clone()))
            .await
    }
}
