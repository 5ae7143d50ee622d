//! Transport to the learning backend
//!
//! [`Transport`] is the seam the invocation facade talks through; the
//! production implementation is [`HttpTransport`].

mod http;
mod endpoint;

pub use self::http::HttpTransport;
pub use self::endpoint::{build_url, normalize_base_url};

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

use crate::Result;
use crate::catalog::HttpMethod;
use crate::failsafe::{DEFAULT_RETRY_DELAY, RetryPolicy};

/// Query parameters; `null` and `""` values are dropped, arrays repeat the key
pub type Query = Map<String, Value>;

/// Transport trait for backend communication
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute a request, retrying per its policy
    async fn execute(&self, request: ApiRequest) -> Result<RequestOutcome>;
}

/// One logical backend call
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// Backend base URL
    pub base_url: String,
    /// Path after parameter substitution
    pub path: String,
    /// HTTP method
    pub method: HttpMethod,
    /// Query parameters
    pub query: Query,
    /// JSON body
    pub body: Option<Value>,
    /// Extra headers; these win over defaults
    pub headers: Vec<(String, String)>,
    /// Extra attempts after a transient failure
    pub retries: u32,
    /// Linear backoff unit
    pub retry_delay: Duration,
    /// Caller-driven cancellation
    pub cancel: Option<CancellationToken>,
}

impl ApiRequest {
    /// A request with no query, body or retries
    pub fn new(base_url: impl Into<String>, method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            path: path.into(),
            method,
            query: Query::new(),
            body: None,
            headers: Vec::new(),
            retries: 0,
            retry_delay: DEFAULT_RETRY_DELAY,
            cancel: None,
        }
    }

    /// Set query parameters
    #[must_use]
    pub fn with_query(mut self, query: Query) -> Self {
        self.query = query;
        self
    }

    /// Set the JSON body
    #[must_use]
    pub fn with_body(mut self, body: Option<Value>) -> Self {
        self.body = body;
        self
    }

    /// Add a header
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Apply a retry policy
    #[must_use]
    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retries = policy.retries;
        self.retry_delay = policy.delay;
        self
    }

    /// Attach a cancellation token
    #[must_use]
    pub fn with_cancel(mut self, cancel: Option<CancellationToken>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Retry policy carried by this request
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            retries: self.retries,
            delay: self.retry_delay,
        }
    }

    /// Fully built URL
    pub fn url(&self) -> Result<String> {
        build_url(&self.base_url, &self.path, &self.query)
    }
}

/// A successful backend response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestOutcome {
    /// HTTP status
    pub status: u16,
    /// Parsed body: JSON, raw text when not JSON, `None` when empty
    pub data: Option<Value>,
    /// Requested URL
    pub url: String,
    /// Request method
    pub method: HttpMethod,
}

impl RequestOutcome {
    /// Response data, `null` when the body was empty
    #[must_use]
    pub fn into_data(self) -> Value {
        self.data.unwrap_or(Value::Null)
    }
}

/// Parse a response body: empty is `None`, JSON when it parses, raw text
/// otherwise.
#[must_use]
pub fn parse_body(text: &str) -> Option<Value> {
    if text.is_empty() {
        return None;
    }
    Some(serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body(""), None);
        assert_eq!(parse_body("{\"ok\":true}"), Some(json!({"ok": true})));
        assert_eq!(parse_body("OK"), Some(json!("OK")));
        assert_eq!(parse_body("null"), Some(Value::Null));
    }

    #[test]
    fn test_request_builder() {
        let request = ApiRequest::new("http://api.test/", HttpMethod::Post, "vocab")
            .with_body(Some(json!({"term": "x"})))
            .with_header("X-Trace", "1")
            .with_retry(RetryPolicy {
                retries: 2,
                delay: Duration::from_millis(10),
            });

        assert_eq!(request.url().unwrap(), "http://api.test/vocab");
        assert_eq!(request.retry_policy().max_attempts(), 3);
        assert_eq!(request.headers, vec![("X-Trace".to_string(), "1".to_string())]);
    }
}
