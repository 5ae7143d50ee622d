//! Error types for the vocab client

use std::fmt;
use std::io;

use serde_json::Value;
use thiserror::Error;

use crate::capability::Capability;
use crate::catalog::HttpMethod;

/// Result type alias for the vocab client
pub type Result<T> = std::result::Result<T, Error>;

/// Vocab client errors
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network-level failure (connection refused, reset, DNS, ...)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Request exceeded its timeout
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Request aborted by the caller's cancellation token
    #[error("Request cancelled")]
    Cancelled,

    /// Backend answered with a non-success status
    #[error("{0}")]
    Api(ApiError),

    /// The capability was never matched to a backend operation
    #[error("Backend does not expose operation '{0}'")]
    CapabilityUnavailable(Capability),

    /// The API description document lacks the expected structure
    #[error("Invalid API description: {0}")]
    InvalidDocument(String),

    /// No catalog operation carries the requested id
    #[error("Operation not found: {0}")]
    OperationNotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Whether the retry loop may attempt the request again.
    ///
    /// Network failures, timeouts and 5xx responses are transient; 4xx
    /// responses and cancellations are final.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout(_) => true,
            Self::Api(api) => api.status >= 500,
            _ => false,
        }
    }

    /// Whether the failure came from caller cancellation
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// HTTP status of a protocol failure, if any
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api(api) => Some(api.status),
            _ => None,
        }
    }

    /// The underlying [`ApiError`], if this is a protocol failure
    #[must_use]
    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(api) => Some(api),
            _ => None,
        }
    }
}

/// A non-2xx response, normalized
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    /// Human-readable message extracted from the body
    pub message: String,
    /// HTTP status code
    pub status: u16,
    /// Parsed error body (JSON, raw text, or `None` when empty)
    pub data: Option<Value>,
    /// Requested URL
    pub url: String,
    /// Request method
    pub method: HttpMethod,
}

impl ApiError {
    /// Build an error from a failed response, extracting its message
    #[must_use]
    pub fn from_response(status: u16, data: Option<Value>, url: String, method: HttpMethod) -> Self {
        let message = extract_error_message(data.as_ref(), status);
        Self {
            message,
            status,
            data,
            url,
            method,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ApiError {}

/// Pick the most useful message out of an error body.
///
/// Priority: plain string body, string `detail`, list `detail` (as JSON),
/// string `message`, then `HTTP <status>`.
#[must_use]
pub fn extract_error_message(data: Option<&Value>, status: u16) -> String {
    let fallback = || format!("HTTP {status}");
    let Some(data) = data else {
        return fallback();
    };

    match data {
        Value::String(s) if !s.is_empty() => s.clone(),
        Value::Object(map) => match (map.get("detail"), map.get("message")) {
            (Some(Value::String(detail)), _) => detail.clone(),
            (Some(detail @ Value::Array(_)), _) => detail.to_string(),
            (_, Some(Value::String(message))) => message.clone(),
            _ => fallback(),
        },
        _ => fallback(),
    }
}
