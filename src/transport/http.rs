//! HTTP transport implementation
//!
//! One [`ApiRequest`] becomes up to `retries + 1` HTTP attempts:
//! 1. Build the URL (base + path + query)
//! 2. Layer headers: `Content-Type` when a body exists, configured
//!    defaults, then caller headers
//! 3. Send, read the body as text, parse JSON with a raw-text fallback
//! 4. Classify non-2xx as [`ApiError`]; retry network failures and 5xx

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{ApiRequest, RequestOutcome, Transport, parse_body};
use crate::config::RequestConfig;
use crate::failsafe::with_retry;
use crate::{ApiError, Error, Result};

/// HTTP transport for the learning backend
pub struct HttpTransport {
    /// HTTP client
    client: Client,
    /// Headers sent with every request
    default_headers: Vec<(String, String)>,
}

impl HttpTransport {
    /// Create a new HTTP transport with a per-attempt timeout
    pub fn new(timeout: Duration, default_headers: HashMap<String, String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(concat!("vocab-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Transport(e.to_string()))?;

        let mut default_headers: Vec<(String, String)> = default_headers.into_iter().collect();
        default_headers.sort();

        Ok(Self {
            client,
            default_headers,
        })
    }

    /// Create from config
    pub fn from_config(config: &RequestConfig) -> Result<Self> {
        Self::new(config.timeout, config.headers.clone())
    }

    fn build_headers(&self, request: &ApiRequest) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if request.body.is_some() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        for (name, value) in self.default_headers.iter().chain(&request.headers) {
            let header_name: HeaderName = name
                .parse()
                .map_err(|_| Error::Config(format!("Invalid header name '{name}'")))?;
            let header_value: HeaderValue = value
                .parse()
                .map_err(|_| Error::Config(format!("Invalid value for header '{name}'")))?;
            headers.insert(header_name, header_value);
        }

        Ok(headers)
    }

    /// One HTTP attempt
    async fn attempt(
        &self,
        request: &ApiRequest,
        url: &str,
        headers: HeaderMap,
        body: Option<&str>,
    ) -> Result<RequestOutcome> {
        let mut builder = self
            .client
            .request(request.method.into(), url)
            .headers(headers);
        if let Some(body) = body {
            builder = builder.body(body.to_string());
        }

        let response = builder.send().await.map_err(|e| classify(&e))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| classify(&e))?;
        let data = parse_body(&text);

        debug!(method = %request.method, url, status = status.as_u16(), "Response received");

        if !status.is_success() {
            return Err(Error::Api(ApiError::from_response(
                status.as_u16(),
                data,
                url.to_string(),
                request.method,
            )));
        }

        Ok(RequestOutcome {
            status: status.as_u16(),
            data,
            url: url.to_string(),
            method: request.method,
        })
    }

    async fn attempt_cancellable(
        &self,
        request: &ApiRequest,
        url: &str,
        headers: HeaderMap,
        body: Option<&str>,
        cancel: Option<&CancellationToken>,
    ) -> Result<RequestOutcome> {
        match cancel {
            Some(token) => {
                tokio::select! {
                    () = token.cancelled() => Err(Error::Cancelled),
                    result = self.attempt(request, url, headers, body) => result,
                }
            }
            None => self.attempt(request, url, headers, body).await,
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: ApiRequest) -> Result<RequestOutcome> {
        let url = request.url()?;
        let headers = self.build_headers(&request)?;
        let body = request.body.as_ref().map(serde_json::to_string).transpose()?;
        let policy = request.retry_policy();
        let cancel = request.cancel.as_ref();
        let name = format!("{} {}", request.method, request.path);

        if cancel.is_some_and(CancellationToken::is_cancelled) {
            return Err(Error::Cancelled);
        }

        with_retry(&policy, &name, cancel, |attempt| {
            debug!(method = %request.method, url = %url, attempt, "Sending request");
            self.attempt_cancellable(&request, &url, headers.clone(), body.as_deref(), cancel)
        })
        .await
    }
}

/// Map a reqwest failure to a transport-level error
fn classify(error: &reqwest::Error) -> Error {
    if error.is_timeout() {
        Error::Timeout(error.to_string())
    } else {
        Error::Transport(error.to_string())
    }
}
