use crate::config::ClientSettings;
use crate::core::transport::{Transport, TransportError};
use crate::domain::request::{ApiRequest, ApiResponse};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::Value;

/// HTTP transport over a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    /// # Errors
    /// Returns `TransportError::Other` if the TLS backend cannot be initialised.
    pub fn new(settings: &ClientSettings) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json;charset=utf-8"));

        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .cookie_store(true)
            .default_headers(headers)
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;

        Ok(Self { http, base_url: settings.base_url.trim_end_matches('/').to_string() })
    }

    /// Use a preconfigured HTTP client (shared pool, proxies, custom TLS).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let mut builder = self
            .http
            .request(request.method.clone(), self.url(&request.path))
            .headers(request.headers.clone());
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(map_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_error)?;

        tracing::debug!(status = %status, bytes = body.len(), "Response received");
        Ok(ApiResponse::new(status, decode_body(&body)))
    }
}

/// Empty bodies become `null`; bodies that aren't JSON are kept as text.
fn decode_body(body: &Bytes) -> Value {
    if body.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(body).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned()))
}

fn map_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_connect() {
        TransportError::Connect(e.to_string())
    } else if e.is_builder() {
        TransportError::InvalidRequest(e.to_string())
    } else {
        TransportError::Other(e.to_string())
    }
}
