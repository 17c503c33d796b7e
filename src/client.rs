//! The authenticated API client.
//!
//! Every call runs through the same pipeline: attach the bearer token, send,
//! then classify the outcome.
//!
//! - 2xx: unwrap the status envelope, or fail with `Business` if it reports an error.
//! - no response: fail with `Transport`.
//! - 401 on an authenticated request that has not been replayed yet, with a
//!   refresh token on hand: refresh (shared with any concurrent 401s), then
//!   replay once with the new token.
//! - 401 otherwise: clear the session and fail with `AuthExpired`.
//! - anything else: fail with `Http`, carrying the server's message.

use crate::adapters::http::ReqwestTransport;
use crate::config::ClientSettings;
use crate::core::interceptor::{self, error_message_or_default};
use crate::core::notifier::{ExpiryNotice, Notice, NoticeEvent, NoticeKind, Notifier, TracingNotifier};
use crate::core::refresh::{DEFAULT_REFRESH_PATH, RefreshCoordinator};
use crate::core::session_store::SessionStore;
use crate::core::transport::{Transport, TransportError};
use crate::domain::request::{ApiRequest, RequestOptions};
use crate::domain::session::{TokenPair, UserInfo};
use crate::error::{ApiError, Result};
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

/// Cheap to clone; clones share the session, the pending refresh and the
/// expiry notice state.
#[derive(Debug, Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

#[derive(Debug)]
struct ClientInner {
    transport: Arc<dyn Transport>,
    store: Arc<dyn SessionStore>,
    refresh: RefreshCoordinator,
    notifier: Arc<dyn Notifier>,
    notice: Arc<ExpiryNotice>,
}

#[derive(Debug)]
pub struct ApiClientBuilder {
    transport: Arc<dyn Transport>,
    store: Arc<dyn SessionStore>,
    notifier: Arc<dyn Notifier>,
    refresh_path: String,
}

impl ApiClientBuilder {
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    #[must_use]
    pub fn with_refresh_path(mut self, refresh_path: impl Into<String>) -> Self {
        self.refresh_path = refresh_path.into();
        self
    }

    #[must_use]
    pub fn build(self) -> ApiClient {
        let notice = Arc::new(ExpiryNotice::new());
        let refresh = RefreshCoordinator::new(
            Arc::clone(&self.transport),
            Arc::clone(&self.store),
            Arc::clone(&notice),
            self.refresh_path,
        );
        ApiClient {
            inner: Arc::new(ClientInner {
                transport: self.transport,
                store: self.store,
                refresh,
                notifier: self.notifier,
                notice,
            }),
        }
    }
}

impl ApiClient {
    #[must_use]
    pub fn builder(transport: Arc<dyn Transport>, store: Arc<dyn SessionStore>) -> ApiClientBuilder {
        ApiClientBuilder {
            transport,
            store,
            notifier: Arc::new(TracingNotifier),
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
        }
    }

    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, store: Arc<dyn SessionStore>) -> Self {
        Self::builder(transport, store).build()
    }

    /// Builds a client over HTTP with the default notifier.
    ///
    /// # Errors
    /// Returns `TransportError` if the HTTP client cannot be constructed.
    pub fn from_settings(
        settings: &ClientSettings,
        store: Arc<dyn SessionStore>,
    ) -> std::result::Result<Self, TransportError> {
        let transport = Arc::new(ReqwestTransport::new(settings)?);
        Ok(Self::builder(transport, store).with_refresh_path(settings.refresh_path.clone()).build())
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.inner.store
    }

    #[must_use]
    pub fn refresh_coordinator(&self) -> &RefreshCoordinator {
        &self.inner.refresh
    }

    #[must_use]
    pub fn expiry_notice(&self) -> &ExpiryNotice {
        &self.inner.notice
    }

    /// Records a new session (login or registration) and re-arms the expiry notice.
    pub fn establish_session(&self, tokens: TokenPair, user_info: Option<UserInfo>, remember_me: bool) {
        let store = &self.inner.store;
        store.set_remember_me(remember_me);
        store.set_tokens(tokens);
        if let Some(user_info) = user_info {
            store.set_user_info(user_info);
        }
        self.inner.notice.session_established();
        tracing::info!(remember_me, "Session established");
    }

    /// Explicit logout: forgets identity and tokens.
    pub fn end_session(&self) {
        self.inner.store.clear();
        tracing::info!("Session ended");
    }

    pub fn get(&self, path: impl Into<String>) -> RequestBuilder<'_> {
        self.verb(Method::GET, path)
    }

    pub fn post(&self, path: impl Into<String>) -> RequestBuilder<'_> {
        self.verb(Method::POST, path)
    }

    pub fn put(&self, path: impl Into<String>) -> RequestBuilder<'_> {
        self.verb(Method::PUT, path)
    }

    pub fn patch(&self, path: impl Into<String>) -> RequestBuilder<'_> {
        self.verb(Method::PATCH, path)
    }

    pub fn delete(&self, path: impl Into<String>) -> RequestBuilder<'_> {
        self.verb(Method::DELETE, path)
    }

    fn verb(&self, method: Method, path: impl Into<String>) -> RequestBuilder<'_> {
        RequestBuilder { client: self, request: ApiRequest::new(method, path), encode_error: None }
    }

    /// Sends a prepared request and decodes the unwrapped payload as `T`.
    ///
    /// # Errors
    /// Any of the `ApiError` kinds; see the module docs for which outcome maps to which.
    pub async fn request<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let payload = self.execute(request).await?;
        serde_json::from_value(payload).map_err(|e| {
            tracing::debug!(error = %e, "Response payload did not match the expected type");
            ApiError::Decode(e.to_string())
        })
    }

    /// Sends a prepared request and returns the unwrapped payload as JSON.
    ///
    /// # Errors
    /// Any of the `ApiError` kinds except `Decode`.
    pub async fn execute(&self, request: ApiRequest) -> Result<Value> {
        let span = tracing::info_span!(
            "api_request",
            request_id = %Uuid::new_v4(),
            method = %request.method,
            path = %request.path,
        );
        self.run_pipeline(request).instrument(span).await
    }

    async fn run_pipeline(&self, mut request: ApiRequest) -> Result<Value> {
        interceptor::authorize(&mut request, self.inner.store.as_ref());

        loop {
            let response = match self.inner.transport.send(&request).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!(error = %e, "No response received");
                    let err = ApiError::Transport(e.to_string());
                    self.report(&request, &err);
                    return Err(err);
                }
            };

            let status = response.status;
            if status.is_success() {
                return interceptor::unwrap_payload(response.body).inspect_err(|e| self.report(&request, e));
            }

            if status == StatusCode::UNAUTHORIZED && !request.options.skip_auth {
                if !request.is_retry() && self.inner.store.refresh_token().is_some() {
                    match self.inner.refresh.refresh().await {
                        Ok(token) => {
                            tracing::debug!("Replaying request with refreshed token");
                            request.mark_retried();
                            request.set_bearer(&token);
                            continue;
                        }
                        Err(e) => {
                            self.report_expired(&request, &e);
                            return Err(e);
                        }
                    }
                }

                tracing::info!(retried = request.is_retry(), "Unauthorized with no way to refresh, clearing session");
                self.inner.store.clear();
                let err = ApiError::session_expired();
                self.report_expired(&request, &err);
                return Err(err);
            }

            let err = ApiError::Http { status, message: error_message_or_default(&response.body) };
            tracing::debug!(status = %status, message = %err.message(), "Request failed");
            self.report(&request, &err);
            return Err(err);
        }
    }

    fn report(&self, request: &ApiRequest, error: &ApiError) {
        if request.options.skip_error_handler {
            return;
        }
        let kind = match error {
            ApiError::Transport(_) => NoticeKind::Transport,
            ApiError::Business(_) => NoticeKind::Business,
            ApiError::Http { .. } => NoticeKind::Http,
            ApiError::AuthExpired(_) => NoticeKind::SessionExpired,
            ApiError::Encode(_) | ApiError::Decode(_) => return,
        };
        self.inner.notifier.notify(Notice::new(kind, error.message()));
    }

    /// Session expiry is announced once per episode, however many requests fail with it.
    fn report_expired(&self, request: &ApiRequest, error: &ApiError) {
        if request.options.skip_error_handler {
            return;
        }
        if self.inner.notice.apply(NoticeEvent::SessionExpired) {
            self.inner.notifier.notify(Notice::new(NoticeKind::SessionExpired, error.message()));
        }
    }
}

/// A request being assembled by one of the verb methods.
#[derive(Debug)]
#[must_use = "a request does nothing until it is sent"]
pub struct RequestBuilder<'a> {
    client: &'a ApiClient,
    request: ApiRequest,
    encode_error: Option<String>,
}

impl RequestBuilder<'_> {
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Self {
        match serde_json::to_value(body) {
            Ok(value) => self.request.body = Some(value),
            Err(e) => self.encode_error = Some(e.to_string()),
        }
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.request.query.push((key.into(), value.to_string()));
        self
    }

    /// Appends every field of `params` as a query parameter. `None` fields are
    /// skipped; `params` must serialize to a JSON object.
    pub fn query_params<Q: Serialize + ?Sized>(mut self, params: &Q) -> Self {
        match serde_json::to_value(params) {
            Ok(Value::Object(fields)) => {
                for (key, value) in fields {
                    match value {
                        Value::Null => {}
                        Value::String(text) => self.request.query.push((key, text)),
                        other => self.request.query.push((key, other.to_string())),
                    }
                }
            }
            Ok(other) => self.encode_error = Some(format!("query parameters must be an object, got {other}")),
            Err(e) => self.encode_error = Some(e.to_string()),
        }
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.request.headers.insert(name, value);
        self
    }

    pub fn options(mut self, options: RequestOptions) -> Self {
        self.request.options = options;
        self
    }

    pub fn skip_auth(mut self) -> Self {
        self.request.options.skip_auth = true;
        self
    }

    pub fn skip_error_handler(mut self) -> Self {
        self.request.options.skip_error_handler = true;
        self
    }

    /// Sends the request and decodes the unwrapped payload as `T`.
    ///
    /// # Errors
    /// `ApiError::Encode` if the body could not be serialized, otherwise as
    /// [`ApiClient::request`].
    pub async fn send<T: DeserializeOwned>(self) -> Result<T> {
        if let Some(e) = self.encode_error {
            return Err(ApiError::Encode(e));
        }
        self.client.request(self.request).await
    }
}
