use crate::core::interceptor::extract_error_message;
use crate::core::notifier::ExpiryNotice;
use crate::core::session_store::SessionStore;
use crate::core::transport::Transport;
use crate::domain::request::{ApiRequest, RequestOptions};
use crate::domain::session::TokenPair;
use crate::error::{ApiError, Result, SESSION_EXPIRED_MESSAGE};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use reqwest::Method;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::Instrument;

pub const DEFAULT_REFRESH_PATH: &str = "/auth/refresh-token";
const INVALID_REFRESH_RESPONSE: &str = "Invalid refresh token response";

type PendingRefresh = Shared<BoxFuture<'static, Result<String>>>;

/// Collapses concurrent refresh requests into a single call to the refresh
/// endpoint.
///
/// The first caller spawns the call and parks a handle to it in `pending`;
/// everyone who arrives before it settles awaits the same handle and sees the
/// same outcome. The call runs on its own task, so dropping waiters never
/// stops it. Settling writes the store and empties `pending` in one step, so
/// the next caller after that starts a fresh refresh.
pub struct RefreshCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    transport: Arc<dyn Transport>,
    store: Arc<dyn SessionStore>,
    notice: Arc<ExpiryNotice>,
    refresh_path: String,
    pending: Mutex<Option<PendingRefresh>>,
    calls: AtomicU64,
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("refresh_path", &self.inner.refresh_path)
            .field("pending", &self.is_pending())
            .field("calls", &self.refresh_calls())
            .finish_non_exhaustive()
    }
}

impl RefreshCoordinator {
    #[must_use]
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<dyn SessionStore>,
        notice: Arc<ExpiryNotice>,
        refresh_path: impl Into<String>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                store,
                notice,
                refresh_path: refresh_path.into(),
                pending: Mutex::new(None),
                calls: AtomicU64::new(0),
            }),
        }
    }

    /// True while a refresh call is in flight.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.inner.pending.lock().is_some()
    }

    /// Number of refresh calls actually sent since construction.
    #[must_use]
    pub fn refresh_calls(&self) -> u64 {
        self.inner.calls.load(Ordering::Relaxed)
    }

    /// Returns a fresh access token, joining an in-flight refresh if there is one.
    ///
    /// # Errors
    /// Returns `ApiError::AuthExpired` when there is no refresh token or the
    /// refresh fails. The session has been cleared by the time this returns.
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn refresh(&self) -> Result<String> {
        let pending = {
            let mut slot = self.inner.pending.lock();
            if let Some(existing) = slot.as_ref() {
                tracing::debug!("Joining in-flight token refresh");
                existing.clone()
            } else {
                let Some(refresh_token) = self.inner.store.refresh_token() else {
                    tracing::warn!("No refresh token available, clearing session");
                    self.inner.store.clear();
                    return Err(ApiError::session_expired());
                };
                let shared = Inner::spawn_refresh(&self.inner, refresh_token);
                *slot = Some(shared.clone());
                shared
            }
        };
        pending.await
    }
}

impl Inner {
    /// Runs the refresh as its own task so it settles even if every waiter
    /// is dropped. Callers only share its outcome.
    fn spawn_refresh(this: &Arc<Self>, refresh_token: String) -> PendingRefresh {
        let task = tokio::spawn(Arc::clone(this).run(refresh_token).in_current_span());
        let inner = Arc::clone(this);
        async move {
            task.await.unwrap_or_else(|e| {
                tracing::error!(error = %e, "Token refresh task did not finish, clearing session");
                inner.pending.lock().take();
                inner.store.clear();
                Err(ApiError::session_expired())
            })
        }
        .boxed()
        .shared()
    }

    async fn run(self: Arc<Self>, refresh_token: String) -> Result<String> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        tracing::info!(path = %self.refresh_path, "Refreshing access token");

        let result = match self.request_new_tokens(refresh_token).await {
            Ok(tokens) => {
                let access_token = tokens.access_token.clone();
                self.store.set_tokens(tokens);
                self.notice.session_established();
                tracing::info!("Access token refreshed");
                Ok(access_token)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed, clearing session");
                self.store.clear();
                Err(e)
            }
        };

        self.pending.lock().take();
        result
    }

    async fn request_new_tokens(&self, refresh_token: String) -> Result<TokenPair> {
        let request = ApiRequest::new(Method::POST, self.refresh_path.as_str())
            .with_body(json!({ "refreshToken": refresh_token }))
            .with_options(RequestOptions { skip_auth: true, skip_error_handler: true });

        let response = self.transport.send(&request).await.map_err(|e| {
            tracing::warn!(error = %e, "Refresh request did not complete");
            ApiError::session_expired()
        })?;

        if !response.status.is_success() {
            tracing::debug!(status = %response.status, "Refresh endpoint rejected the token");
            return Err(ApiError::AuthExpired(refresh_failure_message(&response.body)));
        }

        parse_token_pair(&response.body)
    }
}

/// Both tokens must be present non-empty strings; half a pair is a failure.
fn parse_token_pair(body: &Value) -> Result<TokenPair> {
    let field = |name: &str| body.get(name).and_then(Value::as_str).filter(|t| !t.is_empty());
    match (field("accessToken"), field("refreshToken")) {
        (Some(access), Some(refresh)) => Ok(TokenPair::new(access, refresh)),
        _ => Err(ApiError::AuthExpired(INVALID_REFRESH_RESPONSE.to_string())),
    }
}

fn refresh_failure_message(body: &Value) -> String {
    match body {
        Value::String(text) if !text.trim().is_empty() => text.clone(),
        other => extract_error_message(other).unwrap_or_else(|| SESSION_EXPIRED_MESSAGE.to_string()),
    }
}
