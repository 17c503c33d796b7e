use crate::client::ApiClient;
use crate::core::notifier::{Notice, NoticeKind, Notifier};
use crate::core::refresh::DEFAULT_REFRESH_PATH;
use crate::core::session_store::{MemorySessionStore, SessionStore};
use crate::core::transport::{Transport, TransportError};
use crate::domain::request::{ApiRequest, ApiResponse};
use crate::domain::session::TokenPair;
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::StatusCode;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Notify;

type Handler = Arc<dyn Fn(&ApiRequest) -> Result<ApiResponse, TransportError> + Send + Sync>;

/// In-memory transport answering from per-path handlers and recording every request.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    routes: Mutex<HashMap<String, Handler>>,
    refresh_gate: Mutex<Option<Arc<Notify>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl std::fmt::Debug for ScriptedTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedTransport").field("requests", &self.requests.lock().len()).finish()
    }
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on(
        &self,
        path: &str,
        handler: impl Fn(&ApiRequest) -> Result<ApiResponse, TransportError> + Send + Sync + 'static,
    ) {
        self.routes.lock().insert(path.to_string(), Arc::new(handler));
    }

    pub(crate) fn on_refresh(
        &self,
        handler: impl Fn(&ApiRequest) -> Result<ApiResponse, TransportError> + Send + Sync + 'static,
    ) {
        self.on(DEFAULT_REFRESH_PATH, handler);
    }

    /// Holds refresh calls until the returned `Notify` is signalled.
    pub(crate) fn gate_refresh(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.refresh_gate.lock() = Some(Arc::clone(&gate));
        gate
    }

    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    pub(crate) fn requests_to(&self, path: &str) -> Vec<ApiRequest> {
        self.requests.lock().iter().filter(|r| r.path == path).cloned().collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        self.requests.lock().push(request.clone());

        if request.path == DEFAULT_REFRESH_PATH {
            let gate = self.refresh_gate.lock().clone();
            if let Some(gate) = gate {
                gate.notified().await;
            }
        }

        let handler = self.routes.lock().get(&request.path).cloned();
        match handler {
            Some(handler) => handler(request),
            None => Ok(ApiResponse::new(StatusCode::NOT_FOUND, json!({ "message": "Not found" }))),
        }
    }
}

/// Notifier that keeps every notice for later assertions.
#[derive(Debug, Default)]
pub(crate) struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub(crate) fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }

    pub(crate) fn count(&self, kind: NoticeKind) -> usize {
        self.notices.lock().iter().filter(|n| n.kind == kind).count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }
}

/// Logged-in client over a fresh [`ScriptedTransport`], for service tests.
pub(crate) fn scripted_client() -> (Arc<ScriptedTransport>, Arc<RecordingNotifier>, ApiClient) {
    let transport = Arc::new(ScriptedTransport::new());
    let store = Arc::new(MemorySessionStore::new());
    store.set_tokens(TokenPair::new("A1", "R1"));
    let notifier = Arc::new(RecordingNotifier::default());
    let client = ApiClient::builder(Arc::clone(&transport) as Arc<dyn Transport>, store as Arc<dyn SessionStore>)
        .with_notifier(Arc::clone(&notifier) as Arc<dyn Notifier>)
        .build();
    (transport, notifier, client)
}
