#![allow(dead_code)]

use axum::extract::{Json, State};
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use brewdesk_client::ApiClient;
use brewdesk_client::adapters::http::ReqwestTransport;
use brewdesk_client::config::ClientSettings;
use brewdesk_client::core::notifier::{Notice, NoticeKind, Notifier};
use brewdesk_client::core::session_store::{MemorySessionStore, SessionStore};
use brewdesk_client::domain::session::TokenPair;
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

static INIT: Once = Once::new();

pub fn setup_tracing() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "warn".into())
            .add_directive("brewdesk_client=debug".parse().unwrap())
            .add_directive("hyper=warn".parse().unwrap())
            .add_directive("reqwest=warn".parse().unwrap());

        tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().init();
    });
}

pub const PASSWORD: &str = "123456";

/// Server-side view of the one account the mock API knows about.
#[derive(Debug)]
pub struct MockState {
    access_token: Mutex<String>,
    refresh_token: Mutex<String>,
    issued: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub orders_calls: AtomicUsize,
    pub refresh_delay: Mutex<Duration>,
    pub reject_refresh: AtomicBool,
    pub last_profile_update: Mutex<Option<Value>>,
}

impl MockState {
    fn new() -> Self {
        Self {
            access_token: Mutex::new(String::new()),
            refresh_token: Mutex::new(String::new()),
            issued: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            orders_calls: AtomicUsize::new(0),
            refresh_delay: Mutex::new(Duration::ZERO),
            reject_refresh: AtomicBool::new(false),
            last_profile_update: Mutex::new(None),
        }
    }

    /// Mints a new pair and makes it the only valid one.
    pub fn issue_tokens(&self) -> TokenPair {
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let pair = TokenPair::new(format!("access-{n}"), format!("refresh-{n}"));
        *self.access_token.lock() = pair.access_token.clone();
        *self.refresh_token.lock() = pair.refresh_token.clone();
        pair
    }

    /// Invalidates the current access token without touching the refresh token.
    pub fn expire_access_token(&self) {
        *self.access_token.lock() = "expired".to_string();
    }

    pub fn current_access_token(&self) -> String {
        self.access_token.lock().clone()
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let current = self.access_token.lock().clone();
        headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| !current.is_empty() && token == current)
    }
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "message": "jwt expired" }))).into_response()
}

fn profile_json() -> Value {
    json!({ "id": 1, "email": "test@example.com", "username": "test", "fullName": "Test User", "role": "ADMIN" })
}

async fn login(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    if body["email"] != "test@example.com" || body["password"] != PASSWORD {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Invalid credentials." }))).into_response();
    }
    let tokens = state.issue_tokens();
    Json(json!({ "user": profile_json(), "tokens": tokens })).into_response()
}

async fn register(Json(body): Json<Value>) -> Response {
    if body["email"] == "test@example.com" {
        return (StatusCode::BAD_REQUEST, Json(json!({ "message": "Email already in use" }))).into_response();
    }
    Json(json!({ "user": { "id": "u-new", "email": body["email"], "fullName": body["fullName"] } })).into_response()
}

async fn refresh(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);
    let delay = *state.refresh_delay.lock();
    tokio::time::sleep(delay).await;

    let current = state.refresh_token.lock().clone();
    if state.reject_refresh.load(Ordering::SeqCst) || body["refreshToken"].as_str() != Some(current.as_str()) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Refresh token revoked" }))).into_response();
    }
    let tokens = state.issue_tokens();
    Json(json!({ "accessToken": tokens.access_token, "refreshToken": tokens.refresh_token })).into_response()
}

async fn logout(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    Json(json!({ "message": "Logged out successfully" })).into_response()
}

async fn profile(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    Json(json!({ "status": 0, "data": profile_json(), "message": "" })).into_response()
}

async fn update_profile(State(state): State<Arc<MockState>>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    *state.last_profile_update.lock() = Some(body.clone());
    let mut user = profile_json();
    if let (Some(user), Some(changes)) = (user.as_object_mut(), body.as_object()) {
        for (key, value) in changes {
            if key != "currentPassword" && key != "newPassword" {
                user.insert(key.clone(), value.clone());
            }
        }
    }
    Json(json!({ "status": 0, "data": user, "message": "Updated" })).into_response()
}

async fn orders(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.orders_calls.fetch_add(1, Ordering::SeqCst);
    if !state.authorized(&headers) {
        return unauthorized();
    }
    Json(json!({ "status": 0, "data": [{ "id": 1, "total": 45000 }, { "id": 2, "total": 32000 }], "message": "" }))
        .into_response()
}

async fn products() -> Response {
    Json(json!([{ "id": 1, "name": "Latte" }, { "id": 2, "name": "Cold Brew" }])).into_response()
}

async fn envelope_error() -> Response {
    Json(json!({ "status": -1, "data": null, "message": "Out of stock" })).into_response()
}

async fn nested_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": { "message": "Database unavailable" } }))).into_response()
}

async fn string_error() -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": "Missing field: name" }))).into_response()
}

async fn plain_error() -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, "Service Unavailable").into_response()
}

async fn slow() -> Response {
    tokio::time::sleep(Duration::from_secs(2)).await;
    Json(json!({ "ok": true })).into_response()
}

fn router(state: Arc<MockState>) -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/refresh-token", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/auth/profile", get(profile).put(update_profile))
        .route("/orders", get(orders))
        .route("/products", get(products))
        .route("/errors/envelope", get(envelope_error))
        .route("/errors/nested", get(nested_error))
        .route("/errors/string", get(string_error))
        .route("/errors/plain", get(plain_error))
        .route("/slow", get(slow))
        .with_state(state)
}

/// Notifier that counts what would have been shown to the user.
#[derive(Debug, Default)]
pub struct CollectingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl CollectingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }

    pub fn count(&self, kind: NoticeKind) -> usize {
        self.notices.lock().iter().filter(|n| n.kind == kind).count()
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }
}

pub struct TestApp {
    pub server_url: String,
    pub state: Arc<MockState>,
    pub store: Arc<MemorySessionStore>,
    pub notifier: Arc<CollectingNotifier>,
    pub client: ApiClient,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(|settings| settings).await
    }

    pub async fn spawn_with(configure: impl FnOnce(ClientSettings) -> ClientSettings) -> Self {
        setup_tracing();
        let state = Arc::new(MockState::new());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let server_url = format!("http://{}", listener.local_addr().unwrap());
        let app = router(Arc::clone(&state));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let settings = configure(ClientSettings::new(server_url.clone()));
        let store = Arc::new(MemorySessionStore::new());
        let notifier = Arc::new(CollectingNotifier::default());
        let client = Self::client_for(&settings, Arc::clone(&store) as Arc<dyn SessionStore>, &notifier);

        Self { server_url, state, store, notifier, client }
    }

    pub fn client_for(
        settings: &ClientSettings,
        store: Arc<dyn SessionStore>,
        notifier: &Arc<CollectingNotifier>,
    ) -> ApiClient {
        let transport = Arc::new(ReqwestTransport::new(settings).unwrap());
        ApiClient::builder(transport, store)
            .with_notifier(Arc::clone(notifier) as Arc<dyn Notifier>)
            .with_refresh_path(settings.refresh_path.clone())
            .build()
    }

    /// Issues tokens on the server and hands them to the client as if it had logged in.
    pub fn login(&self) -> TokenPair {
        let tokens = self.state.issue_tokens();
        self.client.establish_session(tokens.clone(), None, true);
        tokens
    }

    pub fn refresh_calls(&self) -> usize {
        self.state.refresh_calls.load(Ordering::SeqCst)
    }
}
