use brewdesk_client::ApiError;
use brewdesk_client::adapters::file_store::{DEFAULT_NAMESPACE, FileSessionStore};
use brewdesk_client::config::ClientSettings;
use brewdesk_client::core::notifier::NoticeKind;
use brewdesk_client::core::session_store::SessionStore;
use brewdesk_client::services::auth_service::{AuthService, SignInReq, SignUpReq, UpdateProfileReq};
use reqwest::StatusCode;
use std::sync::Arc;

mod common;

#[tokio::test]
async fn test_sign_in_then_profile() {
    let app = common::TestApp::spawn().await;
    let auth = AuthService::new(app.client.clone());

    let res = auth.sign_in(&SignInReq::new("test@example.com", common::PASSWORD), None).await.unwrap();
    assert_eq!(res.tokens.access_token, app.state.current_access_token());

    let user = auth.profile().await.unwrap();
    assert_eq!(user.full_name.as_deref(), Some("Test User"));
    assert_eq!(user.role.as_deref(), Some("ADMIN"));
    assert!(app.store.snapshot().is_authenticated());
}

#[tokio::test]
async fn test_bad_credentials_are_not_notified() {
    let app = common::TestApp::spawn().await;
    let auth = AuthService::new(app.client.clone());

    let err = auth.sign_in(&SignInReq::new("test@example.com", "wrong"), None).await.unwrap_err();

    assert_eq!(err, ApiError::Http { status: StatusCode::UNAUTHORIZED, message: "Invalid credentials.".into() });
    assert_eq!(app.refresh_calls(), 0);
    assert!(app.notifier.notices().is_empty());
}

#[tokio::test]
async fn test_sign_up_conflict_is_notified() {
    let app = common::TestApp::spawn().await;
    let auth = AuthService::new(app.client.clone());
    let req = SignUpReq {
        full_name: "Dup".into(),
        email: "test@example.com".into(),
        password: common::PASSWORD.into(),
        phone: None,
    };

    let err = auth.sign_up(&req).await.unwrap_err();

    assert_eq!(err.message(), "Email already in use");
    assert_eq!(app.notifier.count(NoticeKind::Http), 1);
}

#[tokio::test]
async fn test_update_profile_after_token_expiry() {
    let app = common::TestApp::spawn().await;
    let auth = AuthService::new(app.client.clone());
    auth.sign_in(&SignInReq::new("test@example.com", common::PASSWORD), None).await.unwrap();
    app.state.expire_access_token();

    let req = UpdateProfileReq { phone: Some("0911222333".into()), ..UpdateProfileReq::default() };
    let user = auth.update_profile(&req).await.unwrap();

    assert_eq!(user.phone.as_deref(), Some("0911222333"));
    assert_eq!(app.refresh_calls(), 1);
    assert_eq!(app.store.snapshot().user_info.unwrap().phone.as_deref(), Some("0911222333"));
}

#[tokio::test]
async fn test_logout_clears_session() {
    let app = common::TestApp::spawn().await;
    let auth = AuthService::new(app.client.clone());
    auth.sign_in(&SignInReq::new("test@example.com", common::PASSWORD), None).await.unwrap();

    auth.logout().await.unwrap();

    assert!(!app.store.snapshot().is_authenticated());
    assert!(app.store.snapshot().user_info.is_none());
}

#[tokio::test]
async fn test_remembered_session_is_restored_from_file() {
    let app = common::TestApp::spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let settings = ClientSettings::new(app.server_url.clone());
    let notifier = Arc::new(common::CollectingNotifier::default());

    {
        let store = Arc::new(FileSessionStore::open(&path, DEFAULT_NAMESPACE).unwrap()) as Arc<dyn SessionStore>;
        let auth = AuthService::new(common::TestApp::client_for(&settings, store, &notifier));
        auth.sign_in(&SignInReq::new("test@example.com", common::PASSWORD), Some(true)).await.unwrap();
    }

    let store = Arc::new(FileSessionStore::open(&path, DEFAULT_NAMESPACE).unwrap()) as Arc<dyn SessionStore>;
    let restored = common::TestApp::client_for(&settings, store, &notifier);
    let orders: serde_json::Value = restored.get("/orders").send().await.unwrap();

    assert_eq!(orders.as_array().map(Vec::len), Some(2));
    assert_eq!(app.refresh_calls(), 0);
}

#[tokio::test]
async fn test_unremembered_session_is_not_restored() {
    let app = common::TestApp::spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let settings = ClientSettings::new(app.server_url.clone());
    let notifier = Arc::new(common::CollectingNotifier::default());

    {
        let store = Arc::new(FileSessionStore::open(&path, DEFAULT_NAMESPACE).unwrap()) as Arc<dyn SessionStore>;
        let auth = AuthService::new(common::TestApp::client_for(&settings, store, &notifier));
        auth.sign_in(&SignInReq::new("test@example.com", common::PASSWORD), Some(false)).await.unwrap();
        assert!(auth.client().store().snapshot().is_authenticated());
    }

    let store = FileSessionStore::open(&path, DEFAULT_NAMESPACE).unwrap();
    assert!(!store.snapshot().is_authenticated());
    assert!(!store.snapshot().remember_me);
}
