#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::todo)]
#![warn(clippy::panic)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(unreachable_pub)]
#![warn(missing_debug_implementations)]
#![warn(unused_qualifications)]
#![deny(unused_must_use)]

use brewdesk_client::adapters::file_store::FileSessionStore;
use brewdesk_client::config::{ClientSettings, Config, SmokeConfig};
use brewdesk_client::core::session_store::{MemorySessionStore, SessionStore};
use brewdesk_client::services::auth_service::{AuthService, SignInReq, SignUpReq};
use brewdesk_client::{ApiClient, ApiError, telemetry};
use serde_json::Value;
use std::sync::Arc;
use tracing::Instrument;

/// Signs in against a live API, calls a few endpoints with the issued token
/// and forces one token refresh. Exits non-zero if any step fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load();
    telemetry::init_telemetry(&config.telemetry)?;

    let store: Arc<dyn SessionStore> = match &config.session.session_file {
        Some(path) => Arc::new(FileSessionStore::open(path, config.session.namespace.clone())?),
        None => Arc::new(MemorySessionStore::new()),
    };
    store.set_remember_me(config.session.remember_me);

    let settings = ClientSettings::from(&config.api);
    tracing::info!(base_url = %settings.base_url, email = %config.smoke.email, "Starting auth check");
    let client = ApiClient::from_settings(&settings, store)?;
    let auth = AuthService::new(client.clone());

    sign_in(&auth, &config.smoke).instrument(tracing::info_span!("sign_in")).await?;

    let mut failures = 0_usize;

    match auth.profile().await {
        Ok(user) => tracing::info!(id = %user.id, email = %user.email, "Profile OK"),
        Err(e) => {
            tracing::error!(error = %e, "Profile failed");
            failures += 1;
        }
    }

    for endpoint in &config.smoke.endpoints {
        match client.get(endpoint.as_str()).send::<Value>().await {
            Ok(payload) => tracing::info!(endpoint = %endpoint, items = item_count(&payload), "Endpoint OK"),
            Err(e) => {
                tracing::error!(endpoint = %endpoint, error = %e, "Endpoint failed");
                failures += 1;
            }
        }
    }

    match client.refresh_coordinator().refresh().await {
        Ok(_) => tracing::info!("Refresh OK"),
        Err(e) => {
            tracing::error!(error = %e, "Refresh failed");
            failures += 1;
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} check(s) failed");
    }
    tracing::info!("All checks passed");
    Ok(())
}

async fn sign_in(auth: &AuthService, smoke: &SmokeConfig) -> anyhow::Result<()> {
    let req = SignInReq::new(smoke.email.clone(), smoke.password.clone());
    match auth.sign_in(&req, None).await {
        Ok(_) => return Ok(()),
        Err(ApiError::Http { status, .. }) if smoke.register_if_missing && status == reqwest::StatusCode::UNAUTHORIZED => {
            tracing::info!("Login rejected, registering the account");
        }
        Err(e) => anyhow::bail!("login failed: {e}"),
    }

    let registration = SignUpReq {
        full_name: "Demo User".to_string(),
        email: smoke.email.clone(),
        password: smoke.password.clone(),
        phone: Some("0900000000".to_string()),
    };
    auth.sign_up(&registration).await?;
    if !auth.client().store().snapshot().is_authenticated() {
        auth.sign_in(&req, None).await?;
    }
    Ok(())
}

fn item_count(payload: &Value) -> usize {
    match payload {
        Value::Array(items) => items.len(),
        Value::Null => 0,
        _ => 1,
    }
}
