use crate::client::ApiClient;
use crate::domain::session::{TokenPair, UserInfo};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const LOGIN_PATH: &str = "/auth/login";
pub const REGISTER_PATH: &str = "/auth/register";
pub const LOGOUT_PATH: &str = "/auth/logout";
pub const PROFILE_PATH: &str = "/auth/profile";

#[derive(Clone, Serialize)]
pub struct SignInReq {
    pub email: String,
    pub password: String,
}

impl SignInReq {
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self { email: email.into(), password: password.into() }
    }
}

impl std::fmt::Debug for SignInReq {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignInReq").field("email", &self.email).field("password", &"<redacted>").finish()
    }
}

#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpReq {
    pub full_name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl std::fmt::Debug for SignUpReq {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignUpReq")
            .field("full_name", &self.full_name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("phone", &self.phone)
            .finish()
    }
}

/// What login returns. Registration returns the same shape, though some
/// backends omit the tokens and expect a separate login.
#[derive(Debug, Clone, Deserialize)]
pub struct SignInRes {
    pub user: UserInfo,
    pub tokens: TokenPair,
}

#[derive(Debug, Clone, Deserialize)]
struct SignUpRes {
    user: Option<UserInfo>,
    tokens: Option<TokenPair>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileReq {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_password: Option<String>,
}

/// Account operations on top of [`ApiClient`]. Successful sign-in and
/// sign-up write the session; logout always ends it.
#[derive(Debug, Clone)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    #[must_use]
    pub const fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Logs in and establishes the session. `remember_me` defaults to the
    /// store's current choice. Failures are left to the caller to present.
    #[tracing::instrument(skip(self, req), fields(email = %req.email), err(level = "warn"))]
    pub async fn sign_in(&self, req: &SignInReq, remember_me: Option<bool>) -> Result<SignInRes> {
        let res: SignInRes =
            self.client.post(LOGIN_PATH).json(req).skip_auth().skip_error_handler().send().await?;

        let remember_me = remember_me.unwrap_or_else(|| self.client.store().snapshot().remember_me);
        self.client.establish_session(res.tokens.clone(), Some(res.user.clone()), remember_me);
        tracing::info!("Signed in");
        Ok(res)
    }

    /// Registers an account. Returns the new user when the backend sends one
    /// back, and signs in directly if it also issued tokens.
    #[tracing::instrument(skip(self, req), fields(email = %req.email), err(level = "warn"))]
    pub async fn sign_up(&self, req: &SignUpReq) -> Result<Option<UserInfo>> {
        let res: SignUpRes = self.client.post(REGISTER_PATH).json(req).skip_auth().send().await?;

        match res.tokens {
            Some(tokens) => {
                let remember_me = self.client.store().snapshot().remember_me;
                self.client.establish_session(tokens, res.user.clone(), remember_me);
                tracing::info!("Registered and signed in");
            }
            None => tracing::info!("Registered, sign-in still required"),
        }
        Ok(res.user)
    }

    /// Tells the backend to revoke the session, then clears it locally
    /// whatever the backend said.
    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn logout(&self) -> Result<()> {
        let outcome = self.client.post(LOGOUT_PATH).send::<Value>().await;
        self.client.end_session();
        outcome.map(drop)
    }

    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn profile(&self) -> Result<UserInfo> {
        let user: UserInfo = self.client.get(PROFILE_PATH).send().await?;
        self.client.store().set_user_info(user.clone());
        Ok(user)
    }

    #[tracing::instrument(skip(self, req), err(level = "warn"))]
    pub async fn update_profile(&self, req: &UpdateProfileReq) -> Result<UserInfo> {
        let user: UserInfo = self.client.put(PROFILE_PATH).json(req).send().await?;
        self.client.store().set_user_info(user.clone());
        Ok(user)
    }
}
