use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Both halves of a freshly minted credential set.
///
/// Login, registration and a successful refresh all produce one of these; a
/// session is never written from half a pair.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenPair {
    #[must_use]
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self { access_token: access_token.into(), refresh_token: refresh_token.into() }
    }
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// Tokens as held by the store. Both are absent while logged out.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserToken {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl UserToken {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

impl From<TokenPair> for UserToken {
    fn from(pair: TokenPair) -> Self {
        Self { access_token: Some(pair.access_token), refresh_token: Some(pair.refresh_token) }
    }
}

impl std::fmt::Debug for UserToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserToken")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Identity of the signed-in user as returned by `/auth/login` and `/auth/profile`.
///
/// Fields the client does not model are kept in `extra` so a profile can be
/// written back without losing data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: Value,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward_points: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserInfo {
    #[must_use]
    pub fn new(id: impl Into<Value>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            username: None,
            full_name: None,
            phone: None,
            avatar: None,
            role: None,
            reward_points: None,
            extra: Map::new(),
        }
    }

    #[must_use]
    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }
}

/// The authenticated identity plus its credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default, with = "empty_object")]
    pub user_info: Option<UserInfo>,
    #[serde(default)]
    pub user_token: UserToken,
    #[serde(default = "default_remember_me")]
    pub remember_me: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self { user_info: None, user_token: UserToken::default(), remember_me: true }
    }
}

impl Session {
    /// True only while both tokens are present.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.user_token.access_token.is_some() && self.user_token.refresh_token.is_some()
    }

    /// The shape written to persistent storage. Nothing sensitive survives
    /// when `remember_me` is off.
    #[must_use]
    pub fn persisted(&self) -> Self {
        if self.remember_me {
            self.clone()
        } else {
            Self { user_info: None, user_token: UserToken::default(), remember_me: false }
        }
    }
}

const fn default_remember_me() -> bool {
    true
}

/// `None` is stored as `{}` to match the layout older clients wrote.
mod empty_object {
    use super::UserInfo;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde_json::{Map, Value};

    pub(super) fn serialize<S: Serializer>(value: &Option<UserInfo>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(info) => info.serialize(serializer),
            None => Map::<String, Value>::new().serialize(serializer),
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<UserInfo>, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        match raw {
            Value::Null => Ok(None),
            Value::Object(ref map) if map.is_empty() => Ok(None),
            other => serde_json::from_value(other).map(Some).map_err(serde::de::Error::custom),
        }
    }
}
