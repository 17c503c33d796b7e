use crate::core::refresh::DEFAULT_REFRESH_PATH;
use clap::{Args, Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    #[command(flatten)]
    pub api: ApiConfig,

    #[command(flatten)]
    pub session: SessionConfig,

    #[command(flatten)]
    pub telemetry: TelemetryConfig,

    #[command(flatten)]
    pub smoke: SmokeConfig,
}

#[derive(Clone, Debug, Args)]
pub struct ApiConfig {
    /// Base URL of the REST API
    #[arg(long, env = "BREWDESK_API_BASE_URL", default_value = "http://localhost:3000")]
    pub base_url: String,

    /// Per-request timeout in milliseconds
    #[arg(long, env = "BREWDESK_API_TIMEOUT_MS", default_value_t = 50_000)]
    pub timeout_ms: u64,

    /// Path of the token refresh endpoint, relative to the base URL
    #[arg(long, env = "BREWDESK_REFRESH_PATH", default_value = DEFAULT_REFRESH_PATH)]
    pub refresh_path: String,
}

#[derive(Clone, Debug, Args)]
pub struct SessionConfig {
    /// File the session is persisted to. In-memory only when unset
    #[arg(long, env = "BREWDESK_SESSION_FILE")]
    pub session_file: Option<PathBuf>,

    /// Key the session is stored under inside the session file
    #[arg(long, env = "BREWDESK_SESSION_NAMESPACE", default_value = "userStore")]
    pub namespace: String,

    /// Keep the session across restarts
    #[arg(long, env = "BREWDESK_REMEMBER_ME", default_value_t = true, action = clap::ArgAction::Set)]
    pub remember_me: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Debug, Args)]
pub struct TelemetryConfig {
    /// Log output format
    #[arg(long, env = "BREWDESK_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Clone, Debug, Args)]
pub struct SmokeConfig {
    /// Account used by the auth check
    #[arg(long, env = "BREWDESK_LOGIN_EMAIL", default_value = "test@example.com")]
    pub email: String,

    /// Password used by the auth check
    #[arg(long, env = "BREWDESK_LOGIN_PASSWORD", default_value = "123456", hide_env_values = true)]
    pub password: String,

    /// Comma-separated list of endpoints to call with the issued token
    #[arg(
        long,
        env = "BREWDESK_CHECK_ENDPOINTS",
        default_value = "/products,/categories,/orders",
        value_delimiter = ','
    )]
    pub endpoints: Vec<String>,

    /// Register the account when login is rejected, then sign in with it
    #[arg(long, env = "BREWDESK_REGISTER_IF_MISSING", default_value_t = false)]
    pub register_if_missing: bool,
}

impl Config {
    pub fn load() -> Self {
        Self::parse()
    }
}

/// What the client itself needs, independent of how it was configured.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientSettings {
    pub base_url: String,
    pub timeout: Duration,
    pub refresh_path: String,
}

impl ClientSettings {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_millis(50_000),
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_refresh_path(mut self, refresh_path: impl Into<String>) -> Self {
        self.refresh_path = refresh_path.into();
        self
    }
}

impl From<&ApiConfig> for ClientSettings {
    fn from(config: &ApiConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
            refresh_path: config.refresh_path.clone(),
        }
    }
}
