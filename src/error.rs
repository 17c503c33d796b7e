use reqwest::StatusCode;
use thiserror::Error;

/// Shown when a failure carries nothing more specific.
pub const DEFAULT_ERROR_MESSAGE: &str = "Operation failed, the system encountered a problem!";
/// Shown when the session can no longer be renewed.
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// No HTTP response arrived (timeout, connection refused, offline).
    #[error("Transport error: {0}")]
    Transport(String),
    /// The session could not be renewed and has been cleared.
    #[error("Session expired: {0}")]
    AuthExpired(String),
    /// The response envelope reported a non-success status.
    #[error("Request rejected: {0}")]
    Business(String),
    /// Any other non-2xx response.
    #[error("HTTP {status}: {message}")]
    Http { status: StatusCode, message: String },
    /// The request body could not be serialized.
    #[error("Failed to encode request: {0}")]
    Encode(String),
    /// The payload did not match the type the caller asked for.
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl ApiError {
    /// The human-readable text to show for this failure.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Transport(_) => DEFAULT_ERROR_MESSAGE,
            Self::AuthExpired(msg)
            | Self::Business(msg)
            | Self::Encode(msg)
            | Self::Decode(msg)
            | Self::Http { message: msg, .. } => msg,
        }
    }

    #[must_use]
    pub const fn is_auth_expired(&self) -> bool {
        matches!(self, Self::AuthExpired(_))
    }

    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn session_expired() -> Self {
        Self::AuthExpired(SESSION_EXPIRED_MESSAGE.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_message_is_generic() {
        let err = ApiError::Transport("connection refused".into());
        assert_eq!(err.message(), DEFAULT_ERROR_MESSAGE);
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_http_error_exposes_status() {
        let err = ApiError::Http { status: StatusCode::CONFLICT, message: "taken".into() };
        assert_eq!(err.status(), Some(StatusCode::CONFLICT));
        assert_eq!(err.message(), "taken");
        assert!(!err.is_auth_expired());
    }

    #[test]
    fn test_session_expired_constructor() {
        let err = ApiError::session_expired();
        assert!(err.is_auth_expired());
        assert_eq!(err.message(), SESSION_EXPIRED_MESSAGE);
    }
}
