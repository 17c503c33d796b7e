use crate::domain::request::{ApiRequest, ApiResponse};
use async_trait::async_trait;
use thiserror::Error;

/// The request never produced an HTTP response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Request timed out")]
    Timeout,
    #[error("Connection failed: {0}")]
    Connect(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Transport failure: {0}")]
    Other(String),
}

#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Sends a request and returns whatever response came back, successful or not.
    ///
    /// # Errors
    /// Returns `TransportError` only when no response was received at all.
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError>;
}
