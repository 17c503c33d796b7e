use crate::core::session_store::SessionStore;
use crate::domain::envelope::Envelope;
use crate::domain::request::ApiRequest;
use crate::error::{ApiError, DEFAULT_ERROR_MESSAGE};
use serde_json::Value;

/// Request stage: attaches the stored access token as a bearer header.
///
/// Requests flagged `skip_auth` go out untouched. A missing token is not an
/// error here; the server answers 401 and the response stage deals with it.
pub fn authorize(request: &mut ApiRequest, store: &dyn SessionStore) {
    if request.options.skip_auth {
        return;
    }
    if let Some(token) = store.access_token() {
        request.set_bearer(&token);
    }
}

/// Response stage for 2xx bodies: unwraps a status envelope if there is one.
///
/// # Errors
/// Returns `ApiError::Business` when the envelope reports a non-success status.
pub fn unwrap_payload(body: Value) -> Result<Value, ApiError> {
    match Envelope::detect(body) {
        Ok(envelope) => envelope
            .into_result()
            .map_err(|message| ApiError::Business(message.unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string()))),
        Err(raw) => Ok(raw),
    }
}

/// Finds a human-readable message in an error body.
///
/// Looks at `message`, then `error` as a string, then `error.message`, then
/// the legacy `msg` field.
#[must_use]
pub fn extract_error_message(body: &Value) -> Option<String> {
    let candidates = [
        body.get("message"),
        body.get("error"),
        body.get("error").and_then(|e| e.get("message")),
        body.get("msg"),
    ];
    candidates
        .into_iter()
        .flatten()
        .find_map(|v| v.as_str().filter(|m| !m.trim().is_empty()))
        .map(str::to_string)
}

/// [`extract_error_message`] with the generic fallback applied.
#[must_use]
pub fn error_message_or_default(body: &Value) -> String {
    extract_error_message(body).unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string())
}
