use serde_json::Value;

/// Business-level status codes carried in the `status` field of an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultStatus {
    Success,
    Error,
    Timeout,
}

impl ResultStatus {
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::Success => 0,
            Self::Error => -1,
            Self::Timeout => 401,
        }
    }
}

/// A `{ status, data, message }` wrapper around a response payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub status: Value,
    pub data: Value,
    pub message: Option<String>,
}

impl Envelope {
    /// Recognises an envelope: an object that has both `status` and `data` keys.
    /// Anything else is a raw payload and is returned as `Err` untouched.
    pub fn detect(body: Value) -> Result<Self, Value> {
        match body {
            Value::Object(mut map) if map.contains_key("status") && map.contains_key("data") => {
                let status = map.remove("status").unwrap_or(Value::Null);
                let data = map.remove("data").unwrap_or(Value::Null);
                let message = map.remove("message").and_then(|m| match m {
                    Value::String(s) => Some(s),
                    _ => None,
                });
                Ok(Self { status, data, message })
            }
            other => Err(other),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.as_i64() == Some(ResultStatus::Success.code())
    }

    /// Splits the envelope into its payload or its business error message.
    /// The message is `None` when the server sent an empty one.
    pub fn into_result(self) -> Result<Value, Option<String>> {
        if self.is_success() {
            Ok(self.data)
        } else {
            Err(self.message.filter(|m| !m.trim().is_empty()))
        }
    }
}
