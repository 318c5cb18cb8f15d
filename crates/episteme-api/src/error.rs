//! Error types for service calls

use episteme_utils::ConfigError;
use serde_json::Value;
use thiserror::Error;

/// Errors produced by the HTTP layer
#[derive(Debug, Error)]
pub enum ApiError {
    /// No response was received (connection refused, timeout, missing base URL)
    #[error("Network error: {0}")]
    Transport(String),

    /// The server answered with a non-success status
    #[error("HTTP {status} {reason}")]
    Status {
        status: u16,
        reason: String,
        /// Response body, when it was valid JSON
        body: Option<Value>,
    },

    /// The server answered 2xx but the payload could not be decoded
    #[error("Unexpected response payload: {0}")]
    Decode(String),

    /// Client configuration is unusable
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for service calls
pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    /// A non-empty string field of the JSON error body, if any
    pub fn body_field(&self, key: &str) -> Option<&str> {
        match self {
            Self::Status {
                body: Some(body), ..
            } => body
                .get(key)
                .and_then(Value::as_str)
                .filter(|text| !text.trim().is_empty()),
            _ => None,
        }
    }

    /// First body field found, in the given order of preference
    pub fn first_body_field(&self, keys: &[&str]) -> Option<String> {
        keys.iter()
            .find_map(|key| self.body_field(key))
            .map(str::to_string)
    }

    /// Whether the request never produced a response
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::Decode(err.to_string());
        }
        match err.status() {
            Some(status) => Self::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Error").to_string(),
                body: None,
            },
            None => Self::Transport(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn status_error(body: Value) -> ApiError {
        ApiError::Status {
            status: 500,
            reason: "Internal Server Error".to_string(),
            body: Some(body),
        }
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::Transport("connection refused".to_string());
        assert_eq!(err.to_string(), "Network error: connection refused");

        let err = status_error(json!({}));
        assert_eq!(err.to_string(), "HTTP 500 Internal Server Error");
    }

    #[test]
    fn test_body_field_preference() {
        let err = status_error(json!({"message": "from message", "detail": "from detail"}));
        assert_eq!(
            err.first_body_field(&["detail", "message"]).as_deref(),
            Some("from detail")
        );
        assert_eq!(
            err.first_body_field(&["error", "message"]).as_deref(),
            Some("from message")
        );
    }

    #[test]
    fn test_body_field_skips_blank_and_non_string() {
        let err = status_error(json!({"detail": [{"loc": ["q"]}], "message": "  ", "error": "boom"}));
        assert_eq!(err.body_field("detail"), None);
        assert_eq!(err.body_field("message"), None);
        assert_eq!(
            err.first_body_field(&["detail", "message", "error"]).as_deref(),
            Some("boom")
        );
    }

    #[test]
    fn test_transport_has_no_body() {
        let err = ApiError::Transport("timeout".to_string());
        assert!(err.is_transport());
        assert_eq!(err.status(), None);
        assert_eq!(err.first_body_field(&["detail"]), None);
    }
}
