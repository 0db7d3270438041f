//! Error types for the Paymob client.

use std::time::Duration;

use crate::outcome::ResponseBody;

/// Static configuration errors. Raised at construction, never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Secret key is required")]
    MissingSecretKey,

    #[error("{0} is required")]
    Missing(&'static str),

    #[error("Timeout must be greater than zero")]
    ZeroTimeout,

    #[error("Retry attempts must be greater than zero")]
    ZeroAttempts,

    #[error("Invalid base URL {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Invalid value for {name}: {value:?}")]
    InvalidVar { name: &'static str, value: String },

    #[error("HTTP client could not be built: {0}")]
    HttpClient(String),
}

/// Malformed outbound requests and malformed inbound payloads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid {kind} payload: {reason}")]
    InvalidPayload { kind: &'static str, reason: String },

    #[error("Unexpected response body: {0}")]
    UnexpectedResponse(String),
}

/// Failure of a single transport attempt.
///
/// Whether it is retried is decided by the [`Outcome`](crate::Outcome) that
/// carries it, not by the error itself.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    #[error("API error: {status} {body}")]
    Status { status: u16, body: ResponseBody },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Request timed out after {}ms", .after.as_millis())]
    Timeout { after: Duration },

    #[error("Request could not be built: {message}")]
    Request { message: String },
}

impl TransportError {
    /// HTTP status code, when a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Response body attached for diagnostics, when a response was received.
    pub fn body(&self) -> Option<&ResponseBody> {
        match self {
            TransportError::Status { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout { .. })
    }
}

/// Top-level error surfaced to callers.
#[derive(Debug, thiserror::Error)]
pub enum PaymobError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Signature does not match payload")]
    SignatureMismatch,

    #[error("Unknown API error")]
    Unknown,
}

impl PaymobError {
    /// HTTP status of the underlying transport failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            PaymobError::Transport(err) => err.status(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_accessors() {
        let err = TransportError::Status {
            status: 503,
            body: ResponseBody::Text("unavailable".into()),
        };
        assert_eq!(err.status(), Some(503));
        assert_eq!(err.body(), Some(&ResponseBody::Text("unavailable".into())));
        assert!(!err.is_timeout());

        let wrapped: PaymobError = err.into();
        assert_eq!(wrapped.status(), Some(503));
    }

    #[test]
    fn test_timeout_has_no_status() {
        let err = TransportError::Timeout {
            after: Duration::from_millis(250),
        };
        assert!(err.is_timeout());
        assert_eq!(err.status(), None);
        assert_eq!(err.to_string(), "Request timed out after 250ms");
    }

    #[test]
    fn test_transparent_messages() {
        let err: PaymobError = ConfigError::MissingSecretKey.into();
        assert_eq!(err.to_string(), "Secret key is required");

        let err: PaymobError = ValidationError::InvalidRequest("bad path".into()).into();
        assert_eq!(err.to_string(), "Invalid request: bad path");
    }
}
