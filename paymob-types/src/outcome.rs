//! Classified result of one transport attempt.

use std::fmt;

use serde_json::Value;

use crate::error::TransportError;

/// Response payload, structured when the body parses as JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Empty,
    Json(Value),
    Text(String),
}

impl ResponseBody {
    /// Parses a raw body, falling back to text when it is not JSON.
    pub fn parse(raw: String) -> Self {
        if raw.trim().is_empty() {
            return ResponseBody::Empty;
        }
        match serde_json::from_str(&raw) {
            Ok(value) => ResponseBody::Json(value),
            Err(_) => ResponseBody::Text(raw),
        }
    }

    /// Returns the structured body, if it parsed as JSON.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Converts into a JSON value. Text bodies become JSON strings.
    pub fn into_json(self) -> Value {
        match self {
            ResponseBody::Empty => Value::Null,
            ResponseBody::Json(value) => value,
            ResponseBody::Text(text) => Value::String(text),
        }
    }
}

impl fmt::Display for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseBody::Empty => Ok(()),
            ResponseBody::Json(value) => write!(f, "{}", value),
            ResponseBody::Text(text) => write!(f, "{}", text),
        }
    }
}

/// Result of exactly one network call.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(ResponseBody),
    RetryableFailure(TransportError),
    TerminalFailure(TransportError),
}

impl Outcome {
    /// Classifies a received response by status code.
    ///
    /// 2xx succeeds, 5xx is retryable, everything else (4xx, unfollowed
    /// redirects, informational) is terminal.
    pub fn from_status(status: u16, body: ResponseBody) -> Self {
        match status {
            200..=299 => Outcome::Success(body),
            500.. => Outcome::RetryableFailure(TransportError::Status { status, body }),
            _ => Outcome::TerminalFailure(TransportError::Status { status, body }),
        }
    }

    /// Returns true for a 2xx response.
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// Returns true when another attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Outcome::RetryableFailure(_))
    }
}
