//! Outbound request description.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValidationError;

/// HTTP methods issued against the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    /// Retrieval-only methods never carry a request body.
    pub fn is_retrieval(&self) -> bool {
        matches!(self, HttpMethod::Get)
    }
}

impl AsRef<str> for HttpMethod {
    fn as_ref(&self) -> &str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_ref())
    }
}

/// One outbound call, owned by the call that issues it.
///
/// `path` is appended verbatim to the configured base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: HttpMethod,
    pub path: String,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
}

impl RequestDescriptor {
    /// Creates a descriptor with no body and no extra headers.
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            headers: Vec::new(),
        }
    }

    /// Shorthand for a `GET` of `path`.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// Shorthand for a `POST` of `body` to `path`.
    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(HttpMethod::Post, path).with_body(body)
    }

    /// Sets the JSON body. Ignored on the wire for retrieval methods.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Adds a header. Later headers replace earlier ones with the same name,
    /// including the client's defaults.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// The body that goes on the wire, if any.
    ///
    /// Retrieval methods and `null`/absent bodies send nothing.
    pub fn wire_body(&self) -> Option<&Value> {
        if self.method.is_retrieval() {
            return None;
        }
        match &self.body {
            None | Some(Value::Null) => None,
            Some(body) => Some(body),
        }
    }

    /// Checks the descriptor before any attempt is made.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.path.starts_with('/') {
            return Err(ValidationError::InvalidRequest(format!(
                "path must start with '/': {:?}",
                self.path
            )));
        }
        if self.path.chars().any(|c| c.is_whitespace()) {
            return Err(ValidationError::InvalidRequest(format!(
                "path must not contain whitespace: {:?}",
                self.path
            )));
        }
        for (name, value) in &self.headers {
            if name.is_empty() || !name.bytes().all(is_token_byte) {
                return Err(ValidationError::InvalidRequest(format!(
                    "invalid header name: {:?}",
                    name
                )));
            }
            if value.bytes().any(|b| b == b'\r' || b == b'\n' || b == 0) {
                return Err(ValidationError::InvalidRequest(format!(
                    "invalid value for header {}",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// RFC 9110 `tchar`.
fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_never_sends_body() {
        let req = RequestDescriptor::get("/api/acceptance/transactions/1").with_body(json!({"a": 1}));
        assert_eq!(req.wire_body(), None);
    }

    #[test]
    fn test_null_body_is_omitted() {
        let req = RequestDescriptor::new(HttpMethod::Delete, "/x").with_body(Value::Null);
        assert_eq!(req.wire_body(), None);

        let req = RequestDescriptor::new(HttpMethod::Put, "/x");
        assert_eq!(req.wire_body(), None);
    }

    #[test]
    fn test_post_sends_body() {
        let req = RequestDescriptor::post("/api/acceptance/capture", json!({"amount_cents": 100}));
        assert_eq!(req.wire_body(), Some(&json!({"amount_cents": 100})));
    }

    #[test]
    fn test_validate_rejects_relative_path() {
        let req = RequestDescriptor::get("v1/intention");
        assert!(matches!(
            req.validate(),
            Err(ValidationError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_headers() {
        let req = RequestDescriptor::get("/v1/intention").with_header("Bad Header", "x");
        assert!(req.validate().is_err());

        let req = RequestDescriptor::get("/v1/intention").with_header("X-Ok", "a\r\nInjected: 1");
        assert!(req.validate().is_err());

        let req = RequestDescriptor::get("/v1/intention").with_header("Authorization", "Bearer t");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_method_display() {
        assert_eq!(HttpMethod::Patch.to_string(), "PATCH");
        assert!(HttpMethod::Get.is_retrieval());
        assert!(!HttpMethod::Delete.is_retrieval());
    }
}
