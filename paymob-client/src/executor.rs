//! Single-attempt request execution.
//!
//! The [`Transport`] port performs exactly one network call per invocation
//! and classifies what happened. Retries live one layer up, in the
//! [`RetryCoordinator`](crate::RetryCoordinator).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, redirect};
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use paymob_types::{ConfigError, HttpMethod, Outcome, RequestDescriptor, ResponseBody, TransportError};

use crate::config::TransportConfig;

/// Port for a single, deadline-bounded request attempt.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issues `request` once. A call with no status by `deadline` is
    /// cancelled and reported as a retryable timeout; once a status has
    /// arrived, it alone decides the classification.
    async fn execute(&self, request: &RequestDescriptor, deadline: Duration) -> Outcome;
}

/// reqwest-backed transport adapter.
pub struct HttpExecutor {
    http: Client,
    base_url: String,
    authorization: HeaderValue,
}

impl HttpExecutor {
    pub fn new(config: &TransportConfig) -> Result<Self, ConfigError> {
        let http = Client::builder()
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        let mut authorization = HeaderValue::from_str(&format!("Token {}", config.secret_key()))
            .map_err(|_| ConfigError::InvalidVar {
                name: "secret key",
                value: "<redacted>".into(),
            })?;
        authorization.set_sensitive(true);

        Ok(Self {
            http,
            base_url: config.base_url().to_string(),
            authorization,
        })
    }

    /// Default headers first, then the caller's, replacing same-named defaults.
    fn headers_for(&self, request: &RequestDescriptor) -> Result<HeaderMap, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, self.authorization.clone());
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                TransportError::Request {
                    message: format!("invalid header name {:?}: {}", name, e),
                }
            })?;
            let mut value = HeaderValue::from_str(value).map_err(|e| TransportError::Request {
                message: format!("invalid value for header {}: {}", name, e),
            })?;
            if name == AUTHORIZATION {
                value.set_sensitive(true);
            }
            headers.insert(name, value);
        }
        Ok(headers)
    }
}

#[async_trait]
impl Transport for HttpExecutor {
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    async fn execute(&self, request: &RequestDescriptor, deadline: Duration) -> Outcome {
        let headers = match self.headers_for(request) {
            Ok(headers) => headers,
            Err(e) => return Outcome::TerminalFailure(e),
        };

        let mut builder = self
            .http
            .request(to_method(request.method), format!("{}{}", self.base_url, request.path))
            .headers(headers);
        if let Some(body) = request.wire_body() {
            builder = builder.json(body);
        }

        let expires = Instant::now() + deadline;

        let response = match tokio::time::timeout_at(expires, builder.send()).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return classify_error(e, deadline),
            Err(_) => return deadline_exceeded(deadline),
        };
        let status = response.status().as_u16();

        // Status received: the read failure no longer decides retryability.
        match tokio::time::timeout_at(expires, response.text()).await {
            Ok(Ok(raw)) => {
                debug!(status, "Received response");
                Outcome::from_status(status, ResponseBody::parse(raw))
            }
            Ok(Err(e)) => unreadable_body(status, e.to_string()),
            Err(_) => unreadable_body(
                status,
                format!("body not received within {}ms", deadline.as_millis()),
            ),
        }
    }
}

fn deadline_exceeded(deadline: Duration) -> Outcome {
    warn!(deadline_ms = deadline.as_millis() as u64, "Request deadline exceeded");
    Outcome::RetryableFailure(TransportError::Timeout { after: deadline })
}

/// Outcome for a response whose status arrived but whose body did not.
///
/// Only 5xx stays retryable. A 2xx is terminal so a call that took effect
/// is never replayed.
fn unreadable_body(status: u16, reason: String) -> Outcome {
    warn!(status, reason = %reason, "Response body could not be read");
    let cause = TransportError::Status {
        status,
        body: ResponseBody::Text(format!("response body could not be read: {}", reason)),
    };
    if status >= 500 {
        Outcome::RetryableFailure(cause)
    } else {
        Outcome::TerminalFailure(cause)
    }
}

fn to_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

/// Failures before any status arrived. Construction failures are terminal;
/// anything that went wrong on the wire is a retryable network failure.
fn classify_error(err: reqwest::Error, deadline: Duration) -> Outcome {
    if err.is_timeout() {
        return Outcome::RetryableFailure(TransportError::Timeout { after: deadline });
    }
    if err.is_builder() {
        return Outcome::TerminalFailure(TransportError::Request {
            message: err.to_string(),
        });
    }
    warn!("Request failed: {}", err);
    Outcome::RetryableFailure(TransportError::Network {
        message: err.to_string(),
    })
}
