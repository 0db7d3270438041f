//! Bearer token cache for token-authenticated endpoints.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use paymob_types::{
    AuthRequest, AuthResponse, CachedToken, ConfigError, HttpMethod, PaymobError,
    RequestDescriptor, ValidationError,
};

use crate::executor::{HttpExecutor, Transport};
use crate::retry::RetryCoordinator;

pub const AUTH_TOKENS_PATH: &str = "/api/auth/tokens";

/// Tokens live 60 minutes; refresh 5 minutes early.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(55 * 60);

/// Caches the auth token and refreshes it when expired.
///
/// The slot lock is held across a refresh, so concurrent callers that find
/// the token expired wait for the one in-flight refresh instead of issuing
/// their own.
pub struct TokenCache<T: Transport = HttpExecutor> {
    coordinator: Arc<RetryCoordinator<T>>,
    api_key: String,
    ttl: Duration,
    slot: Mutex<Option<CachedToken>>,
}

impl<T: Transport> TokenCache<T> {
    pub fn new(
        coordinator: Arc<RetryCoordinator<T>>,
        api_key: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ConfigError::Missing("API key"));
        }
        Ok(Self {
            coordinator,
            api_key,
            ttl: DEFAULT_TOKEN_TTL,
            slot: Mutex::new(None),
        })
    }

    /// Overrides how long a refreshed token is served from cache.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Returns the cached token, refreshing it first if it has expired.
    #[instrument(skip(self))]
    pub async fn get_token(&self) -> Result<String, PaymobError> {
        let mut slot = self.slot.lock().await;

        if let Some(cached) = slot.as_ref() {
            if cached.is_valid_at(now()) {
                return Ok(cached.token().to_string());
            }
            debug!("Cached auth token expired");
        }

        // Never leave a stale or partial entry behind a failed refresh.
        *slot = None;

        let token = self.refresh().await.inspect_err(|e| {
            warn!(error = %e, "Auth token refresh failed");
        })?;
        let cached = CachedToken::new(token, now() + self.ttl);
        info!(ttl_secs = self.ttl.as_secs(), "Refreshed auth token");

        let token = cached.token().to_string();
        *slot = Some(cached);
        Ok(token)
    }

    /// Drops the cached token so the next call re-authenticates.
    pub async fn invalidate(&self) {
        *self.slot.lock().await = None;
    }

    async fn refresh(&self) -> Result<String, PaymobError> {
        let body = serde_json::to_value(AuthRequest {
            api_key: self.api_key.clone(),
        })
        .map_err(|e| ValidationError::InvalidRequest(e.to_string()))?;
        let request = RequestDescriptor::new(HttpMethod::Post, AUTH_TOKENS_PATH).with_body(body);

        let response: AuthResponse = self.coordinator.send_json(&request).await?;
        if response.token.is_empty() {
            return Err(
                ValidationError::UnexpectedResponse("auth response carried an empty token".into())
                    .into(),
            );
        }
        Ok(response.token)
    }
}

impl<T: Transport> fmt::Debug for TokenCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCache")
            .field("api_key", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// Wall time in the runtime's clock, so paused-time tests can move it.
fn now() -> std::time::Instant {
    Instant::now().into_std()
}
