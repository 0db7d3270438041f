//! Transport configuration and environment loading.

use std::fmt;
use std::time::Duration;

use reqwest::Url;

use paymob_types::ConfigError;

pub const DEFAULT_API_BASE_URL: &str = "https://accept.paymob.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

/// Immutable transport settings, validated at construction.
///
/// A changed setting means a new config; there are no setters.
#[derive(Clone)]
pub struct TransportConfig {
    base_url: String,
    secret_key: String,
    timeout: Duration,
    max_attempts: u32,
}

impl TransportConfig {
    /// Builds a config with defaults for everything but the secret key.
    pub fn new(secret_key: impl Into<String>) -> Result<Self, ConfigError> {
        Self::builder(secret_key).build()
    }

    /// Starts a builder; unset values fall back to the defaults.
    pub fn builder(secret_key: impl Into<String>) -> TransportConfigBuilder {
        TransportConfigBuilder {
            secret_key: secret_key.into(),
            base_url: None,
            timeout: None,
            max_attempts: None,
        }
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Static credential sent as `Authorization: Token <key>`.
    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    /// Deadline for a single attempt.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Total attempts per call, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

impl fmt::Debug for TransportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportConfig")
            .field("base_url", &self.base_url)
            .field("secret_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}

pub struct TransportConfigBuilder {
    secret_key: String,
    base_url: Option<String>,
    timeout: Option<Duration>,
    max_attempts: Option<u32>,
}

impl TransportConfigBuilder {
    /// Overrides the API base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the per-attempt deadline.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the total attempts per call.
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Validates the settings and produces the config.
    pub fn build(self) -> Result<TransportConfig, ConfigError> {
        if self.secret_key.trim().is_empty() {
            return Err(ConfigError::MissingSecretKey);
        }

        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        if timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }

        let max_attempts = self.max_attempts.unwrap_or(DEFAULT_RETRY_ATTEMPTS);
        if max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }

        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        validate_base_url(&base_url)?;

        Ok(TransportConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            secret_key: self.secret_key,
            timeout,
            max_attempts,
        })
    }
}

fn validate_base_url(raw: &str) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidBaseUrl {
        url: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {}", url.scheme())));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("must not carry a query or fragment".into()));
    }
    Ok(())
}

/// Everything the client reads from its environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub transport: TransportConfig,
    pub api_key: Option<String>,
    pub public_key: Option<String>,
    pub hmac_secret: Option<String>,
}

impl Settings {
    /// Loads settings from `PAYMOB_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads settings through an arbitrary variable lookup. Blank values
    /// count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let secret_key = var("PAYMOB_SECRET_KEY").ok_or(ConfigError::MissingSecretKey)?;
        let mut builder = TransportConfig::builder(secret_key);

        if let Some(base_url) = var("PAYMOB_API_BASE_URL") {
            builder = builder.base_url(base_url);
        }
        if let Some(raw) = var("PAYMOB_TIMEOUT_MS") {
            let millis: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidVar {
                name: "PAYMOB_TIMEOUT_MS",
                value: raw.clone(),
            })?;
            builder = builder.timeout(Duration::from_millis(millis));
        }
        if let Some(raw) = var("PAYMOB_RETRY_ATTEMPTS") {
            let attempts: u32 = raw.trim().parse().map_err(|_| ConfigError::InvalidVar {
                name: "PAYMOB_RETRY_ATTEMPTS",
                value: raw.clone(),
            })?;
            builder = builder.max_attempts(attempts);
        }

        Ok(Self {
            transport: builder.build()?,
            api_key: var("PAYMOB_API_KEY"),
            public_key: var("PAYMOB_PUBLIC_KEY"),
            hmac_secret: var("PAYMOB_HMAC_SECRET"),
        })
    }
}
