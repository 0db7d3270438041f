//! The `PaymobClient` facade.
//!
//! Resource wrappers build a [`RequestDescriptor`] and hand it to the client;
//! the client owns the retry coordinator, the optional token cache and the
//! checkout URL template.

use std::sync::Arc;

use reqwest::Url;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use paymob_types::{
    ConfigError, HttpMethod, PaymobError, RequestDescriptor, ResponseBody, ValidationError,
};

use crate::config::{Settings, TransportConfig};
use crate::executor::{HttpExecutor, Transport};
use crate::retry::{RetryCoordinator, RetryPolicy};
use crate::token::TokenCache;

const CHECKOUT_PATH: &str = "/unifiedcheckout/";

/// Typed entry point to the gateway API.
pub struct PaymobClient<T: Transport = HttpExecutor> {
    coordinator: Arc<RetryCoordinator<T>>,
    tokens: Option<TokenCache<T>>,
    base_url: String,
    public_key: Option<String>,
}

impl PaymobClient<HttpExecutor> {
    /// Creates a client over the reqwest transport.
    pub fn new(config: TransportConfig) -> Result<Self, ConfigError> {
        let coordinator = RetryCoordinator::from_config(&config)?;
        Ok(Self::from_coordinator(coordinator, config.base_url()))
    }

    /// Builds a client from environment settings, enabling token auth and
    /// checkout URLs when their keys are present.
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        let mut client = Self::new(settings.transport.clone())?;
        if let Some(api_key) = &settings.api_key {
            client = client.with_api_key(api_key.clone())?;
        }
        if let Some(public_key) = &settings.public_key {
            client = client.with_public_key(public_key.clone());
        }
        Ok(client)
    }
}

impl<T: Transport> PaymobClient<T> {
    /// Client over a custom transport. `base_url` is only used for
    /// building checkout URLs.
    pub fn with_transport(transport: T, policy: RetryPolicy, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self::from_coordinator(RetryCoordinator::new(transport, policy), &base_url)
    }

    fn from_coordinator(coordinator: RetryCoordinator<T>, base_url: &str) -> Self {
        Self {
            coordinator: Arc::new(coordinator),
            tokens: None,
            base_url: base_url.trim_end_matches('/').to_string(),
            public_key: None,
        }
    }

    /// Enables bearer-token endpoints.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Result<Self, ConfigError> {
        self.tokens = Some(TokenCache::new(Arc::clone(&self.coordinator), api_key)?);
        Ok(self)
    }

    /// Sets the public key used in checkout URLs.
    pub fn with_public_key(mut self, public_key: impl Into<String>) -> Self {
        self.public_key = Some(public_key.into());
        self
    }

    /// The retry coordinator every call goes through.
    pub fn coordinator(&self) -> &RetryCoordinator<T> {
        &self.coordinator
    }

    /// The token cache, when an API key was configured.
    pub fn tokens(&self) -> Option<&TokenCache<T>> {
        self.tokens.as_ref()
    }

    /// Sends a prepared request with the secret-key credential.
    pub async fn send(&self, request: &RequestDescriptor) -> Result<ResponseBody, PaymobError> {
        self.coordinator.send(request).await
    }

    /// Fetches `path` and decodes the response.
    pub async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R, PaymobError> {
        self.coordinator
            .send_json(&RequestDescriptor::get(path))
            .await
    }

    /// Posts `body` to `path` and decodes the response.
    pub async fn post<R, B>(&self, path: &str, body: &B) -> Result<R, PaymobError>
    where
        R: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.with_json(HttpMethod::Post, path, body).await
    }

    /// Replaces the resource at `path` with `body`.
    pub async fn put<R, B>(&self, path: &str, body: &B) -> Result<R, PaymobError>
    where
        R: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.with_json(HttpMethod::Put, path, body).await
    }

    /// Partially updates the resource at `path`.
    pub async fn patch<R, B>(&self, path: &str, body: &B) -> Result<R, PaymobError>
    where
        R: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.with_json(HttpMethod::Patch, path, body).await
    }

    /// Deletes the resource at `path`.
    pub async fn delete<R: DeserializeOwned>(&self, path: &str) -> Result<R, PaymobError> {
        self.coordinator
            .send_json(&RequestDescriptor::new(HttpMethod::Delete, path))
            .await
    }

    async fn with_json<R, B>(&self, method: HttpMethod, path: &str, body: &B) -> Result<R, PaymobError>
    where
        R: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body)
            .map_err(|e| ValidationError::InvalidRequest(e.to_string()))?;
        self.coordinator
            .send_json(&RequestDescriptor::new(method, path).with_body(body))
            .await
    }

    /// Sends `request` with a bearer token from the cache.
    ///
    /// A 401 drops the cached token and the call is replayed once with a
    /// freshly issued one.
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn send_authenticated<R: DeserializeOwned>(
        &self,
        request: &RequestDescriptor,
    ) -> Result<R, PaymobError> {
        let tokens = self.tokens.as_ref().ok_or(ConfigError::Missing("API key"))?;

        let token = tokens.get_token().await?;
        match self.coordinator.send_json(&bearer(request, &token)).await {
            Err(e) if e.status() == Some(401) => {
                debug!("Bearer token rejected, re-authenticating");
                tokens.invalidate().await;
                let token = tokens.get_token().await?;
                self.coordinator.send_json(&bearer(request, &token)).await
            }
            other => other,
        }
    }

    /// Unified checkout URL for a payment intention's client secret.
    pub fn checkout_url(&self, client_secret: &str) -> Result<String, ConfigError> {
        let public_key = self
            .public_key
            .as_deref()
            .ok_or(ConfigError::Missing("public key"))?;

        let raw = format!("{}{}", self.base_url, CHECKOUT_PATH);
        let mut url = Url::parse(&raw).map_err(|e| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        url.query_pairs_mut()
            .append_pair("publicKey", public_key)
            .append_pair("clientSecret", client_secret);
        Ok(url.into())
    }
}

fn bearer(request: &RequestDescriptor, token: &str) -> RequestDescriptor {
    request
        .clone()
        .with_header("Authorization", format!("Bearer {}", token))
}
