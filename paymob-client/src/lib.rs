//! # Paymob Client
//!
//! Resilient transport for the Paymob API.
//!
//! ## Layers
//!
//! - `executor/` - The `Transport` port and its reqwest adapter; one attempt per call
//! - `retry/` - Bounded retries with exponential backoff over any `Transport`
//! - `token/` - Single-flight bearer token cache
//! - `client/` - `PaymobClient`, the facade resource wrappers call into
//! - `config/` - `TransportConfig` and environment-driven `Settings`
//!
//! ```no_run
//! # async fn run() -> Result<(), paymob_types::PaymobError> {
//! use paymob_client::{PaymobClient, TransportConfig};
//!
//! let client = PaymobClient::new(TransportConfig::new("sk_test_...")?)?;
//! let transaction: serde_json::Value = client.get("/api/acceptance/transactions/42").await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod executor;
pub mod retry;
pub mod token;


pub use client::PaymobClient;
pub use config::{Settings, TransportConfig, TransportConfigBuilder};
pub use executor::{HttpExecutor, Transport};
pub use retry::{RetryCoordinator, RetryPolicy, RetryState};
pub use token::TokenCache;
