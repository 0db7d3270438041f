//! # Paymob Types
//!
//! Data structures shared by the transport and integrity crates.
//! This crate has ZERO IO dependencies - only request/response shapes,
//! inbound callback payloads, and the error taxonomy.
//!
//! ## Layout
//!
//! - `request/` - Outbound request descriptor and the HTTP method set
//! - `outcome/` - Classified result of a single transport attempt
//! - `callback/` - Webhook envelopes and browser redirect records
//! - `auth/` - Token authentication DTOs and the cached bearer token
//! - `error/` - Configuration, validation and transport errors

pub mod auth;
pub mod callback;
pub mod error;
pub mod outcome;
pub mod request;

// Re-export commonly used types
pub use auth::{AuthProfile, AuthRequest, AuthResponse, AuthUser, CachedToken};
pub use callback::{
    OrderRef, RedirectRecord, SourceData, TokenObject, TransactionObject, WebhookEnvelope,
};
pub use error::{ConfigError, PaymobError, TransportError, ValidationError};
pub use outcome::{Outcome, ResponseBody};
pub use request::{HttpMethod, RequestDescriptor};
