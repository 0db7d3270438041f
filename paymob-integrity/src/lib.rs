//! # Paymob Integrity
//!
//! Authenticates inbound gateway callbacks.
//!
//! The gateway signs a canonical string: the values of a fixed, per-variant
//! list of fields concatenated with no separator. The lists live in
//! [`fields`] as data; [`canonical`] renders them and [`verifier`] keys an
//! HMAC-SHA512 over the result and compares it in constant time.

pub mod canonical;
pub mod fields;
pub mod verifier;

pub use canonical::{SignedPayload, Variant, canonical_string, serialize_value};
pub use fields::{CanonicalField, FieldValue, field_order};
pub use verifier::{IntegrityVerifier, sign, verify};
