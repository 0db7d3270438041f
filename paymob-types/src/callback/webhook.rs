//! Server-pushed webhook envelopes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::de;
use crate::error::ValidationError;

/// Webhook body, discriminated by its `type` tag with the payload under `obj`.
///
/// Top-level fields other than `type` and `obj` are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "obj")]
pub enum WebhookEnvelope {
    #[serde(rename = "TRANSACTION")]
    Transaction(TransactionObject),
    #[serde(rename = "TOKEN")]
    Token(TokenObject),
}

impl WebhookEnvelope {
    /// Validates a raw webhook body against the variant selected by its tag.
    pub fn from_json(value: &Value) -> Result<Self, ValidationError> {
        Self::deserialize(value).map_err(|e| ValidationError::InvalidPayload {
            kind: "webhook",
            reason: e.to_string(),
        })
    }

    pub fn type_tag(&self) -> &'static str {
        match self {
            WebhookEnvelope::Transaction(_) => "TRANSACTION",
            WebhookEnvelope::Token(_) => "TOKEN",
        }
    }
}

/// Transaction callback object. Every field here is part of the signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionObject {
    pub id: i64,
    pub pending: bool,
    pub amount_cents: i64,
    pub success: bool,
    pub is_auth: bool,
    pub is_capture: bool,
    pub is_standalone_payment: bool,
    pub is_voided: bool,
    pub is_refunded: bool,
    pub is_3d_secure: bool,
    pub integration_id: i64,
    pub has_parent_transaction: bool,
    pub created_at: String,
    pub currency: String,
    pub error_occured: bool,
    pub order: OrderRef,
    pub owner: i64,
    pub source_data: SourceData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRef {
    pub id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceData {
    pub pan: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub sub_type: String,
}

/// Saved-card token callback object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenObject {
    pub id: i64,
    pub token: String,
    pub masked_pan: String,
    pub merchant_id: i64,
    pub card_subtype: String,
    pub created_at: String,
    pub email: String,
    #[serde(deserialize_with = "de::text")]
    pub order_id: String,
    pub user_added: bool,
    #[serde(default)]
    pub next_payment_intention: Option<String>,
}
