//! Canonical field-order tables.
//!
//! Each table is the gateway's signing contract for one payload variant:
//! the fields whose values are concatenated, in exactly this order. Never
//! sort, deduplicate or rename entries.

use std::fmt;

use paymob_types::{RedirectRecord, TokenObject, TransactionObject};

use crate::canonical::Variant;

/// A field value as it appears in the canonical string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Int(i64),
    Bool(bool),
    Text(&'a str),
}

impl fmt::Display for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(n) => write!(f, "{}", n),
            FieldValue::Bool(true) => f.write_str("true"),
            FieldValue::Bool(false) => f.write_str("false"),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

/// One entry of a signing table: the contract path and how to read it.
pub struct CanonicalField<T> {
    pub path: &'static str,
    pub read: fn(&T) -> FieldValue<'_>,
}

impl<T> fmt::Debug for CanonicalField<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CanonicalField").field(&self.path).finish()
    }
}

/// `TRANSACTION` webhooks. Paths are relative to `obj`.
pub static TRANSACTION_FIELDS: &[CanonicalField<TransactionObject>] = &[
    CanonicalField { path: "amount_cents", read: |t| FieldValue::Int(t.amount_cents) },
    CanonicalField { path: "created_at", read: |t| FieldValue::Text(&t.created_at) },
    CanonicalField { path: "currency", read: |t| FieldValue::Text(&t.currency) },
    CanonicalField { path: "error_occured", read: |t| FieldValue::Bool(t.error_occured) },
    CanonicalField {
        path: "has_parent_transaction",
        read: |t| FieldValue::Bool(t.has_parent_transaction),
    },
    CanonicalField { path: "id", read: |t| FieldValue::Int(t.id) },
    CanonicalField { path: "integration_id", read: |t| FieldValue::Int(t.integration_id) },
    CanonicalField { path: "is_3d_secure", read: |t| FieldValue::Bool(t.is_3d_secure) },
    CanonicalField { path: "is_auth", read: |t| FieldValue::Bool(t.is_auth) },
    CanonicalField { path: "is_capture", read: |t| FieldValue::Bool(t.is_capture) },
    CanonicalField { path: "is_refunded", read: |t| FieldValue::Bool(t.is_refunded) },
    CanonicalField {
        path: "is_standalone_payment",
        read: |t| FieldValue::Bool(t.is_standalone_payment),
    },
    CanonicalField { path: "is_voided", read: |t| FieldValue::Bool(t.is_voided) },
    CanonicalField { path: "order.id", read: |t| FieldValue::Int(t.order.id) },
    CanonicalField { path: "owner", read: |t| FieldValue::Int(t.owner) },
    CanonicalField { path: "pending", read: |t| FieldValue::Bool(t.pending) },
    CanonicalField { path: "source_data.pan", read: |t| FieldValue::Text(&t.source_data.pan) },
    CanonicalField {
        path: "source_data.sub_type",
        read: |t| FieldValue::Text(&t.source_data.sub_type),
    },
    CanonicalField { path: "source_data.type", read: |t| FieldValue::Text(&t.source_data.kind) },
    CanonicalField { path: "success", read: |t| FieldValue::Bool(t.success) },
];

/// `TOKEN` webhooks. Paths are relative to `obj`.
pub static TOKEN_FIELDS: &[CanonicalField<TokenObject>] = &[
    CanonicalField { path: "card_subtype", read: |t| FieldValue::Text(&t.card_subtype) },
    CanonicalField { path: "created_at", read: |t| FieldValue::Text(&t.created_at) },
    CanonicalField { path: "email", read: |t| FieldValue::Text(&t.email) },
    CanonicalField { path: "id", read: |t| FieldValue::Int(t.id) },
    CanonicalField { path: "masked_pan", read: |t| FieldValue::Text(&t.masked_pan) },
    CanonicalField { path: "merchant_id", read: |t| FieldValue::Int(t.merchant_id) },
    CanonicalField { path: "order_id", read: |t| FieldValue::Text(&t.order_id) },
    CanonicalField { path: "token", read: |t| FieldValue::Text(&t.token) },
];

/// Browser redirects. Paths are literal (flattened) query keys.
pub static REDIRECT_FIELDS: &[CanonicalField<RedirectRecord>] = &[
    CanonicalField { path: "amount_cents", read: |r| FieldValue::Int(r.amount_cents) },
    CanonicalField { path: "created_at", read: |r| FieldValue::Text(&r.created_at) },
    CanonicalField { path: "currency", read: |r| FieldValue::Text(&r.currency) },
    CanonicalField { path: "error_occured", read: |r| FieldValue::Bool(r.error_occured) },
    CanonicalField {
        path: "has_parent_transaction",
        read: |r| FieldValue::Bool(r.has_parent_transaction),
    },
    CanonicalField { path: "id", read: |r| FieldValue::Int(r.id) },
    CanonicalField { path: "integration_id", read: |r| FieldValue::Int(r.integration_id) },
    CanonicalField { path: "is_3d_secure", read: |r| FieldValue::Bool(r.is_3d_secure) },
    CanonicalField { path: "is_auth", read: |r| FieldValue::Bool(r.is_auth) },
    CanonicalField { path: "is_capture", read: |r| FieldValue::Bool(r.is_capture) },
    CanonicalField { path: "is_refunded", read: |r| FieldValue::Bool(r.is_refunded) },
    CanonicalField {
        path: "is_standalone_payment",
        read: |r| FieldValue::Bool(r.is_standalone_payment),
    },
    CanonicalField { path: "is_voided", read: |r| FieldValue::Bool(r.is_voided) },
    CanonicalField { path: "order", read: |r| FieldValue::Int(r.order) },
    CanonicalField { path: "owner", read: |r| FieldValue::Int(r.owner) },
    CanonicalField { path: "pending", read: |r| FieldValue::Bool(r.pending) },
    CanonicalField { path: "source_data.pan", read: |r| FieldValue::Text(&r.source_data_pan) },
    CanonicalField {
        path: "source_data.sub_type",
        read: |r| FieldValue::Text(&r.source_data_sub_type),
    },
    CanonicalField {
        path: "source_data.type",
        read: |r| FieldValue::Text(&r.source_data_type),
    },
    CanonicalField { path: "success", read: |r| FieldValue::Bool(r.success) },
];

/// Contract paths for a variant, in signing order.
pub fn field_order(variant: Variant) -> Vec<&'static str> {
    fn paths<T>(table: &[CanonicalField<T>]) -> Vec<&'static str> {
        table.iter().map(|field| field.path).collect()
    }

    match variant {
        Variant::Transaction => paths(TRANSACTION_FIELDS),
        Variant::Token => paths(TOKEN_FIELDS),
        Variant::Redirect => paths(REDIRECT_FIELDS),
    }
}

/// Concatenates the table's values for `payload`, with no separator.
pub(crate) fn render<T>(table: &[CanonicalField<T>], payload: &T) -> String {
    table
        .iter()
        .map(|field| (field.read)(payload).to_string())
        .collect()
}
