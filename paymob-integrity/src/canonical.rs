//! Canonical string construction.

use serde_json::Value;

use paymob_types::{RedirectRecord, ValidationError, WebhookEnvelope};

use crate::fields::{REDIRECT_FIELDS, TOKEN_FIELDS, TRANSACTION_FIELDS, render};

/// Signed payload variants, one signing table each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    Transaction,
    Token,
    Redirect,
}

/// A typed, already-validated payload to sign or verify.
#[derive(Debug, Clone, Copy)]
pub enum SignedPayload<'a> {
    Webhook(&'a WebhookEnvelope),
    Redirect(&'a RedirectRecord),
}

impl SignedPayload<'_> {
    pub fn variant(&self) -> Variant {
        match self {
            SignedPayload::Webhook(WebhookEnvelope::Transaction(_)) => Variant::Transaction,
            SignedPayload::Webhook(WebhookEnvelope::Token(_)) => Variant::Token,
            SignedPayload::Redirect(_) => Variant::Redirect,
        }
    }
}

impl<'a> From<&'a WebhookEnvelope> for SignedPayload<'a> {
    fn from(envelope: &'a WebhookEnvelope) -> Self {
        SignedPayload::Webhook(envelope)
    }
}

impl<'a> From<&'a RedirectRecord> for SignedPayload<'a> {
    fn from(record: &'a RedirectRecord) -> Self {
        SignedPayload::Redirect(record)
    }
}

/// Renders the exact string the gateway signs for this payload.
pub fn canonical_string(payload: SignedPayload<'_>) -> String {
    match payload {
        SignedPayload::Webhook(WebhookEnvelope::Transaction(obj)) => {
            render(TRANSACTION_FIELDS, obj)
        }
        SignedPayload::Webhook(WebhookEnvelope::Token(obj)) => render(TOKEN_FIELDS, obj),
        SignedPayload::Redirect(record) => render(REDIRECT_FIELDS, record),
    }
}

/// Validates a raw payload as `variant` and renders its canonical string.
///
/// Webhook variants expect the full envelope; a tag that disagrees with
/// `variant` is a validation failure.
pub fn serialize_value(raw: &Value, variant: Variant) -> Result<String, ValidationError> {
    match variant {
        Variant::Redirect => {
            let record = RedirectRecord::from_json(raw)?;
            Ok(canonical_string(SignedPayload::Redirect(&record)))
        }
        Variant::Transaction | Variant::Token => {
            let envelope = WebhookEnvelope::from_json(raw)?;
            let payload = SignedPayload::Webhook(&envelope);
            if payload.variant() != variant {
                return Err(ValidationError::InvalidPayload {
                    kind: "webhook",
                    reason: format!(
                        "expected {:?} envelope, got type {}",
                        variant,
                        envelope.type_tag()
                    ),
                });
            }
            Ok(canonical_string(payload))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paymob_types::{OrderRef, SourceData, TokenObject, TransactionObject};
    use serde_json::json;

    fn transaction() -> TransactionObject {
        TransactionObject {
            id: 192036465,
            pending: false,
            amount_cents: 100000,
            success: true,
            is_auth: false,
            is_capture: false,
            is_standalone_payment: true,
            is_voided: false,
            is_refunded: false,
            is_3d_secure: true,
            integration_id: 4097558,
            has_parent_transaction: false,
            created_at: "2024-06-13T11:33:44.592345".into(),
            currency: "EGP".into(),
            error_occured: false,
            order: OrderRef { id: 217503754 },
            owner: 1724587,
            source_data: SourceData {
                pan: "2346".into(),
                kind: "card".into(),
                sub_type: "MasterCard".into(),
            },
        }
    }

    #[test]
    fn test_transaction_canonical_string() {
        let envelope = WebhookEnvelope::Transaction(transaction());
        assert_eq!(
            canonical_string(SignedPayload::from(&envelope)),
            "1000002024-06-13T11:33:44.592345EGPfalsefalse1920364654097558truefalsefalse\
             falsetruefalse2175037541724587false2346MasterCardcardtrue"
        );
    }

    #[test]
    fn test_token_canonical_string() {
        let envelope = WebhookEnvelope::Token(TokenObject {
            id: 3411,
            token: "b9c2f7e0d1".into(),
            masked_pan: "xxxx-xxxx-xxxx-2346".into(),
            merchant_id: 1724587,
            card_subtype: "MasterCard".into(),
            created_at: "2024-06-13T11:33:44.592345".into(),
            email: "buyer@example.com".into(),
            order_id: "217503754".into(),
            user_added: false,
            next_payment_intention: None,
        });
        assert_eq!(
            canonical_string(SignedPayload::from(&envelope)),
            "MasterCard2024-06-13T11:33:44.592345buyer@example.com3411xxxx-xxxx-xxxx-2346\
             1724587217503754b9c2f7e0d1"
        );
    }

    #[test]
    fn test_redirect_matches_equivalent_webhook() {
        let obj = transaction();
        let record = RedirectRecord {
            id: obj.id,
            pending: obj.pending,
            amount_cents: obj.amount_cents,
            success: obj.success,
            is_auth: obj.is_auth,
            is_capture: obj.is_capture,
            is_standalone_payment: obj.is_standalone_payment,
            is_voided: obj.is_voided,
            is_refunded: obj.is_refunded,
            is_3d_secure: obj.is_3d_secure,
            integration_id: obj.integration_id,
            has_parent_transaction: obj.has_parent_transaction,
            order: obj.order.id,
            created_at: obj.created_at.clone(),
            currency: obj.currency.clone(),
            error_occured: obj.error_occured,
            owner: obj.owner,
            source_data_pan: obj.source_data.pan.clone(),
            source_data_type: obj.source_data.kind.clone(),
            source_data_sub_type: obj.source_data.sub_type.clone(),
            txn_response_code: None,
            hmac: String::new(),
        };
        let envelope = WebhookEnvelope::Transaction(obj);

        assert_eq!(
            canonical_string(SignedPayload::from(&record)),
            canonical_string(SignedPayload::from(&envelope))
        );
    }

    #[test]
    fn test_serialize_value_checks_variant_tag() {
        let raw = serde_json::to_value(WebhookEnvelope::Transaction(transaction())).unwrap();
        assert!(serialize_value(&raw, Variant::Transaction).is_ok());

        let err = serialize_value(&raw, Variant::Token).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidPayload { kind: "webhook", .. }
        ));
    }

    #[test]
    fn test_serialize_value_rejects_incomplete_payload() {
        let raw = json!({"type": "TRANSACTION", "obj": {"id": 1}});
        assert!(serialize_value(&raw, Variant::Transaction).is_err());
    }
}
