//! HMAC-SHA512 signing and verification of gateway callbacks.

use std::fmt;

use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha512;
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use paymob_types::{ConfigError, PaymobError, RedirectRecord, ValidationError, WebhookEnvelope};

use crate::canonical::{SignedPayload, canonical_string};

type HmacSha512 = Hmac<Sha512>;

/// Signs a canonical string with HMAC-SHA512, hex-encoded (lowercase).
pub fn sign(canonical: &str, secret: &str) -> String {
    let mut mac =
        HmacSha512::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(canonical.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Verifies `signature` against the payload using constant-time comparison.
///
/// Pure: no IO, no shared state. Only an exact (case-sensitive) match passes.
pub fn verify(payload: SignedPayload<'_>, signature: &str, secret: &str) -> bool {
    let expected = sign(&canonical_string(payload), secret);
    expected.as_bytes().ct_eq(signature.as_bytes()).into()
}

/// Callback verifier bound to the merchant's HMAC secret.
#[derive(Clone)]
pub struct IntegrityVerifier {
    secret: String,
}

impl IntegrityVerifier {
    pub fn new(secret: impl Into<String>) -> Result<Self, ConfigError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(ConfigError::Missing("HMAC secret"));
        }
        Ok(Self { secret })
    }

    /// Computes the signature the gateway would send for this payload.
    pub fn sign(&self, payload: SignedPayload<'_>) -> String {
        sign(&canonical_string(payload), &self.secret)
    }

    pub fn verify(&self, payload: SignedPayload<'_>, signature: &str) -> bool {
        let authentic = verify(payload, signature, &self.secret);
        if authentic {
            debug!(variant = ?payload.variant(), "Callback signature verified");
        } else {
            warn!(variant = ?payload.variant(), "Callback signature mismatch");
        }
        authentic
    }

    pub fn verify_webhook(&self, envelope: &WebhookEnvelope, signature: &str) -> bool {
        self.verify(SignedPayload::Webhook(envelope), signature)
    }

    /// Verifies a redirect against the signature it carries in `hmac`.
    pub fn verify_redirect(&self, record: &RedirectRecord) -> bool {
        self.verify(SignedPayload::Redirect(record), &record.hmac)
    }

    /// Validates the raw webhook shape, then verifies it.
    ///
    /// A shape mismatch is an `Err`, never a `false` verdict.
    pub fn verify_webhook_json(
        &self,
        raw: &Value,
        signature: &str,
    ) -> Result<bool, ValidationError> {
        let envelope = WebhookEnvelope::from_json(raw)?;
        Ok(self.verify_webhook(&envelope, signature))
    }

    /// Validates the raw redirect shape, then verifies it against its `hmac`.
    pub fn verify_redirect_json(&self, raw: &Value) -> Result<bool, ValidationError> {
        let record = RedirectRecord::from_json(raw)?;
        Ok(self.verify_redirect(&record))
    }

    /// Fail-closed verification.
    pub fn ensure_authentic(
        &self,
        payload: SignedPayload<'_>,
        signature: &str,
    ) -> Result<(), PaymobError> {
        if self.verify(payload, signature) {
            Ok(())
        } else {
            Err(PaymobError::SignatureMismatch)
        }
    }
}

impl fmt::Debug for IntegrityVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntegrityVerifier")
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paymob_types::{OrderRef, SourceData, TransactionObject};

    const SECRET: &str = "hmac_secret_123";

    fn envelope() -> WebhookEnvelope {
        WebhookEnvelope::Transaction(TransactionObject {
            id: 1,
            pending: false,
            amount_cents: 500,
            success: true,
            is_auth: false,
            is_capture: false,
            is_standalone_payment: true,
            is_voided: false,
            is_refunded: false,
            is_3d_secure: false,
            integration_id: 2,
            has_parent_transaction: false,
            created_at: "2024-01-01T00:00:00".into(),
            currency: "EGP".into(),
            error_occured: false,
            order: OrderRef { id: 3 },
            owner: 4,
            source_data: SourceData {
                pan: "1111".into(),
                kind: "card".into(),
                sub_type: "Visa".into(),
            },
        })
    }

    #[test]
    fn test_sign_is_hex_sha512() {
        let signature = sign("payload", SECRET);
        assert_eq!(signature.len(), 128);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_sign_known_vector() {
        // RFC 4231 test case 2.
        assert_eq!(
            sign("what do ya want for nothing?", "Jefe"),
            "164b7a7bfcf819e2e395fbe73b56e0a387bd64222e831fd610270cd7ea2505549758bf75c05a994a\
             6d034f65f8f0e6fdcaeab1a34d4a6b4b636e070a38bce737"
        );
    }

    #[test]
    fn test_verify_round_trip() {
        let verifier = IntegrityVerifier::new(SECRET).unwrap();
        let envelope = envelope();
        let signature = verifier.sign(SignedPayload::from(&envelope));

        assert!(verifier.verify_webhook(&envelope, &signature));
        // Repeated calls give the same verdict.
        assert!(verifier.verify_webhook(&envelope, &signature));
    }

    #[test]
    fn test_single_field_change_fails() {
        let verifier = IntegrityVerifier::new(SECRET).unwrap();
        let original = envelope();
        let signature = verifier.sign(SignedPayload::from(&original));

        let mut tampered = original.clone();
        if let WebhookEnvelope::Transaction(obj) = &mut tampered {
            obj.amount_cents += 1;
        }
        assert!(!verifier.verify_webhook(&tampered, &signature));

        let mut tampered = original;
        if let WebhookEnvelope::Transaction(obj) = &mut tampered {
            obj.success = false;
        }
        assert!(!verifier.verify_webhook(&tampered, &signature));
    }

    #[test]
    fn test_wrong_secret_fails() {
        let envelope = envelope();
        let signature = sign(&canonical_string(SignedPayload::from(&envelope)), SECRET);
        assert!(!verify(SignedPayload::from(&envelope), &signature, "other_secret"));
    }

    #[test]
    fn test_signature_comparison_is_exact() {
        let envelope = envelope();
        let signature = sign(&canonical_string(SignedPayload::from(&envelope)), SECRET);

        assert!(!verify(SignedPayload::from(&envelope), &signature.to_uppercase(), SECRET));
        assert!(!verify(SignedPayload::from(&envelope), &signature[..64], SECRET));
        assert!(!verify(SignedPayload::from(&envelope), "", SECRET));
    }

    #[test]
    fn test_empty_secret_is_config_error() {
        assert_eq!(
            IntegrityVerifier::new("").unwrap_err(),
            ConfigError::Missing("HMAC secret")
        );
    }

    #[test]
    fn test_ensure_authentic() {
        let verifier = IntegrityVerifier::new(SECRET).unwrap();
        let envelope = envelope();
        let signature = verifier.sign(SignedPayload::from(&envelope));

        assert!(
            verifier
                .ensure_authentic(SignedPayload::from(&envelope), &signature)
                .is_ok()
        );
        assert!(matches!(
            verifier.ensure_authentic(SignedPayload::from(&envelope), "deadbeef"),
            Err(PaymobError::SignatureMismatch)
        ));
    }

    #[test]
    fn test_shape_mismatch_is_not_a_verdict() {
        let verifier = IntegrityVerifier::new(SECRET).unwrap();
        let raw = serde_json::json!({"type": "TRANSACTION", "obj": {"id": "not-a-number"}});
        assert!(verifier.verify_webhook_json(&raw, "deadbeef").is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let verifier = IntegrityVerifier::new(SECRET).unwrap();
        assert!(!format!("{:?}", verifier).contains(SECRET));
    }
}
