//! Browser redirect records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::de;
use crate::error::ValidationError;

/// Query key the gateway uses for the transaction id on legacy redirects.
pub const LEGACY_ID_KEY: &str = "https://accept.paymobsolutions.com/api/acceptance/post_pay?id";

/// Flattened redirect query parameters, including the signature in `hmac`.
///
/// Nested fields keep their literal dotted keys (`source_data.pan`) and the
/// order is carried as a bare id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedirectRecord {
    #[serde(alias = "https://accept.paymobsolutions.com/api/acceptance/post_pay?id")]
    #[serde(deserialize_with = "de::int")]
    pub id: i64,
    #[serde(deserialize_with = "de::boolean")]
    pub pending: bool,
    #[serde(deserialize_with = "de::int")]
    pub amount_cents: i64,
    #[serde(deserialize_with = "de::boolean")]
    pub success: bool,
    #[serde(deserialize_with = "de::boolean")]
    pub is_auth: bool,
    #[serde(deserialize_with = "de::boolean")]
    pub is_capture: bool,
    #[serde(deserialize_with = "de::boolean")]
    pub is_standalone_payment: bool,
    #[serde(deserialize_with = "de::boolean")]
    pub is_voided: bool,
    #[serde(deserialize_with = "de::boolean")]
    pub is_refunded: bool,
    #[serde(deserialize_with = "de::boolean")]
    pub is_3d_secure: bool,
    #[serde(deserialize_with = "de::int")]
    pub integration_id: i64,
    #[serde(deserialize_with = "de::boolean")]
    pub has_parent_transaction: bool,
    #[serde(deserialize_with = "de::int")]
    pub order: i64,
    pub created_at: String,
    pub currency: String,
    #[serde(deserialize_with = "de::boolean")]
    pub error_occured: bool,
    #[serde(deserialize_with = "de::int")]
    pub owner: i64,
    #[serde(rename = "source_data.pan")]
    pub source_data_pan: String,
    #[serde(rename = "source_data.type")]
    pub source_data_type: String,
    #[serde(rename = "source_data.sub_type")]
    pub source_data_sub_type: String,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub txn_response_code: Option<String>,
    pub hmac: String,
}

impl RedirectRecord {
    /// Validates a redirect object whose values may be native or stringified.
    pub fn from_json(value: &Value) -> Result<Self, ValidationError> {
        Self::deserialize(value).map_err(invalid)
    }

    /// Builds a record from raw query-string pairs.
    ///
    /// The legacy id key is folded into `id` first; later duplicates win.
    pub fn from_query_pairs<I, K, V>(pairs: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map: Map<String, Value> = pairs
            .into_iter()
            .map(|(k, v)| {
                let key: String = k.into();
                let key = if key == LEGACY_ID_KEY { "id".to_string() } else { key };
                (key, Value::String(v.into()))
            })
            .collect();
        Self::deserialize(Value::Object(map)).map_err(invalid)
    }
}

fn invalid(err: serde_json::Error) -> ValidationError {
    ValidationError::InvalidPayload {
        kind: "redirect",
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn query() -> Vec<(&'static str, &'static str)> {
        vec![
            ("id", "192036465"),
            ("pending", "false"),
            ("amount_cents", "100000"),
            ("success", "true"),
            ("is_auth", "false"),
            ("is_capture", "false"),
            ("is_standalone_payment", "true"),
            ("is_voided", "false"),
            ("is_refunded", "false"),
            ("is_3d_secure", "true"),
            ("integration_id", "4097558"),
            ("has_parent_transaction", "false"),
            ("order", "217503754"),
            ("created_at", "2024-06-13T11:33:44.592345"),
            ("currency", "EGP"),
            ("error_occured", "false"),
            ("owner", "1724587"),
            ("source_data.pan", "2346"),
            ("source_data.type", "card"),
            ("source_data.sub_type", "MasterCard"),
            ("txn_response_code", "APPROVED"),
            ("hmac", "abc123"),
        ]
    }

    #[test]
    fn test_from_query_pairs_coerces_scalars() {
        let record = RedirectRecord::from_query_pairs(query()).unwrap();
        assert_eq!(record.id, 192036465);
        assert_eq!(record.amount_cents, 100000);
        assert!(record.success);
        assert!(!record.pending);
        assert_eq!(record.order, 217503754);
        assert_eq!(record.source_data_sub_type, "MasterCard");
        assert_eq!(record.txn_response_code.as_deref(), Some("APPROVED"));
        assert_eq!(record.hmac, "abc123");
    }

    #[test]
    fn test_legacy_id_key_is_accepted() {
        let pairs = query()
            .into_iter()
            .map(|(k, v)| if k == "id" { (LEGACY_ID_KEY, v) } else { (k, v) });
        let record = RedirectRecord::from_query_pairs(pairs).unwrap();
        assert_eq!(record.id, 192036465);
    }

    #[test]
    fn test_legacy_and_plain_id_later_wins() {
        let mut pairs = query();
        pairs.push((LEGACY_ID_KEY, "555"));
        let record = RedirectRecord::from_query_pairs(pairs).unwrap();
        assert_eq!(record.id, 555);

        let mut pairs = vec![(LEGACY_ID_KEY, "555")];
        pairs.extend(query());
        let record = RedirectRecord::from_query_pairs(pairs).unwrap();
        assert_eq!(record.id, 192036465);
    }

    #[test]
    fn test_native_json_values() {
        let record = RedirectRecord::from_json(&json!({
            "id": 1, "pending": false, "amount_cents": 500, "success": true,
            "is_auth": false, "is_capture": false, "is_standalone_payment": true,
            "is_voided": false, "is_refunded": false, "is_3d_secure": false,
            "integration_id": 2, "has_parent_transaction": false, "order": 3,
            "created_at": "2024-01-01T00:00:00", "currency": "EGP",
            "error_occured": false, "owner": 4,
            "source_data.pan": "1111", "source_data.type": "wallet",
            "source_data.sub_type": "wallet", "txn_response_code": 200,
            "hmac": "sig"
        }))
        .unwrap();
        assert_eq!(record.amount_cents, 500);
        assert_eq!(record.txn_response_code.as_deref(), Some("200"));
    }

    #[test]
    fn test_bad_boolean_is_rejected() {
        let pairs = query()
            .into_iter()
            .map(|(k, v)| if k == "success" { (k, "yes") } else { (k, v) });
        let err = RedirectRecord::from_query_pairs(pairs).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidPayload { kind: "redirect", .. }
        ));
    }

    #[test]
    fn test_missing_hmac_is_rejected() {
        let pairs = query().into_iter().filter(|(k, _)| *k != "hmac");
        assert!(RedirectRecord::from_query_pairs(pairs).is_err());
    }
}
