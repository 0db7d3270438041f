//! Lenient scalar deserializers.
//!
//! Redirect query parameters arrive as strings (`"true"`, `"100000"`), while
//! webhook bodies carry native JSON scalars. Both decode to the same value.

use serde::de::Error;
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Bool(bool),
    Int(i64),
    Text(String),
}

pub(crate) fn int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    match Scalar::deserialize(deserializer)? {
        Scalar::Int(n) => Ok(n),
        Scalar::Text(s) => s
            .parse()
            .map_err(|_| D::Error::custom(format!("expected an integer, got {:?}", s))),
        Scalar::Bool(b) => Err(D::Error::custom(format!("expected an integer, got {}", b))),
    }
}

pub(crate) fn boolean<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    match Scalar::deserialize(deserializer)? {
        Scalar::Bool(b) => Ok(b),
        Scalar::Text(s) if s == "true" => Ok(true),
        Scalar::Text(s) if s == "false" => Ok(false),
        Scalar::Text(s) => Err(D::Error::custom(format!("expected a boolean, got {:?}", s))),
        Scalar::Int(n) => Err(D::Error::custom(format!("expected a boolean, got {}", n))),
    }
}

/// Accepts strings and integers; integers keep their decimal form.
pub(crate) fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Scalar::deserialize(deserializer)? {
        Scalar::Text(s) => Ok(s),
        Scalar::Int(n) => Ok(n.to_string()),
        Scalar::Bool(b) => Err(D::Error::custom(format!("expected a string, got {}", b))),
    }
}

pub(crate) fn opt_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    match Option::<Scalar>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Scalar::Text(s)) => Ok(Some(s)),
        Some(Scalar::Int(n)) => Ok(Some(n.to_string())),
        Some(Scalar::Bool(b)) => Ok(Some(b.to_string())),
    }
}
