//! Lenient deserializers for fields the node emits as either strings or numbers

use serde::de::Error;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn coerce<E: Error>(value: Value) -> Result<Option<String>, E> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(E::custom(format!("expected string or number, got {}", other))),
    }
}

pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    coerce(Value::deserialize(deserializer)?)?
        .ok_or_else(|| D::Error::custom("expected string or number, got null"))
}

pub(crate) fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    coerce(Value::deserialize(deserializer)?)
}
