//! Typed decoding of Pact JSON values
//!
//! Pact encodes values that JSON cannot represent faithfully as tagged
//! objects: `{"decimal": "1.5"}`, `{"int": "123"}` and module references
//! `{"refName": {...}, "refSpec": [...]}`. [`PactValue::from_json`] turns any
//! JSON tree into a closed sum type. Decoding is total: shapes it does not
//! recognise become opaque objects instead of errors.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use num_bigint::BigInt;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map, Number, Value};

/// Qualified module or interface name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RefSpec {
    /// Namespace, absent for root-namespace modules
    #[serde(default)]
    pub namespace: Option<String>,
    /// Bare module name
    pub name: String,
}

impl RefSpec {
    /// Create a reference from namespace and name
    pub fn new(namespace: Option<String>, name: impl Into<String>) -> Self {
        Self {
            namespace,
            name: name.into(),
        }
    }

    fn from_json(value: &Value) -> Option<Self> {
        let name = value.get("name")?.as_str()?.to_string();
        let namespace = match value.get("namespace") {
            None | Some(Value::Null) => None,
            Some(Value::String(ns)) => Some(ns.clone()),
            Some(_) => return None,
        };
        Some(Self { namespace, name })
    }
}

impl fmt::Display for RefSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.namespace.as_deref() {
            Some(ns) if !ns.trim().is_empty() => write!(f, "{}.{}", ns, self.name),
            _ => write!(f, "{}", self.name),
        }
    }
}

/// A module reference value, e.g. `coin` passed as `module{fungible-v2}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleReference {
    /// Referenced module
    pub name: RefSpec,
    /// Interfaces the reference was typed against
    pub interfaces: Vec<RefSpec>,
}

impl ModuleReference {
    fn from_json(map: &Map<String, Value>) -> Option<Self> {
        let name = RefSpec::from_json(map.get("refName")?)?;
        let interfaces = match map.get("refSpec") {
            Some(Value::Array(specs)) => specs.iter().filter_map(RefSpec::from_json).collect(),
            _ => Vec::new(),
        };
        Some(Self { name, interfaces })
    }
}

impl fmt::Display for ModuleReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.name.fmt(f)
    }
}

/// A decoded Pact value
#[derive(Debug, Clone, PartialEq)]
pub enum PactValue {
    /// JSON null
    Null,
    /// Boolean
    Bool(bool),
    /// String
    String(String),
    /// Fixed-point decimal (plain JSON numbers decode here, never to floats).
    ///
    /// Bounded by [`Decimal`]: at most 28 fractional digits, further digits
    /// are rounded. Magnitudes above `Decimal::MAX` do not decode here; a
    /// tagged `{"decimal": ..}` out of range stays an `Object`, a plain
    /// number becomes a `String`.
    Decimal(Decimal),
    /// Arbitrary-precision integer
    Integer(BigInt),
    /// Module reference
    ModuleRef(ModuleReference),
    /// Ordered list
    List(Vec<PactValue>),
    /// Object with no recognised tag, left for the caller to interpret
    Object(BTreeMap<String, PactValue>),
}

impl PactValue {
    /// Decode a JSON value. Never fails.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => PactValue::Null,
            Value::Bool(b) => PactValue::Bool(*b),
            Value::Number(n) => match number_to_decimal(n) {
                Some(d) => PactValue::Decimal(d),
                // Outside the decimal range: keep the digits rather than round
                None => PactValue::String(n.to_string()),
            },
            Value::String(s) => PactValue::String(s.clone()),
            Value::Array(items) => PactValue::List(items.iter().map(Self::from_json).collect()),
            Value::Object(map) => decode_object(map),
        }
    }

    /// Encode back to Pact's tagged JSON form
    pub fn to_json(&self) -> Value {
        match self {
            PactValue::Null => Value::Null,
            PactValue::Bool(b) => Value::Bool(*b),
            PactValue::String(s) => Value::String(s.clone()),
            PactValue::Decimal(d) => json!({ "decimal": d.to_string() }),
            PactValue::Integer(i) => json!({ "int": i.to_string() }),
            PactValue::ModuleRef(m) => json!({
                "refName": m.name,
                "refSpec": m.interfaces,
            }),
            PactValue::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            PactValue::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// Boolean payload
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PactValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// String payload
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PactValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric payload as a decimal; integers convert when they fit
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            PactValue::Decimal(d) => Some(*d),
            PactValue::Integer(i) => Decimal::from_str(&i.to_string()).ok(),
            _ => None,
        }
    }

    /// Numeric payload as an integer; decimals convert when they are whole
    pub fn as_integer(&self) -> Option<BigInt> {
        match self {
            PactValue::Integer(i) => Some(i.clone()),
            PactValue::Decimal(d) if d.fract().is_zero() => d.trunc().to_i128().map(BigInt::from),
            _ => None,
        }
    }

    /// Module reference payload
    pub fn as_module_ref(&self) -> Option<&ModuleReference> {
        match self {
            PactValue::ModuleRef(m) => Some(m),
            _ => None,
        }
    }

    /// List payload
    pub fn as_list(&self) -> Option<&[PactValue]> {
        match self {
            PactValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Object payload
    pub fn as_object(&self) -> Option<&BTreeMap<String, PactValue>> {
        match self {
            PactValue::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Field of an object value
    pub fn get(&self, key: &str) -> Option<&PactValue> {
        self.as_object()?.get(key)
    }

    /// Whether this is JSON null
    pub fn is_null(&self) -> bool {
        matches!(self, PactValue::Null)
    }
}

fn decode_object(map: &Map<String, Value>) -> PactValue {
    if map.contains_key("refName") {
        if let Some(module) = ModuleReference::from_json(map) {
            return PactValue::ModuleRef(module);
        }
    }
    if let Some(d) = map.get("decimal").and_then(parse_decimal) {
        return PactValue::Decimal(d);
    }
    if let Some(i) = map.get("int").and_then(parse_integer) {
        return PactValue::Integer(i);
    }
    PactValue::Object(
        map.iter()
            .map(|(k, v)| (k.clone(), PactValue::from_json(v)))
            .collect(),
    )
}

fn parse_decimal_str(s: &str) -> Option<Decimal> {
    let s = s.trim();
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

fn number_to_decimal(n: &Number) -> Option<Decimal> {
    if let Some(i) = n.as_i64() {
        return Some(Decimal::from(i));
    }
    if let Some(u) = n.as_u64() {
        return Some(Decimal::from(u));
    }
    parse_decimal_str(&n.to_string())
}

fn parse_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(s) => parse_decimal_str(s),
        Value::Number(n) => number_to_decimal(n),
        _ => None,
    }
}

fn parse_integer(value: &Value) -> Option<BigInt> {
    match value {
        Value::String(s) => BigInt::from_str(s.trim()).ok(),
        Value::Number(n) => n
            .as_i64()
            .map(BigInt::from)
            .or_else(|| n.as_u64().map(BigInt::from)),
        _ => None,
    }
}

impl From<&Value> for PactValue {
    fn from(value: &Value) -> Self {
        PactValue::from_json(value)
    }
}

impl From<Value> for PactValue {
    fn from(value: Value) -> Self {
        PactValue::from_json(&value)
    }
}

impl Serialize for PactValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PactValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(PactValue::from_json(&Value::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_tagged_decimal() {
        let v = PactValue::from_json(&json!({ "decimal": "1.5" }));
        assert_eq!(v, PactValue::Decimal(Decimal::new(15, 1)));
    }

    #[test]
    fn test_decode_tagged_decimal_number() {
        let v = PactValue::from_json(&json!({ "decimal": 2 }));
        assert_eq!(v.as_decimal(), Some(Decimal::from(2)));
    }

    #[test]
    fn test_decode_tagged_int() {
        let v = PactValue::from_json(&json!({ "int": "123456789012345678901234567890" }));
        let expected = BigInt::from_str("123456789012345678901234567890").unwrap();
        assert_eq!(v, PactValue::Integer(expected));
    }

    #[test]
    fn test_decode_tagged_int_number() {
        let v = PactValue::from_json(&json!({ "int": 42 }));
        assert_eq!(v, PactValue::Integer(BigInt::from(42)));
    }

    #[test]
    fn test_decode_plain_number_is_decimal() {
        assert_eq!(
            PactValue::from_json(&json!(1.25)),
            PactValue::Decimal(Decimal::new(125, 2))
        );
        assert_eq!(PactValue::from_json(&json!(7)), PactValue::Decimal(Decimal::from(7)));
    }

    #[test]
    fn test_decode_small_float_without_rounding() {
        let v = PactValue::from_json(&json!(0.00000001));
        assert_eq!(v.as_decimal(), Some(Decimal::new(1, 8)));
    }

    #[test]
    fn test_decode_huge_number_falls_back_to_string() {
        let v = PactValue::from_json(&json!(1e300));
        assert!(matches!(v, PactValue::String(_)));
    }

    #[test]
    fn test_decimal_excess_fraction_digits_round() {
        let v = PactValue::from_json(&json!({ "decimal": "0.12345678901234567890123456789012" }));
        assert_eq!(
            v.as_decimal(),
            Some(Decimal::from_str("0.1234567890123456789012345679").unwrap())
        );
    }

    #[test]
    fn test_decimal_out_of_range_stays_object() {
        let v = PactValue::from_json(&json!({ "decimal": "123456789012345678901234567890.5" }));
        assert!(v.as_object().is_some());
        assert_eq!(v.as_decimal(), None);
    }

    #[test]
    fn test_decode_module_ref() {
        let v = PactValue::from_json(&json!({
            "refName": { "namespace": null, "name": "coin" },
            "refSpec": [{ "namespace": null, "name": "fungible-v2" }]
        }));
        let m = v.as_module_ref().unwrap();
        assert_eq!(m.name, RefSpec::new(None, "coin"));
        assert_eq!(m.interfaces.len(), 1);
        assert_eq!(m.to_string(), "coin");
    }

    #[test]
    fn test_module_ref_namespaced_display() {
        let r = RefSpec::new(Some("free".to_string()), "token");
        assert_eq!(r.to_string(), "free.token");
        let r = RefSpec::new(Some(" ".to_string()), "token");
        assert_eq!(r.to_string(), "token");
    }

    #[test]
    fn test_module_ref_takes_precedence_over_decimal() {
        let v = PactValue::from_json(&json!({
            "refName": { "name": "coin" },
            "decimal": "1.0"
        }));
        assert!(v.as_module_ref().is_some());
    }

    #[test]
    fn test_malformed_tags_degrade_to_object() {
        let v = PactValue::from_json(&json!({ "decimal": "abc" }));
        assert_eq!(v.get("decimal"), Some(&PactValue::String("abc".to_string())));

        let v = PactValue::from_json(&json!({ "int": [1] }));
        assert!(v.as_object().is_some());

        let v = PactValue::from_json(&json!({ "refName": 5 }));
        assert!(v.as_object().is_some());
    }

    #[test]
    fn test_decode_nested() {
        let v = PactValue::from_json(&json!({
            "account": "alice",
            "balance": { "decimal": "10.5" },
            "items": [true, { "int": "1" }, null]
        }));
        assert_eq!(v.get("account").and_then(PactValue::as_str), Some("alice"));
        assert_eq!(
            v.get("balance").and_then(PactValue::as_decimal),
            Some(Decimal::new(105, 1))
        );
        let items = v.get("items").and_then(PactValue::as_list).unwrap();
        assert_eq!(items[0], PactValue::Bool(true));
        assert_eq!(items[1], PactValue::Integer(BigInt::from(1)));
        assert!(items[2].is_null());
    }

    #[test]
    fn test_passthrough_scalars() {
        assert_eq!(PactValue::from_json(&json!(true)), PactValue::Bool(true));
        assert_eq!(
            PactValue::from_json(&json!("hello")),
            PactValue::String("hello".to_string())
        );
    }

    #[test]
    fn test_to_json_roundtrip_is_stable() {
        let raw = json!({
            "a": { "decimal": "0.1" },
            "b": { "int": "99999999999999999999999" },
            "c": { "refName": { "namespace": "free", "name": "tok" }, "refSpec": [] },
            "d": ["x", false]
        });
        let once = PactValue::from_json(&raw);
        let twice = PactValue::from_json(&once.to_json());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_as_integer_from_whole_decimal() {
        assert_eq!(
            PactValue::Decimal(Decimal::from(3)).as_integer(),
            Some(BigInt::from(3))
        );
        assert_eq!(PactValue::Decimal(Decimal::new(35, 1)).as_integer(), None);
    }

    #[test]
    fn test_serde_roundtrip() {
        let v = PactValue::from_json(&json!({ "decimal": "2.25" }));
        let s = serde_json::to_string(&v).unwrap();
        let back: PactValue = serde_json::from_str(&s).unwrap();
        assert_eq!(v, back);
    }
}
