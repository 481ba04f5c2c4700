//! Plain attribute values stored in DynamoDB items.

use std::collections::HashMap;
use std::fmt;

/// A DynamoDB item: attribute name to value.
pub type Item = HashMap<String, Value>;

/// Decimal number kept as its exact textual form.
///
/// DynamoDB numbers carry up to 38 digits of precision, so they are never
/// routed through `f64` on the way in or out.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Number(String);

impl Number {
    /// Parse a decimal number such as `"42"`, `"-0.5"` or `"1.2E+3"`.
    pub fn parse(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed.parse::<f64>().map_or(true, |n| !n.is_finite()) {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    /// Wrap a number received from the wire verbatim.
    pub(crate) fn from_wire(text: String) -> Self {
        Self(text)
    }

    /// The exact textual form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// As an integer, if it is one.
    pub fn as_i64(&self) -> Option<i64> {
        self.0.parse().ok()
    }

    /// As a float (may lose precision).
    pub fn as_f64(&self) -> Option<f64> {
        self.0.parse().ok()
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

macro_rules! number_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Number {
                fn from(n: $ty) -> Self {
                    Self(n.to_string())
                }
            }

            impl From<$ty> for Value {
                fn from(n: $ty) -> Self {
                    Value::Number(n.into())
                }
            }
        )*
    };
}

number_from_int!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

impl TryFrom<f64> for Number {
    type Error = f64;

    fn try_from(n: f64) -> Result<Self, f64> {
        if n.is_finite() { Ok(Self(n.to_string())) } else { Err(n) }
    }
}

/// A plain attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Binary(Vec<u8>),
    List(Vec<Value>),
    Map(Item),
    StringSet(Vec<String>),
    NumberSet(Vec<Number>),
    BinarySet(Vec<Vec<u8>>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Item> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Render as JSON. Binary data becomes an array of byte values and sets
    /// become arrays.
    pub fn into_json(self) -> serde_json::Value {
        use serde_json::Value as Json;

        fn number(n: Number) -> Json {
            serde_json::from_str::<serde_json::Number>(n.as_str())
                .map(Json::Number)
                .unwrap_or_else(|_| Json::String(n.0))
        }

        fn bytes(b: Vec<u8>) -> Json {
            Json::Array(b.into_iter().map(Json::from).collect())
        }

        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(b),
            Value::Number(n) => number(n),
            Value::String(s) => Json::String(s),
            Value::Binary(b) => bytes(b),
            Value::List(list) => Json::Array(list.into_iter().map(Value::into_json).collect()),
            Value::Map(map) => Json::Object(
                map.into_iter()
                    .map(|(k, v)| (k, v.into_json()))
                    .collect(),
            ),
            Value::StringSet(set) => Json::Array(set.into_iter().map(Json::String).collect()),
            Value::NumberSet(set) => Json::Array(set.into_iter().map(number).collect()),
            Value::BinarySet(set) => Json::Array(set.into_iter().map(bytes).collect()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Value::Number(n)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Binary(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(list: Vec<Value>) -> Self {
        Value::List(list)
    }
}

impl From<Item> for Value {
    fn from(map: Item) -> Self {
        Value::Map(map)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => Value::Number(Number(n.to_string())),
            Json::String(s) => Value::String(s),
            Json::Array(list) => Value::List(list.into_iter().map(Value::from).collect()),
            Json::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

/// Build an [`Item`] from a JSON object; anything else yields `None`.
pub fn item_from_json(json: serde_json::Value) -> Option<Item> {
    match Value::from(json) {
        Value::Map(map) => Some(map),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_parse() {
        assert_eq!(Number::parse(" 1.50 ").unwrap().as_str(), "1.50");
        assert_eq!(Number::parse("-7").unwrap().as_i64(), Some(-7));
        assert!(Number::parse("").is_none());
        assert!(Number::parse("abc").is_none());
        assert!(Number::parse("NaN").is_none());
        assert!(Number::try_from(f64::INFINITY).is_err());
        assert_eq!(Number::try_from(2.5).unwrap().as_f64(), Some(2.5));
    }

    #[test]
    fn test_from_json() {
        let item = item_from_json(json!({
            "id": "user#1",
            "age": 42,
            "tags": ["a", "b"],
            "profile": {"active": true, "nickname": null}
        }))
        .unwrap();

        assert_eq!(item["id"], Value::from("user#1"));
        assert_eq!(item["age"].as_number().unwrap().as_i64(), Some(42));
        assert_eq!(
            item["tags"],
            Value::List(vec![Value::from("a"), Value::from("b")])
        );
        let profile = item["profile"].as_map().unwrap();
        assert_eq!(profile["active"].as_bool(), Some(true));
        assert!(profile["nickname"].is_null());

        assert!(item_from_json(json!([1, 2])).is_none());
    }

    #[test]
    fn test_into_json() {
        let json = json!({"name": "Ana", "score": 9.5, "nested": {"ok": [true, null]}});
        assert_eq!(Value::from(json.clone()).into_json(), json);

        let set = Value::StringSet(vec!["x".into(), "y".into()]);
        assert_eq!(set.into_json(), json!(["x", "y"]));
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(None::<String>), Value::Null);
        assert_eq!(Value::from(Some(3u8)), Value::Number(Number::from(3u8)));
    }
}
