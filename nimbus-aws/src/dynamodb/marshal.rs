//! Conversion between plain items and DynamoDB's typed wire encoding.
//!
//! Pure functions, testable without a DynamoDB endpoint.

use std::collections::HashMap;

use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::AttributeValue;

use super::value::{Item, Number, Value};
use crate::{AwsError, Result};

/// Wire form of an item.
pub type WireItem = HashMap<String, AttributeValue>;

/// Convert a plain item to its wire encoding.
pub fn marshall(item: &Item) -> WireItem {
    item.iter()
        .map(|(name, value)| (name.clone(), marshall_value(value)))
        .collect()
}

/// Convert a wire item back to a plain item.
pub fn unmarshall(item: WireItem) -> Result<Item> {
    item.into_iter()
        .map(|(name, value)| Ok::<_, AwsError>((name, unmarshall_value(value)?)))
        .collect()
}

/// Convert one plain value to its wire encoding.
pub fn marshall_value(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.as_str().to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Binary(b) => AttributeValue::B(Blob::new(b.clone())),
        Value::List(list) => AttributeValue::L(list.iter().map(marshall_value).collect()),
        Value::Map(map) => AttributeValue::M(marshall(map)),
        Value::StringSet(set) => AttributeValue::Ss(set.clone()),
        Value::NumberSet(set) => {
            AttributeValue::Ns(set.iter().map(|n| n.as_str().to_string()).collect())
        }
        Value::BinarySet(set) => {
            AttributeValue::Bs(set.iter().map(|b| Blob::new(b.clone())).collect())
        }
    }
}

/// Convert one wire value back to a plain value.
pub fn unmarshall_value(value: AttributeValue) -> Result<Value> {
    Ok(match value {
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::Bool(b) => Value::Bool(b),
        AttributeValue::N(n) => Value::Number(Number::from_wire(n)),
        AttributeValue::S(s) => Value::String(s),
        AttributeValue::B(b) => Value::Binary(b.into_inner()),
        AttributeValue::L(list) => Value::List(
            list.into_iter()
                .map(unmarshall_value)
                .collect::<Result<_>>()?,
        ),
        AttributeValue::M(map) => Value::Map(unmarshall(map)?),
        AttributeValue::Ss(set) => Value::StringSet(set),
        AttributeValue::Ns(set) => Value::NumberSet(set.into_iter().map(Number::from_wire).collect()),
        AttributeValue::Bs(set) => Value::BinarySet(set.into_iter().map(Blob::into_inner).collect()),
        other => {
            return Err(AwsError::Marshalling(format!(
                "unsupported attribute value: {:?}",
                other
            )));
        }
    })
}

/// Pagination position returned by scan and query.
///
/// Holds the wire form of `LastEvaluatedKey` untouched so it can be replayed
/// as `ExclusiveStartKey` exactly as the service produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Cursor(WireItem);

impl Cursor {
    pub(crate) fn from_wire(key: WireItem) -> Self {
        Self(key)
    }

    pub(crate) fn into_wire(self) -> WireItem {
        self.0
    }

    /// Rebuild a cursor from a key previously obtained with [`Cursor::to_key`],
    /// e.g. after a round trip through an HTTP client.
    pub fn from_key(key: &Item) -> Self {
        Self(marshall(key))
    }

    /// The key this cursor points at, as a plain item.
    pub fn to_key(&self) -> Result<Item> {
        unmarshall(self.0.clone())
    }
}

/// One page of scan or query results.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Page {
    pub items: Vec<Item>,
    /// Present when more results remain.
    pub cursor: Option<Cursor>,
}

impl Page {
    pub(crate) fn from_wire(items: Option<Vec<WireItem>>, last_key: Option<WireItem>) -> Result<Self> {
        let items = items
            .unwrap_or_default()
            .into_iter()
            .map(unmarshall)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            items,
            cursor: last_key.filter(|key| !key.is_empty()).map(Cursor::from_wire),
        })
    }

    /// Whether another page can be requested.
    pub fn has_more(&self) -> bool {
        self.cursor.is_some()
    }
}
