//! Typed message attributes shared by the queue and pub/sub facades.

use bytes::Bytes;

/// Value of a message attribute.
///
/// Maps onto the `DataType`/`StringValue`/`BinaryValue` triple both SQS and
/// SNS use on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageAttribute {
    String(String),
    /// Numeric value kept as text, as the services transmit it.
    Number(String),
    Binary(Bytes),
}

impl MessageAttribute {
    /// Wire data type.
    pub fn data_type(&self) -> &'static str {
        match self {
            Self::String(_) => "String",
            Self::Number(_) => "Number",
            Self::Binary(_) => "Binary",
        }
    }

    /// Create a numeric attribute.
    pub fn number(n: impl ToString) -> Self {
        Self::Number(n.to_string())
    }

    pub(crate) fn string_value(&self) -> Option<String> {
        match self {
            Self::String(s) | Self::Number(s) => Some(s.clone()),
            Self::Binary(_) => None,
        }
    }

    pub(crate) fn binary_value(&self) -> Option<Vec<u8>> {
        match self {
            Self::Binary(b) => Some(b.to_vec()),
            _ => None,
        }
    }
}

impl From<&str> for MessageAttribute {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for MessageAttribute {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Bytes> for MessageAttribute {
    fn from(b: Bytes) -> Self {
        Self::Binary(b)
    }
}

/// Defines `message_attributes`, converting typed attributes into the
/// `MessageAttributeValue` of one SDK. SQS and SNS generate separate but
/// identically shaped types, so each facade expands this once.
macro_rules! wire_attributes {
    ($value:ty, $blob:ty) => {
        fn message_attributes(
            attributes: &std::collections::HashMap<String, $crate::attributes::MessageAttribute>,
        ) -> $crate::Result<std::collections::HashMap<String, $value>> {
            attributes
                .iter()
                .map(|(name, value)| {
                    let value = <$value>::builder()
                        .data_type(value.data_type())
                        .set_string_value(value.string_value())
                        .set_binary_value(value.binary_value().map(<$blob>::new))
                        .build()
                        .map_err($crate::AwsError::invalid_request)?;
                    Ok::<_, $crate::AwsError>((name.clone(), value))
                })
                .collect()
        }
    };
}

pub(crate) use wire_attributes;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_types() {
        assert_eq!(MessageAttribute::from("x").data_type(), "String");
        assert_eq!(MessageAttribute::number(42).data_type(), "Number");
        assert_eq!(MessageAttribute::from(Bytes::from_static(b"\x01")).data_type(), "Binary");
    }

    #[test]
    fn test_values() {
        let n = MessageAttribute::number(1.5);
        assert_eq!(n.string_value().as_deref(), Some("1.5"));
        assert!(n.binary_value().is_none());

        let b = MessageAttribute::Binary(Bytes::from_static(&[0, 1]));
        assert_eq!(b.binary_value(), Some(vec![0, 1]));
        assert!(b.string_value().is_none());
    }
}
