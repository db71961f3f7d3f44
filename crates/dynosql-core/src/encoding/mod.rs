//! Tagged value codec: native `serde_json::Value`s <-> wire `AttributeValue`s.
//!
//! Every wire value is a single-key object naming its type tag:
//!
//! ```text
//! {"S": "Purple Rain"}
//! {"N": "1984"}
//! {"M": {"label": {"S": "Warner"}}}
//! {"L": [{"N": "1"}, {"S": "two"}]}
//! ```

pub mod number;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EncodingError;
use crate::types::{Record, TypeTag};

/// A tagged wire item: attribute name to tagged value.
pub type Item = BTreeMap<String, AttributeValue>;

/// A tagged wire value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    S(String),
    N(String),
    M(BTreeMap<String, AttributeValue>),
    L(Vec<AttributeValue>),
}

impl AttributeValue {
    pub fn tag(&self) -> TypeTag {
        match self {
            AttributeValue::S(_) => TypeTag::S,
            AttributeValue::N(_) => TypeTag::N,
            AttributeValue::M(_) => TypeTag::M,
            AttributeValue::L(_) => TypeTag::L,
        }
    }
}

/// Encode a native value into its tagged wire form.
///
/// Booleans and nulls have no tag and fail with `UnsupportedType`.
pub fn encode(value: &Value) -> Result<AttributeValue, EncodingError> {
    match value {
        Value::String(s) => Ok(AttributeValue::S(s.clone())),
        Value::Number(n) => Ok(AttributeValue::N(number::encode_number(n))),
        Value::Object(map) => {
            let mut out = BTreeMap::new();
            for (name, v) in map {
                out.insert(name.clone(), encode(v)?);
            }
            Ok(AttributeValue::M(out))
        }
        Value::Array(items) => items
            .iter()
            .map(encode)
            .collect::<Result<Vec<_>, _>>()
            .map(AttributeValue::L),
        Value::Bool(_) => Err(EncodingError::UnsupportedType {
            kind: "boolean",
            attribute: None,
        }),
        Value::Null => Err(EncodingError::UnsupportedType {
            kind: "null",
            attribute: None,
        }),
    }
}

/// Decode a tagged wire value into a native value.
///
/// `N` values go through [`number::decode_number`]; all other tags are
/// structural.
pub fn decode(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::N(text) => number::decode_number(text),
        AttributeValue::M(map) => Value::Object(
            map.iter()
                .map(|(name, v)| (name.clone(), decode(v)))
                .collect(),
        ),
        AttributeValue::L(items) => Value::Array(items.iter().map(decode).collect()),
    }
}

/// Encode every attribute of a native record, naming the attribute on failure.
pub fn encode_record(record: &Record) -> Result<Item, EncodingError> {
    let mut item = Item::new();
    for (name, value) in record {
        let encoded = encode(value).map_err(|e| with_attribute(e, name))?;
        item.insert(name.clone(), encoded);
    }
    Ok(item)
}

/// Decode a tagged wire item into a native record.
pub fn decode_item(item: &Item) -> Record {
    item.iter()
        .map(|(name, v)| (name.clone(), decode(v)))
        .collect()
}

/// Parse a JSON value holding a tagged item (`{"attr": {"S": "..."}, ...}`).
pub fn item_from_json(value: &Value) -> Result<Item, EncodingError> {
    serde_json::from_value(value.clone()).map_err(|e| EncodingError::MalformedValue(e.to_string()))
}

/// Attach an attribute name to an encoding error that has none yet.
pub(crate) fn with_attribute(err: EncodingError, name: &str) -> EncodingError {
    match err {
        EncodingError::UnsupportedType {
            kind,
            attribute: None,
        } => EncodingError::UnsupportedType {
            kind,
            attribute: Some(name.to_string()),
        },
        other => other,
    }
}
