//! Conversion between native records and tagged store items.

use serde_json::Value;

use crate::encoding::{self, Item};
use crate::error::{EncodingError, Error};
use crate::types::{PrimaryKey, Record, TableSchema};

use super::key_utils;

/// Name of a native value's kind, for error messages.
pub(crate) fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Build the full tagged item written by a put.
///
/// The resolved key attributes are merged over the encoded attributes, so a
/// key attribute repeated in `attributes` is replaced by the key's value.
pub fn to_item(schema: &TableSchema, key: &PrimaryKey, attributes: &Value) -> Result<Item, Error> {
    let record = attributes
        .as_object()
        .ok_or_else(|| EncodingError::UnsupportedType {
            kind: kind_name(attributes),
            attribute: None,
        })?;
    let mut item = encoding::encode_record(record)?;
    item.extend(key_utils::resolve_key(schema, key)?);
    Ok(item)
}

/// Decode a tagged item read back from the store.
pub fn from_item(item: &Item) -> Record {
    encoding::decode_item(item)
}
