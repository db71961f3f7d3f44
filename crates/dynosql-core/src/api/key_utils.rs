use serde_json::Value;

use crate::encoding::{self, AttributeValue, Item};
use crate::error::{AddressingError, Error, StoreError};
use crate::types::{KeyDescriptor, PrimaryKey, TableSchema};

/// Resolve a [`PrimaryKey`] into the structured tagged key the store expects.
///
/// The key's arity must match the schema: `Single` for partition-only tables,
/// `Composite` for tables with a sort key.
pub fn resolve_key(schema: &TableSchema, key: &PrimaryKey) -> Result<Item, Error> {
    let mut resolved = Item::new();
    match (key, &schema.sort_key) {
        (PrimaryKey::Single(pk), None) => {
            resolved.insert(
                schema.partition_key.name.clone(),
                encode_key_attribute(schema, &schema.partition_key, pk)?,
            );
        }
        (PrimaryKey::Composite(pk, sk), Some(sk_def)) => {
            resolved.insert(
                schema.partition_key.name.clone(),
                encode_key_attribute(schema, &schema.partition_key, pk)?,
            );
            resolved.insert(
                sk_def.name.clone(),
                encode_key_attribute(schema, sk_def, sk)?,
            );
        }
        (PrimaryKey::Composite(..), None) => {
            return Err(AddressingError::NoSortKey {
                table: schema.name.clone(),
                key: key.to_string(),
            }
            .into());
        }
        (PrimaryKey::Single(_), Some(_)) => {
            return Err(AddressingError::CompositeKeyRequired {
                table: schema.name.clone(),
                key: key.to_string(),
            }
            .into());
        }
    }
    Ok(resolved)
}

/// Encode one key attribute and check its tag against the descriptor.
fn encode_key_attribute(
    schema: &TableSchema,
    key_def: &KeyDescriptor,
    value: &Value,
) -> Result<AttributeValue, Error> {
    let encoded = encoding::encode(value).map_err(|e| encoding::with_attribute(e, &key_def.name))?;
    if encoded.tag() != key_def.kind {
        return Err(AddressingError::KeyTypeMismatch {
            table: schema.name.clone(),
            attribute: key_def.name.clone(),
            expected: key_def.kind,
            actual: encoded.tag(),
        }
        .into());
    }
    Ok(encoded)
}

/// Extract the structured key from a full tagged item.
///
/// Used by store backends to locate the slot an item occupies.
pub fn extract_key(schema: &TableSchema, item: &Item) -> Result<Item, StoreError> {
    let mut key = Item::new();
    for key_def in std::iter::once(&schema.partition_key).chain(schema.sort_key.as_ref()) {
        let value = item
            .get(&key_def.name)
            .ok_or_else(|| StoreError::MissingKeyAttribute {
                table: schema.name.clone(),
                attribute: key_def.name.clone(),
            })?;
        if value.tag() != key_def.kind {
            return Err(StoreError::Validation(format!(
                "key attribute '{}' in table '{}' must be {}, got {}",
                key_def.name,
                schema.name,
                key_def.kind,
                value.tag()
            )));
        }
        key.insert(key_def.name.clone(), value.clone());
    }
    Ok(key)
}
