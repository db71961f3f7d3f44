//! The store client boundary.
//!
//! [`StoreClient`] is the only way the access layer talks to a store. Every
//! method is one request/response round trip; failures come back as
//! [`StoreError`] and are surfaced unmodified.

pub mod expression;
pub mod memory;

use serde::{Deserialize, Serialize};

use crate::api::filter::CompiledFilter;
use crate::encoding::{AttributeValue, Item};
use crate::error::StoreError;
use crate::types::{KeyDescriptor, TableSchema, TypeTag};

pub use memory::MemoryStore;

/// Role of a key attribute in the key schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyRole {
    #[serde(rename = "HASH")]
    Hash,
    #[serde(rename = "RANGE")]
    Range,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeySchemaElement {
    pub attribute_name: String,
    pub key_type: KeyRole,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttributeDefinition {
    pub attribute_name: String,
    pub attribute_type: TypeTag,
}

/// What the store reports about a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TableDescription {
    pub table_name: String,
    pub key_schema: Vec<KeySchemaElement>,
    pub attribute_definitions: Vec<AttributeDefinition>,
    #[serde(default)]
    pub item_count: u64,
}

impl TableDescription {
    /// Re-derive the table schema from the key schema and attribute definitions.
    ///
    /// Definitions are matched to key schema elements by attribute name.
    pub fn schema(&self) -> Result<TableSchema, StoreError> {
        let mut partition_key = None;
        let mut sort_key = None;

        for element in &self.key_schema {
            let definition = self
                .attribute_definitions
                .iter()
                .find(|d| d.attribute_name == element.attribute_name)
                .ok_or_else(|| {
                    StoreError::Validation(format!(
                        "table '{}' has no attribute definition for key '{}'",
                        self.table_name, element.attribute_name
                    ))
                })?;
            let descriptor =
                KeyDescriptor::new(element.attribute_name.clone(), definition.attribute_type);
            match element.key_type {
                KeyRole::Hash => partition_key = Some(descriptor),
                KeyRole::Range => sort_key = Some(descriptor),
            }
        }

        let partition_key = partition_key.ok_or_else(|| {
            StoreError::Validation(format!(
                "table '{}' has no HASH key in its key schema",
                self.table_name
            ))
        })?;

        Ok(TableSchema {
            name: self.table_name.clone(),
            partition_key,
            sort_key,
        })
    }
}

/// Build the key schema and attribute definitions that create `schema`.
pub fn key_schema_for(schema: &TableSchema) -> (Vec<KeySchemaElement>, Vec<AttributeDefinition>) {
    let mut key_schema = vec![KeySchemaElement {
        attribute_name: schema.partition_key.name.clone(),
        key_type: KeyRole::Hash,
    }];
    let mut definitions = vec![AttributeDefinition {
        attribute_name: schema.partition_key.name.clone(),
        attribute_type: schema.partition_key.kind,
    }];
    if let Some(sk) = &schema.sort_key {
        key_schema.push(KeySchemaElement {
            attribute_name: sk.name.clone(),
            key_type: KeyRole::Range,
        });
        definitions.push(AttributeDefinition {
            attribute_name: sk.name.clone(),
            attribute_type: sk.kind,
        });
    }
    (key_schema, definitions)
}

/// A store backend.
pub trait StoreClient {
    /// Create a table. Fails with `TableAlreadyExists` if the name is taken.
    fn create_table(
        &self,
        name: &str,
        key_schema: &[KeySchemaElement],
        attribute_definitions: &[AttributeDefinition],
    ) -> Result<TableDescription, StoreError>;

    fn describe_table(&self, name: &str) -> Result<TableDescription, StoreError>;

    /// Delete a table. Fails with `TableNotFound` if it does not exist.
    fn delete_table(&self, name: &str) -> Result<(), StoreError>;

    fn list_tables(&self) -> Result<Vec<String>, StoreError>;

    /// Write a full item, replacing any item with the same key.
    fn put_item(&self, table: &str, item: Item) -> Result<(), StoreError>;

    fn get_item(&self, table: &str, key: Item) -> Result<Option<Item>, StoreError>;

    /// Set one attribute of the item at `key`, creating the item if absent.
    fn update_item(
        &self,
        table: &str,
        key: Item,
        attribute: &str,
        value: AttributeValue,
    ) -> Result<(), StoreError>;

    /// Delete the item at `key`. Deleting an absent item is not an error.
    fn delete_item(&self, table: &str, key: Item) -> Result<(), StoreError>;

    /// Read every item, keeping those that pass `filter` when one is given.
    fn scan(&self, table: &str, filter: Option<&CompiledFilter>)
    -> Result<Vec<Item>, StoreError>;
}
