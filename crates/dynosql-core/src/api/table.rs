use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::encoding;
use crate::error::{Error, StoreError};
use crate::store::{StoreClient, TableDescription};
use crate::types::{PrimaryKey, Record, TableSchema};

use super::filter::{self, Condition};
use super::key_utils;
use super::marshal;

/// A handle to one table.
///
/// Every record operation is exactly one store round trip. Dropping the
/// handle leaves the table in the store; call [`Table::drop_table`] to
/// delete it.
pub struct Table<C> {
    client: Arc<C>,
    schema: TableSchema,
}

impl<C: StoreClient> Table<C> {
    pub(crate) fn new(client: Arc<C>, schema: TableSchema) -> Self {
        Self { client, schema }
    }

    pub fn name(&self) -> &str {
        &self.schema.name
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Fetch the store's current description of this table.
    pub fn describe(&self) -> Result<TableDescription, Error> {
        Ok(self.client.describe_table(self.name())?)
    }

    /// Write a record, replacing any record stored under the same key.
    pub fn put(&self, key: impl Into<PrimaryKey>, attributes: Value) -> Result<(), Error> {
        let key = key.into();
        let item = marshal::to_item(&self.schema, &key, &attributes)?;
        debug!(table = %self.name(), %key, attributes = item.len(), "put");
        self.client.put_item(self.name(), item)?;
        Ok(())
    }

    /// Read the record stored under `key`.
    pub fn get(&self, key: impl Into<PrimaryKey>) -> Result<Record, Error> {
        let key = key.into();
        let resolved = key_utils::resolve_key(&self.schema, &key)?;
        debug!(table = %self.name(), %key, "get");
        match self.client.get_item(self.name(), resolved)? {
            Some(item) => Ok(marshal::from_item(&item)),
            None => Err(Error::NotFound {
                table: self.schema.name.clone(),
                key: key.to_string(),
            }),
        }
    }

    /// Set a single attribute of the record under `key`, leaving the others
    /// untouched.
    pub fn update(
        &self,
        key: impl Into<PrimaryKey>,
        attribute: &str,
        value: impl Into<Value>,
    ) -> Result<(), Error> {
        let key = key.into();
        let resolved = key_utils::resolve_key(&self.schema, &key)?;
        let value = encoding::encode(&value.into())
            .map_err(|e| encoding::with_attribute(e, attribute))?;
        debug!(table = %self.name(), %key, attribute, "update");
        self.client
            .update_item(self.name(), resolved, attribute, value)?;
        Ok(())
    }

    /// Delete the record under `key`. Deleting an absent record succeeds.
    pub fn delete(&self, key: impl Into<PrimaryKey>) -> Result<(), Error> {
        let key = key.into();
        let resolved = key_utils::resolve_key(&self.schema, &key)?;
        debug!(table = %self.name(), %key, "delete");
        self.client.delete_item(self.name(), resolved)?;
        Ok(())
    }

    /// Return every record matching `condition`, evaluated by the store.
    pub fn scan(&self, condition: &Condition) -> Result<Vec<Record>, Error> {
        let compiled = filter::compile(condition)?;
        debug!(table = %self.name(), filter = %compiled.expression, "scan");
        let items = self.client.scan(self.name(), Some(&compiled))?;
        Ok(items.iter().map(marshal::from_item).collect())
    }

    /// Return every record in the table.
    pub fn scan_all(&self) -> Result<Vec<Record>, Error> {
        debug!(table = %self.name(), "scan");
        let items = self.client.scan(self.name(), None)?;
        Ok(items.iter().map(marshal::from_item).collect())
    }

    /// Delete the table from the store. A table that is already gone is not
    /// an error.
    pub fn drop_table(self) -> Result<(), Error> {
        debug!(table = %self.name(), "drop table");
        match self.client.delete_table(self.name()) {
            Ok(()) | Err(StoreError::TableNotFound(_)) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
