//! Synchronous adapter over [`DynosqlClient`].
//!
//! [`BlockingClient`] implements [`StoreClient`], so a `Dynosql` handle can
//! run against a server. It owns a current-thread runtime and drives each
//! request to completion with `block_on`; the connection sits behind a mutex,
//! so concurrent callers take turns.
//!
//! Do not call it from inside another tokio runtime.

use std::path::Path;

use parking_lot::Mutex;
use tokio::runtime::Runtime;

use dynosql_core::api::{CompiledFilter, compile_update};
use dynosql_core::encoding::{AttributeValue, Item};
use dynosql_core::error::StoreError;
use dynosql_core::store::{AttributeDefinition, KeySchemaElement, StoreClient, TableDescription};

use crate::client::DynosqlClient;
use crate::error::ClientError;

pub struct BlockingClient {
    runtime: Runtime,
    client: Mutex<DynosqlClient>,
}

impl BlockingClient {
    /// Connect to the server at `path`.
    pub fn connect(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let client = runtime.block_on(DynosqlClient::connect(path))?;
        Ok(Self {
            runtime,
            client: Mutex::new(client),
        })
    }

    /// Connect to the server at the default socket path.
    pub fn connect_default() -> Result<Self, ClientError> {
        Self::connect(crate::default_socket_path())
    }
}

impl StoreClient for BlockingClient {
    fn create_table(
        &self,
        name: &str,
        key_schema: &[KeySchemaElement],
        attribute_definitions: &[AttributeDefinition],
    ) -> Result<TableDescription, StoreError> {
        let mut client = self.client.lock();
        Ok(self.runtime.block_on(client.create_table(
            name,
            key_schema,
            attribute_definitions,
        ))?)
    }

    fn describe_table(&self, name: &str) -> Result<TableDescription, StoreError> {
        let mut client = self.client.lock();
        Ok(self.runtime.block_on(client.describe_table(name))?)
    }

    fn delete_table(&self, name: &str) -> Result<(), StoreError> {
        let mut client = self.client.lock();
        Ok(self.runtime.block_on(client.delete_table(name))?)
    }

    fn list_tables(&self) -> Result<Vec<String>, StoreError> {
        let mut client = self.client.lock();
        Ok(self.runtime.block_on(client.list_tables())?)
    }

    fn put_item(&self, table: &str, item: Item) -> Result<(), StoreError> {
        let mut client = self.client.lock();
        Ok(self.runtime.block_on(client.put_item(table, &item))?)
    }

    fn get_item(&self, table: &str, key: Item) -> Result<Option<Item>, StoreError> {
        let mut client = self.client.lock();
        Ok(self.runtime.block_on(client.get_item(table, &key))?)
    }

    fn update_item(
        &self,
        table: &str,
        key: Item,
        attribute: &str,
        value: AttributeValue,
    ) -> Result<(), StoreError> {
        let update = compile_update(attribute, value);
        let mut client = self.client.lock();
        Ok(self
            .runtime
            .block_on(client.update_item(table, &key, &update))?)
    }

    fn delete_item(&self, table: &str, key: Item) -> Result<(), StoreError> {
        let mut client = self.client.lock();
        Ok(self.runtime.block_on(client.delete_item(table, &key))?)
    }

    fn scan(
        &self,
        table: &str,
        filter: Option<&CompiledFilter>,
    ) -> Result<Vec<Item>, StoreError> {
        let mut client = self.client.lock();
        Ok(self.runtime.block_on(client.scan(table, filter))?)
    }
}
