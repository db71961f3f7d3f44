use std::sync::Arc;

use tracing::debug;

use crate::error::{Error, StoreError};
use crate::store::StoreClient;

use super::builders::TableBuilder;

/// The main database handle.
///
/// Wraps a store client. `Dynosql` is cheaply clonable (`Arc`-based); every
/// clone and every [`Table`](super::Table) opened from it share the client.
pub struct Dynosql<C> {
    client: Arc<C>,
}

impl<C> Clone for Dynosql<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
        }
    }
}

impl<C: StoreClient> Dynosql<C> {
    pub fn new(client: C) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// The underlying store client.
    pub fn client(&self) -> &C {
        &self.client
    }

    pub(crate) fn client_arc(&self) -> Arc<C> {
        Arc::clone(&self.client)
    }

    /// Open a table, creating it when key attributes are given.
    pub fn table(&self, name: &str) -> TableBuilder<'_, C> {
        TableBuilder::new(self, name.to_string())
    }

    /// List all table names.
    pub fn table_names(&self) -> Result<Vec<String>, Error> {
        Ok(self.client.list_tables()?)
    }

    /// Delete a table by name. A missing table is not an error.
    pub fn delete_table(&self, name: &str) -> Result<(), Error> {
        debug!(table = %name, "delete table");
        match self.client.delete_table(name) {
            Ok(()) | Err(StoreError::TableNotFound(_)) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
