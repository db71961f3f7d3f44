use tracing::{debug, warn};

use crate::error::{AddressingError, Error, StoreError};
use crate::store::{self, StoreClient};
use crate::types::{KeyDescriptor, TableSchema, TypeTag};

use super::database::Dynosql;
use super::table::Table;

// ---------------------------------------------------------------------------
// TableBuilder
// ---------------------------------------------------------------------------

/// Builder for opening a table, creating it if needed.
pub struct TableBuilder<'a, C> {
    db: &'a Dynosql<C>,
    name: String,
    partition_key: Option<(String, TypeTag)>,
    sort_key: Option<(String, TypeTag)>,
}

impl<'a, C: StoreClient> TableBuilder<'a, C> {
    pub(crate) fn new(db: &'a Dynosql<C>, name: String) -> Self {
        Self {
            db,
            name,
            partition_key: None,
            sort_key: None,
        }
    }

    /// Set the partition key attribute and type.
    pub fn partition_key(mut self, name: &str, kind: TypeTag) -> Self {
        self.partition_key = Some((name.to_string(), kind));
        self
    }

    /// Set the (optional) sort key attribute and type.
    pub fn sort_key(mut self, name: &str, kind: TypeTag) -> Self {
        self.sort_key = Some((name.to_string(), kind));
        self
    }

    /// Create the table, or attach to it if it already exists.
    ///
    /// Without a partition key the builder only attaches, failing with
    /// `TableNotFound` if the table does not exist. A sort key on its own is
    /// rejected. When attaching, the schema always comes from the store's
    /// description of the table.
    pub fn open(self) -> Result<Table<C>, Error> {
        let client = self.db.client_arc();

        let Some((pk_name, pk_kind)) = self.partition_key else {
            if self.sort_key.is_some() {
                warn!(table = %self.name, "sort key given without a partition key");
                return Err(AddressingError::SortKeyWithoutPartitionKey { table: self.name }.into());
            }
            debug!(table = %self.name, "attaching to table");
            let schema = client.describe_table(&self.name)?.schema()?;
            return Ok(Table::new(client, schema));
        };

        let requested = TableSchema {
            name: self.name,
            partition_key: KeyDescriptor::new(pk_name, pk_kind),
            sort_key: self
                .sort_key
                .map(|(name, kind)| KeyDescriptor::new(name, kind)),
        };
        let (key_schema, definitions) = store::key_schema_for(&requested);

        match client.create_table(&requested.name, &key_schema, &definitions) {
            Ok(description) => {
                debug!(table = %requested.name, "created table");
                let schema = description.schema()?;
                Ok(Table::new(client, schema))
            }
            Err(StoreError::TableAlreadyExists(_)) => {
                let schema = client.describe_table(&requested.name)?.schema()?;
                if schema != requested {
                    warn!(
                        table = %requested.name,
                        "table exists with a different key schema; using the existing one"
                    );
                }
                debug!(table = %requested.name, "attached to existing table");
                Ok(Table::new(client, schema))
            }
            Err(e) => Err(e.into()),
        }
    }
}
