//! In-process store backend.
//!
//! Tables live in a shared map behind a `parking_lot::RwLock`; cloning a
//! `MemoryStore` yields another handle to the same tables. Reads take the
//! read lock, writes take the write lock.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::api::filter::CompiledFilter;
use crate::api::key_utils;
use crate::encoding::{AttributeValue, Item, number};
use crate::error::StoreError;
use crate::types::TableSchema;

use super::expression::Predicate;
use super::{AttributeDefinition, KeySchemaElement, StoreClient, TableDescription};

struct MemTable {
    description: TableDescription,
    schema: TableSchema,
    /// Items keyed by the JSON rendering of their canonical structured key.
    items: BTreeMap<String, Item>,
}

impl MemTable {
    fn slot(&self, key: &Item) -> Result<String, StoreError> {
        // Reject keys that carry extra or missing attributes.
        let mut normalized = key_utils::extract_key(&self.schema, key)?;
        if normalized.len() != key.len() {
            return Err(StoreError::Validation(format!(
                "key for table '{}' must contain only its key attributes",
                self.schema.name
            )));
        }
        // Numbers are identified by value: "1984" and "1984.0" share a slot.
        for value in normalized.values_mut() {
            if let AttributeValue::N(text) = value {
                *text = number::canonical_number(text);
            }
        }
        serde_json::to_string(&normalized).map_err(|e| StoreError::Backend(Box::new(e)))
    }
}

/// A store that keeps every table in memory.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<BTreeMap<String, MemTable>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn table_not_found(name: &str) -> StoreError {
    StoreError::TableNotFound(name.to_string())
}

impl StoreClient for MemoryStore {
    fn create_table(
        &self,
        name: &str,
        key_schema: &[KeySchemaElement],
        attribute_definitions: &[AttributeDefinition],
    ) -> Result<TableDescription, StoreError> {
        let description = TableDescription {
            table_name: name.to_string(),
            key_schema: key_schema.to_vec(),
            attribute_definitions: attribute_definitions.to_vec(),
            item_count: 0,
        };
        let schema = description.schema()?;

        let mut tables = self.tables.write();
        if tables.contains_key(name) {
            return Err(StoreError::TableAlreadyExists(name.to_string()));
        }
        tables.insert(
            name.to_string(),
            MemTable {
                description: description.clone(),
                schema,
                items: BTreeMap::new(),
            },
        );
        Ok(description)
    }

    fn describe_table(&self, name: &str) -> Result<TableDescription, StoreError> {
        let tables = self.tables.read();
        let table = tables.get(name).ok_or_else(|| table_not_found(name))?;
        Ok(TableDescription {
            item_count: table.items.len() as u64,
            ..table.description.clone()
        })
    }

    fn delete_table(&self, name: &str) -> Result<(), StoreError> {
        self.tables
            .write()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| table_not_found(name))
    }

    fn list_tables(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.tables.read().keys().cloned().collect())
    }

    fn put_item(&self, table: &str, item: Item) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        let t = tables.get_mut(table).ok_or_else(|| table_not_found(table))?;
        let key = key_utils::extract_key(&t.schema, &item)?;
        let slot = t.slot(&key)?;
        t.items.insert(slot, item);
        Ok(())
    }

    fn get_item(&self, table: &str, key: Item) -> Result<Option<Item>, StoreError> {
        let tables = self.tables.read();
        let t = tables.get(table).ok_or_else(|| table_not_found(table))?;
        let slot = t.slot(&key)?;
        Ok(t.items.get(&slot).cloned())
    }

    fn update_item(
        &self,
        table: &str,
        key: Item,
        attribute: &str,
        value: AttributeValue,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        let t = tables.get_mut(table).ok_or_else(|| table_not_found(table))?;
        if t.schema.is_key_attribute(attribute) {
            return Err(StoreError::Validation(format!(
                "cannot update key attribute '{attribute}' in table '{table}'"
            )));
        }
        let slot = t.slot(&key)?;
        // Updating an absent item creates it from the key.
        let item = t.items.entry(slot).or_insert(key);
        item.insert(attribute.to_string(), value);
        Ok(())
    }

    fn delete_item(&self, table: &str, key: Item) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        let t = tables.get_mut(table).ok_or_else(|| table_not_found(table))?;
        let slot = t.slot(&key)?;
        t.items.remove(&slot);
        Ok(())
    }

    fn scan(
        &self,
        table: &str,
        filter: Option<&CompiledFilter>,
    ) -> Result<Vec<Item>, StoreError> {
        let predicate = filter.map(Predicate::parse).transpose()?;
        let tables = self.tables.read();
        let t = tables.get(table).ok_or_else(|| table_not_found(table))?;
        Ok(t.items
            .values()
            .filter(|item| predicate.as_ref().is_none_or(|p| p.matches(item)))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::filter::{Condition, compile};
    use crate::encoding::encode_record;
    use crate::store::key_schema_for;
    use crate::types::{KeyDescriptor, TypeTag};
    use serde_json::json;

    fn item(v: serde_json::Value) -> Item {
        encode_record(v.as_object().unwrap()).unwrap()
    }

    fn create_music(store: &MemoryStore) {
        let schema = TableSchema {
            name: "music".to_string(),
            partition_key: KeyDescriptor::new("artist", TypeTag::S),
            sort_key: Some(KeyDescriptor::new("song", TypeTag::S)),
        };
        let (ks, defs) = key_schema_for(&schema);
        store.create_table("music", &ks, &defs).unwrap();
    }

    fn key(artist: &str, song: &str) -> Item {
        item(json!({"artist": artist, "song": song}))
    }

    #[test]
    fn test_create_and_list_tables() {
        let store = MemoryStore::new();
        create_music(&store);
        assert_eq!(store.list_tables().unwrap(), vec!["music"]);

        let desc = store.describe_table("music").unwrap();
        assert_eq!(desc.table_name, "music");
        assert_eq!(desc.key_schema.len(), 2);
    }

    #[test]
    fn test_create_duplicate_table() {
        let store = MemoryStore::new();
        create_music(&store);
        let (ks, defs) = (
            store.describe_table("music").unwrap().key_schema,
            store.describe_table("music").unwrap().attribute_definitions,
        );
        let result = store.create_table("music", &ks, &defs);
        assert!(matches!(result, Err(StoreError::TableAlreadyExists(_))));
    }

    #[test]
    fn test_delete_missing_table() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.delete_table("nope"),
            Err(StoreError::TableNotFound(_))
        ));
    }

    #[test]
    fn test_put_get_overwrite() {
        let store = MemoryStore::new();
        create_music(&store);

        store
            .put_item(
                "music",
                item(json!({"artist": "Prince", "song": "Kiss", "released": 1986, "album": "Parade"})),
            )
            .unwrap();
        store
            .put_item(
                "music",
                item(json!({"artist": "Prince", "song": "Kiss", "released": 1986})),
            )
            .unwrap();

        let got = store.get_item("music", key("Prince", "Kiss")).unwrap().unwrap();
        // Overwrite replaces, never merges.
        assert!(!got.contains_key("album"));
        assert_eq!(store.describe_table("music").unwrap().item_count, 1);

        assert!(store.get_item("music", key("Prince", "1999")).unwrap().is_none());
    }

    #[test]
    fn test_put_missing_key_attribute() {
        let store = MemoryStore::new();
        create_music(&store);
        let result = store.put_item("music", item(json!({"artist": "Prince"})));
        assert!(matches!(
            result,
            Err(StoreError::MissingKeyAttribute { ref attribute, .. }) if attribute == "song"
        ));
    }

    #[test]
    fn test_get_with_extra_key_attributes() {
        let store = MemoryStore::new();
        create_music(&store);
        let mut k = key("Prince", "Kiss");
        k.insert("released".to_string(), AttributeValue::N("1986".to_string()));
        assert!(matches!(
            store.get_item("music", k),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn test_update_item() {
        let store = MemoryStore::new();
        create_music(&store);
        store
            .put_item(
                "music",
                item(json!({"artist": "Prince", "song": "Kiss", "released": 1986, "album": "Parade"})),
            )
            .unwrap();

        store
            .update_item(
                "music",
                key("Prince", "Kiss"),
                "released",
                AttributeValue::N("1985".to_string()),
            )
            .unwrap();
        let got = store.get_item("music", key("Prince", "Kiss")).unwrap().unwrap();
        assert_eq!(got["released"], AttributeValue::N("1985".to_string()));
        assert_eq!(got["album"], AttributeValue::S("Parade".to_string()));

        // Upsert on an absent key.
        store
            .update_item(
                "music",
                key("Prince", "1999"),
                "released",
                AttributeValue::N("1982".to_string()),
            )
            .unwrap();
        let got = store.get_item("music", key("Prince", "1999")).unwrap().unwrap();
        assert_eq!(got.len(), 3);

        let result = store.update_item(
            "music",
            key("Prince", "Kiss"),
            "song",
            AttributeValue::S("Kiss (Extended)".to_string()),
        );
        assert!(matches!(result, Err(StoreError::Validation(_))));
    }

    #[test]
    fn test_delete_item_idempotent() {
        let store = MemoryStore::new();
        create_music(&store);
        store
            .put_item("music", item(json!({"artist": "Prince", "song": "Kiss"})))
            .unwrap();
        store.delete_item("music", key("Prince", "Kiss")).unwrap();
        store.delete_item("music", key("Prince", "Kiss")).unwrap();
        assert!(store.get_item("music", key("Prince", "Kiss")).unwrap().is_none());
    }

    #[test]
    fn test_scan_with_filter() {
        let store = MemoryStore::new();
        create_music(&store);
        for (song, year) in [("Kiss", 1986), ("1999", 1982), ("Little Red Corvette", 1983)] {
            store
                .put_item(
                    "music",
                    item(json!({"artist": "Prince", "song": song, "released": year})),
                )
                .unwrap();
        }

        assert_eq!(store.scan("music", None).unwrap().len(), 3);

        let filter = compile(&Condition::eq("released", 1983)).unwrap();
        let hits = store.scan("music", Some(&filter)).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(
            hits[0]["song"],
            AttributeValue::S("Little Red Corvette".to_string())
        );

        let filter = compile(&Condition::ge("released", 1983)).unwrap();
        assert_eq!(store.scan("music", Some(&filter)).unwrap().len(), 2);
    }

    #[test]
    fn test_operations_on_missing_table() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.get_item("nope", Item::new()),
            Err(StoreError::TableNotFound(_))
        ));
        assert!(matches!(
            store.scan("nope", None),
            Err(StoreError::TableNotFound(_))
        ));
    }

    #[test]
    fn test_numeric_keys_match_by_value() {
        let store = MemoryStore::new();
        let schema = TableSchema {
            name: "years".to_string(),
            partition_key: KeyDescriptor::new("year", TypeTag::N),
            sort_key: None,
        };
        let (ks, defs) = key_schema_for(&schema);
        store.create_table("years", &ks, &defs).unwrap();

        store
            .put_item("years", item(json!({"year": 1984, "album": "Purple Rain"})))
            .unwrap();
        let got = store
            .get_item("years", item(json!({"year": 1984.0})))
            .unwrap()
            .unwrap();
        assert_eq!(got["album"], AttributeValue::S("Purple Rain".to_string()));

        // Overwriting through an equal number replaces the same record.
        store
            .put_item("years", item(json!({"year": 1984.0, "album": "1999"})))
            .unwrap();
        assert_eq!(store.describe_table("years").unwrap().item_count, 1);

        store.delete_item("years", item(json!({"year": 1.984e3}))).unwrap();
        assert_eq!(store.describe_table("years").unwrap().item_count, 0);
    }

    #[test]
    fn test_clones_share_tables() {
        let store = MemoryStore::new();
        let other = store.clone();
        create_music(&store);
        assert_eq!(other.list_tables().unwrap(), vec!["music"]);
    }
}
