//! Client library for connecting to a `dynosql-server` via Unix socket.
//!
//! Each method serializes a JSON-line request, sends it, reads a JSON-line
//! response, and returns the parsed result.

use std::path::Path;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::UnixStream;
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};

use dynosql_core::api::{CompiledFilter, CompiledUpdate, ItemResponse};
use dynosql_core::encoding::Item;
use dynosql_core::store::{AttributeDefinition, KeySchemaElement, TableDescription};

use crate::error::ClientError;
use crate::protocol::ErrorResponse;

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Client for a dynosql server.
pub struct DynosqlClient {
    reader: BufReader<OwnedReadHalf>,
    writer: BufWriter<OwnedWriteHalf>,
    line_buf: String,
}

impl DynosqlClient {
    /// Connect to a dynosql server at the given Unix socket path.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let stream = UnixStream::connect(path.as_ref()).await?;
        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(read_half),
            writer: BufWriter::new(write_half),
            line_buf: String::new(),
        })
    }

    /// Create a table.
    pub async fn create_table(
        &mut self,
        table: &str,
        key_schema: &[KeySchemaElement],
        attribute_definitions: &[AttributeDefinition],
    ) -> Result<TableDescription> {
        let req = serde_json::json!({
            "op": "create_table",
            "TableName": table,
            "KeySchema": key_schema,
            "AttributeDefinitions": attribute_definitions,
        });
        let resp = self.send_request(&req).await?;
        table_from_response(&resp)
    }

    /// Describe a table.
    pub async fn describe_table(&mut self, table: &str) -> Result<TableDescription> {
        let req = serde_json::json!({
            "op": "describe_table",
            "TableName": table,
        });
        let resp = self.send_request(&req).await?;
        table_from_response(&resp)
    }

    /// Delete a table.
    pub async fn delete_table(&mut self, table: &str) -> Result<()> {
        let req = serde_json::json!({
            "op": "delete_table",
            "TableName": table,
        });
        let resp = self.send_request(&req).await?;
        check_ok(&resp)
    }

    /// List all table names.
    pub async fn list_tables(&mut self) -> Result<Vec<String>> {
        let req = serde_json::json!({"op": "list_tables"});
        let resp = self.send_request(&req).await?;
        tables_from_response(&resp)
    }

    /// Put a tagged item, replacing any item with the same key.
    pub async fn put_item(&mut self, table: &str, item: &Item) -> Result<()> {
        let req = serde_json::json!({
            "op": "put_item",
            "TableName": table,
            "Item": item,
        });
        let resp = self.send_request(&req).await?;
        check_ok(&resp)
    }

    /// Get a tagged item by its structured key.
    pub async fn get_item(&mut self, table: &str, key: &Item) -> Result<Option<Item>> {
        let req = serde_json::json!({
            "op": "get_item",
            "TableName": table,
            "Key": key,
        });
        let resp = self.send_request(&req).await?;
        item_from_response(&resp)
    }

    /// Apply a compiled `SET` update to the item at `key`.
    pub async fn update_item(
        &mut self,
        table: &str,
        key: &Item,
        update: &CompiledUpdate,
    ) -> Result<()> {
        let req = serde_json::json!({
            "op": "update_item",
            "TableName": table,
            "Key": key,
            "UpdateExpression": update.expression,
            "ExpressionAttributeNames": update.names,
            "ExpressionAttributeValues": update.values,
        });
        let resp = self.send_request(&req).await?;
        check_ok(&resp)
    }

    /// Delete an item by key.
    pub async fn delete_item(&mut self, table: &str, key: &Item) -> Result<()> {
        let req = serde_json::json!({
            "op": "delete_item",
            "TableName": table,
            "Key": key,
        });
        let resp = self.send_request(&req).await?;
        check_ok(&resp)
    }

    /// Scan a table, optionally filtered.
    pub async fn scan(
        &mut self,
        table: &str,
        filter: Option<&CompiledFilter>,
    ) -> Result<Vec<Item>> {
        let mut req = serde_json::json!({
            "op": "scan",
            "TableName": table,
        });
        if let Some(filter) = filter
            && let Some(obj) = req.as_object_mut()
        {
            obj.insert(
                "FilterExpression".to_string(),
                Value::String(filter.expression.clone()),
            );
            obj.insert(
                "ExpressionAttributeValues".to_string(),
                serde_json::to_value(&filter.values).map_err(ClientError::Serialization)?,
            );
        }
        let resp = self.send_request(&req).await?;
        items_from_response(&resp)
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    async fn send_request(&mut self, req: &Value) -> Result<Value> {
        let mut data = serde_json::to_vec(req).map_err(ClientError::Serialization)?;
        data.push(b'\n');
        self.writer.write_all(&data).await?;
        self.writer.flush().await?;

        self.line_buf.clear();
        let n = self.reader.read_line(&mut self.line_buf).await?;
        if n == 0 {
            return Err(ClientError::Disconnected);
        }

        let resp: Value =
            serde_json::from_str(self.line_buf.trim()).map_err(ClientError::Serialization)?;
        Ok(resp)
    }
}

// ---------------------------------------------------------------------------
// Response parsing helpers
// ---------------------------------------------------------------------------

fn check_error(resp: &Value) -> Result<()> {
    if let Some(err) = resp.get("error") {
        let error = err.as_str().unwrap_or("Unknown").to_string();
        let message = resp
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("")
            .to_string();
        let table = resp
            .get("table")
            .and_then(|t| t.as_str())
            .map(|t| t.to_string());

        return Err(ClientError::Server(ErrorResponse {
            error,
            message,
            table,
        }));
    }
    Ok(())
}

fn check_ok(resp: &Value) -> Result<()> {
    check_error(resp)?;
    Ok(())
}

fn unwrap_items(resp: &Value) -> Result<Option<ItemResponse>> {
    ItemResponse::from_json(resp).map_err(|e| ClientError::Protocol(e.to_string()))
}

fn item_from_response(resp: &Value) -> Result<Option<Item>> {
    check_error(resp)?;
    match unwrap_items(resp)? {
        Some(ItemResponse::Item(item)) => Ok(Some(item)),
        None => Ok(None),
        Some(ItemResponse::Items(_)) => Err(ClientError::Protocol(
            "expected 'Item' in get_item response, got 'Items'".to_string(),
        )),
    }
}

fn items_from_response(resp: &Value) -> Result<Vec<Item>> {
    check_error(resp)?;
    match unwrap_items(resp)? {
        Some(ItemResponse::Items(items)) => Ok(items),
        Some(ItemResponse::Item(item)) => Ok(vec![item]),
        None => Err(ClientError::Protocol(
            "missing 'Items' array in scan response".to_string(),
        )),
    }
}

fn table_from_response(resp: &Value) -> Result<TableDescription> {
    check_error(resp)?;
    let table = resp
        .get("Table")
        .ok_or_else(|| ClientError::Protocol("missing 'Table' in response".to_string()))?;
    serde_json::from_value(table.clone()).map_err(ClientError::Serialization)
}

fn tables_from_response(resp: &Value) -> Result<Vec<String>> {
    check_error(resp)?;
    let tables = resp
        .get("TableNames")
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(|s| s.to_string()))
                .collect()
        })
        .unwrap_or_default();
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynosql_core::encoding::AttributeValue;
    use serde_json::json;

    #[test]
    fn test_check_error_carries_table() {
        let err = check_ok(&json!({
            "error": "TableNotFound",
            "message": "table not found: music",
            "table": "music"
        }))
        .unwrap_err();
        match err {
            ClientError::Server(resp) => {
                assert_eq!(resp.error, "TableNotFound");
                assert_eq!(resp.table.as_deref(), Some("music"));
            }
            other => panic!("expected server error, got {other:?}"),
        }
    }

    #[test]
    fn test_item_from_response() {
        let item = item_from_response(&json!({"Item": {"song": {"S": "Kiss"}}}))
            .unwrap()
            .unwrap();
        assert_eq!(item["song"], AttributeValue::S("Kiss".to_string()));
        assert!(item_from_response(&json!({})).unwrap().is_none());
    }

    #[test]
    fn test_items_from_response() {
        let items = items_from_response(&json!({
            "Items": [{"released": {"N": "1984"}}, {"released": {"N": "1983"}}],
            "Count": 2
        }))
        .unwrap();
        assert_eq!(items.len(), 2);
        assert!(matches!(
            items_from_response(&json!({})),
            Err(ClientError::Protocol(_))
        ));
    }

    #[test]
    fn test_tables_from_response() {
        let tables = tables_from_response(&json!({"TableNames": ["albums", "music"]})).unwrap();
        assert_eq!(tables, vec!["albums", "music"]);
    }
}
