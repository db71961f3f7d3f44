//! Wire protocol: JSON-over-newlines request/response types.
//!
//! Each request is a single JSON line tagged by `"op"`; each response is a
//! single JSON line. Field names follow the store's PascalCase convention
//! (`TableName`, `Key`, `FilterExpression`, ...), and items travel in their
//! tagged form.

use std::collections::BTreeMap;

use dynosql_core::encoding::{AttributeValue, Item};
use dynosql_core::store::{AttributeDefinition, KeySchemaElement, TableDescription};
use serde::{Deserialize, Serialize};

/// A request from a client.
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", rename_all_fields = "PascalCase")]
pub enum Request {
    CreateTable {
        table_name: String,
        key_schema: Vec<KeySchemaElement>,
        attribute_definitions: Vec<AttributeDefinition>,
    },
    DescribeTable {
        table_name: String,
    },
    DeleteTable {
        table_name: String,
    },
    ListTables,
    PutItem {
        table_name: String,
        item: Item,
    },
    GetItem {
        table_name: String,
        key: Item,
    },
    UpdateItem {
        table_name: String,
        key: Item,
        update_expression: String,
        #[serde(default)]
        expression_attribute_names: BTreeMap<String, String>,
        #[serde(default)]
        expression_attribute_values: BTreeMap<String, AttributeValue>,
    },
    DeleteItem {
        table_name: String,
        key: Item,
    },
    Scan {
        table_name: String,
        #[serde(default)]
        filter_expression: Option<String>,
        #[serde(default)]
        expression_attribute_values: BTreeMap<String, AttributeValue>,
    },
}

/// A response sent back to the client.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Response {
    Ok(OkResponse),
    Error(ErrorResponse),
}

/// Successful response variants.
#[derive(Debug, Serialize)]
#[serde(untagged, rename_all_fields = "PascalCase")]
pub enum OkResponse {
    Item { item: Item },
    Items { items: Vec<Item>, count: usize },
    Table { table: TableDescription },
    TableNames { table_names: Vec<String> },
    Empty {},
}

/// Error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    /// The table the error refers to, when there is one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
}

impl Response {
    pub fn ok_empty() -> Self {
        Response::Ok(OkResponse::Empty {})
    }

    /// An absent item is an empty response, not a null `Item`.
    pub fn ok_item(item: Option<Item>) -> Self {
        match item {
            Some(item) => Response::Ok(OkResponse::Item { item }),
            None => Self::ok_empty(),
        }
    }

    pub fn ok_items(items: Vec<Item>) -> Self {
        let count = items.len();
        Response::Ok(OkResponse::Items { items, count })
    }

    pub fn ok_table(table: TableDescription) -> Self {
        Response::Ok(OkResponse::Table { table })
    }

    pub fn ok_table_names(table_names: Vec<String>) -> Self {
        Response::Ok(OkResponse::TableNames { table_names })
    }

    pub fn error(error: impl Into<String>, message: impl Into<String>) -> Self {
        Response::Error(ErrorResponse {
            error: error.into(),
            message: message.into(),
            table: None,
        })
    }

    pub fn table_error(
        error: impl Into<String>,
        table: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Response::Error(ErrorResponse {
            error: error.into(),
            message: message.into(),
            table: Some(table.into()),
        })
    }
}
