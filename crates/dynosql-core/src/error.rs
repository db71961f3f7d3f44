//! Error types for all dynosql operations.

use thiserror::Error;

use crate::types::TypeTag;

/// Top-level error type for dynosql operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Addressing(#[from] AddressingError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("record not found in table '{table}' for key {key}")]
    NotFound { table: String, key: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("unsupported type: {kind} has no wire tag{}", attribute_suffix(.attribute))]
    UnsupportedType {
        kind: &'static str,
        attribute: Option<String>,
    },

    #[error("malformed tagged value: {0}")]
    MalformedValue(String),
}

fn attribute_suffix(attribute: &Option<String>) -> String {
    match attribute {
        Some(name) => format!(" (attribute '{name}')"),
        None => String::new(),
    }
}

/// Key arity or key type does not match the table schema.
#[derive(Debug, Error)]
pub enum AddressingError {
    #[error("table '{table}' has no sort key (key {key})")]
    NoSortKey { table: String, key: String },

    #[error("table '{table}' requires a composite key (key {key})")]
    CompositeKeyRequired { table: String, key: String },

    #[error(
        "key type mismatch in table '{table}' for attribute '{attribute}': expected {expected}, got {actual}"
    )]
    KeyTypeMismatch {
        table: String,
        attribute: String,
        expected: TypeTag,
        actual: TypeTag,
    },

    #[error("table '{table}': a sort key was given without a partition key")]
    SortKeyWithoutPartitionKey { table: String },
}

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("unsupported operator: {0}")]
    UnsupportedOperator(String),
}

/// Failures reported by a store backend, surfaced unmodified.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("table not found: {0}")]
    TableNotFound(String),

    #[error("table already exists: {0}")]
    TableAlreadyExists(String),

    #[error("missing key attribute '{attribute}' in table '{table}'")]
    MissingKeyAttribute { table: String, attribute: String },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("store backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Whether this error means the addressed table does not exist.
    pub fn is_table_not_found(&self) -> bool {
        matches!(self, Error::Store(StoreError::TableNotFound(_)))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
