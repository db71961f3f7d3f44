//! Error types for the server client.

use dynosql_core::error::StoreError;
use thiserror::Error;

use crate::protocol::ErrorResponse;

/// Errors returned by `DynosqlClient` methods.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(serde_json::Error),

    #[error("server disconnected")]
    Disconnected,

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("server error: {}: {}", .0.error, .0.message)]
    Server(ErrorResponse),
}

/// Server-reported table and validation errors become the matching store
/// errors; anything else is a backend failure.
impl From<ClientError> for StoreError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Server(resp) => match resp.error.as_str() {
                "TableNotFound" => StoreError::TableNotFound(resp.table.unwrap_or(resp.message)),
                "TableAlreadyExists" => {
                    StoreError::TableAlreadyExists(resp.table.unwrap_or(resp.message))
                }
                "ValidationError" => StoreError::Validation(resp.message),
                _ => StoreError::Backend(Box::new(ClientError::Server(resp))),
            },
            other => StoreError::Backend(Box::new(other)),
        }
    }
}
