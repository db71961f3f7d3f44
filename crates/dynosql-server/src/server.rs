//! Unix domain socket server that wraps a `MemoryStore`.
//!
//! Each connected client sends JSON-line requests and receives JSON-line
//! responses. Every connection shares the same tables; locking is internal
//! to the store.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::signal::unix::{SignalKind, signal};
use tracing::{debug, error, info, warn};

use dynosql_core::api::{CompiledFilter, CompiledUpdate};
use dynosql_core::encoding::{AttributeValue, Item};
use dynosql_core::error::StoreError;
use dynosql_core::store::{MemoryStore, StoreClient};

use crate::protocol::{Request, Response};

/// A dynosql store server listening on a Unix socket.
pub struct DynosqlServer {
    store: MemoryStore,
    socket_path: PathBuf,
}

impl DynosqlServer {
    pub fn new(store: MemoryStore, socket_path: PathBuf) -> Self {
        Self { store, socket_path }
    }

    /// Serve connections until SIGINT or SIGTERM. A stale socket file is
    /// replaced on startup and removed again on shutdown.
    pub async fn run(&self) -> std::io::Result<()> {
        remove_socket_file(&self.socket_path)?;
        let listener = UnixListener::bind(&self.socket_path)?;
        info!(path = %self.socket_path.display(), "server listening");

        let accept_loop = async {
            loop {
                let stream = match listener.accept().await {
                    Ok((stream, _)) => stream,
                    Err(e) => {
                        error!(error = %e, "accept error");
                        continue;
                    }
                };
                let store = self.store.clone();
                tokio::spawn(async move {
                    if let Err(e) = serve_client(store, stream).await {
                        warn!(error = %e, "client connection failed");
                    }
                });
            }
        };

        tokio::select! {
            _ = accept_loop => {}
            _ = shutdown_signal() => info!("shutting down"),
        }

        match remove_socket_file(&self.socket_path) {
            Ok(true) => info!(path = %self.socket_path.display(), "socket file removed"),
            Ok(false) => {}
            Err(e) => warn!(error = %e, "could not remove socket file"),
        }
        Ok(())
    }
}

/// Remove the socket file if present, reporting whether one was there.
fn remove_socket_file(path: &Path) -> std::io::Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Answer one request line per response line until the client hangs up.
async fn serve_client(store: MemoryStore, stream: UnixStream) -> std::io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        let Some(reply) = reply_to_line(&store, &line)? else {
            continue;
        };
        writer.write_all(&reply).await?;
        writer.flush().await?;
    }
    Ok(())
}

/// The newline-terminated reply to one request line; blank lines get none.
fn reply_to_line(store: &MemoryStore, line: &str) -> std::io::Result<Option<Vec<u8>>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let response = match serde_json::from_str::<Request>(line) {
        Ok(req) => dispatch(store, req),
        Err(e) => Response::error("ParseError", e.to_string()),
    };
    let mut bytes = serde_json::to_vec(&response).or_else(|e| {
        serde_json::to_vec(&Response::error("InternalError", e.to_string()))
    })?;
    bytes.push(b'\n');
    Ok(Some(bytes))
}

fn dispatch(store: &MemoryStore, req: Request) -> Response {
    match req {
        Request::CreateTable {
            table_name,
            key_schema,
            attribute_definitions,
        } => match store.create_table(&table_name, &key_schema, &attribute_definitions) {
            Ok(description) => {
                info!(table = %table_name, "table created");
                Response::ok_table(description)
            }
            Err(e) => store_error_to_response(e),
        },

        Request::DescribeTable { table_name } => match store.describe_table(&table_name) {
            Ok(description) => Response::ok_table(description),
            Err(e) => store_error_to_response(e),
        },

        Request::DeleteTable { table_name } => match store.delete_table(&table_name) {
            Ok(()) => {
                info!(table = %table_name, "table deleted");
                Response::ok_empty()
            }
            Err(e) => store_error_to_response(e),
        },

        Request::ListTables => match store.list_tables() {
            Ok(names) => Response::ok_table_names(names),
            Err(e) => store_error_to_response(e),
        },

        Request::PutItem { table_name, item } => {
            debug!(table = %table_name, "put_item");
            match store.put_item(&table_name, item) {
                Ok(()) => Response::ok_empty(),
                Err(e) => store_error_to_response(e),
            }
        }

        Request::GetItem { table_name, key } => {
            debug!(table = %table_name, "get_item");
            match store.get_item(&table_name, key) {
                Ok(item) => Response::ok_item(item),
                Err(e) => store_error_to_response(e),
            }
        }

        Request::UpdateItem {
            table_name,
            key,
            update_expression,
            expression_attribute_names,
            expression_attribute_values,
        } => {
            debug!(table = %table_name, expression = %update_expression, "update_item");
            let update = CompiledUpdate {
                expression: update_expression,
                names: expression_attribute_names,
                values: expression_attribute_values,
            };
            handle_update_item(store, &table_name, key, &update)
        }

        Request::DeleteItem { table_name, key } => {
            debug!(table = %table_name, "delete_item");
            match store.delete_item(&table_name, key) {
                Ok(()) => Response::ok_empty(),
                Err(e) => store_error_to_response(e),
            }
        }

        Request::Scan {
            table_name,
            filter_expression,
            expression_attribute_values,
        } => handle_scan(
            store,
            &table_name,
            filter_expression,
            expression_attribute_values,
        ),
    }
}

fn handle_update_item(
    store: &MemoryStore,
    table: &str,
    key: Item,
    update: &CompiledUpdate,
) -> Response {
    let (attribute, value) = match update.resolve() {
        Ok(resolved) => resolved,
        Err(e) => return store_error_to_response(e),
    };
    match store.update_item(table, key, &attribute, value) {
        Ok(()) => Response::ok_empty(),
        Err(e) => store_error_to_response(e),
    }
}

fn handle_scan(
    store: &MemoryStore,
    table: &str,
    filter_expression: Option<String>,
    values: BTreeMap<String, AttributeValue>,
) -> Response {
    let filter = filter_expression.map(|expression| CompiledFilter { expression, values });
    debug!(
        table = %table,
        filter = filter.as_ref().map(|f| f.expression.as_str()),
        "scan"
    );
    match store.scan(table, filter.as_ref()) {
        Ok(items) => Response::ok_items(items),
        Err(e) => store_error_to_response(e),
    }
}

/// Resolve on SIGINT or SIGTERM, or on SIGINT alone if SIGTERM cannot be
/// registered.
async fn shutdown_signal() {
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            warn!(error = %e, "SIGTERM handler unavailable");
            tokio::signal::ctrl_c().await.ok();
            return;
        }
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}

fn store_error_to_response(err: StoreError) -> Response {
    match err {
        StoreError::TableNotFound(name) => {
            let message = format!("table not found: {name}");
            Response::table_error("TableNotFound", name, message)
        }
        StoreError::TableAlreadyExists(name) => {
            let message = format!("table already exists: {name}");
            Response::table_error("TableAlreadyExists", name, message)
        }
        StoreError::Validation(message) => Response::error("ValidationError", message),
        err @ StoreError::MissingKeyAttribute { .. } => {
            Response::error("ValidationError", err.to_string())
        }
        err @ StoreError::Backend(_) => Response::error("InternalError", err.to_string()),
    }
}
