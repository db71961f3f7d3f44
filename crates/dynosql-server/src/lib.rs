//! dynosql server and client library.
//!
//! Serves an in-memory dynosql store over a local Unix socket so several
//! processes can share one set of tables. [`BlockingClient`] plugs the server
//! into the synchronous `Dynosql` API.

use std::path::PathBuf;

pub mod blocking;
pub mod client;
pub mod error;
pub mod protocol;
pub mod server;

pub use blocking::BlockingClient;
pub use client::DynosqlClient;
pub use server::DynosqlServer;

/// Default socket path: `<data_local_dir>/dynosql/server.sock`.
pub fn default_socket_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("dynosql")
        .join("server.sock")
}
