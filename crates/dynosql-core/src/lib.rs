//! # dynosql
//!
//! A dict-like access layer over a DynamoDB-style wide-column store.
//!
//! The store only understands tagged values (`{"S": "..."}`, `{"N": "..."}`,
//! `{"M": {...}}`, `{"L": [...]}`). This crate lets callers work with plain
//! `serde_json::Value`s instead: it marshals records to and from the tagged
//! representation, resolves single and composite primary keys against the
//! table schema, and compiles simple attribute comparisons into the store's
//! named-parameter filter syntax.
//!
//! ## Quick Start
//!
//! ```
//! use dynosql_core::api::{Condition, Dynosql};
//! use dynosql_core::store::MemoryStore;
//! use dynosql_core::types::TypeTag;
//! use serde_json::json;
//!
//! let db = Dynosql::new(MemoryStore::new());
//!
//! let music = db
//!     .table("music")
//!     .partition_key("artist", TypeTag::S)
//!     .sort_key("song", TypeTag::S)
//!     .open()
//!     .unwrap();
//!
//! music
//!     .put(("Prince", "Purple Rain"), json!({"released": 1984, "album": "Purple Rain"}))
//!     .unwrap();
//!
//! let record = music.get(("Prince", "Purple Rain")).unwrap();
//! assert_eq!(record["released"], 1984);
//!
//! let hits = music.scan(&Condition::eq("released", 1984)).unwrap();
//! assert_eq!(hits.len(), 1);
//!
//! music.drop_table().unwrap();
//! ```

pub mod api;
pub mod encoding;
pub mod error;
pub mod store;
pub mod types;
