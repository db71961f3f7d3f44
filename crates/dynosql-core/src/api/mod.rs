//! Public API: database handle, table handles, key resolution, marshalling,
//! and the filter and update compilers.

pub mod builders;
pub mod database;
pub mod filter;
pub mod key_utils;
pub mod marshal;
pub mod table;
pub mod update;

pub use builders::TableBuilder;
pub use database::Dynosql;
pub use filter::{Comparison, CompiledFilter, Condition, Decoded, ItemResponse, compile};
pub use key_utils::resolve_key;
pub use table::Table;
pub use update::{CompiledUpdate, compile_update};
