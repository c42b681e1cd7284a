//! A basic SQLite table wrapper with lazy schema expansion.
//!
//! # Intention
//!
//! - Map flat records (column name to value) onto rows of a single
//!   SQLite table.
//! - Grow the schema automatically: inserting or updating a record with
//!   a field the table has never seen adds the column.
//! - Keep bulk loads fast and indexing easy.
//!
//! # Architectural Boundaries
//!
//! - Only SQLite/table-mapping code belongs here.
//! - No query language beyond equality matching; raw SQL is the escape
//!   hatch.

pub mod config;
pub mod error;
pub mod record;
pub mod sql;
pub mod table;
pub mod value;

pub use config::TableConfig;
pub use error::{Error, Result};
pub use record::Record;
pub use table::LazyTable;
pub use value::Value;

/// Convenience function to open a table with the default configuration
pub fn open(path: impl AsRef<std::path::Path>, table: &str) -> Result<LazyTable> {
    LazyTable::open(path, table)
}
