//! Error types for the table wrapper

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("unknown column {column:?} in table {table:?}")]
    UnknownColumn { table: String, column: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("value not representable: {0}")]
    UnsupportedValue(String),
}

pub type Result<T> = std::result::Result<T, Error>;
