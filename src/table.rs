//! The lazy table handle and its operations.
//!
//! A `LazyTable` wraps one SQLite connection scoped to one table. The
//! table starts with only a `rowid` column; writing a record with a new
//! field issues `ALTER TABLE ADD COLUMN` typed from the value. Column
//! names are compared case-insensitively against a cache rebuilt from
//! `PRAGMA table_info` after every DDL statement.

use std::collections::BTreeSet;
use std::path::Path;

use rusqlite::{params_from_iter, Connection, TransactionBehavior};
use tracing::{debug, warn};

use crate::config::TableConfig;
use crate::error::{Error, Result};
use crate::record::Record;
use crate::sql::{insert_sql, quote_ident, update_sql, where_clause};
use crate::value::Value;

/// Rows per transaction during bulk inserts
const BULK_COMMIT_EVERY: usize = 500;

pub struct LazyTable {
    conn: Connection,
    table: String,
    config: TableConfig,
    /// Lowercased column names, rebuilt from PRAGMA table_info after DDL
    columns: BTreeSet<String>,
}

impl LazyTable {
    /// Open a file-backed table with the default configuration
    pub fn open(path: impl AsRef<Path>, table: &str) -> Result<Self> {
        Self::open_with_config(path, table, TableConfig::default())
    }

    pub fn open_with_config(
        path: impl AsRef<Path>,
        table: &str,
        config: TableConfig,
    ) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::setup(conn, table, config)
    }

    /// Open an in-memory table (for testing and scratch work)
    pub fn open_in_memory(table: &str) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::setup(conn, table, TableConfig::default())
    }

    fn setup(conn: Connection, table: &str, config: TableConfig) -> Result<Self> {
        conn.pragma_update(None, "encoding", "UTF-8")?;
        if config.fast_and_unsafe {
            warn!("fast_and_unsafe: journal and synchronous writes disabled");
            conn.pragma_update(None, "journal_mode", "OFF")?;
            conn.pragma_update(None, "synchronous", 0)?;
        }
        let create = format!(
            "CREATE TABLE IF NOT EXISTS {} (rowid INTEGER PRIMARY KEY ASC)",
            quote_ident(table)
        );
        debug!("creating table: {create}");
        conn.execute(&create, [])?;
        let mut lazy = Self {
            conn,
            table: table.to_string(),
            config,
            columns: BTreeSet::new(),
        };
        lazy.refresh_columns()?;
        Ok(lazy)
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Lowercased column names currently known to this handle
    pub fn columns(&self) -> &BTreeSet<String> {
        &self.columns
    }

    /// Rebuild the column cache from the database. Only needed when
    /// another handle has altered the table.
    pub fn refresh_columns(&mut self) -> Result<()> {
        let names = {
            let mut stmt = self
                .conn
                .prepare(&format!("PRAGMA table_info({})", quote_ident(&self.table)))?;
            let names = stmt
                .query_map([], |row| row.get::<_, String>(1))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            names
        };
        self.columns = names.into_iter().map(|n| n.to_lowercase()).collect();
        Ok(())
    }

    /// Insert a record, adding columns as needed
    pub fn insert(&mut self, record: &Record) -> Result<()> {
        self.expand(record)?;
        let (sql, params) = insert_sql(&self.table, record);
        debug!("insert: {sql}");
        self.conn.execute(&sql, params_from_iter(params.iter()))?;
        Ok(())
    }

    /// Bulk insert, committing every few hundred rows. Returns the
    /// number of rows inserted.
    pub fn insert_many<I>(&mut self, records: I) -> Result<usize>
    where
        I: IntoIterator<Item = Record>,
    {
        let mut inserted = 0;
        let mut pending = Vec::with_capacity(BULK_COMMIT_EVERY);
        for record in records {
            pending.push(record);
            if pending.len() == BULK_COMMIT_EVERY {
                inserted += self.insert_batch(&pending)?;
                pending.clear();
            }
        }
        if !pending.is_empty() {
            inserted += self.insert_batch(&pending)?;
        }
        Ok(inserted)
    }

    fn insert_batch(&mut self, records: &[Record]) -> Result<usize> {
        // DDL first; ALTER TABLE inside the batch transaction would
        // commit it early.
        for record in records {
            self.expand(record)?;
        }
        let table = self.table.clone();
        let tx = self.conn.transaction()?;
        for record in records {
            let (sql, params) = insert_sql(&table, record);
            tx.execute(&sql, params_from_iter(params.iter()))?;
        }
        tx.commit()?;
        Ok(records.len())
    }

    /// Fetch all rows matching the criteria, in rowid order. Every
    /// returned record carries its `rowid`.
    pub fn get(&self, matching: &Record) -> Result<Vec<Record>> {
        self.check_matching_columns(matching)?;
        let (clause, params) = where_clause(matching);
        let mut sql = format!("SELECT * FROM {}", quote_ident(&self.table));
        if !clause.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
        }
        sql.push_str(" ORDER BY rowid");
        debug!("get: {sql}");
        self.query_with(&sql, &params)
    }

    /// First matching record, or None
    pub fn get_one(&self, matching: &Record) -> Result<Option<Record>> {
        Ok(self.get(matching)?.into_iter().next())
    }

    #[deprecated(since = "0.4.0", note = "renamed to get_one")]
    pub fn getone(&self, matching: &Record) -> Result<Option<Record>> {
        self.get_one(matching)
    }

    /// Set the record's fields on all rows matching the criteria.
    /// Returns the number of rows changed. An empty record is a no-op.
    pub fn update(&mut self, matching: &Record, record: &Record) -> Result<usize> {
        if record.is_empty() {
            return Ok(0);
        }
        self.expand(record)?;
        self.check_matching_columns(matching)?;
        let (sql, params) = update_sql(&self.table, matching, record);
        debug!("update: {sql}");
        Ok(self.conn.execute(&sql, params_from_iter(params.iter()))?)
    }

    /// Insert the record or, if a row already matches, update it.
    /// Runs in an exclusive transaction so concurrent upserts cannot
    /// both take the insert path.
    pub fn upsert(&mut self, matching: &Record, record: &Record) -> Result<()> {
        self.expand(record)?;
        // Criteria naming a column the table lacks cannot match any row,
        // so they route straight to the insert path.
        let matchable = matching
            .columns()
            .all(|c| self.columns.contains(&c.to_lowercase()));
        let table = self.table.clone();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Exclusive)?;
        let exists = if matchable {
            let (clause, params) = where_clause(matching);
            let mut sql = format!("SELECT rowid FROM {}", quote_ident(&table));
            if !clause.is_empty() {
                sql.push_str(" WHERE ");
                sql.push_str(&clause);
            }
            sql.push_str(" LIMIT 1");
            let mut stmt = tx.prepare(&sql)?;
            stmt.exists(params_from_iter(params.iter()))?
        } else {
            false
        };
        if exists {
            if !record.is_empty() {
                let (sql, params) = update_sql(&table, matching, record);
                debug!("upsert update: {sql}");
                tx.execute(&sql, params_from_iter(params.iter()))?;
            }
        } else {
            let (sql, params) = insert_sql(&table, record);
            debug!("upsert insert: {sql}");
            tx.execute(&sql, params_from_iter(params.iter()))?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Delete all rows matching the criteria, returning the count
    pub fn delete(&self, matching: &Record) -> Result<usize> {
        self.check_matching_columns(matching)?;
        let (clause, params) = where_clause(matching);
        let mut sql = format!("DELETE FROM {}", quote_ident(&self.table));
        if !clause.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
        }
        debug!("delete: {sql}");
        Ok(self.conn.execute(&sql, params_from_iter(params.iter()))?)
    }

    /// Add columns so the table can hold the record. Fields whose
    /// lowercased name matches an existing column are skipped, as are
    /// `Null` fields (no value, no type, no column).
    pub fn expand(&mut self, record: &Record) -> Result<()> {
        let mut added = false;
        let mut to_index = Vec::new();
        for (column, value) in record.iter() {
            if self.columns.contains(&column.to_lowercase()) {
                continue;
            }
            let Some(sql_type) = value.sqlite_type() else {
                continue;
            };
            let ddl = format!(
                "ALTER TABLE {} ADD COLUMN {} {} DEFAULT NULL",
                quote_ident(&self.table),
                quote_ident(column),
                sql_type
            );
            debug!("adding column: {ddl}");
            self.conn.execute(&ddl, [])?;
            self.columns.insert(column.to_lowercase());
            added = true;
            if self.config.index_all_columns {
                to_index.push(column.to_string());
            }
        }
        if added {
            self.refresh_columns()?;
        }
        for column in &to_index {
            self.index(column)?;
        }
        Ok(())
    }

    /// Add an index for a column
    pub fn index(&self, column: &str) -> Result<()> {
        let sql = format!(
            "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
            quote_ident(&index_name(&self.table, column)),
            quote_ident(&self.table),
            quote_ident(column)
        );
        debug!("index: {sql}");
        self.conn.execute(&sql, [])?;
        Ok(())
    }

    /// Index every column
    pub fn index_all(&self) -> Result<()> {
        for column in &self.columns {
            self.index(column)?;
        }
        Ok(())
    }

    /// Drop the index on a column, if present
    pub fn drop_index(&self, column: &str) -> Result<()> {
        let sql = format!(
            "DROP INDEX IF EXISTS {}",
            quote_ident(&index_name(&self.table, column))
        );
        debug!("drop index: {sql}");
        self.conn.execute(&sql, [])?;
        Ok(())
    }

    /// Drop every column index. Useful before a bulk import.
    pub fn drop_index_all(&self) -> Result<()> {
        for column in &self.columns {
            self.drop_index(column)?;
        }
        Ok(())
    }

    /// Refresh the query planner statistics for the table
    pub fn analyze(&self) -> Result<()> {
        self.conn
            .execute(&format!("ANALYZE {}", quote_ident(&self.table)), [])?;
        Ok(())
    }

    /// Run arbitrary SQL, returning records keyed by result column names
    pub fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Record>> {
        self.query_with(sql, params)
    }

    /// Run arbitrary non-SELECT SQL, returning the affected row count
    pub fn execute(&self, sql: &str, params: &[Value]) -> Result<usize> {
        debug!("execute: {sql}");
        Ok(self.conn.execute(sql, params_from_iter(params.iter()))?)
    }

    /// Close the underlying connection
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| Error::Sqlite(e))
    }

    fn query_with(&self, sql: &str, params: &[Value]) -> Result<Vec<Record>> {
        let mut stmt = self.conn.prepare(sql)?;
        let names: Vec<String> = stmt
            .column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = Record::new();
            for (i, name) in names.iter().enumerate() {
                record.set(name.as_str(), row.get::<_, Value>(i)?);
            }
            records.push(record);
        }
        Ok(records)
    }

    fn check_matching_columns(&self, matching: &Record) -> Result<()> {
        for column in matching.columns() {
            if !self.columns.contains(&column.to_lowercase()) {
                return Err(Error::UnknownColumn {
                    table: self.table.clone(),
                    column: column.to_string(),
                });
            }
        }
        Ok(())
    }
}

fn index_name(table: &str, column: &str) -> String {
    format!("index_{table}_{column}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;

    #[test]
    fn open_in_memory_starts_with_rowid_only() {
        let table = LazyTable::open_in_memory("t").unwrap();
        assert_eq!(
            table.columns().iter().cloned().collect::<Vec<_>>(),
            vec!["rowid".to_string()]
        );
        assert!(table.get(&Record::new()).unwrap().is_empty());
    }

    #[test]
    fn unknown_matching_column_is_an_error() {
        let table = LazyTable::open_in_memory("t").unwrap();
        let err = table.get(&record! { "nope" => 1 }).unwrap_err();
        assert!(matches!(
            err,
            Error::UnknownColumn { ref column, .. } if column == "nope"
        ));
    }
}
