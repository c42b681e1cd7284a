//! SQL text generation for the table operations.
//!
//! Identifiers are always double-quoted, so tables and columns may be
//! named after SQL keywords or contain arbitrary text. Values are bound
//! as parameters, never spliced; the one exception is `NULL`, which has
//! dedicated SQL forms (`IS NULL` in criteria, `= NULL` is never
//! generated because it cannot match).

use crate::record::Record;
use crate::value::Value;

/// Escape a SQLite table, column or index name
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// AND clause for a WHERE statement from equality match criteria.
/// Empty criteria yield an empty clause (match every row).
pub fn where_clause(matching: &Record) -> (String, Vec<Value>) {
    let mut clauses = Vec::with_capacity(matching.len());
    let mut params = Vec::new();
    for (column, value) in matching.iter() {
        if value.is_null() {
            clauses.push(format!("{} IS NULL", quote_ident(column)));
        } else {
            clauses.push(format!("{} = ?", quote_ident(column)));
            params.push(value.clone());
        }
    }
    (clauses.join(" AND "), params)
}

/// INSERT statement for a record. `Null` fields are omitted; they read
/// back as SQL NULL anyway.
pub fn insert_sql(table: &str, record: &Record) -> (String, Vec<Value>) {
    let mut columns = Vec::with_capacity(record.len());
    let mut placeholders = Vec::with_capacity(record.len());
    let mut params = Vec::with_capacity(record.len());
    for (column, value) in record.iter() {
        if value.is_null() {
            continue;
        }
        columns.push(quote_ident(column));
        placeholders.push("?");
        params.push(value.clone());
    }
    let sql = if columns.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES", quote_ident(table))
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(table),
            columns.join(", "),
            placeholders.join(", ")
        )
    };
    (sql, params)
}

/// UPDATE statement setting the record's fields on all rows matching the
/// criteria. `Null` fields SET the column to NULL.
pub fn update_sql(table: &str, matching: &Record, record: &Record) -> (String, Vec<Value>) {
    let mut sets = Vec::with_capacity(record.len());
    let mut params = Vec::with_capacity(record.len());
    for (column, value) in record.iter() {
        if value.is_null() {
            sets.push(format!("{} = NULL", quote_ident(column)));
        } else {
            sets.push(format!("{} = ?", quote_ident(column)));
            params.push(value.clone());
        }
    }
    let mut sql = format!("UPDATE {} SET {}", quote_ident(table), sets.join(", "));
    let (clause, mut where_params) = where_clause(matching);
    if !clause.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clause);
    }
    params.append(&mut where_params);
    (sql, params)
}
