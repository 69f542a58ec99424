//! Live catalog introspection (`sqlite_master`, `pragma_table_info`).

use super::types::ColumnInfo;
use crate::error::Result;
use rusqlite::{params, Connection};

/// Check whether a table exists
pub fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    object_exists(conn, "table", table)
}

/// Check whether an index exists
pub fn index_exists(conn: &Connection, index: &str) -> Result<bool> {
    object_exists(conn, "index", index)
}

fn object_exists(conn: &Connection, kind: &str, name: &str) -> Result<bool> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = ?1 AND name = ?2)",
        params![kind, name],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// Describe a table's columns in declaration order.
///
/// Returns an empty list for a table that does not exist.
pub fn table_columns(conn: &Connection, table: &str) -> Result<Vec<ColumnInfo>> {
    let mut stmt = conn.prepare(
        "SELECT name, type, \"notnull\", dflt_value, pk
         FROM pragma_table_info(?1)
         ORDER BY cid",
    )?;
    let columns = stmt
        .query_map(params![table], map_column)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(columns)
}

/// Names of a table's columns
pub fn column_names(conn: &Connection, table: &str) -> Result<Vec<String>> {
    Ok(table_columns(conn, table)?
        .into_iter()
        .map(|c| c.name)
        .collect())
}

/// Check whether a column exists on a table
pub fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM pragma_table_info(?1) WHERE name = ?2)",
        params![table, column],
        |row| row.get(0),
    )?;
    Ok(exists)
}

fn map_column(row: &rusqlite::Row) -> rusqlite::Result<ColumnInfo> {
    Ok(ColumnInfo {
        name: row.get(0)?,
        declared_type: row.get(1)?,
        not_null: row.get::<_, i32>(2)? == 1,
        default_value: row.get(3)?,
        primary_key: row.get(4)?,
    })
}
