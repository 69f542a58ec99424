//! Database types for ivm-core.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Catalog Types
// ─────────────────────────────────────────────────────────────────────────────

/// One row of `pragma_table_info` for a live table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    /// Declared type exactly as written in the DDL (SQLite keeps it verbatim)
    pub declared_type: String,
    pub not_null: bool,
    pub default_value: Option<String>,
    /// 1-based position in the primary key, 0 when not part of it
    pub primary_key: i32,
}

// ─────────────────────────────────────────────────────────────────────────────
// Ledger Types
// ─────────────────────────────────────────────────────────────────────────────

/// A row of the `schema_revisions` ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevisionRecord {
    pub version: u32,
    pub name: String,
    /// RFC 3339 timestamp
    pub applied_at: String,
}
