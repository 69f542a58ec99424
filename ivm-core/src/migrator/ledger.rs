//! Applied-revisions ledger (`schema_revisions`).
//!
//! Written in the same transaction as the revision it records.

use rusqlite::{params, Connection, OptionalExtension};

use crate::db::catalog;
use crate::db::RevisionRecord;
use crate::error::Result;
use crate::schema::Revision;

pub const LEDGER_TABLE: &str = "schema_revisions";

/// Create the ledger table if missing
pub fn ensure(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_revisions (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
    )?;
    Ok(())
}

/// Highest recorded version
pub fn latest_version(conn: &Connection) -> Result<Option<u32>> {
    let latest = conn.query_row("SELECT MAX(version) FROM schema_revisions", [], |row| {
        row.get::<_, Option<u32>>(0)
    })?;
    Ok(latest)
}

/// Check whether a version is recorded
pub fn is_applied(conn: &Connection, version: u32) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM schema_revisions WHERE version = ?1",
            params![version],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Record a revision. Returns false when it was already recorded.
pub fn record(conn: &Connection, revision: &Revision) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO schema_revisions (version, name, applied_at) VALUES (?1, ?2, ?3)",
        params![
            revision.version,
            revision.name,
            chrono::Utc::now().to_rfc3339()
        ],
    )?;
    Ok(inserted > 0)
}

/// All recorded revisions, oldest first. Read-only: an absent ledger yields
/// an empty list.
pub fn applied(conn: &Connection) -> Result<Vec<RevisionRecord>> {
    if !catalog::table_exists(conn, LEDGER_TABLE)? {
        return Ok(Vec::new());
    }
    let mut stmt =
        conn.prepare("SELECT version, name, applied_at FROM schema_revisions ORDER BY version")?;
    let records = stmt
        .query_map([], |row| {
            Ok(RevisionRecord {
                version: row.get(0)?,
                name: row.get(1)?,
                applied_at: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(records)
}
