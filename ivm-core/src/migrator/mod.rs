//! The schema migrator.
//!
//! Applying a revision is all-or-nothing: every statement runs inside one
//! transaction, and the first failure rolls the whole revision back. Each
//! step checks the live catalog first, so applying a revision twice
//! converges on the same schema and reports "already present" instead of
//! failing.
//!
//! Reverting is refused. Removing columns from SQLite tables needs a
//! copy-filter-rename rebuild and a backup, which this tool does not do.

pub mod ledger;
pub mod report;

pub use report::*;

use rusqlite::{params_from_iter, Connection};
use tracing::{debug, error, info, warn};

use crate::db::{catalog, ConnectionSource};
use crate::error::{Error, Result};
use crate::schema::Revision;

/// Apply one revision.
///
/// A missing database file is not an error: the report comes back with
/// `database_missing` set and nothing is opened or created.
pub fn apply(revision: &Revision, source: &ConnectionSource<'_>) -> Result<MigrationReport> {
    let span = tracing::info_span!("apply", revision = revision.name, version = revision.version);
    let _enter = span.enter();

    let report = source.run(|conn| apply_on(revision, conn))?;
    Ok(report.unwrap_or_else(|| MigrationReport::nothing_to_do(revision)))
}

/// Apply revisions in version order, one transaction each.
///
/// Stops at the first failure; revisions before it stay committed.
pub fn apply_all(
    revisions: &[Revision],
    source: &ConnectionSource<'_>,
) -> Result<Vec<MigrationReport>> {
    let mut ordered: Vec<&Revision> = revisions.iter().collect();
    ordered.sort_by_key(|r| r.version);

    let mut reports = Vec::with_capacity(ordered.len());
    for revision in ordered {
        reports.push(apply(revision, source)?);
    }
    Ok(reports)
}

/// Reverse path. Issues no DDL.
pub fn revert(revision: &Revision, source: &ConnectionSource<'_>) -> Result<RevertOutcome> {
    if source.is_missing() {
        info!(revision = revision.name, "database not found, nothing to revert");
        return Ok(RevertOutcome::NothingToDo);
    }

    let mut affected: Vec<&str> = revision.altered_tables();
    affected.extend(revision.tables.iter().map(|t| t.name));

    let reason = format!(
        "{} cannot be reverted safely: SQLite has no safe column removal, so rolling back \
         requires rebuilding {} (copy rows to a new table, drop, rename) from a verified backup. \
         No changes were made.",
        revision.name,
        if affected.is_empty() {
            "the affected tables".to_string()
        } else {
            affected.join(", ")
        }
    );
    warn!(revision = revision.name, tables = ?affected, "revert refused");
    Ok(RevertOutcome::Refused { reason })
}

/// Applied/unapplied state of each known revision. Read-only.
pub fn status(
    revisions: &[Revision],
    source: &ConnectionSource<'_>,
) -> Result<Vec<RevisionStatus>> {
    let records = source.run(ledger::applied)?.unwrap_or_default();

    let mut statuses: Vec<RevisionStatus> = revisions
        .iter()
        .map(|revision| {
            let record = records.iter().find(|r| r.version == revision.version);
            RevisionStatus {
                version: revision.version,
                name: revision.name.to_string(),
                description: revision.description.to_string(),
                state: if record.is_some() {
                    RevisionState::Applied
                } else {
                    RevisionState::Unapplied
                },
                applied_at: record.map(|r| r.applied_at.clone()),
            }
        })
        .collect();
    statuses.sort_by_key(|s| s.version);
    Ok(statuses)
}

fn apply_on(revision: &Revision, conn: &Connection) -> Result<MigrationReport> {
    info!(state = %RevisionState::Applying, "applying revision");
    let tx = conn.unchecked_transaction()?;

    match apply_steps(revision, &tx) {
        Ok(entries) => {
            tx.commit()
                .map_err(|e| Error::revision(revision.name, Error::Database(e)))?;
            let report = MigrationReport::applied(revision, entries);
            info!(
                state = %report.state,
                changes = report.changes(),
                "revision committed"
            );
            Ok(report)
        }
        Err(err) => {
            error!(error = %err, "revision failed, rolling back");
            if let Err(rollback_err) = tx.rollback() {
                error!(error = %rollback_err, "rollback failed");
            }
            info!(state = %RevisionState::FailedRolledBack, "revision rolled back");
            Err(Error::revision(revision.name, err))
        }
    }
}

fn apply_steps(revision: &Revision, conn: &Connection) -> Result<Vec<ReportEntry>> {
    let mut entries = Vec::new();

    check_order(revision, conn)?;
    add_columns(revision, conn, &mut entries)?;
    create_tables(revision, conn, &mut entries)?;
    create_indexes(revision, conn, &mut entries)?;
    seed_rows(revision, conn, &mut entries)?;

    let outcome = if ledger::record(conn, revision)? {
        Outcome::Added
    } else {
        Outcome::AlreadyPresent
    };
    entries.push(ReportEntry::new(
        ItemKind::Ledger,
        format!("{} v{}", ledger::LEDGER_TABLE, revision.version),
        outcome,
    ));

    Ok(entries)
}

/// Note an unrecorded revision older than the newest recorded one. It still
/// runs: every step checks the live catalog, so it only adds what is missing.
fn check_order(revision: &Revision, conn: &Connection) -> Result<()> {
    ledger::ensure(conn)?;
    if ledger::is_applied(conn, revision.version)? {
        return Ok(());
    }
    if let Some(latest) = ledger::latest_version(conn)? {
        if latest > revision.version {
            warn!(
                version = revision.version,
                latest, "applying revision out of order, newer revision already recorded"
            );
        }
    }
    Ok(())
}

fn add_columns(
    revision: &Revision,
    conn: &Connection,
    entries: &mut Vec<ReportEntry>,
) -> Result<()> {
    for table in revision.altered_tables() {
        if !catalog::table_exists(conn, table)? {
            return Err(Error::missing_table(table));
        }
        let live = catalog::column_names(conn, table)?;
        debug!(table, columns = live.len(), "introspected table");

        for addition in revision.columns_for(table) {
            let name = addition.column.name;
            if live.iter().any(|c| c.eq_ignore_ascii_case(name)) {
                info!(table, column = name, outcome = "already present", "column");
                entries.push(ReportEntry::new(
                    ItemKind::Column,
                    addition.target(),
                    Outcome::AlreadyPresent,
                ));
                continue;
            }

            addition.validate()?;
            conn.execute_batch(&addition.to_sql())?;
            info!(
                table,
                column = name,
                sql_type = addition.column.sql_type,
                outcome = "added",
                "column"
            );
            entries.push(
                ReportEntry::new(ItemKind::Column, addition.target(), Outcome::Added)
                    .with_detail(addition.column.sql_type),
            );
        }
    }
    Ok(())
}

fn create_tables(
    revision: &Revision,
    conn: &Connection,
    entries: &mut Vec<ReportEntry>,
) -> Result<()> {
    for table in &revision.tables {
        if catalog::table_exists(conn, table.name)? {
            info!(table = table.name, outcome = "skipped", "table already exists");
            entries.push(
                ReportEntry::new(ItemKind::Table, table.name, Outcome::Skipped)
                    .with_detail("table already exists"),
            );
            continue;
        }

        conn.execute_batch(&table.to_sql())?;
        info!(table = table.name, columns = table.columns.len(), outcome = "created", "table");
        entries.push(ReportEntry::new(ItemKind::Table, table.name, Outcome::Created));
    }
    Ok(())
}

fn create_indexes(
    revision: &Revision,
    conn: &Connection,
    entries: &mut Vec<ReportEntry>,
) -> Result<()> {
    for index in &revision.indexes {
        let existed = catalog::index_exists(conn, index.name)?;
        conn.execute_batch(&index.to_sql())?;

        let outcome = if existed {
            Outcome::AlreadyPresent
        } else {
            Outcome::Created
        };
        info!(index = index.name, table = index.table, outcome = %outcome, "index");
        entries.push(ReportEntry::new(ItemKind::Index, index.name, outcome));
    }
    Ok(())
}

fn seed_rows(
    revision: &Revision,
    conn: &Connection,
    entries: &mut Vec<ReportEntry>,
) -> Result<()> {
    for seed in &revision.seeds {
        let mut stmt = conn.prepare(&seed.insert_sql()?)?;
        let mut inserted = 0;
        for row in &seed.rows {
            inserted += stmt.execute(params_from_iter(row.iter()))?;
        }

        let outcome = if inserted > 0 {
            Outcome::Added
        } else {
            Outcome::AlreadyPresent
        };
        info!(table = seed.table, rows = seed.rows.len(), inserted, outcome = %outcome, "seed");
        entries.push(
            ReportEntry::new(ItemKind::Seed, seed.table, outcome)
                .with_detail(format!("{inserted} of {} rows inserted", seed.rows.len())),
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests;
