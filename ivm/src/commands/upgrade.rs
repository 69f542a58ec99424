//! Forward migration.

use anyhow::{Context, Result};
use colored::Colorize;
use ivm_core::{migrator, revisions, ConnectionSource, Error, MigrationReport, Revision};

use super::{print_json, print_report};
use crate::config::Config;

pub fn execute(revision: Option<&str>, config: &Config, json: bool) -> Result<()> {
    let selected: Vec<Revision> = match revision {
        Some(key) => vec![revisions::find(key)?],
        None => revisions::all(),
    };

    let path = &config.database.path;
    let source = ConnectionSource::path(path);

    if source.is_missing() {
        tracing::info!(path = %path.display(), "database not found");
        if json {
            let reports: Vec<MigrationReport> =
                selected.iter().map(MigrationReport::nothing_to_do).collect();
            return print_json(&reports);
        }
        println!(
            "{} database not found at {}, nothing to do.",
            "○".yellow(),
            path.display()
        );
        println!("  The application creates the full schema on first start.");
        return Ok(());
    }

    if !json {
        println!("{} {}", "Database:".cyan(), path.display());
        println!();
    }

    let mut reports = Vec::with_capacity(selected.len());
    for revision in &selected {
        match migrator::apply(revision, &source) {
            Ok(report) => {
                if !json {
                    print_report(&report);
                }
                reports.push(report);
            }
            Err(err) => {
                if json {
                    print_json(&reports)?;
                } else {
                    println!("{}", failure_banner(revision.name, &err).red().bold());
                    println!("  Fix the database manually before running further revisions.");
                }
                return Err(err).with_context(|| format!("Failed to apply {}", revision.name));
            }
        }
    }

    if json {
        return print_json(&reports);
    }

    let changes: usize = reports.iter().map(|r| r.changes()).sum();
    if changes == 0 {
        println!("{}", "✓ Schema already up to date".green().bold());
    } else {
        println!(
            "{}",
            format!(
                "✓ Migration complete: {} revision(s), {} change(s)",
                reports.len(),
                changes
            )
            .green()
            .bold()
        );
    }
    Ok(())
}

/// Only failures inside the revision's transaction were rolled back; anything
/// else (e.g. the file could not be opened) happened before it started.
fn failure_banner(revision: &str, err: &Error) -> String {
    match err {
        Error::Revision { .. } => format!("✗ Migration failed: {revision} was rolled back"),
        _ => format!("✗ Migration failed: {revision} was not started ({err})"),
    }
}
