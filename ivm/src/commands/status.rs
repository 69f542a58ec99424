//! Ledger status and revision listing.

use anyhow::{Context, Result};
use colored::Colorize;
use ivm_core::{migrator, revisions, ConnectionSource, RevisionState};
use serde::Serialize;

use super::print_json;
use crate::config::Config;

/// `ivm status`
pub fn execute(config: &Config, json: bool) -> Result<()> {
    let source = ConnectionSource::path(&config.database.path);
    let statuses = migrator::status(&revisions::all(), &source)
        .context("Failed to read revision ledger")?;

    if json {
        return print_json(&statuses);
    }

    println!("{} {}", "Database:".cyan(), source);
    if source.is_missing() {
        println!("  {}", "○ not found (nothing applied)".yellow());
    }
    println!("{}", "─".repeat(50));

    for status in &statuses {
        let state = match status.state {
            RevisionState::Applied => status.state.to_string().green(),
            _ => status.state.to_string().yellow(),
        };
        println!(
            "  v{:<3} {:<22} {:<10} {}",
            status.version,
            status.name,
            state,
            status.applied_at.as_deref().unwrap_or("")
        );
    }

    let pending = statuses
        .iter()
        .filter(|s| s.state != RevisionState::Applied)
        .count();
    println!();
    if pending == 0 {
        println!("{}", "✓ All revisions applied".green().bold());
    } else {
        println!("{}", format!("○ {} revision(s) pending", pending).yellow().bold());
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct RevisionSummary {
    version: u32,
    name: &'static str,
    description: &'static str,
    columns: usize,
    tables: usize,
    indexes: usize,
    seed_rows: usize,
}

/// `ivm list`
pub fn list(json: bool) -> Result<()> {
    let summaries: Vec<RevisionSummary> = revisions::all()
        .iter()
        .map(|r| RevisionSummary {
            version: r.version,
            name: r.name,
            description: r.description,
            columns: r.columns.len(),
            tables: r.tables.len(),
            indexes: r.indexes.len(),
            seed_rows: r.seeds.iter().map(|s| s.rows.len()).sum(),
        })
        .collect();

    if json {
        return print_json(&summaries);
    }

    println!("{}", "Revisions".cyan().bold());
    println!("{}", "─".repeat(50));
    for s in &summaries {
        println!("  v{:<3} {}", s.version, s.name.bold());
        println!("       {}", s.description.dimmed());
        println!(
            "       {} columns, {} tables, {} indexes, {} seed rows",
            s.columns, s.tables, s.indexes, s.seed_rows
        );
    }
    Ok(())
}
