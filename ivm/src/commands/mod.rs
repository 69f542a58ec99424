//! Command implementations for ivm CLI.
//!
//! Each submodule implements one verb. Shared report rendering lives here.

pub mod downgrade;
pub mod status;
pub mod upgrade;

use colored::Colorize;
use ivm_core::migrator::{MigrationReport, Outcome};

/// Print one revision's report as coloured lines.
pub fn print_report(report: &MigrationReport) {
    println!(
        "{} {} (v{})",
        "Revision".cyan().bold(),
        report.revision.bold(),
        report.version
    );
    println!("{}", "─".repeat(50));

    for entry in &report.entries {
        let (mark, outcome) = match entry.outcome {
            Outcome::Added | Outcome::Created => ("✓".green(), entry.outcome.to_string().green()),
            Outcome::AlreadyPresent => ("○".dimmed(), entry.outcome.to_string().dimmed()),
            Outcome::Skipped => ("○".yellow(), entry.outcome.to_string().yellow()),
        };
        match &entry.detail {
            Some(detail) => println!(
                "  {} {:<7} {:<45} {} ({})",
                mark, entry.kind, entry.target, outcome, detail
            ),
            None => println!("  {} {:<7} {:<45} {}", mark, entry.kind, entry.target, outcome),
        }
    }
    println!();
}

/// Print any serializable value as pretty JSON.
pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
