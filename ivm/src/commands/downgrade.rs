//! Reverse migration. Always refused; prints what a manual rollback involves.

use anyhow::Result;
use colored::Colorize;
use ivm_core::{migrator, revisions, ConnectionSource, RevertOutcome};

use super::print_json;
use crate::config::Config;

pub fn execute(revision: &str, config: &Config, json: bool) -> Result<()> {
    let revision = revisions::find(revision)?;
    let source = ConnectionSource::path(&config.database.path);

    let outcome = migrator::revert(&revision, &source)?;
    if json {
        return print_json(&outcome);
    }

    match outcome {
        RevertOutcome::NothingToDo => {
            println!(
                "{} database not found at {}, nothing to revert.",
                "○".yellow(),
                config.database.path.display()
            );
        }
        RevertOutcome::Refused { reason } => {
            println!(
                "{}",
                format!("⚠ Downgrade of {} not performed", revision.name)
                    .yellow()
                    .bold()
            );
            println!("  {}", reason);
            println!("  Restore from a backup taken before the upgrade to roll back.");
        }
    }
    Ok(())
}
