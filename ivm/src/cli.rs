//! CLI argument definitions using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Interview platform schema migrations
///
/// Applies additive, idempotent schema revisions to the platform's SQLite
/// database. Runs `upgrade` when no command is given.
#[derive(Parser, Debug)]
#[command(name = "ivm")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// SQLite database file (overrides the config file)
    #[arg(long, global = true, env = "IVM_DATABASE_PATH")]
    pub database: Option<PathBuf>,

    /// Print reports as JSON instead of coloured lines
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Apply one revision, or every revision in version order
    #[command(visible_alias = "migrate")]
    Upgrade {
        /// Revision name, short name or version (default: all)
        revision: Option<String>,
    },

    /// Attempt to revert a revision (refused; prints what a manual rollback needs)
    Downgrade {
        /// Revision name, short name or version
        revision: String,
    },

    /// Show which revisions are recorded as applied
    Status,

    /// List known revisions and what they change
    List,
}

impl Cli {
    /// Selected command, defaulting to `upgrade` of everything
    pub fn verb(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or(Commands::Upgrade { revision: None })
    }
}
