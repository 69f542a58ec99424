//! ivm - Interview platform schema migrations
//!
//! Applies the platform's schema revisions to its SQLite database.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod cli;
mod commands;
mod config;

use cli::{Cli, Commands};

/// Log filter used when `RUST_LOG` is unset or invalid
const DEFAULT_LOG_FILTER: &str = "ivm=info,ivm_core=warn";

/// `RUST_LOG` replaces the default filter entirely
fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn main() -> Result<()> {
    // Initialize tracing (stderr, so stdout stays the report)
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(log_filter())
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = config::Config::load()?.with_database_override(cli.database.clone());

    // Execute command
    match cli.verb() {
        Commands::Upgrade { revision } => {
            commands::upgrade::execute(revision.as_deref(), &config, cli.json)
        }
        Commands::Downgrade { revision } => {
            commands::downgrade::execute(&revision, &config, cli.json)
        }
        Commands::Status => commands::status::execute(&config, cli.json),
        Commands::List => commands::status::list(cli.json),
    }
}
