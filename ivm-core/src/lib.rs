//! ivm-core - Schema migrations for the interview platform
//!
//! This crate provides the migration engine shared by the `ivm` CLI and any
//! host application that wants to migrate its own connection:
//!
//! - **db**: SQLite handle, connection sources and catalog introspection
//! - **schema**: Declarative revisions (columns, tables, indexes, seed rows)
//! - **migrator**: Transactional, idempotent apply; refused revert; ledger
//! - **revisions**: The built-in revisions, in version order
//!
//! # Example
//!
//! ```rust,no_run
//! use ivm_core::{migrator, revisions, ConnectionSource};
//!
//! fn example() -> ivm_core::Result<()> {
//!     let source = ConnectionSource::path("instance/interview.db");
//!     for report in migrator::apply_all(&revisions::all(), &source)? {
//!         println!("{}: {} changes", report.revision, report.changes());
//!     }
//!     Ok(())
//! }
//! ```

pub mod db;
pub mod error;
pub mod migrator;
pub mod revisions;
pub mod schema;

// Re-export commonly used types
pub use db::{ConnectionSource, Database};
pub use error::{Error, Result};
pub use migrator::{MigrationReport, RevertOutcome, RevisionState, RevisionStatus};
pub use schema::Revision;
