//! Error types for ivm-core.

use thiserror::Error;

/// Result type alias using ivm-core Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for migration runs
#[derive(Error, Debug)]
pub enum Error {
    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database lock poisoned")]
    LockPoisoned,

    // Migration errors
    #[error("Revision {revision} failed and was rolled back: {source}")]
    Revision {
        revision: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Table not found: {table}. Column additions require the table to exist.")]
    MissingTable { table: String },

    #[error("Column {target} cannot be added to an existing table: {reason}")]
    InvalidColumn { target: String, reason: String },

    #[error("Unknown revision: {0}")]
    UnknownRevision(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Wrap an error raised while applying a revision
    pub fn revision(revision: impl Into<String>, source: Error) -> Self {
        Self::Revision {
            revision: revision.into(),
            source: Box::new(source),
        }
    }

    /// Create a missing-table error
    pub fn missing_table(table: impl Into<String>) -> Self {
        Self::MissingTable {
            table: table.into(),
        }
    }

    /// Create an invalid-column error
    pub fn invalid_column(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidColumn {
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Underlying cause for wrapped revision failures
    pub fn root_cause(&self) -> &Error {
        match self {
            Self::Revision { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
