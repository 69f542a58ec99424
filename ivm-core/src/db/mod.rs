//! SQLite access for the migrator.
//!
//! A revision runs against a [`ConnectionSource`]: either a database file the
//! migrator opens (and closes) itself, or a [`Database`] handle owned by the
//! hosting application.

pub mod catalog;
pub mod types;

pub use types::*;

use crate::error::{Error, Result};
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Database connection wrapper.
///
/// Thread-safe via internal Mutex. All database operations acquire the lock.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open an existing database file. Never creates the file.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path.as_ref(),
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_URI,
        )
        .map_err(Error::Database)?;
        Ok(Self::from_connection(conn))
    }

    /// Open (or create) a database file. Used by hosts and tests that own
    /// schema bootstrap.
    pub fn create_path(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).map_err(Error::Database)?;
        Ok(Self::from_connection(conn))
    }

    /// In-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(Error::Database)?;
        Ok(Self::from_connection(conn))
    }

    /// Wrap a connection the host already opened
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Check database connectivity
    pub fn ping(&self) -> Result<()> {
        self.with_conn(|conn| conn.execute_batch("SELECT 1").map_err(Error::Database))
    }

    /// Run `f` while holding the connection lock.
    pub fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.conn.lock().map_err(|_| Error::LockPoisoned)?;
        f(&conn)
    }
}

/// Where a migration run gets its connection from.
pub enum ConnectionSource<'a> {
    /// Database file; opened for the run and closed afterwards.
    Path(PathBuf),
    /// Shared handle supplied by the host; left open after the run.
    Handle(&'a Database),
}

impl<'a> ConnectionSource<'a> {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    pub fn handle(db: &'a Database) -> Self {
        Self::Handle(db)
    }

    /// True when the source is a file path that does not exist yet.
    pub fn is_missing(&self) -> bool {
        match self {
            Self::Path(path) => !path.exists(),
            Self::Handle(_) => false,
        }
    }

    /// Run `f` against a connection from this source.
    ///
    /// Returns `Ok(None)` without touching the filesystem when the source is a
    /// missing file. A connection opened here is dropped on every exit path.
    pub fn run<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<Option<T>> {
        match self {
            Self::Path(path) => {
                if !path.exists() {
                    tracing::info!(path = %path.display(), "database not found, nothing to do");
                    return Ok(None);
                }
                let db = Database::open_path(path)?;
                db.with_conn(f).map(Some)
            }
            Self::Handle(db) => db.with_conn(f).map(Some),
        }
    }
}

impl std::fmt::Display for ConnectionSource<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Handle(_) => write!(f, "<shared handle>"),
        }
    }
}
