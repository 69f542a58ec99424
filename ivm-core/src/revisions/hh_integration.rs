//! 001: HeadHunter account linking on `users`.

use crate::schema::{ColumnDef, Revision};

pub fn revision() -> Revision {
    Revision::new(
        1,
        "001_hh_integration",
        "HeadHunter OAuth tokens, resume link and synced metrics on users",
    )
    .add_column("users", ColumnDef::new("hh_access_token", "TEXT"))
    .add_column("users", ColumnDef::new("hh_refresh_token", "TEXT"))
    .add_column("users", ColumnDef::new("hh_token_expires_at", "DATETIME"))
    .add_column("users", ColumnDef::new("hh_resume_id", "VARCHAR(100)"))
    .add_column("users", ColumnDef::new("hh_metrics", "JSON"))
    .add_column("users", ColumnDef::new("hh_last_sync", "DATETIME"))
}
