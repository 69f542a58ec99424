//! Built-in revisions, in version order.
//!
//! Released revisions are never edited. Schema changes go into a new module
//! with the next version number.

mod anti_cheat;
mod hh_integration;
mod task_bank;

use crate::error::{Error, Result};
use crate::schema::Revision;

/// All revisions, oldest first
pub fn all() -> Vec<Revision> {
    vec![
        hh_integration::revision(),
        anti_cheat::revision(),
        task_bank::revision(),
    ]
}

/// Look up a revision by name (`002_anti_cheat`), short name (`anti_cheat`)
/// or version (`2`).
pub fn find(key: &str) -> Result<Revision> {
    let version = key.parse::<u32>().ok();
    all()
        .into_iter()
        .find(|r| {
            Some(r.version) == version
                || r.name == key
                || r.name.split_once('_').is_some_and(|(_, short)| short == key)
        })
        .ok_or_else(|| Error::UnknownRevision(key.to_string()))
}
