//! Structured outcome of a migration run.

use serde::Serialize;

use crate::schema::Revision;

/// What a report entry refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Column,
    Table,
    Index,
    Seed,
    Ledger,
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Column => "column",
            Self::Table => "table",
            Self::Index => "index",
            Self::Seed => "seed",
            Self::Ledger => "ledger",
        };
        f.pad(s)
    }
}

/// Per-item outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Added,
    AlreadyPresent,
    Created,
    Skipped,
}

impl Outcome {
    /// Whether the item changed the schema or data
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Added | Self::Created)
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Added => "added",
            Self::AlreadyPresent => "already present",
            Self::Created => "created",
            Self::Skipped => "skipped",
        };
        f.pad(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    pub kind: ItemKind,
    /// `users.hh_access_token`, `test_tasks`, `idx_task_templates_category`, ...
    pub target: String,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ReportEntry {
    pub fn new(kind: ItemKind, target: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            kind,
            target: target.into(),
            outcome,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Lifecycle of a revision against one database.
///
/// `Unapplied -> Applying -> Applied`, or `Unapplied -> Applying -> FailedRolledBack`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RevisionState {
    Unapplied,
    Applying,
    Applied,
    FailedRolledBack,
}

impl std::fmt::Display for RevisionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Unapplied => "unapplied",
            Self::Applying => "applying",
            Self::Applied => "applied",
            Self::FailedRolledBack => "failed (rolled back)",
        };
        f.pad(s)
    }
}

/// Result of applying one revision
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MigrationReport {
    pub revision: String,
    pub version: u32,
    pub state: RevisionState,
    /// The target database file did not exist; nothing was attempted
    pub database_missing: bool,
    pub entries: Vec<ReportEntry>,
}

impl MigrationReport {
    pub fn applied(revision: &Revision, entries: Vec<ReportEntry>) -> Self {
        Self {
            revision: revision.name.to_string(),
            version: revision.version,
            state: RevisionState::Applied,
            database_missing: false,
            entries,
        }
    }

    pub fn nothing_to_do(revision: &Revision) -> Self {
        Self {
            revision: revision.name.to_string(),
            version: revision.version,
            state: RevisionState::Unapplied,
            database_missing: true,
            entries: Vec::new(),
        }
    }

    /// Number of items that changed the database
    pub fn changes(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.is_change()).count()
    }

    /// Entries of one kind with one outcome
    pub fn count(&self, kind: ItemKind, outcome: Outcome) -> usize {
        self.entries
            .iter()
            .filter(|e| e.kind == kind && e.outcome == outcome)
            .count()
    }

    /// Look up the entry for a target
    pub fn entry(&self, target: &str) -> Option<&ReportEntry> {
        self.entries.iter().find(|e| e.target == target)
    }
}

/// Result of the reverse path
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RevertOutcome {
    /// The database file does not exist
    NothingToDo,
    /// No DDL was issued
    Refused { reason: String },
}

/// Ledger view of one known revision
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevisionStatus {
    pub version: u32,
    pub name: String,
    pub description: String,
    pub state: RevisionState,
    pub applied_at: Option<String>,
}
