use super::*;
use crate::db::Database;
use crate::revisions;
use crate::schema::{text, ColumnDef, SeedRowSet, TableDefinition};
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

/// Schema as the application's bootstrap created it before any revision.
const BASE_SCHEMA: &str = "
    CREATE TABLE users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        email VARCHAR(255) NOT NULL UNIQUE,
        full_name VARCHAR(255),
        role VARCHAR(20) DEFAULT 'candidate'
    );
    CREATE TABLE interview_sessions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        candidate_id INTEGER NOT NULL REFERENCES users (id),
        status VARCHAR(20) DEFAULT 'created',
        started_at DATETIME
    );
    CREATE TABLE questions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        session_id INTEGER NOT NULL REFERENCES interview_sessions (id),
        text TEXT NOT NULL
    );
    CREATE TABLE answers (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        question_id INTEGER NOT NULL REFERENCES questions (id),
        text TEXT
    );
    INSERT INTO users (email, full_name) VALUES ('a@example.com', 'Anna'), ('b@example.com', 'Boris');
    INSERT INTO interview_sessions (candidate_id) VALUES (1);
";

fn base_db() -> (TempDir, PathBuf) {
    let temp = tempdir().expect("Failed to create temp dir");
    let path = temp.path().join("interview.db");
    let db = Database::create_path(&path).expect("Failed to create db");
    db.with_conn(|conn| Ok(conn.execute_batch(BASE_SCHEMA)?))
        .expect("Failed to bootstrap schema");
    (temp, path)
}

fn open(path: &Path) -> Database {
    Database::open_path(path).expect("Failed to open db")
}

fn columns(path: &Path, table: &str) -> Vec<crate::db::ColumnInfo> {
    open(path)
        .with_conn(|conn| catalog::table_columns(conn, table))
        .expect("Failed to describe table")
}

fn count(path: &Path, sql: &str) -> i64 {
    open(path)
        .with_conn(|conn| Ok(conn.query_row(sql, [], |row| row.get(0))?))
        .expect("Failed to count")
}

fn schema_snapshot(path: &Path) -> Vec<(String, String)> {
    open(path)
        .with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT name, sql FROM sqlite_master WHERE sql IS NOT NULL ORDER BY name",
            )?;
            let rows = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .expect("Failed to snapshot schema")
}

#[test]
fn test_hh_integration_adds_six_nullable_columns_and_keeps_rows() {
    let (_temp, path) = base_db();
    let before: Vec<(i64, String, Option<String>)> = open(&path)
        .with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, email, full_name FROM users ORDER BY id")?;
            let rows = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .unwrap();
    let columns_before = columns(&path, "users").len();

    let revision = revisions::find("hh_integration").unwrap();
    let report = apply(&revision, &ConnectionSource::path(&path)).unwrap();

    assert_eq!(report.state, RevisionState::Applied);
    assert_eq!(report.count(ItemKind::Column, Outcome::Added), 6);

    let after_columns = columns(&path, "users");
    assert_eq!(after_columns.len(), columns_before + 6);
    for addition in &revision.columns {
        let live = after_columns
            .iter()
            .find(|c| c.name == addition.column.name)
            .expect("column missing after apply");
        assert_eq!(live.declared_type, addition.column.sql_type);
        assert!(!live.not_null);
    }

    let after: Vec<(i64, String, Option<String>)> = open(&path)
        .with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, email, full_name FROM users ORDER BY id")?;
            let rows = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .unwrap();
    assert_eq!(before, after);
    assert_eq!(
        count(&path, "SELECT COUNT(*) FROM users WHERE hh_access_token IS NOT NULL"),
        0
    );
}

#[test]
fn test_apply_twice_is_idempotent() {
    let (_temp, path) = base_db();
    let source = ConnectionSource::path(&path);

    let first = apply_all(&revisions::all(), &source).unwrap();
    assert!(first.iter().all(|r| r.changes() > 0));
    let snapshot = schema_snapshot(&path);

    let second = apply_all(&revisions::all(), &source).unwrap();
    for report in &second {
        assert_eq!(report.state, RevisionState::Applied);
        assert_eq!(report.changes(), 0, "{} changed on re-run", report.revision);
        for entry in &report.entries {
            assert!(
                matches!(entry.outcome, Outcome::AlreadyPresent | Outcome::Skipped),
                "{} -> {}",
                entry.target,
                entry.outcome
            );
        }
    }
    assert_eq!(schema_snapshot(&path), snapshot);
}

#[test]
fn test_anti_cheat_columns_and_test_tasks() {
    let (_temp, path) = base_db();
    let revision = revisions::find("002_anti_cheat").unwrap();
    let report = apply(&revision, &ConnectionSource::path(&path)).unwrap();

    assert_eq!(report.count(ItemKind::Column, Outcome::Added), 13);
    assert_eq!(report.entry("test_tasks").unwrap().outcome, Outcome::Created);

    let sessions = columns(&path, "interview_sessions");
    let score = sessions.iter().find(|c| c.name == "suspicion_score").unwrap();
    assert_eq!(score.declared_type, "FLOAT");
    assert_eq!(score.default_value.as_deref(), Some("0.0"));
    assert_eq!(
        count(&path, "SELECT COUNT(*) FROM interview_sessions WHERE suspicion_score = 0.0"),
        1
    );

    assert!(columns(&path, "questions").iter().any(|c| c.name == "shown_at"));
    assert_eq!(columns(&path, "answers").len(), 3 + 3);

    open(&path)
        .with_conn(|conn| {
            conn.execute(
                "INSERT INTO test_tasks (session_id, title, description) VALUES (1, 'API', 'Build it')",
                [],
            )?;
            let status: String =
                conn.query_row("SELECT status FROM test_tasks", [], |row| row.get(0))?;
            assert_eq!(status, "pending");
            Ok(())
        })
        .unwrap();
}

#[test]
fn test_existing_table_is_left_alone() {
    let (_temp, path) = base_db();
    open(&path)
        .with_conn(|conn| {
            Ok(conn.execute_batch(
                "CREATE TABLE test_tasks (id INTEGER PRIMARY KEY, legacy TEXT);
                 INSERT INTO test_tasks (legacy) VALUES ('keep me');",
            )?)
        })
        .unwrap();

    let revision = revisions::find("anti_cheat").unwrap();
    let report = apply(&revision, &ConnectionSource::path(&path)).unwrap();

    let entry = report.entry("test_tasks").unwrap();
    assert_eq!(entry.outcome, Outcome::Skipped);

    let live: Vec<String> = columns(&path, "test_tasks").into_iter().map(|c| c.name).collect();
    assert_eq!(live, vec!["id".to_string(), "legacy".to_string()]);
    assert_eq!(count(&path, "SELECT COUNT(*) FROM test_tasks"), 1);
}

#[test]
fn test_task_bank_seeds_exactly_ten_categories() {
    let (_temp, path) = base_db();
    let source = ConnectionSource::path(&path);
    let revision = revisions::find("3").unwrap();

    for run in 0..3 {
        let report = apply(&revision, &source).unwrap();
        let expected = if run == 0 {
            Outcome::Added
        } else {
            Outcome::AlreadyPresent
        };
        assert_eq!(report.count(ItemKind::Seed, expected), 1);
        assert_eq!(count(&path, "SELECT COUNT(*) FROM task_categories"), 10);
    }

    assert_eq!(
        count(
            &path,
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name LIKE 'idx_task_%'"
        ),
        5
    );
}

#[test]
fn test_failure_mid_revision_rolls_back_everything() {
    let (_temp, path) = base_db();
    let snapshot = schema_snapshot(&path);

    // Columns and the table succeed, then the index targets a table that
    // does not exist.
    let revision = Revision::new(1, "001_broken", "fails at the index step")
        .add_column("users", ColumnDef::new("nickname", "TEXT"))
        .create_table(TableDefinition::new("scratch").column(ColumnDef::id()))
        .create_index("idx_missing_table", "no_such_table", &["id"]);

    let err = apply(&revision, &ConnectionSource::path(&path)).unwrap_err();
    assert!(matches!(err, Error::Revision { ref revision, .. } if revision == "001_broken"));
    assert!(matches!(err.root_cause(), Error::Database(_)));

    assert_eq!(schema_snapshot(&path), snapshot);
    assert!(!columns(&path, "users").iter().any(|c| c.name == "nickname"));
    let db = open(&path);
    assert!(!db.with_conn(|conn| catalog::table_exists(conn, "scratch")).unwrap());
    assert!(db.with_conn(ledger::applied).unwrap().is_empty());
}

#[test]
fn test_seed_failure_rolls_back_columns() {
    let (_temp, path) = base_db();

    let revision = Revision::new(1, "001_bad_seed", "seed into a missing table")
        .add_column("users", ColumnDef::new("nickname", "TEXT"))
        .seed(SeedRowSet::new("nowhere", vec!["name"]).row(vec![text("x")]));

    assert!(apply(&revision, &ConnectionSource::path(&path)).is_err());
    assert!(!columns(&path, "users").iter().any(|c| c.name == "nickname"));
}

#[test]
fn test_missing_table_is_an_error() {
    let (_temp, path) = base_db();
    let revision = Revision::new(1, "001_orphan", "targets a table that was never created")
        .add_column("users", ColumnDef::new("nickname", "TEXT"))
        .add_column("ghosts", ColumnDef::new("boo", "TEXT"));

    let err = apply(&revision, &ConnectionSource::path(&path)).unwrap_err();
    assert!(matches!(err.root_cause(), Error::MissingTable { table } if table == "ghosts"));
    assert!(!columns(&path, "users").iter().any(|c| c.name == "nickname"));
}

#[test]
fn test_missing_database_is_nothing_to_do() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("never-created.db");
    let source = ConnectionSource::path(&path);

    let report = apply(&revisions::all()[0], &source).unwrap();
    assert!(report.database_missing);
    assert_eq!(report.state, RevisionState::Unapplied);
    assert!(report.entries.is_empty());

    let reports = apply_all(&revisions::all(), &source).unwrap();
    assert!(reports.iter().all(|r| r.database_missing));

    assert_eq!(revert(&revisions::all()[1], &source).unwrap(), RevertOutcome::NothingToDo);
    assert!(status(&revisions::all(), &source)
        .unwrap()
        .iter()
        .all(|s| s.state == RevisionState::Unapplied));

    assert!(!path.exists());
}

#[test]
fn test_revert_refuses_and_changes_nothing() {
    let (_temp, path) = base_db();
    let source = ConnectionSource::path(&path);
    let revision = revisions::find("anti_cheat").unwrap();
    apply(&revision, &source).unwrap();
    let snapshot = schema_snapshot(&path);

    match revert(&revision, &source).unwrap() {
        RevertOutcome::Refused { reason } => {
            assert!(reason.contains("002_anti_cheat"));
            assert!(reason.contains("interview_sessions"));
            assert!(reason.contains("backup"));
        }
        other => panic!("expected refusal, got {other:?}"),
    }
    assert_eq!(schema_snapshot(&path), snapshot);
}

#[test]
fn test_ledger_records_and_allows_older_revision_after_newer() {
    let (_temp, path) = base_db();
    let source = ConnectionSource::path(&path);
    let all = revisions::all();

    apply(&all[2], &source).unwrap();

    // An unrecorded older revision still runs and is recorded
    let report = apply(&all[0], &source).unwrap();
    assert_eq!(report.state, RevisionState::Applied);
    assert_eq!(report.count(ItemKind::Column, Outcome::Added), 6);
    assert_eq!(report.count(ItemKind::Ledger, Outcome::Added), 1);
    assert!(columns(&path, "users").iter().any(|c| c.name == "hh_access_token"));

    // A recorded revision can always be re-run
    let rerun = apply(&all[2], &source).unwrap();
    assert_eq!(rerun.count(ItemKind::Ledger, Outcome::AlreadyPresent), 1);

    let statuses = status(&all, &source).unwrap();
    assert_eq!(statuses.len(), 3);
    assert_eq!(statuses[0].state, RevisionState::Applied);
    assert_eq!(statuses[1].state, RevisionState::Unapplied);
    assert_eq!(statuses[2].state, RevisionState::Applied);
    assert!(statuses[2].applied_at.is_some());
}

#[test]
fn test_targeted_upgrade_then_full_upgrade_on_legacy_database() {
    // 001 and 002 were applied by an earlier tool: columns and tables exist,
    // nothing is recorded.
    let (_temp, path) = base_db();
    let all = revisions::all();
    open(&path)
        .with_conn(|conn| {
            for revision in &all[..2] {
                for addition in &revision.columns {
                    conn.execute_batch(&addition.to_sql())?;
                }
                for table in &revision.tables {
                    conn.execute_batch(&table.to_sql())?;
                }
            }
            Ok(())
        })
        .unwrap();
    let source = ConnectionSource::path(&path);

    let targeted = apply(&revisions::find("3").unwrap(), &source).unwrap();
    assert_eq!(targeted.state, RevisionState::Applied);

    let reports = apply_all(&all, &source).unwrap();
    assert_eq!(reports.len(), 3);
    for report in &reports[..2] {
        assert_eq!(report.count(ItemKind::Column, Outcome::Added), 0, "{}", report.revision);
        assert_eq!(report.count(ItemKind::Table, Outcome::Created), 0, "{}", report.revision);
        assert_eq!(report.count(ItemKind::Ledger, Outcome::Added), 1);
    }
    assert_eq!(reports[2].changes(), 0);

    let recorded = open(&path).with_conn(ledger::applied).unwrap();
    assert_eq!(
        recorded.iter().map(|r| r.version).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
}

#[test]
fn test_added_columns_keep_declared_types() {
    let (_temp, path) = base_db();
    let all = revisions::all();
    apply_all(&all, &ConnectionSource::path(&path)).unwrap();

    let mut checked = 0;
    for revision in &all {
        for addition in &revision.columns {
            let live = columns(&path, addition.table);
            let column = live
                .iter()
                .find(|c| c.name == addition.column.name)
                .unwrap_or_else(|| panic!("{} missing", addition.target()));
            assert_eq!(
                column.declared_type,
                addition.column.sql_type,
                "{}",
                addition.target()
            );
            checked += 1;
        }
    }
    assert_eq!(checked, 19);
}

#[test]
fn test_seed_is_idempotent_without_unique_constraint() {
    // task_categories created by hand, without UNIQUE on name
    let (_temp, path) = base_db();
    open(&path)
        .with_conn(|conn| {
            Ok(conn.execute_batch(
                "CREATE TABLE task_categories (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name VARCHAR(100) NOT NULL,
                    display_name_ru VARCHAR(100),
                    display_name_en VARCHAR(100),
                    icon VARCHAR(50),
                    parent_id INTEGER,
                    sort_order INTEGER DEFAULT 0
                );",
            )?)
        })
        .unwrap();
    let source = ConnectionSource::path(&path);
    let revision = revisions::find("task_bank").unwrap();

    let first = apply(&revision, &source).unwrap();
    assert_eq!(first.count(ItemKind::Table, Outcome::Skipped), 1);
    assert_eq!(first.count(ItemKind::Seed, Outcome::Added), 1);

    let second = apply(&revision, &source).unwrap();
    assert_eq!(second.count(ItemKind::Seed, Outcome::AlreadyPresent), 1);

    assert_eq!(count(&path, "SELECT COUNT(*) FROM task_categories"), 10);
    assert_eq!(
        count(&path, "SELECT COUNT(DISTINCT name) FROM task_categories"),
        10
    );
}

#[test]
fn test_unsupported_column_addition_is_rejected_and_rolled_back() {
    let (_temp, path) = base_db();
    let snapshot = schema_snapshot(&path);

    let revision = Revision::new(1, "001_unique_column", "UNIQUE cannot be added in place")
        .add_column("users", ColumnDef::new("nickname", "TEXT"))
        .add_column("users", ColumnDef::new("login", "VARCHAR(50)").unique());

    let err = apply(&revision, &ConnectionSource::path(&path)).unwrap_err();
    assert!(matches!(
        err.root_cause(),
        Error::InvalidColumn { target, .. } if target == "users.login"
    ));
    assert_eq!(schema_snapshot(&path), snapshot);
}

#[test]
fn test_shared_handle_stays_open() {
    let db = Database::open_in_memory().unwrap();
    db.with_conn(|conn| Ok(conn.execute_batch(BASE_SCHEMA)?)).unwrap();
    let source = ConnectionSource::handle(&db);

    let reports = apply_all(&revisions::all(), &source).unwrap();
    assert_eq!(reports.len(), 3);
    assert!(!source.is_missing());

    db.ping().unwrap();
    let recorded = db.with_conn(ledger::applied).unwrap();
    assert_eq!(
        recorded.iter().map(|r| r.version).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
}

#[test]
fn test_legacy_database_is_adopted_into_ledger() {
    // Columns added by an earlier tool, no ledger table yet.
    let (_temp, path) = base_db();
    open(&path)
        .with_conn(|conn| {
            Ok(conn.execute_batch(
                "ALTER TABLE users ADD COLUMN hh_access_token TEXT;
                 ALTER TABLE users ADD COLUMN hh_refresh_token TEXT;",
            )?)
        })
        .unwrap();

    let revision = revisions::find("1").unwrap();
    let report = apply(&revision, &ConnectionSource::path(&path)).unwrap();
    assert_eq!(report.count(ItemKind::Column, Outcome::AlreadyPresent), 2);
    assert_eq!(report.count(ItemKind::Column, Outcome::Added), 4);
    assert_eq!(report.count(ItemKind::Ledger, Outcome::Added), 1);
}
