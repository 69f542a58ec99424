//! 002: anti-cheat telemetry and take-home test tasks.

use crate::schema::{ColumnDef, Revision, TableDefinition};

pub fn revision() -> Revision {
    Revision::new(
        2,
        "002_anti_cheat",
        "Session/answer telemetry for cheating detection, plus test_tasks",
    )
    // interview_sessions
    .add_column("interview_sessions", ColumnDef::new("activity_history", "JSON"))
    .add_column(
        "interview_sessions",
        ColumnDef::new("suspicion_score", "FLOAT").default("0.0"),
    )
    .add_column("interview_sessions", ColumnDef::new("device_fingerprint", "VARCHAR(255)"))
    .add_column("interview_sessions", ColumnDef::new("client_ip", "VARCHAR(45)"))
    .add_column("interview_sessions", ColumnDef::new("user_agent", "TEXT"))
    .add_column("interview_sessions", ColumnDef::new("concurrent_sessions", "JSON"))
    .add_column("interview_sessions", ColumnDef::new("ai_detection_results", "JSON"))
    .add_column("interview_sessions", ColumnDef::new("typing_metrics", "JSON"))
    .add_column("interview_sessions", ColumnDef::new("application_status", "VARCHAR(50)"))
    // answers
    .add_column("answers", ColumnDef::new("time_to_answer", "FLOAT"))
    .add_column("answers", ColumnDef::new("typing_speed", "FLOAT"))
    .add_column("answers", ColumnDef::new("activity_during_answer", "JSON"))
    // questions
    .add_column("questions", ColumnDef::new("shown_at", "DATETIME"))
    .create_table(test_tasks())
}

fn test_tasks() -> TableDefinition {
    TableDefinition::new("test_tasks")
        .column(ColumnDef::id())
        .column(ColumnDef::new("session_id", "INTEGER").not_null())
        .column(ColumnDef::new("title", "VARCHAR(255)").not_null())
        .column(ColumnDef::new("description", "TEXT").not_null())
        .column(ColumnDef::new("task_type", "VARCHAR(50)"))
        .column(ColumnDef::new("requirements", "JSON"))
        .column(ColumnDef::new("deadline", "DATETIME"))
        .column(ColumnDef::new("status", "VARCHAR(20)").default("'pending'"))
        .column(ColumnDef::new("solution", "TEXT"))
        .column(ColumnDef::new("solution_files", "JSON"))
        .column(ColumnDef::new("score", "FLOAT"))
        .column(ColumnDef::new("feedback", "TEXT"))
        .column(ColumnDef::new("reviewer_id", "INTEGER"))
        .column(ColumnDef::new("reviewed_at", "DATETIME"))
        .column(ColumnDef::new("created_at", "DATETIME").default("CURRENT_TIMESTAMP"))
        .column(ColumnDef::new("updated_at", "DATETIME").default("CURRENT_TIMESTAMP"))
        .foreign_key("session_id", "interview_sessions", "id", Some("CASCADE"))
        .foreign_key("reviewer_id", "users", "id", None)
}
