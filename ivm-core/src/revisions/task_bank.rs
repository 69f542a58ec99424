//! 003: reusable task bank (categories + templates) with seeded categories.

use crate::schema::{int, text, ColumnDef, Revision, SeedRowSet, TableDefinition};

/// (name, Russian name, English name, icon)
const CATEGORIES: [(&str, &str, &str, &str); 10] = [
    ("backend", "Бэкенд", "Backend", "🖥️"),
    ("frontend", "Фронтенд", "Frontend", "🎨"),
    ("fullstack", "Фулстек", "Full Stack", "🧩"),
    ("mobile", "Мобильная разработка", "Mobile", "📱"),
    ("devops", "DevOps", "DevOps", "⚙️"),
    ("data_science", "Анализ данных", "Data Science", "📊"),
    ("machine_learning", "Машинное обучение", "Machine Learning", "🤖"),
    ("qa", "Тестирование", "QA", "🧪"),
    ("security", "Безопасность", "Security", "🔒"),
    ("design", "Дизайн", "Design", "✏️"),
];

pub fn revision() -> Revision {
    Revision::new(
        3,
        "003_task_bank",
        "Task categories and templates for the test-task bank",
    )
    .create_table(task_categories())
    .create_table(task_templates())
    .create_index("idx_task_categories_parent", "task_categories", &["parent_id"])
    .create_index("idx_task_templates_category", "task_templates", &["category_id"])
    .create_index("idx_task_templates_type", "task_templates", &["task_type"])
    .create_index("idx_task_templates_difficulty", "task_templates", &["difficulty"])
    .create_index("idx_task_templates_active", "task_templates", &["is_active"])
    .seed(category_seed())
}

fn task_categories() -> TableDefinition {
    TableDefinition::new("task_categories")
        .column(ColumnDef::id())
        .column(ColumnDef::new("name", "VARCHAR(100)").not_null().unique())
        .column(ColumnDef::new("display_name_ru", "VARCHAR(255)").not_null())
        .column(ColumnDef::new("display_name_en", "VARCHAR(255)").not_null())
        .column(ColumnDef::new("description", "TEXT"))
        .column(ColumnDef::new("icon", "VARCHAR(16)"))
        .column(ColumnDef::new("parent_id", "INTEGER"))
        .column(ColumnDef::new("sort_order", "INTEGER").default("0"))
        .column(ColumnDef::new("created_at", "DATETIME").default("CURRENT_TIMESTAMP"))
        .foreign_key("parent_id", "task_categories", "id", Some("SET NULL"))
}

fn task_templates() -> TableDefinition {
    TableDefinition::new("task_templates")
        .column(ColumnDef::id())
        .column(ColumnDef::new("category_id", "INTEGER"))
        .column(ColumnDef::new("title", "VARCHAR(255)").not_null())
        .column(ColumnDef::new("description", "TEXT").not_null())
        .column(ColumnDef::new("task_type", "VARCHAR(50)"))
        .column(ColumnDef::new("difficulty", "VARCHAR(20)").default("'middle'"))
        .column(ColumnDef::new("requirements", "JSON"))
        .column(ColumnDef::new("evaluation_criteria", "JSON"))
        .column(ColumnDef::new("technologies", "JSON"))
        .column(ColumnDef::new("tags", "JSON"))
        .column(ColumnDef::new("estimated_hours", "FLOAT"))
        .column(ColumnDef::new("usage_count", "INTEGER").default("0"))
        .column(ColumnDef::new("average_score", "FLOAT"))
        .column(ColumnDef::new("completion_rate", "FLOAT"))
        .column(ColumnDef::new("is_verified", "BOOLEAN").default("0"))
        .column(ColumnDef::new("is_active", "BOOLEAN").default("1"))
        .column(ColumnDef::new("author_id", "INTEGER"))
        .column(ColumnDef::new("created_at", "DATETIME").default("CURRENT_TIMESTAMP"))
        .column(ColumnDef::new("updated_at", "DATETIME").default("CURRENT_TIMESTAMP"))
        .foreign_key("category_id", "task_categories", "id", Some("SET NULL"))
        .foreign_key("author_id", "users", "id", None)
}

fn category_seed() -> SeedRowSet {
    CATEGORIES.iter().zip(1i64..).fold(
        SeedRowSet::new(
            "task_categories",
            vec!["name", "display_name_ru", "display_name_en", "icon", "sort_order"],
        )
        .keyed_by(&["name"]),
        |seed, (&(name, ru, en, icon), order)| {
            seed.row(vec![text(name), text(ru), text(en), text(icon), int(order)])
        },
    )
}
