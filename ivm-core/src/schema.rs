//! Declarative schema changes.
//!
//! A [`Revision`] is data: the columns, tables, indexes and seed rows it adds.
//! The migrator decides at run time which of them are missing from the live
//! database. Every statement rendered here is additive and guarded
//! (`IF NOT EXISTS`, `WHERE NOT EXISTS`), so re-running it is harmless.

use rusqlite::types::Value;
use serde::Serialize;

use crate::error::{Error, Result};

/// Quote an SQL identifier
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

// ─────────────────────────────────────────────────────────────────────────────
// Columns
// ─────────────────────────────────────────────────────────────────────────────

/// Column definition, used both for `ADD COLUMN` and inside `CREATE TABLE`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDef {
    pub name: &'static str,
    /// Declared SQL type, stored verbatim by SQLite
    pub sql_type: &'static str,
    pub not_null: bool,
    pub unique: bool,
    pub primary_key: bool,
    pub autoincrement: bool,
    /// Raw SQL default expression (`0.0`, `'pending'`, `CURRENT_TIMESTAMP`)
    pub default: Option<&'static str>,
}

impl ColumnDef {
    /// Nullable column with no default
    pub fn new(name: &'static str, sql_type: &'static str) -> Self {
        Self {
            name,
            sql_type,
            not_null: false,
            unique: false,
            primary_key: false,
            autoincrement: false,
            default: None,
        }
    }

    /// `INTEGER PRIMARY KEY AUTOINCREMENT` id column
    pub fn id() -> Self {
        Self {
            primary_key: true,
            autoincrement: true,
            ..Self::new("id", "INTEGER")
        }
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn default(mut self, expr: &'static str) -> Self {
        self.default = Some(expr);
        self
    }

    /// Render the column clause
    pub fn to_sql(&self) -> String {
        let mut sql = format!("{} {}", quote_ident(self.name), self.sql_type);
        if self.primary_key {
            sql.push_str(" PRIMARY KEY");
            if self.autoincrement {
                sql.push_str(" AUTOINCREMENT");
            }
        }
        if self.not_null {
            sql.push_str(" NOT NULL");
        }
        if self.unique {
            sql.push_str(" UNIQUE");
        }
        if let Some(default) = self.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(default);
        }
        sql
    }
}

/// A column added to an existing table.
///
/// SQLite's `ADD COLUMN` cannot add `PRIMARY KEY` or `UNIQUE` columns, needs
/// a non-NULL default for `NOT NULL`, and only takes constant defaults.
/// [`ColumnAddition::validate`] rejects anything else before it reaches the
/// database.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnAddition {
    pub table: &'static str,
    pub column: ColumnDef,
}

impl ColumnAddition {
    /// Check the column can be added with `ALTER TABLE ... ADD COLUMN`
    pub fn validate(&self) -> Result<()> {
        let column = &self.column;
        let reason = if column.primary_key {
            Some("PRIMARY KEY is not allowed")
        } else if column.unique {
            Some("UNIQUE is not allowed")
        } else {
            match column.default {
                Some(expr) if !is_constant_default(expr) => {
                    Some("the default must be a constant, not an expression")
                }
                Some(expr) if column.not_null && expr.trim().eq_ignore_ascii_case("NULL") => {
                    Some("NOT NULL needs a non-NULL default")
                }
                None if column.not_null => Some("NOT NULL needs a non-NULL default"),
                _ => None,
            }
        };

        match reason {
            Some(reason) => Err(Error::invalid_column(self.target(), reason)),
            None => Ok(()),
        }
    }

    pub fn to_sql(&self) -> String {
        format!(
            "ALTER TABLE {} ADD COLUMN {}",
            quote_ident(self.table),
            self.column.to_sql()
        )
    }

    /// `table.column`, used in reports
    pub fn target(&self) -> String {
        format!("{}.{}", self.table, self.column.name)
    }
}

/// Literal defaults only; `CURRENT_*` and parenthesised expressions are not
/// accepted by `ADD COLUMN`.
fn is_constant_default(expr: &str) -> bool {
    let expr = expr.trim();
    let upper = expr.to_ascii_uppercase();
    !(expr.starts_with('(')
        || upper == "CURRENT_TIMESTAMP"
        || upper == "CURRENT_TIME"
        || upper == "CURRENT_DATE")
}

// ─────────────────────────────────────────────────────────────────────────────
// Tables
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForeignKey {
    pub column: &'static str,
    pub references_table: &'static str,
    pub references_column: &'static str,
    /// `CASCADE`, `SET NULL`, ...
    pub on_delete: Option<&'static str>,
}

/// Full definition of a table created by a revision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableDefinition {
    pub name: &'static str,
    pub columns: Vec<ColumnDef>,
    pub foreign_keys: Vec<ForeignKey>,
}

impl TableDefinition {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            columns: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    pub fn foreign_key(
        mut self,
        column: &'static str,
        references_table: &'static str,
        references_column: &'static str,
        on_delete: Option<&'static str>,
    ) -> Self {
        self.foreign_keys.push(ForeignKey {
            column,
            references_table,
            references_column,
            on_delete,
        });
        self
    }

    pub fn to_sql(&self) -> String {
        let mut clauses: Vec<String> = self.columns.iter().map(ColumnDef::to_sql).collect();
        for fk in &self.foreign_keys {
            let mut clause = format!(
                "FOREIGN KEY ({}) REFERENCES {} ({})",
                quote_ident(fk.column),
                quote_ident(fk.references_table),
                quote_ident(fk.references_column)
            );
            if let Some(action) = fk.on_delete {
                clause.push_str(" ON DELETE ");
                clause.push_str(action);
            }
            clauses.push(clause);
        }
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
            quote_ident(self.name),
            clauses.join(",\n    ")
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Indexes
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexDefinition {
    pub name: &'static str,
    pub table: &'static str,
    pub columns: Vec<&'static str>,
    pub unique: bool,
}

impl IndexDefinition {
    pub fn to_sql(&self) -> String {
        let columns: Vec<String> = self.columns.iter().map(|c| quote_ident(c)).collect();
        format!(
            "CREATE {}INDEX IF NOT EXISTS {} ON {} ({})",
            if self.unique { "UNIQUE " } else { "" },
            quote_ident(self.name),
            quote_ident(self.table),
            columns.join(", ")
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Seed data
// ─────────────────────────────────────────────────────────────────────────────

/// Reference rows for one table.
///
/// A row is inserted only when no existing row matches it on the key columns
/// (every column when no key is set), so re-runs never duplicate rows even
/// if the table has no UNIQUE constraint of its own.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedRowSet {
    pub table: &'static str,
    pub columns: Vec<&'static str>,
    /// Natural-key columns, a subset of `columns`
    pub key: Vec<&'static str>,
    pub rows: Vec<Vec<Value>>,
}

impl SeedRowSet {
    pub fn new(table: &'static str, columns: Vec<&'static str>) -> Self {
        Self {
            table,
            columns,
            key: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn keyed_by(mut self, key: &[&'static str]) -> Self {
        self.key = key.to_vec();
        self
    }

    pub fn row(mut self, values: Vec<Value>) -> Self {
        self.rows.push(values);
        self
    }

    /// Guarded insert for one row. Key columns reuse the positional
    /// parameter of the matching value, so rows bind as-is.
    pub fn insert_sql(&self) -> Result<String> {
        let key = if self.key.is_empty() {
            &self.columns
        } else {
            &self.key
        };

        let mut conditions = Vec::with_capacity(key.len());
        for name in key {
            let position = self
                .columns
                .iter()
                .position(|c| c == name)
                .ok_or_else(|| {
                    Error::Other(format!(
                        "Seed key column {name} is not among the seeded columns of {}",
                        self.table
                    ))
                })?;
            conditions.push(format!("{} IS ?{}", quote_ident(name), position + 1));
        }

        let columns: Vec<String> = self.columns.iter().map(|c| quote_ident(c)).collect();
        let placeholders: Vec<String> = (1..=self.columns.len()).map(|i| format!("?{i}")).collect();
        let table = quote_ident(self.table);
        Ok(format!(
            "INSERT INTO {table} ({}) SELECT {} WHERE NOT EXISTS (SELECT 1 FROM {table} WHERE {})",
            columns.join(", "),
            placeholders.join(", "),
            conditions.join(" AND ")
        ))
    }
}

/// Text seed value
pub fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

/// Integer seed value
pub fn int(value: i64) -> Value {
    Value::Integer(value)
}

// ─────────────────────────────────────────────────────────────────────────────
// Revision
// ─────────────────────────────────────────────────────────────────────────────

/// One versioned, self-contained schema change.
#[derive(Debug, Clone, PartialEq)]
pub struct Revision {
    /// Monotonic version, recorded in the ledger
    pub version: u32,
    /// Unique tag, e.g. `001_hh_integration`
    pub name: &'static str,
    pub description: &'static str,
    pub columns: Vec<ColumnAddition>,
    pub tables: Vec<TableDefinition>,
    pub indexes: Vec<IndexDefinition>,
    pub seeds: Vec<SeedRowSet>,
}

impl Revision {
    pub fn new(version: u32, name: &'static str, description: &'static str) -> Self {
        Self {
            version,
            name,
            description,
            columns: Vec::new(),
            tables: Vec::new(),
            indexes: Vec::new(),
            seeds: Vec::new(),
        }
    }

    pub fn add_column(mut self, table: &'static str, column: ColumnDef) -> Self {
        self.columns.push(ColumnAddition { table, column });
        self
    }

    pub fn create_table(mut self, table: TableDefinition) -> Self {
        self.tables.push(table);
        self
    }

    pub fn create_index(
        mut self,
        name: &'static str,
        table: &'static str,
        columns: &[&'static str],
    ) -> Self {
        self.indexes.push(IndexDefinition {
            name,
            table,
            columns: columns.to_vec(),
            unique: false,
        });
        self
    }

    pub fn seed(mut self, seed: SeedRowSet) -> Self {
        self.seeds.push(seed);
        self
    }

    /// Tables that receive column additions, in first-seen order
    pub fn altered_tables(&self) -> Vec<&'static str> {
        let mut tables: Vec<&'static str> = Vec::new();
        for addition in &self.columns {
            if !tables.contains(&addition.table) {
                tables.push(addition.table);
            }
        }
        tables
    }

    /// Column additions targeting `table`
    pub fn columns_for(&self, table: &str) -> impl Iterator<Item = &ColumnAddition> {
        self.columns.iter().filter(move |c| c.table == table)
    }
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (v{})", self.name, self.version)
    }
}
