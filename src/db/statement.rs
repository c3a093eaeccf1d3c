//! Dialect-aware statement construction.
//!
//! Identifiers and clause text pass through verbatim; values travel as bound
//! parameters inside [`SqlFragment`]s. The builder produces a
//! [`StatementPlan`], which the executor runs on one pooled connection.

use crate::error::{DbError, DbResult};
use crate::models::{DatabaseType, QueryParam, SqlFragment};
use std::fmt;

/// Kind of schema object created by `CREATE ... IF NOT EXISTS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    Database,
    Table,
}

impl SchemaKind {
    /// Title-case label used in log messages.
    pub fn label(&self) -> &'static str {
        match self {
            SchemaKind::Database => "Database",
            SchemaKind::Table => "Table",
        }
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaKind::Database => write!(f, "DATABASE"),
            SchemaKind::Table => write!(f, "TABLE"),
        }
    }
}

/// What a delete removes.
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteTarget {
    /// `DROP TABLE IF EXISTS {name}`
    Table(String),
    /// Drop one column of a table.
    Column { table: String, column: String },
    /// `DELETE FROM {from} {filter}`, bounded by the row limit.
    Rows { from: String, filter: SqlFragment },
}

/// One statement ready to run: text, bound values and connection setup.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementPlan {
    pub sql: String,
    pub params: Vec<QueryParam>,
    /// Database selected on the connection before the statement runs.
    pub database: Option<String>,
    /// Bracket the statement with the safe-update guard off/on.
    pub relax_safe_updates: bool,
    /// Fetch rows rather than counting affected rows.
    pub returns_rows: bool,
}

impl StatementPlan {
    /// A statement that yields rows.
    pub fn query(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
            database: None,
            relax_safe_updates: false,
            returns_rows: true,
        }
    }

    /// A statement run for its effect.
    pub fn statement(sql: impl Into<String>) -> Self {
        Self {
            returns_rows: false,
            ..Self::query(sql)
        }
    }

    /// Plan for caller-supplied SQL, guessing from the leading keyword whether
    /// it produces rows.
    pub fn raw(sql: impl Into<String>) -> Self {
        let sql = sql.into();
        if produces_rows(&sql) {
            Self::query(sql)
        } else {
            Self::statement(sql)
        }
    }

    pub fn with_params(mut self, params: Vec<QueryParam>) -> Self {
        self.params = params;
        self
    }

    pub fn with_database(mut self, database: Option<String>) -> Self {
        self.database = database;
        self
    }

    pub fn relaxing_safe_updates(mut self) -> Self {
        self.relax_safe_updates = true;
        self
    }
}

fn produces_rows(sql: &str) -> bool {
    let keyword = sql
        .trim_start()
        .split(|c: char| c.is_whitespace() || c == '(')
        .next()
        .unwrap_or_default()
        .to_uppercase();
    matches!(
        keyword.as_str(),
        "SELECT" | "SHOW" | "WITH" | "PRAGMA" | "EXPLAIN" | "DESCRIBE" | "DESC" | "VALUES"
    )
}

/// Join non-empty clauses with single spaces.
fn join_clauses(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn require_identifier(what: &str, value: &str) -> DbResult<()> {
    if value.trim().is_empty() {
        return Err(DbError::invalid_input(format!("{} must not be empty", what)));
    }
    Ok(())
}

fn require_limit(limit: u32) -> DbResult<()> {
    if limit == 0 {
        return Err(DbError::invalid_input("Row limit must be at least 1"));
    }
    Ok(())
}

/// Builds CRUD statements for one SQL dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqlBuilder {
    db_type: DatabaseType,
}

impl SqlBuilder {
    pub fn new(db_type: DatabaseType) -> Self {
        Self { db_type }
    }

    pub fn db_type(&self) -> DatabaseType {
        self.db_type
    }

    /// Database-selection statement, if the dialect has one.
    pub fn use_database(&self, name: &str) -> Option<String> {
        match self.db_type {
            DatabaseType::MySQL => Some(format!("USE {}", name)),
            DatabaseType::SQLite => None,
        }
    }

    /// Toggle for MySQL's `SQL_SAFE_UPDATES` session variable.
    pub fn safe_updates(&self, enabled: bool) -> Option<&'static str> {
        match (self.db_type, enabled) {
            (DatabaseType::MySQL, true) => Some("SET SQL_SAFE_UPDATES = 1"),
            (DatabaseType::MySQL, false) => Some("SET SQL_SAFE_UPDATES = 0"),
            (DatabaseType::SQLite, _) => None,
        }
    }

    /// `CREATE {kind} IF NOT EXISTS {name} {body}`
    pub fn create(&self, kind: SchemaKind, name: &str, body: &str) -> DbResult<StatementPlan> {
        require_identifier("Object name", name)?;
        if kind == SchemaKind::Database && !self.db_type.supports_database_selection() {
            return Err(DbError::invalid_input(format!(
                "{} does not support CREATE DATABASE",
                self.db_type
            )));
        }
        let head = format!("CREATE {} IF NOT EXISTS {}", kind, name);
        Ok(StatementPlan::statement(join_clauses(&[&head, body])))
    }

    /// `INSERT INTO {table} {values}`
    pub fn insert(&self, table: &str, values: &SqlFragment) -> DbResult<StatementPlan> {
        require_identifier("Table name", table)?;
        if values.is_empty() {
            return Err(DbError::invalid_input("INSERT requires a values clause"));
        }
        let head = format!("INSERT INTO {}", table);
        Ok(StatementPlan::statement(join_clauses(&[&head, &values.sql]))
            .with_params(values.params.clone()))
    }

    /// `SELECT {columns} FROM {table} {filter}`
    pub fn select(
        &self,
        columns: &str,
        table: &str,
        filter: &SqlFragment,
    ) -> DbResult<StatementPlan> {
        require_identifier("Column list", columns)?;
        require_identifier("Table name", table)?;
        let head = format!("SELECT {} FROM {}", columns, table);
        Ok(StatementPlan::query(join_clauses(&[&head, &filter.sql]))
            .with_params(filter.params.clone()))
    }

    /// `UPDATE {table} SET {assignments} {filter} LIMIT {limit}`
    ///
    /// SQLite has no `UPDATE ... LIMIT`, so the limit moves into a rowid
    /// sub-select over the same filter.
    pub fn update(
        &self,
        table: &str,
        assignments: &SqlFragment,
        filter: &SqlFragment,
        limit: u32,
    ) -> DbResult<StatementPlan> {
        require_identifier("Table name", table)?;
        require_limit(limit)?;
        if assignments.is_empty() {
            return Err(DbError::invalid_input("UPDATE requires at least one assignment"));
        }

        let head = format!("UPDATE {} SET {}", table, assignments.sql.trim());
        let sql = match self.db_type {
            DatabaseType::MySQL => {
                join_clauses(&[&head, &filter.sql, &format!("LIMIT {}", limit)])
            }
            DatabaseType::SQLite => {
                join_clauses(&[&head, &rowid_subselect(table, &filter.sql, limit)])
            }
        };

        let mut params = assignments.params.clone();
        params.extend(filter.params.iter().cloned());
        Ok(StatementPlan::statement(sql)
            .with_params(params)
            .relaxing_safe_updates())
    }

    /// Drop a table, drop a column, or delete up to `limit` rows.
    pub fn delete(&self, target: &DeleteTarget, limit: u32) -> DbResult<StatementPlan> {
        let plan = match target {
            DeleteTarget::Table(name) => {
                require_identifier("Table name", name)?;
                StatementPlan::statement(format!("DROP TABLE IF EXISTS {}", name))
            }
            DeleteTarget::Column { table, column } => {
                require_identifier("Table name", table)?;
                require_identifier("Column name", column)?;
                let sql = match self.db_type {
                    DatabaseType::MySQL => {
                        format!("ALTER TABLE {} DROP COLUMN IF EXISTS {}", table, column)
                    }
                    DatabaseType::SQLite => format!("ALTER TABLE {} DROP COLUMN {}", table, column),
                };
                StatementPlan::statement(sql)
            }
            DeleteTarget::Rows { from, filter } => {
                require_identifier("Table name", from)?;
                require_limit(limit)?;
                let head = format!("DELETE FROM {}", from);
                let sql = match self.db_type {
                    DatabaseType::MySQL => {
                        join_clauses(&[&head, &filter.sql, &format!("LIMIT {}", limit)])
                    }
                    DatabaseType::SQLite => {
                        join_clauses(&[&head, &rowid_subselect(from, &filter.sql, limit)])
                    }
                };
                StatementPlan::statement(sql).with_params(filter.params.clone())
            }
        };
        Ok(plan.relaxing_safe_updates())
    }
}

fn rowid_subselect(table: &str, filter: &str, limit: u32) -> String {
    let inner = join_clauses(&[
        &format!("SELECT rowid FROM {}", table),
        filter,
        &format!("LIMIT {}", limit),
    ]);
    format!("WHERE rowid IN ({})", inner)
}
