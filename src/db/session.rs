//! Per-caller CRUD helpers.
//!
//! A [`Session`] carries its own active-database selection, so tasks sharing
//! one [`QueryExecutor`] never see each other's selection.

use crate::db::executor::QueryExecutor;
use crate::db::statement::{DeleteTarget, SchemaKind, SqlBuilder, StatementPlan};
use crate::error::DbResult;
use crate::models::{DEFAULT_MUTATION_LIMIT, Row, SqlFragment};
use std::sync::Arc;
use tracing::info;

/// CRUD context for one caller.
#[derive(Debug, Clone)]
pub struct Session {
    executor: Arc<QueryExecutor>,
    builder: SqlBuilder,
    active_database: Option<String>,
}

impl Session {
    pub fn new(executor: Arc<QueryExecutor>) -> Self {
        let builder = SqlBuilder::new(executor.db_type());
        Self {
            executor,
            builder,
            active_database: None,
        }
    }

    pub fn executor(&self) -> &Arc<QueryExecutor> {
        &self.executor
    }

    /// Set the database selected before each statement. No I/O.
    pub fn select_database(&mut self, name: impl Into<String>) {
        self.active_database = Some(name.into());
    }

    pub fn active_database(&self) -> Option<&str> {
        self.active_database.as_deref()
    }

    /// `CREATE {kind} IF NOT EXISTS {name} {body}`.
    ///
    /// Creating a database also makes it the active one; it runs before any
    /// database is selected.
    pub async fn create_schema_object(
        &mut self,
        kind: SchemaKind,
        name: &str,
        body: &str,
        database: Option<&str>,
    ) -> DbResult<()> {
        self.switch_database(database);
        let plan = self.builder.create(kind, name, body)?;

        let plan = match kind {
            SchemaKind::Database => {
                self.active_database = Some(name.to_string());
                plan
            }
            SchemaKind::Table => self.targeted(plan),
        };
        self.executor.execute_exclusive(&plan).await?;

        info!(name, "{} created", kind.label());
        Ok(())
    }

    /// `INSERT INTO {table} {values}`. Returns rows inserted.
    pub async fn insert_row(
        &mut self,
        table: &str,
        values: &SqlFragment,
        database: Option<&str>,
    ) -> DbResult<u64> {
        self.switch_database(database);
        let plan = self.targeted(self.builder.insert(table, values)?);
        let outcome = self.executor.execute_exclusive(&plan).await?;

        info!(table, rows_affected = outcome.rows_affected, "Data inserted");
        Ok(outcome.rows_affected)
    }

    /// `SELECT {columns} FROM {table} {filter}`. Not serialized against writes.
    pub async fn select_rows(
        &mut self,
        columns: &str,
        table: &str,
        filter: &SqlFragment,
        database: Option<&str>,
    ) -> DbResult<Vec<Row>> {
        self.switch_database(database);
        let plan = self.targeted(self.builder.select(columns, table, filter)?);
        let outcome = self.executor.execute(&plan).await?;

        info!(table, rows = outcome.rows.len(), "Data read");
        Ok(outcome.rows)
    }

    /// `UPDATE {table} SET {assignments} {filter} LIMIT {limit}`, limit
    /// defaulting to one row. Returns rows changed.
    pub async fn update_rows(
        &mut self,
        table: &str,
        assignments: &SqlFragment,
        filter: &SqlFragment,
        limit: Option<u32>,
        database: Option<&str>,
    ) -> DbResult<u64> {
        self.switch_database(database);
        let limit = limit.unwrap_or(DEFAULT_MUTATION_LIMIT);
        let plan = self.targeted(self.builder.update(table, assignments, filter, limit)?);
        let outcome = self.executor.execute_exclusive(&plan).await?;

        info!(table, rows_affected = outcome.rows_affected, "Data updated");
        Ok(outcome.rows_affected)
    }

    /// Drop a table or column, or delete up to `limit` rows (default one).
    /// Returns rows removed.
    pub async fn delete_rows(
        &mut self,
        target: &DeleteTarget,
        limit: Option<u32>,
        database: Option<&str>,
    ) -> DbResult<u64> {
        self.switch_database(database);
        let limit = limit.unwrap_or(DEFAULT_MUTATION_LIMIT);
        let plan = self.targeted(self.builder.delete(target, limit)?);
        let outcome = self.executor.execute_exclusive(&plan).await?;

        info!(rows_affected = outcome.rows_affected, "Data deleted");
        Ok(outcome.rows_affected)
    }

    fn switch_database(&mut self, database: Option<&str>) {
        if let Some(database) = database {
            if self.active_database.as_deref() != Some(database) {
                self.select_database(database);
            }
        }
    }

    fn targeted(&self, plan: StatementPlan) -> StatementPlan {
        plan.with_database(self.active_database.clone())
    }
}
