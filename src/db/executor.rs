//! Statement execution engine.
//!
//! Every statement runs on one pooled connection inside its own transaction:
//!
//! 1. acquire a connection from the [`ConnectionPool`]
//! 2. begin a transaction
//! 3. select the plan's database, if the dialect has database selection
//! 4. switch the safe-update guard off, if the plan asks for it
//! 5. run the statement with its bound parameters
//! 6. switch the guard back on, whether or not the statement succeeded
//! 7. commit, then return the connection to the pool
//!
//! # Architecture
//!
//! The executor uses database-specific implementations organized in submodules:
//! - `mysql`: MySQL statement execution
//! - `sqlite`: SQLite statement execution
//!
//! Each submodule provides identical functionality adapted to the database's type system.

use crate::db::params::{mysql_query, sqlite_query};
use crate::db::pool::{ConnectionPool, DbConnection};
use crate::db::statement::{SqlBuilder, StatementPlan};
use crate::db::types::RowToValues;
use crate::error::{DbError, DbResult};
use crate::models::{DatabaseType, QueryOutcome};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, error, warn};

/// Runs statement plans against a shared pool.
///
/// Shared across tasks behind an `Arc`. The write lock lives as long as the
/// executor, so every exclusive execution in the process contends on the
/// same mutex.
#[derive(Debug)]
pub struct QueryExecutor {
    pool: Arc<ConnectionPool>,
    write_lock: Mutex<()>,
}

impl QueryExecutor {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self {
            pool,
            write_lock: Mutex::new(()),
        }
    }

    pub fn pool(&self) -> &Arc<ConnectionPool> {
        &self.pool
    }

    pub fn db_type(&self) -> DatabaseType {
        self.pool.db_type()
    }

    /// Execute one plan and commit it.
    ///
    /// Fails with [`DbError::Database`] if any statement on the connection
    /// fails; nothing is committed in that case. The connection goes back to
    /// the pool on every path.
    pub async fn execute(&self, plan: &StatementPlan) -> DbResult<QueryOutcome> {
        let start = Instant::now();
        let builder = SqlBuilder::new(self.db_type());

        let mut setup: Vec<String> = Vec::new();
        if let Some(database) = plan.database.as_deref() {
            setup.extend(builder.use_database(database));
        }
        let mut restore = None;
        if plan.relax_safe_updates {
            setup.extend(builder.safe_updates(false).map(str::to_string));
            restore = builder.safe_updates(true);
        }

        debug!(
            sql = %plan.sql,
            params = plan.params.len(),
            database = ?plan.database,
            relax_safe_updates = plan.relax_safe_updates,
            "Executing statement"
        );

        let mut connection = self.pool.acquire().await?;
        let result = match connection.connection_mut()? {
            DbConnection::MySql(conn) => mysql::run(conn, plan, &setup, restore).await,
            DbConnection::SQLite(conn) => sqlite::run(conn, plan, &setup, restore).await,
        };
        self.pool.release(connection);

        match result {
            Ok(mut outcome) => {
                outcome.execution_time_ms = start.elapsed().as_millis() as u64;
                debug!(
                    rows = outcome.rows.len(),
                    rows_affected = outcome.rows_affected,
                    execution_time_ms = outcome.execution_time_ms,
                    "Statement executed"
                );
                Ok(outcome)
            }
            Err(e) => {
                error!(sql = %plan.sql, error = %e, "Statement failed");
                Err(e)
            }
        }
    }

    /// Execute one plan while holding the write lock.
    pub async fn execute_exclusive(&self, plan: &StatementPlan) -> DbResult<QueryOutcome> {
        let _guard = self.acquire_write_lock().await;
        self.execute(plan).await
    }

    /// Hold the write lock across several statements.
    ///
    /// Do not call [`execute_exclusive`](Self::execute_exclusive) while
    /// holding the guard; use [`execute`](Self::execute) instead.
    pub async fn acquire_write_lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().await
    }

    /// Run caller-supplied SQL with no parameters.
    pub async fn execute_sql(&self, sql: &str, database: Option<&str>) -> DbResult<QueryOutcome> {
        let plan = StatementPlan::raw(sql).with_database(database.map(str::to_string));
        self.execute(&plan).await
    }

    /// Run caller-supplied SQL with no parameters under the write lock.
    pub async fn execute_sql_exclusive(
        &self,
        sql: &str,
        database: Option<&str>,
    ) -> DbResult<QueryOutcome> {
        let plan = StatementPlan::raw(sql).with_database(database.map(str::to_string));
        self.execute_exclusive(&plan).await
    }
}

/// Keep the statement's error when restoring the guard also fails.
fn finish_restore<T>(
    result: DbResult<T>,
    restored: Result<(), sqlx::Error>,
    statement: &str,
) -> DbResult<T> {
    match (result, restored) {
        (result, Ok(())) => result,
        (Ok(_), Err(e)) => Err(DbError::from(e)),
        (Err(e), Err(restore_err)) => {
            warn!(statement, error = %restore_err, "Failed to restore safe-update guard");
            Err(e)
        }
    }
}

fn outcome_from_rows<R: RowToValues>(rows: Vec<R>) -> QueryOutcome {
    let columns = rows
        .first()
        .map(|r| r.column_names())
        .unwrap_or_default();
    QueryOutcome {
        columns,
        rows: rows.iter().map(|r| r.to_values()).collect(),
        ..QueryOutcome::default()
    }
}

fn outcome_from_count(rows_affected: u64) -> QueryOutcome {
    QueryOutcome {
        rows_affected,
        ..QueryOutcome::default()
    }
}

// =============================================================================
// Database-Specific Implementations
// =============================================================================
//
// Each module below provides the same interface adapted to its database type.
// The code structure is intentionally parallel to make differences obvious.

mod mysql {
    use super::*;
    use sqlx::pool::PoolConnection;
    use sqlx::{Executor, MySql, Transaction};

    pub async fn run(
        conn: &mut PoolConnection<MySql>,
        plan: &StatementPlan,
        setup: &[String],
        restore: Option<&str>,
    ) -> DbResult<QueryOutcome> {
        let mut tx = sqlx::Connection::begin(&mut **conn).await?;
        for statement in setup {
            (&mut *tx).execute(statement.as_str()).await?;
        }

        let mut result = run_statement(&mut tx, plan).await;
        if let Some(statement) = restore {
            let restored = (&mut *tx).execute(statement).await.map(|_| ());
            result = finish_restore(result, restored, statement);
        }

        let outcome = result?;
        tx.commit().await?;
        Ok(outcome)
    }

    async fn run_statement(
        tx: &mut Transaction<'_, MySql>,
        plan: &StatementPlan,
    ) -> DbResult<QueryOutcome> {
        // When params is empty, use raw SQL to avoid prepared statement issues
        // (USE, CREATE DATABASE and friends aren't preparable on every server)
        if plan.params.is_empty() {
            if plan.returns_rows {
                let rows = (&mut **tx).fetch_all(plan.sql.as_str()).await?;
                Ok(outcome_from_rows(rows))
            } else {
                let result = (&mut **tx).execute(plan.sql.as_str()).await?;
                Ok(outcome_from_count(result.rows_affected()))
            }
        } else {
            let query = mysql_query(&plan.sql, &plan.params);
            if plan.returns_rows {
                let rows = query.fetch_all(&mut **tx).await?;
                Ok(outcome_from_rows(rows))
            } else {
                let result = query.execute(&mut **tx).await?;
                Ok(outcome_from_count(result.rows_affected()))
            }
        }
    }
}

mod sqlite {
    use super::*;
    use sqlx::pool::PoolConnection;
    use sqlx::{Executor, Sqlite, Transaction};

    pub async fn run(
        conn: &mut PoolConnection<Sqlite>,
        plan: &StatementPlan,
        setup: &[String],
        restore: Option<&str>,
    ) -> DbResult<QueryOutcome> {
        let mut tx = sqlx::Connection::begin(&mut **conn).await?;
        for statement in setup {
            (&mut *tx).execute(statement.as_str()).await?;
        }

        let mut result = run_statement(&mut tx, plan).await;
        if let Some(statement) = restore {
            let restored = (&mut *tx).execute(statement).await.map(|_| ());
            result = finish_restore(result, restored, statement);
        }

        let outcome = result?;
        tx.commit().await?;
        Ok(outcome)
    }

    async fn run_statement(
        tx: &mut Transaction<'_, Sqlite>,
        plan: &StatementPlan,
    ) -> DbResult<QueryOutcome> {
        if plan.params.is_empty() {
            if plan.returns_rows {
                let rows = (&mut **tx).fetch_all(plan.sql.as_str()).await?;
                Ok(outcome_from_rows(rows))
            } else {
                let result = (&mut **tx).execute(plan.sql.as_str()).await?;
                Ok(outcome_from_count(result.rows_affected()))
            }
        } else {
            let query = sqlite_query(&plan.sql, &plan.params);
            if plan.returns_rows {
                let rows = query.fetch_all(&mut **tx).await?;
                Ok(outcome_from_rows(rows))
            } else {
                let result = query.execute(&mut **tx).await?;
                Ok(outcome_from_count(result.rows_affected()))
            }
        }
    }
}
