//! Database access layer.
//!
//! This module provides database access functionality:
//! - Connection pool management with retrying establishment
//! - Statement construction per SQL dialect
//! - Transactional statement execution with a shared write lock
//! - Per-caller sessions exposing the CRUD helpers
//! - Type mappings

pub mod executor;
pub mod params;
pub mod pool;
pub mod retry;
pub mod session;
pub mod statement;
pub mod types;

pub use executor::QueryExecutor;
pub use pool::{ConnectionPool, DbConnection, DbPool, PooledConnection};
pub use retry::{RetryExhausted, RetryPolicy, retry_fixed};
pub use session::Session;
pub use statement::{DeleteTarget, SchemaKind, SqlBuilder, StatementPlan};
