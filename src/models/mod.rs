//! Data models for the SQL access layer.
//!
//! This module re-exports all model types used throughout the crate.

pub mod connection;
pub mod query;

// Re-export commonly used types
pub use connection::{ConnectionConfigError, DatabaseType, PoolConfig};
pub use query::{DEFAULT_MUTATION_LIMIT, QueryOutcome, QueryParam, Row, SqlFragment};
