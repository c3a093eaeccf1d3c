//! SQL CRUD Library
//!
//! This library provides a pooled connection layer for SQL databases (MySQL,
//! SQLite): the pool is established with bounded retry, statements run inside
//! per-call transactions, and writes are serialized through one shared lock.

pub mod config;
pub mod db;
pub mod demo;
pub mod error;
pub mod models;

pub use config::Config;
pub use db::{ConnectionPool, QueryExecutor, Session};
pub use error::{DbError, DbResult};
