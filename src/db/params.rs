//! Prepared-statement construction with bound values.
//!
//! Values are bound in placeholder order; `NULL` is bound as a typed-null
//! string, which both engines accept for any column.

use crate::models::QueryParam;
use sqlx::mysql::MySqlArguments;
use sqlx::query::Query;
use sqlx::sqlite::SqliteArguments;
use sqlx::{MySql, Sqlite};

/// Prepare `sql` for MySQL with `params` bound in order.
pub(crate) fn mysql_query<'q>(
    sql: &'q str,
    params: &'q [QueryParam],
) -> Query<'q, MySql, MySqlArguments> {
    params
        .iter()
        .fold(sqlx::query::<MySql>(sql), |query, param| match param {
            QueryParam::Null => query.bind(None::<&str>),
            QueryParam::Bool(b) => query.bind(*b),
            QueryParam::Int(n) => query.bind(*n),
            QueryParam::Float(x) => query.bind(*x),
            QueryParam::String(text) => query.bind(text.as_str()),
            QueryParam::Bytes(bytes) => query.bind(bytes.as_slice()),
        })
}

/// Prepare `sql` for SQLite with `params` bound in order.
pub(crate) fn sqlite_query<'q>(
    sql: &'q str,
    params: &'q [QueryParam],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    params
        .iter()
        .fold(sqlx::query::<Sqlite>(sql), |query, param| match param {
            QueryParam::Null => query.bind(None::<&str>),
            QueryParam::Bool(b) => query.bind(*b),
            QueryParam::Int(n) => query.bind(*n),
            QueryParam::Float(x) => query.bind(*x),
            QueryParam::String(text) => query.bind(text.as_str()),
            QueryParam::Bytes(bytes) => query.bind(bytes.as_slice()),
        })
}
