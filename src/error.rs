//! Error types for the SQL access layer.
//!
//! Pool establishment failures surface as [`DbError::Connection`], an empty
//! pool as [`DbError::PoolExhausted`], and a statement the server refused as
//! [`DbError::Database`]. Requests rejected before any I/O are
//! [`DbError::InvalidInput`].

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    /// The server could not be reached or refused the session.
    #[error("Connection failed: {message}")]
    Connection { message: String, suggestion: String },

    #[error("Connection pool exhausted: no connection freed up after {waited_ms}ms")]
    PoolExhausted { waited_ms: u64 },

    /// The statement reached the server and failed there.
    #[error("Statement failed: {message}")]
    Database {
        message: String,
        /// SQLSTATE, e.g. "42S02" for an unknown table.
        sql_state: Option<String>,
        suggestion: String,
    },

    #[error("Unknown schema object `{object}`: {message}")]
    Schema { message: String, object: String },

    #[error("Invalid request: {message}")]
    InvalidInput { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DbError {
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    pub fn pool_exhausted(waited_ms: u64) -> Self {
        Self::PoolExhausted { waited_ms }
    }

    pub fn database(
        message: impl Into<String>,
        sql_state: Option<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::Database {
            message: message.into(),
            sql_state,
            suggestion: suggestion.into(),
        }
    }

    pub fn schema(message: impl Into<String>, object: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
            object: object.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// A hint for the operator, when one applies.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Connection { suggestion, .. } | Self::Database { suggestion, .. } => {
                Some(suggestion)
            }
            Self::PoolExhausted { .. } => {
                Some("Release held connections or increase the pool size")
            }
            Self::Schema { .. } => Some("Check that the table and column names exist"),
            Self::InvalidInput { .. } | Self::Internal { .. } => None,
        }
    }

    /// SQLSTATE reported by the server, if any.
    pub fn sql_state(&self) -> Option<&str> {
        match self {
            Self::Database { sql_state, .. } => sql_state.as_deref(),
            _ => None,
        }
    }

    /// Whether trying again later can succeed without changing the request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::PoolExhausted { .. })
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        use sqlx::Error as E;

        match err {
            E::Database(db_err) => DbError::database(
                db_err.message(),
                db_err.code().map(|c| c.into_owned()),
                "Check the SQL syntax and the objects it references",
            ),
            E::RowNotFound => DbError::database(
                "Query returned no rows",
                None,
                "Check that the filter matches existing rows",
            ),
            // The pool rewrites this with the configured wait.
            E::PoolTimedOut => DbError::pool_exhausted(0),
            E::PoolClosed => DbError::connection("Pool was closed", "Create a new pool"),
            E::Configuration(_) => DbError::connection(
                err.to_string(),
                "Check the connection URL and credentials",
            ),
            E::Io(_) | E::Tls(_) | E::Protocol(_) => DbError::connection(
                err.to_string(),
                "Check that the database server is running and reachable",
            ),
            E::TypeNotFound { ref type_name } => {
                let object = type_name.clone();
                DbError::schema(err.to_string(), object)
            }
            E::ColumnNotFound(ref column) => {
                let object = column.clone();
                DbError::schema(err.to_string(), object)
            }
            other => DbError::internal(other.to_string()),
        }
    }
}

pub type DbResult<T> = Result<T, DbError>;
