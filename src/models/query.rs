//! Bound values, SQL fragments carrying them, and statement outcomes.

use serde::Serialize;
use serde_json::Value as JsonValue;

/// Default number of rows an UPDATE or DELETE helper may touch.
pub const DEFAULT_MUTATION_LIMIT: u32 = 1;

/// One result row: column values in declared order.
pub type Row = Vec<JsonValue>;

/// A value bound to one `?` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryParam {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
}

impl From<bool> for QueryParam {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for QueryParam {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<i64> for QueryParam {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for QueryParam {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for QueryParam {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for QueryParam {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Vec<u8>> for QueryParam {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl<T: Into<QueryParam>> From<Option<T>> for QueryParam {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Self::Null)
    }
}

/// A piece of SQL text with `?` placeholders and the values bound to them.
///
/// Clause text and identifiers are sent verbatim; only values travel as
/// parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlFragment {
    pub sql: String,
    pub params: Vec<QueryParam>,
}

impl SqlFragment {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// An empty fragment (no clause).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Bind the next placeholder.
    pub fn bind(mut self, value: impl Into<QueryParam>) -> Self {
        self.params.push(value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sql.trim().is_empty()
    }

    /// Number of `?` placeholders in the text.
    pub fn placeholder_count(&self) -> usize {
        self.sql.matches('?').count()
    }
}

impl From<&str> for SqlFragment {
    fn from(sql: &str) -> Self {
        Self::new(sql)
    }
}

impl From<String> for SqlFragment {
    fn from(sql: String) -> Self {
        Self::new(sql)
    }
}

/// Result of executing one statement.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryOutcome {
    /// Column names of the returned rows (empty when no rows came back)
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    /// Rows changed by a write statement; zero for reads
    pub rows_affected: u64,
    pub execution_time_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_conversions() {
        assert_eq!(QueryParam::from(16), QueryParam::Int(16));
        assert_eq!(QueryParam::from("P2"), QueryParam::String("P2".into()));
        assert_eq!(QueryParam::from(None::<i64>), QueryParam::Null);
        assert_eq!(QueryParam::from(Some(2.5)), QueryParam::Float(2.5));
        assert_eq!(QueryParam::from(b"ab".to_vec()), QueryParam::Bytes(vec![b'a', b'b']));
    }

    #[test]
    fn test_fragment_bind_order() {
        let fragment = SqlFragment::new("WHERE number = ? AND client = ?")
            .bind(16)
            .bind("Client AA");
        assert_eq!(fragment.placeholder_count(), 2);
        assert_eq!(
            fragment.params,
            vec![QueryParam::Int(16), QueryParam::String("Client AA".into())]
        );
    }

    #[test]
    fn test_empty_fragment() {
        assert!(SqlFragment::empty().is_empty());
        assert!(SqlFragment::from("   ").is_empty());
        assert!(!SqlFragment::from("WHERE 1 = 1").is_empty());
    }
}
