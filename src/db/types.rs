//! Row decoding into ordered lists of JSON values.
//!
//! Each column's declared type is first classified into a [`TypeCategory`];
//! the MySQL or SQLite decoder then extracts the value for that category and
//! falls back to text (MySQL) or the value's storage class (SQLite).

use crate::models::{DatabaseType, Row};
use serde_json::Value as JsonValue;
use sqlx::mysql::{MySqlRow, MySqlTypeInfo, MySqlValueRef};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Decode, Row as _, Type, TypeInfo};

/// What a column's values decode as, independent of the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Integer,
    Float,
    Decimal,
    Boolean,
    Text,
    Binary,
    Json,
    Date,
    Time,
    DateTime,
    Unknown,
}

/// Classify a column type name, as reported by the driver, into a category.
///
/// Length and sign suffixes are ignored: `VARCHAR(30)` and `BIGINT UNSIGNED`
/// classify like `VARCHAR` and `BIGINT`.
pub fn categorize_type(type_name: &str, db: DatabaseType) -> TypeCategory {
    let lower = type_name.to_lowercase();
    let base = lower
        .split(|c: char| c == '(' || c.is_whitespace())
        .next()
        .unwrap_or_default();

    match base {
        "bool" | "boolean" => TypeCategory::Boolean,
        // NUMERIC is a float affinity in SQLite, exact text in MySQL
        "decimal" | "numeric" if db == DatabaseType::SQLite => TypeCategory::Float,
        "decimal" | "numeric" => TypeCategory::Decimal,
        "float" | "double" | "real" => TypeCategory::Float,
        "json" => TypeCategory::Json,
        // SQLite keeps temporal values as text
        "date" if db == DatabaseType::MySQL => TypeCategory::Date,
        "time" if db == DatabaseType::MySQL => TypeCategory::Time,
        "datetime" | "timestamp" if db == DatabaseType::MySQL => TypeCategory::DateTime,
        "point" => TypeCategory::Unknown,
        b if b.ends_with("int") || b.ends_with("integer") || b.ends_with("serial") => {
            TypeCategory::Integer
        }
        b if b.ends_with("blob") || b.ends_with("binary") => TypeCategory::Binary,
        b if b.contains("char") || b.ends_with("text") || b == "enum" || b == "set" => {
            TypeCategory::Text
        }
        _ => TypeCategory::Unknown,
    }
}

/// Exact DECIMAL text as sent by MySQL; never goes through a float.
#[derive(Debug)]
pub struct DecimalText(pub String);

impl Type<sqlx::MySql> for DecimalText {
    fn type_info() -> MySqlTypeInfo {
        <String as Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &MySqlTypeInfo) -> bool {
        matches!(
            categorize_type(ty.name(), DatabaseType::MySQL),
            TypeCategory::Decimal
        )
    }
}

impl<'r> Decode<'r, sqlx::MySql> for DecimalText {
    fn decode(value: MySqlValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        <&str as Decode<sqlx::MySql>>::decode(value).map(|s| DecimalText(s.to_owned()))
    }
}

/// Encode binary column data as a base64 JSON string.
pub fn encode_binary_value(bytes: &[u8]) -> JsonValue {
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    JsonValue::String(STANDARD.encode(bytes))
}

/// Trait for converting database rows to ordered value lists.
pub trait RowToValues {
    /// Column values in declared order.
    fn to_values(&self) -> Row;
    fn column_names(&self) -> Vec<String>;
}

impl RowToValues for MySqlRow {
    fn to_values(&self) -> Row {
        self.columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let category = categorize_type(col.type_info().name(), DatabaseType::MySQL);
                mysql::decode_column(self, idx, category)
            })
            .collect()
    }

    fn column_names(&self) -> Vec<String> {
        self.columns().iter().map(|c| c.name().to_string()).collect()
    }
}

impl RowToValues for SqliteRow {
    fn to_values(&self) -> Row {
        self.columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let category = categorize_type(col.type_info().name(), DatabaseType::SQLite);
                sqlite::decode_column(self, idx, category)
            })
            .collect()
    }

    fn column_names(&self) -> Vec<String> {
        self.columns().iter().map(|c| c.name().to_string()).collect()
    }
}

fn float_value(v: f64) -> JsonValue {
    serde_json::Number::from_f64(v)
        .map(JsonValue::Number)
        .unwrap_or_else(|| JsonValue::String(v.to_string()))
}

mod mysql {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
    use sqlx::MySql;

    /// `None` when the column does not decode as `T`; NULL maps to `Some(Null)`.
    fn try_as<T>(row: &MySqlRow, idx: usize, f: impl FnOnce(T) -> JsonValue) -> Option<JsonValue>
    where
        T: for<'r> Decode<'r, MySql> + Type<MySql>,
    {
        row.try_get::<Option<T>, _>(idx)
            .ok()
            .map(|v| v.map_or(JsonValue::Null, f))
    }

    pub fn decode_column(row: &MySqlRow, idx: usize, category: TypeCategory) -> JsonValue {
        let decoded = match category {
            TypeCategory::Decimal => try_as(row, idx, |d: DecimalText| JsonValue::String(d.0)),
            // Signed first; BIGINT UNSIGNED can exceed i64
            TypeCategory::Integer => try_as::<i64>(row, idx, JsonValue::from)
                .or_else(|| try_as::<u64>(row, idx, JsonValue::from)),
            TypeCategory::Boolean => try_as(row, idx, JsonValue::Bool),
            TypeCategory::Float => try_as(row, idx, float_value)
                .or_else(|| try_as(row, idx, |v: f32| float_value(v.into()))),
            TypeCategory::Binary => try_as(row, idx, |b: Vec<u8>| encode_binary_value(&b)),
            TypeCategory::Json => try_as(row, idx, |v: JsonValue| v),
            TypeCategory::Date => try_as(row, idx, |d: NaiveDate| JsonValue::String(d.to_string())),
            TypeCategory::Time => try_as(row, idx, |t: NaiveTime| {
                JsonValue::String(t.format("%H:%M:%S").to_string())
            }),
            TypeCategory::DateTime => try_as(row, idx, |dt: NaiveDateTime| {
                JsonValue::String(dt.format("%Y-%m-%d %H:%M:%S").to_string())
            }),
            TypeCategory::Text | TypeCategory::Unknown => None,
        };
        decoded.unwrap_or_else(|| decode_text(row, idx))
    }

    /// Last resort: the value's text, or base64 when it is not UTF-8.
    /// TIME values outside a day (up to 838 hours) also end up here.
    fn decode_text(row: &MySqlRow, idx: usize) -> JsonValue {
        if let Some(text) = try_as(row, idx, JsonValue::String) {
            return text;
        }
        match row.try_get_unchecked::<Option<Vec<u8>>, _>(idx) {
            Ok(Some(bytes)) => match String::from_utf8(bytes) {
                Ok(s) => JsonValue::String(s),
                Err(e) => encode_binary_value(e.as_bytes()),
            },
            Ok(None) => JsonValue::Null,
            Err(e) => {
                tracing::warn!(column = idx, error = %e, "Undecodable MySQL column");
                JsonValue::Null
            }
        }
    }
}

mod sqlite {
    use super::*;
    use sqlx::{Sqlite, ValueRef};

    /// `None` when the value does not decode as `T`; NULL maps to `Some(Null)`.
    fn try_as<T>(row: &SqliteRow, idx: usize, f: impl FnOnce(T) -> JsonValue) -> Option<JsonValue>
    where
        T: for<'r> Decode<'r, Sqlite> + Type<Sqlite>,
    {
        row.try_get::<Option<T>, _>(idx)
            .ok()
            .map(|v| v.map_or(JsonValue::Null, f))
    }

    pub fn decode_column(row: &SqliteRow, idx: usize, category: TypeCategory) -> JsonValue {
        let decoded = match category {
            TypeCategory::Integer => try_as::<i64>(row, idx, JsonValue::from),
            TypeCategory::Boolean => try_as(row, idx, JsonValue::Bool),
            TypeCategory::Float | TypeCategory::Decimal => try_as(row, idx, float_value),
            TypeCategory::Binary => try_as(row, idx, |b: Vec<u8>| encode_binary_value(&b)),
            _ => None,
        };
        decoded.unwrap_or_else(|| decode_dynamic(row, idx))
    }

    /// SQLite is dynamically typed: expression columns (`COUNT(*)`, `1 + 1`)
    /// and loosely declared columns carry whatever storage class the value has.
    fn decode_dynamic(row: &SqliteRow, idx: usize) -> JsonValue {
        match row.try_get_raw(idx) {
            Ok(raw) if !raw.is_null() => {}
            _ => return JsonValue::Null,
        }
        try_as::<i64>(row, idx, JsonValue::from)
            .or_else(|| try_as(row, idx, float_value))
            .or_else(|| try_as(row, idx, JsonValue::String))
            .or_else(|| try_as(row, idx, |b: Vec<u8>| encode_binary_value(&b)))
            .unwrap_or(JsonValue::Null)
    }
}
