//! Core Datastore Traits
//!
//! The ORM core needs exactly one capability from the outside world: run a
//! statement with positional parameters and hand back rows. Pooling, dialects
//! and transactions belong to the host's datastore implementation.

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::{ModelError, OrmResult};

/// Abstract datastore the ORM core executes statements against
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Execute a statement and return the affected row count
    async fn execute(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<u64>;

    /// Execute a query and return all result rows
    async fn query(
        &self,
        sql: &str,
        params: &[DatabaseValue],
    ) -> OrmResult<Vec<Box<dyn DatabaseRow>>>;

    /// Execute a query and return the first result row
    async fn query_one(
        &self,
        sql: &str,
        params: &[DatabaseValue],
    ) -> OrmResult<Option<Box<dyn DatabaseRow>>> {
        Ok(self.query(sql, params).await?.into_iter().next())
    }
}

/// Abstract database row
pub trait DatabaseRow: Send + Sync {
    /// Get a column value by index
    fn get_by_index(&self, index: usize) -> OrmResult<DatabaseValue>;

    /// Get a column value by name
    fn get_by_name(&self, name: &str) -> OrmResult<DatabaseValue>;

    /// Get column count
    fn column_count(&self) -> usize;

    /// Get column names in result order
    fn column_names(&self) -> Vec<String>;

    /// Ordered (column, value) pairs
    fn columns(&self) -> Vec<(String, DatabaseValue)> {
        self.column_names()
            .into_iter()
            .enumerate()
            .filter_map(|(index, name)| self.get_by_index(index).ok().map(|value| (name, value)))
            .collect()
    }

    /// Convert row to a JSON object keyed by column name
    fn to_json(&self) -> JsonValue {
        let map = self
            .columns()
            .into_iter()
            .map(|(name, value)| (name, value.to_json()))
            .collect();
        JsonValue::Object(map)
    }
}

/// In-memory row, used by datastore adapters and by [`MockStore`](super::mock::MockStore).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueRow {
    columns: Vec<(String, DatabaseValue)>,
}

impl ValueRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column, builder style
    pub fn with(mut self, column: &str, value: impl Into<DatabaseValue>) -> Self {
        self.columns.push((column.to_string(), value.into()));
        self
    }

    pub fn push(&mut self, column: impl Into<String>, value: impl Into<DatabaseValue>) {
        self.columns.push((column.into(), value.into()));
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<DatabaseValue>,
    {
        Self {
            columns: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl DatabaseRow for ValueRow {
    fn get_by_index(&self, index: usize) -> OrmResult<DatabaseValue> {
        self.columns
            .get(index)
            .map(|(_, value)| value.clone())
            .ok_or_else(|| ModelError::ColumnNotFound(format!("#{}", index)))
    }

    fn get_by_name(&self, name: &str) -> OrmResult<DatabaseValue> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .or_else(|| self.columns.iter().find(|(column, _)| column.eq_ignore_ascii_case(name)))
            .map(|(_, value)| value.clone())
            .ok_or_else(|| ModelError::ColumnNotFound(name.to_string()))
    }

    fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|(name, _)| name.clone()).collect()
    }

    fn columns(&self) -> Vec<(String, DatabaseValue)> {
        self.columns.clone()
    }
}

/// Database value enumeration for type-safe parameter binding
#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseValue {
    Null,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    String(String),
    Bytes(Vec<u8>),
    Uuid(uuid::Uuid),
    DateTime(chrono::DateTime<chrono::Utc>),
    Date(chrono::NaiveDate),
    Time(chrono::NaiveTime),
    Json(JsonValue),
    Array(Vec<DatabaseValue>),
}

impl DatabaseValue {
    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, DatabaseValue::Null)
    }

    /// Integer view of the value, widening 32-bit integers
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DatabaseValue::Int32(i) => Some(*i as i64),
            DatabaseValue::Int64(i) => Some(*i),
            DatabaseValue::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Textual view of scalar values; `None` for null, bytes, JSON and arrays
    pub fn as_text(&self) -> Option<String> {
        match self {
            DatabaseValue::String(s) => Some(s.clone()),
            DatabaseValue::Uuid(u) => Some(u.to_string()),
            DatabaseValue::Int32(i) => Some(i.to_string()),
            DatabaseValue::Int64(i) => Some(i.to_string()),
            DatabaseValue::Bool(b) => Some(b.to_string()),
            DatabaseValue::DateTime(dt) => Some(dt.to_rfc3339()),
            DatabaseValue::Date(d) => Some(d.to_string()),
            DatabaseValue::Time(t) => Some(t.to_string()),
            _ => None,
        }
    }

    /// Timestamp view, parsing RFC 3339 strings
    pub fn as_datetime(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        match self {
            DatabaseValue::DateTime(dt) => Some(*dt),
            DatabaseValue::String(s) => chrono::DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&chrono::Utc)),
            _ => None,
        }
    }

    /// Convert to JSON value
    pub fn to_json(&self) -> JsonValue {
        match self {
            DatabaseValue::Null => JsonValue::Null,
            DatabaseValue::Bool(b) => JsonValue::Bool(*b),
            DatabaseValue::Int32(i) => JsonValue::from(*i),
            DatabaseValue::Int64(i) => JsonValue::from(*i),
            DatabaseValue::Float32(f) => serde_json::Number::from_f64(*f as f64)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            DatabaseValue::Float64(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            DatabaseValue::String(s) => JsonValue::String(s.clone()),
            DatabaseValue::Bytes(b) => {
                JsonValue::Array(b.iter().map(|&x| JsonValue::from(x)).collect())
            }
            DatabaseValue::Uuid(u) => JsonValue::String(u.to_string()),
            DatabaseValue::DateTime(dt) => JsonValue::String(dt.to_rfc3339()),
            DatabaseValue::Date(d) => JsonValue::String(d.to_string()),
            DatabaseValue::Time(t) => JsonValue::String(t.to_string()),
            DatabaseValue::Json(j) => j.clone(),
            DatabaseValue::Array(arr) => {
                JsonValue::Array(arr.iter().map(|v| v.to_json()).collect())
            }
        }
    }

    /// Create DatabaseValue from JSON value
    pub fn from_json(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => DatabaseValue::Null,
            JsonValue::Bool(b) => DatabaseValue::Bool(b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    match i32::try_from(i) {
                        Ok(small) => DatabaseValue::Int32(small),
                        Err(_) => DatabaseValue::Int64(i),
                    }
                } else if let Some(f) = n.as_f64() {
                    DatabaseValue::Float64(f)
                } else {
                    DatabaseValue::Null
                }
            }
            JsonValue::String(s) => {
                if let Ok(uuid) = uuid::Uuid::parse_str(&s) {
                    DatabaseValue::Uuid(uuid)
                } else if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(&s) {
                    DatabaseValue::DateTime(dt.with_timezone(&chrono::Utc))
                } else {
                    DatabaseValue::String(s)
                }
            }
            JsonValue::Array(arr) => {
                DatabaseValue::Array(arr.into_iter().map(DatabaseValue::from_json).collect())
            }
            JsonValue::Object(_) => DatabaseValue::Json(json),
        }
    }
}

macro_rules! database_value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for DatabaseValue {
                fn from(value: $ty) -> Self {
                    DatabaseValue::$variant(value)
                }
            }
        )*
    };
}

database_value_from! {
    bool => Bool,
    i32 => Int32,
    i64 => Int64,
    f32 => Float32,
    f64 => Float64,
    String => String,
    Vec<u8> => Bytes,
    uuid::Uuid => Uuid,
    chrono::DateTime<chrono::Utc> => DateTime,
    chrono::NaiveDate => Date,
    chrono::NaiveTime => Time,
    JsonValue => Json,
}

impl From<&str> for DatabaseValue {
    fn from(value: &str) -> Self {
        DatabaseValue::String(value.to_string())
    }
}

impl<T> From<Option<T>> for DatabaseValue
where
    T: Into<DatabaseValue>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => DatabaseValue::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_row_lookup_falls_back_to_case_insensitive() {
        let row = ValueRow::new().with("id", 7).with("Title", "Hello");

        assert_eq!(row.get_by_name("id").unwrap(), DatabaseValue::Int32(7));
        assert_eq!(row.get_by_name("title").unwrap(), DatabaseValue::String("Hello".into()));
        assert!(matches!(row.get_by_name("missing"), Err(ModelError::ColumnNotFound(_))));
    }

    #[test]
    fn test_row_to_json_keeps_column_order() {
        let row = ValueRow::new().with("id", 1i64).with("deleted_at", DatabaseValue::Null);
        assert_eq!(row.to_json(), serde_json::json!({"id": 1, "deleted_at": null}));
        assert_eq!(row.column_names(), vec!["id", "deleted_at"]);
    }

    #[test]
    fn test_from_json_narrows_small_integers() {
        assert_eq!(DatabaseValue::from_json(serde_json::json!(5)), DatabaseValue::Int32(5));
        assert_eq!(
            DatabaseValue::from_json(serde_json::json!(5_000_000_000i64)),
            DatabaseValue::Int64(5_000_000_000)
        );
        assert_eq!(DatabaseValue::from(None::<i32>), DatabaseValue::Null);
    }

    #[test]
    fn test_as_datetime_parses_strings() {
        let value = DatabaseValue::String("2024-01-02T03:04:05Z".into());
        assert!(value.as_datetime().is_some());
        assert!(DatabaseValue::Int32(1).as_datetime().is_none());
    }
}
