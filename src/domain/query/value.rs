//! Tabular query results with typed cells

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use serde_json::Value;
use uuid::Uuid;

/// One nullable cell, keeping the database type
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Numeric(Decimal),
    Text(String),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Uuid(Uuid),
    Json(Value),
    Interval(Interval),
    /// Rendered in PostgreSQL hex form, e.g. `\x0a0b`
    Bytes(#[serde(serialize_with = "bytes_as_hex")] Vec<u8>),
    Array(Vec<SqlValue>),
}

/// PostgreSQL interval split the way the server stores it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Interval {
    pub months: i32,
    pub days: i32,
    pub microseconds: i64,
}

fn bytes_as_hex<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("\\x{}", hex::encode(bytes)))
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<Decimal> for SqlValue {
    fn from(value: Decimal) -> Self {
        Self::Numeric(value)
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Ordered column names and rows of an executed statement
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
}

impl QueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<SqlValue>>) -> Self {
        Self { columns, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Column names made unique for use as record keys: a repeated name gets
    /// `_2`, `_3`, ... appended, skipping names already present
    pub fn record_keys(&self) -> Vec<String> {
        let mut seen: HashSet<String> = HashSet::with_capacity(self.columns.len());
        let mut keys = Vec::with_capacity(self.columns.len());

        for column in &self.columns {
            let mut key = column.clone();
            let mut suffix = 2;
            while seen.contains(&key) || (key != *column && self.columns.contains(&key)) {
                key = format!("{}_{}", column, suffix);
                suffix += 1;
            }
            seen.insert(key.clone());
            keys.push(key);
        }

        keys
    }

    /// Rows as JSON objects keyed by column name, in column order
    pub fn to_records(&self) -> Vec<serde_json::Map<String, Value>> {
        let keys = self.record_keys();

        self.rows
            .iter()
            .map(|row| {
                keys
                    .iter()
                    .zip(row)
                    .map(|(column, cell)| {
                        (
                            column.clone(),
                            serde_json::to_value(cell).unwrap_or(Value::Null),
                        )
                    })
                    .collect()
            })
            .collect()
    }
}
