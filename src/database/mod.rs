//! Query execution.
//!
//! The slicer never talks to an engine directly. It renders SQL for the
//! [`Database`]'s dialect and asks it for a [`RowSet`]. Any engine can be
//! plugged in; [`SqliteDatabase`] is bundled.

mod sqlite;

pub use sqlite::SqliteDatabase;

use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use thiserror::Error;

use crate::sql::dialect::{Dialect, SqlDialect};
use crate::sql::expr::Expr;
use crate::sql::types::TimeUnit;

/// Errors raised by an execution backend.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Execution failed: {0}")]
    Execution(String),
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;

// =============================================================================
// Values
// =============================================================================

/// A single cell of a result set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Bool(b) => Some(*b as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Calendar date of a date or timestamp value.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            Value::Timestamp(ts) => Some(ts.date()),
            _ => None,
        }
    }

    /// Interpret engine text as a date or timestamp when it is ISO-8601
    /// formatted, otherwise keep it as text.
    pub fn from_text(text: String) -> Self {
        if text.len() == 10 {
            if let Ok(date) = NaiveDate::parse_from_str(&text, "%Y-%m-%d") {
                return Value::Date(date);
            }
        }
        if text.len() >= 19 {
            for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
                if let Ok(ts) = NaiveDateTime::parse_from_str(&text, format) {
                    return Value::Timestamp(ts);
                }
            }
        }
        Value::Text(text)
    }

    fn type_rank(&self) -> u8 {
        match self {
            Value::Bool(_) => 0,
            Value::Int(_) | Value::Float(_) => 1,
            Value::Text(_) => 2,
            Value::Date(_) | Value::Timestamp(_) => 3,
            Value::Null => 4,
        }
    }

    /// Total order used to sort result rows: `Null` after everything else,
    /// numbers compared numerically across `Int` and `Float`.
    pub fn total_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
            (Value::Date(a), Value::Timestamp(b)) => a.and_time(chrono::NaiveTime::MIN).cmp(b),
            (Value::Timestamp(a), Value::Date(b)) => a.cmp(&b.and_time(chrono::NaiveTime::MIN)),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                _ => a.type_rank().cmp(&b.type_rank()),
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str(""),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => f.write_str(s),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.into())
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(ts: NaiveDateTime) -> Self {
        Value::Timestamp(ts)
    }
}

// =============================================================================
// Row Sets
// =============================================================================

/// Raw rows returned by a backend, columns in engine order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl RowSet {
    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

// =============================================================================
// Database Trait
// =============================================================================

/// An execution backend.
pub trait Database {
    /// Dialect SQL must be rendered in for this backend.
    fn dialect(&self) -> Dialect;

    /// Truncate a date expression to `unit` in this backend's SQL.
    fn truncate_date(&self, expr: Expr, unit: TimeUnit) -> Expr {
        self.dialect().truncate_date(expr, unit)
    }

    /// Run `sql` and return every row.
    fn fetch(&self, sql: &str) -> DatabaseResult<RowSet>;
}
