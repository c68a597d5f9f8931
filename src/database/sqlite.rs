//! SQLite execution backend.

use std::path::Path;

use rusqlite::types::ValueRef;
use rusqlite::Connection;
use tracing::debug;

use super::{Database, DatabaseResult, RowSet, Value};
use crate::sql::dialect::Dialect;

/// A SQLite database file (or in-memory database) opened through `rusqlite`.
///
/// ISO-8601 text is returned as [`Value::Date`] / [`Value::Timestamp`].
pub struct SqliteDatabase {
    conn: Connection,
}

impl SqliteDatabase {
    /// Open (or create) a database file.
    pub fn open(path: impl AsRef<Path>) -> DatabaseResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "opened sqlite database");
        Ok(Self { conn })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> DatabaseResult<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Run one or more statements that return no rows (schema setup, seeding).
    pub fn execute_batch(&self, sql: &str) -> DatabaseResult<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    /// The underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

fn convert(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(n) => Value::Int(n),
        ValueRef::Real(x) => Value::Float(x),
        ValueRef::Text(bytes) => Value::from_text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
    }
}

impl Database for SqliteDatabase {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn fetch(&self, sql: &str) -> DatabaseResult<RowSet> {
        let mut stmt = self.conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();

        let mut rows = Vec::new();
        let mut cursor = stmt.query([])?;
        while let Some(row) = cursor.next()? {
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                values.push(convert(row.get_ref(i)?));
            }
            rows.push(values);
        }

        debug!(rows = rows.len(), columns = width, "sqlite fetch complete");
        Ok(RowSet { columns, rows })
    }
}
