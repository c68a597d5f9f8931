//! Compiled query → indexed [`Table`].

use std::cmp::Ordering;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info};

use super::compiler::CompiledQuery;
use super::error::{SlicerError, SlicerResult};
use crate::database::{Database, RowSet, Value};

/// Execution options.
#[derive(Debug, Clone, Default)]
pub struct MaterializeOptions {
    /// Log the rendered SQL at `info` instead of `debug`.
    pub debug: bool,
}

/// A result indexed by dimension output keys.
///
/// Each row holds the index values followed by the column values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    index: Vec<String>,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    #[serde(skip)]
    plain_index_len: usize,
}

impl Table {
    pub fn index(&self) -> &[String] {
        &self.index
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.index
            .iter()
            .chain(&self.columns)
            .position(|k| k == key)
    }

    /// Value of `key` (index or column) in row `row`.
    pub fn get(&self, row: usize, key: &str) -> Option<&Value> {
        let i = self.position(key)?;
        self.rows.get(row)?.get(i)
    }

    /// Whether row `row` is a rollup subtotal: `Null` in a rolled-up index position.
    pub fn is_total(&self, row: usize) -> bool {
        self.rows.get(row).is_some_and(|values| {
            values[self.plain_index_len..self.index.len()]
                .iter()
                .any(Value::is_null)
        })
    }

    /// Rows as ordered key → value maps.
    pub fn to_records(&self) -> Vec<IndexMap<&str, &Value>> {
        let keys: Vec<&str> = self
            .index
            .iter()
            .chain(&self.columns)
            .map(String::as_str)
            .collect();
        self.rows
            .iter()
            .map(|row| keys.iter().copied().zip(row).collect())
            .collect()
    }

    fn from_row_set(compiled: &CompiledQuery, rows: RowSet) -> SlicerResult<Self> {
        let positions = compiled
            .index
            .iter()
            .chain(&compiled.columns)
            .map(|key| {
                rows.column_index(key)
                    .ok_or_else(|| SlicerError::MissingColumn { key: key.clone() })
            })
            .collect::<SlicerResult<Vec<_>>>()?;

        let index_len = compiled.index.len();
        let mut data: Vec<Vec<Value>> = rows
            .rows
            .into_iter()
            .map(|mut row| {
                positions
                    .iter()
                    .map(|&i| std::mem::replace(&mut row[i], Value::Null))
                    .collect()
            })
            .collect();
        if !compiled.explicit_order {
            data.sort_by(|a, b| compare_index(&a[..index_len], &b[..index_len]));
        }

        Ok(Self {
            index: compiled.index.clone(),
            columns: compiled.columns.clone(),
            rows: data,
            plain_index_len: compiled.plain_index_len,
        })
    }
}

fn compare_index(a: &[Value], b: &[Value]) -> Ordering {
    a.iter()
        .zip(b)
        .map(|(x, y)| x.total_cmp(y))
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Render `compiled` for the database's dialect, run it, and index the result.
///
/// Rows are sorted by the index, `Null` last, unless the query carries an
/// explicit order.
pub fn execute(
    compiled: &CompiledQuery,
    database: &dyn Database,
    options: &MaterializeOptions,
) -> SlicerResult<Table> {
    let dialect = database.dialect();
    let sql = compiled.to_sql(dialect);
    if options.debug {
        info!(%dialect, "executing slicer query:\n{}", sql);
    } else {
        debug!(%dialect, "executing slicer query:\n{}", sql);
    }

    let rows = database.fetch(&sql)?;
    let table = Table::from_row_set(compiled, rows)?;
    debug!(rows = table.len(), "materialized slicer result");
    Ok(table)
}
