//! DuckDB accepts the Postgres forms for everything the compiler emits.

use super::SqlDialect;

#[derive(Debug, Clone, Copy)]
pub struct DuckDb;

impl SqlDialect for DuckDb {
    fn name(&self) -> &'static str {
        "duckdb"
    }
}
