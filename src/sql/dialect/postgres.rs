//! PostgreSQL. The trait defaults are written for this engine.

use super::SqlDialect;

#[derive(Debug, Clone, Copy)]
pub struct Postgres;

impl SqlDialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }
}
