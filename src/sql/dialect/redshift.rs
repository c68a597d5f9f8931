//! Amazon Redshift.
//!
//! Postgres-derived; `GROUP BY ROLLUP` is available on current clusters.

use super::SqlDialect;

#[derive(Debug, Clone, Copy)]
pub struct Redshift;

impl SqlDialect for Redshift {
    fn name(&self) -> &'static str {
        "redshift"
    }
}
