//! SQLite.
//!
//! Dates are ISO-8601 text, so both truncation and shifting go through
//! `DATETIME(x, modifier...)`. No `GROUP BY ROLLUP`.

use super::{helpers, SqlDialect};
use crate::sql::expr::Expr;
use crate::sql::types::TimeUnit;

#[derive(Debug, Clone, Copy)]
pub struct Sqlite;

impl SqlDialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn numeric_booleans(&self) -> bool {
        true
    }

    fn supports_rollup(&self) -> bool {
        false
    }

    fn truncate_date(&self, expr: Expr, unit: TimeUnit) -> Expr {
        helpers::sqlite_trunc(expr, unit)
    }

    fn shift_date(&self, expr: Expr, amount: i64, unit: TimeUnit) -> Expr {
        helpers::sqlite_shift(expr, amount, unit)
    }
}
