//! Snowflake.
//!
//! Unquoted identifiers fold to upper case, which is why every identifier
//! the compiler writes is quoted. Date arithmetic goes through `DATEADD`.

use super::{helpers, SqlDialect};
use crate::sql::expr::Expr;
use crate::sql::types::TimeUnit;

#[derive(Debug, Clone, Copy)]
pub struct Snowflake;

impl SqlDialect for Snowflake {
    fn name(&self) -> &'static str {
        "snowflake"
    }

    fn shift_date(&self, expr: Expr, amount: i64, unit: TimeUnit) -> Expr {
        helpers::dateadd(expr, amount, unit)
    }
}
