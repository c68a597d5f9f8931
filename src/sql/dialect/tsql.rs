//! SQL Server and Azure SQL.
//!
//! Differs from the defaults in nearly every hook:
//! - `[name]` quoting, `1`/`0` for booleans, `N'...'` for non-ASCII text
//! - `OFFSET m ROWS FETCH NEXT n ROWS ONLY`, legal only after `ORDER BY`
//! - `DATETRUNC` (SQL Server 2022) and `DATEADD`

use super::{helpers, QuoteStyle, SqlDialect};
use crate::sql::expr::Expr;
use crate::sql::token::TokenStream;
use crate::sql::types::TimeUnit;

#[derive(Debug, Clone, Copy)]
pub struct TSql;

impl SqlDialect for TSql {
    fn name(&self) -> &'static str {
        "tsql"
    }

    fn quote_style(&self) -> QuoteStyle {
        QuoteStyle::Bracket
    }

    fn numeric_booleans(&self) -> bool {
        true
    }

    fn quote_string(&self, s: &str) -> String {
        helpers::national_quoted(s)
    }

    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        helpers::offset_fetch(limit, offset)
    }

    fn requires_order_by_for_offset(&self) -> bool {
        true
    }

    fn truncate_date(&self, expr: Expr, unit: TimeUnit) -> Expr {
        helpers::datetrunc(expr, unit)
    }

    fn shift_date(&self, expr: Expr, amount: i64, unit: TimeUnit) -> Expr {
        helpers::dateadd(expr, amount, unit)
    }
}
