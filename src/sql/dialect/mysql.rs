//! MySQL.
//!
//! There is no `DATE_TRUNC`, so truncation is spelled out per unit. The only
//! rollup form is `WITH ROLLUP`, which cannot group a label with its id, so
//! rollups are refused.

use super::{helpers, QuoteStyle, SqlDialect};
use crate::sql::expr::Expr;
use crate::sql::token::TokenStream;
use crate::sql::types::TimeUnit;

#[derive(Debug, Clone, Copy)]
pub struct MySql;

impl SqlDialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_style(&self) -> QuoteStyle {
        QuoteStyle::Backtick
    }

    fn numeric_booleans(&self) -> bool {
        true
    }

    fn supports_rollup(&self) -> bool {
        false
    }

    fn truncate_date(&self, expr: Expr, unit: TimeUnit) -> Expr {
        helpers::mysql_trunc(expr, unit)
    }

    fn emit_interval(&self, amount: i64, unit: TimeUnit) -> TokenStream {
        helpers::keyword_interval(amount, unit)
    }
}
