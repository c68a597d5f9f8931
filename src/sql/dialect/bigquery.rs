//! Google BigQuery: backtick names, `TIMESTAMP_TRUNC` with a bare date part,
//! and unquoted `INTERVAL 1 WEEK` literals.

use super::{helpers, QuoteStyle, SqlDialect};
use crate::sql::expr::Expr;
use crate::sql::token::TokenStream;
use crate::sql::types::TimeUnit;

#[derive(Debug, Clone, Copy)]
pub struct BigQuery;

impl SqlDialect for BigQuery {
    fn name(&self) -> &'static str {
        "bigquery"
    }

    fn quote_style(&self) -> QuoteStyle {
        QuoteStyle::Backtick
    }

    fn truncate_date(&self, expr: Expr, unit: TimeUnit) -> Expr {
        helpers::timestamp_trunc(expr, unit)
    }

    fn emit_interval(&self, amount: i64, unit: TimeUnit) -> TokenStream {
        helpers::keyword_interval(amount, unit)
    }
}
