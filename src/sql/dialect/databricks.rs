//! Databricks SQL (Spark).

use super::{helpers, QuoteStyle, SqlDialect};
use crate::sql::token::TokenStream;
use crate::sql::types::TimeUnit;

#[derive(Debug, Clone, Copy)]
pub struct Databricks;

impl SqlDialect for Databricks {
    fn name(&self) -> &'static str {
        "databricks"
    }

    fn quote_style(&self) -> QuoteStyle {
        QuoteStyle::Backtick
    }

    fn emit_interval(&self, amount: i64, unit: TimeUnit) -> TokenStream {
        helpers::keyword_interval(amount, unit)
    }
}
