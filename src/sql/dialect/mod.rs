//! Per-engine rendering rules.
//!
//! Each engine is a unit struct implementing [`SqlDialect`]; the trait's
//! defaults describe the Postgres family and every other engine overrides
//! only what differs. [`Dialect`] is the serializable handle the rest of the
//! crate passes around.
//!
//! | Engine | Quotes | Truncation | Shift | Rollup |
//! |--------|--------|------------|-------|--------|
//! | Postgres, DuckDB, Redshift | `"x"` | `DATE_TRUNC` | `x - INTERVAL '1 week'` | yes |
//! | Snowflake | `"x"` | `DATE_TRUNC` | `DATEADD(week, -1, x)` | yes |
//! | BigQuery | `` `x` `` | `TIMESTAMP_TRUNC` | `x - INTERVAL 1 WEEK` | yes |
//! | Databricks | `` `x` `` | `DATE_TRUNC` | `x - INTERVAL 1 WEEK` | yes |
//! | T-SQL | `[x]` | `DATETRUNC` | `DATEADD(week, -1, x)` | yes |
//! | MySQL | `` `x` `` | per unit | `x - INTERVAL 1 WEEK` | no |
//! | SQLite | `"x"` | `DATETIME` modifiers | `DATETIME(x, '-7 days')` | no |

mod bigquery;
mod databricks;
mod duckdb;
pub mod helpers;
mod mysql;
mod postgres;
mod redshift;
mod snowflake;
mod sqlite;
mod tsql;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use bigquery::BigQuery;
pub use databricks::Databricks;
pub use duckdb::DuckDb;
pub use mysql::MySql;
pub use postgres::Postgres;
pub use redshift::Redshift;
pub use snowflake::Snowflake;
pub use sqlite::Sqlite;
pub use tsql::TSql;

use super::expr::Expr;
use super::token::TokenStream;
use super::types::TimeUnit;

/// Opening and closing identifier quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteStyle {
    Double,
    Backtick,
    Bracket,
}

impl QuoteStyle {
    fn delimiters(self) -> (char, char) {
        match self {
            QuoteStyle::Double => ('"', '"'),
            QuoteStyle::Backtick => ('`', '`'),
            QuoteStyle::Bracket => ('[', ']'),
        }
    }
}

pub trait SqlDialect: fmt::Debug {
    fn name(&self) -> &'static str;

    fn quote_style(&self) -> QuoteStyle {
        QuoteStyle::Double
    }

    /// Engines without a boolean type compare against `1`/`0`.
    fn numeric_booleans(&self) -> bool {
        false
    }

    /// Wrap `ident` in the engine's quotes, doubling any closing quote inside.
    fn quote_identifier(&self, ident: &str) -> String {
        let (open, close) = self.quote_style().delimiters();
        let escaped = ident.replace(close, &format!("{close}{close}"));
        format!("{open}{escaped}{close}")
    }

    fn quote_string(&self, s: &str) -> String {
        helpers::single_quoted(s)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        match (self.numeric_booleans(), b) {
            (true, true) => "1",
            (true, false) => "0",
            (false, true) => "true",
            (false, false) => "false",
        }
    }

    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        helpers::limit_offset(limit, offset)
    }

    /// Pagination is only legal after an ORDER BY.
    fn requires_order_by_for_offset(&self) -> bool {
        false
    }

    /// `GROUP BY a, ROLLUP((b), (c, d))` is available.
    fn supports_rollup(&self) -> bool {
        true
    }

    /// Start of the `unit` containing `expr`.
    fn truncate_date(&self, expr: Expr, unit: TimeUnit) -> Expr {
        helpers::date_trunc(expr, unit)
    }

    /// `expr` moved by `amount` units; negative amounts move back in time.
    fn shift_date(&self, expr: Expr, amount: i64, unit: TimeUnit) -> Expr {
        helpers::interval_arithmetic(expr, amount, unit)
    }

    fn emit_interval(&self, amount: i64, unit: TimeUnit) -> TokenStream {
        helpers::quoted_interval(amount, unit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    DuckDb,
    TSql,
    MySql,
    Postgres,
    Snowflake,
    BigQuery,
    Redshift,
    Databricks,
    Sqlite,
}

impl Dialect {
    pub const ALL: [Dialect; 9] = [
        Dialect::DuckDb,
        Dialect::TSql,
        Dialect::MySql,
        Dialect::Postgres,
        Dialect::Snowflake,
        Dialect::BigQuery,
        Dialect::Redshift,
        Dialect::Databricks,
        Dialect::Sqlite,
    ];

    pub fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            Dialect::DuckDb => &DuckDb,
            Dialect::TSql => &TSql,
            Dialect::MySql => &MySql,
            Dialect::Postgres => &Postgres,
            Dialect::Snowflake => &Snowflake,
            Dialect::BigQuery => &BigQuery,
            Dialect::Redshift => &Redshift,
            Dialect::Databricks => &Databricks,
            Dialect::Sqlite => &Sqlite,
        }
    }

    /// Case-insensitive lookup by display name or a common alias.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_lowercase();
        let alias = match name.as_str() {
            "mssql" | "sqlserver" => "tsql",
            "postgresql" => "postgres",
            other => other,
        };
        Self::ALL.into_iter().find(|d| d.name() == alias)
    }
}

macro_rules! delegate {
    ($(fn $method:ident(&self $(, $arg:ident: $ty:ty)*) -> $ret:ty;)*) => {
        $(
            fn $method(&self $(, $arg: $ty)*) -> $ret {
                self.dialect().$method($($arg),*)
            }
        )*
    };
}

impl SqlDialect for Dialect {
    delegate! {
        fn name(&self) -> &'static str;
        fn quote_style(&self) -> QuoteStyle;
        fn numeric_booleans(&self) -> bool;
        fn quote_identifier(&self, ident: &str) -> String;
        fn quote_string(&self, s: &str) -> String;
        fn format_bool(&self, b: bool) -> &'static str;
        fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream;
        fn requires_order_by_for_offset(&self) -> bool;
        fn supports_rollup(&self) -> bool;
        fn truncate_date(&self, expr: Expr, unit: TimeUnit) -> Expr;
        fn shift_date(&self, expr: Expr, amount: i64, unit: TimeUnit) -> Expr;
        fn emit_interval(&self, amount: i64, unit: TimeUnit) -> TokenStream;
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
