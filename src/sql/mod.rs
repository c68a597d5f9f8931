//! Multi-dialect SQL rendering.
//!
//! [`query`] and [`expr`] build the statement, [`token`] flattens it, and a
//! [`dialect`] decides quoting, date arithmetic and pagination.

pub mod dialect;
pub mod expr;
pub mod query;
pub mod token;
pub mod types;

#[cfg(test)]
pub mod test_utils;

pub use dialect::{Dialect, SqlDialect};
pub use expr::{
    avg, col, count, count_distinct, func, interval, lit_bool, lit_float, lit_int, lit_str, max,
    min, nullif, raw_sql, sum, table_col, BinaryOperator, Expr, ExprExt, Literal,
};
pub use query::{
    Join, JoinType, LimitOffset, OrderItem, Query, SelectItem, SortDir, TableRef, TableSource,
};
pub use token::{Keyword, Symbol, ToTokens, Token, TokenStream};
pub use types::TimeUnit;
