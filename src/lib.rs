//! # Slicer
//!
//! An analytical query compiler: metrics, dimensions, filters, prior-period
//! references and rollups in; one multi-dialect SQL query and an indexed
//! result table out.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │         Slicer schema (descriptors + declared joins)     │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [schema::to_request]
//! ┌─────────────────────────────────────────────────────────┐
//! │      Request (expanded fields, filters, references)      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [compiler]
//! ┌─────────────────────────────────────────────────────────┐
//! │        SQL Query (reference self-joins, ROLLUP)          │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [materialize + database]
//! ┌─────────────────────────────────────────────────────────┐
//! │                  Table (sorted, indexed)                 │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod compile;
pub mod config;
pub mod database;
pub mod slicer;
pub mod sql;

pub use sql::{dialect, expr, query, token};

/// Everything needed to declare a schema and run requests against it.
pub mod prelude {
    pub use crate::compile::{compile_request, run_request, CompileOptions, CompileOutput};
    pub use crate::database::{Database, RowSet, SqliteDatabase, Value};
    pub use crate::dialect::{Dialect, SqlDialect};
    pub use crate::expr::{
        avg, col, count, count_distinct, func, lit_bool, lit_float, lit_int, lit_str, max, min,
        nullif, raw_sql, sum, table_col, Expr, ExprExt,
    };
    pub use crate::query::{JoinType, Query, SortDir, TableRef};
    pub use crate::slicer::{
        Dimension, DimensionSelection, Filter, JoinDescriptor, Metric, Pagination, Slicer,
        SlicerError, SlicerRequest, SlicerResult, Table,
    };
    pub use crate::sql::types::TimeUnit;
}

pub use dialect::Dialect;
pub use slicer::{Slicer, SlicerError, SlicerRequest, Table};
