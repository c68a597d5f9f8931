//! End-to-end compilation from a key-based request to SQL or a table.
//!
//! ```text
//! SlicerRequest → Slicer::to_request → compiler::compile → SQL
//!                                                        → Database → Table
//! ```
//!
//! # Example
//!
//! ```ignore
//! use slicer::compile::{compile_request, CompileOptions};
//! use slicer::slicer::{Slicer, SlicerRequest};
//! use slicer::sql::Dialect;
//!
//! let schema = Slicer::from_file("traffic.toml")?;
//! let request = SlicerRequest::new()
//!     .metric("clicks")
//!     .dimension("date")
//!     .reference("wow", "date");
//!
//! let options = CompileOptions::default().with_dialect(Dialect::Postgres);
//! let output = compile_request(&schema, &request, &options)?;
//! println!("{}", output.sql);
//! ```

use tracing::{debug, info};

use crate::config::{Settings, SettingsResult};
use crate::database::Database;
use crate::slicer::compiler::Pagination;
use crate::slicer::materialize::{self, MaterializeOptions, Table};
use crate::slicer::{compiler, Slicer, SlicerRequest, SlicerResult};
use crate::sql::Dialect;

// ============================================================================
// Options
// ============================================================================

/// Options for compilation.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// SQL dialect to generate.
    pub dialect: Dialect,

    /// Log compiled SQL at `info` level instead of `debug`.
    pub debug: bool,

    /// Limit applied when the request does not set one.
    pub default_limit: Option<u64>,
}

impl CompileOptions {
    /// Options taken from the `[slicer]` section of a settings file.
    pub fn from_settings(settings: &Settings) -> SettingsResult<Self> {
        Ok(Self {
            dialect: settings.slicer.dialect()?,
            debug: settings.slicer.debug,
            default_limit: settings.slicer.default_limit,
        })
    }

    /// Set the SQL dialect.
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Enable SQL logging at `info` level.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Set the fallback row limit.
    pub fn with_default_limit(mut self, limit: u64) -> Self {
        self.default_limit = Some(limit);
        self
    }

    fn apply_defaults(&self, request: &SlicerRequest) -> SlicerRequest {
        let mut request = request.clone();
        if let Some(limit) = self.default_limit {
            let pagination = request.pagination.get_or_insert_with(Pagination::default);
            pagination.limit.get_or_insert(limit);
        }
        request
    }
}

// ============================================================================
// Result Types
// ============================================================================

/// Result of compiling a request to SQL.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    /// The generated SQL string.
    pub sql: String,

    /// Output index keys.
    pub index: Vec<String>,

    /// Output column keys.
    pub columns: Vec<String>,

    /// The dialect used for generation.
    pub dialect: Dialect,
}

// ============================================================================
// Compilation Functions
// ============================================================================

/// Compile a request against a schema to SQL.
pub fn compile_request(
    slicer: &Slicer,
    request: &SlicerRequest,
    options: &CompileOptions,
) -> SlicerResult<CompileOutput> {
    let request = options.apply_defaults(request);
    let compiled = slicer.compile(&request, options.dialect)?;
    let sql = compiled.to_sql(options.dialect);

    if options.debug {
        info!(dialect = %options.dialect, "compiled request:\n{}", sql);
    } else {
        debug!(dialect = %options.dialect, "compiled request:\n{}", sql);
    }

    Ok(CompileOutput {
        sql,
        index: compiled.index,
        columns: compiled.columns,
        dialect: options.dialect,
    })
}

/// Compile a request and run it against `database`.
///
/// The database's dialect wins over `options.dialect`.
pub fn run_request(
    slicer: &Slicer,
    request: &SlicerRequest,
    database: &dyn Database,
    options: &CompileOptions,
) -> SlicerResult<Table> {
    let request = options.apply_defaults(request);
    let request = slicer.to_request(&request, |expr, unit| database.truncate_date(expr, unit))?;
    let compiled = compiler::compile(&request, database.dialect())?;
    materialize::execute(
        &compiled,
        database,
        &MaterializeOptions {
            debug: options.debug,
        },
    )
}

// ============================================================================
// Tests
// ============================================================================
