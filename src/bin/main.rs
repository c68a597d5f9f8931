//! Slicer CLI - compile and run analytical requests
//!
//! Usage:
//!   slicer compile --schema <schema.toml> --request <request.json> [--dialect <dialect>]
//!   slicer run --schema <schema.toml> --request <request.json> [--database <file.sqlite>]
//!   slicer options --schema <schema.toml> --dimension <key> [--limit <n>]
//!
//! Examples:
//!   slicer compile --schema traffic.toml --request wow.json --dialect postgres
//!   slicer run --schema traffic.toml --request wow.json --database traffic.sqlite --format table
//!   slicer options --schema traffic.toml --dimension device --database traffic.sqlite

use clap::{Parser, Subcommand, ValueEnum};
use slicer::compile::{compile_request, run_request, CompileOptions};
use slicer::config::{self, Settings};
use slicer::database::{Database, SqliteDatabase};
use slicer::slicer::{Slicer, SlicerRequest, Table};
use slicer::sql::Dialect;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "slicer")]
#[command(about = "Slicer - compile analytical requests to multi-dialect SQL")]
#[command(version)]
struct Cli {
    /// Settings file (defaults to SLICER_CONFIG, ./slicer.toml, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log compiled SQL at info level
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a request to SQL
    Compile {
        /// Path to the schema TOML file
        #[arg(short, long)]
        schema: PathBuf,

        /// Path to the request JSON file
        #[arg(short, long)]
        request: PathBuf,

        /// SQL dialect to generate (defaults to the configured one)
        #[arg(short, long, value_parser = parse_dialect)]
        dialect: Option<Dialect>,

        /// Output format
        #[arg(short, long, default_value = "sql")]
        output: OutputFormat,
    },

    /// Compile a request and run it
    Run {
        /// Path to the schema TOML file
        #[arg(short, long)]
        schema: PathBuf,

        /// Path to the request JSON file
        #[arg(short, long)]
        request: PathBuf,

        /// SQLite database file (defaults to the configured connection)
        #[arg(long)]
        database: Option<PathBuf>,

        /// Result format
        #[arg(short, long, default_value = "json")]
        format: ResultFormat,
    },

    /// List the distinct values of a dimension
    Options {
        /// Path to the schema TOML file
        #[arg(short, long)]
        schema: PathBuf,

        /// Dimension key
        #[arg(long)]
        dimension: String,

        /// Maximum number of values
        #[arg(short, long)]
        limit: Option<u64>,

        /// SQLite database file; prints the query when no database is available
        #[arg(long)]
        database: Option<PathBuf>,
    },
}

fn parse_dialect(name: &str) -> Result<Dialect, String> {
    Dialect::from_name(name).ok_or_else(|| {
        let known: Vec<String> = Dialect::ALL.iter().map(|d| d.to_string()).collect();
        format!("unknown dialect '{}' (expected one of: {})", name, known.join(", "))
    })
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Output SQL only
    Sql,
    /// Output SQL with the result shape as comments
    Verbose,
}

#[derive(Clone, ValueEnum)]
enum ResultFormat {
    /// Records as a JSON array
    Json,
    /// Tab-separated text
    Table,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let settings = match load_settings(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(message) => {
            eprintln!("{}", message);
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Compile {
            schema,
            request,
            dialect,
            output,
        } => cmd_compile(&settings, cli.debug, &schema, &request, dialect, output),
        Commands::Run {
            schema,
            request,
            database,
            format,
        } => cmd_run(&settings, cli.debug, &schema, &request, database.as_deref(), format),
        Commands::Options {
            schema,
            dimension,
            limit,
            database,
        } => cmd_options(&settings, cli.debug, &schema, &dimension, limit, database.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{}", message);
            ExitCode::FAILURE
        }
    }
}

fn load_settings(path: Option<&Path>) -> Result<Settings, String> {
    match path {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    }
    .map_err(|e| format!("Error loading settings: {}", e))
}

fn load_schema(path: &Path) -> Result<Slicer, String> {
    Slicer::from_file(path).map_err(|e| format!("Error in schema '{}': {}", path.display(), e))
}

fn load_request(path: &Path) -> Result<SlicerRequest, String> {
    let source = fs::read_to_string(path)
        .map_err(|e| format!("Error reading request '{}': {}", path.display(), e))?;
    serde_json::from_str(&source)
        .map_err(|e| format!("Error in request '{}': {}", path.display(), e))
}

/// Configured options; `--debug` can switch SQL logging on but not off.
fn compile_options(settings: &Settings, debug: bool) -> Result<CompileOptions, String> {
    let options = CompileOptions::from_settings(settings)
        .map_err(|e| format!("Error in settings: {}", e))?;
    let debug = options.debug || debug;
    Ok(options.with_debug(debug))
}

/// The database given on the command line, else the configured default connection.
fn open_database(
    settings: &Settings,
    path: Option<&Path>,
) -> Result<Option<Box<dyn Database>>, String> {
    if let Some(path) = path {
        let db = SqliteDatabase::open(path)
            .map_err(|e| format!("Error opening '{}': {}", path.display(), e))?;
        return Ok(Some(Box::new(db)));
    }
    match settings.default_connection() {
        Some((name, conn)) => config::open(conn)
            .map(Some)
            .map_err(|e| format!("Error opening connection '{}': {}", name, e)),
        None => Ok(None),
    }
}

fn cmd_compile(
    settings: &Settings,
    debug: bool,
    schema: &Path,
    request: &Path,
    dialect: Option<Dialect>,
    output: OutputFormat,
) -> Result<(), String> {
    let slicer = load_schema(schema)?;
    let request = load_request(request)?;

    let mut options = compile_options(settings, debug)?;
    if let Some(dialect) = dialect {
        options = options.with_dialect(dialect);
    }

    let compiled = compile_request(&slicer, &request, &options)
        .map_err(|e| format!("Compilation error: {}", e))?;

    match output {
        OutputFormat::Sql => println!("{}", compiled.sql),
        OutputFormat::Verbose => {
            println!("-- Dialect: {}", compiled.dialect);
            println!("-- Index: {}", compiled.index.join(", "));
            println!("-- Columns: {}", compiled.columns.join(", "));
            println!();
            println!("{}", compiled.sql);
        }
    }
    Ok(())
}

fn cmd_run(
    settings: &Settings,
    debug: bool,
    schema: &Path,
    request: &Path,
    database: Option<&Path>,
    format: ResultFormat,
) -> Result<(), String> {
    let slicer = load_schema(schema)?;
    let request = load_request(request)?;
    let options = compile_options(settings, debug)?;
    let db = open_database(settings, database)?
        .ok_or_else(|| "No database given and no connection configured".to_string())?;

    let table = run_request(&slicer, &request, db.as_ref(), &options)
        .map_err(|e| format!("Error: {}", e))?;

    match format {
        ResultFormat::Json => {
            let json = serde_json::to_string_pretty(&table.to_records())
                .map_err(|e| format!("Error serializing result: {}", e))?;
            println!("{}", json);
        }
        ResultFormat::Table => print_table(&table),
    }
    Ok(())
}

fn print_table(table: &Table) {
    let header: Vec<&str> = table
        .index()
        .iter()
        .chain(table.columns())
        .map(String::as_str)
        .collect();
    println!("{}", header.join("\t"));

    let index_len = table.index().len();
    for (i, row) in table.rows().iter().enumerate() {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(j, value)| {
                if j < index_len && value.is_null() && table.is_total(i) {
                    "Totals".to_string()
                } else {
                    value.to_string()
                }
            })
            .collect();
        println!("{}", cells.join("\t"));
    }
}

fn cmd_options(
    settings: &Settings,
    debug: bool,
    schema: &Path,
    dimension: &str,
    limit: Option<u64>,
    database: Option<&Path>,
) -> Result<(), String> {
    let slicer = load_schema(schema)?;

    match open_database(settings, database)? {
        Some(db) => {
            let values = slicer
                .fetch_options(dimension, limit, db.as_ref())
                .map_err(|e| format!("Error: {}", e))?;
            for value in values {
                println!("{}\t{}", value.key, value.label);
            }
        }
        None => {
            let dialect = compile_options(settings, debug)?.dialect;
            let compiled = slicer
                .dimension_options(dimension, limit, dialect)
                .map_err(|e| format!("Compilation error: {}", e))?;
            println!("{}", compiled.to_sql(dialect));
        }
    }
    Ok(())
}
