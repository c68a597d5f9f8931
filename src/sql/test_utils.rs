//! Parse checks for rendered SQL.

use sqlparser::dialect::{dialect_from_str, GenericDialect};
use sqlparser::parser::Parser;

use super::dialect::Dialect;

/// sqlparser's name for the closest grammar. BigQuery and Databricks output
/// is checked against the generic grammar.
fn parser_name(dialect: Dialect) -> &'static str {
    match dialect {
        Dialect::Postgres | Dialect::Redshift => "postgres",
        Dialect::DuckDb => "duckdb",
        Dialect::MySql => "mysql",
        Dialect::TSql => "mssql",
        Dialect::Snowflake => "snowflake",
        Dialect::Sqlite => "sqlite",
        Dialect::BigQuery | Dialect::Databricks => "generic",
    }
}

/// Parse `sql` as exactly one statement in the grammar closest to `dialect`.
pub fn validate_sql(sql: &str, dialect: Dialect) -> Result<(), String> {
    let grammar = dialect_from_str(parser_name(dialect)).unwrap_or_else(|| Box::new(GenericDialect {}));
    let statements = Parser::parse_sql(grammar.as_ref(), sql)
        .map_err(|e| format!("{dialect} rejected the query: {e}\n{sql}"))?;
    match statements.len() {
        1 => Ok(()),
        n => Err(format!("expected one statement, parsed {n}\n{sql}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_quoting_of_each_dialect() {
        validate_sql("SELECT \"a\" FROM \"t\"", Dialect::Postgres).unwrap();
        validate_sql("SELECT `a` FROM `t`", Dialect::MySql).unwrap();
        validate_sql("SELECT [a] FROM [t]", Dialect::TSql).unwrap();
    }

    #[test]
    fn test_rejects_garbage_and_batches() {
        assert!(validate_sql("SELEC a FORM t", Dialect::Sqlite).is_err());
        assert!(validate_sql("SELECT 1; SELECT 2", Dialect::DuckDb).is_err());
    }
}
