//! Compiled query shapes, cross-dialect validity and determinism.

mod common;

use common::assert_parses;
use slicer::slicer::{compile, Field, Pagination, Request, SlicerError};
use slicer::sql::dialect::{Dialect, SqlDialect};
use slicer::sql::expr::{lit_str, sum, table_col, ExprExt};
use slicer::sql::query::{JoinType, SortDir, TableRef};
use slicer::sql::types::TimeUnit;

fn date_field(dialect: Dialect) -> Vec<Field> {
    vec![Field::new(
        "date",
        dialect.truncate_date(table_col("traffic", "dt"), TimeUnit::Day),
    )]
}

fn clicks_by_date(dialect: Dialect) -> Request {
    Request::new(TableRef::new("traffic"))
        .metric("clicks", sum(table_col("traffic", "clicks")))
        .dimension("date", date_field(dialect))
}

/// Joins, filters, two references and an explicit page.
fn full_request(dialect: Dialect) -> Request {
    clicks_by_date(dialect)
        .join(
            JoinType::Left,
            TableRef::new("accounts"),
            table_col("traffic", "account_id").eq(table_col("accounts", "id")),
        )
        .metric("spend", sum(table_col("traffic", "spend")))
        .dimension(
            "account",
            vec![
                Field::new("account_id0", table_col("accounts", "id")),
                Field::new("account_label", table_col("accounts", "name")),
            ],
        )
        .filter(table_col("traffic", "dt").gte(lit_str("2024-01-01")))
        .having(sum(table_col("traffic", "clicks")).gt(0))
        .reference("wow", "date")
        .reference("mom_d", "date")
        .paginate(Pagination {
            limit: Some(50),
            offset: Some(10),
            order: vec![("clicks".into(), SortDir::Desc)],
        })
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_week_over_week_shape() {
    let compiled = compile(&clicks_by_date(Dialect::DuckDb).reference("wow", "date"), Dialect::DuckDb)
        .unwrap();
    assert_eq!(compiled.index, ["date"]);
    assert_eq!(compiled.columns, ["clicks", "clicks_wow"]);
    assert!(!compiled.explicit_order);
}

#[test]
fn test_week_over_week_delta_shape() {
    let compiled = compile(
        &clicks_by_date(Dialect::DuckDb).reference("wow_d", "date"),
        Dialect::DuckDb,
    )
    .unwrap();
    assert_eq!(compiled.columns, ["clicks", "clicks_wow_d"]);
    let sql = compiled.to_sql(Dialect::DuckDb);
    assert!(
        sql.contains("\"sq0\".\"clicks\" - \"sq1\".\"clicks\" AS \"clicks_wow_d\""),
        "{sql}"
    );
}

#[test]
fn test_full_request_layout() {
    let compiled = compile(&full_request(Dialect::Postgres), Dialect::Postgres).unwrap();
    assert_eq!(compiled.index, ["date", "account_id0", "account_label"]);
    assert_eq!(
        compiled.columns,
        ["clicks", "spend", "clicks_wow", "spend_wow", "clicks_mom_d", "spend_mom_d"]
    );
    assert!(compiled.explicit_order);

    let sql = compiled.to_sql(Dialect::Postgres);
    // Each copy keeps the join, the filter and the HAVING clause.
    assert_eq!(sql.matches("LEFT JOIN \"accounts\"").count(), 3, "{sql}");
    assert_eq!(
        sql.matches("HAVING SUM(\"traffic\".\"clicks\") > 0").count(),
        3,
        "{sql}"
    );
    assert!(
        sql.contains("WHERE \"traffic\".\"dt\" + INTERVAL '4 week' >= '2024-01-01'"),
        "{sql}"
    );
    assert!(
        sql.ends_with("ORDER BY \"clicks\" DESC\nLIMIT 50 OFFSET 10"),
        "{sql}"
    );
}

#[test]
fn test_metrics_only() {
    let request = Request::new(TableRef::new("traffic"))
        .metric("clicks", sum(table_col("traffic", "clicks")));
    let compiled = compile(&request, Dialect::Postgres).unwrap();
    assert!(compiled.index.is_empty());
    assert_eq!(
        compiled.to_sql(Dialect::Postgres),
        "SELECT\n  SUM(\"traffic\".\"clicks\") AS \"clicks\"\nFROM \"traffic\""
    );
}

#[test]
fn test_tsql_page_follows_order() {
    let request = clicks_by_date(Dialect::TSql).paginate(Pagination {
        limit: Some(20),
        offset: None,
        order: vec![],
    });
    let sql = compile(&request, Dialect::TSql).unwrap().to_sql(Dialect::TSql);
    assert!(
        sql.ends_with("ORDER BY [date]\nOFFSET 0 ROWS FETCH NEXT 20 ROWS ONLY"),
        "{sql}"
    );
}

// ============================================================================
// Validity and determinism
// ============================================================================

#[test]
fn test_full_request_parses_in_every_dialect() {
    for dialect in Dialect::ALL {
        let sql = compile(&full_request(dialect), dialect).unwrap().to_sql(dialect);
        assert_parses(&sql, dialect);
    }
}

#[test]
fn test_compile_twice_is_identical() {
    for dialect in Dialect::ALL {
        let request = full_request(dialect);
        let first = compile(&request, dialect).unwrap();
        let second = compile(&request, dialect).unwrap();
        assert_eq!(first.to_sql(dialect), second.to_sql(dialect), "{dialect}");
    }
}

#[test]
fn test_reference_copies_do_not_share_the_outer_filter() {
    let request = clicks_by_date(Dialect::DuckDb)
        .filter(table_col("traffic", "dt").lt(lit_str("2024-02-01")))
        .reference("wow", "date")
        .reference("yoy", "date");
    let sql = compile(&request, Dialect::DuckDb)
        .unwrap()
        .to_sql(Dialect::DuckDb);

    assert_eq!(
        sql.matches("WHERE \"traffic\".\"dt\" < '2024-02-01'").count(),
        1,
        "{sql}"
    );
    assert!(
        sql.contains("WHERE \"traffic\".\"dt\" + INTERVAL '1 week' < '2024-02-01'"),
        "{sql}"
    );
    assert!(
        sql.contains("WHERE \"traffic\".\"dt\" + INTERVAL '52 week' < '2024-02-01'"),
        "{sql}"
    );
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_errors_are_reported_before_rendering() {
    let request = Request::new(TableRef::new("traffic")).dimension("date", date_field(Dialect::DuckDb));
    assert_eq!(
        compile(&request, Dialect::DuckDb).unwrap_err().to_string(),
        "At least one metric is required"
    );

    let request = clicks_by_date(Dialect::DuckDb).rollup("account");
    assert_eq!(
        compile(&request, Dialect::DuckDb).unwrap_err().to_string(),
        "Rollup dimension 'account' is not in the request"
    );

    let request = clicks_by_date(Dialect::MySql).rollup("date");
    assert!(matches!(
        compile(&request, Dialect::MySql),
        Err(SlicerError::RollupNotSupported {
            dialect: Dialect::MySql
        })
    ));
}

#[test]
fn test_empty_metrics_checked_first() {
    let request = Request::new(TableRef::new("traffic"))
        .dimension("date", date_field(Dialect::MySql))
        .reference("dod", "date")
        .rollup("device");
    assert!(matches!(
        compile(&request, Dialect::MySql),
        Err(SlicerError::EmptyMetrics)
    ));
}

#[test]
fn test_reference_output_colliding_with_metric() {
    let request = clicks_by_date(Dialect::Sqlite)
        .metric("clicks_wow", sum(table_col("traffic", "spend")))
        .reference("wow", "date");
    assert!(matches!(
        compile(&request, Dialect::Sqlite),
        Err(SlicerError::DuplicateKey { key }) if key == "clicks_wow"
    ));
}

#[test]
fn test_metric_colliding_with_dimension() {
    let request = clicks_by_date(Dialect::DuckDb).metric("date", sum(table_col("traffic", "spend")));
    assert!(matches!(
        compile(&request, Dialect::DuckDb),
        Err(SlicerError::DuplicateKey { key }) if key == "date"
    ));
}
