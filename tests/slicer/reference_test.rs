//! Reference keys, their join criteria per dialect, and derived columns.

mod common;

use common::assert_parses;
use slicer::slicer::reference::resolve;
use slicer::slicer::{compile, Field, Modifier, ReferenceBase, Request, SlicerError};
use slicer::sql::dialect::{Dialect, SqlDialect};
use slicer::sql::expr::{sum, table_col};
use slicer::sql::query::TableRef;
use slicer::sql::types::TimeUnit;

fn clicks_by_date(dialect: Dialect) -> Request {
    Request::new(TableRef::new("traffic"))
        .metric("clicks", sum(table_col("traffic", "clicks")))
        .dimension(
            "date",
            vec![Field::new(
                "date",
                dialect.truncate_date(table_col("traffic", "dt"), TimeUnit::Day),
            )],
        )
}

#[test]
fn test_every_key_resolves() {
    let bases = ["wow", "mom", "qoq", "yoy"];
    let suffixes = [("", Modifier::Value), ("_d", Modifier::Delta), ("_p", Modifier::DeltaPercent)];

    for base in bases {
        for (suffix, modifier) in suffixes {
            let key = format!("{base}{suffix}");
            let reference = resolve(&key).unwrap();
            assert_eq!(reference.base, ReferenceBase::from_key(base).unwrap());
            assert_eq!(reference.modifier, modifier, "{key}");
        }
    }
}

#[test]
fn test_criteria_per_dialect() {
    let cases = [
        (Dialect::Postgres, "wow", "ON \"sq1\".\"date\" = \"sq0\".\"date\" - INTERVAL '1 week'"),
        (Dialect::DuckDb, "mom", "ON \"sq1\".\"date\" = \"sq0\".\"date\" - INTERVAL '4 week'"),
        (Dialect::Redshift, "qoq", "ON \"sq1\".\"date\" = \"sq0\".\"date\" - INTERVAL '3 month'"),
        (Dialect::MySql, "yoy", "ON `sq1`.`date` = `sq0`.`date` - INTERVAL 52 WEEK"),
        (Dialect::BigQuery, "wow", "ON `sq1`.`date` = `sq0`.`date` - INTERVAL 1 WEEK"),
        (Dialect::Databricks, "qoq", "ON `sq1`.`date` = `sq0`.`date` - INTERVAL 3 MONTH"),
        (Dialect::TSql, "yoy", "ON [sq1].[date] = DATEADD(week, -52, [sq0].[date])"),
        (Dialect::Snowflake, "mom", "ON \"sq1\".\"date\" = DATEADD(week, -4, \"sq0\".\"date\")"),
        (Dialect::Sqlite, "qoq", "ON \"sq1\".\"date\" = DATETIME(\"sq0\".\"date\", '-3 months')"),
    ];
    for (dialect, key, expected) in cases {
        let request = clicks_by_date(dialect).reference(key, "date");
        let sql = compile(&request, dialect).unwrap().to_sql(dialect);
        assert!(sql.contains(expected), "{dialect} {key}:\n{sql}");
    }
}

#[test]
fn test_reference_queries_parse_in_every_dialect() {
    for dialect in Dialect::ALL {
        let request = clicks_by_date(dialect)
            .reference("wow", "date")
            .reference("yoy_p", "date");
        let sql = compile(&request, dialect).unwrap().to_sql(dialect);
        assert_parses(&sql, dialect);
    }
}

#[test]
fn test_derived_columns_per_modifier() {
    let request = clicks_by_date(Dialect::DuckDb)
        .metric("spend", sum(table_col("traffic", "spend")))
        .reference("wow", "date")
        .reference("wow_d", "date")
        .reference("wow_p", "date");
    let compiled = compile(&request, Dialect::DuckDb).unwrap();

    assert_eq!(
        compiled.columns,
        [
            "clicks",
            "spend",
            "clicks_wow",
            "spend_wow",
            "clicks_wow_d",
            "spend_wow_d",
            "clicks_wow_p",
            "spend_wow_p",
        ]
    );
    assert_eq!(
        compiled.reference_dimensions,
        ["date_wow", "date_wow_d", "date_wow_p"]
    );

    let sql = compiled.to_sql(Dialect::DuckDb);
    assert!(sql.contains("\"sq1\".\"spend\" AS \"spend_wow\""), "{sql}");
    assert!(
        sql.contains("\"sq0\".\"spend\" - \"sq2\".\"spend\" AS \"spend_wow_d\""),
        "{sql}"
    );
    assert!(
        sql.contains(
            "(\"sq0\".\"spend\" - \"sq3\".\"spend\") * 1.0 / NULLIF(\"sq3\".\"spend\", 0) AS \"spend_wow_p\""
        ),
        "{sql}"
    );
}

#[test]
fn test_reference_on_non_date_dimension_still_joins() {
    let request = clicks_by_date(Dialect::Postgres)
        .dimension(
            "week",
            vec![Field::new(
                "week",
                Dialect::Postgres.truncate_date(table_col("traffic", "dt"), TimeUnit::Week),
            )],
        )
        .reference("yoy", "week");
    let sql = compile(&request, Dialect::Postgres)
        .unwrap()
        .to_sql(Dialect::Postgres);
    assert!(
        sql.contains(
            "ON \"sq0\".\"date\" = \"sq1\".\"date\" AND \"sq1\".\"week\" = \"sq0\".\"week\" - INTERVAL '52 week'"
        ),
        "{sql}"
    );
}

#[test]
fn test_reference_errors() {
    let request = clicks_by_date(Dialect::DuckDb).reference("wow_x", "date");
    assert!(matches!(
        compile(&request, Dialect::DuckDb),
        Err(SlicerError::UnknownReference { key }) if key == "wow_x"
    ));

    let request = clicks_by_date(Dialect::DuckDb).reference("qoq", "device");
    let err = compile(&request, Dialect::DuckDb).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Reference 'qoq' targets dimension 'device', which is not in the request"
    );
}
