//! TOML schemas and key-based requests run against SQLite.

mod common;

use std::fs;

use common::{midnight, traffic_db};
use slicer::compile::{compile_request, run_request, CompileOptions};
use slicer::database::{Database, DatabaseError, DatabaseResult, RowSet, Value};
use slicer::slicer::{
    ComparisonOp, DimensionValue, Filter, MaterializeOptions, Slicer, SlicerError, SlicerRequest,
};
use slicer::sql::Dialect;

const TRAFFIC_SCHEMA: &str = r#"
[table]
name = "traffic"

[[joins]]
key = "accounts"
table = "accounts"
on = "traffic.account_id = accounts.id"
type = "left"

[metrics.clicks]

[metrics.spend]
label = "Spend ($)"

[metrics.visits]
column = "clicks"
aggregate = "count"

[dimensions.date]
type = "datetime"
column = "dt"

[dimensions.device]
type = "categorical"

[dimensions.platform]
type = "categorical"
column = "device"
options = [
    { key = "desktop", label = "Desktop" },
    { key = "mobile", label = "Mobile" },
]

[dimensions.account]
type = "unique"
id_fields = [{ column = "account_id" }]
label_field = { table = "accounts", column = "name" }
joins = ["accounts"]
"#;

fn schema() -> Slicer {
    Slicer::from_toml(TRAFFIC_SCHEMA).unwrap()
}

/// A backend that is never reachable.
struct Offline;

impl Database for Offline {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn fetch(&self, _sql: &str) -> DatabaseResult<RowSet> {
        Err(DatabaseError::Execution("offline".into()))
    }
}

fn option(key: &str, label: &str) -> DimensionValue {
    DimensionValue {
        key: key.into(),
        label: label.into(),
    }
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_schema_from_file_keeps_declared_order() {
    let path = std::env::temp_dir().join(format!("slicer-schema-{}.toml", std::process::id()));
    fs::write(&path, TRAFFIC_SCHEMA).unwrap();
    let slicer = Slicer::from_file(&path);
    fs::remove_file(&path).unwrap();

    let slicer = slicer.unwrap();
    assert_eq!(
        slicer.metrics.keys().collect::<Vec<_>>(),
        ["clicks", "spend", "visits"]
    );
    assert_eq!(
        slicer.dimensions.keys().collect::<Vec<_>>(),
        ["date", "device", "platform", "account"]
    );
    assert_eq!(slicer.metrics["spend"].label, "Spend ($)");
    assert_eq!(slicer.dimensions["platform"].label, "Platform");
}

#[test]
fn test_unique_without_ids_rejected_at_load() {
    let source = r#"
[table]
name = "traffic"

[dimensions.account]
type = "unique"
"#;
    assert!(matches!(
        Slicer::from_toml(source),
        Err(SlicerError::MissingIdFields { key }) if key == "account"
    ));
}

// ============================================================================
// Fetching
// ============================================================================

#[test]
fn test_fetch_week_over_week_delta() {
    let db = traffic_db();
    let request = SlicerRequest::new()
        .metric("clicks")
        .dimension("date")
        .reference("wow_d", "date");
    let table = schema()
        .fetch(&request, &db, &MaterializeOptions::default())
        .unwrap();

    assert_eq!(table.columns(), ["clicks", "clicks_wow_d"]);
    assert_eq!(table.get(1, "date"), Some(&midnight(2024, 1, 8)));
    assert_eq!(table.get(1, "clicks_wow_d"), Some(&Value::Int(20)));
}

#[test]
fn test_fetch_applies_dimension_and_metric_filters() {
    let db = traffic_db();
    let request = SlicerRequest::new()
        .metric("clicks")
        .metric("visits")
        .dimension("device")
        .filter(Filter::range("date", "2024-01-01", "2024-01-10"))
        .filter(Filter::contains("device", vec!["desktop".into()]))
        .filter(Filter::comparison("clicks", ComparisonOp::Gt, 0));
    let table = schema()
        .fetch(&request, &db, &MaterializeOptions::default())
        .unwrap();

    assert_eq!(
        table.rows(),
        [vec![Value::from("desktop"), Value::Int(130), Value::Int(2)]]
    );
}

#[test]
fn test_fetch_unique_dimension_through_join() {
    let db = traffic_db();
    let request = SlicerRequest::new()
        .metric("clicks")
        .dimension("account")
        .filter(Filter::comparison("account", ComparisonOp::Eq, 2));
    let table = schema()
        .fetch(&request, &db, &MaterializeOptions::default())
        .unwrap();

    assert_eq!(table.index(), ["account_id0", "account_label"]);
    assert_eq!(
        table.rows(),
        [vec![Value::Int(2), Value::from("Globex"), Value::Int(90)]]
    );
}

#[test]
fn test_records_serialize_as_json() {
    let db = traffic_db();
    let request = SlicerRequest::new().metric("clicks").dimension("device");
    let table = schema()
        .fetch(&request, &db, &MaterializeOptions::default())
        .unwrap();

    assert_eq!(
        serde_json::to_value(table.to_records()).unwrap(),
        serde_json::json!([
            {"device": "desktop", "clicks": 160},
            {"device": "mobile", "clicks": 90},
        ])
    );
}

// ============================================================================
// Dimension options
// ============================================================================

#[test]
fn test_declared_options_need_no_query() {
    let options = schema().fetch_options("platform", None, &Offline).unwrap();
    assert_eq!(
        options,
        [option("desktop", "Desktop"), option("mobile", "Mobile")]
    );

    assert!(matches!(
        schema().fetch_options("device", None, &Offline),
        Err(SlicerError::Database(DatabaseError::Execution(_)))
    ));
}

#[test]
fn test_options_from_database() {
    let db = traffic_db();
    let slicer = schema();

    assert_eq!(
        slicer.fetch_options("device", None, &db).unwrap(),
        [option("desktop", "desktop"), option("mobile", "mobile")]
    );
    assert_eq!(
        slicer.fetch_options("account", None, &db).unwrap(),
        [option("1", "Acme"), option("2", "Globex")]
    );
    assert_eq!(
        slicer.fetch_options("date", Some(2), &db).unwrap(),
        [
            option("2024-01-01 00:00:00", "2024-01-01 00:00:00"),
            option("2024-01-08 00:00:00", "2024-01-08 00:00:00"),
        ]
    );
    assert!(matches!(
        slicer.fetch_options("region", None, &db),
        Err(SlicerError::UnknownDimension { .. })
    ));
}

// ============================================================================
// Requests from JSON
// ============================================================================

#[test]
fn test_json_request_runs_with_default_limit() {
    let db = traffic_db();
    let request: SlicerRequest = serde_json::from_str(
        r#"{
            "metrics": ["clicks"],
            "dimensions": ["date"],
            "references": {"wow": "date"},
            "pagination": {"order": [["clicks", "desc"]]}
        }"#,
    )
    .unwrap();
    let options = CompileOptions::default().with_default_limit(2);
    let table = run_request(&schema(), &request, &db, &options).unwrap();

    assert_eq!(table.len(), 2);
    assert_eq!(table.get(0, "date"), Some(&midnight(2024, 1, 8)));
    assert_eq!(table.get(0, "clicks_wow"), Some(&Value::Int(100)));
    assert_eq!(table.get(1, "date"), Some(&midnight(2024, 1, 1)));
}

#[test]
fn test_json_request_with_bucket_compiles() {
    let request: SlicerRequest = serde_json::from_str(
        r#"{
            "metrics": ["clicks"],
            "dimensions": [{"key": "date", "bucket": "month"}, "platform"],
            "filters": [{"type": "wildcard", "key": "device", "pattern": "m%"}],
            "rollup": ["platform"]
        }"#,
    )
    .unwrap();
    let options = CompileOptions::default().with_dialect(Dialect::Postgres);
    let output = compile_request(&schema(), &request, &options).unwrap();

    assert_eq!(output.index, ["date", "platform"]);
    assert!(
        output
            .sql
            .contains("DATE_TRUNC('month', \"traffic\".\"dt\") AS \"date\""),
        "{}",
        output.sql
    );
    assert!(
        output.sql.contains("WHERE \"traffic\".\"device\" LIKE 'm%'"),
        "{}",
        output.sql
    );
    assert!(
        output.sql.contains("ROLLUP((\"traffic\".\"device\"))"),
        "{}",
        output.sql
    );
}
