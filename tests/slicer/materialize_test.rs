//! End-to-end tests: compile, run against SQLite, and read the indexed table.

mod common;

use common::{midnight, traffic_db};
use slicer::database::{Database, SqliteDatabase, Value};
use slicer::slicer::{
    compile, execute, Dimension, MaterializeOptions, Pagination, Request, SlicerError, Table,
};
use slicer::sql::expr::{lit_str, sum, table_col, ExprExt};
use slicer::sql::query::{JoinType, SortDir, TableRef};
use slicer::sql::types::TimeUnit;

fn date_dimension() -> Dimension {
    Dimension::datetime("date", table_col("traffic", "dt"))
}

fn clicks_by_day(db: &SqliteDatabase) -> Request {
    let fields = date_dimension()
        .expand(None, |expr, unit| db.truncate_date(expr, unit))
        .unwrap();
    Request::new(TableRef::new("traffic"))
        .metric("clicks", sum(table_col("traffic", "clicks")))
        .dimension("date", fields)
}

fn run(db: &SqliteDatabase, request: &Request) -> Table {
    let compiled = compile(request, db.dialect()).unwrap();
    execute(&compiled, db, &MaterializeOptions::default()).unwrap()
}

// ============================================================================
// References
// ============================================================================

#[test]
fn test_week_over_week() {
    let db = traffic_db();
    let table = run(&db, &clicks_by_day(&db).reference("wow", "date"));

    assert_eq!(table.index(), ["date"]);
    assert_eq!(table.columns(), ["clicks", "clicks_wow"]);
    assert_eq!(table.len(), 4);

    assert_eq!(table.get(1, "date"), Some(&midnight(2024, 1, 8)));
    assert_eq!(table.get(1, "clicks"), Some(&Value::Int(120)));
    assert_eq!(table.get(1, "clicks_wow"), Some(&Value::Int(100)));

    // No prior week for the first day.
    assert_eq!(table.get(0, "clicks_wow"), Some(&Value::Null));
    assert_eq!(table.get(0, "date_wow"), None);
}

#[test]
fn test_delta_and_delta_percent() {
    let db = traffic_db();
    let request = clicks_by_day(&db)
        .reference("wow_d", "date")
        .reference("wow_p", "date");
    let table = run(&db, &request);

    assert_eq!(table.columns(), ["clicks", "clicks_wow_d", "clicks_wow_p"]);

    let deltas: Vec<&Value> = (0..table.len())
        .map(|i| table.get(i, "clicks_wow_d").unwrap())
        .collect();
    assert_eq!(
        deltas,
        [&Value::Null, &Value::Int(20), &Value::Int(-120), &Value::Int(30)]
    );

    assert_eq!(table.get(1, "clicks_wow_p"), Some(&Value::Float(0.2)));
    assert_eq!(table.get(2, "clicks_wow_p"), Some(&Value::Float(-1.0)));
    // Prior week summed to zero.
    assert_eq!(table.get(3, "clicks_wow_p"), Some(&Value::Null));
}

#[test]
fn test_reference_copy_reads_prior_period_rows() {
    let db = traffic_db();
    let request = clicks_by_day(&db)
        .filter(table_col("traffic", "dt").gte(lit_str("2024-01-08")))
        .reference("wow", "date");
    let table = run(&db, &request);

    assert_eq!(table.len(), 3);
    assert_eq!(table.get(0, "date"), Some(&midnight(2024, 1, 8)));
    // 2024-01-01 is outside the filter but inside the comparison period.
    assert_eq!(table.get(0, "clicks_wow"), Some(&Value::Int(100)));
    assert_eq!(table.get(2, "clicks_wow"), Some(&Value::Int(0)));
}

#[test]
fn test_reference_scoped_by_other_dimensions() {
    let db = traffic_db();
    let request = clicks_by_day(&db)
        .dimension(
            "device",
            Dimension::categorical("device", table_col("traffic", "device"))
                .expand(None, |expr, unit| db.truncate_date(expr, unit))
                .unwrap(),
        )
        .reference("wow", "date");
    let table = run(&db, &request);

    assert_eq!(table.index(), ["date", "device"]);
    // 2024-01-08 mobile compares against 2024-01-01 mobile only.
    assert_eq!(table.get(3, "device"), Some(&Value::from("mobile")));
    assert_eq!(table.get(3, "clicks"), Some(&Value::Int(50)));
    assert_eq!(table.get(3, "clicks_wow"), Some(&Value::Int(40)));
}

// ============================================================================
// Dimensions
// ============================================================================

#[test]
fn test_unique_dimension_labels_round_trip() {
    let db = traffic_db();
    let account = Dimension::unique(
        "account",
        vec![table_col("traffic", "account_id")],
        table_col("accounts", "name"),
    );
    let request = Request::new(TableRef::new("traffic"))
        .join(
            JoinType::Left,
            TableRef::new("accounts"),
            table_col("traffic", "account_id").eq(table_col("accounts", "id")),
        )
        .metric("clicks", sum(table_col("traffic", "clicks")))
        .dimension(
            "account",
            account
                .expand(None, |expr, unit| db.truncate_date(expr, unit))
                .unwrap(),
        );
    let table = run(&db, &request);

    assert_eq!(table.index(), ["account_id0", "account_label"]);
    assert_eq!(
        table.rows(),
        [
            vec![Value::Int(1), Value::from("Acme"), Value::Int(160)],
            vec![Value::Int(2), Value::from("Globex"), Value::Int(90)],
        ]
    );

    let row = &table.rows()[1];
    assert_eq!(account.display(&[&row[0], &row[1]]), Some("Globex".to_string()));
}

#[test]
fn test_monthly_buckets() {
    let db = traffic_db();
    let fields = date_dimension()
        .with_unit(TimeUnit::Month)
        .expand(None, |expr, unit| db.truncate_date(expr, unit))
        .unwrap();
    let request = Request::new(TableRef::new("traffic"))
        .metric("clicks", sum(table_col("traffic", "clicks")))
        .dimension("date", fields);
    let table = run(&db, &request);

    assert_eq!(table.len(), 1);
    assert_eq!(table.get(0, "date"), Some(&midnight(2024, 1, 1)));
    assert_eq!(table.get(0, "clicks"), Some(&Value::Int(250)));
}

// ============================================================================
// Ordering and errors
// ============================================================================

#[test]
fn test_explicit_order_is_kept() {
    let db = traffic_db();
    let request = clicks_by_day(&db).paginate(Pagination {
        limit: Some(2),
        offset: None,
        order: vec![("clicks".into(), SortDir::Desc)],
    });
    let table = run(&db, &request);

    assert_eq!(table.len(), 2);
    assert_eq!(table.get(0, "clicks"), Some(&Value::Int(120)));
    assert_eq!(table.get(1, "clicks"), Some(&Value::Int(100)));
}

#[test]
fn test_offset_pages_through_default_order() {
    let db = traffic_db();
    let request = clicks_by_day(&db).paginate(Pagination {
        limit: Some(2),
        offset: Some(2),
        order: vec![],
    });
    let table = run(&db, &request);

    assert_eq!(table.len(), 2);
    assert_eq!(table.get(0, "date"), Some(&midnight(2024, 1, 15)));
    assert_eq!(table.get(1, "date"), Some(&midnight(2024, 1, 22)));
}

#[test]
fn test_database_errors_propagate() {
    let db = traffic_db();
    let request = Request::new(TableRef::new("missing"))
        .metric("clicks", sum(table_col("missing", "clicks")));
    let compiled = compile(&request, db.dialect()).unwrap();
    assert!(matches!(
        execute(&compiled, &db, &MaterializeOptions::default()),
        Err(SlicerError::Database(_))
    ));
}

#[test]
fn test_rollup_rejected_before_execution() {
    let db = traffic_db();
    let request = clicks_by_day(&db).rollup("date");
    assert!(matches!(
        compile(&request, db.dialect()),
        Err(SlicerError::RollupNotSupported { .. })
    ));
}
