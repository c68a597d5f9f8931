//! Dialect rendering of the date functions and pagination the slicer relies on.

use insta::assert_snapshot;
use slicer::sql::dialect::{Dialect, SqlDialect};
use slicer::sql::expr::col;
use slicer::sql::types::TimeUnit;

fn week(dialect: Dialect) -> String {
    dialect.truncate_date(col("dt"), TimeUnit::Week).to_sql(dialect)
}

fn week_ago(dialect: Dialect) -> String {
    dialect.shift_date(col("dt"), -1, TimeUnit::Week).to_sql(dialect)
}

fn quarter_ahead(dialect: Dialect) -> String {
    dialect.shift_date(col("dt"), 1, TimeUnit::Quarter).to_sql(dialect)
}

fn page(dialect: Dialect) -> String {
    dialect.emit_limit_offset(Some(10), Some(20)).serialize(dialect)
}

mod postgres {
    use super::*;

    #[test]
    fn test_dates() {
        assert_snapshot!(week(Dialect::Postgres), @r#"DATE_TRUNC('week', "dt")"#);
        assert_snapshot!(week_ago(Dialect::Postgres), @r#""dt" - INTERVAL '1 week'"#);
        assert_snapshot!(quarter_ahead(Dialect::Postgres), @r#""dt" + INTERVAL '3 month'"#);
    }

    #[test]
    fn test_page() {
        assert_snapshot!(page(Dialect::Postgres), @"LIMIT 10 OFFSET 20");
    }
}

mod duckdb {
    use super::*;

    #[test]
    fn test_dates() {
        assert_snapshot!(week(Dialect::DuckDb), @r#"DATE_TRUNC('week', "dt")"#);
        assert_snapshot!(week_ago(Dialect::DuckDb), @r#""dt" - INTERVAL '1 week'"#);
    }
}

mod redshift {
    use super::*;

    #[test]
    fn test_dates() {
        assert_snapshot!(quarter_ahead(Dialect::Redshift), @r#""dt" + INTERVAL '3 month'"#);
    }
}

mod snowflake {
    use super::*;

    #[test]
    fn test_dates() {
        assert_snapshot!(week(Dialect::Snowflake), @r#"DATE_TRUNC('week', "dt")"#);
        assert_snapshot!(week_ago(Dialect::Snowflake), @r#"DATEADD(week, -1, "dt")"#);
        assert_snapshot!(quarter_ahead(Dialect::Snowflake), @r#"DATEADD(month, 3, "dt")"#);
    }
}

mod bigquery {
    use super::*;

    #[test]
    fn test_dates() {
        assert_snapshot!(week(Dialect::BigQuery), @"TIMESTAMP_TRUNC(`dt`, ISOWEEK)");
        assert_snapshot!(week_ago(Dialect::BigQuery), @"`dt` - INTERVAL 1 WEEK");
        assert_snapshot!(quarter_ahead(Dialect::BigQuery), @"`dt` + INTERVAL 3 MONTH");
    }
}

mod databricks {
    use super::*;

    #[test]
    fn test_dates() {
        assert_snapshot!(week(Dialect::Databricks), @"DATE_TRUNC('week', `dt`)");
        assert_snapshot!(week_ago(Dialect::Databricks), @"`dt` - INTERVAL 1 WEEK");
    }
}

mod tsql {
    use super::*;

    #[test]
    fn test_dates() {
        assert_snapshot!(week(Dialect::TSql), @"DATETRUNC(week, [dt])");
        assert_snapshot!(week_ago(Dialect::TSql), @"DATEADD(week, -1, [dt])");
        assert_snapshot!(quarter_ahead(Dialect::TSql), @"DATEADD(month, 3, [dt])");
    }

    #[test]
    fn test_page() {
        assert_snapshot!(page(Dialect::TSql), @"OFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY");
    }
}

mod mysql {
    use super::*;

    #[test]
    fn test_dates() {
        assert_snapshot!(week(Dialect::MySql), @"SUBDATE(DATE(`dt`), WEEKDAY(`dt`))");
        assert_snapshot!(week_ago(Dialect::MySql), @"`dt` - INTERVAL 1 WEEK");
        assert_snapshot!(quarter_ahead(Dialect::MySql), @"`dt` + INTERVAL 3 MONTH");
    }

    #[test]
    fn test_page() {
        assert_snapshot!(page(Dialect::MySql), @"LIMIT 10 OFFSET 20");
    }
}

mod sqlite {
    use super::*;

    #[test]
    fn test_dates() {
        assert_snapshot!(
            week(Dialect::Sqlite),
            @r#"DATETIME("dt", 'start of day', '-6 days', 'weekday 1')"#
        );
        assert_snapshot!(week_ago(Dialect::Sqlite), @r#"DATETIME("dt", '-7 days')"#);
        assert_snapshot!(quarter_ahead(Dialect::Sqlite), @r#"DATETIME("dt", '+3 months')"#);
    }
}
