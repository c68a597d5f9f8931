//! Rendering pieces shared by more than one engine.
//!
//! The trait defaults in the parent module call the ANSI forms here; engines
//! that differ pick one of the alternatives.

use super::super::expr::{func, interval, lit_int, lit_str, raw_sql, Expr, ExprExt};
use super::super::token::{Keyword, Token, TokenStream};
use super::super::types::TimeUnit;

/// `'it''s'`
pub fn single_quoted(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// `N'café'` for strings outside ASCII, plain single quotes otherwise.
pub fn national_quoted(s: &str) -> String {
    if s.is_ascii() {
        single_quoted(s)
    } else {
        format!("N{}", single_quoted(s))
    }
}

/// `LIMIT n OFFSET m`, either half optional.
pub fn limit_offset(limit: Option<u64>, offset: Option<u64>) -> TokenStream {
    let mut ts = TokenStream::new();
    let clauses = [(Keyword::Limit, limit), (Keyword::Offset, offset)];
    let mut first = true;
    for (keyword, value) in clauses {
        let Some(value) = value else { continue };
        if !first {
            ts.space();
        }
        first = false;
        ts.push(keyword).space().push(Token::LitInt(value as i64));
    }
    ts
}

/// `OFFSET m ROWS FETCH NEXT n ROWS ONLY`. The offset is always written
/// because FETCH cannot stand alone.
pub fn offset_fetch(limit: Option<u64>, offset: Option<u64>) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.push(Keyword::Offset)
        .space()
        .push(Token::LitInt(offset.unwrap_or(0) as i64))
        .space()
        .push(Keyword::Rows);

    if let Some(limit) = limit {
        for keyword in [Keyword::Fetch, Keyword::Next] {
            ts.space().push(keyword);
        }
        ts.space()
            .push(Token::LitInt(limit as i64))
            .space()
            .push(Keyword::Rows)
            .space()
            .push(Keyword::Only);
    }
    ts
}

/// `INTERVAL '3 month'`
pub fn quoted_interval(amount: i64, unit: TimeUnit) -> TokenStream {
    let (amount, unit) = unit.normalize(amount);
    let mut ts = TokenStream::new();
    ts.push(Keyword::Interval)
        .space()
        .push(Token::LitString(format!("{amount} {unit}")));
    ts
}

/// `INTERVAL 3 MONTH`
pub fn keyword_interval(amount: i64, unit: TimeUnit) -> TokenStream {
    let (amount, unit) = unit.normalize(amount);
    let mut ts = TokenStream::new();
    ts.push(Keyword::Interval)
        .space()
        .push(Token::LitInt(amount))
        .space()
        .push(Token::Raw(unit.as_str().to_uppercase()));
    ts
}

/// `DATE_TRUNC('week', x)`
pub fn date_trunc(expr: Expr, unit: TimeUnit) -> Expr {
    func("DATE_TRUNC", vec![lit_str(unit.as_str()), expr])
}

/// `TIMESTAMP_TRUNC(x, ISOWEEK)`. Plain `WEEK` would start on Sunday.
pub fn timestamp_trunc(expr: Expr, unit: TimeUnit) -> Expr {
    let part = match unit {
        TimeUnit::Week => "ISOWEEK".to_string(),
        other => other.as_str().to_uppercase(),
    };
    func("TIMESTAMP_TRUNC", vec![expr, raw_sql(&part)])
}

/// `DATETRUNC(week, x)`
pub fn datetrunc(expr: Expr, unit: TimeUnit) -> Expr {
    func("DATETRUNC", vec![raw_sql(unit.as_str()), expr])
}

/// Truncation built from MySQL's date functions, one recipe per unit.
pub fn mysql_trunc(expr: Expr, unit: TimeUnit) -> Expr {
    let formatted = |expr: Expr, pattern: &str| func("DATE_FORMAT", vec![expr, lit_str(pattern)]);
    match unit {
        TimeUnit::Hour => formatted(expr, "%Y-%m-%d %H:00:00"),
        TimeUnit::Day => func("DATE", vec![expr]),
        TimeUnit::Week => {
            let days_since_monday = func("WEEKDAY", vec![expr.clone()]);
            func("SUBDATE", vec![func("DATE", vec![expr]), days_since_monday])
        }
        TimeUnit::Month => formatted(expr, "%Y-%m-01"),
        TimeUnit::Quarter => {
            let first_month = func("QUARTER", vec![expr.clone()])
                .sub(1)
                .mul(3)
                .add(1);
            let text = func(
                "CONCAT",
                vec![func("YEAR", vec![expr]), lit_str("-"), first_month, lit_str("-01")],
            );
            func("STR_TO_DATE", vec![text, lit_str("%Y-%c-%d")])
        }
        TimeUnit::Year => func("MAKEDATE", vec![func("YEAR", vec![expr]), lit_int(1)]),
    }
}

/// `DATETIME(x, modifier...)`. Every unit renders `YYYY-MM-DD HH:MM:SS` text
/// so truncated and shifted values compare equal.
pub fn sqlite_trunc(expr: Expr, unit: TimeUnit) -> Expr {
    let datetime = |expr: Expr, modifiers: &[&str]| {
        let mut args = vec![expr];
        args.extend(modifiers.iter().map(|m| lit_str(m)));
        args
    };
    match unit {
        TimeUnit::Hour => func("STRFTIME", vec![lit_str("%Y-%m-%d %H:00:00"), expr]),
        TimeUnit::Day => func("DATETIME", datetime(expr, &["start of day"])),
        TimeUnit::Week => func(
            "DATETIME",
            datetime(expr, &["start of day", "-6 days", "weekday 1"]),
        ),
        TimeUnit::Month => func("DATETIME", datetime(expr, &["start of month"])),
        TimeUnit::Quarter => {
            let into_quarter = func("STRFTIME", vec![lit_str("%m"), expr.clone()])
                .sub(1)
                .modulo(3);
            let mut args = datetime(expr, &["start of month"]);
            args.push(func("PRINTF", vec![lit_str("-%d months"), into_quarter]));
            func("DATETIME", args)
        }
        TimeUnit::Year => func("DATETIME", datetime(expr, &["start of year"])),
    }
}

/// `x - INTERVAL ...` for negative amounts, `x + INTERVAL ...` otherwise.
pub fn interval_arithmetic(expr: Expr, amount: i64, unit: TimeUnit) -> Expr {
    let (amount, unit) = unit.normalize(amount);
    if amount < 0 {
        expr.sub(interval(-amount, unit))
    } else {
        expr.add(interval(amount, unit))
    }
}

/// `DATEADD(week, -1, x)`
pub fn dateadd(expr: Expr, amount: i64, unit: TimeUnit) -> Expr {
    let (amount, unit) = unit.normalize(amount);
    func("DATEADD", vec![raw_sql(unit.as_str()), lit_int(amount), expr])
}

/// `DATETIME(x, '-7 days')`. SQLite has no week or quarter modifier.
pub fn sqlite_shift(expr: Expr, amount: i64, unit: TimeUnit) -> Expr {
    let (amount, word) = match unit {
        TimeUnit::Hour => (amount, "hours"),
        TimeUnit::Day => (amount, "days"),
        TimeUnit::Week => (amount * 7, "days"),
        TimeUnit::Month => (amount, "months"),
        TimeUnit::Quarter => (amount * 3, "months"),
        TimeUnit::Year => (amount, "years"),
    };
    func("DATETIME", vec![expr, lit_str(&format!("{amount:+} {word}"))])
}
