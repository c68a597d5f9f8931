//! Prior-period references (`wow`, `mom`, `qoq`, `yoy`, with `_d` / `_p`).
//!
//! A reference key names a calendar shift and, optionally, how the current
//! and prior values are combined:
//!
//! | Key | Shift | Derived value |
//! |-----|-------|---------------|
//! | `wow` | 1 week | prior |
//! | `mom` | 4 weeks | prior |
//! | `qoq` | 1 quarter | prior |
//! | `yoy` | 52 weeks | prior |
//! | `*_d` | | `current - prior` |
//! | `*_p` | | `(current - prior) / prior`, `NULL` when prior is 0 |

use super::error::{SlicerError, SlicerResult};
use crate::sql::dialect::{Dialect, SqlDialect};
use crate::sql::expr::{lit_float, lit_int, nullif, Expr, ExprExt};
use crate::sql::types::TimeUnit;

/// The calendar shift of a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceBase {
    WeekOverWeek,
    /// Shifts by 4 weeks, not a calendar month.
    MonthOverMonth,
    QuarterOverQuarter,
    YearOverYear,
}

impl ReferenceBase {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "wow" => Some(ReferenceBase::WeekOverWeek),
            "mom" => Some(ReferenceBase::MonthOverMonth),
            "qoq" => Some(ReferenceBase::QuarterOverQuarter),
            "yoy" => Some(ReferenceBase::YearOverYear),
            _ => None,
        }
    }

    /// Length of one period.
    pub fn interval(&self) -> (i64, TimeUnit) {
        match self {
            ReferenceBase::WeekOverWeek => (1, TimeUnit::Week),
            ReferenceBase::MonthOverMonth => (4, TimeUnit::Week),
            ReferenceBase::QuarterOverQuarter => (1, TimeUnit::Quarter),
            ReferenceBase::YearOverYear => (52, TimeUnit::Week),
        }
    }
}

/// How current and prior values are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    /// The prior value itself.
    Value,
    /// `current - prior`
    Delta,
    /// `(current - prior) / prior`
    DeltaPercent,
}

impl Modifier {
    pub fn from_suffix(suffix: Option<&str>) -> Option<Self> {
        match suffix {
            None => Some(Modifier::Value),
            Some("d") => Some(Modifier::Delta),
            Some("p") => Some(Modifier::DeltaPercent),
            Some(_) => None,
        }
    }
}

/// A resolved reference key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub key: String,
    pub base: ReferenceBase,
    pub modifier: Modifier,
}

/// Parse a reference key such as `wow`, `yoy_d` or `mom_p`.
pub fn resolve(key: &str) -> SlicerResult<Reference> {
    let unknown = || SlicerError::UnknownReference { key: key.into() };

    let (prefix, suffix) = match key.split_once('_') {
        Some((prefix, suffix)) => (prefix, Some(suffix)),
        None => (key, None),
    };
    let base = ReferenceBase::from_key(prefix).ok_or_else(unknown)?;
    let modifier = Modifier::from_suffix(suffix).ok_or_else(unknown)?;

    Ok(Reference {
        key: key.into(),
        base,
        modifier,
    })
}

impl Reference {
    /// Join condition: the joined row is exactly one period before the current one.
    pub fn criterion(&self, current: Expr, joined: Expr, dialect: Dialect) -> Expr {
        let (amount, unit) = self.base.interval();
        joined.eq(dialect.shift_date(current, -amount, unit))
    }

    /// Move an expression one period forward, so a filter written for the
    /// current period selects the prior period's rows.
    pub fn shift_forward(&self, expr: Expr, dialect: Dialect) -> Expr {
        let (amount, unit) = self.base.interval();
        dialect.shift_date(expr, amount, unit)
    }

    /// Derived value for a metric.
    pub fn field(&self, current: Expr, joined: Expr) -> Expr {
        match self.modifier {
            Modifier::Value => joined,
            Modifier::Delta => current.sub(joined),
            Modifier::DeltaPercent => current
                .sub(joined.clone())
                .mul(lit_float(1.0))
                .div(nullif(joined, lit_int(0))),
        }
    }

    /// Output key of a column derived from `key` by this reference.
    pub fn output_key(&self, key: &str) -> String {
        format!("{}_{}", key, self.key)
    }
}
