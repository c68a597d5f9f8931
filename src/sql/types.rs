//! Calendar units shared by date truncation and date shifting.
//!
//! A `TimeUnit` is the bucketing parameter of a datetime dimension and the
//! unit of a reference interval. Dialects decide how each unit renders.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Calendar unit for truncating or shifting a datetime expression.
///
/// # Examples
///
/// ```ignore
/// use slicer::sql::types::TimeUnit;
///
/// assert_eq!(TimeUnit::parse("week"), Some(TimeUnit::Week));
/// assert_eq!(TimeUnit::parse("DD"), Some(TimeUnit::Day));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Hour,
    #[default]
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl TimeUnit {
    /// Parse a unit name or its short date-format code.
    ///
    /// Accepts full names (`hour`, `day`, ...) and the classic truncation
    /// codes (`HH`, `DD`, `WW`, `MM`, `Q`, `IY`), case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "hour" | "hh" => Some(TimeUnit::Hour),
            "day" | "dd" => Some(TimeUnit::Day),
            "week" | "ww" => Some(TimeUnit::Week),
            "month" | "mm" => Some(TimeUnit::Month),
            "quarter" | "q" => Some(TimeUnit::Quarter),
            "year" | "iy" | "yyyy" => Some(TimeUnit::Year),
            _ => None,
        }
    }

    /// Lower-case unit name, as used inside `DATE_TRUNC('week', ...)`.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeUnit::Hour => "hour",
            TimeUnit::Day => "day",
            TimeUnit::Week => "week",
            TimeUnit::Month => "month",
            TimeUnit::Quarter => "quarter",
            TimeUnit::Year => "year",
        }
    }

    /// Express `amount` of this unit in a unit every dialect can shift by.
    ///
    /// Quarters become months; all other units pass through.
    pub fn normalize(&self, amount: i64) -> (i64, TimeUnit) {
        match self {
            TimeUnit::Quarter => (amount * 3, TimeUnit::Month),
            other => (amount, *other),
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
