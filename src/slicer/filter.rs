//! Filter descriptors.
//!
//! A filter names a metric or dimension by key and is applied to that
//! descriptor's definition. Dimension filters end up in `WHERE`, metric
//! filters in `HAVING`.

use serde::{Deserialize, Serialize};

use crate::sql::expr::{lit_bool, lit_float, lit_int, lit_str, Expr, ExprExt};

/// A literal operand of a filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl FilterValue {
    pub fn to_expr(&self) -> Expr {
        match self {
            FilterValue::Bool(b) => lit_bool(*b),
            FilterValue::Int(n) => lit_int(*n),
            FilterValue::Float(x) => lit_float(*x),
            FilterValue::Text(s) => lit_str(s),
        }
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        FilterValue::Int(n)
    }
}

impl From<i32> for FilterValue {
    fn from(n: i32) -> Self {
        FilterValue::Int(n.into())
    }
}

impl From<f64> for FilterValue {
    fn from(x: f64) -> Self {
        FilterValue::Float(x)
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        FilterValue::Text(s.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Filter {
    Comparison {
        key: String,
        op: ComparisonOp,
        value: FilterValue,
    },
    /// `key IN (values)`
    Contains {
        key: String,
        values: Vec<FilterValue>,
    },
    /// `key NOT IN (values)`
    Excludes {
        key: String,
        values: Vec<FilterValue>,
    },
    /// Inclusive on both ends.
    Range {
        key: String,
        start: FilterValue,
        stop: FilterValue,
    },
    /// `LIKE` pattern, `%` and `_` wildcards.
    Wildcard { key: String, pattern: String },
    Boolean { key: String, value: bool },
}

impl Filter {
    pub fn comparison(key: &str, op: ComparisonOp, value: impl Into<FilterValue>) -> Self {
        Filter::Comparison {
            key: key.into(),
            op,
            value: value.into(),
        }
    }

    pub fn contains(key: &str, values: Vec<FilterValue>) -> Self {
        Filter::Contains {
            key: key.into(),
            values,
        }
    }

    pub fn excludes(key: &str, values: Vec<FilterValue>) -> Self {
        Filter::Excludes {
            key: key.into(),
            values,
        }
    }

    pub fn range(key: &str, start: impl Into<FilterValue>, stop: impl Into<FilterValue>) -> Self {
        Filter::Range {
            key: key.into(),
            start: start.into(),
            stop: stop.into(),
        }
    }

    pub fn wildcard(key: &str, pattern: &str) -> Self {
        Filter::Wildcard {
            key: key.into(),
            pattern: pattern.into(),
        }
    }

    /// Key of the metric or dimension this filter targets.
    pub fn key(&self) -> &str {
        match self {
            Filter::Comparison { key, .. }
            | Filter::Contains { key, .. }
            | Filter::Excludes { key, .. }
            | Filter::Range { key, .. }
            | Filter::Wildcard { key, .. }
            | Filter::Boolean { key, .. } => key,
        }
    }

    /// Build the condition against `target`, the descriptor's definition.
    pub fn apply(&self, target: Expr) -> Expr {
        match self {
            Filter::Comparison { op, value, .. } => {
                let value = value.to_expr();
                match op {
                    ComparisonOp::Eq => target.eq(value),
                    ComparisonOp::Ne => target.ne(value),
                    ComparisonOp::Gt => target.gt(value),
                    ComparisonOp::Gte => target.gte(value),
                    ComparisonOp::Lt => target.lt(value),
                    ComparisonOp::Lte => target.lte(value),
                }
            }
            Filter::Contains { values, .. } => {
                target.in_list(values.iter().map(FilterValue::to_expr).collect())
            }
            Filter::Excludes { values, .. } => {
                target.not_in_list(values.iter().map(FilterValue::to_expr).collect())
            }
            Filter::Range { start, stop, .. } => target.between(start.to_expr(), stop.to_expr()),
            Filter::Wildcard { pattern, .. } => target.like(lit_str(pattern)),
            Filter::Boolean { value, .. } => target.eq(lit_bool(*value)),
        }
    }
}
