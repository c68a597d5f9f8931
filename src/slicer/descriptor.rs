//! Metric and dimension descriptors.
//!
//! A descriptor is the static definition of how a metric or dimension maps
//! onto SQL. Dimensions come in a closed set of kinds, each expanding into
//! one or more selectable [`Field`]s:
//!
//! | Kind | Fields | Expression |
//! |------|--------|------------|
//! | Continuous | `key` | `(definition + offset) % size` |
//! | Datetime | `key` | `truncate_date(definition, unit)` |
//! | Categorical | `key` | `definition` |
//! | Unique | `key_id0..key_idN`, `key_label` | id fields, then the label field |
//! | Boolean | `key` | `definition` |

use inflector::Inflector;
use serde::{Deserialize, Serialize};

use super::error::{SlicerError, SlicerResult};
use crate::database::Value;
use crate::sql::expr::{col, lit_int, sum, Expr, ExprExt};
use crate::sql::types::TimeUnit;

/// One selectable output column: its key and the expression producing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub key: String,
    pub expr: Expr,
}

impl Field {
    pub fn new(key: impl Into<String>, expr: Expr) -> Self {
        Self {
            key: key.into(),
            expr,
        }
    }
}

/// Label used when a descriptor does not declare one: `device_type` → `Device type`.
pub fn default_label(key: &str) -> String {
    key.to_sentence_case()
}

// =============================================================================
// Metrics
// =============================================================================

/// An aggregated value computed per group.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub key: String,
    pub label: String,
    pub definition: Expr,
    /// Keys of declared joins this metric reads from.
    pub joins: Vec<String>,
}

impl Metric {
    /// A metric summing the same-named column.
    pub fn new(key: &str) -> Self {
        Self {
            key: key.into(),
            label: default_label(key),
            definition: sum(col(key)),
            joins: vec![],
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_definition(mut self, definition: Expr) -> Self {
        self.definition = definition;
        self
    }

    pub fn with_joins(mut self, joins: Vec<&str>) -> Self {
        self.joins = joins.into_iter().map(String::from).collect();
        self
    }

    pub fn expand(&self) -> Vec<Field> {
        vec![Field::new(&self.key, self.definition.clone())]
    }
}

// =============================================================================
// Dimensions
// =============================================================================

/// Bucket width and origin for continuous dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumericInterval {
    #[serde(default = "NumericInterval::default_size")]
    pub size: i64,
    #[serde(default)]
    pub offset: i64,
}

impl NumericInterval {
    fn default_size() -> i64 {
        1
    }
}

impl Default for NumericInterval {
    fn default() -> Self {
        Self { size: 1, offset: 0 }
    }
}

/// Request-time override of a dimension's bucketing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BucketParam {
    Unit(TimeUnit),
    Interval(NumericInterval),
}

/// One enumerated option of a categorical dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionValue {
    pub key: String,
    pub label: String,
}

/// The closed set of dimension kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum DimensionKind {
    Continuous {
        definition: Expr,
        interval: NumericInterval,
    },
    Datetime {
        definition: Expr,
        unit: TimeUnit,
    },
    Categorical {
        definition: Expr,
        options: Vec<DimensionValue>,
    },
    Unique {
        id_fields: Vec<Expr>,
        label_field: Expr,
    },
    Boolean {
        definition: Expr,
    },
}

/// A grouping axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Dimension {
    pub key: String,
    pub label: String,
    pub kind: DimensionKind,
    /// Keys of declared joins this dimension reads from.
    pub joins: Vec<String>,
}

impl Dimension {
    fn with_kind(key: &str, kind: DimensionKind) -> Self {
        Self {
            key: key.into(),
            label: default_label(key),
            kind,
            joins: vec![],
        }
    }

    pub fn continuous(key: &str, definition: Expr) -> Self {
        Self::with_kind(
            key,
            DimensionKind::Continuous {
                definition,
                interval: NumericInterval::default(),
            },
        )
    }

    pub fn datetime(key: &str, definition: Expr) -> Self {
        Self::with_kind(
            key,
            DimensionKind::Datetime {
                definition,
                unit: TimeUnit::default(),
            },
        )
    }

    pub fn categorical(key: &str, definition: Expr) -> Self {
        Self::with_kind(
            key,
            DimensionKind::Categorical {
                definition,
                options: vec![],
            },
        )
    }

    pub fn unique(key: &str, id_fields: Vec<Expr>, label_field: Expr) -> Self {
        Self::with_kind(
            key,
            DimensionKind::Unique {
                id_fields,
                label_field,
            },
        )
    }

    pub fn boolean(key: &str, definition: Expr) -> Self {
        Self::with_kind(key, DimensionKind::Boolean { definition })
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_joins(mut self, joins: Vec<&str>) -> Self {
        self.joins = joins.into_iter().map(String::from).collect();
        self
    }

    /// Set the default interval of a continuous dimension. No-op for other kinds.
    pub fn with_interval(mut self, size: i64, offset: i64) -> Self {
        if let DimensionKind::Continuous { interval, .. } = &mut self.kind {
            *interval = NumericInterval { size, offset };
        }
        self
    }

    /// Set the default unit of a datetime dimension. No-op for other kinds.
    pub fn with_unit(mut self, unit: TimeUnit) -> Self {
        if let DimensionKind::Datetime { unit: current, .. } = &mut self.kind {
            *current = unit;
        }
        self
    }

    /// Set the options of a categorical dimension. No-op for other kinds.
    pub fn with_options(mut self, options: Vec<DimensionValue>) -> Self {
        if let DimensionKind::Categorical { options: current, .. } = &mut self.kind {
            *current = options;
        }
        self
    }

    /// The untransformed expression filters compare against.
    ///
    /// Unique dimensions filter on their first id field.
    pub fn definition(&self) -> Option<&Expr> {
        match &self.kind {
            DimensionKind::Continuous { definition, .. }
            | DimensionKind::Datetime { definition, .. }
            | DimensionKind::Categorical { definition, .. }
            | DimensionKind::Boolean { definition } => Some(definition),
            DimensionKind::Unique { id_fields, .. } => id_fields.first(),
        }
    }

    /// Output keys this dimension produces, in expansion order.
    pub fn output_keys(&self) -> Vec<String> {
        match &self.kind {
            DimensionKind::Unique { id_fields, .. } => (0..id_fields.len())
                .map(|i| format!("{}_id{}", self.key, i))
                .chain(std::iter::once(format!("{}_label", self.key)))
                .collect(),
            _ => vec![self.key.clone()],
        }
    }

    /// Expand into concrete fields.
    ///
    /// `truncate` renders date truncation for datetime dimensions; it is
    /// usually `Database::truncate_date` or `SqlDialect::truncate_date`.
    pub fn expand<F>(&self, bucket: Option<&BucketParam>, truncate: F) -> SlicerResult<Vec<Field>>
    where
        F: Fn(Expr, TimeUnit) -> Expr,
    {
        let invalid_bucket = || SlicerError::InvalidBucket {
            key: self.key.clone(),
        };

        match &self.kind {
            DimensionKind::Continuous {
                definition,
                interval,
            } => {
                let interval = match bucket {
                    None => *interval,
                    Some(BucketParam::Interval(i)) => *i,
                    Some(BucketParam::Unit(_)) => return Err(invalid_bucket()),
                };
                if interval.size <= 0 {
                    return Err(invalid_bucket());
                }
                let expr = definition
                    .clone()
                    .add(lit_int(interval.offset))
                    .modulo(lit_int(interval.size));
                Ok(vec![Field::new(&self.key, expr)])
            }
            DimensionKind::Datetime { definition, unit } => {
                let unit = match bucket {
                    None => *unit,
                    Some(BucketParam::Unit(u)) => *u,
                    Some(BucketParam::Interval(_)) => return Err(invalid_bucket()),
                };
                Ok(vec![Field::new(&self.key, truncate(definition.clone(), unit))])
            }
            DimensionKind::Unique {
                id_fields,
                label_field,
            } => {
                if bucket.is_some() {
                    return Err(invalid_bucket());
                }
                if id_fields.is_empty() {
                    return Err(SlicerError::MissingIdFields {
                        key: self.key.clone(),
                    });
                }
                let keys = self.output_keys();
                let exprs = id_fields.iter().chain(std::iter::once(label_field));
                Ok(keys
                    .into_iter()
                    .zip(exprs)
                    .map(|(key, expr)| Field::new(key, expr.clone()))
                    .collect())
            }
            DimensionKind::Categorical { definition, .. } | DimensionKind::Boolean { definition } => {
                if bucket.is_some() {
                    return Err(invalid_bucket());
                }
                Ok(vec![Field::new(&self.key, definition.clone())])
            }
        }
    }

    /// Display text for the values of this dimension's output columns, as
    /// read back from a result row (in `output_keys()` order).
    ///
    /// Categorical values map to their option label, unique dimensions show
    /// their label column, and `None` marks a rollup total.
    pub fn display(&self, values: &[&Value]) -> Option<String> {
        match &self.kind {
            DimensionKind::Unique { id_fields, .. } => {
                let label = values.get(id_fields.len())?;
                (!label.is_null()).then(|| label.to_string())
            }
            DimensionKind::Categorical { options, .. } => {
                let value = values.first()?;
                if value.is_null() {
                    return None;
                }
                let raw = value.to_string();
                Some(
                    options
                        .iter()
                        .find(|o| o.key == raw)
                        .map(|o| o.label.clone())
                        .unwrap_or(raw),
                )
            }
            _ => {
                let value = values.first()?;
                (!value.is_null()).then(|| value.to_string())
            }
        }
    }
}
