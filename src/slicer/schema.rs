//! Named descriptor collections and key-based requests.
//!
//! A [`Slicer`] owns a base table, its declared joins and the metric and
//! dimension descriptors built on them. It turns a [`SlicerRequest`], which
//! only names keys, into a compiler [`Request`].
//!
//! Schemas can be built in code or loaded from TOML:
//!
//! ```toml
//! [table]
//! name = "traffic"
//!
//! [[joins]]
//! key = "accounts"
//! table = "accounts"
//! on = "traffic.account_id = accounts.id"
//! type = "left"
//!
//! [metrics.clicks]
//!
//! [metrics.visitors]
//! column = "session_id"
//! aggregate = "count_distinct"
//!
//! [dimensions.date]
//! type = "datetime"
//! column = "dt"
//! unit = "week"
//!
//! [dimensions.account]
//! type = "unique"
//! id_fields = [{ column = "account_id" }]
//! label_field = { table = "accounts", column = "name" }
//! joins = ["accounts"]
//! ```
//!
//! Columns without a `table` are qualified with the base table. `sql` and
//! `on` are trusted SQL fragments and are emitted verbatim.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::compiler::{self, CompiledQuery, Pagination, Request};
use super::descriptor::{BucketParam, Dimension, DimensionKind, DimensionValue, Metric};
use super::error::{SlicerError, SlicerResult};
use super::filter::Filter;
use super::materialize::{self, MaterializeOptions, Table};
use crate::database::Database;
use crate::sql::dialect::{Dialect, SqlDialect};
use crate::sql::expr::{avg, count, count_distinct, max, min, raw_sql, sum, table_col, Expr};
use crate::sql::query::{JoinType, TableRef};
use crate::sql::types::TimeUnit;

static KEY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

// =============================================================================
// Slicer
// =============================================================================

/// A join that descriptors may require by key.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinDescriptor {
    pub key: String,
    pub table: TableRef,
    pub criterion: Expr,
    pub join_type: JoinType,
}

impl JoinDescriptor {
    pub fn new(key: &str, table: TableRef, criterion: Expr) -> Self {
        Self {
            key: key.into(),
            table,
            criterion,
            join_type: JoinType::Inner,
        }
    }

    pub fn with_type(mut self, join_type: JoinType) -> Self {
        self.join_type = join_type;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Slicer {
    pub table: TableRef,
    pub joins: Vec<JoinDescriptor>,
    pub metrics: IndexMap<String, Metric>,
    pub dimensions: IndexMap<String, Dimension>,
}

impl Slicer {
    pub fn new(table: TableRef) -> Self {
        Self {
            table,
            joins: vec![],
            metrics: IndexMap::new(),
            dimensions: IndexMap::new(),
        }
    }

    pub fn join(mut self, join: JoinDescriptor) -> Self {
        self.joins.push(join);
        self
    }

    pub fn metric(mut self, metric: Metric) -> Self {
        self.metrics.insert(metric.key.clone(), metric);
        self
    }

    pub fn dimension(mut self, dimension: Dimension) -> Self {
        self.dimensions.insert(dimension.key.clone(), dimension);
        self
    }

    /// Load a schema from TOML text and validate it.
    pub fn from_toml(source: &str) -> SlicerResult<Self> {
        let def: SchemaDef = toml::from_str(source)?;
        let slicer = def.build()?;
        slicer.validate()?;
        debug!(
            table = %slicer.table.reference_name(),
            metrics = slicer.metrics.len(),
            dimensions = slicer.dimensions.len(),
            "loaded slicer schema"
        );
        Ok(slicer)
    }

    /// Load a schema from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> SlicerResult<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| SlicerError::SchemaIo {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&source)
    }

    /// Check keys, output-key collisions and join references.
    pub fn validate(&self) -> SlicerResult<()> {
        let keys = self
            .joins
            .iter()
            .map(|j| &j.key)
            .chain(self.metrics.keys())
            .chain(self.dimensions.keys());
        for key in keys {
            if !KEY_PATTERN.is_match(key) {
                return Err(SlicerError::InvalidKey { key: key.clone() });
            }
        }

        let mut join_keys = HashSet::new();
        for join in &self.joins {
            if !join_keys.insert(join.key.as_str()) {
                return Err(SlicerError::DuplicateKey {
                    key: join.key.clone(),
                });
            }
        }

        let mut outputs = HashSet::new();
        let output_keys = self
            .metrics
            .keys()
            .cloned()
            .chain(self.dimensions.values().flat_map(Dimension::output_keys));
        for key in output_keys {
            if !outputs.insert(key.clone()) {
                return Err(SlicerError::DuplicateKey { key });
            }
        }

        let required = self
            .metrics
            .values()
            .map(|m| (&m.key, &m.joins))
            .chain(self.dimensions.values().map(|d| (&d.key, &d.joins)));
        for (descriptor, joins) in required {
            if let Some(join) = joins.iter().find(|j| !join_keys.contains(j.as_str())) {
                return Err(SlicerError::UnknownJoin {
                    descriptor: descriptor.clone(),
                    join: join.clone(),
                });
            }
        }
        Ok(())
    }

    fn lookup_metric(&self, key: &str) -> SlicerResult<&Metric> {
        self.metrics
            .get(key)
            .ok_or_else(|| SlicerError::UnknownMetric { key: key.into() })
    }

    fn lookup_dimension(&self, key: &str) -> SlicerResult<&Dimension> {
        self.dimensions
            .get(key)
            .ok_or_else(|| SlicerError::UnknownDimension { key: key.into() })
    }

    /// Declared joins named in `required`, in declaration order.
    fn apply_joins(&self, mut request: Request, required: &HashSet<&str>) -> Request {
        for join in self.joins.iter().filter(|j| required.contains(j.key.as_str())) {
            request = request.join(join.join_type, join.table.clone(), join.criterion.clone());
        }
        request
    }

    /// Expand a key-based request into a compiler request.
    ///
    /// `truncate` renders date truncation for datetime dimensions.
    pub fn to_request<F>(&self, request: &SlicerRequest, truncate: F) -> SlicerResult<Request>
    where
        F: Fn(Expr, TimeUnit) -> Expr,
    {
        let mut out = Request::new(self.table.clone());
        let mut required: HashSet<&str> = HashSet::new();

        for key in &request.metrics {
            let metric = self.lookup_metric(key)?;
            required.extend(metric.joins.iter().map(String::as_str));
            for field in metric.expand() {
                out = out.metric(&field.key, field.expr);
            }
        }

        for selection in &request.dimensions {
            let dimension = self.lookup_dimension(selection.key())?;
            required.extend(dimension.joins.iter().map(String::as_str));
            let fields = dimension.expand(selection.bucket(), &truncate)?;
            out = out.dimension(&dimension.key, fields);
        }

        for filter in &request.filters {
            let key = filter.key();
            if let Some(metric) = self.metrics.get(key) {
                required.extend(metric.joins.iter().map(String::as_str));
                out = out.having(filter.apply(metric.definition.clone()));
            } else if let Some(dimension) = self.dimensions.get(key) {
                let target = dimension
                    .definition()
                    .ok_or_else(|| SlicerError::MissingIdFields { key: key.into() })?;
                required.extend(dimension.joins.iter().map(String::as_str));
                out = out.filter(filter.apply(target.clone()));
            } else {
                return Err(SlicerError::UnknownFilterKey { key: key.into() });
            }
        }

        for (reference, dimension) in &request.references {
            out = out.reference(reference, dimension);
        }
        for key in &request.rollup {
            out = out.rollup(key);
        }
        if let Some(pagination) = &request.pagination {
            out = out.paginate(self.resolve_order(request, pagination));
        }

        Ok(self.apply_joins(out, &required))
    }

    /// Rewrite pagination order keys that name descriptors.
    ///
    /// A selected dimension orders by its last output column (the label of a
    /// unique dimension). Declared descriptors that are not selected are
    /// dropped. Other keys are left for the compiler to check.
    fn resolve_order(&self, request: &SlicerRequest, pagination: &Pagination) -> Pagination {
        let selected: HashSet<&str> = request
            .dimensions
            .iter()
            .map(DimensionSelection::key)
            .chain(request.metrics.iter().map(String::as_str))
            .collect();

        let order = pagination
            .order
            .iter()
            .filter_map(|(key, dir)| {
                if let Some(dimension) = self.dimensions.get(key) {
                    if selected.contains(key.as_str()) {
                        return dimension.output_keys().pop().map(|k| (k, *dir));
                    }
                } else if !self.metrics.contains_key(key) || selected.contains(key.as_str()) {
                    return Some((key.clone(), *dir));
                }
                warn!(key = %key, "dropping order key for a descriptor missing from the request");
                None
            })
            .collect();

        Pagination {
            order,
            ..pagination.clone()
        }
    }

    /// Compile a request for `dialect`.
    pub fn compile(&self, request: &SlicerRequest, dialect: Dialect) -> SlicerResult<CompiledQuery> {
        let request = self.to_request(request, |expr, unit| dialect.truncate_date(expr, unit))?;
        compiler::compile(&request, dialect)
    }

    /// Compile and run a request against `database`.
    pub fn fetch(
        &self,
        request: &SlicerRequest,
        database: &dyn Database,
        options: &MaterializeOptions,
    ) -> SlicerResult<Table> {
        let request = self.to_request(request, |expr, unit| database.truncate_date(expr, unit))?;
        let compiled = compiler::compile(&request, database.dialect())?;
        materialize::execute(&compiled, database, options)
    }

    /// Compile the distinct-values query for one dimension.
    pub fn dimension_options(
        &self,
        key: &str,
        limit: Option<u64>,
        dialect: Dialect,
    ) -> SlicerResult<CompiledQuery> {
        let dimension = self.lookup_dimension(key)?;
        let fields = dimension.expand(None, |expr, unit| dialect.truncate_date(expr, unit))?;
        let request = Request::new(self.table.clone()).dimension(key, fields);
        let required = dimension.joins.iter().map(String::as_str).collect();
        compiler::compile_dimension_options(&self.apply_joins(request, &required), limit)
    }

    /// Distinct values of one dimension with display labels.
    ///
    /// Categorical dimensions with declared options answer without a query.
    pub fn fetch_options(
        &self,
        key: &str,
        limit: Option<u64>,
        database: &dyn Database,
    ) -> SlicerResult<Vec<DimensionValue>> {
        let dimension = self.lookup_dimension(key)?;
        if let DimensionKind::Categorical { options, .. } = &dimension.kind {
            if !options.is_empty() {
                return Ok(options.clone());
            }
        }

        let compiled = self.dimension_options(key, limit, database.dialect())?;
        let table = materialize::execute(&compiled, database, &MaterializeOptions::default())?;
        Ok(table
            .rows()
            .iter()
            .filter(|row| row.first().is_some_and(|v| !v.is_null()))
            .map(|row| {
                let values: Vec<_> = row.iter().collect();
                let key = row[0].to_string();
                let label = dimension.display(&values).unwrap_or_else(|| key.clone());
                DimensionValue { key, label }
            })
            .collect())
    }
}

// =============================================================================
// Requests
// =============================================================================

/// A dimension named in a request, optionally re-bucketed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DimensionSelection {
    Key(String),
    Bucketed { key: String, bucket: BucketParam },
}

impl DimensionSelection {
    pub fn key(&self) -> &str {
        match self {
            DimensionSelection::Key(key) | DimensionSelection::Bucketed { key, .. } => key,
        }
    }

    pub fn bucket(&self) -> Option<&BucketParam> {
        match self {
            DimensionSelection::Key(_) => None,
            DimensionSelection::Bucketed { bucket, .. } => Some(bucket),
        }
    }
}

impl From<&str> for DimensionSelection {
    fn from(key: &str) -> Self {
        DimensionSelection::Key(key.into())
    }
}

/// A request in terms of descriptor keys.
///
/// ```json
/// {
///   "metrics": ["clicks"],
///   "dimensions": ["date", {"key": "spend_band", "bucket": {"size": 50}}],
///   "filters": [{"type": "contains", "key": "device", "values": ["desktop"]}],
///   "references": {"wow": "date"},
///   "rollup": [],
///   "pagination": {"limit": 100, "order": [["clicks", "desc"]]}
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlicerRequest {
    pub metrics: Vec<String>,
    pub dimensions: Vec<DimensionSelection>,
    pub filters: Vec<Filter>,
    /// Reference key → dimension key.
    pub references: IndexMap<String, String>,
    pub rollup: Vec<String>,
    pub pagination: Option<Pagination>,
}

impl SlicerRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn metric(mut self, key: &str) -> Self {
        self.metrics.push(key.into());
        self
    }

    pub fn dimension(mut self, selection: impl Into<DimensionSelection>) -> Self {
        self.dimensions.push(selection.into());
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn reference(mut self, reference: &str, dimension: &str) -> Self {
        self.references.insert(reference.into(), dimension.into());
        self
    }

    pub fn rollup(mut self, dimension: &str) -> Self {
        self.rollup.push(dimension.into());
        self
    }

    pub fn paginate(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }
}

// =============================================================================
// TOML Definitions
// =============================================================================

#[derive(Debug, Deserialize)]
struct SchemaDef {
    table: TableDef,
    #[serde(default)]
    joins: Vec<JoinDef>,
    #[serde(default)]
    metrics: IndexMap<String, MetricDef>,
    #[serde(default)]
    dimensions: IndexMap<String, DimensionDef>,
}

#[derive(Debug, Deserialize)]
struct TableDef {
    name: String,
    schema: Option<String>,
    alias: Option<String>,
}

impl TableDef {
    fn to_ref(&self) -> TableRef {
        let mut table = TableRef::new(&self.name);
        if let Some(schema) = &self.schema {
            table = table.with_schema(schema);
        }
        if let Some(alias) = &self.alias {
            table = table.with_alias(alias);
        }
        table
    }
}

#[derive(Debug, Deserialize)]
struct JoinDef {
    key: String,
    table: String,
    schema: Option<String>,
    on: String,
    #[serde(default, rename = "type")]
    join_type: JoinType,
}

/// Where a field's value comes from.
#[derive(Debug, Default, Deserialize)]
struct FieldDef {
    column: Option<String>,
    table: Option<String>,
    sql: Option<String>,
}

impl FieldDef {
    fn to_expr(&self, default_column: &str, default_table: &str) -> Expr {
        match &self.sql {
            Some(sql) => raw_sql(sql),
            None => table_col(
                self.table.as_deref().unwrap_or(default_table),
                self.column.as_deref().unwrap_or(default_column),
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Aggregate {
    #[default]
    Sum,
    Count,
    CountDistinct,
    Avg,
    Min,
    Max,
}

impl Aggregate {
    fn apply(self, expr: Expr) -> Expr {
        match self {
            Aggregate::Sum => sum(expr),
            Aggregate::Count => count(expr),
            Aggregate::CountDistinct => count_distinct(expr),
            Aggregate::Avg => avg(expr),
            Aggregate::Min => min(expr),
            Aggregate::Max => max(expr),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MetricDef {
    label: Option<String>,
    #[serde(flatten)]
    field: FieldDef,
    #[serde(default)]
    aggregate: Aggregate,
    #[serde(default)]
    joins: Vec<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum KindName {
    Continuous,
    Datetime,
    Categorical,
    Unique,
    Boolean,
}

#[derive(Debug, Deserialize)]
struct DimensionDef {
    #[serde(rename = "type")]
    kind: KindName,
    label: Option<String>,
    #[serde(flatten)]
    field: FieldDef,
    size: Option<i64>,
    offset: Option<i64>,
    unit: Option<TimeUnit>,
    #[serde(default)]
    options: Vec<DimensionValue>,
    #[serde(default)]
    id_fields: Vec<FieldDef>,
    /// Defaults to the first id field.
    label_field: Option<FieldDef>,
    #[serde(default)]
    joins: Vec<String>,
}

impl SchemaDef {
    fn build(self) -> SlicerResult<Slicer> {
        let table = self.table.to_ref();
        let base = table.reference_name().to_string();
        let mut slicer = Slicer::new(table);

        for join in self.joins {
            let mut table = TableRef::new(&join.table);
            if let Some(schema) = &join.schema {
                table = table.with_schema(schema);
            }
            slicer = slicer.join(
                JoinDescriptor::new(&join.key, table, raw_sql(&join.on)).with_type(join.join_type),
            );
        }

        for (key, def) in self.metrics {
            let definition = match &def.field.sql {
                Some(sql) => raw_sql(sql),
                None => def.aggregate.apply(def.field.to_expr(&key, &base)),
            };
            let mut metric = Metric::new(&key).with_definition(definition);
            metric.joins = def.joins;
            if let Some(label) = &def.label {
                metric = metric.with_label(label);
            }
            slicer = slicer.metric(metric);
        }

        for (key, def) in self.dimensions {
            let dimension = def.build(&key, &base)?;
            slicer = slicer.dimension(dimension);
        }
        Ok(slicer)
    }
}

impl DimensionDef {
    fn build(self, key: &str, base: &str) -> SlicerResult<Dimension> {
        let invalid = || SlicerError::InvalidBucket { key: key.into() };
        let has_interval = self.size.is_some() || self.offset.is_some();
        let definition = self.field.to_expr(key, base);

        let mut dimension = match self.kind {
            KindName::Continuous => {
                if self.unit.is_some() {
                    return Err(invalid());
                }
                let size = self.size.unwrap_or(1);
                if size <= 0 {
                    return Err(invalid());
                }
                Dimension::continuous(key, definition).with_interval(size, self.offset.unwrap_or(0))
            }
            KindName::Datetime => {
                if has_interval {
                    return Err(invalid());
                }
                Dimension::datetime(key, definition).with_unit(self.unit.unwrap_or_default())
            }
            KindName::Categorical => {
                if has_interval || self.unit.is_some() {
                    return Err(invalid());
                }
                Dimension::categorical(key, definition).with_options(self.options)
            }
            KindName::Unique => {
                if self.id_fields.is_empty() {
                    return Err(SlicerError::MissingIdFields { key: key.into() });
                }
                let ids: Vec<Expr> = self
                    .id_fields
                    .iter()
                    .map(|f| f.to_expr(key, base))
                    .collect();
                let label = match &self.label_field {
                    Some(field) => field.to_expr(key, base),
                    None => ids[0].clone(),
                };
                Dimension::unique(key, ids, label)
            }
            KindName::Boolean => {
                if has_interval || self.unit.is_some() {
                    return Err(invalid());
                }
                Dimension::boolean(key, definition)
            }
        };

        dimension.joins = self.joins;
        if let Some(label) = &self.label {
            dimension = dimension.with_label(label);
        }
        Ok(dimension)
    }
}
