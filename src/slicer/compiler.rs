//! Request → SQL compilation.
//!
//! ```text
//! Request ──► base query ──► (base) AS sq0
//!                              LEFT JOIN (copy) AS sq1 ON <shifted criterion>
//!                              LEFT JOIN (copy) AS sq2 ON ...
//! ```
//!
//! Without references the base query is the whole query. With references
//! the base query is wrapped and joined to one shifted copy of itself per
//! reference. The copies are clones of the base value; nothing built for the
//! outer query afterwards reaches them.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::descriptor::Field;
use super::error::{SlicerError, SlicerResult};
use super::reference::{self, Reference};
use crate::sql::dialect::{Dialect, SqlDialect};
use crate::sql::expr::{col, lit_bool, table_col, Expr, ExprExt};
use crate::sql::query::{JoinType, OrderItem, Query, SortDir, TableRef, TableSource};

/// Alias of the wrapped base query.
const BASE_ALIAS: &str = "sq0";

// =============================================================================
// Request
// =============================================================================

/// A join declared up front; the compiler never discovers joins.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinSpec {
    pub table: TableRef,
    pub criterion: Expr,
    pub join_type: JoinType,
}

/// Limit, offset and explicit ordering of the final result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub offset: Option<u64>,
    /// Output keys with directions; replaces the default ordering when set.
    #[serde(default)]
    pub order: Vec<(String, SortDir)>,
}

/// Everything the compiler needs, already expanded into fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub table: TableRef,
    pub joins: Vec<JoinSpec>,
    pub metrics: IndexMap<String, Expr>,
    /// Dimension key → expansion fields, in declared order.
    pub dimensions: IndexMap<String, Vec<Field>>,
    pub row_filters: Vec<Expr>,
    pub agg_filters: Vec<Expr>,
    /// Reference key → dimension key.
    pub references: IndexMap<String, String>,
    pub rollup: Vec<String>,
    pub pagination: Option<Pagination>,
}

impl Request {
    pub fn new(table: TableRef) -> Self {
        Self {
            table,
            joins: vec![],
            metrics: IndexMap::new(),
            dimensions: IndexMap::new(),
            row_filters: vec![],
            agg_filters: vec![],
            references: IndexMap::new(),
            rollup: vec![],
            pagination: None,
        }
    }

    pub fn join(mut self, join_type: JoinType, table: TableRef, criterion: Expr) -> Self {
        self.joins.push(JoinSpec {
            table,
            criterion,
            join_type,
        });
        self
    }

    pub fn metric(mut self, key: &str, expr: Expr) -> Self {
        self.metrics.insert(key.into(), expr);
        self
    }

    pub fn dimension(mut self, key: &str, fields: Vec<Field>) -> Self {
        self.dimensions.insert(key.into(), fields);
        self
    }

    pub fn filter(mut self, condition: Expr) -> Self {
        self.row_filters.push(condition);
        self
    }

    pub fn having(mut self, condition: Expr) -> Self {
        self.agg_filters.push(condition);
        self
    }

    pub fn reference(mut self, reference_key: &str, dimension_key: &str) -> Self {
        self.references
            .insert(reference_key.into(), dimension_key.into());
        self
    }

    pub fn rollup(mut self, dimension_key: &str) -> Self {
        self.rollup.push(dimension_key.into());
        self
    }

    pub fn paginate(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }
}

// =============================================================================
// Compiled Query
// =============================================================================

/// A compiled request: the query plus the shape of its result.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub query: Query,
    /// Index keys: non-rollup dimension fields, then rollup dimension fields.
    pub index: Vec<String>,
    /// Number of leading index keys that are never rolled up.
    pub plain_index_len: usize,
    /// Metric keys, then each reference's derived metric keys.
    pub columns: Vec<String>,
    /// Comparison-period dimension columns (`{key}_{reference}`), selected
    /// but not part of the table.
    pub reference_dimensions: Vec<String>,
    /// Rows follow a caller-chosen order and must not be re-sorted.
    pub explicit_order: bool,
}

impl CompiledQuery {
    pub fn to_sql(&self, dialect: Dialect) -> String {
        self.query.to_sql(dialect)
    }
}

// =============================================================================
// Compilation
// =============================================================================

struct ResolvedReference<'a> {
    reference: Reference,
    dimension: &'a str,
}

/// Compile a request for `dialect`.
pub fn compile(request: &Request, dialect: Dialect) -> SlicerResult<CompiledQuery> {
    if request.metrics.is_empty() {
        return Err(SlicerError::EmptyMetrics);
    }
    for key in &request.rollup {
        if !request.dimensions.contains_key(key) {
            return Err(SlicerError::UnknownRollupDimension { key: key.clone() });
        }
    }
    if !request.rollup.is_empty() && !dialect.supports_rollup() {
        return Err(SlicerError::RollupNotSupported { dialect });
    }
    let references = resolve_references(request)?;

    let (plain, rolled) = partition(request);
    let plain_keys: Vec<String> = plain.iter().map(|f| f.key.clone()).collect();
    let rolled_keys: Vec<String> = rolled.iter().flatten().map(|f| f.key.clone()).collect();
    let index: Vec<String> = plain_keys.iter().chain(&rolled_keys).cloned().collect();
    let mut columns: Vec<String> = request.metrics.keys().cloned().collect();

    let mut base = from_with_joins(request);
    for field in plain.iter().chain(rolled.iter().flatten()) {
        base = base.column(field.expr.clone().alias(&field.key));
    }
    for (key, expr) in &request.metrics {
        base = base.column(expr.clone().alias(key));
    }
    base = base
        .group_by(plain.iter().map(|f| f.expr.clone()).collect())
        .rollup(
            rolled
                .iter()
                .map(|group| group.iter().map(|f| f.expr.clone()).collect())
                .collect(),
        );
    for condition in &request.row_filters {
        base = base.filter(condition.clone());
    }
    for condition in &request.agg_filters {
        base = base.having(condition.clone());
    }

    let mut reference_dimensions = Vec::new();
    let (mut query, qualifier) = if references.is_empty() {
        (base, None)
    } else {
        let mut outer = Query::new().from(TableSource::derived(base.clone(), BASE_ALIAS));
        for key in index.iter().chain(request.metrics.keys()) {
            outer = outer.column(table_col(BASE_ALIAS, key).alias(key));
        }

        for (n, resolved) in references.iter().enumerate() {
            let alias = format!("sq{}", n + 1);
            let copy = shifted_copy(&base, request, resolved, dialect);
            let criterion = reference_criterion(request, resolved, &alias, dialect);
            outer = outer.left_join(TableSource::derived(copy, &alias), criterion);

            for key in &index {
                let output = resolved.reference.output_key(key);
                outer = outer.column(table_col(&alias, key).alias(&output));
                reference_dimensions.push(output);
            }
            for key in request.metrics.keys() {
                let output = resolved.reference.output_key(key);
                let expr = resolved
                    .reference
                    .field(table_col(BASE_ALIAS, key), table_col(&alias, key));
                outer = outer.column(expr.alias(&output));
                columns.push(output);
            }
        }
        (outer, Some(BASE_ALIAS))
    };

    // Output keys address result columns by name and must be unique.
    let mut seen = HashSet::new();
    for key in index.iter().chain(&columns).chain(&reference_dimensions) {
        if !seen.insert(key.as_str()) {
            return Err(SlicerError::DuplicateKey { key: key.clone() });
        }
    }

    let index_expr = |key: &str| match qualifier {
        Some(q) => table_col(q, key),
        None => col(key),
    };

    let explicit = request.pagination.as_ref().filter(|p| !p.order.is_empty());
    let order = match explicit {
        Some(pagination) => pagination
            .order
            .iter()
            .map(|(key, dir)| {
                let expr = if index.contains(key) {
                    index_expr(key)
                } else if columns.contains(key) || reference_dimensions.contains(key) {
                    col(key)
                } else {
                    return Err(SlicerError::UnknownOrderKey { key: key.clone() });
                };
                Ok(match dir {
                    SortDir::Asc => OrderItem::asc(expr),
                    SortDir::Desc => OrderItem::desc(expr),
                })
            })
            .collect::<SlicerResult<Vec<_>>>()?,
        None => index.iter().map(|k| OrderItem::new(index_expr(k))).collect(),
    };
    query = query.order_by(order);

    if let Some(pagination) = &request.pagination {
        if let Some(limit) = pagination.limit {
            query = query.limit(limit);
        }
        if let Some(offset) = pagination.offset {
            query = query.offset(offset);
        }
    }

    debug!(
        dimensions = request.dimensions.len(),
        metrics = request.metrics.len(),
        references = references.len(),
        rollup = request.rollup.len(),
        "compiled slicer request"
    );

    Ok(CompiledQuery {
        query,
        plain_index_len: plain_keys.len(),
        index,
        columns,
        reference_dimensions,
        explicit_order: explicit.is_some(),
    })
}

/// `SELECT DISTINCT <dimension fields>` over the request's table, joins and
/// row filters; metrics, references and rollup are ignored.
pub fn compile_dimension_options(
    request: &Request,
    limit: Option<u64>,
) -> SlicerResult<CompiledQuery> {
    let fields: Vec<&Field> = request.dimensions.values().flatten().collect();
    if fields.is_empty() {
        return Err(SlicerError::EmptyDimensions);
    }

    let mut query = from_with_joins(request).distinct();
    for field in &fields {
        query = query.column(field.expr.clone().alias(&field.key));
    }
    for condition in &request.row_filters {
        query = query.filter(condition.clone());
    }
    query = query.order_by(fields.iter().map(|f| OrderItem::new(col(&f.key))).collect());
    if let Some(limit) = limit {
        query = query.limit(limit);
    }

    let index: Vec<String> = fields.iter().map(|f| f.key.clone()).collect();
    Ok(CompiledQuery {
        query,
        plain_index_len: index.len(),
        index,
        columns: vec![],
        reference_dimensions: vec![],
        explicit_order: false,
    })
}

fn resolve_references(request: &Request) -> SlicerResult<Vec<ResolvedReference<'_>>> {
    request
        .references
        .iter()
        .map(|(reference_key, dimension)| {
            let reference = reference::resolve(reference_key)?;
            if !request.dimensions.contains_key(dimension) {
                return Err(SlicerError::UnknownReferenceDimension {
                    reference: reference_key.clone(),
                    dimension: dimension.clone(),
                });
            }
            Ok(ResolvedReference {
                reference,
                dimension: dimension.as_str(),
            })
        })
        .collect()
}

/// Split dimension fields into plain fields and one group per rolled-up
/// dimension, both in declared dimension order.
fn partition(request: &Request) -> (Vec<&Field>, Vec<Vec<&Field>>) {
    let mut plain = Vec::new();
    let mut rolled = Vec::new();
    for (key, fields) in &request.dimensions {
        if request.rollup.contains(key) {
            rolled.push(fields.iter().collect());
        } else {
            plain.extend(fields.iter());
        }
    }
    (plain, rolled)
}

fn from_with_joins(request: &Request) -> Query {
    request
        .joins
        .iter()
        .fold(Query::new().from(request.table.clone()), |query, join| {
            query.join(join.join_type, join.table.clone(), join.criterion.clone())
        })
}

/// Clone of the base query whose row filters select the prior period.
///
/// Every column read by the referenced dimension is moved one period forward
/// inside the WHERE clause.
fn shifted_copy(
    base: &Query,
    request: &Request,
    resolved: &ResolvedReference<'_>,
    dialect: Dialect,
) -> Query {
    let mut copy = base.clone();
    let Some(where_clause) = copy.where_clause.take() else {
        return copy;
    };

    let shifted_columns: HashSet<(Option<String>, String)> = request.dimensions
        [resolved.dimension]
        .iter()
        .flat_map(|f| f.expr.columns())
        .map(|(table, column)| (table.map(String::from), column.to_string()))
        .collect();

    copy.where_clause = Some(where_clause.map_columns(&|table, column| {
        let key = (table.map(String::from), column.to_string());
        shifted_columns.contains(&key).then(|| {
            let original = Expr::Column {
                table: key.0.clone(),
                column: key.1.clone(),
            };
            resolved.reference.shift_forward(original, dialect)
        })
    }));
    copy
}

/// `sqN.d = sq0.d - interval` for the referenced dimension's fields, AND
/// `sq0.g = sqN.g` for every field of every other dimension.
fn reference_criterion(
    request: &Request,
    resolved: &ResolvedReference<'_>,
    alias: &str,
    dialect: Dialect,
) -> Expr {
    let mut conditions = Vec::new();
    for (key, fields) in &request.dimensions {
        for field in fields {
            let current = table_col(BASE_ALIAS, &field.key);
            let joined = table_col(alias, &field.key);
            conditions.push(if key == resolved.dimension {
                resolved.reference.criterion(current, joined, dialect)
            } else {
                current.eq(joined)
            });
        }
    }
    let mut conditions = conditions.into_iter();
    let first = conditions.next().unwrap_or_else(|| lit_bool(true));
    conditions.fold(first, |acc, c| acc.and(c))
}
