//! SELECT statements as values.
//!
//! A [`Query`] is assembled with consuming builder methods and rendered
//! once, at the end, for one dialect. Sub-queries nest through
//! [`TableSource::Derived`].

use super::dialect::{Dialect, SqlDialect};
use super::expr::{Expr, ExprExt};
use super::token::{write_list, Keyword, ToTokens, Token, TokenStream};

fn write_alias(ts: &mut TokenStream, alias: &str) {
    ts.space()
        .push(Keyword::As)
        .space()
        .push(Token::Ident(alias.to_string()));
}

/// One entry of the select list.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    pub expr: Expr,
    pub alias: Option<String>,
}

impl SelectItem {
    pub fn new(expr: Expr) -> Self {
        Self { expr, alias: None }
    }

    pub fn named(mut self, alias: &str) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

impl From<Expr> for SelectItem {
    fn from(expr: Expr) -> Self {
        SelectItem::new(expr)
    }
}

impl ToTokens for SelectItem {
    fn write_tokens(&self, ts: &mut TokenStream, dialect: Dialect) {
        self.expr.write_tokens(ts, dialect);
        if let Some(alias) = &self.alias {
            write_alias(ts, alias);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableRef {
    pub schema: Option<String>,
    pub table: String,
    pub alias: Option<String>,
}

impl TableRef {
    pub fn new(table: &str) -> Self {
        Self {
            schema: None,
            table: table.into(),
            alias: None,
        }
    }

    pub fn with_schema(mut self, schema: &str) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Qualifier for this table's columns elsewhere in the query.
    pub fn reference_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table)
    }
}

impl ToTokens for TableRef {
    fn write_tokens(&self, ts: &mut TokenStream, _dialect: Dialect) {
        ts.push(Token::QualifiedIdent {
            schema: self.schema.clone(),
            name: self.table.clone(),
        });
        if let Some(alias) = &self.alias {
            write_alias(ts, alias);
        }
    }
}

/// What FROM and JOIN read from.
#[derive(Debug, Clone, PartialEq)]
pub enum TableSource {
    Table(TableRef),
    /// `(\n<query>\n) AS "alias"`
    Derived { query: Box<Query>, alias: String },
}

impl TableSource {
    pub fn derived(query: Query, alias: &str) -> Self {
        TableSource::Derived {
            query: Box::new(query),
            alias: alias.into(),
        }
    }
}

impl From<TableRef> for TableSource {
    fn from(table: TableRef) -> Self {
        TableSource::Table(table)
    }
}

impl ToTokens for TableSource {
    fn write_tokens(&self, ts: &mut TokenStream, dialect: Dialect) {
        match self {
            TableSource::Table(table) => table.write_tokens(ts, dialect),
            TableSource::Derived { query, alias } => {
                ts.lparen().newline();
                query.write_tokens(ts, dialect);
                ts.newline().rparen();
                write_alias(ts, alias);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinType {
    #[default]
    Inner,
    Left,
    Right,
    Full,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub join_type: JoinType,
    pub source: TableSource,
    pub on: Expr,
}

impl ToTokens for Join {
    fn write_tokens(&self, ts: &mut TokenStream, dialect: Dialect) {
        match self.join_type {
            JoinType::Inner => ts.push(Keyword::Inner),
            JoinType::Left => ts.push(Keyword::Left),
            JoinType::Right => ts.push(Keyword::Right),
            JoinType::Full => ts.push(Keyword::Full).space().push(Keyword::Outer),
        };
        ts.space().push(Keyword::Join).space();
        self.source.write_tokens(ts, dialect);
        ts.space().push(Keyword::On).space();
        self.on.write_tokens(ts, dialect);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

/// An ORDER BY term. Without a direction the engine default applies.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub expr: Expr,
    pub dir: Option<SortDir>,
}

impl OrderItem {
    pub fn new(expr: Expr) -> Self {
        Self { expr, dir: None }
    }

    pub fn asc(expr: Expr) -> Self {
        Self::new(expr).direction(SortDir::Asc)
    }

    pub fn desc(expr: Expr) -> Self {
        Self::new(expr).direction(SortDir::Desc)
    }

    fn direction(mut self, dir: SortDir) -> Self {
        self.dir = Some(dir);
        self
    }
}

impl ToTokens for OrderItem {
    fn write_tokens(&self, ts: &mut TokenStream, dialect: Dialect) {
        self.expr.write_tokens(ts, dialect);
        if let Some(dir) = self.dir {
            ts.space().push(match dir {
                SortDir::Asc => Keyword::Asc,
                SortDir::Desc => Keyword::Desc,
            });
        }
    }
}

/// Row window; the dialect picks `LIMIT/OFFSET` or `OFFSET/FETCH`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LimitOffset {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl ToTokens for LimitOffset {
    fn write_tokens(&self, ts: &mut TokenStream, dialect: Dialect) {
        ts.append(&dialect.emit_limit_offset(self.limit, self.offset));
    }
}

/// Group of expressions inside `ROLLUP(...)`.
struct RollupGroup<'a>(&'a [Expr]);

impl ToTokens for RollupGroup<'_> {
    fn write_tokens(&self, ts: &mut TokenStream, dialect: Dialect) {
        ts.lparen();
        write_list(ts, self.0, dialect);
        ts.rparen();
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
#[must_use = "a query does nothing until rendered with to_sql()"]
pub struct Query {
    pub select: Vec<SelectItem>,
    pub distinct: bool,
    pub from: Option<TableSource>,
    pub joins: Vec<Join>,
    pub where_clause: Option<Expr>,
    pub group_by: Vec<Expr>,
    /// Grouping sets rolled up after the plain GROUP BY terms, one group
    /// per rolled-up dimension.
    pub rollup: Vec<Vec<Expr>>,
    pub having: Option<Expr>,
    pub order_by: Vec<OrderItem>,
    pub limit_offset: Option<LimitOffset>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column(mut self, item: impl Into<SelectItem>) -> Self {
        self.select.push(item.into());
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn from(mut self, source: impl Into<TableSource>) -> Self {
        self.from = Some(source.into());
        self
    }

    pub fn join(mut self, join_type: JoinType, source: impl Into<TableSource>, on: Expr) -> Self {
        self.joins.push(Join {
            join_type,
            source: source.into(),
            on,
        });
        self
    }

    pub fn left_join(self, source: impl Into<TableSource>, on: Expr) -> Self {
        self.join(JoinType::Left, source, on)
    }

    /// AND `condition` into the WHERE clause.
    pub fn filter(mut self, condition: Expr) -> Self {
        self.where_clause = Some(conjoin(self.where_clause.take(), condition));
        self
    }

    pub fn group_by(mut self, exprs: Vec<Expr>) -> Self {
        self.group_by = exprs;
        self
    }

    pub fn rollup(mut self, groups: Vec<Vec<Expr>>) -> Self {
        self.rollup = groups;
        self
    }

    /// AND `condition` into the HAVING clause.
    pub fn having(mut self, condition: Expr) -> Self {
        self.having = Some(conjoin(self.having.take(), condition));
        self
    }

    pub fn order_by(mut self, items: Vec<OrderItem>) -> Self {
        self.order_by = items;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit_offset.get_or_insert_with(LimitOffset::default).limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.limit_offset.get_or_insert_with(LimitOffset::default).offset = Some(offset);
        self
    }

    pub fn to_sql(&self, dialect: Dialect) -> String {
        self.to_tokens(dialect).serialize(dialect)
    }

    fn write_group_by(&self, ts: &mut TokenStream, dialect: Dialect) {
        if self.group_by.is_empty() && self.rollup.is_empty() {
            return;
        }
        ts.newline().push(Keyword::GroupBy).space();
        write_list(ts, &self.group_by, dialect);
        if self.rollup.is_empty() {
            return;
        }
        if !self.group_by.is_empty() {
            ts.comma().space();
        }
        let groups: Vec<RollupGroup<'_>> = self.rollup.iter().map(|g| RollupGroup(g)).collect();
        ts.push(Keyword::Rollup).lparen();
        write_list(ts, &groups, dialect);
        ts.rparen();
    }

    fn write_order_by(&self, ts: &mut TokenStream, dialect: Dialect) {
        if !self.order_by.is_empty() {
            ts.newline().push(Keyword::OrderBy).space();
            write_list(ts, &self.order_by, dialect);
        } else if self.limit_offset.is_some() && dialect.requires_order_by_for_offset() {
            // OFFSET ... FETCH is only legal after an ORDER BY.
            ts.newline()
                .push(Keyword::OrderBy)
                .space()
                .lparen()
                .push(Keyword::Select)
                .space()
                .push(Keyword::Null)
                .rparen();
        }
    }
}

fn conjoin(existing: Option<Expr>, condition: Expr) -> Expr {
    match existing {
        Some(existing) => existing.and(condition),
        None => condition,
    }
}

impl ToTokens for Query {
    /// Each clause starts on its own line; select items are indented one level.
    fn write_tokens(&self, ts: &mut TokenStream, dialect: Dialect) {
        ts.push(Keyword::Select);
        if self.distinct {
            ts.space().push(Keyword::Distinct);
        }
        for (i, item) in self.select.iter().enumerate() {
            if i > 0 {
                ts.comma();
            }
            ts.newline().indent(1);
            item.write_tokens(ts, dialect);
        }

        if let Some(from) = &self.from {
            ts.newline().push(Keyword::From).space();
            from.write_tokens(ts, dialect);
        }
        for join in &self.joins {
            ts.newline();
            join.write_tokens(ts, dialect);
        }
        if let Some(condition) = &self.where_clause {
            ts.newline().push(Keyword::Where).space();
            condition.write_tokens(ts, dialect);
        }

        self.write_group_by(ts, dialect);

        if let Some(condition) = &self.having {
            ts.newline().push(Keyword::Having).space();
            condition.write_tokens(ts, dialect);
        }

        self.write_order_by(ts, dialect);

        if let Some(page) = &self.limit_offset {
            ts.newline();
            page.write_tokens(ts, dialect);
        }
    }
}
