//! Expression trees for select lists, predicates and join criteria.
//!
//! Expressions are plain values: the compiler clones and rewrites them
//! freely, and only the dialect decides how they finally read.

use super::dialect::{Dialect, SqlDialect};
use super::query::SelectItem;
use super::token::{write_list, Keyword, Symbol, ToTokens, Token, TokenStream};
use super::types::TimeUnit;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `column` or `table.column`.
    Column {
        table: Option<String>,
        column: String,
    },
    Literal(Literal),
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },
    Function {
        name: String,
        args: Vec<Expr>,
        distinct: bool,
    },
    /// `expr [NOT] IN (values)`. An empty list renders as a constant.
    In {
        expr: Box<Expr>,
        values: Vec<Expr>,
        negated: bool,
    },
    /// Inclusive on both ends.
    Between {
        expr: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
    },
    /// A calendar interval; its spelling belongs to the dialect.
    Interval { amount: i64, unit: TimeUnit },
    /// Emitted verbatim. Schema authors write these; requests never do.
    Raw(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
}

impl Literal {
    fn token(&self) -> Token {
        match self {
            Literal::Int(n) => Token::LitInt(*n),
            Literal::Float(f) => Token::LitFloat(*f),
            Literal::String(s) => Token::LitString(s.clone()),
            Literal::Bool(b) => Token::LitBool(*b),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Eq,
    Ne,
    Lt,
    Gt,
    Lte,
    Gte,
    And,
    Or,
    Like,
    Plus,
    Minus,
    Mul,
    Div,
    Mod,
}

impl BinaryOperator {
    /// Higher binds tighter.
    fn precedence(self) -> u8 {
        use BinaryOperator::*;
        match self {
            Or => 1,
            And => 2,
            Eq | Ne | Lt | Gt | Lte | Gte | Like => 3,
            Plus | Minus => 4,
            Mul | Div | Mod => 5,
        }
    }

    /// `a op (b op c)` may drop its parentheses.
    fn is_associative(self) -> bool {
        matches!(
            self,
            BinaryOperator::And | BinaryOperator::Or | BinaryOperator::Plus | BinaryOperator::Mul
        )
    }

    fn token(self) -> Token {
        use BinaryOperator::*;
        let symbol = match self {
            And => return Keyword::And.into(),
            Or => return Keyword::Or.into(),
            Like => return Keyword::Like.into(),
            Eq => Symbol::Eq,
            Ne => Symbol::Ne,
            Lt => Symbol::Lt,
            Gt => Symbol::Gt,
            Lte => Symbol::Lte,
            Gte => Symbol::Gte,
            Plus => Symbol::Plus,
            Minus => Symbol::Minus,
            Mul => Symbol::Mul,
            Div => Symbol::Div,
            Mod => Symbol::Mod,
        };
        symbol.into()
    }
}

impl ToTokens for Expr {
    fn write_tokens(&self, ts: &mut TokenStream, dialect: Dialect) {
        match self {
            Expr::Column { table, column } => {
                if let Some(table) = table {
                    ts.push(Token::Ident(table.clone())).push(Symbol::Dot);
                }
                ts.push(Token::Ident(column.clone()));
            }
            Expr::Literal(lit) => {
                ts.push(lit.token());
            }
            Expr::BinaryOp { left, op, right } => {
                write_operand(ts, left, *op, false, dialect);
                ts.space().push(op.token()).space();
                write_operand(ts, right, *op, true, dialect);
            }
            Expr::Function {
                name,
                args,
                distinct,
            } => {
                ts.push(Token::FunctionName(name.clone())).lparen();
                if *distinct {
                    ts.push(Keyword::Distinct).space();
                }
                write_list(ts, args, dialect);
                ts.rparen();
            }
            Expr::In {
                expr,
                values,
                negated,
            } => {
                // `x IN ()` does not parse; no row is in an empty list.
                if values.is_empty() {
                    if dialect.numeric_booleans() {
                        let verdict = if *negated { 1 } else { 0 };
                        lit_int(1).eq(lit_int(verdict)).write_tokens(ts, dialect);
                    } else {
                        ts.push(if *negated { Keyword::True } else { Keyword::False });
                    }
                    return;
                }
                expr.write_tokens(ts, dialect);
                if *negated {
                    ts.space().push(Keyword::Not);
                }
                ts.space().push(Keyword::In).space().lparen();
                write_list(ts, values, dialect);
                ts.rparen();
            }
            Expr::Between { expr, low, high } => {
                expr.write_tokens(ts, dialect);
                ts.space().push(Keyword::Between).space();
                low.write_tokens(ts, dialect);
                ts.space().push(Keyword::And).space();
                high.write_tokens(ts, dialect);
            }
            Expr::Interval { amount, unit } => {
                ts.append(&dialect.emit_interval(*amount, *unit));
            }
            Expr::Raw(sql) => {
                ts.push(Token::Raw(sql.clone()));
            }
        }
    }
}

/// Parenthesize `child` when it binds looser than `parent`, or equally on
/// the right of a non-associative operator.
fn write_operand(
    ts: &mut TokenStream,
    child: &Expr,
    parent: BinaryOperator,
    right: bool,
    dialect: Dialect,
) {
    let wrap = match child {
        Expr::BinaryOp { op, .. } => {
            op.precedence() < parent.precedence()
                || (right && op.precedence() == parent.precedence() && !parent.is_associative())
        }
        _ => false,
    };
    if wrap {
        ts.lparen();
        child.write_tokens(ts, dialect);
        ts.rparen();
    } else {
        child.write_tokens(ts, dialect);
    }
}

impl Expr {
    pub fn to_sql(&self, dialect: Dialect) -> String {
        self.to_tokens(dialect).serialize(dialect)
    }

    /// Columns read by this expression, in order of appearance.
    ///
    /// Columns inside `Raw` fragments are invisible.
    pub fn columns(&self) -> Vec<(Option<&str>, &str)> {
        let mut found = Vec::new();
        self.visit(&mut |expr| {
            if let Expr::Column { table, column } = expr {
                found.push((table.as_deref(), column.as_str()));
            }
        });
        found
    }

    fn visit<'a>(&'a self, f: &mut impl FnMut(&'a Expr)) {
        f(self);
        match self {
            Expr::BinaryOp { left, right, .. } => {
                left.visit(f);
                right.visit(f);
            }
            Expr::Function { args, .. } => {
                for arg in args {
                    arg.visit(f);
                }
            }
            Expr::In { expr, values, .. } => {
                expr.visit(f);
                for value in values {
                    value.visit(f);
                }
            }
            Expr::Between { expr, low, high } => {
                expr.visit(f);
                low.visit(f);
                high.visit(f);
            }
            Expr::Column { .. } | Expr::Literal(_) | Expr::Interval { .. } | Expr::Raw(_) => {}
        }
    }

    /// Copy of this expression with every column for which `f` returns a
    /// replacement swapped out.
    pub fn map_columns<F>(&self, f: &F) -> Expr
    where
        F: Fn(Option<&str>, &str) -> Option<Expr>,
    {
        let map = |e: &Expr| Box::new(e.map_columns(f));
        let map_all = |es: &[Expr]| -> Vec<Expr> { es.iter().map(|e| e.map_columns(f)).collect() };
        match self {
            Expr::Column { table, column } => {
                f(table.as_deref(), column).unwrap_or_else(|| self.clone())
            }
            Expr::BinaryOp { left, op, right } => Expr::BinaryOp {
                left: map(left),
                op: *op,
                right: map(right),
            },
            Expr::Function {
                name,
                args,
                distinct,
            } => Expr::Function {
                name: name.clone(),
                args: map_all(args),
                distinct: *distinct,
            },
            Expr::In {
                expr,
                values,
                negated,
            } => Expr::In {
                expr: map(expr),
                values: map_all(values),
                negated: *negated,
            },
            Expr::Between { expr, low, high } => Expr::Between {
                expr: map(expr),
                low: map(low),
                high: map(high),
            },
            Expr::Literal(_) | Expr::Interval { .. } | Expr::Raw(_) => self.clone(),
        }
    }
}

// =============================================================================
// Constructors
// =============================================================================

pub fn col(name: &str) -> Expr {
    Expr::Column {
        table: None,
        column: name.into(),
    }
}

pub fn table_col(table: &str, column: &str) -> Expr {
    Expr::Column {
        table: Some(table.into()),
        column: column.into(),
    }
}

pub fn lit_int(n: i64) -> Expr {
    Expr::Literal(Literal::Int(n))
}

pub fn lit_float(f: f64) -> Expr {
    Expr::Literal(Literal::Float(f))
}

pub fn lit_str(s: &str) -> Expr {
    Expr::Literal(Literal::String(s.into()))
}

pub fn lit_bool(b: bool) -> Expr {
    Expr::Literal(Literal::Bool(b))
}

pub fn interval(amount: i64, unit: TimeUnit) -> Expr {
    Expr::Interval { amount, unit }
}

pub fn func(name: &str, args: Vec<Expr>) -> Expr {
    Expr::Function {
        name: name.into(),
        args,
        distinct: false,
    }
}

macro_rules! aggregates {
    ($($name:ident => $sql:literal),* $(,)?) => {
        $(
            #[doc = concat!("`", $sql, "(expr)`")]
            pub fn $name(expr: Expr) -> Expr {
                func($sql, vec![expr])
            }
        )*
    };
}

aggregates! {
    count => "COUNT",
    sum => "SUM",
    avg => "AVG",
    min => "MIN",
    max => "MAX",
}

pub fn count_distinct(expr: Expr) -> Expr {
    Expr::Function {
        name: "COUNT".into(),
        args: vec![expr],
        distinct: true,
    }
}

/// `NULLIF(expr, value)`: NULL where the two are equal.
pub fn nullif(expr: Expr, value: Expr) -> Expr {
    func("NULLIF", vec![expr, value])
}

/// Trusted SQL passed through untouched. Never build one from request input.
pub fn raw_sql(sql: &str) -> Expr {
    Expr::Raw(sql.into())
}

// =============================================================================
// Fluent operators
// =============================================================================

macro_rules! binary_methods {
    ($($name:ident => $op:ident),* $(,)?) => {
        $(
            fn $name(self, rhs: impl Into<Expr>) -> Expr {
                Expr::BinaryOp {
                    left: Box::new(self.into_expr()),
                    op: BinaryOperator::$op,
                    right: Box::new(rhs.into()),
                }
            }
        )*
    };
}

/// Operator methods for building expressions left to right.
pub trait ExprExt: Sized {
    fn into_expr(self) -> Expr;

    binary_methods! {
        eq => Eq,
        ne => Ne,
        lt => Lt,
        gt => Gt,
        lte => Lte,
        gte => Gte,
        and => And,
        or => Or,
        like => Like,
        add => Plus,
        sub => Minus,
        mul => Mul,
        div => Div,
        modulo => Mod,
    }

    fn in_list(self, values: Vec<Expr>) -> Expr {
        Expr::In {
            expr: Box::new(self.into_expr()),
            values,
            negated: false,
        }
    }

    fn not_in_list(self, values: Vec<Expr>) -> Expr {
        Expr::In {
            expr: Box::new(self.into_expr()),
            values,
            negated: true,
        }
    }

    fn between(self, low: impl Into<Expr>, high: impl Into<Expr>) -> Expr {
        Expr::Between {
            expr: Box::new(self.into_expr()),
            low: Box::new(low.into()),
            high: Box::new(high.into()),
        }
    }

    /// Select-list item named `name`.
    fn alias(self, name: &str) -> SelectItem {
        SelectItem::new(self.into_expr()).named(name)
    }
}

impl ExprExt for Expr {
    fn into_expr(self) -> Expr {
        self
    }
}

impl From<i64> for Expr {
    fn from(n: i64) -> Self {
        lit_int(n)
    }
}

impl From<i32> for Expr {
    fn from(n: i32) -> Self {
        lit_int(n.into())
    }
}

impl From<f64> for Expr {
    fn from(f: f64) -> Self {
        lit_float(f)
    }
}

impl From<bool> for Expr {
    fn from(b: bool) -> Self {
        lit_bool(b)
    }
}

impl From<&str> for Expr {
    fn from(s: &str) -> Self {
        lit_str(s)
    }
}

impl From<String> for Expr {
    fn from(s: String) -> Self {
        Expr::Literal(Literal::String(s))
    }
}
