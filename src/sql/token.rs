//! Rendered SQL is built as a flat list of tokens.
//!
//! Keywords and symbols are fixed text. Identifiers and literals defer to the
//! target dialect for quoting, so the same stream renders differently for
//! each engine.

use super::dialect::{Dialect, SqlDialect};

/// Reserved words, including the multi-word forms the compiler emits as one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Select,
    Distinct,
    From,
    Where,
    And,
    Or,
    Not,
    As,
    On,
    Join,
    Inner,
    Left,
    Right,
    Full,
    Outer,
    GroupBy,
    Rollup,
    Having,
    OrderBy,
    Asc,
    Desc,
    Limit,
    Offset,
    Fetch,
    Next,
    Rows,
    Only,
    In,
    Between,
    Like,
    Interval,
    Null,
    True,
    False,
}

impl Keyword {
    pub fn as_str(self) -> &'static str {
        use Keyword::*;
        match self {
            Select => "SELECT",
            Distinct => "DISTINCT",
            From => "FROM",
            Where => "WHERE",
            And => "AND",
            Or => "OR",
            Not => "NOT",
            As => "AS",
            On => "ON",
            Join => "JOIN",
            Inner => "INNER",
            Left => "LEFT",
            Right => "RIGHT",
            Full => "FULL",
            Outer => "OUTER",
            GroupBy => "GROUP BY",
            Rollup => "ROLLUP",
            Having => "HAVING",
            OrderBy => "ORDER BY",
            Asc => "ASC",
            Desc => "DESC",
            Limit => "LIMIT",
            Offset => "OFFSET",
            Fetch => "FETCH",
            Next => "NEXT",
            Rows => "ROWS",
            Only => "ONLY",
            In => "IN",
            Between => "BETWEEN",
            Like => "LIKE",
            Interval => "INTERVAL",
            Null => "NULL",
            True => "TRUE",
            False => "FALSE",
        }
    }
}

/// Punctuation and operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    Comma,
    Dot,
    LParen,
    RParen,
    Eq,
    Ne,
    Lt,
    Gt,
    Lte,
    Gte,
    Plus,
    Minus,
    Mul,
    Div,
    Mod,
}

impl Symbol {
    pub fn as_str(self) -> &'static str {
        use Symbol::*;
        match self {
            Comma => ",",
            Dot => ".",
            Mul => "*",
            LParen => "(",
            RParen => ")",
            Eq => "=",
            Ne => "<>",
            Lt => "<",
            Gt => ">",
            Lte => "<=",
            Gte => ">=",
            Plus => "+",
            Minus => "-",
            Div => "/",
            Mod => "%",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Keyword(Keyword),
    Symbol(Symbol),

    Space,
    Newline,
    /// Two spaces per level.
    Indent(usize),

    /// Table, column or alias name; quoted by the dialect.
    Ident(String),
    /// `schema.table`, or a bare table when no schema is set.
    QualifiedIdent {
        schema: Option<String>,
        name: String,
    },
    LitInt(i64),
    LitFloat(f64),
    LitString(String),
    LitBool(bool),

    /// Rendered upper-case.
    FunctionName(String),

    /// Emitted verbatim. Only for trusted fragments: date-part keywords and
    /// expressions written by the schema author. Never for request input.
    Raw(String),
}

impl From<Keyword> for Token {
    fn from(keyword: Keyword) -> Self {
        Token::Keyword(keyword)
    }
}

impl From<Symbol> for Token {
    fn from(symbol: Symbol) -> Self {
        Token::Symbol(symbol)
    }
}

impl Token {
    /// Render this token for `dialect`.
    pub fn serialize(&self, dialect: Dialect) -> String {
        match self {
            Token::Keyword(k) => k.as_str().to_string(),
            Token::Symbol(s) => s.as_str().to_string(),
            Token::Space => " ".to_string(),
            Token::Newline => "\n".to_string(),
            Token::Indent(level) => "  ".repeat(*level),
            Token::Ident(name) => dialect.quote_identifier(name),
            Token::QualifiedIdent { schema, name } => {
                let name = dialect.quote_identifier(name);
                match schema {
                    Some(schema) => format!("{}.{name}", dialect.quote_identifier(schema)),
                    None => name,
                }
            }
            Token::LitInt(n) => n.to_string(),
            Token::LitFloat(f) if f.is_finite() => ryu::Buffer::new().format(*f).to_string(),
            // NaN and infinities have no literal form.
            Token::LitFloat(_) => Keyword::Null.as_str().to_string(),
            Token::LitString(s) => dialect.quote_string(s),
            Token::LitBool(b) => dialect.format_bool(*b).to_string(),
            Token::FunctionName(name) => name.to_uppercase(),
            Token::Raw(sql) => sql.clone(),
        }
    }
}

/// Ordered tokens, rendered by concatenation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, token: impl Into<Token>) -> &mut Self {
        self.tokens.push(token.into());
        self
    }

    pub fn append(&mut self, other: &TokenStream) -> &mut Self {
        self.tokens.extend_from_slice(&other.tokens);
        self
    }

    pub fn serialize(&self, dialect: Dialect) -> String {
        let mut sql = String::new();
        for token in &self.tokens {
            sql.push_str(&token.serialize(dialect));
        }
        sql
    }

    pub fn space(&mut self) -> &mut Self {
        self.push(Token::Space)
    }

    pub fn newline(&mut self) -> &mut Self {
        self.push(Token::Newline)
    }

    pub fn indent(&mut self, level: usize) -> &mut Self {
        self.push(Token::Indent(level))
    }

    pub fn comma(&mut self) -> &mut Self {
        self.push(Symbol::Comma)
    }

    pub fn lparen(&mut self) -> &mut Self {
        self.push(Symbol::LParen)
    }

    pub fn rparen(&mut self) -> &mut Self {
        self.push(Symbol::RParen)
    }
}

/// A SQL fragment that writes itself into a shared stream.
pub trait ToTokens {
    fn write_tokens(&self, ts: &mut TokenStream, dialect: Dialect);

    fn to_tokens(&self, dialect: Dialect) -> TokenStream {
        let mut ts = TokenStream::new();
        self.write_tokens(&mut ts, dialect);
        ts
    }
}

/// Writes `items` separated by `", "`.
pub fn write_list<T: ToTokens>(ts: &mut TokenStream, items: &[T], dialect: Dialect) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            ts.comma().space();
        }
        item.write_tokens(ts, dialect);
    }
}
