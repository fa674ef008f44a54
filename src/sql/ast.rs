//! Abstract syntax tree definitions for Cellar SQL.
//!
//! Every statement parsed by [`super::parser::Parser`] is represented as a
//! tree of the types defined here. Leaf nodes keep their originating
//! [`Token`]s so the executor can report source locations and re-use the
//! token's textual value for display names.

use crate::sql::lexer::{Token, TokenKind};

/// A top-level SQL statement.
#[derive(Debug, Clone)]
pub enum Statement {
    Select(SelectStatement),
    Insert(InsertStatement),
    CreateTable(CreateTableStatement),
}

/// A `SELECT` statement.
#[derive(Debug, Clone)]
pub struct SelectStatement {
    /// Ordered projection list.
    pub items: Vec<SelectItem>,
    /// The token naming the source table, when a `FROM` clause is present.
    pub from: Option<Token>,
    /// The filter expression, when a `WHERE` clause is present.
    pub where_clause: Option<Expression>,
}

/// A single item in the SELECT projection list.
#[derive(Debug, Clone)]
pub enum SelectItem {
    /// A bare `*`, expanded to the source table's columns at execution time.
    Asterisk,
    /// An arbitrary expression, optionally aliased (`expr AS alias`).
    Expression {
        expr: Expression,
        alias: Option<Token>,
    },
}

/// An `INSERT` statement. Values are positional.
#[derive(Debug, Clone)]
pub struct InsertStatement {
    pub table: Token,
    pub values: Vec<Expression>,
}

/// A `CREATE TABLE` statement.
#[derive(Debug, Clone)]
pub struct CreateTableStatement {
    pub name: Token,
    pub cols: Vec<ColumnDefinition>,
}

/// A column definition inside `CREATE TABLE`.
///
/// The type is kept as the raw keyword token; it is validated against the
/// supported column types when the statement executes, not when it parses.
#[derive(Debug, Clone)]
pub struct ColumnDefinition {
    pub name: Token,
    pub data_type: Token,
    pub primary_key: bool,
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

/// An expression node: either a single literal token or a binary operation.
#[derive(Debug, Clone)]
pub enum Expression {
    /// A single token of identifier, numeric, string, or boolean kind.
    Literal(Token),
    /// A binary operation over two sub-expressions.
    Binary(Box<BinaryExpression>),
}

/// A binary operation. The operator is kept as its token so binding power
/// and display both come straight from the lexed form.
#[derive(Debug, Clone)]
pub struct BinaryExpression {
    pub left: Expression,
    pub right: Expression,
    pub op: Token,
}

impl Expression {
    /// Render the expression in its canonical textual form.
    ///
    /// This is the form the index layer compares when deciding whether a
    /// where-clause sub-expression targets an indexed column: identifiers
    /// render double-quoted, other literals render as their raw value, and
    /// binary expressions render parenthesised.
    pub fn generate_code(&self) -> String {
        match self {
            Expression::Literal(token) => match token.kind {
                TokenKind::Identifier => format!("\"{}\"", token.value),
                _ => token.value.clone(),
            },
            Expression::Binary(binary) => format!(
                "({} {} {})",
                binary.left.generate_code(),
                binary.op.value,
                binary.right.generate_code()
            ),
        }
    }

    /// The token text used when synthesising a display column name for a
    /// binary expression. Literal children contribute their token value;
    /// binary children fall back to their generated code (best-effort,
    /// display only).
    pub fn display_fragment(&self) -> String {
        match self {
            Expression::Literal(token) => token.value.clone(),
            Expression::Binary(_) => self.generate_code(),
        }
    }
}
