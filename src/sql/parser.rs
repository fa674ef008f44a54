//! Recursive-descent SQL parser for Cellar.
//!
//! The entry point is [`Parser::parse`], which tokenizes the input and then
//! parses one or more semicolon-terminated statements into a
//! `Vec<Statement>`. Statement alternatives are tried in a fixed order
//! (select, insert, create); an alternative commits once its leading
//! keyword is consumed, so errors are reported from the grammar the input
//! actually started.
//!
//! Expressions are parsed by precedence climbing: after a primary, binary
//! operators are consumed while their binding power meets the current
//! minimum, and each right-hand side is parsed with the minimum raised past
//! the operator's power so that chains of equal power left-associate.
//! Caller-supplied delimiter tokens (`FROM`, `WHERE`, `,`, `;`, `)`)
//! terminate an expression without error.

use crate::error::{CellarError, Result};
use crate::sql::ast::*;
use crate::sql::lexer::{Lexer, Location, Token, TokenKind};

/// A (kind, value) pair a surrounding grammar rule uses to end an
/// expression or list.
type Delimiter = (TokenKind, &'static str);

fn kw(value: &'static str) -> Delimiter {
    (TokenKind::Keyword, value)
}

fn sym(value: &'static str) -> Delimiter {
    (TokenKind::Symbol, value)
}

/// Binding power of a binary operator token; 0 for anything that is not a
/// recognised operator. `AND`/`OR` bind loosest so comparisons group under
/// them.
fn binding_power(token: &Token) -> u32 {
    match token.kind {
        TokenKind::Keyword => match token.value.as_str() {
            "and" | "or" => 1,
            _ => 0,
        },
        TokenKind::Symbol => match token.value.as_str() {
            "=" | "!=" | "||" | "+" => 3,
            _ => 0,
        },
        _ => 0,
    }
}

/// The operator tokens the expression grammar recognises. The comma is in
/// the list (at power 0) so expression-list contexts terminate cleanly.
const BINARY_OPERATORS: &[Delimiter] = &[
    (TokenKind::Keyword, "and"),
    (TokenKind::Keyword, "or"),
    (TokenKind::Symbol, "="),
    (TokenKind::Symbol, "!="),
    (TokenKind::Symbol, "||"),
    (TokenKind::Symbol, "+"),
    (TokenKind::Symbol, ","),
];

/// A recursive-descent parser that transforms a token stream into an AST.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// Parse a SQL string into a list of statements.
    ///
    /// Every statement must be followed by at least one semicolon.
    pub fn parse(source: &str) -> Result<Vec<Statement>> {
        let tokens = Lexer::new(source).tokenize()?;
        let mut parser = Parser { tokens, pos: 0 };
        let mut statements = Vec::new();

        while !parser.at_end() {
            statements.push(parser.parse_statement()?);

            let mut at_least_one_semicolon = false;
            while parser.consume(TokenKind::Symbol, ";").is_some() {
                at_least_one_semicolon = true;
            }
            if !at_least_one_semicolon {
                return Err(parser.error("Expected semi-colon delimiter between statements"));
            }
        }

        Ok(statements)
    }

    // =======================================================================
    // Token helpers
    // =======================================================================

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    /// Consume the current token if it matches the given kind and value.
    fn consume(&mut self, kind: TokenKind, value: &str) -> Option<Token> {
        match self.current() {
            Some(token) if token.is(kind, value) => {
                let token = token.clone();
                self.pos += 1;
                Some(token)
            }
            _ => None,
        }
    }

    /// Consume the current token if it has the given kind.
    fn consume_kind(&mut self, kind: TokenKind) -> Option<Token> {
        match self.current() {
            Some(token) if token.kind == kind => {
                let token = token.clone();
                self.pos += 1;
                Some(token)
            }
            _ => None,
        }
    }

    fn expect(&mut self, kind: TokenKind, value: &str, hint: &str) -> Result<Token> {
        self.consume(kind, value).ok_or_else(|| self.error(hint))
    }

    fn expect_kind(&mut self, kind: TokenKind, hint: &str) -> Result<Token> {
        self.consume_kind(kind).ok_or_else(|| self.error(hint))
    }

    /// Build a [`CellarError::ParseError`] citing the token the parser
    /// stopped at (or the last token when the input ended early).
    fn error(&self, hint: &str) -> CellarError {
        let token = self.tokens.get(self.pos).or_else(|| self.tokens.last());
        let (loc, near) = match token {
            Some(t) => (t.loc, t.value.clone()),
            None => (Location::default(), String::new()),
        };
        CellarError::ParseError {
            loc,
            hint: hint.into(),
            near,
        }
    }

    fn current_is_delimiter(&self, delimiters: &[Delimiter]) -> bool {
        match self.current() {
            Some(token) => delimiters.iter().any(|&(kind, value)| token.is(kind, value)),
            None => false,
        }
    }

    // =======================================================================
    // Statement dispatch
    // =======================================================================

    /// Try the statement alternatives in fixed order. Each alternative
    /// commits once its leading keyword matches.
    fn parse_statement(&mut self) -> Result<Statement> {
        if self.consume(TokenKind::Keyword, "select").is_some() {
            return Ok(Statement::Select(self.parse_select()?));
        }
        if self.consume(TokenKind::Keyword, "insert").is_some() {
            return Ok(Statement::Insert(self.parse_insert()?));
        }
        if self.consume(TokenKind::Keyword, "create").is_some() {
            return Ok(Statement::CreateTable(self.parse_create_table()?));
        }
        Err(self.error("Expected statement"))
    }

    // =======================================================================
    // SELECT
    // =======================================================================

    fn parse_select(&mut self) -> Result<SelectStatement> {
        let items = self.parse_select_items(&[kw("from"), kw("where"), sym(";")])?;

        let from = if self.consume(TokenKind::Keyword, "from").is_some() {
            Some(self.expect_kind(TokenKind::Identifier, "Expected FROM item")?)
        } else {
            None
        };

        let where_clause = if self.consume(TokenKind::Keyword, "where").is_some() {
            Some(self.parse_expression(&[sym(";")], 0)?)
        } else {
            None
        };

        Ok(SelectStatement {
            items,
            from,
            where_clause,
        })
    }

    fn parse_select_items(&mut self, delimiters: &[Delimiter]) -> Result<Vec<SelectItem>> {
        let mut items = Vec::new();

        loop {
            // Running out of tokens ends the list; the statement loop will
            // then demand its semicolon.
            if self.at_end() || self.current_is_delimiter(delimiters) {
                break;
            }

            if !items.is_empty() {
                self.expect(TokenKind::Symbol, ",", "Expected comma")?;
            }

            if self.consume(TokenKind::Symbol, "*").is_some() {
                items.push(SelectItem::Asterisk);
                continue;
            }

            let mut expr_delimiters = delimiters.to_vec();
            expr_delimiters.push(sym(","));
            expr_delimiters.push(kw("as"));
            let expr = self.parse_expression(&expr_delimiters, 0)?;

            let alias = if self.consume(TokenKind::Keyword, "as").is_some() {
                Some(self.expect_kind(TokenKind::Identifier, "Expected identifier after AS")?)
            } else {
                None
            };

            items.push(SelectItem::Expression { expr, alias });
        }

        Ok(items)
    }

    // =======================================================================
    // INSERT
    // =======================================================================

    fn parse_insert(&mut self) -> Result<InsertStatement> {
        self.expect(TokenKind::Keyword, "into", "Expected into")?;
        let table = self.expect_kind(TokenKind::Identifier, "Expected table name")?;
        self.expect(TokenKind::Keyword, "values", "Expected VALUES")?;
        self.expect(TokenKind::Symbol, "(", "Expected left paren")?;
        let values = self.parse_expressions(&[sym(")")])?;
        self.expect(TokenKind::Symbol, ")", "Expected right paren")?;

        Ok(InsertStatement { table, values })
    }

    fn parse_expressions(&mut self, delimiters: &[Delimiter]) -> Result<Vec<Expression>> {
        let mut expressions = Vec::new();

        loop {
            if self.at_end() {
                return Err(self.error("Expected expression"));
            }
            if self.current_is_delimiter(delimiters) {
                break;
            }

            if !expressions.is_empty() {
                self.expect(TokenKind::Symbol, ",", "Expected comma")?;
            }

            expressions.push(self.parse_expression(&[sym(","), sym(")")], 0)?);
        }

        Ok(expressions)
    }

    // =======================================================================
    // CREATE TABLE
    // =======================================================================

    fn parse_create_table(&mut self) -> Result<CreateTableStatement> {
        self.expect(TokenKind::Keyword, "table", "Expected TABLE keyword")?;
        let name = self.expect_kind(TokenKind::Identifier, "Expected table name")?;
        self.expect(TokenKind::Symbol, "(", "Expected left parenthesis")?;
        let cols = self.parse_column_definitions(&[sym(")")])?;
        self.expect(TokenKind::Symbol, ")", "Expected right parenthesis")?;

        Ok(CreateTableStatement { name, cols })
    }

    fn parse_column_definitions(
        &mut self,
        delimiters: &[Delimiter],
    ) -> Result<Vec<ColumnDefinition>> {
        let mut cols = Vec::new();

        loop {
            if self.at_end() {
                return Err(self.error("Expected column definition"));
            }
            if self.current_is_delimiter(delimiters) {
                break;
            }

            if !cols.is_empty() {
                self.expect(TokenKind::Symbol, ",", "Expected comma")?;
            }

            let name = self.expect_kind(TokenKind::Identifier, "Expected column name")?;
            // Any keyword is accepted here; the executor validates it
            // against the supported column types.
            let data_type = self.expect_kind(TokenKind::Keyword, "Expected column type")?;
            let primary_key = self.consume(TokenKind::Keyword, "primary key").is_some();

            cols.push(ColumnDefinition {
                name,
                data_type,
                primary_key,
            });
        }

        Ok(cols)
    }

    // =======================================================================
    // Expressions (precedence climbing)
    // =======================================================================

    fn parse_expression(&mut self, delimiters: &[Delimiter], min_bp: u32) -> Result<Expression> {
        let mut expr = if self.consume(TokenKind::Symbol, "(").is_some() {
            let mut inner_delimiters = delimiters.to_vec();
            inner_delimiters.push(sym(")"));
            let inner = self.parse_expression(&inner_delimiters, min_bp)?;
            self.expect(TokenKind::Symbol, ")", "Expected closing paren")?;
            inner
        } else {
            self.parse_literal_expression()?
        };

        let mut last_pos = self.pos;
        'outer: while !self.at_end() {
            if self.current_is_delimiter(delimiters) {
                break;
            }

            let mut op = None;
            for &(kind, value) in BINARY_OPERATORS {
                if let Some(token) = self.consume(kind, value) {
                    op = Some(token);
                    break;
                }
            }
            let op = match op {
                Some(op) => op,
                None => return Err(self.error("Expected binary operator")),
            };

            let bp = binding_power(&op);
            if bp < min_bp {
                self.pos = last_pos;
                break 'outer;
            }

            // Raising the minimum past this operator's power makes chains
            // of equal power left-associate.
            let right = self.parse_expression(delimiters, bp + 1)?;
            expr = Expression::Binary(Box::new(BinaryExpression {
                left: expr,
                right,
                op,
            }));
            last_pos = self.pos;
        }

        Ok(expr)
    }

    /// A literal expression is a single token of identifier, numeric,
    /// string, or boolean kind.
    fn parse_literal_expression(&mut self) -> Result<Expression> {
        for kind in [
            TokenKind::Identifier,
            TokenKind::Numeric,
            TokenKind::String,
            TokenKind::Bool,
        ] {
            if let Some(token) = self.consume_kind(kind) {
                return Ok(Expression::Literal(token));
            }
        }

        Err(self.error("Expected expression"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
