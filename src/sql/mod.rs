//! SQL front-end for Cellar.
//!
//! This module contains the lexer (tokenizer), abstract syntax tree (AST)
//! definitions, and a recursive-descent parser that transforms raw SQL text
//! into a structured AST suitable for execution.

pub mod ast;
pub mod lexer;
pub mod parser;

pub use ast::*;
pub use lexer::{Token, TokenKind};
pub use parser::Parser;

use crate::error::Result;

/// Parse a SQL source string into a list of statements.
///
/// This is the lexer + parser pipeline behind one call.
pub fn parse(source: &str) -> Result<Vec<Statement>> {
    Parser::parse(source)
}
