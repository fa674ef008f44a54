//! Hand-written SQL tokenizer for Cellar.
//!
//! The [`Lexer`] takes a raw SQL string and produces a `Vec<Token>`. Each
//! token carries its textual value, a [`TokenKind`], and the source
//! [`Location`] it started at.
//!
//! Scanning is left-to-right. At every position the lexer tries, in order:
//! keyword, symbol, string literal, numeric literal, identifier. Each
//! sub-lexer is a pure function from (source, cursor) to an optional
//! (token, new cursor) pair and leaves the cursor untouched on failure.
//! Keywords and multi-character symbols are disambiguated by longest match,
//! so `>=` is one token and `primary key` is one keyword.
//!
//! Longest match carries no word-boundary rule: `integer` lexes as the
//! keyword `int` followed by the identifier `eger`.

use std::fmt;

use crate::error::{CellarError, Result};

// ---------------------------------------------------------------------------
// Keyword and symbol tables
// ---------------------------------------------------------------------------

/// Every recognised keyword, lowercased. `true` and `false` are lexed here
/// but emitted with [`TokenKind::Bool`].
pub const KEYWORDS: &[&str] = &[
    "select",
    "from",
    "as",
    "table",
    "create",
    "insert",
    "into",
    "values",
    "int",
    "text",
    "where",
    "and",
    "or",
    "true",
    "false",
    "primary key",
];

/// Every recognised symbol. Multi-character symbols win over their
/// single-character prefixes via longest match.
pub const SYMBOLS: &[&str] = &[
    ";", "*", ",", "(", ")", "=", "!=", ">", ">=", "<", "<=", "||", "+",
];

// ---------------------------------------------------------------------------
// Token types
// ---------------------------------------------------------------------------

/// The lexical class of a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// A reserved word such as `select` or `primary key`.
    Keyword,
    /// Punctuation or an operator such as `;` or `>=`.
    Symbol,
    /// A (possibly quoted) name.
    Identifier,
    /// A single-quoted string literal, quotes stripped and escapes resolved.
    String,
    /// A numeric literal, carried as the raw matched text.
    Numeric,
    /// The literals `true` and `false`.
    Bool,
}

/// A zero-based (line, column) position in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    pub line: u32,
    pub col: u32,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// A single SQL token.
#[derive(Debug, Clone)]
pub struct Token {
    /// The token's textual value. Keywords and unquoted identifiers are
    /// lowercased; string values have their delimiters stripped.
    pub value: String,
    pub kind: TokenKind,
    pub loc: Location,
}

impl Token {
    /// Whether this token has the given kind and value. Locations are
    /// ignored, so parser-side expectations compare cleanly.
    pub fn is(&self, kind: TokenKind, value: &str) -> bool {
        self.kind == kind && self.value == value
    }
}

// ---------------------------------------------------------------------------
// Cursor
// ---------------------------------------------------------------------------

/// Scanning position: a byte offset plus the human-facing location.
#[derive(Debug, Clone, Copy)]
struct Cursor {
    pointer: usize,
    loc: Location,
}

/// A sub-lexer: a pure function from (source, cursor) to an optional
/// (token, new cursor) pair. The cursor is untouched on failure.
type SubLexer = fn(&[u8], Cursor) -> Option<(Token, Cursor)>;

// ---------------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------------

/// A hand-written SQL tokenizer.
///
/// Create one with [`Lexer::new`], then call [`Lexer::tokenize`] to obtain
/// the full token stream.
pub struct Lexer<'a> {
    source: &'a str,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer over the given SQL text.
    pub fn new(source: &'a str) -> Self {
        Lexer { source }
    }

    /// Tokenize the entire input and return the token list.
    ///
    /// # Errors
    ///
    /// Returns [`CellarError::LexError`] at the first position no sub-lexer
    /// recognises, citing the last successfully lexed token as context.
    pub fn tokenize(&self) -> Result<Vec<Token>> {
        let source = self.source.as_bytes();
        let mut tokens = Vec::new();
        let mut cur = Cursor {
            pointer: 0,
            loc: Location::default(),
        };

        'outer: while cur.pointer < source.len() {
            // Whitespace is discarded; a newline resets the column and
            // advances the line counter.
            match source[cur.pointer] {
                b' ' | b'\t' => {
                    cur.pointer += 1;
                    cur.loc.col += 1;
                    continue;
                }
                b'\n' => {
                    cur.pointer += 1;
                    cur.loc.line += 1;
                    cur.loc.col = 0;
                    continue;
                }
                _ => {}
            }

            let sub_lexers: [SubLexer; 5] = [
                lex_keyword,
                lex_symbol,
                lex_string,
                lex_numeric,
                lex_identifier,
            ];
            for sub_lexer in sub_lexers {
                if let Some((token, new_cursor)) = sub_lexer(source, cur) {
                    cur = new_cursor;
                    tokens.push(token);
                    continue 'outer;
                }
            }

            return Err(CellarError::LexError {
                after: tokens.last().map(|t: &Token| t.value.clone()),
                loc: cur.loc,
            });
        }

        Ok(tokens)
    }
}

/// Convenience wrapper: tokenize `source` in one call.
pub fn lex(source: &str) -> Result<Vec<Token>> {
    Lexer::new(source).tokenize()
}

// ---------------------------------------------------------------------------
// Sub-lexers
// ---------------------------------------------------------------------------

/// Find the longest option that fully equals a lowercased window of the
/// source starting at `ic`. Options are eliminated once the window stops
/// being one of their prefixes or exceeds their length; ties on full
/// equality resolve to the longest option.
fn longest_match(source: &[u8], ic: Cursor, options: &[&'static str]) -> Option<&'static str> {
    let mut window = String::new();
    let mut skip = vec![false; options.len()];
    let mut best: Option<&'static str> = None;

    let mut pointer = ic.pointer;
    while pointer < source.len() {
        window.push(source[pointer].to_ascii_lowercase() as char);
        pointer += 1;

        for (i, option) in options.iter().enumerate() {
            if skip[i] {
                continue;
            }

            if *option == window {
                skip[i] = true;
                if best.map_or(true, |b| option.len() > b.len()) {
                    best = Some(option);
                }
                continue;
            }

            let shares_prefix = option.starts_with(&window);
            let too_long = window.len() > option.len();
            if too_long || !shares_prefix {
                skip[i] = true;
            }
        }

        if skip.iter().all(|&s| s) {
            break;
        }
    }

    best
}

fn lex_keyword(source: &[u8], ic: Cursor) -> Option<(Token, Cursor)> {
    let matched = longest_match(source, ic, KEYWORDS)?;

    let kind = if matched == "true" || matched == "false" {
        TokenKind::Bool
    } else {
        TokenKind::Keyword
    };

    let mut cur = ic;
    cur.pointer += matched.len();
    cur.loc.col += matched.len() as u32;

    Some((
        Token {
            value: matched.to_string(),
            kind,
            loc: ic.loc,
        },
        cur,
    ))
}

fn lex_symbol(source: &[u8], ic: Cursor) -> Option<(Token, Cursor)> {
    let matched = longest_match(source, ic, SYMBOLS)?;

    let mut cur = ic;
    cur.pointer += matched.len();
    cur.loc.col += matched.len() as u32;

    Some((
        Token {
            value: matched.to_string(),
            kind: TokenKind::Symbol,
            loc: ic.loc,
        },
        cur,
    ))
}

fn lex_string(source: &[u8], ic: Cursor) -> Option<(Token, Cursor)> {
    lex_character_delimited(source, ic, b'\'', TokenKind::String)
}

/// Scan a literal delimited by `delimiter`. A doubled delimiter inside the
/// literal stands for one literal delimiter character; there are no other
/// escapes. Fails (cursor untouched) when the literal is unterminated.
fn lex_character_delimited(
    source: &[u8],
    ic: Cursor,
    delimiter: u8,
    kind: TokenKind,
) -> Option<(Token, Cursor)> {
    if source.get(ic.pointer) != Some(&delimiter) {
        return None;
    }

    let mut cur = ic;
    cur.pointer += 1;
    cur.loc.col += 1;

    let mut value: Vec<u8> = Vec::new();
    while cur.pointer < source.len() {
        let c = source[cur.pointer];

        if c == delimiter {
            if source.get(cur.pointer + 1) == Some(&delimiter) {
                // Doubled delimiter: emit one and skip both.
                value.push(delimiter);
                cur.pointer += 2;
                cur.loc.col += 2;
                continue;
            }
            cur.pointer += 1;
            cur.loc.col += 1;
            return Some((
                Token {
                    value: String::from_utf8_lossy(&value).into_owned(),
                    kind,
                    loc: ic.loc,
                },
                cur,
            ));
        }

        value.push(c);
        cur.pointer += 1;
        cur.loc.col += 1;
    }

    None
}

fn lex_numeric(source: &[u8], ic: Cursor) -> Option<(Token, Cursor)> {
    let mut cur = ic;

    let mut found_period = false;
    let mut found_exp_marker = false;
    let mut found_digit = false;

    while cur.pointer < source.len() {
        let c = source[cur.pointer];

        let is_digit = c.is_ascii_digit();
        let is_period = c == b'.';
        let is_exp_marker = c == b'e';

        // The literal must start with a digit or a period.
        if cur.pointer == ic.pointer {
            if !is_digit && !is_period {
                return None;
            }
            found_period = is_period;
            found_digit = is_digit;
            cur.pointer += 1;
            cur.loc.col += 1;
            continue;
        }

        if is_period {
            if found_period {
                return None;
            }
            found_period = true;
            cur.pointer += 1;
            cur.loc.col += 1;
            continue;
        }

        if is_exp_marker {
            if found_exp_marker {
                return None;
            }

            // No periods allowed after the exponent marker.
            found_period = true;
            found_exp_marker = true;

            // The marker must not end the literal.
            if cur.pointer == source.len() - 1 {
                return None;
            }

            let next = source[cur.pointer + 1];
            if next == b'-' || next == b'+' {
                cur.pointer += 1;
                cur.loc.col += 1;
            }

            cur.pointer += 1;
            cur.loc.col += 1;
            continue;
        }

        if !is_digit {
            break;
        }
        found_digit = true;
        cur.pointer += 1;
        cur.loc.col += 1;
    }

    // Nothing consumed, or a bare period with no digits at all.
    if cur.pointer == ic.pointer || !found_digit {
        return None;
    }

    Some((
        Token {
            value: String::from_utf8_lossy(&source[ic.pointer..cur.pointer]).into_owned(),
            kind: TokenKind::Numeric,
            loc: ic.loc,
        },
        cur,
    ))
}

fn lex_identifier(source: &[u8], ic: Cursor) -> Option<(Token, Cursor)> {
    // Double-quoted identifiers preserve case and interior content.
    if let Some(hit) = lex_character_delimited(source, ic, b'"', TokenKind::Identifier) {
        return Some(hit);
    }

    let c = *source.get(ic.pointer)?;
    if !c.is_ascii_alphabetic() {
        return None;
    }

    let mut cur = ic;
    cur.pointer += 1;
    cur.loc.col += 1;

    let mut value = vec![c];
    while cur.pointer < source.len() {
        let c = source[cur.pointer];

        if c.is_ascii_alphanumeric() || c == b'$' || c == b'_' {
            value.push(c);
            cur.pointer += 1;
            cur.loc.col += 1;
            continue;
        }

        break;
    }

    Some((
        Token {
            value: String::from_utf8_lossy(&value).to_lowercase(),
            kind: TokenKind::Identifier,
            loc: ic.loc,
        },
        cur,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
