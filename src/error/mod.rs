//! Unified error handling for Cellar.
//!
//! This module defines [`CellarError`], the single error type propagated
//! throughout every layer of the engine -- from the lexer and parser,
//! through the catalog and executor, up to the public API surface.
//!
//! A convenience [`Result<T>`] type alias is re-exported so that callers can
//! write `Result<T>` instead of `std::result::Result<T, CellarError>`.

use thiserror::Error;

use crate::sql::lexer::Location;

/// The canonical error type for all Cellar operations.
///
/// Every fallible function in the codebase returns this type (via the
/// [`Result`] alias). Variants are organised by subsystem so that callers
/// can match on the error category without inspecting free-form strings.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CellarError {
    /// The lexer hit input no sub-lexer recognises. Carries the location of
    /// the first unrecognised character and, when any tokens were produced,
    /// the value of the last one as context.
    #[error("Unable to lex tokens{}, at {loc}", .after.as_ref().map(|v| format!(" after {v}")).unwrap_or_default())]
    LexError {
        /// Value of the last successfully lexed token, if any.
        after: Option<String>,
        /// Location of the first unrecognised input.
        loc: Location,
    },

    /// The token stream could not be parsed into a valid statement.
    #[error("[{loc}]: {hint}, near: {near}")]
    ParseError {
        /// Location of the offending token.
        loc: Location,
        /// Human-readable description of what the parser expected.
        hint: String,
        /// Textual form of the token the parser stopped at.
        near: String,
    },

    /// The referenced table does not exist in the catalog.
    #[error("Table does not exist")]
    TableDoesNotExist,

    /// A table with the given name already exists.
    #[error("Table already exists")]
    TableAlreadyExists,

    /// The referenced column does not exist in the target table.
    #[error("Column does not exist")]
    ColumnDoesNotExist,

    /// A projection item cannot be produced (e.g. `*` with no FROM table).
    #[error("Select item is not valid")]
    InvalidSelectItem,

    /// A column was declared with a type keyword that is not `int` or `text`.
    #[error("Invalid datatype")]
    InvalidDatatype,

    /// An INSERT supplied a value list whose arity differs from the table's
    /// column count.
    #[error("Missing values")]
    MissingValues,

    /// An expression could not be evaluated to a cell (unknown operator,
    /// malformed literal).
    #[error("Cell is invalid")]
    InvalidCell,

    /// A binary operator was applied to operands of the wrong types.
    #[error("Operands are invalid")]
    InvalidOperands,

    /// An index with the given name already exists on the table.
    #[error("Index already exists")]
    IndexAlreadyExists,

    /// More than one column in a CREATE TABLE carried the PRIMARY KEY flag.
    #[error("Primary key already exists")]
    PrimaryKeyAlreadyExists,

    /// A nil value was offered to an index.
    #[error("Violates non-null constraint")]
    ViolatesNonNullConstraint,

    /// A duplicate value was offered to a unique index.
    #[error("Violates unique constraint")]
    ViolatesUniqueConstraint,
}

/// A specialised [`Result`] type for Cellar operations.
///
/// This is defined as a convenience so that every function in the codebase
/// can simply return `Result<T>` rather than spelling out the full
/// `std::result::Result<T, CellarError>`.
pub type Result<T> = std::result::Result<T, CellarError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lex_error_message_with_context() {
        let err = CellarError::LexError {
            after: Some("select".into()),
            loc: Location { line: 0, col: 7 },
        };
        assert_eq!(err.to_string(), "Unable to lex tokens after select, at 0:7");
    }

    #[test]
    fn lex_error_message_without_context() {
        let err = CellarError::LexError {
            after: None,
            loc: Location { line: 2, col: 0 },
        };
        assert_eq!(err.to_string(), "Unable to lex tokens, at 2:0");
    }

    #[test]
    fn parse_error_message_cites_location_and_token() {
        let err = CellarError::ParseError {
            loc: Location { line: 0, col: 12 },
            hint: "Expected table name".into(),
            near: "values".into(),
        };
        assert_eq!(err.to_string(), "[0:12]: Expected table name, near: values");
    }

    #[test]
    fn display_messages_are_human_readable() {
        let cases: Vec<(CellarError, &str)> = vec![
            (CellarError::TableDoesNotExist, "Table does not exist"),
            (CellarError::TableAlreadyExists, "Table already exists"),
            (CellarError::ColumnDoesNotExist, "Column does not exist"),
            (CellarError::InvalidSelectItem, "Select item is not valid"),
            (CellarError::InvalidDatatype, "Invalid datatype"),
            (CellarError::MissingValues, "Missing values"),
            (CellarError::InvalidCell, "Cell is invalid"),
            (CellarError::InvalidOperands, "Operands are invalid"),
            (CellarError::IndexAlreadyExists, "Index already exists"),
            (
                CellarError::PrimaryKeyAlreadyExists,
                "Primary key already exists",
            ),
            (
                CellarError::ViolatesNonNullConstraint,
                "Violates non-null constraint",
            ),
            (
                CellarError::ViolatesUniqueConstraint,
                "Violates unique constraint",
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn errors_are_matchable_at_the_call_site() {
        fn fails() -> Result<()> {
            Err(CellarError::MissingValues)
        }

        assert!(matches!(fails().unwrap_err(), CellarError::MissingValues));
    }
}
