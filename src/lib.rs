//! # Cellar
//!
//! An embedded, in-memory relational query engine. Cellar ingests a small
//! SQL dialect (CREATE TABLE, INSERT, SELECT with optional filtering),
//! compiles it through a hand-written lexer and recursive-descent parser,
//! and executes it against row-oriented tables held entirely in process
//! memory. Tables declaring a primary key get a unique secondary index that
//! prunes rows during filtered selects.
//!
//! ```
//! use cellar::Database;
//!
//! let mut db = Database::new();
//! db.execute("CREATE TABLE users (id INT PRIMARY KEY, name TEXT);").unwrap();
//! db.execute("INSERT INTO users VALUES (1, 'Alice');").unwrap();
//!
//! let results = db.query("SELECT name FROM users WHERE id = 1;").unwrap();
//! assert_eq!(results.rows[0][0].as_text(), "Alice");
//! ```
//!
//! Cellar is single-threaded by design: exactly one statement executes at a
//! time, and all state lives in the [`Catalog`] owned by the caller (or by
//! the [`Database`] facade wrapping it).

pub mod catalog;
pub mod error;
pub mod execution;
pub mod index;
pub mod sql;
pub mod types;

pub use catalog::Catalog;
pub use error::{CellarError, Result};
pub use execution::{ResultColumn, Results};
pub use sql::{parse, Statement};
pub use types::{Cell, ColumnType};

use crate::execution::execute_statement;

/// A convenience facade bundling a [`Catalog`] with statement dispatch.
#[derive(Debug, Default)]
pub struct Database {
    catalog: Catalog,
}

impl Database {
    /// Create an empty in-memory database.
    pub fn new() -> Self {
        Database::default()
    }

    /// Run one parsed statement. Select statements return `Some(Results)`;
    /// table creation and insertion return `None`.
    pub fn run_statement(&mut self, stmt: &Statement) -> Result<Option<Results>> {
        execute_statement(stmt, &mut self.catalog)
    }

    /// Parse and run every statement in `source`, returning the number of
    /// rows inserted. Results from any select statements are discarded;
    /// use [`Database::query`] to read them.
    pub fn execute(&mut self, source: &str) -> Result<usize> {
        let mut inserted = 0;
        for stmt in parse(source)? {
            let is_insert = matches!(stmt, Statement::Insert(_));
            self.run_statement(&stmt)?;
            if is_insert {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    /// Parse and run every statement in `source`, returning the last select
    /// statement's results (or an empty result set when none is a select).
    pub fn query(&mut self, source: &str) -> Result<Results> {
        let mut results = Results::default();
        for stmt in parse(source)? {
            if let Some(r) = self.run_statement(&stmt)? {
                results = r;
            }
        }
        Ok(results)
    }

    /// Direct access to the underlying catalog.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }
}
