//! Table catalog for Cellar.
//!
//! The catalog is the central repository of engine state: a mapping from
//! table name to [`Table`], where each table owns its column metadata, its
//! rows, and any indexes attached to it. All mutation flows through the
//! executor while the caller waits; the catalog itself performs no
//! synchronisation.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{CellarError, Result};
use crate::index::Index;
use crate::sql::ast::{CreateTableStatement, Expression};
use crate::sql::lexer::{Token, TokenKind};
use crate::types::{Cell, ColumnType};

/// An in-memory table: parallel column name/type vectors, rows of cells,
/// and attached indexes.
///
/// Invariants: `columns.len() == column_types.len()`, and every row in
/// `rows` has exactly `columns.len()` cells.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub name: String,
    pub columns: Vec<String>,
    pub column_types: Vec<ColumnType>,
    pub rows: Vec<Vec<Cell>>,
    pub indexes: Vec<Index>,
}

impl Table {
    /// The synthetic table used when a statement has no source table: no
    /// columns, and a single empty row so self-contained expressions are
    /// evaluated exactly once.
    pub fn synthetic() -> Self {
        Table {
            rows: vec![Vec::new()],
            ..Table::default()
        }
    }

    /// Zero-based position of a column by name.
    pub fn find_column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// The catalog: every table the engine knows about, by name.
#[derive(Debug, Default)]
pub struct Catalog {
    tables: HashMap<String, Table>,
}

impl Catalog {
    /// Create a new, empty catalog.
    pub fn new() -> Self {
        Catalog::default()
    }

    /// Register the table described by a `CREATE TABLE` statement.
    ///
    /// Column types are resolved here (`int` and `text` are the creatable
    /// types); a column flagged `PRIMARY KEY` induces a unique index named
    /// `<table>_pkey` over that column. Creation is atomic: on any failure
    /// the catalog is left unchanged.
    ///
    /// # Errors
    ///
    /// - [`CellarError::TableAlreadyExists`] when the name is taken.
    /// - [`CellarError::InvalidDatatype`] for an unsupported type keyword.
    /// - [`CellarError::PrimaryKeyAlreadyExists`] when more than one column
    ///   carries the primary-key flag.
    pub fn create_table(&mut self, stmt: &CreateTableStatement) -> Result<()> {
        let name = stmt.name.value.clone();
        if self.tables.contains_key(&name) {
            return Err(CellarError::TableAlreadyExists);
        }

        let mut table = Table {
            name: name.clone(),
            ..Table::default()
        };

        let mut primary_key: Option<Token> = None;
        for col in &stmt.cols {
            let column_name = col.name.value.to_lowercase();

            let column_type = match col.data_type.value.as_str() {
                "int" => ColumnType::Int,
                "text" => ColumnType::Text,
                _ => return Err(CellarError::InvalidDatatype),
            };

            if col.primary_key {
                if primary_key.is_some() {
                    return Err(CellarError::PrimaryKeyAlreadyExists);
                }
                primary_key = Some(Token {
                    value: column_name.clone(),
                    kind: TokenKind::Identifier,
                    loc: col.name.loc,
                });
            }

            table.columns.push(column_name);
            table.column_types.push(column_type);
        }

        self.tables.insert(name.clone(), table);

        if let Some(pk) = primary_key {
            let index = Index::new(
                format!("{name}_pkey"),
                Expression::Literal(pk),
                true,
                true,
            );
            if let Err(err) = self.create_index(&name, index) {
                // Atomic create: the half-registered table must not survive.
                self.tables.remove(&name);
                return Err(err);
            }
        }

        debug!(table = %name, "created table");
        Ok(())
    }

    /// Attach an index to an existing table.
    ///
    /// There is no SQL surface for this; it is invoked by primary-key
    /// synthesis during [`Catalog::create_table`].
    ///
    /// # Errors
    ///
    /// - [`CellarError::TableDoesNotExist`] when the table is unknown.
    /// - [`CellarError::IndexAlreadyExists`] when the table already carries
    ///   an index with the same name.
    pub fn create_index(&mut self, table_name: &str, index: Index) -> Result<()> {
        let table = self
            .tables
            .get_mut(table_name)
            .ok_or(CellarError::TableDoesNotExist)?;

        if table.indexes.iter().any(|i| i.name == index.name) {
            return Err(CellarError::IndexAlreadyExists);
        }

        debug!(table = %table_name, index = %index.name, "created index");
        table.indexes.push(index);
        Ok(())
    }

    /// Immutable access to a table.
    ///
    /// # Errors
    ///
    /// Returns [`CellarError::TableDoesNotExist`] when the name is unknown.
    pub fn get(&self, name: &str) -> Result<&Table> {
        self.tables.get(name).ok_or(CellarError::TableDoesNotExist)
    }

    /// Mutable access to a table.
    ///
    /// # Errors
    ///
    /// Returns [`CellarError::TableDoesNotExist`] when the name is unknown.
    pub fn get_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.tables
            .get_mut(name)
            .ok_or(CellarError::TableDoesNotExist)
    }

    /// Whether a table with the given name exists.
    pub fn table_exists(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Names of every table currently in the catalog.
    pub fn list_tables(&self) -> Vec<&str> {
        self.tables.keys().map(|s| s.as_str()).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::ast::Statement;
    use crate::sql::parse;

    fn create_statement(source: &str) -> CreateTableStatement {
        match parse(source).unwrap().remove(0) {
            Statement::CreateTable(ct) => ct,
            other => panic!("expected create table, got {other:?}"),
        }
    }

    // =====================================================================
    // Table creation
    // =====================================================================

    #[test]
    fn create_table_records_columns_and_types() {
        let mut catalog = Catalog::new();
        catalog
            .create_table(&create_statement(
                "create table users (id int, name text);",
            ))
            .unwrap();

        let table = catalog.get("users").unwrap();
        assert_eq!(table.columns, vec!["id", "name"]);
        assert_eq!(table.column_types, vec![ColumnType::Int, ColumnType::Text]);
        assert!(table.rows.is_empty());
        assert!(table.indexes.is_empty());
    }

    #[test]
    fn duplicate_table_name_is_rejected() {
        let mut catalog = Catalog::new();
        let stmt = create_statement("create table t (a int);");
        catalog.create_table(&stmt).unwrap();
        assert_eq!(
            catalog.create_table(&stmt).unwrap_err(),
            CellarError::TableAlreadyExists
        );
    }

    #[test]
    fn invalid_datatype_leaves_catalog_unchanged() {
        let mut catalog = Catalog::new();
        let err = catalog
            .create_table(&create_statement("create table t (a int, b where);"))
            .unwrap_err();
        assert_eq!(err, CellarError::InvalidDatatype);
        assert!(!catalog.table_exists("t"));
    }

    #[test]
    fn two_primary_keys_are_rejected_atomically() {
        let mut catalog = Catalog::new();
        let err = catalog
            .create_table(&create_statement(
                "create table t (a int primary key, b int primary key);",
            ))
            .unwrap_err();
        assert_eq!(err, CellarError::PrimaryKeyAlreadyExists);
        assert!(!catalog.table_exists("t"));
    }

    #[test]
    fn primary_key_synthesises_a_unique_index() {
        let mut catalog = Catalog::new();
        catalog
            .create_table(&create_statement(
                "create table users (id int primary key, name text);",
            ))
            .unwrap();

        let table = catalog.get("users").unwrap();
        assert_eq!(table.indexes.len(), 1);
        let index = &table.indexes[0];
        assert_eq!(index.name, "users_pkey");
        assert!(index.unique);
        assert!(index.primary_key);
        assert_eq!(index.expr.generate_code(), "\"id\"");
    }

    // =====================================================================
    // Index creation
    // =====================================================================

    #[test]
    fn create_index_on_missing_table_fails() {
        let mut catalog = Catalog::new();
        let index = Index::new(
            "nope_pkey",
            Expression::Literal(Token {
                value: "id".into(),
                kind: TokenKind::Identifier,
                loc: Default::default(),
            }),
            true,
            true,
        );
        assert_eq!(
            catalog.create_index("nope", index).unwrap_err(),
            CellarError::TableDoesNotExist
        );
    }

    #[test]
    fn duplicate_index_name_is_rejected() {
        let mut catalog = Catalog::new();
        catalog
            .create_table(&create_statement("create table t (a int primary key);"))
            .unwrap();

        let duplicate = Index::new(
            "t_pkey",
            Expression::Literal(Token {
                value: "a".into(),
                kind: TokenKind::Identifier,
                loc: Default::default(),
            }),
            false,
            false,
        );
        assert_eq!(
            catalog.create_index("t", duplicate).unwrap_err(),
            CellarError::IndexAlreadyExists
        );
    }

    // =====================================================================
    // Lookup
    // =====================================================================

    #[test]
    fn get_missing_table_fails() {
        let catalog = Catalog::new();
        assert_eq!(
            catalog.get("users").unwrap_err(),
            CellarError::TableDoesNotExist
        );
    }

    #[test]
    fn list_tables_names_everything() {
        let mut catalog = Catalog::new();
        catalog
            .create_table(&create_statement("create table a (x int);"))
            .unwrap();
        catalog
            .create_table(&create_statement("create table b (y text);"))
            .unwrap();

        let mut names = catalog.list_tables();
        names.sort_unstable();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn synthetic_table_has_one_empty_row() {
        let table = Table::synthetic();
        assert!(table.columns.is_empty());
        assert_eq!(table.rows.len(), 1);
        assert!(table.rows[0].is_empty());
    }

    #[test]
    fn find_column_positions() {
        let mut catalog = Catalog::new();
        catalog
            .create_table(&create_statement("create table t (a int, b text);"))
            .unwrap();
        let table = catalog.get("t").unwrap();
        assert_eq!(table.find_column("a"), Some(0));
        assert_eq!(table.find_column("b"), Some(1));
        assert_eq!(table.find_column("c"), None);
    }
}
