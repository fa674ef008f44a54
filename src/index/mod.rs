//! Secondary index structure for Cellar tables.
//!
//! An [`Index`] maps the value of an indexed expression (the primary-key
//! column, for indexes synthesised by `CREATE TABLE`) to positions in the
//! owning table's row vector. Entries live in a balanced ordered tree keyed
//! by the cell's raw bytes, compared lexicographically, with the row index
//! as a tie-breaker so non-unique indexes can hold duplicate values.
//!
//! ## Ordering caveat
//!
//! Big-endian two's-complement integers order correctly under byte
//! comparison only for the non-negative range; the sign bit makes negative
//! values compare greater than positive ones. Range walks over columns
//! containing negative integers therefore return wrong row sets. This is a
//! known limitation of the cell encoding.

use std::collections::BTreeSet;
use std::ops::Bound;

use tracing::debug;

use crate::error::{CellarError, Result};
use crate::sql::ast::Expression;
use crate::sql::lexer::TokenKind;
use crate::types::Cell;

/// The comparison operators an index can serve.
const SUPPORTED_OPERATORS: &[&str] = &["=", "!=", ">", ">=", "<", "<="];

/// One tree entry: an indexed value and the row position it came from.
///
/// The derived ordering compares the value bytes first and the row index
/// second, so equal values from different rows coexist in the tree.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct TreeItem {
    value: Cell,
    row: usize,
}

/// A secondary index over one expression of a table.
#[derive(Debug, Clone)]
pub struct Index {
    /// Index name, unique within the owning table (`<table>_pkey` for
    /// primary-key indexes).
    pub name: String,
    /// The indexed expression; a literal identifier naming the column for
    /// indexes created alongside a primary key.
    pub expr: Expression,
    /// Whether values must be distinct under byte-wise comparison.
    pub unique: bool,
    /// Whether this index backs the table's primary key.
    pub primary_key: bool,
    tree: BTreeSet<TreeItem>,
}

impl Index {
    /// Create an empty index over the given expression.
    pub fn new(name: impl Into<String>, expr: Expression, unique: bool, primary_key: bool) -> Self {
        Index {
            name: name.into(),
            expr,
            unique,
            primary_key,
            tree: BTreeSet::new(),
        }
    }

    /// Number of entries in the tree (one per indexed row).
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Whether the index holds no entries.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    // =======================================================================
    // Maintenance
    // =======================================================================

    /// Record the indexed value for a newly appended row.
    ///
    /// # Errors
    ///
    /// - [`CellarError::ViolatesNonNullConstraint`] when the value is nil.
    /// - [`CellarError::ViolatesUniqueConstraint`] when the index is unique
    ///   and the value is already present.
    pub fn add_row(&mut self, value: Option<Cell>, row: usize) -> Result<()> {
        let value = value.ok_or(CellarError::ViolatesNonNullConstraint)?;

        if self.unique && self.contains_value(&value) {
            return Err(CellarError::ViolatesUniqueConstraint);
        }

        self.tree.insert(TreeItem { value, row });
        Ok(())
    }

    /// Remove the entry for a row, used to unwind a failed insert.
    pub fn remove_row(&mut self, value: &Cell, row: usize) {
        self.tree.remove(&TreeItem {
            value: value.clone(),
            row,
        });
    }

    fn contains_value(&self, value: &Cell) -> bool {
        self.tree
            .range(value_range(value))
            .next()
            .is_some()
    }

    // =======================================================================
    // Query-time application
    // =======================================================================

    /// Decide whether a where-clause sub-expression can be served by this
    /// index, returning the probe value expression when it can.
    ///
    /// The sub-expression is accepted when it is binary, its left operand's
    /// generated code equals the indexed expression's generated code, its
    /// operator is one of the supported comparisons, and its right operand
    /// is a plain value literal (not a column reference).
    pub fn applicable_value<'a>(&self, expr: &'a Expression) -> Option<&'a Expression> {
        let binary = match expr {
            Expression::Binary(binary) => binary,
            Expression::Literal(_) => return None,
        };

        if binary.left.generate_code() != self.expr.generate_code() {
            return None;
        }

        if !SUPPORTED_OPERATORS.contains(&binary.op.value.as_str()) {
            return None;
        }

        match &binary.right {
            Expression::Literal(token)
                if matches!(
                    token.kind,
                    TokenKind::Numeric | TokenKind::String | TokenKind::Bool
                ) =>
            {
                Some(&binary.right)
            }
            _ => {
                debug!(index = %self.name, "index probes support only plain literal values");
                None
            }
        }
    }

    /// Walk the tree for rows matching `op` against the probe value,
    /// returning row positions in tree-walk order.
    ///
    /// Equality and the greater-than family ascend from the value; the
    /// less-than family descends, so those results come back in descending
    /// value order.
    pub fn scan(&self, op: &str, value: &Cell) -> Vec<usize> {
        match op {
            "=" => self
                .tree
                .range(value_range(value))
                .map(|item| item.row)
                .collect(),
            "!=" => self
                .tree
                .iter()
                .filter(|item| item.value != *value)
                .map(|item| item.row)
                .collect(),
            "<" => self
                .tree
                .range((Bound::Unbounded, Bound::Excluded(first_entry(value))))
                .rev()
                .map(|item| item.row)
                .collect(),
            "<=" => self
                .tree
                .range((Bound::Unbounded, Bound::Included(last_entry(value))))
                .rev()
                .map(|item| item.row)
                .collect(),
            ">" => self
                .tree
                .range((Bound::Excluded(last_entry(value)), Bound::Unbounded))
                .map(|item| item.row)
                .collect(),
            ">=" => self
                .tree
                .range((Bound::Included(first_entry(value)), Bound::Unbounded))
                .map(|item| item.row)
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// The smallest tree entry that could carry `value` (row 0).
fn first_entry(value: &Cell) -> TreeItem {
    TreeItem {
        value: value.clone(),
        row: 0,
    }
}

/// The largest tree entry that could carry `value` (row `usize::MAX`).
fn last_entry(value: &Cell) -> TreeItem {
    TreeItem {
        value: value.clone(),
        row: usize::MAX,
    }
}

/// The inclusive range covering every entry with exactly `value`.
fn value_range(value: &Cell) -> (Bound<TreeItem>, Bound<TreeItem>) {
    (
        Bound::Included(first_entry(value)),
        Bound::Included(last_entry(value)),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
