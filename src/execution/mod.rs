//! # Execution Engine
//!
//! Executes parsed statements against the catalog. This module owns the
//! expression evaluator and the three statement operations: table creation,
//! row insertion, and row projection with optional filtering.
//!
//! A select runs in two stages. First the where clause is linearised into a
//! conjunction of sub-expressions (splitting on `AND`, stopping at `OR`) and
//! every sub-expression is offered to every index on the source table; each
//! accepted pair prunes the candidate row set via a tree walk. Second, the
//! surviving rows are scanned: the where clause is re-evaluated per row and
//! each projection expression is evaluated to a cell.

use std::collections::HashSet;

use tracing::debug;

use crate::catalog::{Catalog, Table};
use crate::error::{CellarError, Result};
use crate::sql::ast::{
    CreateTableStatement, Expression, InsertStatement, SelectItem, SelectStatement, Statement,
};
use crate::sql::lexer::{Token, TokenKind};
use crate::types::{Cell, ColumnType};

/// The synthesised column name for projection expressions that do not name
/// a column.
const ANONYMOUS_COLUMN: &str = "?column?";

// ---------------------------------------------------------------------------
// Result set
// ---------------------------------------------------------------------------

/// One column of a result set: display name plus inferred type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultColumn {
    pub name: String,
    pub column_type: ColumnType,
}

/// The outcome of a select: an ordered column list and the projected rows.
/// Every row has exactly `columns.len()` cells.
#[derive(Debug, Clone, Default)]
pub struct Results {
    pub columns: Vec<ResultColumn>,
    pub rows: Vec<Vec<Cell>>,
}

// ---------------------------------------------------------------------------
// Statement dispatch
// ---------------------------------------------------------------------------

/// Execute one statement against the catalog. Select statements return
/// `Some(Results)`; everything else returns `None`.
pub fn execute_statement(stmt: &Statement, catalog: &mut Catalog) -> Result<Option<Results>> {
    match stmt {
        Statement::CreateTable(ct) => {
            execute_create_table(ct, catalog)?;
            Ok(None)
        }
        Statement::Insert(ins) => {
            execute_insert(ins, catalog)?;
            Ok(None)
        }
        Statement::Select(slct) => Ok(Some(execute_select(slct, catalog)?)),
    }
}

// ---- CREATE TABLE ----

/// Register a new table (and its primary-key index, if declared).
pub fn execute_create_table(ct: &CreateTableStatement, catalog: &mut Catalog) -> Result<()> {
    catalog.create_table(ct)
}

// ---- INSERT ----

/// Append one row to a table.
///
/// Value expressions are evaluated against a synthetic source table, so only
/// self-contained expressions succeed; a column reference fails with
/// [`CellarError::ColumnDoesNotExist`]. The insert is atomic: on any failure
/// (arity mismatch, evaluation error, constraint violation) the row is not
/// visible and no index retains an entry for it.
pub fn execute_insert(ins: &InsertStatement, catalog: &mut Catalog) -> Result<()> {
    let table = catalog.get(&ins.table.value)?;
    if ins.values.len() != table.columns.len() {
        return Err(CellarError::MissingValues);
    }

    let probe = Table::synthetic();
    let mut row = Vec::with_capacity(ins.values.len());
    for value in &ins.values {
        let (cell, _, _) = evaluate_cell(&probe, 0, value)?;
        row.push(cell);
    }

    let table = catalog.get_mut(&ins.table.value)?;
    let row_index = table.rows.len();
    table.rows.push(row);

    // Offer the new row to every index. Entries already made are unwound
    // together with the row if any index refuses it.
    let index_exprs: Vec<Expression> = table.indexes.iter().map(|i| i.expr.clone()).collect();
    let mut added: Vec<(usize, Cell)> = Vec::new();
    for (pos, expr) in index_exprs.iter().enumerate() {
        let value = match evaluate_cell(table, row_index, expr) {
            Ok((cell, _, _)) => cell,
            Err(err) => {
                unwind_insert(table, &added, row_index);
                return Err(err);
            }
        };
        if let Err(err) = table.indexes[pos].add_row(Some(value.clone()), row_index) {
            unwind_insert(table, &added, row_index);
            return Err(err);
        }
        added.push((pos, value));
    }

    debug!(table = %ins.table.value, row = row_index, "inserted row");
    Ok(())
}

fn unwind_insert(table: &mut Table, added: &[(usize, Cell)], row_index: usize) {
    for (pos, value) in added {
        table.indexes[*pos].remove_row(value, row_index);
    }
    table.rows.pop();
}

// ---- SELECT ----

/// Project (and optionally filter) rows from a table.
pub fn execute_select(slct: &SelectStatement, catalog: &Catalog) -> Result<Results> {
    let synthetic;
    let table = match &slct.from {
        Some(from) => catalog.get(&from.value)?,
        None => {
            synthetic = Table::synthetic();
            &synthetic
        }
    };

    if slct.items.is_empty() {
        return Ok(Results::default());
    }

    // `*` needs a source table to expand against.
    if slct.from.is_none()
        && slct
            .items
            .iter()
            .any(|item| matches!(item, SelectItem::Asterisk))
    {
        return Err(CellarError::InvalidSelectItem);
    }

    let row_positions = match &slct.where_clause {
        Some(where_clause) => prune_rows(table, where_clause),
        None => (0..table.rows.len()).collect(),
    };

    let mut results = Results::default();
    for row_index in row_positions {
        let is_first_row = results.rows.is_empty();

        if let Some(where_clause) = &slct.where_clause {
            let (value, _, _) = evaluate_cell(table, row_index, where_clause)?;
            if !value.as_bool() {
                continue;
            }
        }

        let mut result_row = Vec::new();
        for item in &slct.items {
            match item {
                SelectItem::Asterisk => {
                    for (col, name) in table.columns.iter().enumerate() {
                        if is_first_row {
                            results.columns.push(ResultColumn {
                                name: name.clone(),
                                column_type: table.column_types[col],
                            });
                        }
                        result_row.push(table.rows[row_index][col].clone());
                    }
                }
                SelectItem::Expression { expr, alias } => {
                    let (cell, name, column_type) = evaluate_cell(table, row_index, expr)?;
                    if is_first_row {
                        let name = match alias {
                            Some(alias) => alias.value.clone(),
                            None => name,
                        };
                        results.columns.push(ResultColumn { name, column_type });
                    }
                    result_row.push(cell);
                }
            }
        }

        results.rows.push(result_row);
    }

    debug!(
        table = %slct.from.as_ref().map(|t| t.value.as_str()).unwrap_or("<none>"),
        rows = results.rows.len(),
        "executed select"
    );
    Ok(results)
}

/// Reduce the candidate row set using every (index, sub-expression) pair the
/// where clause offers. The first accepted pair fixes the walk order; later
/// pairs intersect it. Rows come back in tree-walk order, so an applied
/// index may reorder results relative to insertion order.
fn prune_rows(table: &Table, where_clause: &Expression) -> Vec<usize> {
    let probe = Table::synthetic();
    let mut surviving: Option<Vec<usize>> = None;

    let mut leaves = Vec::new();
    linearize(where_clause, &mut leaves);

    for leaf in leaves {
        let binary = match leaf {
            Expression::Binary(binary) => binary,
            Expression::Literal(_) => continue,
        };
        for index in &table.indexes {
            let value_expr = match index.applicable_value(leaf) {
                Some(value_expr) => value_expr,
                None => continue,
            };
            let value = match evaluate_cell(&probe, 0, value_expr) {
                Ok((cell, _, _)) => cell,
                Err(err) => {
                    // A malformed probe literal resurfaces during the row
                    // scan; the index simply declines to prune here.
                    debug!(index = %index.name, %err, "skipping index reduction");
                    continue;
                }
            };

            let matched = index.scan(&binary.op.value, &value);
            surviving = Some(match surviving.take() {
                None => matched,
                Some(current) => {
                    let keep: HashSet<usize> = current.into_iter().collect();
                    matched.into_iter().filter(|r| keep.contains(r)).collect()
                }
            });
        }
    }

    match surviving {
        Some(rows) => rows,
        None => (0..table.rows.len()).collect(),
    }
}

/// Flatten a where clause into the conjunction of its sub-expressions:
/// `AND` nodes are split recursively, `OR` nodes stop the descent (their
/// subtrees are not linearised), and any other binary node is a leaf.
fn linearize<'a>(expr: &'a Expression, leaves: &mut Vec<&'a Expression>) {
    let binary = match expr {
        Expression::Binary(binary) => binary,
        Expression::Literal(_) => return,
    };

    if binary.op.is(TokenKind::Keyword, "or") {
        return;
    }

    if binary.op.is(TokenKind::Keyword, "and") {
        linearize(&binary.left, leaves);
        linearize(&binary.right, leaves);
        return;
    }

    leaves.push(expr);
}

// ---------------------------------------------------------------------------
// Expression evaluation
// ---------------------------------------------------------------------------

/// Evaluate an expression in the context of one row of a table, yielding
/// the cell, the inferred column name, and the inferred column type.
pub fn evaluate_cell(
    table: &Table,
    row_index: usize,
    expr: &Expression,
) -> Result<(Cell, String, ColumnType)> {
    match expr {
        Expression::Literal(token) => evaluate_literal_cell(table, row_index, token),
        Expression::Binary(_) => evaluate_binary_cell(table, row_index, expr),
    }
}

fn evaluate_literal_cell(
    table: &Table,
    row_index: usize,
    token: &Token,
) -> Result<(Cell, String, ColumnType)> {
    if token.kind == TokenKind::Identifier {
        let col = table
            .find_column(&token.value)
            .ok_or(CellarError::ColumnDoesNotExist)?;
        return Ok((
            table.rows[row_index][col].clone(),
            table.columns[col].clone(),
            table.column_types[col],
        ));
    }

    let (cell, column_type) = literal_to_cell(token)?;
    Ok((cell, ANONYMOUS_COLUMN.into(), column_type))
}

/// Encode a value literal token as a cell.
///
/// # Errors
///
/// Returns [`CellarError::InvalidCell`] for a numeric literal outside the
/// 32-bit integer range (including any decimal or exponent form) or for a
/// token kind that carries no value.
pub fn literal_to_cell(token: &Token) -> Result<(Cell, ColumnType)> {
    match token.kind {
        TokenKind::Numeric => {
            let value: i32 = token.value.parse().map_err(|_| CellarError::InvalidCell)?;
            Ok((Cell::from_int(value), ColumnType::Int))
        }
        TokenKind::String => Ok((Cell::from_text(&token.value), ColumnType::Text)),
        TokenKind::Bool => Ok((Cell::from_bool(token.value == "true"), ColumnType::Bool)),
        _ => Err(CellarError::InvalidCell),
    }
}

fn evaluate_binary_cell(
    table: &Table,
    row_index: usize,
    expr: &Expression,
) -> Result<(Cell, String, ColumnType)> {
    let binary = match expr {
        Expression::Binary(binary) => binary,
        Expression::Literal(_) => return Err(CellarError::InvalidCell),
    };

    let (left, _, left_type) = evaluate_cell(table, row_index, &binary.left)?;
    let (right, _, right_type) = evaluate_cell(table, row_index, &binary.right)?;

    // Display-only name built from the immediate children; best-effort for
    // nested binary children.
    let column_name = format!(
        "{} {} {}",
        binary.left.display_fragment(),
        binary.op.value,
        binary.right.display_fragment()
    );

    match binary.op.kind {
        TokenKind::Symbol => match binary.op.value.as_str() {
            "=" => {
                let equal = left_type == right_type && left == right;
                Ok((Cell::from_bool(equal), column_name, ColumnType::Bool))
            }
            "!=" => {
                let unequal = left_type != right_type || left != right;
                Ok((Cell::from_bool(unequal), column_name, ColumnType::Bool))
            }
            "||" => {
                if left_type != ColumnType::Text || right_type != ColumnType::Text {
                    return Err(CellarError::InvalidOperands);
                }
                let concatenated = format!("{}{}", left.as_text(), right.as_text());
                Ok((
                    Cell::from_text(&concatenated),
                    column_name,
                    ColumnType::Text,
                ))
            }
            "+" => {
                if left_type != ColumnType::Int || right_type != ColumnType::Int {
                    return Err(CellarError::InvalidOperands);
                }
                let sum = left.as_int().wrapping_add(right.as_int());
                Ok((Cell::from_int(sum), column_name, ColumnType::Int))
            }
            _ => Err(CellarError::InvalidCell),
        },
        TokenKind::Keyword => match binary.op.value.as_str() {
            "and" => {
                if left_type != ColumnType::Bool || right_type != ColumnType::Bool {
                    return Err(CellarError::InvalidOperands);
                }
                Ok((
                    Cell::from_bool(left.as_bool() && right.as_bool()),
                    column_name,
                    ColumnType::Bool,
                ))
            }
            "or" => {
                if left_type != ColumnType::Bool || right_type != ColumnType::Bool {
                    return Err(CellarError::InvalidOperands);
                }
                Ok((
                    Cell::from_bool(left.as_bool() || right.as_bool()),
                    column_name,
                    ColumnType::Bool,
                ))
            }
            _ => Err(CellarError::InvalidCell),
        },
        _ => Err(CellarError::InvalidCell),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
