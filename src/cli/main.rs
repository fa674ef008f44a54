//! # Cellar CLI
//!
//! An interactive REPL for Cellar. Each line is parsed as one or more SQL
//! statements and dispatched in order; select results render as a
//! pipe-separated table. Errors print and the loop continues.

use std::process;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing_subscriber::EnvFilter;

use cellar::{ColumnType, Database, Results};

fn main() {
    // Log level comes from CELLAR_LOG (e.g. CELLAR_LOG=debug).
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("CELLAR_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(err) => {
            eprintln!("Error initialising line editor: {err}");
            process::exit(1);
        }
    };

    let mut db = Database::new();
    println!("Cellar v{}", env!("CARGO_PKG_VERSION"));

    loop {
        match editor.readline("cellar> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line);
                run_line(&mut db, line);
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("Error reading input: {err}");
                break;
            }
        }
    }
}

fn run_line(db: &mut Database, line: &str) {
    let statements = match cellar::parse(line) {
        Ok(statements) => statements,
        Err(err) => {
            eprintln!("{err}");
            return;
        }
    };

    for stmt in statements {
        match db.run_statement(&stmt) {
            Ok(Some(results)) => {
                render(&results);
                println!("ok");
            }
            Ok(None) => println!("ok"),
            Err(err) => {
                eprintln!("{err}");
                return;
            }
        }
    }
}

/// Render a result set as a pipe-separated table with a header rule.
fn render(results: &Results) {
    for column in &results.columns {
        print!("| {} ", column.name);
    }
    println!("|");

    println!("{}", "=".repeat(20));

    for row in &results.rows {
        print!("|");
        for (cell, column) in row.iter().zip(&results.columns) {
            let rendered = match column.column_type {
                ColumnType::Int => cell.as_int().to_string(),
                ColumnType::Text => cell.as_text().into_owned(),
                ColumnType::Bool => cell.as_bool().to_string(),
            };
            print!(" {rendered} |");
        }
        println!();
    }
}
