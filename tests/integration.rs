use cellar::{CellarError, Database};

fn users_db() -> Database {
    let mut db = Database::new();
    db.execute("CREATE TABLE u (id INT PRIMARY KEY, name TEXT);")
        .unwrap();
    db.execute("INSERT INTO u VALUES (1, 'Alice');").unwrap();
    db
}

fn int_column(db: &mut Database, source: &str) -> Vec<i32> {
    db.query(source)
        .unwrap()
        .rows
        .iter()
        .map(|row| row[0].as_int())
        .collect()
}

fn text_column(db: &mut Database, source: &str) -> Vec<String> {
    db.query(source)
        .unwrap()
        .rows
        .iter()
        .map(|row| row[0].as_text().into_owned())
        .collect()
}

#[test]
fn create_insert_and_reject_duplicate_key() {
    let mut db = users_db();
    let err = db.execute("INSERT INTO u VALUES (1, 'Bob');").unwrap_err();
    assert_eq!(err, CellarError::ViolatesUniqueConstraint);
}

#[test]
fn select_preserves_insertion_order() {
    let mut db = users_db();
    db.execute("INSERT INTO u VALUES (2, 'Bob');").unwrap();

    let results = db.query("SELECT id, name FROM u;").unwrap();
    assert_eq!(results.columns.len(), 2);
    assert_eq!(results.rows.len(), 2);
    assert_eq!(results.rows[0][0].as_int(), 1);
    assert_eq!(results.rows[0][1].as_text(), "Alice");
    assert_eq!(results.rows[1][0].as_int(), 2);
    assert_eq!(results.rows[1][1].as_text(), "Bob");
}

#[test]
fn indexed_equality_select() {
    let mut db = users_db();
    db.execute("INSERT INTO u VALUES (2, 'Bob');").unwrap();
    assert_eq!(
        text_column(&mut db, "SELECT name FROM u WHERE id = 2;"),
        vec!["Bob"]
    );
}

#[test]
fn arithmetic_projection() {
    let mut db = users_db();
    assert_eq!(
        int_column(&mut db, "SELECT id + 10 FROM u WHERE id = 1;"),
        vec![11]
    );
}

#[test]
fn concat_projection() {
    let mut db = users_db();
    assert_eq!(
        text_column(&mut db, "SELECT name || '!' FROM u WHERE id = 1;"),
        vec!["Alice!"]
    );
}

#[test]
fn conjunction_of_filters() {
    let mut db = users_db();
    db.execute("INSERT INTO u VALUES (2, 'Bob');").unwrap();
    assert_eq!(
        int_column(&mut db, "SELECT id FROM u WHERE name = 'Alice' AND id != 5;"),
        vec![1]
    );
}

#[test]
fn mixed_operand_addition_fails() {
    let mut db = Database::new();
    assert_eq!(
        db.query("SELECT 1 + 'x';").unwrap_err(),
        CellarError::InvalidOperands
    );
}

#[test]
fn unknown_column_fails() {
    let mut db = users_db();
    assert_eq!(
        db.query("SELECT missing FROM u;").unwrap_err(),
        CellarError::ColumnDoesNotExist
    );
}

#[test]
fn rejected_rows_are_invisible() {
    let mut db = users_db();
    db.execute("INSERT INTO u VALUES (1, 'Bob');").unwrap_err();

    let names = text_column(&mut db, "SELECT name FROM u;");
    assert_eq!(names, vec!["Alice"]);

    // The storage level agrees: neither the row vector nor the primary-key
    // index kept anything from the rejected insert.
    let table = db.catalog().get("u").unwrap();
    assert_eq!(table.rows.len(), 1);
    assert_eq!(table.indexes[0].len(), 1);
}

#[test]
fn every_stored_row_matches_the_column_arity() {
    let mut db = users_db();
    db.execute("INSERT INTO u VALUES (2, 'Bob');").unwrap();
    db.execute("INSERT INTO u VALUES (3, 'Carol');").unwrap();

    let table = db.catalog().get("u").unwrap();
    for row in &table.rows {
        assert_eq!(row.len(), table.columns.len());
    }
}

#[test]
fn index_and_scan_agree_on_the_result_multiset() {
    // The same data in an indexed and an unindexed table must produce the
    // same rows for the same filter; only the order may differ.
    let mut db = Database::new();
    db.execute("CREATE TABLE indexed (id INT PRIMARY KEY, score INT);")
        .unwrap();
    db.execute("CREATE TABLE plain (id INT, score INT);").unwrap();

    for (id, score) in [(4, 40), (1, 10), (3, 30), (2, 20)] {
        db.execute(&format!("INSERT INTO indexed VALUES ({id}, {score});"))
            .unwrap();
        db.execute(&format!("INSERT INTO plain VALUES ({id}, {score});"))
            .unwrap();
    }

    for filter in ["id = 3", "id != 3", "id = 1 AND score = 10", "id != 1 AND id != 4"] {
        let mut indexed = int_column(
            &mut db,
            &format!("SELECT score FROM indexed WHERE {filter};"),
        );
        let mut plain =
            int_column(&mut db, &format!("SELECT score FROM plain WHERE {filter};"));
        indexed.sort_unstable();
        plain.sort_unstable();
        assert_eq!(indexed, plain, "filter {filter}");
    }
}

#[test]
fn quoted_identifiers_preserve_case() {
    let mut db = Database::new();
    db.execute("CREATE TABLE \"Mixed\" (a INT);").unwrap();
    db.execute("INSERT INTO \"Mixed\" VALUES (5);").unwrap();
    assert_eq!(int_column(&mut db, "SELECT a FROM \"Mixed\";"), vec![5]);

    // The unquoted spelling lowercases and therefore misses the table.
    assert_eq!(
        db.query("SELECT a FROM Mixed;").unwrap_err(),
        CellarError::TableDoesNotExist
    );
}

#[test]
fn keywords_and_identifiers_are_case_insensitive() {
    let mut db = Database::new();
    db.execute("create TABLE Things (Name TEXT);").unwrap();
    db.execute("InSeRt InTo things VaLuEs ('widget');").unwrap();
    assert_eq!(
        text_column(&mut db, "SELECT NAME from THINGS;"),
        vec!["widget"]
    );
}

#[test]
fn string_escapes_survive_the_round_trip() {
    let mut db = Database::new();
    db.execute("CREATE TABLE t (s TEXT);").unwrap();
    db.execute("INSERT INTO t VALUES ('a''b');").unwrap();
    assert_eq!(text_column(&mut db, "SELECT s FROM t;"), vec!["a'b"]);
}

#[test]
fn lex_and_parse_errors_surface_with_locations() {
    let mut db = Database::new();
    assert!(matches!(
        db.execute("select ~;").unwrap_err(),
        CellarError::LexError { .. }
    ));
    assert!(matches!(
        db.execute("select a from").unwrap_err(),
        CellarError::ParseError { .. }
    ));
}

#[test]
fn multiple_statements_per_source() {
    let mut db = Database::new();
    let results = db
        .query(
            "CREATE TABLE t (a INT PRIMARY KEY); \
             INSERT INTO t VALUES (10); \
             INSERT INTO t VALUES (20); \
             SELECT a FROM t WHERE a != 5;",
        )
        .unwrap();
    let values: Vec<i32> = results.rows.iter().map(|r| r[0].as_int()).collect();
    assert_eq!(values, vec![10, 20]);
}
