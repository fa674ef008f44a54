use criterion::{criterion_group, criterion_main, BatchSize, Criterion};

use cellar::Database;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn setup_db() -> Database {
    let mut db = Database::new();
    db.execute("CREATE TABLE t (id INT PRIMARY KEY, name TEXT, category TEXT)")
        .unwrap();
    db
}

fn setup_db_with_data(rows: usize) -> Database {
    let mut db = setup_db();
    for i in 0..rows {
        let cat = match i % 5 {
            0 => "alpha",
            1 => "beta",
            2 => "gamma",
            3 => "delta",
            _ => "epsilon",
        };
        db.execute(&format!(
            "INSERT INTO t VALUES ({i}, 'name_{i}', '{cat}');"
        ))
        .unwrap();
    }
    db
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_insert(c: &mut Criterion) {
    c.bench_function("insert_1000_rows", |b| {
        b.iter_batched(
            setup_db,
            |mut db| {
                for i in 0..1000 {
                    db.execute(&format!("INSERT INTO t VALUES ({i}, 'name_{i}', 'alpha');"))
                        .unwrap();
                }
                db
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_full_scan(c: &mut Criterion) {
    let mut db = setup_db_with_data(1000);
    c.bench_function("scan_1000_rows_unindexed_filter", |b| {
        b.iter(|| {
            db.query("SELECT id, name FROM t WHERE category = 'gamma';")
                .unwrap()
        })
    });
}

fn bench_indexed_select(c: &mut Criterion) {
    let mut db = setup_db_with_data(1000);
    c.bench_function("select_by_primary_key", |b| {
        b.iter(|| db.query("SELECT name FROM t WHERE id = 777;").unwrap())
    });

    let mut db = setup_db_with_data(1000);
    c.bench_function("select_primary_key_inequality", |b| {
        b.iter(|| db.query("SELECT id FROM t WHERE id != 500;").unwrap())
    });
}

fn bench_parse(c: &mut Criterion) {
    c.bench_function("parse_select", |b| {
        b.iter(|| {
            cellar::parse("SELECT id, name || '!' FROM t WHERE id = 5 AND category = 'alpha';")
                .unwrap()
        })
    });
}

criterion_group!(
    benches,
    bench_insert,
    bench_full_scan,
    bench_indexed_select,
    bench_parse
);
criterion_main!(benches);
