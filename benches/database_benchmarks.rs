//! Criterion benchmarks for clinicdb

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use clinicdb::{OrderDirection, Query, Row, Statement, Value};

// ============================================================================
// Value Creation Benchmarks
// ============================================================================

fn bench_value_creation(c: &mut Criterion) {
    let mut group = c.benchmark_group("value_creation");
    group.throughput(Throughput::Elements(1));

    group.bench_function("bool", |b| {
        b.iter(|| {
            let value = Value::from(black_box(true));
            black_box(value)
        });
    });

    group.bench_function("int", |b| {
        b.iter(|| {
            let value = Value::from(black_box(123456789i64));
            black_box(value)
        });
    });

    group.bench_function("double", |b| {
        b.iter(|| {
            let value = Value::from(black_box(std::f64::consts::PI));
            black_box(value)
        });
    });

    group.bench_function("text", |b| {
        b.iter(|| {
            let value = Value::from(black_box("Hello, World!".to_string()));
            black_box(value)
        });
    });

    group.bench_function("bytes", |b| {
        let data = vec![1u8, 2, 3, 4, 5];
        b.iter(|| {
            let value = Value::from(black_box(data.clone()));
            black_box(value)
        });
    });

    group.bench_function("null", |b| {
        b.iter(|| {
            let value = Value::from(black_box(Option::<i64>::None));
            black_box(value)
        });
    });

    group.finish();
}

// ============================================================================
// Type Conversion Benchmarks
// ============================================================================

fn bench_type_conversions(c: &mut Criterion) {
    let mut group = c.benchmark_group("type_conversions");
    group.throughput(Throughput::Elements(1));

    let int_val = Value::from(123456789i64);
    let double_val = Value::from(std::f64::consts::PI);
    let text_val = Value::from("Hello, World!".to_string());

    group.bench_function("int_to_double", |b| {
        b.iter(|| {
            let result = int_val.as_double();
            black_box(result)
        });
    });

    group.bench_function("double_to_string", |b| {
        b.iter(|| {
            let result = double_val.as_string();
            black_box(result)
        });
    });

    group.bench_function("text_clone", |b| {
        b.iter(|| {
            let result = text_val.as_string();
            black_box(result)
        });
    });

    group.bench_function("text_parse_int", |b| {
        let numeric = Value::from("123456789");
        b.iter(|| {
            let result = numeric.as_int();
            black_box(result)
        });
    });

    group.finish();
}

// ============================================================================
// Row Operations Benchmarks
// ============================================================================

fn bench_row_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("row_operations");

    // Building rows of different widths
    for size in [10, 50, 100].iter() {
        group.throughput(Throughput::Elements(*size as u64));

        group.bench_with_input(BenchmarkId::new("set", size), size, |b, &size| {
            b.iter(|| {
                let mut row = Row::new();
                for i in 0..size {
                    row.set(format!("col_{i}"), i as i64);
                }
                black_box(row)
            });
        });
    }

    // Field lookups scan the name list in order
    let mut row = Row::new();
    for i in 0..100 {
        row.set(format!("col_{i}"), i as i64);
    }

    group.bench_function("get_first", |b| {
        b.iter(|| {
            let value = row.get(black_box("col_0"));
            black_box(value)
        });
    });

    group.bench_function("get_middle", |b| {
        b.iter(|| {
            let value = row.get(black_box("col_50"));
            black_box(value)
        });
    });

    group.bench_function("get_last", |b| {
        b.iter(|| {
            let value = row.get(black_box("col_99"));
            black_box(value)
        });
    });

    group.bench_function("get_nonexistent", |b| {
        b.iter(|| {
            let value = row.get(black_box("nonexistent"));
            black_box(value)
        });
    });

    group.finish();
}

// ============================================================================
// Query Building Benchmarks
// ============================================================================

fn bench_query_building(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_building");
    group.throughput(Throughput::Elements(1));

    group.bench_function("select_simple", |b| {
        b.iter(|| {
            let sql = Query::select(black_box("patients")).build();
            black_box(sql)
        });
    });

    group.bench_function("select_filtered", |b| {
        b.iter(|| {
            let sql = Query::select(black_box("patients"))
                .columns(&["id", "name", "age"])
                .and_where("`status` = 'active'")
                .and_where("`age` > 40")
                .order_by("name", OrderDirection::Asc)
                .build();
            black_box(sql)
        });
    });

    group.bench_function("delete_filtered", |b| {
        b.iter(|| {
            let sql = Query::delete(black_box("appointments"))
                .and_where("`status` = 'cancelled'")
                .build();
            black_box(sql)
        });
    });

    group.finish();
}

// ============================================================================
// Statement Staging Benchmarks
// ============================================================================

fn bench_statement_staging(c: &mut Criterion) {
    let mut group = c.benchmark_group("statement_staging");
    group.throughput(Throughput::Elements(1));

    group.bench_function("stage_with_window", |b| {
        b.iter(|| {
            let stmt = Statement::new(black_box("SELECT * FROM patients ORDER BY id"))
                .offset(40)
                .limit(10);
            black_box(stmt.to_sql().into_owned())
        });
    });

    group.bench_function("render_without_window", |b| {
        let stmt = Statement::new("SELECT * FROM patients");
        b.iter(|| {
            let sql = stmt.to_sql();
            black_box(sql)
        });
    });

    group.finish();
}

// ============================================================================
// Serde Bridge Benchmarks
// ============================================================================

fn bench_serde_bridge(c: &mut Criterion) {
    use serde::Serialize;

    #[derive(Serialize)]
    struct PatientRecord {
        name: String,
        age: i64,
        note: Option<String>,
    }

    let mut group = c.benchmark_group("serde_bridge");

    let values = vec![
        ("bool", Value::from(true)),
        ("int", Value::from(123456789i64)),
        ("double", Value::from(std::f64::consts::PI)),
        ("text", Value::from("Hello, World!".to_string())),
        ("null", Value::from(Option::<i64>::None)),
    ];

    for (name, value) in values.iter() {
        group.bench_with_input(BenchmarkId::new("value", name), value, |b, value| {
            b.iter(|| {
                let json = serde_json::to_string(value).expect("Serialization failed");
                black_box(json)
            });
        });
    }

    let record = PatientRecord {
        name: "Ana".to_string(),
        age: 34,
        note: Some("walk-in".to_string()),
    };
    group.bench_function("row_from_struct", |b| {
        b.iter(|| {
            let row = Row::from_object(black_box(&record)).expect("Conversion failed");
            black_box(row)
        });
    });

    for size in [10, 50, 100].iter() {
        let mut row = Row::new();
        for i in 0..*size {
            row.set(format!("col_{i}"), i as i64);
            row.set(format!("str_{i}"), format!("value_{i}"));
        }

        group.throughput(Throughput::Elements(*size as u64));

        group.bench_with_input(BenchmarkId::new("row_to_json", size), &row, |b, row| {
            b.iter(|| {
                let json: serde_json::Value = row.to_object().expect("Conversion failed");
                black_box(json)
            });
        });
    }

    group.finish();
}

// ============================================================================
// Quoting Benchmarks
// ============================================================================

#[cfg(feature = "sqlite")]
fn bench_quoting(c: &mut Criterion) {
    use clinicdb::{Connector, SqliteConnector};

    let db = SqliteConnector::memory().expect("Failed to open in-memory database");

    let mut group = c.benchmark_group("quoting");
    group.throughput(Throughput::Elements(1));

    group.bench_function("quote_clean_text", |b| {
        let value = Value::from("routine checkup, no findings");
        b.iter(|| {
            let quoted = db.quote(black_box(&value), true);
            black_box(quoted)
        });
    });

    group.bench_function("quote_dirty_text", |b| {
        let value = Value::from("O'Hara's 100% 'quoted' note");
        b.iter(|| {
            let quoted = db.quote(black_box(&value), true);
            black_box(quoted)
        });
    });

    group.bench_function("quote_name_dotted", |b| {
        b.iter(|| {
            let quoted = db.quote_name(black_box("clinic.patients"), Some("p"));
            black_box(quoted)
        });
    });

    group.bench_function("escape_wildcards", |b| {
        b.iter(|| {
            let escaped = db.escape(black_box("50%_of_visits"), true);
            black_box(escaped)
        });
    });

    group.finish();
}

// ============================================================================
// Live Execution Benchmarks
// ============================================================================

#[cfg(feature = "sqlite")]
fn bench_sqlite_execution(c: &mut Criterion) {
    use clinicdb::{Connector, SqliteConnector};

    let db = SqliteConnector::memory().expect("Failed to open in-memory database");
    db.execute(&Statement::new(
        "CREATE TABLE patients (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT, age INTEGER)",
    ))
    .expect("Failed to create table");
    for i in 0..100 {
        db.execute(&Statement::new(format!(
            "INSERT INTO patients (name, age) VALUES ('patient_{i}', {})",
            20 + (i % 60)
        )))
        .expect("Failed to seed");
    }

    let mut group = c.benchmark_group("sqlite_execution");

    group.bench_function("select_100_assoc", |b| {
        let stmt = Statement::new("SELECT * FROM patients");
        b.iter(|| {
            let rows = db.query_assoc_list(&stmt).expect("Query failed");
            black_box(rows)
        });
    });

    group.bench_function("select_page_assoc", |b| {
        let stmt = Statement::new("SELECT * FROM patients ORDER BY id")
            .offset(40)
            .limit(10);
        b.iter(|| {
            let rows = db.query_assoc_list(&stmt).expect("Query failed");
            black_box(rows)
        });
    });

    group.bench_function("insert_object", |b| {
        let mut serial = 0u64;
        b.iter(|| {
            serial += 1;
            let mut row = Row::from_pairs([
                ("name", Value::from(format!("bench_{serial}"))),
                ("age", Value::from(30i64)),
            ]);
            let id = db
                .insert_object("patients", &mut row, Some("id"))
                .expect("Insert failed");
            black_box(id)
        });
    });

    group.finish();
}

// ============================================================================
// Criterion Configuration
// ============================================================================

#[cfg(feature = "sqlite")]
criterion_group!(
    benches,
    bench_value_creation,
    bench_type_conversions,
    bench_row_operations,
    bench_query_building,
    bench_statement_staging,
    bench_serde_bridge,
    bench_quoting,
    bench_sqlite_execution
);

#[cfg(not(feature = "sqlite"))]
criterion_group!(
    benches,
    bench_value_creation,
    bench_type_conversions,
    bench_row_operations,
    bench_query_building,
    bench_statement_staging,
    bench_serde_bridge
);

criterion_main!(benches);
