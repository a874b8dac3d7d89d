//! Basic database usage example
//!
//! This example demonstrates the core access layer:
//! - Connecting through the driver factory
//! - Creating a table and inserting quoted data
//! - The query convenience shapes (rows, columns, maps)
//! - Window paging
//!
//! Run with: cargo run --example basic_usage

use clinicdb::prelude::*;

fn main() -> Result<()> {
    println!("=== clinicdb - Basic Usage Example ===\n");

    // Connect through the factory; the default options open in-memory SQLite
    println!("1. Connecting to database...");
    let db = DatabaseFactory::connect(&ConnectOptions::default())?;
    println!("   ✓ Connected ({} driver)\n", db.driver());

    // Create table
    println!("2. Creating table...");
    db.execute(&Statement::new(
        "CREATE TABLE patients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            age INTEGER,
            status TEXT DEFAULT 'active'
        )",
    ))?;
    println!("   ✓ Table created\n");

    // Insert data through the quoting layer
    println!("3. Inserting data...");
    let patients = vec![
        ("Alice O'Brien", 30),
        ("Bob", 25),
        ("Charlie", 35),
        ("Diana", 28),
    ];

    for (name, age) in patients {
        let result = db.execute(&Statement::new(format!(
            "INSERT INTO patients (name, age) VALUES ({}, {age})",
            db.quote(&Value::from(name), true)
        )))?;
        println!(
            "   ✓ Inserted row #{} ({} affected)",
            result.last_insert_id(),
            result.affected_rows()
        );
    }
    println!();

    // Query all rows as field views
    println!("4. Querying all patients...");
    let rows = db.query_assoc_list(&Statement::new("SELECT * FROM patients ORDER BY id"))?;
    println!("   Found {} patients:", rows.len());
    for row in &rows {
        println!(
            "   - Patient #{}: {} (age {})",
            row.get("id").and_then(Value::as_int).unwrap_or(0),
            row.get("name").map(Value::as_string).unwrap_or_default(),
            row.get("age").and_then(Value::as_int).unwrap_or(0),
        );
    }
    println!();

    // Single column projection
    println!("5. Names only...");
    let names = db.query_column(&Statement::new("SELECT name FROM patients ORDER BY name"), 0)?;
    for name in &names {
        println!("   - {}", name.as_string());
    }
    println!();

    // Key one column by another
    println!("6. Age by name...");
    let ages = db.query_value_map(
        &Statement::new("SELECT name, age FROM patients"),
        "name",
        "age",
    )?;
    for (name, age) in &ages {
        println!("   - {name}: {}", age.as_string());
    }
    println!();

    // Window paging through the statement, not hand-written SQL
    println!("7. Second page (offset 2, limit 2)...");
    let page = db.query_assoc_list(
        &Statement::new("SELECT name FROM patients ORDER BY id")
            .offset(2)
            .limit(2),
    )?;
    for row in &page {
        println!(
            "   - {}",
            row.get("name").map(Value::as_string).unwrap_or_default()
        );
    }
    println!();

    // Update and delete
    println!("8. Archiving patients under 30...");
    let result = db.execute(&Statement::new(
        "UPDATE patients SET status = 'archived' WHERE age < 30",
    ))?;
    println!("   ✓ Updated {} row(s)", result.affected_rows());

    let result = db.execute(&Statement::new(
        "DELETE FROM patients WHERE status = 'archived'",
    ))?;
    println!("   ✓ Deleted {} row(s)\n", result.affected_rows());

    // Connection bookkeeping
    println!("9. Connection state...");
    println!("   Statements executed: {}", db.statement_count());
    if let Some(sql) = db.last_sql() {
        println!("   Last SQL: {sql}");
    }

    println!("\n=== Example completed successfully! ===");

    Ok(())
}
