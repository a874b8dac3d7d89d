//! Transaction example
//!
//! This example demonstrates transaction management:
//! - Committing through a transaction guard
//! - Automatic rollback when a guard drops
//! - Explicit rollback on domain failures
//! - Table lock guards
//!
//! Run with: cargo run --example transactions

use std::sync::Arc;

use clinicdb::prelude::*;

fn main() -> Result<()> {
    println!("=== clinicdb - Transaction Example ===\n");

    let db = DatabaseFactory::connect(&ConnectOptions::default())?;

    // Create accounts table
    println!("1. Setting up patient accounts...");
    db.execute(&Statement::new(
        "CREATE TABLE accounts (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            balance REAL NOT NULL
        )",
    ))?;

    for (id, name, balance) in [(1, "Alice", 1000.0), (2, "Bob", 500.0), (3, "Charlie", 750.0)] {
        db.execute(&Statement::new(format!(
            "INSERT INTO accounts (id, name, balance) VALUES ({id}, {}, {balance})",
            db.quote(&Value::from(name), true)
        )))?;
    }
    println!("   ✓ Accounts created\n");
    print_balances(db.as_ref())?;

    // Example 1: successful transfer, committed
    println!("\n2. Transfer $100 from Alice to Bob...");
    let tx = TransactionGuard::begin(Arc::clone(&db))?;
    match transfer(&tx, 1, 2, 100.0) {
        Ok(()) => {
            tx.commit()?;
            println!("   ✓ Committed");
        }
        Err(e) => {
            tx.rollback()?;
            println!("   ✗ Rolled back: {e}");
        }
    }
    print_balances(db.as_ref())?;

    // Example 2: domain failure, explicit rollback
    println!("\n3. Transfer $10000 from Bob to Alice (insufficient funds)...");
    let tx = TransactionGuard::begin(Arc::clone(&db))?;
    match transfer(&tx, 2, 1, 10000.0) {
        Ok(()) => {
            tx.commit()?;
            println!("   ✓ Committed");
        }
        Err(e) => {
            tx.rollback()?;
            println!("   ✗ Rolled back: {e}");
        }
    }
    print_balances(db.as_ref())?;

    // Example 3: a dropped guard rolls back on its own
    println!("\n4. Abandoning a transaction mid-flight...");
    {
        let tx = TransactionGuard::begin(Arc::clone(&db))?;
        tx.execute(&Statement::new(
            "UPDATE accounts SET balance = 0 WHERE id = 3",
        ))?;
        println!("   Charlie zeroed inside the transaction, then the guard drops");
    }
    print_balances(db.as_ref())?;

    // Example 4: serialize writers with a table lock
    println!("\n5. Updating under a table lock...");
    {
        let lock = TableLockGuard::acquire(Arc::clone(&db), "accounts")?;
        db.execute(&Statement::new(
            "UPDATE accounts SET balance = balance + 25 WHERE id = 1",
        ))?;
        lock.unlock()?;
        println!("   ✓ Lock released");
    }
    print_balances(db.as_ref())?;

    println!("\n=== Example completed successfully! ===");

    Ok(())
}

/// Move money between two accounts inside an open transaction
fn transfer(tx: &TransactionGuard, from: i64, to: i64, amount: f64) -> Result<()> {
    let result = tx.execute(&Statement::new(format!(
        "UPDATE accounts SET balance = balance - {amount} \
         WHERE id = {from} AND balance >= {amount}"
    )))?;
    if result.affected_rows() == 0 {
        return Err(DatabaseError::persistence(
            "insufficient funds or unknown account",
        ));
    }

    tx.execute(&Statement::new(format!(
        "UPDATE accounts SET balance = balance + {amount} WHERE id = {to}"
    )))?;
    Ok(())
}

/// Print all account balances
fn print_balances(db: &dyn Connector) -> Result<()> {
    println!("   Current balances:");
    for row in db.query_assoc_list(&Statement::new(
        "SELECT name, balance FROM accounts ORDER BY id",
    ))? {
        println!(
            "   - {}: ${:.2}",
            row.get("name").map(Value::as_string).unwrap_or_default(),
            row.get("balance").and_then(Value::as_double).unwrap_or(0.0)
        );
    }
    Ok(())
}
