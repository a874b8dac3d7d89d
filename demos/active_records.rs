//! Active-record example
//!
//! This example demonstrates table-backed records:
//! - Modeling a table through the factory
//! - Insert and update through `store`
//! - Binding request-shaped data
//! - Save hooks on a wrapping entity
//! - Typed struct mapping
//!
//! Run with: cargo run --example active_records

use clinicdb::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
struct Appointment {
    id: Option<i64>,
    patient: String,
    reason: String,
    seen: i64,
}

/// Appointment record with validation and reordering hooks
struct AppointmentRecord {
    table: Table,
}

impl AppointmentRecord {
    fn new() -> Result<Self> {
        Ok(AppointmentRecord {
            table: DatabaseFactory::table("appointments", "id")?,
        })
    }
}

impl Entity for AppointmentRecord {
    fn record(&mut self) -> &mut Table {
        &mut self.table
    }

    fn check(&mut self) -> Result<()> {
        let patient = self.table.get("patient").map(Value::as_string);
        if patient.as_deref().unwrap_or("").is_empty() {
            return Err(DatabaseError::bind("an appointment needs a patient name"));
        }
        Ok(())
    }

    fn reorder(&mut self, filter: &str) -> Result<()> {
        println!("   (reordering siblings where {filter})");
        Ok(())
    }
}

fn main() -> Result<()> {
    println!("=== clinicdb - Active Records Example ===\n");

    // The factory keeps one shared connection for the whole process
    println!("1. Preparing schema...");
    let db = DatabaseFactory::database()?;
    db.execute(&Statement::new(
        "CREATE TABLE appointments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            patient TEXT NOT NULL,
            reason TEXT,
            seen INTEGER DEFAULT 0
        )",
    ))?;
    println!("   ✓ Table created\n");

    // Insert through a record
    println!("2. Creating an appointment...");
    let mut appointment = DatabaseFactory::table("appointments", "id")?;
    appointment.set("patient", "Ana")?;
    appointment.set("reason", "annual checkup")?;
    appointment.store(false)?;
    println!(
        "   ✓ Stored with id {}",
        appointment.key_value().as_string()
    );
    println!("   Last SQL: {}\n", db.last_sql().unwrap_or_default());

    // A stored record updates in place on the next store
    println!("3. Marking it as seen...");
    appointment.set("seen", 1)?;
    appointment.store(false)?;
    println!("   ✓ Updated");
    println!("   Last SQL: {}\n", db.last_sql().unwrap_or_default());

    // Load a fresh record by key
    println!("4. Loading it back...");
    let mut loaded = DatabaseFactory::table("appointments", "id")?;
    if loaded.load_key(1i64, false)? {
        println!(
            "   ✓ Loaded: {} ({})",
            loaded.get("patient").map(Value::as_string).unwrap_or_default(),
            loaded.get("reason").map(Value::as_string).unwrap_or_default(),
        );
    }
    println!();

    // Bind request-shaped data, ignoring fields the caller may not set
    println!("5. Binding form data...");
    let form = Row::from_pairs([
        ("patient", Value::from("Bruno")),
        ("reason", Value::from("follow-up")),
        ("id", Value::from(999i64)),
    ]);
    let mut bound = DatabaseFactory::table("appointments", "id")?;
    bound.bind(&form, &["id"])?;
    bound.store(false)?;
    println!("   ✓ Stored with id {}\n", bound.key_value().as_string());

    // Save runs bind, check, store and reorder as one step
    println!("6. Saving through an entity with hooks...");
    let mut record = AppointmentRecord::new()?;
    let src = Row::from_pairs([
        ("patient", Value::from("Clara")),
        ("reason", Value::from("vaccination")),
    ]);
    record.save(&src, Some("seen"), &[])?;
    println!("   ✓ Saved\n");

    // The check hook rejects bad input before anything is written
    println!("7. Validation failure...");
    let mut invalid = AppointmentRecord::new()?;
    let bad = Row::from_pairs([("reason", Value::from("no patient name"))]);
    match invalid.save(&bad, None, &[]) {
        Ok(()) => println!("   ✗ Unexpectedly saved"),
        Err(e) => println!("   ✓ Rejected: {e}"),
    }
    println!();

    // Typed mapping through the serde bridge
    println!("8. Typed view of the table...");
    let appointments: Vec<Appointment> =
        db.query_object_list(&Statement::new("SELECT * FROM appointments ORDER BY id"))?;
    for a in &appointments {
        println!(
            "   - #{} {} ({}), seen: {}",
            a.id.unwrap_or(0),
            a.patient,
            a.reason,
            a.seen != 0
        );
    }

    // Delete by key
    println!("\n9. Deleting the first appointment...");
    let mut doomed = DatabaseFactory::table("appointments", "id")?;
    doomed.delete(Some(Value::from(1i64)))?;
    let remaining = db.query_column(
        &Statement::new("SELECT COUNT(*) FROM appointments"),
        0,
    )?;
    println!(
        "   ✓ Deleted, {} appointment(s) remain",
        remaining.first().map(Value::as_string).unwrap_or_default()
    );

    println!("\n=== Example completed successfully! ===");

    Ok(())
}
