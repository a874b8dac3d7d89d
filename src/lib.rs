//! # clinicdb
//!
//! A driver-abstracted database access layer for clinic-management services,
//! providing untyped and typed query shaping, an object mapper for
//! plain-struct persistence, and active-record tables over interchangeable
//! SQLite and MySQL backends.
//!
//! ## Features
//!
//! - **One contract per backend**: drivers implement the small
//!   [`Connector`](core::connector::Connector) surface; every result-shaping
//!   convenience is built once on top of it
//! - **Typed projections**: rows deserialize straight into your structs via
//!   `serde`, and serializable structs insert, update and delete themselves
//! - **Statement windowing**: offset/limit travel with the
//!   [`Statement`](core::statement::Statement), not inside hand-edited SQL
//! - **Active records**: [`Table`](core::table::Table) binds one row to named
//!   fields with load/store/delete by primary key, plus `check`/`reorder`
//!   hooks through [`Entity`](core::table::Entity)
//! - **Guarded transactions**: RAII guards roll back open transactions and
//!   release table locks on drop
//!
//! ## Supported Databases
//!
//! | Database | Feature | Notes |
//! |----------|---------|-------|
//! | SQLite | `sqlite` (default) | Bundled, file or in-memory, `now()` shim |
//! | MySQL/MariaDB | `mysql` | TCP or socket, utf8mb4 session |
//!
//! ## Quick Start
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! clinicdb = { version = "0.1", features = ["sqlite"] }
//! ```
//!
//! ### Basic Usage
//!
//! ```rust,no_run
//! use clinicdb::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let db = DatabaseFactory::connect(&ConnectOptions::new("sqlite"))?;
//!
//!     db.execute(&Statement::new(
//!         "CREATE TABLE patients (id INTEGER PRIMARY KEY, name TEXT)",
//!     ))?;
//!     db.execute(&Statement::new("INSERT INTO patients (name) VALUES ('Alice')"))?;
//!
//!     for row in db.query_assoc_list(&Statement::new("SELECT * FROM patients"))? {
//!         if let Some(name) = row.get("name") {
//!             println!("patient: {}", name.as_string());
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ### Active Records
//!
//! ```rust,no_run
//! use clinicdb::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let mut patient = DatabaseFactory::table("patients", "id")?;
//!     patient.set("name", "Ana")?;
//!     patient.store(false)?;
//!     println!("stored patient {:?}", patient.key_value());
//!     Ok(())
//! }
//! ```
//!
//! ### Working with Transactions
//!
//! ```rust,no_run
//! use clinicdb::prelude::*;
//! use std::sync::Arc;
//!
//! fn main() -> Result<()> {
//!     let db = DatabaseFactory::database()?;
//!
//!     let tx = TransactionGuard::begin(Arc::clone(&db))?;
//!     tx.execute(&Statement::new(
//!         "UPDATE invoices SET paid = 1 WHERE patient_id = 7",
//!     ))?;
//!     tx.commit()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Project Structure
//!
//! ```text
//! clinicdb/
//! ├── src/
//! │   ├── core/              # Connector contract, values, tables, factory
//! │   │   ├── connector.rs   # Connector trait and query conveniences
//! │   │   ├── table.rs       # Active-record binding
//! │   │   ├── factory.rs     # Driver registry and shared connector
//! │   │   └── ...
//! │   ├── backends/          # Database backend implementations
//! │   │   ├── sqlite.rs
//! │   │   └── mysql.rs
//! │   └── lib.rs
//! ├── tests/                 # Integration and property tests
//! ├── benches/               # Criterion benchmarks
//! ├── demos/                 # Runnable examples
//! └── Cargo.toml
//! ```

/// Core database access types and traits
pub mod core;

/// Database backend implementations
pub mod backends;

/// Prelude for convenient imports
///
/// ```rust
/// use clinicdb::prelude::*;
///
/// fn describe(driver: Driver) -> &'static str {
///     driver.to_str()
/// }
/// ```
pub mod prelude {
    pub use crate::core::{
        ConnectOptions, Connector, ConnectorExt, DatabaseError, DatabaseFactory, Driver, Entity,
        OrderDirection, Query, Result, ResultSet, Row, Statement, Table, TableLockGuard,
        TransactionGuard, Value,
    };

    #[cfg(feature = "mysql")]
    pub use crate::backends::MysqlConnector;
    #[cfg(feature = "sqlite")]
    pub use crate::backends::SqliteConnector;
}

// Re-export at root level for convenience
pub use crate::core::{
    ConnectOptions, Connector, ConnectorExt, DatabaseError, DatabaseFactory, Driver, Entity,
    OrderDirection, Query, Result, ResultSet, Row, SchemaCache, Statement, Table, TableLockGuard,
    TransactionGuard, Value,
};

#[cfg(feature = "mysql")]
pub use backends::MysqlConnector;
#[cfg(feature = "sqlite")]
pub use backends::SqliteConnector;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_imports() {
        use prelude::*;

        let driver = Driver::Sqlite;
        assert_eq!(driver.to_str(), "sqlite");
        assert!(!driver.is_networked());
    }

    #[test]
    fn test_value_conversions() {
        use prelude::*;

        let val: Value = 42.into();
        assert_eq!(val.as_int(), Some(42));

        let val: Value = "test".into();
        assert_eq!(val.as_string(), "test");

        let val: Value = true.into();
        assert_eq!(val.as_bool(), Some(true));
    }
}
