//! Core database access types and traits
//!
//! This module provides the building blocks of the access layer: the
//! connector contract, values and cursors, statement shaping, schema
//! metadata, the active-record table and the driver factory.

pub mod connector;
pub mod cursor;
pub mod error;
pub mod factory;
pub mod options;
pub mod query;
pub mod schema;
pub mod statement;
pub mod table;
pub mod transaction;
pub mod value;

// Re-export commonly used types
pub use connector::{Connector, ConnectorExt, ConnectorState};
pub use cursor::ResultSet;
pub use error::{DatabaseError, Result};
pub use factory::{DatabaseFactory, DriverBuilder, DriverRegistry};
pub use options::{ConnectOptions, Driver};
pub use query::{OrderDirection, Query};
pub use schema::{ColumnInfo, SchemaCache, TableSchema};
pub use statement::Statement;
pub use table::{Entity, Table};
pub use transaction::{TableLockGuard, TransactionGuard};
pub use value::{Row, Value};
