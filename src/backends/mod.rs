//! Database backend implementations
//!
//! Concrete [`Connector`](crate::core::connector::Connector) implementations
//! for the supported engines, selected by cargo feature.

#[cfg(feature = "mysql")]
pub mod mysql;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "mysql")]
pub use mysql::MysqlConnector;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteConnector;
