//! Driver registry and the process-wide connector singleton
//!
//! [`DriverRegistry`] maps driver names, including the historical aliases,
//! to connector builders; the compiled-in backends register themselves and
//! applications can add their own. [`DatabaseFactory`] resolves options
//! through the registry and owns the shared connector most call sites use:
//! `database()` hands out the singleton, `connect()` builds an independent
//! connection, and `table()` models a row over the singleton plus the shared
//! schema cache.

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use once_cell::sync::{Lazy, OnceCell};
use parking_lot::RwLock;

use crate::core::connector::Connector;
use crate::core::error::{DatabaseError, Result};
use crate::core::options::ConnectOptions;
use crate::core::schema::SchemaCache;
use crate::core::table::Table;

/// Builds a connector from connection options
pub type DriverBuilder = fn(&ConnectOptions) -> Result<Arc<dyn Connector>>;

/// Name-to-builder registry of available database drivers
pub struct DriverRegistry {
    builders: RwLock<HashMap<String, DriverBuilder>>,
}

impl DriverRegistry {
    /// Registry pre-populated with the compiled-in backends
    pub fn with_builtin() -> Self {
        let registry = DriverRegistry {
            builders: RwLock::new(HashMap::new()),
        };

        #[cfg(feature = "sqlite")]
        for name in ["sqlite", "sqlite3"] {
            registry.register(name, build_sqlite);
        }

        #[cfg(feature = "mysql")]
        for name in ["mysql", "mysqli", "mariadb"] {
            registry.register(name, build_mysql);
        }

        registry
    }

    /// Register a builder under a driver name, replacing any previous one
    pub fn register(&self, name: &str, builder: DriverBuilder) {
        self.builders
            .write()
            .insert(name.to_ascii_lowercase(), builder);
    }

    /// Whether a driver name resolves to a builder
    pub fn supports(&self, name: &str) -> bool {
        self.builders
            .read()
            .contains_key(&name.to_ascii_lowercase())
    }

    /// Registered driver names, sorted
    pub fn drivers(&self) -> Vec<String> {
        let mut names: Vec<String> = self.builders.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Build a connector for the options' driver
    pub fn create(&self, options: &ConnectOptions) -> Result<Arc<dyn Connector>> {
        let name = options.driver.to_ascii_lowercase();
        let builder = self.builders.read().get(&name).copied().ok_or_else(|| {
            DatabaseError::configuration(format!(
                "no database driver registered for '{}'",
                options.driver
            ))
        })?;

        let db = builder(options)?;
        debug!(
            "opened {} connection to {}",
            db.driver(),
            options.database.as_deref().unwrap_or("<default>")
        );
        Ok(db)
    }
}

#[cfg(feature = "sqlite")]
fn build_sqlite(options: &ConnectOptions) -> Result<Arc<dyn Connector>> {
    Ok(Arc::new(crate::backends::sqlite::SqliteConnector::connect(
        options,
    )?))
}

#[cfg(feature = "mysql")]
fn build_mysql(options: &ConnectOptions) -> Result<Arc<dyn Connector>> {
    Ok(Arc::new(crate::backends::mysql::MysqlConnector::connect(
        options,
    )?))
}

static REGISTRY: Lazy<DriverRegistry> = Lazy::new(DriverRegistry::with_builtin);
static DATABASE: OnceCell<Arc<dyn Connector>> = OnceCell::new();
static SCHEMAS: Lazy<Arc<SchemaCache>> = Lazy::new(|| Arc::new(SchemaCache::new()));

/// Entry point for shared database access
///
/// Call [`DatabaseFactory::initialize`] once at startup with the loaded
/// options; afterwards `database()` returns that connector from anywhere.
/// Without initialization the singleton falls back to the default options,
/// an in-memory SQLite store.
pub struct DatabaseFactory;

impl DatabaseFactory {
    /// The process-wide driver registry
    pub fn registry() -> &'static DriverRegistry {
        &REGISTRY
    }

    /// Build an independent connector for the given options
    pub fn connect(options: &ConnectOptions) -> Result<Arc<dyn Connector>> {
        REGISTRY.create(options)
    }

    /// Install the shared connector from the given options
    ///
    /// Fails when the singleton is already set, whether by an earlier
    /// `initialize` or by a `database()` call that fell back to defaults.
    pub fn initialize(options: &ConnectOptions) -> Result<Arc<dyn Connector>> {
        let db = Self::connect(options)?;
        DATABASE
            .set(db.clone())
            .map_err(|_| DatabaseError::configuration("shared database is already initialized"))?;
        Ok(db)
    }

    /// The shared connector, created on first use
    pub fn database() -> Result<Arc<dyn Connector>> {
        DATABASE
            .get_or_try_init(|| Self::connect(&ConnectOptions::default()))
            .cloned()
    }

    /// The shared schema cache used by `table()`
    pub fn schemas() -> Arc<SchemaCache> {
        Arc::clone(&SCHEMAS)
    }

    /// Model a row of the named table over the shared connector
    pub fn table(name: &str, key: &str) -> Result<Table> {
        Table::new(name, key, Self::database()?, &SCHEMAS)
    }
}
