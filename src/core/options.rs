//! Connection configuration
//!
//! This module defines the driver discriminant, the immutable connection
//! options a connector is built from, and the host-spec normalization the
//! MySQL driver applies to combined `host:port` / `host:socket` values.

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::{DatabaseError, Result};

/// Supported database drivers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Driver {
    /// MySQL/MariaDB database
    Mysql,
    /// SQLite database
    Sqlite,
}

impl Driver {
    /// Convert the driver to its registry name
    pub fn to_str(&self) -> &'static str {
        match self {
            Driver::Mysql => "mysql",
            Driver::Sqlite => "sqlite",
        }
    }

    /// Check whether the driver talks to a server over a connection handle
    /// rather than a local file
    pub fn is_networked(&self) -> bool {
        matches!(self, Driver::Mysql)
    }
}

impl std::fmt::Display for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for Driver {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "mysql" | "mysqli" | "mariadb" => Ok(Driver::Mysql),
            "sqlite" | "sqlite3" => Ok(Driver::Sqlite),
            _ => Err(DatabaseError::configuration(format!(
                "unknown driver '{s}'"
            ))),
        }
    }
}

/// Immutable connection configuration
///
/// Built in code or loaded from a TOML file. The options identify one
/// connector; they never change once the connector has been constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectOptions {
    /// Registry name of the driver to construct
    pub driver: String,
    /// Server host, optionally `host:port` or `host:socket`
    pub host: Option<String>,
    /// User name; networked drivers default to `root`
    pub user: Option<String>,
    /// Password
    pub password: Option<String>,
    /// Database name, or file path for file-based drivers
    pub database: Option<String>,
    /// Select the configured database right after connecting
    pub select: bool,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        ConnectOptions {
            driver: "sqlite".to_string(),
            host: None,
            user: None,
            password: None,
            database: None,
            select: true,
        }
    }
}

impl ConnectOptions {
    /// Options for a named driver, everything else defaulted
    pub fn new<S: Into<String>>(driver: S) -> Self {
        ConnectOptions {
            driver: driver.into(),
            ..ConnectOptions::default()
        }
    }

    /// Load options from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            DatabaseError::configuration(format!(
                "cannot read config file {}: {e}",
                path.display()
            ))
        })?;
        toml::from_str(&text).map_err(|e| {
            DatabaseError::configuration(format!(
                "invalid config file {}: {e}",
                path.display()
            ))
        })
    }

    /// Set the host
    #[must_use]
    pub fn with_host<S: Into<String>>(mut self, host: S) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the user
    #[must_use]
    pub fn with_user<S: Into<String>>(mut self, user: S) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Set the password
    #[must_use]
    pub fn with_password<S: Into<String>>(mut self, password: S) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the database name or file path
    #[must_use]
    pub fn with_database<S: Into<String>>(mut self, database: S) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Set whether the driver selects the database right after connecting
    #[must_use]
    pub fn with_select(mut self, select: bool) -> Self {
        self.select = select;
        self
    }
}

/// Split a combined host value into host, TCP port and socket path
///
/// The value splits on the first colon: a purely numeric suffix routes to
/// the port, anything else to a Unix socket path. An empty host falls back
/// to `localhost`.
pub fn split_host_spec(spec: &str) -> (String, Option<u16>, Option<String>) {
    let (host, suffix) = match spec.split_once(':') {
        Some((host, suffix)) => (host, Some(suffix)),
        None => (spec, None),
    };

    let host = if host.is_empty() {
        "localhost".to_string()
    } else {
        host.to_string()
    };

    match suffix {
        None | Some("") => (host, None, None),
        Some(suffix) if suffix.bytes().all(|b| b.is_ascii_digit()) => {
            match suffix.parse::<u16>() {
                Ok(port) => (host, Some(port), None),
                Err(_) => (host, None, Some(suffix.to_string())),
            }
        }
        Some(suffix) => (host, None, Some(suffix.to_string())),
    }
}
