//! Error types for the database access layer
//!
//! This module defines all error types that can occur during database operations.
//! Backend-native errors are translated into this taxonomy at the driver
//! boundary and never appear in public signatures.

/// Result type alias for database operations
pub type Result<T> = std::result::Result<T, DatabaseError>;

/// Error types for database operations
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// Missing or invalid driver name or connection parameters
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Connection handle could not be established or is not live
    #[error("Connection error: {0}")]
    Connection(String),

    /// Statement execution failed; carries the backend code and message
    /// annotated with the offending SQL
    #[error("Query failed with code {code}: {message} (SQL: {sql})")]
    Query {
        code: i32,
        message: String,
        sql: String,
    },

    /// Referenced table or column does not exist or has no columns
    #[error("Schema error: {0}")]
    Schema(String),

    /// Bind source could not be converted into a field view
    #[error("Bind error: {0}")]
    Bind(String),

    /// Lookup matched no row
    #[error("Not found: {0}")]
    NotFound(String),

    /// Delete or store could not resolve a primary key value
    #[error("Missing primary key: {0}")]
    MissingKey(String),

    /// Insert, update or delete executed but reported failure
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Transaction guard misuse, such as executing on a finished transaction
    #[error("Transaction error: {0}")]
    Transaction(String),
}

impl DatabaseError {
    /// Create a new configuration error
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        DatabaseError::Configuration(msg.into())
    }

    /// Create a new connection error
    pub fn connection<S: Into<String>>(msg: S) -> Self {
        DatabaseError::Connection(msg.into())
    }

    /// Create a new query error from a backend code, message and the SQL text
    pub fn query<M: Into<String>, Q: Into<String>>(code: i32, message: M, sql: Q) -> Self {
        DatabaseError::Query {
            code,
            message: message.into(),
            sql: sql.into(),
        }
    }

    /// Create a new schema error
    pub fn schema<S: Into<String>>(msg: S) -> Self {
        DatabaseError::Schema(msg.into())
    }

    /// Create a new bind error
    pub fn bind<S: Into<String>>(msg: S) -> Self {
        DatabaseError::Bind(msg.into())
    }

    /// Create a new not-found error
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        DatabaseError::NotFound(msg.into())
    }

    /// Create a new missing-key error
    pub fn missing_key<S: Into<String>>(msg: S) -> Self {
        DatabaseError::MissingKey(msg.into())
    }

    /// Create a new persistence error
    pub fn persistence<S: Into<String>>(msg: S) -> Self {
        DatabaseError::Persistence(msg.into())
    }

    /// Create a new transaction error
    pub fn transaction<S: Into<String>>(msg: S) -> Self {
        DatabaseError::Transaction(msg.into())
    }

    /// True when the error is the not-found kind that `Table::load`
    /// recovers as a boolean outcome
    pub fn is_not_found(&self) -> bool {
        matches!(self, DatabaseError::NotFound(_))
    }

    /// Backend error code carried by a query failure, if any
    pub fn query_code(&self) -> Option<i32> {
        match self {
            DatabaseError::Query { code, .. } => Some(*code),
            _ => None,
        }
    }
}
