//! Table column metadata and the per-table schema cache
//!
//! Column metadata is discovered once per table name per cache instance and
//! retained for the cache lifetime. The cache is an injected value shared
//! through `Arc`, so tests and embedders control its scope instead of
//! leaking process-global state.

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use parking_lot::RwLock;

use crate::core::connector::Connector;
use crate::core::error::{DatabaseError, Result};
use crate::core::value::Value;

/// Metadata for one table column
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    /// Column name
    pub name: String,
    /// Raw type as reported by the backend, e.g. `int(11) unsigned`
    pub type_name: String,
    /// Whether the column accepts NULL
    pub nullable: bool,
    /// Declared default, textual form as reported by the backend
    pub default: Option<String>,
    /// Whether the column is part of the primary key
    pub primary: bool,
    /// Backend extra flags, e.g. `auto_increment`
    pub extra: String,
}

impl ColumnInfo {
    /// The declared default as a field value
    pub fn default_value(&self) -> Value {
        match &self.default {
            Some(text) => Value::Text(text.clone()),
            None => Value::Null,
        }
    }

    /// Type name with digits and parens stripped: `int(11) unsigned` to
    /// `int unsigned`
    pub fn bare_type(&self) -> String {
        self.type_name
            .chars()
            .filter(|c| !c.is_ascii_digit() && *c != '(' && *c != ')')
            .collect()
    }
}

/// Ordered column metadata for one table
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    table: String,
    columns: Vec<ColumnInfo>,
}

impl TableSchema {
    /// Build a schema from discovered columns
    pub fn new<S: Into<String>>(table: S, columns: Vec<ColumnInfo>) -> Self {
        TableSchema {
            table: table.into(),
            columns,
        }
    }

    /// The table name this schema describes
    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Columns in table order
    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    /// Look up one column by name
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// True when the table has a column with this name
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Column names in table order
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// True when the table reported no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Fill-once cache of table schemas, keyed by table name
///
/// Write-once-read-many: the first request for a table runs the backend's
/// introspection query, every later request is served from the map.
#[derive(Debug, Default)]
pub struct SchemaCache {
    tables: RwLock<HashMap<String, Arc<TableSchema>>>,
}

impl SchemaCache {
    /// Create an empty cache
    pub fn new() -> Self {
        SchemaCache::default()
    }

    /// Schema for a table, introspecting through the connector on first use
    ///
    /// Fails with a schema error when the table reports zero columns.
    pub fn table(&self, db: &dyn Connector, table: &str) -> Result<Arc<TableSchema>> {
        if let Some(schema) = self.tables.read().get(table) {
            return Ok(schema.clone());
        }

        let columns = db.table_columns(table)?;
        if columns.is_empty() {
            return Err(DatabaseError::schema(format!(
                "table '{table}' does not exist or has no columns"
            )));
        }
        debug!(
            "schema cache fill: {} ({} columns)",
            table,
            columns.len()
        );

        let schema = Arc::new(TableSchema::new(table, columns));
        let mut tables = self.tables.write();
        // First writer wins if two threads raced on the same table.
        Ok(tables
            .entry(table.to_string())
            .or_insert_with(|| schema)
            .clone())
    }

    /// True when a table's schema is already cached
    pub fn contains(&self, table: &str) -> bool {
        self.tables.read().contains_key(table)
    }

    /// Number of cached tables
    pub fn len(&self) -> usize {
        self.tables.read().len()
    }

    /// True when nothing has been cached yet
    pub fn is_empty(&self) -> bool {
        self.tables.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str, type_name: &str) -> ColumnInfo {
        ColumnInfo {
            name: name.to_string(),
            type_name: type_name.to_string(),
            nullable: true,
            default: None,
            primary: false,
            extra: String::new(),
        }
    }

    #[test]
    fn test_bare_type_strips_display_width() {
        assert_eq!(column("id", "int(11) unsigned").bare_type(), "int unsigned");
        assert_eq!(column("name", "varchar(255)").bare_type(), "varchar");
        assert_eq!(column("note", "TEXT").bare_type(), "TEXT");
    }

    #[test]
    fn test_default_value() {
        let mut col = column("status", "int(1)");
        assert_eq!(col.default_value(), Value::Null);
        col.default = Some("0".to_string());
        assert_eq!(col.default_value(), Value::Text("0".to_string()));
    }

    #[test]
    fn test_schema_lookup() {
        let schema = TableSchema::new(
            "patients",
            vec![column("id", "INTEGER"), column("name", "TEXT")],
        );
        assert_eq!(schema.table_name(), "patients");
        assert_eq!(schema.len(), 2);
        assert!(schema.has_column("name"));
        assert!(!schema.has_column("missing"));
        assert_eq!(
            schema.column_names().collect::<Vec<_>>(),
            vec!["id", "name"]
        );
    }
}
