//! Active-record binding of one database row to named fields
//!
//! [`Table`] models a single row of one table: construction pulls the column
//! set through the [`SchemaCache`], `bind` copies matching fields from a
//! [`Row`], and `load`/`store`/`delete` move the instance between memory and
//! the database by primary key. [`Entity`] layers the overridable `check`
//! and `reorder` hooks on top and provides `save` as the bind-check-store
//! shortcut, so a typed model only implements `record()` and whichever hooks
//! it needs.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::core::connector::Connector;
use crate::core::error::{DatabaseError, Result};
use crate::core::query::Query;
use crate::core::schema::{SchemaCache, TableSchema};
use crate::core::statement::Statement;
use crate::core::value::{Row, Value};

/// One row of one table, with fields named after its columns
///
/// The field set is fixed by the table's schema at construction; every
/// column starts out null until `reset`, `bind` or `load` fills it.
#[derive(Debug)]
pub struct Table {
    db: Arc<dyn Connector>,
    schema: Arc<TableSchema>,
    table: String,
    key: String,
    row: Row,
    locked: bool,
}

impl Table {
    /// Model a table row; fails when the table has no columns
    pub fn new(
        table: &str,
        key: &str,
        db: Arc<dyn Connector>,
        cache: &SchemaCache,
    ) -> Result<Table> {
        let schema = cache.table(db.as_ref(), table)?;
        if !schema.has_column(key) {
            return Err(DatabaseError::schema(format!(
                "unable to find the key field '{key}' in the table {table}"
            )));
        }
        let row = schema
            .column_names()
            .map(|name| (name.to_string(), Value::Null))
            .collect::<Row>();
        Ok(Table {
            db,
            schema,
            table: table.to_string(),
            key: key.to_string(),
            row,
            locked: false,
        })
    }

    /// Name of the table being modeled
    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Name of the primary key field
    pub fn key_name(&self) -> &str {
        &self.key
    }

    /// The connector this instance reads and writes through
    pub fn db(&self) -> &Arc<dyn Connector> {
        &self.db
    }

    /// Swap the connector used by this instance
    pub fn set_db(&mut self, db: Arc<dyn Connector>) {
        self.db = db;
    }

    /// Column metadata the field set was built from
    pub fn fields(&self) -> &TableSchema {
        &self.schema
    }

    /// Current value of a field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.row.get(field)
    }

    /// Set one field; unknown columns are refused
    pub fn set<V: Into<Value>>(&mut self, field: &str, value: V) -> Result<()> {
        if !self.schema.has_column(field) {
            return Err(DatabaseError::schema(format!(
                "unable to find the field '{field}' in the table {}",
                self.table
            )));
        }
        self.row.set(field, value.into());
        Ok(())
    }

    /// Current value of the primary key field
    pub fn key_value(&self) -> &Value {
        self.row.get(&self.key).unwrap_or(&Value::Null)
    }

    /// The full field view, in column order
    pub fn row(&self) -> &Row {
        &self.row
    }

    /// Project the fields onto a typed value
    pub fn to_object<T: DeserializeOwned>(&self) -> Result<T> {
        self.row.to_object()
    }

    /// Restore every non-key field to its column default
    pub fn reset(&mut self) {
        for column in self.schema.columns() {
            if column.name == self.key {
                continue;
            }
            self.row.set(column.name.clone(), column.default_value());
        }
    }

    /// Copy matching fields from the source view
    ///
    /// Only fields that exist on this table are taken; anything else in the
    /// source is ignored, as are the named `ignore` fields.
    pub fn bind(&mut self, src: &Row, ignore: &[&str]) -> Result<()> {
        for name in self.schema.column_names() {
            if ignore.contains(&name) {
                continue;
            }
            if let Some(value) = src.get(name) {
                self.row.set(name, value.clone());
            }
        }
        Ok(())
    }

    /// Bind from any serializable source with named scalar fields
    pub fn bind_object<T: Serialize>(&mut self, src: &T, ignore: &[&str]) -> Result<()> {
        let row = Row::from_object(src)?;
        self.bind(&row, ignore)
    }

    /// Load the row matching the instance's current key value
    ///
    /// An unset key is a successful no-op: there is nothing to look up yet.
    pub fn load(&mut self, reset: bool) -> Result<bool> {
        let key_value = self.key_value().clone();
        if key_value.is_empty_key() {
            return Ok(true);
        }
        let keys = Row::from_pairs([(self.key.clone(), key_value)]);
        self.load_where(&keys, reset)
    }

    /// Load the row with the given primary key value
    pub fn load_key<V: Into<Value>>(&mut self, key: V, reset: bool) -> Result<bool> {
        let keys = Row::from_pairs([(self.key.clone(), key.into())]);
        self.load_where(&keys, reset)
    }

    /// Load the first row matching every given field, AND-combined
    ///
    /// Returns `Ok(false)` when no row matched; a matched row is bound onto
    /// the instance. Criteria naming a field the table does not have are a
    /// schema error.
    pub fn load_where(&mut self, keys: &Row, reset: bool) -> Result<bool> {
        if reset {
            self.reset();
        }

        let mut query = Query::select(&self.table);
        for (field, value) in keys.iter() {
            if !self.schema.has_column(field) {
                return Err(DatabaseError::schema(format!(
                    "unable to find the field '{field}' in the table {}",
                    self.table
                )));
            }
            query = query.and_where(format!(
                "{} = {}",
                self.db.quote_name(field, None),
                self.db.quote(value, true)
            ));
        }

        let statement: Statement = query.into();
        match self.db.query_assoc(&statement)? {
            Some(row) => {
                self.bind(&row, &[])?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Persist the instance: INSERT when the key is empty, UPDATE otherwise
    ///
    /// A fresh insert writes the generated id back into the key field. An
    /// update that matched or changed no rows still succeeds; only an
    /// execution failure is an error. Releases a held table lock on success.
    pub fn store(&mut self, update_nulls: bool) -> Result<()> {
        if self.key_value().is_empty_key() {
            self.db
                .insert_object(&self.table, &mut self.row, Some(&self.key))?;
        } else {
            self.db
                .update_object(&self.table, &self.row, &self.key, update_nulls)?;
        }

        if self.locked {
            self.unlock()?;
        }
        Ok(())
    }

    /// Delete by the given key value, or the instance's own when omitted
    pub fn delete(&mut self, key: Option<Value>) -> Result<()> {
        let key_value = match key {
            Some(value) => value,
            None => self.key_value().clone(),
        };
        if key_value.is_null() {
            return Err(DatabaseError::missing_key(format!(
                "no primary key value to delete from {}",
                self.table
            )));
        }

        let query = Query::delete(&self.table).and_where(format!(
            "{} = {}",
            self.key,
            self.db.quote(&key_value, true)
        ));
        let statement: Statement = query.into();
        self.db.execute(&statement)?;
        Ok(())
    }

    /// Take a write lock on the modeled table until `store` or `unlock`
    pub fn lock(&mut self) -> Result<()> {
        self.db.lock_table(&self.table)?;
        self.locked = true;
        Ok(())
    }

    /// Release the connection's table locks
    pub fn unlock(&mut self) -> Result<()> {
        self.db.unlock_tables()?;
        self.locked = false;
        Ok(())
    }
}

/// Hook surface for typed models built on [`Table`]
///
/// `save` is provided: bind, run the `check` hook, store, then hand an
/// ordering predicate to `reorder` when an ordering filter field is named.
/// The default hooks accept everything and reorder nothing, so a model with
/// no special rules only implements `record()`.
pub trait Entity {
    /// The underlying table record
    fn record(&mut self) -> &mut Table;

    /// Sanity-check the bound fields before storage
    fn check(&mut self) -> Result<()> {
        Ok(())
    }

    /// Re-sequence sibling rows after a save
    ///
    /// `filter` is a rendered predicate selecting the siblings, such as
    /// `` `section` = 3 ``.
    fn reorder(&mut self, _filter: &str) -> Result<()> {
        Ok(())
    }

    /// Bind, check and store in one step
    fn save(&mut self, src: &Row, ordering_filter: Option<&str>, ignore: &[&str]) -> Result<()> {
        self.record().bind(src, ignore)?;
        self.check()?;
        self.record().store(false)?;

        if let Some(filter) = ordering_filter {
            let fragment = {
                let record = self.record();
                let value = record.get(filter).cloned().unwrap_or(Value::Null);
                format!(
                    "{} = {}",
                    record.db().quote_name(filter, None),
                    record.db().quote(&value, true)
                )
            };
            self.reorder(&fragment)?;
        }
        Ok(())
    }
}

impl Entity for Table {
    fn record(&mut self) -> &mut Table {
        self
    }
}
