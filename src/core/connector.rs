//! Backend contract and the generic query surface
//!
//! [`Connector`] is the object-safe trait every driver implements: the
//! escape/execute/metadata primitives plus per-backend conventions. Every
//! result-shaping convenience, the quoting helpers and the object mapper are
//! provided methods built once on top of `execute` and the cursor
//! projections, so drivers only supply what genuinely differs per backend.
//! [`ConnectorExt`] carries the typed generics an object-safe trait cannot,
//! blanket-implemented for every connector including `dyn Connector`.
//!
//! Drivers report through [`ConnectorState`]: they call `start_statement`
//! before running SQL and `record_change`/`record_error` after, which keeps
//! the statement counter, last-SQL text and last-error bookkeeping uniform
//! across backends.

use std::sync::atomic::{AtomicU64, Ordering};

use log::debug;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::core::cursor::ResultSet;
use crate::core::error::{DatabaseError, Result};
use crate::core::options::Driver;
use crate::core::schema::ColumnInfo;
use crate::core::statement::Statement;
use crate::core::value::{Row, Value};

/// Shared execution bookkeeping embedded by every driver
///
/// Tracks the monotonically increasing executed-statement counter, the most
/// recently executed SQL text, the last change counts and the last backend
/// error.
#[derive(Debug, Default)]
pub struct ConnectorState {
    statements: AtomicU64,
    affected: AtomicU64,
    insert_id: AtomicU64,
    last_sql: Mutex<Option<String>>,
    last_error: Mutex<Option<(i32, String)>>,
}

impl ConnectorState {
    /// Fresh bookkeeping with all counters at zero
    pub fn new() -> Self {
        ConnectorState::default()
    }

    /// Record that a statement is about to run: bumps the counter, stores
    /// the SQL, clears the previous error
    pub fn start_statement(&self, sql: &str) {
        self.statements.fetch_add(1, Ordering::Relaxed);
        *self.last_sql.lock() = Some(sql.to_string());
        *self.last_error.lock() = None;
    }

    /// Record the change counts of a completed statement
    pub fn record_change(&self, affected: u64, insert_id: u64) {
        self.affected.store(affected, Ordering::Relaxed);
        self.insert_id.store(insert_id, Ordering::Relaxed);
    }

    /// Record a failed statement's backend code and message
    pub fn record_error(&self, code: i32, message: &str) {
        *self.last_error.lock() = Some((code, message.to_string()));
    }

    /// Number of statements started so far
    pub fn statement_count(&self) -> u64 {
        self.statements.load(Ordering::Relaxed)
    }

    /// Affected-row count of the most recent statement
    pub fn affected_rows(&self) -> u64 {
        self.affected.load(Ordering::Relaxed)
    }

    /// Last insert id of the most recent statement, 0 when none
    pub fn insert_id(&self) -> u64 {
        self.insert_id.load(Ordering::Relaxed)
    }

    /// SQL text of the most recent statement
    pub fn last_sql(&self) -> Option<String> {
        self.last_sql.lock().clone()
    }

    /// Code and message of the most recent failure, cleared on the next
    /// statement
    pub fn last_error(&self) -> Option<(i32, String)> {
        self.last_error.lock().clone()
    }
}

/// Contract every database backend satisfies
///
/// Object safe; the factory hands connectors out as `Arc<dyn Connector>`.
pub trait Connector: Send + Sync {
    /// Backend discriminant
    fn driver(&self) -> Driver;

    /// The shared execution bookkeeping
    fn state(&self) -> &ConnectorState;

    /// Liveness probe against the live client handle
    fn connected(&self) -> bool;

    /// Backend-correct escaping of a scalar for inline interpolation
    ///
    /// With `extra` set, the pattern-matching wildcards `%` and `_` are
    /// escaped as well for LIKE contexts.
    fn escape(&self, text: &str, extra: bool) -> String;

    /// Run a staged statement, window clause applied
    ///
    /// Increments the statement counter; on failure the backend code and
    /// message are captured annotated with the failing SQL.
    fn execute(&self, statement: &Statement) -> Result<ResultSet>;

    /// Switch the active database
    fn select_database(&self, database: &str) -> Result<()>;

    /// Backend version string
    fn version(&self) -> Result<String>;

    /// Collation of the active database, `None` when the backend does not
    /// expose one
    fn collation(&self) -> Result<Option<String>>;

    /// Names of the tables in the active database
    fn table_list(&self) -> Result<Vec<String>>;

    /// Ordered column metadata for a table; empty when the table is unknown
    fn table_columns(&self, table: &str) -> Result<Vec<ColumnInfo>>;

    /// CREATE statements for the given tables, keyed per table
    fn table_create(&self, tables: &[&str]) -> Result<Vec<(String, String)>>;

    /// Key/index information rows for a table
    fn table_keys(&self, table: &str) -> Result<Vec<Row>>;

    /// Remove a table
    fn drop_table(&self, table: &str, if_exists: bool) -> Result<()>;

    /// Rename a table
    fn rename_table(&self, old: &str, new: &str) -> Result<()>;

    /// Take an exclusive write lock on a table
    fn lock_table(&self, table: &str) -> Result<()>;

    /// Release all table locks held by this connection
    fn unlock_tables(&self) -> Result<()>;

    /// Open a transaction
    fn begin(&self) -> Result<()>;

    /// Commit the open transaction
    fn commit(&self) -> Result<()>;

    /// Roll back the open transaction
    fn rollback(&self) -> Result<()>;

    /// Minimum backend version this driver supports
    fn minimum_version(&self) -> &'static str;

    /// Identifier quoting characters, opening and closing
    fn name_quote(&self) -> (char, char) {
        ('`', '`')
    }

    /// The null timestamp convention shared by the drivers
    fn null_date(&self) -> &'static str {
        "0000-00-00 00:00:00"
    }

    /// strftime-style format for datetime literals
    fn date_format(&self) -> &'static str {
        "%Y-%m-%d %H:%M:%S"
    }

    /// Empty all rows from a table
    fn truncate(&self, table: &str) -> Result<()> {
        let sql = format!("TRUNCATE TABLE {}", self.quote_name(table, None));
        self.execute(&Statement::new(sql)).map(|_| ())
    }

    /// Number of statements started on this connector
    fn statement_count(&self) -> u64 {
        self.state().statement_count()
    }

    /// Affected-row count reported for the most recent statement
    fn affected_rows(&self) -> u64 {
        self.state().affected_rows()
    }

    /// Last insert id reported for the most recent statement, 0 when none
    fn insert_id(&self) -> u64 {
        self.state().insert_id()
    }

    /// SQL text of the most recent statement
    fn last_sql(&self) -> Option<String> {
        self.state().last_sql()
    }

    /// Backend code and message of the most recent failure
    fn last_error(&self) -> Option<(i32, String)> {
        self.state().last_error()
    }

    /// Whether the installed backend version satisfies the driver minimum
    fn version_compatible(&self) -> Result<bool> {
        let installed = self.version()?;
        Ok(compare_versions(&installed, self.minimum_version()) != std::cmp::Ordering::Less)
    }

    /// Quote a text literal, escaping unless explicitly suppressed
    fn quote_text(&self, text: &str, escape: bool) -> String {
        if escape {
            format!("'{}'", self.escape(text, false))
        } else {
            format!("'{text}'")
        }
    }

    /// Render a scalar value as an SQL literal
    ///
    /// Text is single-quoted (escaped unless suppressed), numerics and
    /// booleans render bare, null renders `NULL`, binary renders as a hex
    /// literal.
    fn quote(&self, value: &Value, escape: bool) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(v) => (*v as i64).to_string(),
            Value::Int(v) => v.to_string(),
            Value::Double(v) if v.is_finite() => v.to_string(),
            Value::Double(_) => "NULL".to_string(),
            Value::Text(s) => self.quote_text(s, escape),
            Value::Bytes(b) => {
                let hex: String = b.iter().map(|byte| format!("{byte:02X}")).collect();
                format!("X'{hex}'")
            }
        }
    }

    /// Quote a possibly dot-qualified identifier, with an optional alias
    fn quote_name(&self, name: &str, alias: Option<&str>) -> String {
        let (open, close) = self.name_quote();
        let quoted: Vec<String> = name
            .split('.')
            .map(|part| format!("{open}{part}{close}"))
            .collect();
        let mut out = quoted.join(".");
        if let Some(alias) = alias {
            out.push_str(" AS ");
            out.push(open);
            out.push_str(alias);
            out.push(close);
        }
        out
    }

    /// Quote a list of identifiers with an optional parallel alias list
    ///
    /// Fails when the alias list length does not match.
    fn quote_names(&self, names: &[&str], aliases: Option<&[&str]>) -> Result<Vec<String>> {
        match aliases {
            None => Ok(names.iter().map(|n| self.quote_name(n, None)).collect()),
            Some(aliases) if aliases.len() == names.len() => Ok(names
                .iter()
                .zip(aliases.iter())
                .map(|(name, alias)| self.quote_name(name, Some(alias)))
                .collect()),
            Some(aliases) => Err(DatabaseError::configuration(format!(
                "alias list length {} does not match identifier list length {}",
                aliases.len(),
                names.len()
            ))),
        }
    }

    /// Column-name to bare-type map for a table, in column order
    fn table_column_types(&self, table: &str) -> Result<Vec<(String, String)>> {
        Ok(self
            .table_columns(table)?
            .iter()
            .map(|col| (col.name.clone(), col.bare_type()))
            .collect())
    }

    /// First row of the result as a field-name map
    fn query_assoc(&self, statement: &Statement) -> Result<Option<Row>> {
        let mut result = self.execute(statement)?;
        let row = result.fetch_assoc();
        result.free();
        Ok(row)
    }

    /// All rows as field-name maps, in result order
    fn query_assoc_list(&self, statement: &Statement) -> Result<Vec<Row>> {
        let mut result = self.execute(statement)?;
        let mut rows = Vec::with_capacity(result.row_count());
        while let Some(row) = result.fetch_assoc() {
            rows.push(row);
        }
        result.free();
        Ok(rows)
    }

    /// All rows re-keyed by a column's value
    ///
    /// Non-unique keys overwrite the earlier entry in place; the documented
    /// last-write-wins behavior of re-keyed lists.
    fn query_assoc_list_keyed(&self, statement: &Statement, key: &str) -> Result<Vec<(String, Row)>> {
        let mut result = self.execute(statement)?;
        let mut rows: Vec<(String, Row)> = Vec::new();
        while let Some(row) = result.fetch_assoc() {
            let key_value = row
                .get(key)
                .ok_or_else(|| {
                    DatabaseError::schema(format!("key column '{key}' is not in the result"))
                })?
                .as_string();
            upsert_keyed(&mut rows, key_value, row);
        }
        result.free();
        Ok(rows)
    }

    /// Map one column's value to another's, re-keyed with last-write-wins
    fn query_value_map(
        &self,
        statement: &Statement,
        key: &str,
        column: &str,
    ) -> Result<Vec<(String, Value)>> {
        let mut result = self.execute(statement)?;
        let mut pairs: Vec<(String, Value)> = Vec::new();
        while let Some(row) = result.fetch_assoc() {
            let key_value = row
                .get(key)
                .ok_or_else(|| {
                    DatabaseError::schema(format!("key column '{key}' is not in the result"))
                })?
                .as_string();
            let value = row
                .get(column)
                .ok_or_else(|| {
                    DatabaseError::schema(format!("value column '{column}' is not in the result"))
                })?
                .clone();
            upsert_keyed(&mut pairs, key_value, value);
        }
        result.free();
        Ok(pairs)
    }

    /// First row of the result as a positional list
    fn query_row(&self, statement: &Statement) -> Result<Option<Vec<Value>>> {
        let mut result = self.execute(statement)?;
        let row = result.fetch_row();
        result.free();
        Ok(row)
    }

    /// All rows as positional lists, in result order
    fn query_row_list(&self, statement: &Statement) -> Result<Vec<Vec<Value>>> {
        let mut result = self.execute(statement)?;
        let mut rows = Vec::with_capacity(result.row_count());
        while let Some(row) = result.fetch_row() {
            rows.push(row);
        }
        result.free();
        Ok(rows)
    }

    /// All rows as positional lists re-keyed by a named column's value,
    /// last-write-wins
    fn query_row_list_keyed(
        &self,
        statement: &Statement,
        key: &str,
    ) -> Result<Vec<(String, Vec<Value>)>> {
        let mut result = self.execute(statement)?;
        let index = result
            .column_names()
            .iter()
            .position(|name| name == key)
            .ok_or_else(|| {
                DatabaseError::schema(format!("key column '{key}' is not in the result"))
            })?;
        let mut rows: Vec<(String, Vec<Value>)> = Vec::new();
        while let Some(row) = result.fetch_row() {
            let key_value = row[index].as_string();
            upsert_keyed(&mut rows, key_value, row);
        }
        result.free();
        Ok(rows)
    }

    /// One column of every row, selected by position
    fn query_column(&self, statement: &Statement, offset: usize) -> Result<Vec<Value>> {
        let mut result = self.execute(statement)?;
        let mut values = Vec::with_capacity(result.row_count());
        while let Some(row) = result.fetch_row() {
            values.push(row.get(offset).cloned().unwrap_or(Value::Null));
        }
        result.free();
        Ok(values)
    }

    /// Insert a row built from every non-null field of the view
    ///
    /// The literal string `now()` passes through unquoted so server-side
    /// timestamps work. On success returns the backend's last insert id
    /// (0 when the backend reports none) and, when a key field was named and
    /// a nonzero id came back, writes the id into the view.
    fn insert_object(&self, table: &str, row: &mut Row, key: Option<&str>) -> Result<u64> {
        let mut fields = Vec::new();
        let mut values = Vec::new();
        for (name, value) in row.iter() {
            if value.is_null() {
                continue;
            }
            fields.push(self.quote_name(name, None));
            values.push(match value {
                Value::Text(s) if s.eq_ignore_ascii_case("now()") => s.clone(),
                other => self.quote(other, true),
            });
        }
        if fields.is_empty() {
            return Err(DatabaseError::persistence(format!(
                "no fields to insert into {table}"
            )));
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.quote_name(table, None),
            fields.join(","),
            values.join(",")
        );
        let result = self.execute(&Statement::new(sql))?;

        let id = result.last_insert_id();
        if let Some(key) = key {
            if id != 0 {
                row.set(key, Value::Int(id as i64));
            }
        }
        Ok(id)
    }

    /// Update a row by its key field from the view's fields
    ///
    /// Null fields are set to SQL NULL only when `update_nulls`; otherwise
    /// they are skipped. Returns the affected-row count: `Ok(0)` means the
    /// update ran but matched or changed nothing, while a missing key value
    /// or an empty field set fail before anything executes.
    fn update_object(&self, table: &str, row: &Row, key: &str, update_nulls: bool) -> Result<u64> {
        let mut fields = Vec::new();
        let mut predicate = None;
        for (name, value) in row.iter() {
            if name == key {
                if !value.is_null() {
                    predicate = Some(format!(
                        "{}={}",
                        self.quote_name(name, None),
                        self.quote(value, true)
                    ));
                }
                continue;
            }

            let rendered = if value.is_null() {
                if !update_nulls {
                    continue;
                }
                "NULL".to_string()
            } else {
                match value {
                    Value::Text(s) if s.eq_ignore_ascii_case("now()") => s.clone(),
                    other => self.quote(other, true),
                }
            };
            fields.push(format!("{}={}", self.quote_name(name, None), rendered));
        }

        let predicate = predicate.ok_or_else(|| {
            DatabaseError::persistence(format!("no value for key '{key}' to update {table} by"))
        })?;
        if fields.is_empty() {
            return Err(DatabaseError::persistence(format!(
                "no fields to update in {table}"
            )));
        }

        let sql = format!(
            "UPDATE {} SET {} WHERE {}",
            self.quote_name(table, None),
            fields.join(","),
            predicate
        );
        let result = self.execute(&Statement::new(sql))?;
        Ok(result.affected_rows())
    }

    /// Delete rows matching every non-null field of the view
    ///
    /// A composite-match delete, not a primary-key delete. Returns
    /// `Ok(false)` without executing when no field yields a predicate, so an
    /// empty view can never emit an unfiltered DELETE.
    fn delete_object(&self, table: &str, row: &Row) -> Result<bool> {
        let mut predicates = Vec::new();
        for (name, value) in row.iter() {
            if value.is_null() {
                continue;
            }
            predicates.push(format!(
                "{}={}",
                self.quote_name(name, None),
                self.quote(value, true)
            ));
        }
        if predicates.is_empty() {
            debug!("delete_object on {table}: no non-null fields, nothing to match");
            return Ok(false);
        }

        let sql = format!(
            "DELETE FROM {} WHERE {}",
            self.quote_name(table, None),
            predicates.join(" AND ")
        );
        let result = self.execute(&Statement::new(sql))?;
        Ok(result.affected_rows() > 0)
    }
}

impl std::fmt::Debug for dyn Connector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connector")
            .field("driver", &self.driver())
            .finish_non_exhaustive()
    }
}

/// Typed conveniences over any connector, including `dyn Connector`
pub trait ConnectorExt: Connector {
    /// First row of the result projected onto a deserializable type
    fn query_object<T: DeserializeOwned>(&self, statement: &Statement) -> Result<Option<T>> {
        let mut result = self.execute(statement)?;
        let object = result.fetch_object()?;
        result.free();
        Ok(object)
    }

    /// All rows projected onto a deserializable type, in result order
    fn query_object_list<T: DeserializeOwned>(&self, statement: &Statement) -> Result<Vec<T>> {
        let mut result = self.execute(statement)?;
        let mut objects = Vec::with_capacity(result.row_count());
        while let Some(object) = result.fetch_object()? {
            objects.push(object);
        }
        result.free();
        Ok(objects)
    }

    /// Typed rows re-keyed by a column's value, last-write-wins
    fn query_object_list_keyed<T: DeserializeOwned>(
        &self,
        statement: &Statement,
        key: &str,
    ) -> Result<Vec<(String, T)>> {
        let mut result = self.execute(statement)?;
        let mut objects: Vec<(String, T)> = Vec::new();
        while let Some(row) = result.fetch_assoc() {
            let key_value = row
                .get(key)
                .ok_or_else(|| {
                    DatabaseError::schema(format!("key column '{key}' is not in the result"))
                })?
                .as_string();
            upsert_keyed(&mut objects, key_value, row.to_object()?);
        }
        result.free();
        Ok(objects)
    }

    /// Insert from a serializable struct; returns the new id
    ///
    /// The id is not written back into the struct; assign the returned value
    /// where needed.
    fn insert_struct<T: Serialize>(&self, table: &str, obj: &T, key: Option<&str>) -> Result<u64> {
        let mut row = Row::from_object(obj)?;
        self.insert_object(table, &mut row, key)
    }

    /// Update by key field from a serializable struct
    fn update_struct<T: Serialize>(
        &self,
        table: &str,
        obj: &T,
        key: &str,
        update_nulls: bool,
    ) -> Result<u64> {
        let row = Row::from_object(obj)?;
        self.update_object(table, &row, key, update_nulls)
    }

    /// Composite-match delete from a serializable struct
    fn delete_struct<T: Serialize>(&self, table: &str, obj: &T) -> Result<bool> {
        let row = Row::from_object(obj)?;
        self.delete_object(table, &row)
    }
}

impl<C: Connector + ?Sized> ConnectorExt for C {}

/// Replace the value at an existing key or append, keeping first-seen order
fn upsert_keyed<T>(list: &mut Vec<(String, T)>, key: String, value: T) {
    match list.iter_mut().find(|(k, _)| *k == key) {
        Some(slot) => slot.1 = value,
        None => list.push((key, value)),
    }
}

/// Compare dotted version strings numerically, ignoring non-digit suffixes
fn compare_versions(installed: &str, minimum: &str) -> std::cmp::Ordering {
    fn parts(version: &str) -> Vec<u64> {
        version
            .split('.')
            .map(|part| {
                part.chars()
                    .take_while(|c| c.is_ascii_digit())
                    .collect::<String>()
                    .parse()
                    .unwrap_or(0)
            })
            .collect()
    }

    let a = parts(installed);
    let b = parts(minimum);
    for i in 0..a.len().max(b.len()) {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        match x.cmp(&y) {
            std::cmp::Ordering::Equal => continue,
            other => return other,
        }
    }
    std::cmp::Ordering::Equal
}
