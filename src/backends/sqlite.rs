//! SQLite database backend
//!
//! File-backed or in-memory connector over rusqlite. The connection is
//! opened once at construction with foreign keys enabled, and a `now()`
//! scalar function is registered so SQL written for the MySQL backend keeps
//! working unchanged. Locking and database selection are no-ops here: the
//! engine serializes writers itself and serves exactly one database per
//! connection.

use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info};
use parking_lot::Mutex;
use rusqlite::functions::FunctionFlags;
use rusqlite::types::ValueRef;
use rusqlite::Connection;

use crate::core::connector::{Connector, ConnectorState};
use crate::core::cursor::ResultSet;
use crate::core::error::{DatabaseError, Result};
use crate::core::options::{ConnectOptions, Driver};
use crate::core::schema::ColumnInfo;
use crate::core::statement::Statement;
use crate::core::value::{Row, Value};

/// SQLite connector
pub struct SqliteConnector {
    connection: Mutex<Connection>,
    state: ConnectorState,
    in_transaction: AtomicBool,
    database: String,
}

impl SqliteConnector {
    /// Open the database named in the options, `:memory:` when unset
    pub fn connect(options: &ConnectOptions) -> Result<Self> {
        let path = options.database.as_deref().unwrap_or(":memory:");
        let conn = Connection::open(path).map_err(|e| {
            DatabaseError::connection(format!("cannot open sqlite database '{path}': {e}"))
        })?;

        conn.execute("PRAGMA foreign_keys = ON", []).map_err(|e| {
            DatabaseError::connection(format!("cannot enable foreign keys: {e}"))
        })?;

        // MySQL-style now(), so shared SQL and the object mapper's timestamp
        // passthrough behave identically on both backends.
        conn.create_scalar_function("now", 0, FunctionFlags::SQLITE_UTF8, |_ctx| {
            Ok(chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string())
        })
        .map_err(|e| DatabaseError::connection(format!("cannot register now(): {e}")))?;

        info!("sqlite database '{path}' opened");
        Ok(SqliteConnector {
            connection: Mutex::new(conn),
            state: ConnectorState::new(),
            in_transaction: AtomicBool::new(false),
            database: path.to_string(),
        })
    }

    /// Open a private in-memory database
    pub fn memory() -> Result<Self> {
        Self::connect(&ConnectOptions::new("sqlite"))
    }

    /// Path of the open database
    pub fn database(&self) -> &str {
        &self.database
    }

    fn query_error(&self, err: rusqlite::Error, sql: &str) -> DatabaseError {
        let code = match &err {
            rusqlite::Error::SqliteFailure(e, _) => e.extended_code,
            _ => -1,
        };
        self.state.record_error(code, &err.to_string());
        DatabaseError::query(code, err.to_string(), sql)
    }

    fn decode(value: ValueRef<'_>) -> Value {
        match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(v) => Value::Int(v),
            ValueRef::Real(v) => Value::Double(v),
            ValueRef::Text(v) => Value::Text(String::from_utf8_lossy(v).to_string()),
            ValueRef::Blob(v) => Value::Bytes(v.to_vec()),
        }
    }

    /// Unwrap the textual DEFAULT expression reported by `table_info`
    fn strip_default(raw: Option<String>) -> Option<String> {
        let text = raw?;
        if text.eq_ignore_ascii_case("NULL") {
            return None;
        }
        match text.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
            Some(inner) => Some(inner.replace("''", "'")),
            None => Some(text),
        }
    }
}

impl Connector for SqliteConnector {
    fn driver(&self) -> Driver {
        Driver::Sqlite
    }

    fn state(&self) -> &ConnectorState {
        &self.state
    }

    fn connected(&self) -> bool {
        self.connection
            .lock()
            .query_row("SELECT 1", [], |_| Ok(()))
            .is_ok()
    }

    fn escape(&self, text: &str, extra: bool) -> String {
        let mut escaped = text.replace('\'', "''");
        if extra {
            escaped = escaped.replace('%', "\\%").replace('_', "\\_");
        }
        escaped
    }

    fn execute(&self, statement: &Statement) -> Result<ResultSet> {
        let sql = statement.to_sql();
        self.state.start_statement(&sql);
        debug!("sqlite: {sql}");

        let conn = self.connection.lock();
        let mut stmt = conn
            .prepare(sql.as_ref())
            .map_err(|e| self.query_error(e, &sql))?;

        if stmt.column_count() > 0 {
            let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
            let mut decoded = Vec::new();
            let mut rows = stmt.query([]).map_err(|e| self.query_error(e, &sql))?;
            while let Some(row) = rows.next().map_err(|e| self.query_error(e, &sql))? {
                let mut values = Vec::with_capacity(columns.len());
                for i in 0..columns.len() {
                    let cell = row.get_ref(i).map_err(|e| self.query_error(e, &sql))?;
                    values.push(Self::decode(cell));
                }
                decoded.push(values);
            }
            drop(rows);

            self.state.record_change(0, conn.last_insert_rowid() as u64);
            Ok(ResultSet::new(columns, decoded, 0, 0))
        } else {
            let affected = stmt.execute([]).map_err(|e| self.query_error(e, &sql))? as u64;
            let insert_id = conn.last_insert_rowid() as u64;
            self.state.record_change(affected, insert_id);
            Ok(ResultSet::from_change(affected, insert_id))
        }
    }

    /// SQLite serves one database per connection; selecting is a no-op
    fn select_database(&self, _database: &str) -> Result<()> {
        Ok(())
    }

    fn version(&self) -> Result<String> {
        let values = self.query_column(&Statement::new("SELECT sqlite_version()"), 0)?;
        Ok(values.first().map(Value::as_string).unwrap_or_default())
    }

    /// SQLite has collating functions rather than a database collation
    fn collation(&self) -> Result<Option<String>> {
        Ok(None)
    }

    fn table_list(&self) -> Result<Vec<String>> {
        let statement = Statement::new(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        );
        let values = self.query_column(&statement, 0)?;
        Ok(values.iter().map(Value::as_string).collect())
    }

    fn table_columns(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        let statement = Statement::new(format!(
            "SELECT name, type, \"notnull\", dflt_value, pk \
             FROM pragma_table_info('{}')",
            self.escape(table, false)
        ));

        let mut columns = Vec::new();
        for row in self.query_row_list(&statement)? {
            columns.push(ColumnInfo {
                name: row[0].as_string(),
                type_name: row[1].as_string(),
                nullable: row[2].as_int().unwrap_or(0) == 0,
                default: Self::strip_default(match &row[3] {
                    Value::Null => None,
                    other => Some(other.as_string()),
                }),
                primary: row[4].as_int().unwrap_or(0) > 0,
                extra: String::new(),
            });
        }
        Ok(columns)
    }

    fn table_create(&self, tables: &[&str]) -> Result<Vec<(String, String)>> {
        let mut creates = Vec::with_capacity(tables.len());
        for table in tables {
            let statement = Statement::new(format!(
                "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = '{}'",
                self.escape(table, false)
            ));
            match self.query_row(&statement)? {
                Some(row) => creates.push(((*table).to_string(), row[0].as_string())),
                None => {
                    return Err(DatabaseError::schema(format!("no such table: {table}")));
                }
            }
        }
        Ok(creates)
    }

    fn table_keys(&self, table: &str) -> Result<Vec<Row>> {
        let statement = Statement::new(format!(
            "SELECT seq, name, \"unique\", origin, partial FROM pragma_index_list('{}')",
            self.escape(table, false)
        ));
        self.query_assoc_list(&statement)
    }

    fn drop_table(&self, table: &str, if_exists: bool) -> Result<()> {
        let sql = if if_exists {
            format!("DROP TABLE IF EXISTS {}", self.quote_name(table, None))
        } else {
            format!("DROP TABLE {}", self.quote_name(table, None))
        };
        self.execute(&Statement::new(sql)).map(|_| ())
    }

    fn rename_table(&self, old: &str, new: &str) -> Result<()> {
        let sql = format!(
            "ALTER TABLE {} RENAME TO {}",
            self.quote_name(old, None),
            self.quote_name(new, None)
        );
        self.execute(&Statement::new(sql)).map(|_| ())
    }

    /// Writers are serialized by the engine; an explicit lock is a no-op
    fn lock_table(&self, _table: &str) -> Result<()> {
        Ok(())
    }

    fn unlock_tables(&self) -> Result<()> {
        Ok(())
    }

    fn begin(&self) -> Result<()> {
        if self.in_transaction.load(Ordering::Acquire) {
            return Err(DatabaseError::transaction("already in a transaction"));
        }
        self.execute(&Statement::new("BEGIN TRANSACTION"))?;
        self.in_transaction.store(true, Ordering::Release);
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        if !self.in_transaction.load(Ordering::Acquire) {
            return Err(DatabaseError::transaction("not in a transaction"));
        }
        self.execute(&Statement::new("COMMIT"))?;
        self.in_transaction.store(false, Ordering::Release);
        Ok(())
    }

    fn rollback(&self) -> Result<()> {
        if !self.in_transaction.load(Ordering::Acquire) {
            return Err(DatabaseError::transaction("not in a transaction"));
        }
        self.execute(&Statement::new("ROLLBACK"))?;
        self.in_transaction.store(false, Ordering::Release);
        Ok(())
    }

    fn minimum_version(&self) -> &'static str {
        "3.0.0"
    }

    /// SQLite has no TRUNCATE statement
    fn truncate(&self, table: &str) -> Result<()> {
        let sql = format!("DELETE FROM {}", self.quote_name(table, None));
        self.execute(&Statement::new(sql)).map(|_| ())
    }
}

impl Drop for SqliteConnector {
    fn drop(&mut self) {
        // Best effort: close with no transaction left open.
        if self.in_transaction.load(Ordering::Acquire) {
            let conn = self.connection.lock();
            let _ = conn.execute("ROLLBACK", []);
        }
    }
}
