//! MySQL/MariaDB database backend
//!
//! Networked connector over the `mysql` crate's text protocol. Connection
//! setup clears the session `sql_mode` and switches the session charset to
//! utf8mb4, the conventions the shared SQL in this crate is written against.
//! The host option accepts `host`, `host:port` and `host:/path/to.sock`
//! forms.

use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info};
use mysql::consts::ColumnType;
use mysql::prelude::Queryable;
use mysql::{Column, Conn, OptsBuilder};
use parking_lot::Mutex;

use crate::core::connector::{Connector, ConnectorState};
use crate::core::cursor::ResultSet;
use crate::core::error::{DatabaseError, Result};
use crate::core::options::{split_host_spec, ConnectOptions, Driver};
use crate::core::schema::ColumnInfo;
use crate::core::statement::Statement;
use crate::core::value::{Row, Value};

/// Charset number the server uses for binary (non-text) string columns
const BINARY_CHARSET: u16 = 63;

/// MySQL connector
pub struct MysqlConnector {
    connection: Mutex<Conn>,
    state: ConnectorState,
    in_transaction: AtomicBool,
}

impl MysqlConnector {
    /// Connect to the server named in the options
    ///
    /// With `select` set, the options' database becomes the default schema
    /// of the session; otherwise call `select_database` before issuing
    /// unqualified statements.
    pub fn connect(options: &ConnectOptions) -> Result<Self> {
        let (host, port, socket) = split_host_spec(options.host.as_deref().unwrap_or("localhost"));

        let mut builder = OptsBuilder::new()
            .user(options.user.clone())
            .pass(options.password.clone());
        builder = match socket {
            Some(path) => builder.socket(Some(path)),
            None => builder
                .ip_or_hostname(Some(host.clone()))
                .tcp_port(port.unwrap_or(3306)),
        };
        if options.select {
            builder = builder.db_name(options.database.clone());
        }

        let mut conn = Conn::new(builder).map_err(|e| {
            DatabaseError::connection(format!("cannot connect to mysql server at {host}: {e}"))
        })?;

        // Predictable session behavior regardless of server defaults.
        conn.query_drop("SET @@SESSION.sql_mode = ''")
            .map_err(|e| DatabaseError::connection(format!("cannot reset sql_mode: {e}")))?;
        conn.query_drop("SET NAMES utf8mb4")
            .map_err(|e| DatabaseError::connection(format!("cannot set session charset: {e}")))?;

        info!(
            "mysql connection to {host} established{}",
            match options.database.as_deref() {
                Some(db) if options.select => format!(", database '{db}' selected"),
                _ => String::new(),
            }
        );
        Ok(MysqlConnector {
            connection: Mutex::new(conn),
            state: ConnectorState::new(),
            in_transaction: AtomicBool::new(false),
        })
    }

    fn query_error(&self, err: mysql::Error, sql: &str) -> DatabaseError {
        let (code, message) = match &err {
            mysql::Error::MySqlError(e) => (i32::from(e.code), e.message.clone()),
            other => (-1, other.to_string()),
        };
        self.state.record_error(code, &message);
        DatabaseError::query(code, message, sql)
    }

    /// Decode one text-protocol cell using its column metadata
    fn decode(value: mysql::Value, column: &Column) -> Value {
        match value {
            mysql::Value::NULL => Value::Null,
            mysql::Value::Int(v) => Value::Int(v),
            mysql::Value::UInt(v) => i64::try_from(v)
                .map(Value::Int)
                .unwrap_or_else(|_| Value::Text(v.to_string())),
            mysql::Value::Float(v) => Value::Double(f64::from(v)),
            mysql::Value::Double(v) => Value::Double(v),
            mysql::Value::Date(y, m, d, h, mi, s, _) => {
                Value::Text(format!("{y:04}-{m:02}-{d:02} {h:02}:{mi:02}:{s:02}"))
            }
            mysql::Value::Time(negative, days, h, m, s, _) => {
                let sign = if negative { "-" } else { "" };
                let hours = u32::from(days) * 24 + u32::from(h);
                Value::Text(format!("{sign}{hours:02}:{m:02}:{s:02}"))
            }
            mysql::Value::Bytes(bytes) => match column.column_type() {
                ColumnType::MYSQL_TYPE_TINY
                | ColumnType::MYSQL_TYPE_SHORT
                | ColumnType::MYSQL_TYPE_LONG
                | ColumnType::MYSQL_TYPE_LONGLONG
                | ColumnType::MYSQL_TYPE_INT24
                | ColumnType::MYSQL_TYPE_YEAR => std::str::from_utf8(&bytes)
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .map(Value::Int)
                    .unwrap_or_else(|| Value::Text(String::from_utf8_lossy(&bytes).to_string())),
                ColumnType::MYSQL_TYPE_DECIMAL
                | ColumnType::MYSQL_TYPE_NEWDECIMAL
                | ColumnType::MYSQL_TYPE_FLOAT
                | ColumnType::MYSQL_TYPE_DOUBLE => std::str::from_utf8(&bytes)
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .map(Value::Double)
                    .unwrap_or_else(|| Value::Text(String::from_utf8_lossy(&bytes).to_string())),
                _ if column.character_set() == BINARY_CHARSET => Value::Bytes(bytes),
                _ => Value::Text(String::from_utf8_lossy(&bytes).to_string()),
            },
        }
    }
}

/// mysql_real_escape_string's character set, applied without a round trip
fn escape_text(text: &str, extra: bool) -> String {
    let mut escaped = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '\0' => escaped.push_str("\\0"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            '"' => escaped.push_str("\\\""),
            '\x1a' => escaped.push_str("\\Z"),
            '%' if extra => escaped.push_str("\\%"),
            '_' if extra => escaped.push_str("\\_"),
            _ => escaped.push(c),
        }
    }
    escaped
}

impl Connector for MysqlConnector {
    fn driver(&self) -> Driver {
        Driver::Mysql
    }

    fn state(&self) -> &ConnectorState {
        &self.state
    }

    fn connected(&self) -> bool {
        self.connection.lock().query_drop("SELECT 1").is_ok()
    }

    fn escape(&self, text: &str, extra: bool) -> String {
        escape_text(text, extra)
    }

    fn execute(&self, statement: &Statement) -> Result<ResultSet> {
        let sql = statement.to_sql();
        self.state.start_statement(&sql);
        debug!("mysql: {sql}");

        let mut conn = self.connection.lock();
        let result = conn
            .query_iter(sql.as_ref())
            .map_err(|e| self.query_error(e, &sql))?;

        let affected = result.affected_rows();
        let insert_id = result.last_insert_id().unwrap_or(0);
        let columns_meta: Vec<Column> = result.columns().as_ref().to_vec();

        let mut rows = Vec::new();
        for row in result {
            let row = row.map_err(|e| self.query_error(e, &sql))?;
            let values = row
                .unwrap()
                .into_iter()
                .zip(columns_meta.iter())
                .map(|(value, column)| Self::decode(value, column))
                .collect();
            rows.push(values);
        }

        self.state.record_change(affected, insert_id);
        if columns_meta.is_empty() {
            Ok(ResultSet::from_change(affected, insert_id))
        } else {
            let names = columns_meta
                .iter()
                .map(|c| c.name_str().to_string())
                .collect();
            Ok(ResultSet::new(names, rows, affected, insert_id))
        }
    }

    fn select_database(&self, database: &str) -> Result<()> {
        let sql = format!("USE {}", self.quote_name(database, None));
        self.execute(&Statement::new(sql)).map(|_| ())
    }

    fn version(&self) -> Result<String> {
        let row = self.query_row(&Statement::new("SELECT VERSION()"))?;
        Ok(row
            .and_then(|values| values.first().map(Value::as_string))
            .unwrap_or_default())
    }

    fn collation(&self) -> Result<Option<String>> {
        let row = self.query_row(&Statement::new("SELECT @@collation_database"))?;
        Ok(row.and_then(|values| values.first().map(Value::as_string)))
    }

    fn table_list(&self) -> Result<Vec<String>> {
        let values = self.query_column(&Statement::new("SHOW TABLES"), 0)?;
        Ok(values.iter().map(Value::as_string).collect())
    }

    fn table_columns(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        let statement = Statement::new(format!(
            "SHOW FULL COLUMNS FROM {}",
            self.quote_name(&self.escape(table, false), None)
        ));

        let mut columns = Vec::new();
        for row in self.query_assoc_list(&statement)? {
            columns.push(ColumnInfo {
                name: row.get("Field").map(Value::as_string).unwrap_or_default(),
                type_name: row.get("Type").map(Value::as_string).unwrap_or_default(),
                nullable: row.get("Null").map(Value::as_string).as_deref() == Some("YES"),
                default: match row.get("Default") {
                    None | Some(Value::Null) => None,
                    Some(other) => Some(other.as_string()),
                },
                primary: row.get("Key").map(Value::as_string).as_deref() == Some("PRI"),
                extra: row.get("Extra").map(Value::as_string).unwrap_or_default(),
            });
        }
        Ok(columns)
    }

    fn table_create(&self, tables: &[&str]) -> Result<Vec<(String, String)>> {
        let mut creates = Vec::with_capacity(tables.len());
        for table in tables {
            let statement = Statement::new(format!(
                "SHOW CREATE TABLE {}",
                self.quote_name(&self.escape(table, false), None)
            ));
            match self.query_row(&statement)? {
                Some(row) if row.len() > 1 => {
                    creates.push(((*table).to_string(), row[1].as_string()));
                }
                _ => return Err(DatabaseError::schema(format!("no such table: {table}"))),
            }
        }
        Ok(creates)
    }

    fn table_keys(&self, table: &str) -> Result<Vec<Row>> {
        let statement = Statement::new(format!(
            "SHOW KEYS FROM {}",
            self.quote_name(&self.escape(table, false), None)
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
            "RENAME TABLE {} TO {}",
            self.quote_name(old, None),
            self.quote_name(new, None)
        );
        self.execute(&Statement::new(sql)).map(|_| ())
    }

    fn lock_table(&self, table: &str) -> Result<()> {
        let sql = format!("LOCK TABLES {} WRITE", self.quote_name(table, None));
        self.execute(&Statement::new(sql)).map(|_| ())
    }

    fn unlock_tables(&self) -> Result<()> {
        self.execute(&Statement::new("UNLOCK TABLES")).map(|_| ())
    }

    fn begin(&self) -> Result<()> {
        if self.in_transaction.load(Ordering::Acquire) {
            return Err(DatabaseError::transaction("already in a transaction"));
        }
        self.execute(&Statement::new("START TRANSACTION"))?;
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
        "5.0.4"
    }
}

impl Drop for MysqlConnector {
    fn drop(&mut self) {
        // Best effort: close with no transaction left open.
        if self.in_transaction.load(Ordering::Acquire) {
            let mut conn = self.connection.lock();
            let _ = conn.query_drop("ROLLBACK");
        }
    }
}
