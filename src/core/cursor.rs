//! Result cursor over one executed statement
//!
//! [`ResultSet`] buffers the rows of a single execution and hands them out
//! through the three projections: positional list, field-name map, and typed
//! object. The cursor is returned by value from `execute`, so it is owned by
//! exactly one caller and never shared between connectors; freeing is
//! explicit and idempotent, and dropping the value releases it as well.

use serde::de::DeserializeOwned;

use crate::core::error::Result;
use crate::core::value::{Row, Value};

/// Buffered result of one statement execution
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    pos: usize,
    affected: u64,
    insert_id: u64,
}

impl ResultSet {
    /// Build a cursor from decoded rows plus the execution bookkeeping
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>, affected: u64, insert_id: u64) -> Self {
        ResultSet {
            columns,
            rows,
            pos: 0,
            affected,
            insert_id,
        }
    }

    /// Cursor for a statement that produced no result rows
    pub fn from_change(affected: u64, insert_id: u64) -> Self {
        ResultSet::new(Vec::new(), Vec::new(), affected, insert_id)
    }

    /// Advance by one row, positional projection
    pub fn fetch_row(&mut self) -> Option<Vec<Value>> {
        let row = self.rows.get(self.pos).cloned()?;
        self.pos += 1;
        Some(row)
    }

    /// Advance by one row, field-name map projection
    pub fn fetch_assoc(&mut self) -> Option<Row> {
        let values = self.fetch_row()?;
        Some(
            self.columns
                .iter()
                .cloned()
                .zip(values)
                .collect::<Row>(),
        )
    }

    /// Advance by one row, typed-object projection
    ///
    /// `Ok(None)` is the end-of-results sentinel; a row that does not fit the
    /// target type is a bind error.
    pub fn fetch_object<T: DeserializeOwned>(&mut self) -> Result<Option<T>> {
        match self.fetch_assoc() {
            Some(row) => row.to_object().map(Some),
            None => Ok(None),
        }
    }

    /// Reset the read position to the first row
    pub fn rewind(&mut self) {
        self.pos = 0;
    }

    /// Release the buffered rows; safe to call more than once
    pub fn free(&mut self) {
        self.rows.clear();
        self.rows.shrink_to_fit();
        self.pos = 0;
    }

    /// Number of rows in the result
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Column names in result order
    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    /// Row count reported by the backend for the executed statement
    pub fn affected_rows(&self) -> u64 {
        self.affected
    }

    /// Last insert id reported by the backend, 0 when none
    pub fn last_insert_id(&self) -> u64 {
        self.insert_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    fn sample() -> ResultSet {
        ResultSet::new(
            vec!["id".to_string(), "name".to_string()],
            vec![
                vec![Value::Int(1), Value::Text("Ana".to_string())],
                vec![Value::Int(2), Value::Text("Bo".to_string())],
            ],
            0,
            0,
        )
    }

    #[test]
    fn test_fetch_row_until_sentinel() {
        let mut rs = sample();
        assert_eq!(
            rs.fetch_row(),
            Some(vec![Value::Int(1), Value::Text("Ana".to_string())])
        );
        assert_eq!(
            rs.fetch_row(),
            Some(vec![Value::Int(2), Value::Text("Bo".to_string())])
        );
        assert_eq!(rs.fetch_row(), None);
        assert_eq!(rs.fetch_row(), None);
        assert_eq!(rs.row_count(), 2);
    }

    #[test]
    fn test_fetch_assoc_names_fields() {
        let mut rs = sample();
        let row = rs.fetch_assoc().unwrap();
        assert_eq!(row.get("id"), Some(&Value::Int(1)));
        assert_eq!(row.get("name"), Some(&Value::Text("Ana".to_string())));
    }

    #[test]
    fn test_fetch_object_typed() {
        #[derive(Debug, PartialEq, Deserialize)]
        struct Person {
            id: i64,
            name: String,
        }

        let mut rs = sample();
        let first: Option<Person> = rs.fetch_object().unwrap();
        assert_eq!(
            first,
            Some(Person {
                id: 1,
                name: "Ana".to_string()
            })
        );
        let _second: Option<Person> = rs.fetch_object().unwrap();
        let end: Option<Person> = rs.fetch_object().unwrap();
        assert_eq!(end, None);
    }

    #[test]
    fn test_rewind_rereads() {
        let mut rs = sample();
        rs.fetch_row();
        rs.fetch_row();
        rs.rewind();
        assert!(rs.fetch_row().is_some());
    }

    #[test]
    fn test_free_is_idempotent() {
        let mut rs = sample();
        rs.fetch_row();
        rs.free();
        assert_eq!(rs.row_count(), 0);
        assert_eq!(rs.fetch_row(), None);
        rs.free();
        assert_eq!(rs.row_count(), 0);
    }
}
