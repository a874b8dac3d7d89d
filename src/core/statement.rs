//! Staged statement with row-window bounds
//!
//! [`Statement`] holds one SQL string plus the offset/limit modifiers for its
//! execution. It is an owned builder: every step takes and returns the value,
//! so chained staging never mutates shared state.
//!
//! Window convention: ` LIMIT {offset}, {limit}` is appended whenever either
//! bound is nonzero. The comma form is accepted by both supported backends.
//! An offset with a zero limit therefore yields a zero-length page; staging
//! with both bounds zero appends no clause at all.

use std::borrow::Cow;

/// One SQL statement staged for execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    sql: String,
    offset: u64,
    limit: u64,
}

impl Statement {
    /// Stage a statement with no row window
    pub fn new<S: Into<String>>(sql: S) -> Self {
        Statement {
            sql: sql.into(),
            offset: 0,
            limit: 0,
        }
    }

    /// Set the row offset, clamped to zero for negative input
    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = offset.max(0) as u64;
        self
    }

    /// Set the row limit, clamped to zero for negative input
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = limit.max(0) as u64;
        self
    }

    /// The staged SQL without the window clause
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The effective row offset
    pub fn row_offset(&self) -> u64 {
        self.offset
    }

    /// The effective row limit
    pub fn row_limit(&self) -> u64 {
        self.limit
    }

    /// The SQL to execute, window clause applied when either bound is nonzero
    pub fn to_sql(&self) -> Cow<'_, str> {
        if self.offset == 0 && self.limit == 0 {
            Cow::Borrowed(&self.sql)
        } else {
            Cow::Owned(format!("{} LIMIT {}, {}", self.sql, self.offset, self.limit))
        }
    }
}

impl From<&str> for Statement {
    fn from(sql: &str) -> Self {
        Statement::new(sql)
    }
}

impl From<String> for Statement {
    fn from(sql: String) -> Self {
        Statement::new(sql)
    }
}
