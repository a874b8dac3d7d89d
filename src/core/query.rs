//! Fluent query assembly
//!
//! A small builder covering the statement shapes the active-record layer
//! needs: `SELECT ... FROM ... WHERE ... ORDER BY` and
//! `DELETE FROM ... WHERE ...`. Conditions are pre-rendered SQL fragments;
//! identifier and literal quoting stay with the connector, the builder only
//! joins the pieces.

use crate::core::statement::Statement;

/// ORDER BY direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    /// Ascending order
    Asc,
    /// Descending order
    Desc,
}

impl OrderDirection {
    fn as_sql(&self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueryKind {
    Select,
    Delete,
}

/// Fluent SELECT/DELETE statement builder
#[derive(Debug, Clone)]
pub struct Query {
    kind: QueryKind,
    table: String,
    columns: Vec<String>,
    conditions: Vec<String>,
    order_by: Vec<(String, OrderDirection)>,
}

impl Query {
    /// Start a SELECT over a table; all columns unless narrowed
    ///
    /// # Example
    ///
    /// ```
    /// use clinicdb::core::query::Query;
    ///
    /// let sql = Query::select("patients")
    ///     .columns(&["id", "name"])
    ///     .and_where("`id` = 7")
    ///     .build();
    /// assert_eq!(sql, "SELECT id, name FROM patients WHERE `id` = 7");
    /// ```
    pub fn select(table: impl Into<String>) -> Self {
        Query {
            kind: QueryKind::Select,
            table: table.into(),
            columns: vec!["*".to_string()],
            conditions: Vec::new(),
            order_by: Vec::new(),
        }
    }

    /// Start a DELETE over a table
    pub fn delete(table: impl Into<String>) -> Self {
        Query {
            kind: QueryKind::Delete,
            table: table.into(),
            columns: Vec::new(),
            conditions: Vec::new(),
            order_by: Vec::new(),
        }
    }

    /// Narrow a SELECT to specific columns
    #[must_use]
    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Add a pre-rendered condition fragment, AND-joined with the others
    #[must_use]
    pub fn and_where(mut self, condition: impl Into<String>) -> Self {
        self.conditions.push(condition.into());
        self
    }

    /// Add an ORDER BY column
    #[must_use]
    pub fn order_by(mut self, column: impl Into<String>, direction: OrderDirection) -> Self {
        self.order_by.push((column.into(), direction));
        self
    }

    /// Assemble the SQL string
    pub fn build(&self) -> String {
        let mut sql = match self.kind {
            QueryKind::Select => {
                format!("SELECT {} FROM {}", self.columns.join(", "), self.table)
            }
            QueryKind::Delete => format!("DELETE FROM {}", self.table),
        };

        if !self.conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.conditions.join(" AND "));
        }

        if !self.order_by.is_empty() {
            let order: Vec<String> = self
                .order_by
                .iter()
                .map(|(col, dir)| format!("{} {}", col, dir.as_sql()))
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&order.join(", "));
        }

        sql
    }
}

impl From<Query> for Statement {
    fn from(query: Query) -> Self {
        Statement::new(query.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_all_columns() {
        let sql = Query::select("patients").build();
        assert_eq!(sql, "SELECT * FROM patients");
    }

    #[test]
    fn test_select_with_conditions_and_order() {
        let sql = Query::select("appointments")
            .columns(&["id", "patient_id", "scheduled"])
            .and_where("`patient_id` = 3")
            .and_where("`scheduled` > '2024-01-01'")
            .order_by("scheduled", OrderDirection::Desc)
            .build();
        assert_eq!(
            sql,
            "SELECT id, patient_id, scheduled FROM appointments \
             WHERE `patient_id` = 3 AND `scheduled` > '2024-01-01' \
             ORDER BY scheduled DESC"
        );
    }

    #[test]
    fn test_delete_with_condition() {
        let sql = Query::delete("patients").and_where("`id` = 5").build();
        assert_eq!(sql, "DELETE FROM patients WHERE `id` = 5");
    }

    #[test]
    fn test_into_statement() {
        let stmt: Statement = Query::select("visits").and_where("`id` = 1").into();
        assert_eq!(stmt.sql(), "SELECT * FROM visits WHERE `id` = 1");
    }
}
