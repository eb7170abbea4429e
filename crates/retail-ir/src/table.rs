//! In-memory table: ordered typed columns plus positional rows

use std::collections::HashSet;

use serde::Serialize;
use thiserror::Error;

use crate::{Column, ColumnType, Value};

pub type Row = Vec<Value>;

#[derive(Debug, Error, PartialEq)]
pub enum TableError {
    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Row has {actual} values but table has {expected} columns")]
    ArityMismatch { expected: usize, actual: usize },

    #[error("Value {value} does not fit column {column} ({expected:?})")]
    TypeMismatch {
        column: String,
        expected: ColumnType,
        value: String,
    },
}

/// Ordered columns and rows.
///
/// Every row holds exactly one value per column, and every value fits its
/// column's type. Both are checked on insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Result<Self, TableError> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(TableError::DuplicateColumn(column.name.clone()));
            }
        }

        Ok(Self {
            columns,
            rows: Vec::new(),
        })
    }

    pub fn from_rows(columns: Vec<Column>, rows: Vec<Row>) -> Result<Self, TableError> {
        let mut table = Self::new(columns)?;
        table.rows.reserve(rows.len());
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Same columns, no rows
    pub fn empty_like(&self) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Row) -> Result<(), TableError> {
        if row.len() != self.columns.len() {
            return Err(TableError::ArityMismatch {
                expected: self.columns.len(),
                actual: row.len(),
            });
        }

        for (column, value) in self.columns.iter().zip(&row) {
            if !column.data_type.accepts(value) {
                return Err(TableError::TypeMismatch {
                    column: column.name.clone(),
                    expected: column.data_type,
                    value: format!("{:?}", value),
                });
            }
        }

        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize, TableError> {
        self.column_index(name)
            .ok_or_else(|| TableError::ColumnNotFound(name.to_string()))
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell lookup by row position and column name
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stock_columns() -> Vec<Column> {
        vec![
            Column::required("product", ColumnType::Text(50)),
            Column::required("total_on_hand", ColumnType::Integer),
        ]
    }

    #[test]
    fn test_duplicate_columns_rejected() {
        let columns = vec![
            Column::required("product", ColumnType::Text(50)),
            Column::required("product", ColumnType::Text(50)),
        ];
        assert_eq!(
            Table::new(columns),
            Err(TableError::DuplicateColumn("product".to_string()))
        );
    }

    #[test]
    fn test_push_row_checks_arity_and_type() {
        let mut table = Table::new(stock_columns()).unwrap();

        assert!(matches!(
            table.push_row(vec![Value::text("A")]),
            Err(TableError::ArityMismatch { expected: 2, actual: 1 })
        ));
        assert!(matches!(
            table.push_row(vec![Value::text("A"), Value::text("ten")]),
            Err(TableError::TypeMismatch { .. })
        ));

        table.push_row(vec![Value::text("A"), Value::Integer(10)]).unwrap();
        table.push_row(vec![Value::text("B"), Value::Null]).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.value(0, "total_on_hand"), Some(&Value::Integer(10)));
        assert_eq!(table.value(1, "missing"), None);
    }

    #[test]
    fn test_column_order_preserved() {
        let table = Table::new(stock_columns()).unwrap();
        assert_eq!(table.column_names(), vec!["product", "total_on_hand"]);
        assert_eq!(table.column_index("total_on_hand"), Some(1));
        assert!(table.empty_like().is_empty());
    }
}
