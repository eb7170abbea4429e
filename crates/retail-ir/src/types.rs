//! Type system for pipeline tables

use serde::{Deserialize, Serialize};

use crate::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    // Temporal
    Date,

    // Numeric
    Integer,
    BigInt,
    Decimal { precision: u8, scale: u8 },

    // Text
    /// Variable-length text with a maximum length (`VARCHAR(n)`)
    Text(u32),
    /// Fixed-width code (`CHAR(n)`)
    Code(u32),
}

impl ColumnType {
    /// SQL spelling used in destination DDL
    pub fn sql_type(&self) -> String {
        match self {
            ColumnType::Date => "DATE".to_string(),
            ColumnType::Integer => "INTEGER".to_string(),
            ColumnType::BigInt => "BIGINT".to_string(),
            ColumnType::Decimal { precision, scale } => format!("DECIMAL({}, {})", precision, scale),
            ColumnType::Text(len) => format!("VARCHAR({})", len),
            ColumnType::Code(width) => format!("CHAR({})", width),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ColumnType::Integer | ColumnType::BigInt | ColumnType::Decimal { .. }
        )
    }

    pub fn is_textual(&self) -> bool {
        matches!(self, ColumnType::Text(_) | ColumnType::Code(_))
    }

    /// Whether a cell value may be stored in a column of this type.
    ///
    /// Null is accepted everywhere; nullability is enforced by the destination.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (ColumnType::Date, Value::Date(_)) => true,
            (ColumnType::Integer | ColumnType::BigInt, Value::Integer(_)) => true,
            (ColumnType::Decimal { .. }, Value::Decimal(_)) => true,
            (ColumnType::Text(_) | ColumnType::Code(_), Value::Text(_)) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data_type: ColumnType,
    pub nullable: bool,
}

impl Column {
    pub fn required(name: impl Into<String>, data_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: false,
        }
    }

    pub fn nullable(name: impl Into<String>, data_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
        }
    }
}

/// Static definition of a destination (or raw source) table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDefinition {
    pub name: String,
    pub columns: Vec<Column>,
}

impl TableDefinition {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Render idempotent DDL for this definition
    pub fn create_sql(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(|c| {
                let null = if c.nullable { "" } else { " NOT NULL" };
                format!("    {} {}{}", c.name, c.data_type.sql_type(), null)
            })
            .collect::<Vec<_>>()
            .join(",\n");

        format!("CREATE TABLE IF NOT EXISTS {} (\n{}\n);", self.name, columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_types() {
        assert_eq!(ColumnType::Decimal { precision: 10, scale: 2 }.sql_type(), "DECIMAL(10, 2)");
        assert_eq!(ColumnType::Code(2).sql_type(), "CHAR(2)");
        assert_eq!(ColumnType::Text(50).sql_type(), "VARCHAR(50)");
    }

    #[test]
    fn test_create_sql() {
        let def = TableDefinition::new(
            "sales_by_region",
            vec![
                Column::nullable("state", ColumnType::Text(2)),
                Column::required("total_units_sold", ColumnType::BigInt),
            ],
        );

        let sql = def.create_sql();
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS sales_by_region ("));
        assert!(sql.contains("state VARCHAR(2),"));
        assert!(sql.contains("total_units_sold BIGINT NOT NULL"));
    }

    #[test]
    fn test_accepts() {
        assert!(ColumnType::BigInt.accepts(&Value::Integer(3)));
        assert!(ColumnType::Date.accepts(&Value::Null));
        assert!(!ColumnType::Integer.accepts(&Value::Text("3".into())));
    }
}
