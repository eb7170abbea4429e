//! Duplicate removal and missing-value filling

use std::collections::HashSet;

use retail_ir::{ColumnType, Decimal, Row, Table, TableError, Value};
use serde::{Deserialize, Serialize};

/// What a missing cell becomes during cleaning
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FillPolicy {
    /// Zero for numbers, empty string for text and codes
    #[default]
    TypeAware,
    /// Zero for numbers, the text `"0"` for text and codes.
    ///
    /// Matches data already persisted by earlier versions of this pipeline.
    LiteralZero,
}

impl FillPolicy {
    /// Fill value for a column type; dates keep the null marker under both policies
    pub fn default_for(&self, data_type: ColumnType) -> Value {
        match (self, data_type) {
            (_, ColumnType::Integer | ColumnType::BigInt) => Value::Integer(0),
            (_, ColumnType::Decimal { .. }) => Value::Decimal(Decimal::ZERO),
            (FillPolicy::TypeAware, ColumnType::Text(_) | ColumnType::Code(_)) => {
                Value::Text(String::new())
            }
            (FillPolicy::LiteralZero, ColumnType::Text(_) | ColumnType::Code(_)) => {
                Value::text("0")
            }
            (_, ColumnType::Date) => Value::Null,
        }
    }
}

impl std::str::FromStr for FillPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "type-aware" | "type_aware" => Ok(FillPolicy::TypeAware),
            "literal-zero" | "literal_zero" => Ok(FillPolicy::LiteralZero),
            other => Err(format!("unknown fill policy '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Cleaner {
    policy: FillPolicy,
}

impl Cleaner {
    pub fn new(policy: FillPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> FillPolicy {
        self.policy
    }

    /// Fill missing cells, then drop rows equal to an earlier row.
    ///
    /// Filling first means two rows that only differed by a missing cell
    /// collapse in the same pass, so `clean(clean(t)) == clean(t)`.
    /// Survivors keep their original relative order.
    pub fn clean(&self, table: &Table) -> Result<Table, TableError> {
        let defaults: Vec<Value> = table
            .columns()
            .iter()
            .map(|c| self.policy.default_for(c.data_type))
            .collect();

        let mut seen: HashSet<Row> = HashSet::with_capacity(table.len());
        let mut rows = Vec::with_capacity(table.len());

        for row in table.rows() {
            let filled: Row = row
                .iter()
                .zip(&defaults)
                .map(|(value, default)| {
                    if value.is_null() {
                        default.clone()
                    } else {
                        value.clone()
                    }
                })
                .collect();

            if seen.contains(&filled) {
                continue;
            }
            seen.insert(filled.clone());
            rows.push(filled);
        }

        let removed = table.len() - rows.len();
        if removed > 0 {
            tracing::debug!(removed, kept = rows.len(), "Dropped duplicate rows");
        }

        Table::from_rows(table.columns().to_vec(), rows)
    }
}

/// Clean with the default (type-aware) policy
pub fn clean(table: &Table) -> Result<Table, TableError> {
    Cleaner::default().clean(table)
}
