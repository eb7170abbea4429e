//! Transform stage
//!
//! Turns the four cleaned raw tables into the derived metrics:
//! - available stock per product/color
//! - sales velocity (units sold / available stock)
//! - units sold per state/city
//!
//! Data problems never raise here: unmatched join keys and undefined
//! velocities are filtered out. Only structural problems (a required
//! column is absent, a summed quantity leaves the `BIGINT` range) produce a
//! [`TransformError`].

use retail_ir::{Table, TableError};
use thiserror::Error;

mod aggregate;
mod clean;
mod join;
mod orchestrator;
mod region;
mod stock;
mod velocity;

pub use clean::{clean, Cleaner, FillPolicy};
pub use orchestrator::{TransformOptions, Transformer};
pub use region::sales_by_region;
pub use stock::available_stock;
pub use velocity::sales_velocity;

#[derive(Debug, Error, PartialEq)]
pub enum TransformError {
    #[error("Table '{table}' is missing required column '{column}'")]
    MissingColumn { table: String, column: String },

    #[error("Column '{column}' of '{table}' exceeds the BIGINT range")]
    Overflow { table: String, column: String },

    #[error("Table error: {0}")]
    Table(#[from] TableError),
}

/// Resolve required columns of a named input, failing on the first absent one
pub(crate) fn require_columns(
    table: &Table,
    table_name: &str,
    columns: &[&str],
) -> Result<Vec<usize>, TransformError> {
    columns
        .iter()
        .map(|column| {
            table
                .column_index(column)
                .ok_or_else(|| TransformError::MissingColumn {
                    table: table_name.to_string(),
                    column: column.to_string(),
                })
        })
        .collect()
}
