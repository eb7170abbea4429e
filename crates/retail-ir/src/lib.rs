//! Retail pipeline data model
//!
//! Tables, typed cells and the contracts passed between the extract,
//! transform and load stages. Everything here is plain in-memory data;
//! no stage mutates a table after handing it on.

pub mod contract;
mod table;
mod types;
mod value;

pub use contract::{ContractError, ExtractedDataset, TransformedBundle, BUNDLE_TABLES, RAW_TABLES};
pub use table::{Row, Table, TableError};
pub use types::*;
pub use value::Value;

// Re-exported so downstream crates agree on the numeric and date types
pub use chrono::NaiveDate;
pub use rust_decimal::Decimal;
