//! Load stage
//!
//! Validates a [`TransformedBundle`](retail_ir::TransformedBundle), bootstraps
//! the destination schema and writes every table through a [`Repository`].
//! The storage engine itself lives behind the trait; see `retail-duck` for
//! the DuckDB implementation.

mod error;
mod loader;
mod repository;
pub mod schema;

pub use error::{BoxError, LoadError, LoadPhase, ValidationError};
pub use loader::{validate_bundle, LoadOrchestrator, LoadReport, LoadedTable};
pub use repository::Repository;
pub use schema::{SchemaManager, SCHEMA_VERSION};
