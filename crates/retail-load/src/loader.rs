//! Load orchestration: validate, bootstrap schema, insert

use std::time::Instant;

use retail_ir::{TransformedBundle, BUNDLE_TABLES};
use serde::Serialize;

use crate::{LoadError, Repository, SchemaManager, ValidationError, SCHEMA_VERSION};

/// Rows written for one destination table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadedTable {
    pub table: String,
    pub rows: usize,
}

/// Outcome of a successful load
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub schema_version: u32,
    pub tables: Vec<LoadedTable>,
}

impl LoadReport {
    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|t| t.rows).sum()
    }

    pub fn rows_for(&self, table: &str) -> Option<usize> {
        self.tables.iter().find(|t| t.table == table).map(|t| t.rows)
    }
}

/// Check the bundle contract: the seven known tables, nothing else, none empty
pub fn validate_bundle(bundle: &TransformedBundle) -> Result<(), ValidationError> {
    for name in BUNDLE_TABLES {
        if bundle.get(name).is_none() {
            return Err(ValidationError::MissingTable(name.to_string()));
        }
    }

    if let Some(extra) = bundle.names().find(|n| !BUNDLE_TABLES.contains(n)) {
        return Err(ValidationError::UnexpectedTable(extra.to_string()));
    }

    for (name, table) in bundle.iter() {
        if table.is_empty() {
            return Err(ValidationError::EmptyTable(name.to_string()));
        }
    }

    Ok(())
}

/// Persists a transformed bundle through a repository.
///
/// The repository is owned (or mutably borrowed, via the blanket impl on
/// `&mut R`) for the orchestrator's lifetime.
pub struct LoadOrchestrator<R> {
    repository: R,
    schema: SchemaManager,
}

impl<R: Repository> LoadOrchestrator<R> {
    pub fn new(repository: R) -> Self {
        Self::with_schema(repository, SchemaManager::new())
    }

    pub fn with_schema(repository: R, schema: SchemaManager) -> Self {
        Self { repository, schema }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn repository_mut(&mut self) -> &mut R {
        &mut self.repository
    }

    pub fn into_inner(self) -> R {
        self.repository
    }

    /// Validate, ensure the schema, then insert every table in bundle order.
    ///
    /// Validation runs before the repository is touched. The first schema or
    /// insert failure aborts the rest; rows already committed stay.
    pub fn load(&mut self, bundle: TransformedBundle) -> Result<LoadReport, LoadError> {
        let started = Instant::now();

        if let Err(e) = validate_bundle(&bundle) {
            tracing::error!(error = %e, "Bundle rejected");
            return Err(e.into());
        }

        self.schema.ensure_schema(&mut self.repository)?;

        let mut tables = Vec::with_capacity(BUNDLE_TABLES.len());
        for name in BUNDLE_TABLES {
            let Some(table) = bundle.get(name) else {
                return Err(ValidationError::MissingTable(name.to_string()).into());
            };

            let rows = self
                .repository
                .insert_rows(name, table)
                .map_err(|e| LoadError::insert(name, e))?;

            tracing::info!(table = name, rows, "Table loaded");
            tables.push(LoadedTable {
                table: name.to_string(),
                rows,
            });
        }

        let report = LoadReport {
            schema_version: SCHEMA_VERSION,
            tables,
        };
        tracing::info!(
            total_rows = report.total_rows(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Load complete"
        );
        Ok(report)
    }
}
