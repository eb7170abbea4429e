//! Named report queries run against the loaded database

use std::path::PathBuf;

use retail_ir::Table;
use retail_load::{BoxError, Repository};
use serde::Serialize;
use thiserror::Error;

use crate::config::ReportConfig;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Invalid query name '{0}'")]
    InvalidName(String),

    #[error("Failed to read query file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Query '{0}' not found")]
    MissingQuery(String),

    #[error("Query '{name}' failed: {source}")]
    Query { name: String, source: BoxError },
}

/// SQL files in one directory, addressed by file stem
#[derive(Debug, Clone)]
pub struct QueryCatalog {
    dir: PathBuf,
}

impl QueryCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Text of `<dir>/<name>.sql`, or `None` when the file does not exist
    pub fn lookup(&self, name: &str) -> Result<Option<String>, ReportError> {
        if name.is_empty() || name.contains(&['/', '\\'][..]) || name.starts_with('.') {
            return Err(ReportError::InvalidName(name.to_string()));
        }

        let path = self.dir.join(format!("{}.sql", name));
        match std::fs::read_to_string(&path) {
            Ok(sql) => Ok(Some(sql)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(ReportError::Io { path, source }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryOutcome {
    pub name: String,
    pub rows: usize,
}

/// Run every configured query, logging row counts and a short preview.
///
/// A missing query file fails the run only when `config.required` is set.
pub fn run_reports<R: Repository>(
    repository: &mut R,
    config: &ReportConfig,
) -> Result<Vec<QueryOutcome>, ReportError> {
    let catalog = QueryCatalog::new(&config.queries_dir);
    let mut outcomes = Vec::with_capacity(config.queries.len());

    for name in &config.queries {
        let Some(sql) = catalog.lookup(name)? else {
            if config.required {
                return Err(ReportError::MissingQuery(name.clone()));
            }
            tracing::warn!(query = %name, dir = %config.queries_dir.display(), "Report query not found, skipping");
            continue;
        };

        let table = repository.query(&sql).map_err(|e| ReportError::Query {
            name: name.clone(),
            source: e.into(),
        })?;

        tracing::info!(query = %name, rows = table.len(), "Report query complete");
        for line in preview(&table, config.preview_rows) {
            tracing::info!(query = %name, "{}", line);
        }

        outcomes.push(QueryOutcome {
            name: name.clone(),
            rows: table.len(),
        });
    }

    Ok(outcomes)
}

/// Header line plus up to `limit` rows, cells separated by ` | `
fn preview(table: &Table, limit: usize) -> Vec<String> {
    if limit == 0 {
        return Vec::new();
    }

    let mut lines = vec![table.column_names().join(" | ")];
    lines.extend(table.rows().iter().take(limit).map(|row| {
        row.iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" | ")
    }));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use retail_ir::{Column, ColumnType, TableDefinition, Value};

    #[derive(Default)]
    struct CannedRepository {
        queries: Vec<String>,
    }

    impl Repository for CannedRepository {
        type Error = std::io::Error;

        fn ensure_table(&mut self, _: &TableDefinition) -> Result<(), Self::Error> {
            Ok(())
        }

        fn insert_rows(&mut self, _: &str, table: &Table) -> Result<usize, Self::Error> {
            Ok(table.len())
        }

        fn query(&mut self, sql: &str) -> Result<Table, Self::Error> {
            self.queries.push(sql.trim().to_string());
            if sql.contains("boom") {
                return Err(std::io::Error::other("boom"));
            }
            Ok(Table::from_rows(
                vec![Column::nullable("n", ColumnType::BigInt)],
                vec![vec![Value::Integer(1)], vec![Value::Integer(2)]],
            )
            .unwrap())
        }
    }

    fn config(dir: &std::path::Path, queries: &[&str], required: bool) -> ReportConfig {
        ReportConfig {
            queries_dir: dir.to_path_buf(),
            queries: queries.iter().map(|q| q.to_string()).collect(),
            required,
            ..Default::default()
        }
    }

    #[test]
    fn test_lookup() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("sales.sql"), "SELECT 1").unwrap();
        let catalog = QueryCatalog::new(dir.path());

        assert_eq!(catalog.lookup("sales").unwrap(), Some("SELECT 1".to_string()));
        assert_eq!(catalog.lookup("absent").unwrap(), None);
        assert!(matches!(catalog.lookup("../etc/passwd"), Err(ReportError::InvalidName(_))));
    }

    #[test]
    fn test_optional_missing_query_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("sales.sql"), "SELECT n FROM sales\n").unwrap();
        let mut repo = CannedRepository::default();

        let outcomes = run_reports(&mut repo, &config(dir.path(), &["absent", "sales"], false)).unwrap();
        assert_eq!(
            outcomes,
            vec![QueryOutcome {
                name: "sales".into(),
                rows: 2
            }]
        );
        assert_eq!(repo.queries, vec!["SELECT n FROM sales"]);
    }

    #[test]
    fn test_required_missing_query_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = CannedRepository::default();

        let err = run_reports(&mut repo, &config(dir.path(), &["absent"], true)).unwrap_err();
        assert!(matches!(err, ReportError::MissingQuery(ref n) if n == "absent"));
        assert!(repo.queries.is_empty());
    }

    #[test]
    fn test_query_failure_names_query() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.sql"), "SELECT boom").unwrap();
        let mut repo = CannedRepository::default();

        let err = run_reports(&mut repo, &config(dir.path(), &["bad"], false)).unwrap_err();
        assert_eq!(err.to_string(), "Query 'bad' failed: boom");
    }

    #[test]
    fn test_preview() {
        let table = Table::from_rows(
            vec![
                Column::nullable("state", ColumnType::Text(2)),
                Column::nullable("total", ColumnType::BigInt),
            ],
            vec![
                vec![Value::text("SP"), Value::Integer(3)],
                vec![Value::text("RJ"), Value::Null],
            ],
        )
        .unwrap();

        assert_eq!(preview(&table, 1), vec!["state | total", "SP | 3"]);
        assert_eq!(preview(&table, 5).len(), 3);
        assert!(preview(&table, 0).is_empty());
    }
}
