//! DuckDB storage for the retail pipeline

use std::path::Path;

use duckdb::{params_from_iter, Connection};
use retail_ir::{Column, Table, TableDefinition, TableError};
use retail_load::Repository;
use thiserror::Error;

mod convert;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] duckdb::Error),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Table '{table}' has no column '{column}'")]
    UnknownColumn { table: String, column: String },

    #[error("Column '{column}' returned a value of unsupported type")]
    UnsupportedValue { column: String },

    #[error("Result set is not a valid table: {0}")]
    Result(#[from] TableError),
}

/// Repository backed by a single DuckDB connection.
///
/// The connection closes when the repository is dropped.
pub struct DuckRepository {
    conn: Connection,
}

impl DuckRepository {
    /// Open (or create) a database file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "Opening DuckDB database");
        Ok(Self {
            conn: Connection::open(path)?,
        })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// Get the underlying connection for setup/introspection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn table_exists(&self, name: &str) -> Result<bool, StorageError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = ?",
            [name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn row_count(&self, name: &str) -> Result<usize, StorageError> {
        if !self.table_exists(name)? {
            return Err(StorageError::TableNotFound(name.to_string()));
        }
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", quote_ident(name)), [], |row| {
                row.get(0)
            })?;
        Ok(count as usize)
    }

    /// Destination column types in declaration order
    fn column_types(&self, table: &str) -> Result<Vec<(String, String)>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT column_name, data_type \
             FROM information_schema.columns \
             WHERE table_name = ? \
             ORDER BY ordinal_position",
        )?;
        let columns = stmt
            .query_map([table], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        if columns.is_empty() {
            return Err(StorageError::TableNotFound(table.to_string()));
        }
        Ok(columns)
    }
}

impl Repository for DuckRepository {
    type Error = StorageError;

    fn ensure_table(&mut self, definition: &TableDefinition) -> Result<(), StorageError> {
        self.conn.execute_batch(&definition.create_sql())?;
        Ok(())
    }

    /// Insert in one transaction; on error nothing from this call is kept.
    fn insert_rows(&mut self, table_name: &str, table: &Table) -> Result<usize, StorageError> {
        let destination = self.column_types(table_name)?;

        let mut names = Vec::with_capacity(table.columns().len());
        let mut casts = Vec::with_capacity(table.columns().len());
        let mut scales = Vec::with_capacity(table.columns().len());
        for column in table.columns() {
            let Some((_, data_type)) = destination.iter().find(|(n, _)| *n == column.name) else {
                return Err(StorageError::UnknownColumn {
                    table: table_name.to_string(),
                    column: column.name.clone(),
                });
            };
            names.push(quote_ident(&column.name));
            casts.push(format!("CAST(? AS {})", data_type));
            scales.push(convert::decimal_scale(data_type));
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(table_name),
            names.join(", "),
            casts.join(", ")
        );
        tracing::trace!(%sql, "Prepared insert");

        let tx = self.conn.transaction()?;
        let mut written = 0;
        {
            let mut stmt = tx.prepare(&sql)?;
            for row in table.rows() {
                let params = row
                    .iter()
                    .zip(&scales)
                    .map(|(value, scale)| convert::to_param(value, *scale));
                written += stmt.execute(params_from_iter(params))?;
            }
        }
        tx.commit()?;

        tracing::debug!(table = table_name, rows = written, "Inserted rows");
        Ok(written)
    }

    fn query(&mut self, sql: &str) -> Result<Table, StorageError> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([])?;
        let names: Vec<String> = rows
            .as_ref()
            .map(|s| s.column_names())
            .unwrap_or_default();

        let mut cells: Vec<Vec<retail_ir::Value>> = Vec::new();
        while let Some(row) = rows.next()? {
            let mut out = Vec::with_capacity(names.len());
            for (i, name) in names.iter().enumerate() {
                let value = convert::from_value_ref(row.get_ref(i)?).ok_or_else(|| {
                    StorageError::UnsupportedValue {
                        column: name.clone(),
                    }
                })?;
                out.push(value);
            }
            cells.push(out);
        }

        let columns = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| {
                let ty = convert::infer_type(cells.iter().map(|r| &r[i]));
                Column::nullable(name, ty)
            })
            .collect();

        Ok(Table::from_rows(columns, cells)?)
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
