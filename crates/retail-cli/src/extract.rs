//! CSV extraction into the four raw tables
//!
//! Each file is shaped by the destination definition of its table: headers
//! are matched to column names (or their source aliases) case-insensitively,
//! cells are parsed to the column type, and extra columns are ignored.

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDate;
use csv::StringRecord;
use retail_ir::contract::{PRODUCTS, SALES, STOCK, STORE};
use retail_ir::{Column, ColumnType, ContractError, ExtractedDataset, Table, TableError, Value, RAW_TABLES};
use retail_load::schema::definition_for;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::config::SourceFiles;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Data directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("Source file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("{file}: missing column '{column}'")]
    MissingColumn { file: String, column: String },

    #[error("{file}:{line}: cannot read '{value}' as {expected} for column '{column}'")]
    InvalidCell {
        file: String,
        line: u64,
        column: String,
        value: String,
        expected: String,
    },

    #[error("{file}: {source}")]
    Csv { file: String, source: csv::Error },

    #[error("No definition for raw table '{0}'")]
    UnknownTable(String),

    #[error("Table error: {0}")]
    Table(#[from] TableError),

    #[error("Contract error: {0}")]
    Contract(#[from] ContractError),
}

/// Source headers of the upstream extracts, per raw table
fn aliases(table: &str) -> &'static [(&'static str, &'static str)] {
    match table {
        STOCK => &[
            ("DATA_FOTO", "snapshot_date"),
            ("ID_FILIAL", "store_id"),
            ("PRODUTO", "product"),
            ("COR_PRODUTO", "color"),
            ("TAMANHO", "size"),
            ("TOTAL", "total_on_hand"),
            ("TRANSITO", "in_transit"),
        ],
        STORE => &[
            ("ID_FILIAL", "store_id"),
            ("LOJA", "store_name"),
            ("PONTO_VENDA_COD", "point_of_sale_code"),
            ("PONTO_VENDA", "point_of_sale"),
            ("PUBLICO_LOJA", "audience"),
            ("CANAL", "channel"),
            ("CIDADE", "city"),
            ("LOJA_M2", "floor_area_m2"),
            ("PAIS", "country"),
            ("UF", "state"),
            ("CLIMA", "climate"),
            ("STATUS", "status"),
        ],
        PRODUCTS => &[
            ("ARTIGO_COR", "article_color"),
            ("ARTIGO", "article"),
            ("DESC_PRODUTO", "description"),
            ("COR", "color_code"),
            ("COR_DESCRICAO", "color_description"),
            ("NEGOCIO", "business"),
            ("PARTE", "part"),
            ("GRUPO", "product_group"),
            ("GENERO", "gender"),
            ("COD_COTA", "quota_code"),
            ("COLECAO", "collection"),
            ("PIRAMIDE", "pyramid"),
        ],
        SALES => &[
            ("DATA_VENDA", "sale_date"),
            ("ID_FILIAL", "store_id"),
            ("PRODUTO", "product"),
            ("COR_PRODUTO", "color"),
            ("TAMANHO", "size"),
            ("VENDA_PECAS", "units_sold"),
            ("VENDA_LIQUIDA", "net_revenue"),
            ("VENDA_BRUTA", "gross_revenue"),
        ],
        _ => &[],
    }
}

fn normalize_header(name: &str) -> String {
    // spreadsheet exports sometimes prefix the first header with a BOM
    name.trim().trim_start_matches('\u{feff}').to_ascii_lowercase()
}

/// Canonical column name -> record position
fn map_headers(table: &str, headers: &StringRecord) -> HashMap<String, usize> {
    let aliases = aliases(table);
    let mut positions = HashMap::new();
    for (idx, header) in headers.iter().enumerate() {
        let header = normalize_header(header);
        let canonical = aliases
            .iter()
            .find(|(alias, _)| alias.eq_ignore_ascii_case(&header))
            .map(|(_, name)| name.to_string())
            .unwrap_or(header);
        positions.entry(canonical).or_insert(idx);
    }
    positions
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    // allow a trailing time part, as written by some exporters
    let day = raw.split_whitespace().next()?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(day, "%d/%m/%Y"))
        .ok()
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    Decimal::from_str(&raw.replace(',', ".")).ok()
}

fn parse_integer(raw: &str) -> Option<i64> {
    raw.parse().ok().or_else(|| {
        // "12.0" from float-typed exports
        let d = parse_decimal(raw)?;
        if d.fract().is_zero() {
            i64::try_from(d).ok()
        } else {
            None
        }
    })
}

/// Parse one cell for `data_type`; blank cells are missing values
pub(crate) fn parse_cell(raw: &str, data_type: ColumnType) -> Option<Value> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(Value::Null);
    }

    match data_type {
        ColumnType::Date => parse_date(raw).map(Value::Date),
        ColumnType::Integer | ColumnType::BigInt => parse_integer(raw).map(Value::Integer),
        ColumnType::Decimal { .. } => parse_decimal(raw).map(Value::Decimal),
        ColumnType::Text(_) | ColumnType::Code(_) => Some(Value::text(raw)),
    }
}

fn type_label(data_type: ColumnType) -> String {
    match data_type {
        ColumnType::Date => "date (YYYY-MM-DD or DD/MM/YYYY)".to_string(),
        other => other.sql_type(),
    }
}

/// Reads the four raw CSV files from a data directory
#[derive(Debug, Clone)]
pub struct CsvExtractor {
    base_dir: PathBuf,
    files: SourceFiles,
    delimiter: u8,
}

impl CsvExtractor {
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self, ExtractError> {
        let base_dir = base_dir.into();
        if !base_dir.is_dir() {
            return Err(ExtractError::DirectoryNotFound(base_dir));
        }
        Ok(Self {
            base_dir,
            files: SourceFiles::default(),
            delimiter: b',',
        })
    }

    pub fn with_files(mut self, files: SourceFiles) -> Self {
        self.files = files;
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    fn file_for(&self, table: &str) -> &str {
        match table {
            STOCK => &self.files.stock,
            STORE => &self.files.store,
            PRODUCTS => &self.files.products,
            _ => &self.files.sales,
        }
    }

    /// Read all four raw tables
    pub fn extract_all(&self) -> Result<ExtractedDataset, ExtractError> {
        let mut tables = HashMap::new();
        for name in RAW_TABLES {
            let table = self.extract_table(name, self.file_for(name))?;
            tracing::info!(table = name, rows = table.len(), "Extracted table");
            tables.insert(name.to_string(), table);
        }

        Ok(ExtractedDataset::from_tables(tables)?)
    }

    /// Read one file into the shape of raw table `table`
    pub fn extract_table(&self, table: &str, file_name: &str) -> Result<Table, ExtractError> {
        let definition =
            definition_for(table).ok_or_else(|| ExtractError::UnknownTable(table.to_string()))?;
        let path = self.base_dir.join(file_name);
        if !path.is_file() {
            return Err(ExtractError::FileNotFound(path));
        }

        let csv_err = |source| ExtractError::Csv {
            file: file_name.to_string(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(csv::Trim::All)
            .from_path(&path)
            .map_err(csv_err)?;
        let headers = reader.headers().map_err(csv_err)?.clone();
        let positions = map_headers(table, &headers);

        // absent nullable columns read as missing; absent required ones fail
        let mut sources: Vec<Option<usize>> = Vec::with_capacity(definition.columns.len());
        for column in &definition.columns {
            match positions.get(&column.name) {
                Some(&idx) => sources.push(Some(idx)),
                None if column.nullable => {
                    tracing::warn!(file = file_name, column = %column.name, "Optional column absent");
                    sources.push(None);
                }
                None => {
                    return Err(ExtractError::MissingColumn {
                        file: file_name.to_string(),
                        column: column.name.clone(),
                    })
                }
            }
        }

        let mut out = Table::new(definition.columns.clone())?;
        for record in reader.records() {
            let record = record.map_err(csv_err)?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            let row = definition
                .columns
                .iter()
                .zip(&sources)
                .map(|(column, source)| read_cell(&record, *source, column, file_name, line))
                .collect::<Result<Vec<_>, _>>()?;
            out.push_row(row)?;
        }

        tracing::debug!(file = %path.display(), rows = out.len(), "Read CSV");
        Ok(out)
    }
}

fn read_cell(
    record: &StringRecord,
    source: Option<usize>,
    column: &Column,
    file: &str,
    line: u64,
) -> Result<Value, ExtractError> {
    let raw = source.and_then(|idx| record.get(idx)).unwrap_or("");
    parse_cell(raw, column.data_type).ok_or_else(|| ExtractError::InvalidCell {
        file: file.to_string(),
        line,
        column: column.name.clone(),
        value: raw.to_string(),
        expected: type_label(column.data_type),
    })
}
