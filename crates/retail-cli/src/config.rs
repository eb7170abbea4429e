//! Batch configuration
//!
//! `config.yaml` supplies paths, transform options, report and logging
//! settings. Process environment (including a `.env` file loaded by `main`)
//! wins over the file; CLI flags win over both.

use std::path::{Path, PathBuf};

use retail_transform::{FillPolicy, TransformOptions};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

/// Source file names, relative to the data directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceFiles {
    pub stock: String,
    pub store: String,
    pub products: String,
    pub sales: String,
}

impl Default for SourceFiles {
    fn default() -> Self {
        Self {
            stock: "estoque_hering.csv".to_string(),
            store: "lojas_hering.csv".to_string(),
            products: "produtos_hering.csv".to_string(),
            sales: "vendas_hering.csv".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub directory: PathBuf,
    /// Field delimiter, a single ASCII character
    pub delimiter: char,
    pub files: SourceFiles,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("data"),
            delimiter: ',',
            files: SourceFiles::default(),
        }
    }
}

impl DataConfig {
    pub fn delimiter_byte(&self) -> Result<u8, ConfigError> {
        u8::try_from(self.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| ConfigError::Invalid {
                key: "data.delimiter".to_string(),
                reason: format!("'{}' is not a single ASCII character", self.delimiter),
            })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// DuckDB file; in-memory when unset
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub enabled: bool,
    pub queries_dir: PathBuf,
    /// Query names, each resolved to `<queries_dir>/<name>.sql`
    pub queries: Vec<String>,
    /// Fail the run when a configured query file is missing
    pub required: bool,
    /// Where to write the JSON run summary
    pub summary_path: Option<PathBuf>,
    pub preview_rows: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            queries_dir: PathBuf::from("queries"),
            queries: vec![
                "sales_velocity".to_string(),
                "sales_by_region".to_string(),
                "sales".to_string(),
            ],
            required: false,
            summary_path: None,
            preview_rows: 5,
        }
    }
}

/// `logging:` section, consumed by [`crate::logging::init`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives, e.g. `info,retail_load=debug`
    pub level: String,
    /// pretty | json | compact
    pub format: String,
    /// stdout | file | both
    pub output: String,
    pub directory: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
            output: "stdout".into(),
            directory: PathBuf::from("logs"),
        }
    }
}

/// Root of `config.yaml`; every section may be omitted
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub database: DatabaseConfig,
    pub transform: TransformOptions,
    pub report: ReportConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Parse `path`, then apply environment overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&contents)?;
        config.apply_env()?;
        Ok(config)
    }

    /// Like [`Config::load`], but a missing file yields the defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            return Self::load(path);
        }
        let mut config = Config::default();
        config.apply_env()?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(dir) = std::env::var("RETAIL_DATA_DIR") {
            self.data.directory = PathBuf::from(dir);
        }
        if let Ok(path) = std::env::var("RETAIL_DATABASE_PATH") {
            self.database.path = Some(PathBuf::from(path));
        }
        if let Ok(policy) = std::env::var("RETAIL_FILL_POLICY") {
            self.transform.fill_policy =
                policy
                    .parse::<FillPolicy>()
                    .map_err(|reason| ConfigError::Invalid {
                        key: "RETAIL_FILL_POLICY".to_string(),
                        reason,
                    })?;
        }
        if let Ok(parallel) = std::env::var("RETAIL_PARALLEL") {
            self.transform.parallel = parse_bool(&parallel).ok_or_else(|| ConfigError::Invalid {
                key: "RETAIL_PARALLEL".to_string(),
                reason: format!("'{}' is not a boolean", parallel),
            })?;
        }
        if let Ok(dir) = std::env::var("RETAIL_QUERIES_DIR") {
            self.report.queries_dir = PathBuf::from(dir);
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("LOG_FORMAT") {
            self.logging.format = format;
        }
        if let Ok(output) = std::env::var("LOG_OUTPUT") {
            self.logging.output = output;
        }
        if let Ok(dir) = std::env::var("LOG_DIR") {
            self.logging.directory = PathBuf::from(dir);
        }

        Ok(())
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.data.directory, PathBuf::from("data"));
        assert_eq!(config.data.files.sales, "vendas_hering.csv");
        assert_eq!(config.database.path, None);
        assert_eq!(config.transform.fill_policy, FillPolicy::TypeAware);
        assert!(!config.transform.parallel);
        assert_eq!(config.report.queries.len(), 3);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.output, "stdout");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: Config = serde_yaml::from_str(
            r#"
data:
  directory: "/srv/extracts"
  delimiter: ";"
transform:
  fill_policy: literal-zero
report:
  required: true
"#,
        )
        .unwrap();

        assert_eq!(config.data.directory, PathBuf::from("/srv/extracts"));
        assert_eq!(config.data.delimiter_byte().unwrap(), b';');
        assert_eq!(config.data.files, SourceFiles::default());
        assert_eq!(config.transform.fill_policy, FillPolicy::LiteralZero);
        assert!(config.report.required);
        assert_eq!(config.report.preview_rows, 5);
    }

    #[test]
    fn test_non_ascii_delimiter_rejected() {
        let data = DataConfig {
            delimiter: '§',
            ..Default::default()
        };
        assert!(matches!(data.delimiter_byte(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_env_var_override() {
        std::env::set_var("RETAIL_DATABASE_PATH", "/tmp/override.duckdb");
        std::env::set_var("RETAIL_PARALLEL", "yes");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            r#"
database:
  path: "retail.duckdb"
transform:
  parallel: false
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.database.path, Some(PathBuf::from("/tmp/override.duckdb")));
        assert!(config.transform.parallel);

        std::env::remove_var("RETAIL_DATABASE_PATH");
        std::env::remove_var("RETAIL_PARALLEL");
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config.report.queries_dir, PathBuf::from("queries"));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
