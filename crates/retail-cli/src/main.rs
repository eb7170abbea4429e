//! Retail ETL batch
//!
//! Reads the raw CSV extracts, derives available stock, sales velocity and
//! sales by region, loads everything into DuckDB and runs the report queries.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

mod config;
mod extract;
mod logging;
mod pipeline;
mod report;

use config::Config;

#[derive(Parser, Debug)]
#[command(name = "retail-etl")]
#[command(about = "Transform and load retail sales and stock extracts into DuckDB")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults apply when it does not exist)
    #[arg(long, short = 'c', default_value = "config.yaml")]
    config: PathBuf,

    /// Directory holding the source CSV files
    #[arg(long, short = 'd')]
    data_dir: Option<PathBuf>,

    /// DuckDB database file
    #[arg(long)]
    database: Option<PathBuf>,

    /// Skip the report queries after loading
    #[arg(long)]
    skip_report: bool,
}

fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = Config::load_or_default(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;
    if let Some(dir) = cli.data_dir {
        config.data.directory = dir;
    }
    if let Some(path) = cli.database {
        config.database.path = Some(path);
    }

    let _log_guard = logging::init(&config.logging)?;

    match pipeline::run(&config, cli.skip_report) {
        Ok(summary) => {
            tracing::info!(
                run_id = %summary.run_id,
                tables = summary.load.tables.len(),
                rows = summary.load.total_rows(),
                "Run finished"
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Run failed: {:#}", e);
            Err(e)
        }
    }
}
