//! One batch run: extract -> transform -> load -> report

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use retail_duck::DuckRepository;
use retail_load::{LoadOrchestrator, LoadReport};
use retail_transform::Transformer;
use serde::Serialize;
use uuid::Uuid;

use crate::config::Config;
use crate::extract::CsvExtractor;
use crate::report::{run_reports, QueryOutcome};

/// What a run did, written as JSON when `report.summary_path` is set
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub fingerprint: String,
    pub load: LoadReport,
    pub reports: Vec<QueryOutcome>,
}

pub fn run(config: &Config, skip_report: bool) -> Result<RunSummary> {
    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("run", %run_id);
    let _guard = span.enter();

    let started_at = Utc::now();
    let clock = Instant::now();
    tracing::info!(data_dir = %config.data.directory.display(), "Starting retail ETL run");

    let extractor = CsvExtractor::new(&config.data.directory)
        .context("extract phase failed")?
        .with_files(config.data.files.clone())
        .with_delimiter(config.data.delimiter_byte()?);
    let dataset = extractor.extract_all().context("extract phase failed")?;

    let bundle = Transformer::new(config.transform)
        .transform(dataset)
        .context("transform phase failed")?;

    let fingerprint = bundle
        .fingerprint()
        .context("failed to fingerprint transformed bundle")?;
    tracing::info!(%fingerprint, "Bundle ready");

    let mut repository = match &config.database.path {
        Some(path) => DuckRepository::open(path)
            .with_context(|| format!("failed to open database {}", path.display()))?,
        None => {
            tracing::warn!("No database path configured, loading into an in-memory database");
            DuckRepository::open_in_memory().context("failed to open in-memory database")?
        }
    };

    let load = LoadOrchestrator::new(&mut repository)
        .load(bundle)
        .map_err(|e| {
            let context = format!("{} phase failed for table '{}'", e.phase(), e.table());
            anyhow::Error::new(e).context(context)
        })?;

    let reports = if skip_report || !config.report.enabled {
        tracing::info!("Report step skipped");
        Vec::new()
    } else {
        run_reports(&mut repository, &config.report).context("report phase failed")?
    };

    let summary = RunSummary {
        run_id,
        started_at,
        finished_at: Utc::now(),
        fingerprint,
        load,
        reports,
    };

    if let Some(path) = &config.report.summary_path {
        write_summary(path, &summary)
            .with_context(|| format!("failed to write run summary to {}", path.display()))?;
        tracing::info!(path = %path.display(), "Run summary written");
    }

    crate::log_event!(
        level: tracing::Level::INFO,
        event: "run_complete",
        total_rows: summary.load.total_rows(),
        schema_version: summary.load.schema_version,
        elapsed_ms: clock.elapsed().as_millis() as u64,
    );

    Ok(summary)
}

fn write_summary(path: &Path, summary: &RunSummary) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, summary)?;
    Ok(())
}
