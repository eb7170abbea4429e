//! Subscriber setup for the batch
//!
//! Driven by [`LoggingConfig`], which already carries the `RUST_LOG`,
//! `LOG_FORMAT`, `LOG_OUTPUT` and `LOG_DIR` overrides.

use std::str::FromStr;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LoggingConfig;

const LOG_FILE_PREFIX: &str = "retail-etl.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line, for a terminal
    Pretty,
    /// One JSON object per event, with the current span (run id)
    Json,
    Compact,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    Stdout,
    /// Daily-rotated files under the configured directory
    File,
    Both,
}

impl LogOutput {
    fn writes_file(self) -> bool {
        matches!(self, LogOutput::File | LogOutput::Both)
    }
}

impl FromStr for LogOutput {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stdout" => Ok(LogOutput::Stdout),
            "file" => Ok(LogOutput::File),
            "both" => Ok(LogOutput::Both),
            other => Err(format!("unknown log output '{}'", other)),
        }
    }
}

/// Install the global subscriber.
///
/// File output goes through a non-blocking writer; keep the returned guard
/// alive until exit so buffered lines are flushed.
///
/// ```bash
/// # local run, verbose transform logs
/// RUST_LOG=info,retail_transform=debug retail-etl
///
/// # scheduled run
/// LOG_FORMAT=json LOG_OUTPUT=file LOG_DIR=/var/log/retail retail-etl -c /etc/retail/config.yaml
/// ```
pub fn init(config: &LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let format: LogFormat = config.format.parse().map_err(anyhow::Error::msg)?;
    let output: LogOutput = config.output.parse().map_err(anyhow::Error::msg)?;
    let filter = EnvFilter::try_new(&config.level)
        .with_context(|| format!("invalid log level '{}'", config.level))?;

    let console = match output {
        LogOutput::File => None,
        LogOutput::Stdout | LogOutput::Both => Some(match format {
            LogFormat::Pretty => fmt::layer().pretty().with_target(true).boxed(),
            LogFormat::Json => fmt::layer().json().with_current_span(true).boxed(),
            LogFormat::Compact => fmt::layer().compact().boxed(),
        }),
    };

    let (file, guard) = if output.writes_file() {
        std::fs::create_dir_all(&config.directory)
            .with_context(|| format!("cannot create log directory {}", config.directory.display()))?;
        let appender = RollingFileAppender::new(Rotation::DAILY, &config.directory, LOG_FILE_PREFIX);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = match format {
            LogFormat::Json => fmt::layer().json().with_writer(writer).boxed(),
            _ => fmt::layer().with_ansi(false).with_writer(writer).boxed(),
        };
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .context("a global subscriber is already installed")?;

    tracing::debug!(
        level = %config.level,
        ?format,
        ?output,
        dir = %config.directory.display(),
        "Logging initialized"
    );
    Ok(guard)
}

/// Emit one event with an `event` name and debug-formatted fields
///
/// ```ignore
/// log_event!(level: tracing::Level::INFO, event: "table_loaded", table: "sales", rows: 100);
/// ```
#[macro_export]
macro_rules! log_event {
    (level: $level:expr, event: $event:expr $(, $key:ident: $value:expr)* $(,)?) => {
        tracing::event!(
            $level,
            event = $event
            $(, $key = ?$value)*
        );
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_format_and_output() {
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!(" compact".parse::<LogFormat>(), Ok(LogFormat::Compact));
        assert!("xml".parse::<LogFormat>().is_err());

        assert_eq!("both".parse::<LogOutput>(), Ok(LogOutput::Both));
        assert!(LogOutput::File.writes_file());
        assert!(!LogOutput::Stdout.writes_file());
        assert!("syslog".parse::<LogOutput>().is_err());
    }
}
