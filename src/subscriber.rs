//! Tracing subscriber setup for the command line.

use std::fs::OpenOptions;
use std::io::{self, IsTerminal};
use std::sync::Mutex;

use thiserror::Error;
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, format::FmtSpan, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingConfig};

/// Install the global subscriber described by `config`.
///
/// A non-empty `RUST_LOG` takes precedence over `config.level`.
pub fn init(config: &LoggingConfig) -> Result<(), LoggingError> {
    let filter = build_filter(&config.level)?;
    let layer = build_layer(config)?;

    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .try_init()
        .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))
}

/// Parse the filter, preferring `RUST_LOG` when set.
pub fn build_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV)
        .ok()
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| level.to_string());
    EnvFilter::try_new(&directives).map_err(|e| LoggingError::InvalidFilter(e.to_string()))
}

fn build_layer(
    config: &LoggingConfig,
) -> Result<Box<dyn Layer<Registry> + Send + Sync>, LoggingError> {
    let (writer, ansi) = match config.output.as_str() {
        "stdout" => (
            BoxMakeWriter::new(io::stdout),
            config.color && io::stdout().is_terminal(),
        ),
        "stderr" => (
            BoxMakeWriter::new(io::stderr),
            config.color && io::stderr().is_terminal(),
        ),
        path => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| LoggingError::FileOpen(path.to_string(), e))?;
            (BoxMakeWriter::new(Mutex::new(file)), false)
        }
    };

    let base = fmt::layer()
        .with_target(config.target)
        .with_span_events(FmtSpan::NONE)
        .with_writer(writer);

    let layer = match (config.format, config.timestamps) {
        (LogFormat::Text, true) => base.with_ansi(ansi).boxed(),
        (LogFormat::Text, false) => base.with_ansi(ansi).without_time().boxed(),
        (LogFormat::Json, true) => base.json().boxed(),
        (LogFormat::Json, false) => base.json().without_time().boxed(),
    };
    Ok(layer)
}

/// Errors that can occur during logging initialization.
#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),

    #[error("Failed to open log file '{0}': {1}")]
    FileOpen(String, #[source] io::Error),

    #[error("Logging already initialized: {0}")]
    AlreadyInitialized(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_filter_rejected() {
        if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
            return;
        }
        assert!(matches!(
            build_filter("user_stats=loudest"),
            Err(LoggingError::InvalidFilter(_))
        ));
    }

    #[test]
    fn test_log_file_in_missing_directory() {
        let config = LoggingConfig {
            output: "/nonexistent-dir/for/user-stats.log".into(),
            ..LoggingConfig::default()
        };
        assert!(matches!(build_layer(&config), Err(LoggingError::FileOpen(..))));
    }
}
