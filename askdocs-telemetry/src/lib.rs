//! # askdocs-telemetry
//!
//! Installs the global `tracing` subscriber for askdocs binaries.
//!
//! The level comes from [`TelemetryConfig::level`] unless `RUST_LOG` is set,
//! in which case `RUST_LOG` wins. Output is either human-readable or one JSON
//! object per line.
//!
//! ```rust,ignore
//! use askdocs_telemetry::{init_telemetry, LogFormat, TelemetryConfig};
//!
//! init_telemetry(&TelemetryConfig { level: "info".into(), format: LogFormat::Json })?;
//! tracing::info!(collection = "documents", "ready");
//! ```

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid log filter '{filter}': {message}")]
    InvalidFilter { filter: String, message: String },

    #[error("unknown log format '{0}', expected 'pretty' or 'json'")]
    UnknownFormat(String),

    #[error("global subscriber already installed: {0}")]
    AlreadyInitialized(String),
}

/// Line format for log output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(TelemetryError::UnknownFormat(other.to_string())),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pretty => f.write_str("pretty"),
            Self::Json => f.write_str("json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Default filter directive, e.g. `info` or `askdocs_rag=debug,info`.
    pub level: String,
    pub format: LogFormat,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Pretty }
    }
}

/// Resolve the effective filter: `RUST_LOG` if set, else `level`.
pub fn build_filter(level: &str) -> Result<EnvFilter, TelemetryError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(level)
        .map_err(|e| TelemetryError::InvalidFilter { filter: level.to_string(), message: e.to_string() })
}

/// Install the global subscriber.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] for an unparsable level and
/// [`TelemetryError::AlreadyInitialized`] if a global subscriber exists.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = build_filter(&config.level)?;

    let fmt_layer = match config.format {
        LogFormat::Pretty => tracing_subscriber::fmt::layer().with_target(true).boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(false)
            .flatten_event(true)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(filter))
        .try_init()
        .map_err(|e| TelemetryError::AlreadyInitialized(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_log_formats() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!(" Pretty ".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!(matches!("xml".parse::<LogFormat>(), Err(TelemetryError::UnknownFormat(_))));
        assert_eq!(LogFormat::Json.to_string(), "json");
    }

    #[test]
    fn second_init_is_an_error() {
        let config = TelemetryConfig::default();
        assert!(init_telemetry(&config).is_ok());
        assert!(matches!(init_telemetry(&config), Err(TelemetryError::AlreadyInitialized(_))));
    }
}
