//! Structured logging infrastructure for Comet Bot

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

type InitResult = std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;
type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Configuration for the logging system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter directive (e.g. "info", "comet_api=debug,info")
    pub level: String,
    /// Emit newline-delimited JSON records
    pub json_format: bool,
    /// Multi-line human readable output with colors
    pub pretty_format: bool,
    /// Optional file to append log output to
    pub file_path: Option<String>,
    /// Also write to stdout when `file_path` is set
    pub console_with_file: bool,
    /// Log span open/close events
    pub include_spans: bool,
    /// Include target module information
    pub include_targets: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            pretty_format: false,
            file_path: None,
            console_with_file: false,
            include_spans: false,
            include_targets: true,
        }
    }
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

fn span_events(include_spans: bool) -> FmtSpan {
    if include_spans {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    }
}

fn file_appender(file_path: &str) -> tracing_appender::rolling::RollingFileAppender {
    let path = Path::new(file_path);
    let directory = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .map_or_else(|| "comet.log".into(), |n| n.to_os_string());
    tracing_appender::rolling::never(directory, file_name)
}

fn console_layer(config: &LoggingConfig) -> BoxedLayer {
    let events = span_events(config.include_spans);
    if config.json_format {
        fmt::layer()
            .json()
            .with_span_events(events)
            .with_target(config.include_targets)
            .boxed()
    } else if config.pretty_format {
        fmt::layer()
            .pretty()
            .with_span_events(events)
            .with_target(config.include_targets)
            .with_thread_names(true)
            .boxed()
    } else {
        fmt::layer()
            .with_span_events(events)
            .with_target(config.include_targets)
            .boxed()
    }
}

fn file_layer(config: &LoggingConfig, file_path: &str) -> BoxedLayer {
    let events = span_events(config.include_spans);
    let writer = file_appender(file_path);
    if config.json_format {
        fmt::layer()
            .json()
            .with_writer(writer)
            .with_span_events(events)
            .with_target(config.include_targets)
            .boxed()
    } else {
        fmt::layer()
            .with_ansi(false)
            .with_writer(writer)
            .with_span_events(events)
            .with_target(config.include_targets)
            .with_thread_ids(true)
            .boxed()
    }
}

/// Initialize the global tracing subscriber with the given configuration.
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(config: LoggingConfig) -> InitResult {
    let mut layers: Vec<BoxedLayer> = Vec::new();

    match config.file_path.as_deref() {
        Some(file_path) => {
            layers.push(file_layer(&config, file_path));
            if config.console_with_file {
                layers.push(console_layer(&config));
            }
        }
        None => layers.push(console_layer(&config)),
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter(&config.level))
        .try_init()?;

    Ok(())
}

/// Initialize logging with default configuration
pub fn init_default_logging() -> InitResult {
    init_logging(LoggingConfig::default())
}

/// Initialize logging for development (pretty, debug level)
pub fn init_dev_logging() -> InitResult {
    init_logging(LoggingConfig {
        level: "debug".to_string(),
        pretty_format: true,
        include_spans: true,
        ..LoggingConfig::default()
    })
}
