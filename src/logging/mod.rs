//! Structured logging for wintrack
//!
//! Console output goes to stderr so that `wintrack watch --json` can keep
//! stdout as a clean event stream.

use crate::Result;
use anyhow::{anyhow, Context};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Mutex;
use tracing::debug;
use tracing_subscriber::{
    fmt::{self, time::UtcTime, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    pub output: LogOutput,
    /// Required when `output` includes a file
    pub file_path: Option<PathBuf>,
    pub include_source: bool,
    pub include_thread_names: bool,
    /// Raise the tracker modules to trace level
    pub performance_tracing: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(format!("Invalid log level: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    Stderr,
    File,
    Both,
}

impl FromStr for LogOutput {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stderr" | "console" => Ok(LogOutput::Stderr),
            "file" => Ok(LogOutput::File),
            "both" => Ok(LogOutput::Both),
            _ => Err(format!("Invalid log output: {}", s)),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
            output: LogOutput::Stderr,
            file_path: None,
            include_source: false,
            include_thread_names: true,
            performance_tracing: false,
        }
    }
}

impl LogConfig {
    pub fn development() -> Self {
        Self {
            level: LogLevel::Debug,
            format: LogFormat::Pretty,
            include_source: true,
            performance_tracing: true,
            ..Self::default()
        }
    }

    /// Read `WINTRACK_LOG_*` variables on top of the defaults.
    /// Unparseable values are ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let flag = |key: &str| lookup(key).map(|value| value.eq_ignore_ascii_case("true"));

        if let Some(level) = lookup("WINTRACK_LOG_LEVEL").and_then(|v| v.parse().ok()) {
            config.level = level;
        }
        if let Some(format) = lookup("WINTRACK_LOG_FORMAT").and_then(|v| v.parse().ok()) {
            config.format = format;
        }
        if let Some(output) = lookup("WINTRACK_LOG_OUTPUT").and_then(|v| v.parse().ok()) {
            config.output = output;
        }
        if let Some(path) = lookup("WINTRACK_LOG_FILE") {
            config.file_path = Some(PathBuf::from(path));
        }
        if let Some(include_source) = flag("WINTRACK_LOG_SOURCE") {
            config.include_source = include_source;
        }
        if let Some(threads) = flag("WINTRACK_LOG_THREADS") {
            config.include_thread_names = threads;
        }
        if let Some(performance) = flag("WINTRACK_LOG_PERFORMANCE") {
            config.performance_tracing = performance;
        }

        config
    }

    fn filter_directives(&self) -> String {
        let mut directives = format!("wintrack={}", self.level.as_str());
        if self.performance_tracing {
            directives.push_str(",wintrack::services::window_tracker=trace");
            directives.push_str(",wintrack::services::tracker_service=trace");
        }
        directives
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.filter_directives()));

    let mut layers: Vec<BoxedLayer> = Vec::new();
    if matches!(config.output, LogOutput::Stderr | LogOutput::Both) {
        layers.push(fmt_layer(config, BoxMakeWriter::new(std::io::stderr), true));
    }
    if matches!(config.output, LogOutput::File | LogOutput::Both) {
        let path = config
            .file_path
            .as_ref()
            .ok_or_else(|| anyhow!("File path required for file output"))?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        layers.push(fmt_layer(config, BoxMakeWriter::new(Mutex::new(file)), false));
    }

    tracing_subscriber::registry()
        .with(layers.with_filter(filter))
        .try_init()?;

    debug!(?config, "Logging initialized");
    Ok(())
}

fn fmt_layer(config: &LogConfig, writer: BoxMakeWriter, ansi: bool) -> BoxedLayer {
    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi)
        .with_timer(UtcTime::rfc_3339())
        .with_thread_names(config.include_thread_names)
        .with_file(config.include_source)
        .with_line_number(config.include_source);

    match config.format {
        LogFormat::Pretty => Box::new(layer.pretty()),
        LogFormat::Compact => Box::new(layer.compact()),
        LogFormat::Json => Box::new(layer.json()),
    }
}

/// Time a block and log its duration at debug level
#[macro_export]
macro_rules! trace_performance {
    ($name:expr, $block:block) => {{
        let span = tracing::debug_span!("performance", operation = $name);
        let _enter = span.enter();
        let start = std::time::Instant::now();

        let result = $block;

        tracing::debug!(
            operation = $name,
            elapsed_us = start.elapsed().as_micros() as u64,
            "Performance trace"
        );
        result
    }};
}

#[cfg(test)]
pub fn init_test_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let config = LogConfig {
            level: LogLevel::Debug,
            include_thread_names: false,
            ..LogConfig::default()
        };
        if let Err(e) = init_logging(&config) {
            eprintln!("Failed to initialize test logging: {}", e);
        }
    });
}
