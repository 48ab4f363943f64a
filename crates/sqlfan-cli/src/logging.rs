//! Logging setup for the CLI
//!
//! Everything is written to stderr so that stdout only carries command output.
//! `RUST_LOG` takes precedence over the level given on the command line.

use std::io::IsTerminal;
use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Crates whose events the default filter lets through
const SQLFAN_CRATES: [&str; 5] = [
    "sqlfan",
    "sqlfan_core",
    "sqlfan_query",
    "sqlfan_services",
    "sqlfan_driver_sqlite",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,

    /// Whether to include file/line information in logs
    pub include_location: bool,

    /// Filter used when `RUST_LOG` is not set
    pub default_filter: String,
}

impl LoggingConfig {
    pub fn new(format: LogFormat, level: &str) -> Self {
        Self {
            format,
            include_location: cfg!(debug_assertions),
            default_filter: default_filter(level),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::new(LogFormat::default(), "warn")
    }
}

/// `warn` for dependencies, `level` for the SQLFAN crates
fn default_filter(level: &str) -> String {
    let mut directives = vec!["warn".to_string()];
    directives.extend(SQLFAN_CRATES.iter().map(|krate| format!("{}={}", krate, level)));
    directives.join(",")
}

/// Install the global subscriber
pub fn init(config: LoggingConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.default_filter))?;

    let layer: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        LogFormat::Text => fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_ansi(std::io::stderr().is_terminal())
            .with_filter(env_filter)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(true)
            .with_span_list(false)
            .with_filter(env_filter)
            .boxed(),
    };

    tracing_subscriber::registry().with(layer).try_init()?;

    tracing::debug!(format = ?config.format, "logging initialized");
    Ok(())
}
