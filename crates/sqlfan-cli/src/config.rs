//! `sqlfan.toml` loading

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlfan_core::ConnectionParams;
use sqlfan_query::RetryPolicy;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = "sqlfan.toml";

/// `<config_dir>/sqlfan/sqlfan.toml`
pub fn default_path() -> Result<PathBuf> {
    dirs::config_dir()
        .context("Could not determine config directory")
        .map(|p| p.join("sqlfan").join(CONFIG_FILE_NAME))
}

/// Retry settings for single-statement operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_ms: 1000,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.delay_ms))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database the CLI runs against
    pub database_path: PathBuf,
    pub max_concurrency: usize,
    pub retry: RetryConfig,
    pub credentials: ConnectionParams,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("warehouse.db"),
            max_concurrency: 5,
            retry: RetryConfig::default(),
            credentials: ConnectionParams::default(),
        }
    }
}

impl Config {
    /// Load the file at `path`, falling back to defaults when it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = Self::from_toml(&text)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.max_concurrency >= 1, "max_concurrency must be at least 1");
        anyhow::ensure!(self.retry.max_attempts >= 1, "retry.max_attempts must be at least 1");
        Ok(())
    }

    /// Apply values given on the command line or through the environment
    pub fn with_overrides(mut self, database: Option<PathBuf>, max_concurrency: Option<usize>) -> Self {
        if let Some(database) = database {
            self.database_path = database;
        }
        if let Some(max) = max_concurrency {
            self.max_concurrency = max.max(1);
        }
        self
    }
}
