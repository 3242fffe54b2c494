use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use crate::config::{OutputFormat, ViewerConfig};

/// Live view of the ASI Outreach sensor board.
#[derive(Debug, Parser)]
#[command(name = "outreach", author, version, about)]
pub struct Cli {
    /// Snapshot endpoint [default: http://192.168.4.1/data]
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Milliseconds between fetches [default: 500]
    #[arg(long, value_name = "MS")]
    pub interval_ms: Option<u64>,

    /// Milliseconds before a fetch counts as failed [default: 1000]
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// JSON config file; flags and OUTREACH_* variables take precedence
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format [default: text]
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Exit when polling halts instead of keeping the last reading on screen
    #[arg(long)]
    pub exit_on_error: bool,

    /// Log verbosity; RUST_LOG overrides it
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    pub log_level: LevelFilter,
}

impl Cli {
    /// Builds the effective configuration from every layer.
    pub fn resolve_config(&self) -> Result<ViewerConfig> {
        let mut config = match &self.config {
            Some(path) => ViewerConfig::from_file(path)?,
            None => ViewerConfig::default(),
        };
        config.apply_env()?;
        self.apply_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut ViewerConfig) {
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = endpoint.clone();
        }
        if let Some(interval_ms) = self.interval_ms {
            config.interval_ms = interval_ms;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.timeout_ms = timeout_ms;
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        if self.exit_on_error {
            config.exit_on_error = true;
        }
    }
}
