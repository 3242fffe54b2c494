use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::poller::PollerConfig;

pub const DEFAULT_ENDPOINT: &str = "http://192.168.4.1/data";
pub const DEFAULT_INTERVAL_MS: u64 = 500;
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

pub const ENV_ENDPOINT: &str = "OUTREACH_ENDPOINT";
pub const ENV_INTERVAL_MS: &str = "OUTREACH_INTERVAL_MS";
pub const ENV_TIMEOUT_MS: &str = "OUTREACH_TIMEOUT_MS";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Viewer settings. Sources are layered: defaults, then the optional JSON
/// file, then `OUTREACH_*` environment variables, then command-line flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewerConfig {
    pub endpoint: String,
    pub interval_ms: u64,
    pub timeout_ms: u64,
    pub format: OutputFormat,
    /// Exit once polling halts instead of keeping the frozen display up.
    pub exit_on_error: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.into(),
            interval_ms: DEFAULT_INTERVAL_MS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            format: OutputFormat::default(),
            exit_on_error: false,
        }
    }
}

impl ViewerConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config in {}", path.display()))
    }

    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup(ENV_ENDPOINT) {
            self.endpoint = endpoint;
        }
        if let Some(value) = lookup(ENV_INTERVAL_MS) {
            self.interval_ms = parse_ms(ENV_INTERVAL_MS, &value)?;
        }
        if let Some(value) = lookup(ENV_TIMEOUT_MS) {
            self.timeout_ms = parse_ms(ENV_TIMEOUT_MS, &value)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.interval_ms == 0 {
            bail!("interval_ms must be greater than zero");
        }
        if self.timeout_ms == 0 {
            bail!("timeout_ms must be greater than zero");
        }

        let url = Url::parse(&self.endpoint)
            .with_context(|| format!("endpoint {} is not an absolute URL", self.endpoint))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("endpoint {} must use http or https", self.endpoint);
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            interval: self.interval(),
            fetch_timeout: self.timeout(),
        }
    }
}

fn parse_ms(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse::<u64>()
        .with_context(|| format!("{key} must be a whole number of milliseconds, got {value:?}"))
}
