mod utils;

pub mod baseline;
pub mod cli;
pub mod config;
pub mod poller;
pub mod render;
pub mod session;
pub mod telemetry;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use cli::Cli;
use config::{OutputFormat, ViewerConfig};
use poller::PollStatus;
use render::{JsonRenderer, Renderer, TextRenderer};
use session::ViewerSession;
use telemetry::HttpSource;

pub use baseline::BaselineTracker;
pub use poller::{PollHandle, PollObserver, Poller, PollerConfig};
pub use telemetry::{FetchError, Snapshot, SnapshotSource};

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so they never interleave with the dashboard on stdout.
    env_logger::Builder::new()
        .filter_level(cli.log_level)
        .parse_default_env()
        .init();

    let config = cli.resolve_config()?;

    // Everything runs cooperatively on one thread.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(view(config))
}

/// Mounts a viewer session against the configured endpoint and keeps it up
/// until Ctrl-C, or until polling halts when `exit_on_error` is set.
pub async fn view(config: ViewerConfig) -> Result<()> {
    info!("ASI Outreach viewer starting up, endpoint {}", config.endpoint);

    let source = HttpSource::new(&config.endpoint, config.timeout())?;
    let renderer: Arc<dyn Renderer> = match config.format {
        OutputFormat::Text => Arc::new(TextRenderer::stdout()),
        OutputFormat::Json => Arc::new(JsonRenderer::stdout()),
    };

    let mut session = ViewerSession::start(config.poller_config(), source, renderer)?;

    let result = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for Ctrl-C")
        }
        status = session.wait_halted(), if config.exit_on_error => {
            if status == PollStatus::Halted {
                warn!("polling halted; exiting");
            }
            Ok(())
        }
    };

    session.stop().await?;
    result
}
