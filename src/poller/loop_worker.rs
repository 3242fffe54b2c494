use std::sync::Arc;

use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::telemetry::{FetchError, SnapshotSource};

use super::controller::{PollObserver, PollerConfig, Shared};

// Set to false to silence per-fetch logging from this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

/// Fetches on every tick until cancelled or until the first failure.
///
/// Fetches never overlap: a slow fetch delays the following tick instead of
/// stacking requests, so completions always arrive in request order.
pub(super) async fn poll_loop<S>(
    source: S,
    observer: Arc<dyn PollObserver>,
    shared: Arc<Shared>,
    generation: u64,
    config: PollerConfig,
    cancel_token: CancellationToken,
) where
    S: SnapshotSource,
{
    // The first tick completes immediately.
    let mut ticker = time::interval(config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut fetches: u64 = 0;

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_info!("poll loop shutting down after {} fetches", fetches);
                break;
            }
            _ = ticker.tick() => {}
        }

        fetches = fetches.wrapping_add(1);

        let outcome = tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_info!("poll loop cancelled with fetch #{} in flight; result discarded", fetches);
                break;
            }
            result = time::timeout(config.fetch_timeout, source.fetch()) => {
                result.unwrap_or(Err(FetchError::Timeout(config.fetch_timeout)))
            }
        };

        match outcome {
            Ok(snapshot) => {
                if !shared.deliver_snapshot(generation, &snapshot, observer.as_ref()) {
                    log_debug!("run {} no longer live; dropping tick {}", generation, snapshot.tick);
                    break;
                }
                log_debug!("fetch #{} ok, tick {}", fetches, snapshot.tick);
            }
            Err(err) => {
                if shared.deliver_error(generation, &err, observer.as_ref()) {
                    log_warn!("fetch #{} failed, polling halted: {}", fetches, err);
                }
                break;
            }
        }
    }
}
