use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use anyhow::{bail, Context, Result};
use log::info;
use tokio::{sync::watch, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::telemetry::{FetchError, Snapshot, SnapshotSource};

use super::loop_worker::poll_loop;
use super::{PollState, PollStatus};

pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    /// Period between fetch attempts. The first attempt is immediate.
    pub interval: Duration,
    /// Upper bound on a single fetch; exceeding it counts as a failure.
    pub fetch_timeout: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

/// Receives the outcome of every fetch made by a running poller.
///
/// `on_error` is called at most once per run, after which the run is halted.
/// Callbacks run while the poll state is locked, so once a handle has been
/// stopped or dropped no callback for its run can start. They must not call
/// back into the [`Poller`].
pub trait PollObserver: Send + Sync {
    fn on_snapshot(&self, snapshot: &Snapshot);
    fn on_error(&self, error: &FetchError);
}

/// State shared between the poller, its handle and the loop task.
pub(super) struct Shared {
    state: Mutex<PollState>,
    status_tx: watch::Sender<PollStatus>,
}

impl Shared {
    fn new() -> Self {
        let (status_tx, _) = watch::channel(PollStatus::Idle);
        Self {
            state: Mutex::new(PollState::new()),
            status_tx,
        }
    }

    // Never held across an await, so a poisoned lock still holds consistent state.
    fn lock(&self) -> MutexGuard<'_, PollState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin_run(&self) -> Result<u64> {
        let mut state = self.lock();
        if state.status != PollStatus::Idle {
            bail!("poller already active ({:?})", state.status);
        }
        let generation = state.begin_run();
        self.status_tx.send_replace(PollStatus::Polling);
        Ok(generation)
    }

    /// Stores the snapshot and notifies the observer if the run is still
    /// live. Returns whether it was applied.
    pub(super) fn deliver_snapshot(
        &self,
        generation: u64,
        snapshot: &Snapshot,
        observer: &dyn PollObserver,
    ) -> bool {
        let mut state = self.lock();
        if !state.record_snapshot(generation, snapshot.clone()) {
            return false;
        }
        observer.on_snapshot(snapshot);
        true
    }

    /// Halts a live run and reports the error once. Returns whether the run
    /// was halted by this call.
    pub(super) fn deliver_error(
        &self,
        generation: u64,
        error: &FetchError,
        observer: &dyn PollObserver,
    ) -> bool {
        let mut state = self.lock();
        if !state.halt(generation, error) {
            return false;
        }
        self.status_tx.send_replace(PollStatus::Halted);
        observer.on_error(error);
        true
    }

    fn end_run(&self, generation: u64) {
        let mut state = self.lock();
        if state.generation == generation {
            state.reset();
            self.status_tx.send_replace(PollStatus::Idle);
        }
    }
}

/// Drives periodic snapshot fetches with a fail-stop policy.
///
/// A poller runs at most one loop at a time; each `start` hands back the
/// [`PollHandle`] that owns the loop's timer.
#[derive(Clone)]
pub struct Poller {
    shared: Arc<Shared>,
    config: PollerConfig,
}

impl Poller {
    pub fn new(config: PollerConfig) -> Self {
        Self {
            shared: Arc::new(Shared::new()),
            config,
        }
    }

    pub fn state(&self) -> PollState {
        self.shared.lock().clone()
    }

    pub fn status(&self) -> PollStatus {
        self.shared.lock().status
    }

    pub fn subscribe(&self) -> watch::Receiver<PollStatus> {
        self.shared.status_tx.subscribe()
    }

    /// Starts polling `source` and fetches once right away.
    ///
    /// Fails if a previous run has not been stopped yet. Must be called from
    /// within a tokio runtime.
    pub fn start<S>(&self, source: S, observer: Arc<dyn PollObserver>) -> Result<PollHandle>
    where
        S: SnapshotSource,
    {
        if self.config.interval.is_zero() {
            bail!("poll interval must be greater than zero");
        }

        let generation = self.shared.begin_run()?;
        let cancel_token = CancellationToken::new();

        let handle = tokio::spawn(poll_loop(
            source,
            observer,
            self.shared.clone(),
            generation,
            self.config,
            cancel_token.clone(),
        ));

        info!(
            "polling started (run {}, every {:?}, timeout {:?})",
            generation, self.config.interval, self.config.fetch_timeout
        );

        Ok(PollHandle {
            shared: self.shared.clone(),
            cancel_token,
            handle: Some(handle),
            generation,
        })
    }
}

/// Owns the timer of one poll run. Stopping or dropping it releases the timer
/// and returns the poller to `Idle`.
pub struct PollHandle {
    shared: Arc<Shared>,
    cancel_token: CancellationToken,
    handle: Option<JoinHandle<()>>,
    generation: u64,
}

impl PollHandle {
    pub fn status(&self) -> PollStatus {
        let state = self.shared.lock();
        if state.generation == self.generation {
            state.status
        } else {
            PollStatus::Idle
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.handle.is_none()
    }

    /// Resolves once the run has left `Polling`, either halted by an error or
    /// stopped.
    pub async fn finished(&self) -> PollStatus {
        let mut status_rx = self.shared.status_tx.subscribe();
        if self.is_stopped() {
            return PollStatus::Idle;
        }
        let status = match status_rx.wait_for(|status| *status != PollStatus::Polling).await {
            Ok(status) => *status,
            Err(_) => PollStatus::Idle,
        };
        status
    }

    /// Cancels the timer and waits for the loop to exit. Safe to call more
    /// than once; a fetch still in flight is dropped unapplied.
    pub async fn stop(&mut self) -> Result<()> {
        self.cancel_token.cancel();

        let joined = match self.handle.take() {
            Some(handle) => handle.await.context("poll loop task failed to join"),
            None => return Ok(()),
        };

        self.shared.end_run(self.generation);
        info!("polling stopped (run {})", self.generation);
        joined
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel_token.cancel();
        if let Some(handle) = self.handle.take() {
            handle.abort();
            self.shared.end_run(self.generation);
        }
    }
}
