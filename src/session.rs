use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Result;
use chrono::Utc;
use log::{error, info};
use uuid::Uuid;

use crate::{
    baseline::BaselineTracker,
    poller::{PollHandle, PollObserver, PollState, PollStatus, Poller, PollerConfig},
    render::{Frame, Renderer},
    telemetry::{FetchError, Snapshot, SnapshotSource},
};

#[derive(Default)]
struct ViewState {
    baseline: BaselineTracker,
    latest: Option<Snapshot>,
    relative_tick: Option<i64>,
}

/// Feeds poller events through the baseline tracker into the renderer.
struct SessionObserver {
    session_id: String,
    view: Mutex<ViewState>,
    renderer: Arc<dyn Renderer>,
}

impl PollObserver for SessionObserver {
    fn on_snapshot(&self, snapshot: &Snapshot) {
        let frame = {
            let mut view = self.view.lock().unwrap_or_else(PoisonError::into_inner);
            let relative_tick = view.baseline.observe(snapshot);
            view.latest = Some(snapshot.clone());
            view.relative_tick = Some(relative_tick);
            Frame {
                snapshot: view.latest.clone(),
                has_error: false,
                error: None,
                relative_tick: view.relative_tick,
                received_at: Utc::now(),
            }
        };
        self.renderer.render(&frame);
    }

    fn on_error(&self, err: &FetchError) {
        error!("session {}: telemetry feed lost: {}", self.session_id, err);
        let frame = {
            let view = self.view.lock().unwrap_or_else(PoisonError::into_inner);
            Frame {
                snapshot: view.latest.clone(),
                has_error: true,
                error: Some(err.to_string()),
                relative_tick: view.relative_tick,
                received_at: Utc::now(),
            }
        };
        self.renderer.render(&frame);
    }
}

/// One mounted view of the telemetry feed: a poll run plus its baseline.
///
/// Dropping the session releases the timer just like [`ViewerSession::stop`].
pub struct ViewerSession {
    id: String,
    poller: Poller,
    handle: PollHandle,
    observer: Arc<SessionObserver>,
}

impl ViewerSession {
    pub fn start<S>(config: PollerConfig, source: S, renderer: Arc<dyn Renderer>) -> Result<Self>
    where
        S: SnapshotSource,
    {
        let id = Uuid::new_v4().to_string();
        let observer = Arc::new(SessionObserver {
            session_id: id.clone(),
            view: Mutex::new(ViewState::default()),
            renderer,
        });

        let poller = Poller::new(config);
        let handle = poller.start(source, observer.clone())?;
        info!("viewer session {} mounted", id);

        Ok(Self {
            id,
            poller,
            handle,
            observer,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn poll_state(&self) -> PollState {
        self.poller.state()
    }

    pub fn status(&self) -> PollStatus {
        self.handle.status()
    }

    pub fn baseline(&self) -> Option<u64> {
        self.observer
            .view
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .baseline
            .baseline()
    }

    /// Resolves once polling has halted on an error or been stopped.
    pub async fn wait_halted(&self) -> PollStatus {
        self.handle.finished().await
    }

    pub async fn stop(&mut self) -> Result<()> {
        if self.handle.is_stopped() {
            return Ok(());
        }
        self.handle.stop().await?;
        info!("viewer session {} unmounted", self.id);
        Ok(())
    }
}
