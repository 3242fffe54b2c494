#![allow(dead_code)]

use std::{
    collections::VecDeque,
    future::Future,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use outreach_lib::{
    poller::PollObserver,
    render::{Frame, Renderer},
    telemetry::{
        Air, ChargingStatus, Environment, FetchError, LightReading, Power, Snapshot,
        SnapshotSource, Vector3,
    },
};

pub fn snapshot(tick: u64) -> Snapshot {
    Snapshot {
        light: vec![
            LightReading::Processed {
                gain: 1.0,
                integration: 100.0,
                lux: 250.0,
            },
            LightReading::Raw { raw: 1024.0 },
        ],
        gyro: Vector3 {
            x: 0.01,
            y: 0.02,
            z: -0.01,
        },
        accelerometer: Vector3 {
            x: 0.0,
            y: 0.1,
            z: 9.8,
        },
        magnetometer: Vector3 {
            x: 30.0,
            y: -12.0,
            z: 44.0,
        },
        power: Power {
            vbat: 3.95,
            charging: ChargingStatus::NotCharging,
        },
        environment: Environment {
            temperature: 22.0,
            humidity: 38.5,
            pressure: 1012.0,
        },
        air: Air {
            raw: 50000.0,
            index: 75.0,
        },
        tick,
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Step {
    Tick(u64),
    /// Answers with `tick` after `delay`.
    Slow(Duration, u64),
    Fail,
    /// Never answers.
    Hang,
}

/// Replays a fixed list of fetch outcomes; hangs once the list runs out.
#[derive(Clone)]
pub struct ScriptedSource {
    steps: Arc<Mutex<VecDeque<Step>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedSource {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: Arc::new(Mutex::new(steps.into_iter().collect())),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn ticks(ticks: impl IntoIterator<Item = u64>) -> Self {
        Self::new(ticks.into_iter().map(Step::Tick))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SnapshotSource for ScriptedSource {
    fn fetch(&self) -> impl Future<Output = Result<Snapshot, FetchError>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self.steps.lock().unwrap().pop_front().unwrap_or(Step::Hang);

        async move {
            match step {
                Step::Tick(tick) => Ok(snapshot(tick)),
                Step::Slow(delay, tick) => {
                    tokio::time::sleep(delay).await;
                    Ok(snapshot(tick))
                }
                Step::Fail => Err(FetchError::Transport("connection reset by peer".into())),
                Step::Hang => std::future::pending().await,
            }
        }
    }
}

#[derive(Default)]
pub struct RecordingObserver {
    snapshots: Mutex<Vec<Snapshot>>,
    errors: Mutex<Vec<FetchError>>,
}

impl RecordingObserver {
    pub fn ticks(&self) -> Vec<u64> {
        self.snapshots.lock().unwrap().iter().map(|s| s.tick).collect()
    }

    pub fn errors(&self) -> Vec<FetchError> {
        self.errors.lock().unwrap().clone()
    }
}

impl PollObserver for RecordingObserver {
    fn on_snapshot(&self, snapshot: &Snapshot) {
        self.snapshots.lock().unwrap().push(snapshot.clone());
    }

    fn on_error(&self, error: &FetchError) {
        self.errors.lock().unwrap().push(error.clone());
    }
}

#[derive(Default)]
pub struct RecordingRenderer {
    frames: Mutex<Vec<Frame>>,
}

impl RecordingRenderer {
    pub fn frames(&self) -> Vec<Frame> {
        self.frames.lock().unwrap().clone()
    }

    pub fn relative_ticks(&self) -> Vec<Option<i64>> {
        self.frames().iter().map(|f| f.relative_tick).collect()
    }
}

impl Renderer for RecordingRenderer {
    fn render(&self, frame: &Frame) {
        self.frames.lock().unwrap().push(frame.clone());
    }
}

pub async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}
