mod common;

use std::{sync::Arc, time::Duration};

use common::{advance, RecordingRenderer, ScriptedSource, Step};
use outreach_lib::{
    poller::{PollStatus, PollerConfig},
    session::ViewerSession,
};

fn config() -> PollerConfig {
    PollerConfig {
        interval: Duration::from_millis(500),
        fetch_timeout: Duration::from_millis(1000),
    }
}

#[tokio::test(start_paused = true)]
async fn relative_ticks_count_from_first_snapshot() {
    let renderer = Arc::new(RecordingRenderer::default());
    let mut session =
        ViewerSession::start(config(), ScriptedSource::ticks([50, 50, 60]), renderer.clone()).unwrap();

    advance(1250).await;

    assert_eq!(renderer.relative_ticks(), vec![Some(0), Some(0), Some(10)]);
    assert_eq!(session.baseline(), Some(50));
    assert!(renderer.frames().iter().all(|frame| !frame.has_error));

    session.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn error_freezes_last_snapshot_on_screen() {
    let renderer = Arc::new(RecordingRenderer::default());
    let source = ScriptedSource::new([Step::Tick(100), Step::Tick(105), Step::Fail, Step::Tick(110)]);
    let session = ViewerSession::start(config(), source.clone(), renderer.clone()).unwrap();

    assert_eq!(session.wait_halted().await, PollStatus::Halted);
    advance(5000).await;

    let frames = renderer.frames();
    assert_eq!(frames.len(), 3);
    assert_eq!(renderer.relative_ticks(), vec![Some(0), Some(5), Some(5)]);

    let last = frames.last().unwrap();
    assert!(last.has_error);
    assert_eq!(last.snapshot.as_ref().map(|s| s.tick), Some(105));
    assert!(last.error.as_deref().unwrap().contains("connection reset"));

    assert_eq!(source.calls(), 3);
    assert_eq!(session.status(), PollStatus::Halted);
    assert!(session.poll_state().has_error());
}

#[tokio::test(start_paused = true)]
async fn error_before_any_snapshot_has_nothing_to_show() {
    let renderer = Arc::new(RecordingRenderer::default());
    let session = ViewerSession::start(config(), ScriptedSource::new([Step::Fail]), renderer.clone()).unwrap();

    session.wait_halted().await;

    let frames = renderer.frames();
    assert_eq!(frames.len(), 1);
    assert!(frames[0].has_error);
    assert!(frames[0].snapshot.is_none());
    assert_eq!(frames[0].relative_tick, None);
    assert_eq!(session.baseline(), None);
}

#[tokio::test(start_paused = true)]
async fn unmount_stops_rendering() {
    let renderer = Arc::new(RecordingRenderer::default());
    let source = ScriptedSource::ticks(1..=100);
    let mut session = ViewerSession::start(config(), source.clone(), renderer.clone()).unwrap();

    advance(600).await;
    session.stop().await.unwrap();
    session.stop().await.unwrap();

    let rendered = renderer.frames().len();
    assert_eq!(rendered, 2);
    assert_eq!(session.status(), PollStatus::Idle);

    advance(5000).await;
    assert_eq!(renderer.frames().len(), rendered);
    assert_eq!(source.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn each_session_has_its_own_baseline() {
    let first_renderer = Arc::new(RecordingRenderer::default());
    let mut first =
        ViewerSession::start(config(), ScriptedSource::ticks([10, 20]), first_renderer.clone()).unwrap();
    advance(600).await;
    first.stop().await.unwrap();

    let second_renderer = Arc::new(RecordingRenderer::default());
    let mut second =
        ViewerSession::start(config(), ScriptedSource::ticks([400, 401]), second_renderer.clone()).unwrap();
    advance(600).await;
    second.stop().await.unwrap();

    assert_ne!(first.id(), second.id());
    assert_eq!(first_renderer.relative_ticks(), vec![Some(0), Some(10)]);
    assert_eq!(second_renderer.relative_ticks(), vec![Some(0), Some(1)]);
}
