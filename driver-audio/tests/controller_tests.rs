//! Playback controller behavior
//!
//! Covers the session lifecycle end to end with fake streams:
//! - start/stop preconditions and the single-session rule
//! - natural completion, looping restarts and cancellation
//! - failures inside the loop resetting the state on their own
//! - sink write failures not ending playback

mod common;

use common::{wait_until, FakeSource, StreamPlan, MISSING};
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
use driver_audio::{
    AudioOutput, AudioPinConfig, AudioSink, NullSink, PlaybackController, PlaybackError,
    SessionOutcome,
};
use mockall::mock;
use std::sync::Arc;
use std::time::Duration;

const SETTLE: Duration = Duration::from_secs(5);

mock! {
    pub Sink {}

    impl AudioSink for Sink {
        fn write_frame(&self, samples: &[f32]) -> driver_audio::Result<()>;
        fn describe(&self) -> String;
    }
}

fn ready_output() -> (Arc<AudioOutput>, Arc<NullSink>) {
    let output = Arc::new(AudioOutput::new());
    let sink = Arc::new(NullSink::new());
    output.initialize(sink.clone()).unwrap();
    (output, sink)
}

fn controller(source: Arc<FakeSource>, output: Arc<AudioOutput>, config: AudioPinConfig) -> PlaybackController {
    PlaybackController::new("alarm", config, source, output)
}

fn looping() -> AudioPinConfig {
    AudioPinConfig::new("/sounds/alarm.mp3").with_looping(true)
}

fn one_shot() -> AudioPinConfig {
    AudioPinConfig::new("/sounds/alarm.mp3")
}

// ============================================================================
// Preconditions
// ============================================================================

#[tokio::test]
async fn test_start_without_sink_fails_without_side_effects() {
    let source = FakeSource::new(StreamPlan::finite(1000));
    let ctrl = controller(source.clone(), Arc::new(AudioOutput::new()), one_shot());

    let result = ctrl.start();

    assert!(matches!(result, Err(PlaybackError::SinkNotInitialized)));
    assert!(!ctrl.is_active());
    assert!(!ctrl.has_session());
    assert_eq!(source.counters.opens(), 0);
}

#[tokio::test]
async fn test_second_start_is_rejected_and_first_session_keeps_running() {
    let (output, sink) = ready_output();
    let source = FakeSource::new(StreamPlan::finite(512).with_frame_delay(Duration::from_millis(2)));
    let ctrl = controller(source.clone(), output, looping());

    ctrl.start().unwrap();
    let second = ctrl.start();

    assert!(matches!(second, Err(PlaybackError::AlreadyRunning)));
    assert!(ctrl.is_active());

    let before = sink.samples_written();
    assert!(wait_until(SETTLE, || sink.samples_written() > before).await);
    assert_eq!(source.counters.opens(), 1);

    ctrl.stop().await.unwrap();
}

#[tokio::test]
async fn test_stop_on_idle_controller_is_noop() {
    let (output, _) = ready_output();
    let ctrl = controller(FakeSource::new(StreamPlan::finite(10)), output, one_shot());

    assert!(!ctrl.is_active());
    ctrl.stop().await.unwrap();
    ctrl.stop().await.unwrap();
    assert!(!ctrl.is_active());
}

// ============================================================================
// Session endings
// ============================================================================

#[tokio::test]
async fn test_one_shot_session_completes_on_its_own() {
    let (output, sink) = ready_output();
    let source = FakeSource::new(StreamPlan::finite(1000).with_frame_delay(Duration::from_millis(20)));
    let ctrl = controller(source.clone(), output, one_shot());

    ctrl.start().unwrap();
    assert!(ctrl.is_active());

    assert!(wait_until(SETTLE, || !ctrl.is_active()).await);
    assert!(wait_until(SETTLE, || !ctrl.has_session()).await);

    let report = ctrl.last_report().unwrap();
    assert!(matches!(report.outcome, SessionOutcome::Completed));
    assert_eq!(report.stats.samples_written, 1000);
    assert_eq!(report.stats.restarts, 0);
    assert_eq!(sink.samples_written(), 1000);
    assert_eq!(source.counters.live_streams(), 0);

    // A finished session does not block the next one
    ctrl.start().unwrap();
    ctrl.stop().await.unwrap();
}

#[tokio::test]
async fn test_looping_session_restarts_until_stopped() {
    let (output, _) = ready_output();
    let source = FakeSource::new(StreamPlan::finite(300).with_frame_delay(Duration::from_millis(1)));
    let ctrl = controller(source.clone(), output, looping());

    ctrl.start().unwrap();
    assert!(wait_until(SETTLE, || source.counters.rewinds() >= 3).await);
    assert!(ctrl.is_active());

    ctrl.stop().await.unwrap();

    assert!(!ctrl.is_active());
    assert!(!ctrl.has_session());
    assert_eq!(source.counters.live_streams(), 0);
    assert_eq!(source.counters.opens(), 1);

    let report = ctrl.last_report().unwrap();
    assert!(matches!(report.outcome, SessionOutcome::Cancelled));
    assert!(report.stats.restarts >= 3);
}

#[tokio::test]
async fn test_missing_file_resets_state_after_successful_start() {
    let (output, _) = ready_output();
    let source = FakeSource::new(StreamPlan::finite(100));
    let ctrl = controller(source.clone(), output, AudioPinConfig::new(MISSING));

    ctrl.start().unwrap();

    assert!(wait_until(SETTLE, || !ctrl.is_active()).await);
    assert!(wait_until(SETTLE, || !ctrl.has_session()).await);
    let report = ctrl.last_report().unwrap();
    assert!(matches!(
        report.outcome,
        SessionOutcome::Failed(PlaybackError::StreamOpenFailed(_))
    ));
}

#[tokio::test]
async fn test_read_failure_ends_session() {
    let (output, _) = ready_output();
    let source = FakeSource::new(StreamPlan::finite(1000).with_read_failure_at(512));
    let ctrl = controller(source.clone(), output, looping());

    ctrl.start().unwrap();

    assert!(wait_until(SETTLE, || !ctrl.has_session()).await);
    assert!(!ctrl.is_active());
    let report = ctrl.last_report().unwrap();
    assert!(matches!(
        report.outcome,
        SessionOutcome::Failed(PlaybackError::DecodeFailed(_))
    ));
    assert_eq!(report.stats.samples_written, 512);
    assert_eq!(source.counters.live_streams(), 0);
}

#[tokio::test]
async fn test_rewind_failure_ends_looping_session() {
    let (output, _) = ready_output();
    let source = FakeSource::new(StreamPlan::finite(300).with_failing_rewind());
    let ctrl = controller(source.clone(), output, looping());

    ctrl.start().unwrap();

    assert!(wait_until(SETTLE, || !ctrl.has_session()).await);
    assert!(!ctrl.is_active());
    let report = ctrl.last_report().unwrap();
    assert!(matches!(
        report.outcome,
        SessionOutcome::Failed(PlaybackError::RestartFailed(_))
    ));
}

#[tokio::test]
async fn test_empty_looping_stream_does_not_spin() {
    let (output, _) = ready_output();
    let source = FakeSource::new(StreamPlan::finite(0));
    let ctrl = controller(source.clone(), output, looping());

    ctrl.start().unwrap();

    assert!(wait_until(SETTLE, || !ctrl.has_session()).await);
    assert!(!ctrl.is_active());
    assert_eq!(source.counters.rewinds(), 0);
    let report = ctrl.last_report().unwrap();
    assert!(matches!(
        report.outcome,
        SessionOutcome::Failed(PlaybackError::RestartFailed(_))
    ));
}

#[tokio::test]
async fn test_stream_of_empty_frames_ends_session() {
    let (output, sink) = ready_output();
    let source = FakeSource::new(StreamPlan::finite(1000).with_empty_frames());
    let ctrl = controller(source.clone(), output, looping());

    ctrl.start().unwrap();

    assert!(wait_until(SETTLE, || !ctrl.has_session()).await);
    assert!(!ctrl.is_active());
    assert_eq!(sink.samples_written(), 0);
    assert_eq!(source.counters.live_streams(), 0);
    let report = ctrl.last_report().unwrap();
    assert!(matches!(
        report.outcome,
        SessionOutcome::Failed(PlaybackError::DecodeFailed(_))
    ));
}

// ============================================================================
// Sink failures
// ============================================================================

#[tokio::test]
async fn test_sink_write_failures_do_not_stop_playback() {
    let mut sink = MockSink::new();
    sink.expect_describe().return_const("mock sink".to_string());
    sink.expect_write_frame()
        .returning(|_| Err(PlaybackError::SinkWriteFailed("device unplugged".to_string())));

    let output = Arc::new(AudioOutput::new());
    output.initialize(Arc::new(sink)).unwrap();

    let source = FakeSource::new(StreamPlan::finite(1000));
    let ctrl = controller(source, output, one_shot());

    ctrl.start().unwrap();
    assert!(wait_until(SETTLE, || !ctrl.has_session()).await);

    let report = ctrl.last_report().unwrap();
    assert!(matches!(report.outcome, SessionOutcome::Completed));
    // 1000 samples in frames of 256
    assert_eq!(report.stats.write_failures, 4);
    assert_eq!(report.stats.samples_written, 0);
}

#[tokio::test]
async fn test_sink_recovers_mid_session() {
    let mut sink = MockSink::new();
    let mut calls = 0;
    sink.expect_describe().return_const("flaky sink".to_string());
    sink.expect_write_frame().returning(move |_| {
        calls += 1;
        if calls <= 2 {
            Err(PlaybackError::SinkWriteFailed("underrun".to_string()))
        } else {
            Ok(())
        }
    });

    let output = Arc::new(AudioOutput::new());
    output.initialize(Arc::new(sink)).unwrap();

    let ctrl = controller(FakeSource::new(StreamPlan::finite(1024)), output, one_shot());
    ctrl.start().unwrap();
    assert!(wait_until(SETTLE, || !ctrl.has_session()).await);

    let report = ctrl.last_report().unwrap();
    assert_eq!(report.stats.write_failures, 2);
    assert_eq!(report.stats.samples_written, 512);
}

// ============================================================================
// Stop timeout
// ============================================================================

#[tokio::test]
async fn test_stop_timeout_keeps_single_session() {
    let (output, _) = ready_output();
    let source = FakeSource::new(StreamPlan::finite(100_000).with_frame_delay(Duration::from_millis(300)));
    let ctrl = controller(source.clone(), output, looping())
        .with_stop_timeout(Duration::from_millis(20));

    ctrl.start().unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let result = ctrl.stop().await;
    assert!(matches!(result, Err(PlaybackError::StopTimedOut(_))));
    assert!(!ctrl.is_active());
    assert!(ctrl.has_session());

    // Still draining: no second session
    assert!(matches!(ctrl.start(), Err(PlaybackError::AlreadyRunning)));

    assert!(wait_until(SETTLE, || !ctrl.has_session()).await);
    assert_eq!(source.counters.live_streams(), 0);

    ctrl.start().unwrap();
    assert!(ctrl.is_active());
    // The new session is also slow to stop; just cancel it.
    let _ = ctrl.stop().await;
    assert!(wait_until(SETTLE, || !ctrl.has_session()).await);
}

// ============================================================================
// Events
// ============================================================================

#[tokio::test]
async fn test_events_follow_session_lifecycle() {
    let (output, _) = ready_output();
    let bus = EventBus::new(1024);
    let mut events = bus.subscribe();
    let source = FakeSource::new(StreamPlan::finite(300).with_frame_delay(Duration::from_millis(1)));
    let ctrl = controller(source.clone(), output, looping()).with_event_bus(bus);

    ctrl.start().unwrap();
    assert!(wait_until(SETTLE, || source.counters.rewinds() >= 1).await);
    ctrl.stop().await.unwrap();

    let mut received = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let CoreEvent::Playback(event) = event {
            received.push(event);
        }
    }

    assert!(matches!(received.first(), Some(PlaybackEvent::Started { session_id: 1, .. })));
    assert!(matches!(received.last(), Some(PlaybackEvent::Stopped { session_id: 1, .. })));
    assert!(received
        .iter()
        .any(|e| matches!(e, PlaybackEvent::Restarted { restarts: 1, .. })));
    assert!(received.iter().all(|e| e.session_id() == 1));
}

#[tokio::test]
async fn test_started_precedes_restarts_of_short_looping_stream() {
    let (output, _) = ready_output();
    let source = FakeSource::new(StreamPlan::finite(10));

    for round in 0..300 {
        let bus = EventBus::new(1 << 16);
        let mut events = bus.subscribe();
        let ctrl = controller(source.clone(), output.clone(), looping()).with_event_bus(bus);

        ctrl.start().unwrap();
        tokio::time::sleep(Duration::from_millis(1)).await;
        ctrl.stop().await.unwrap();

        let first = events.try_recv().unwrap();
        assert!(
            matches!(first, CoreEvent::Playback(PlaybackEvent::Started { .. })),
            "round {}: first event was {:?}",
            round,
            first
        );
    }
    assert_eq!(source.counters.live_streams(), 0);
}

#[tokio::test]
async fn test_failed_session_publishes_error_event() {
    let (output, _) = ready_output();
    let ctrl = controller(FakeSource::new(StreamPlan::finite(10)), output, AudioPinConfig::new(MISSING));
    let mut events = ctrl.subscribe();

    ctrl.start().unwrap();
    assert!(wait_until(SETTLE, || !ctrl.has_session()).await);

    let started = events.recv().await.unwrap();
    let failed = events.recv().await.unwrap();

    assert!(matches!(started, CoreEvent::Playback(PlaybackEvent::Started { .. })));
    match failed {
        CoreEvent::Playback(PlaybackEvent::Error { message, .. }) => {
            assert!(message.contains("missing.mp3"))
        }
        other => panic!("expected error event, got {:?}", other),
    }
}
