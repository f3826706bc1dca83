//! # Playback Controller
//!
//! Owns at most one playback session per audio pin and runs its
//! decode-and-output loop on a dedicated thread.
//!
//! ## Session Lifecycle
//!
//! ```text
//!            start()                       EOF (no loop) / failure / cancel
//!   Idle ──────────────► Running ─────────────────────────────────────► Idle
//!                         │   ▲
//!                         └───┘ EOF (loop): rewind
//!
//!   Running ── stop() ──► Stopping (active = false, session registered)
//!                            └── loop observes cancellation ──► Idle
//! ```
//!
//! `start` returns as soon as the loop thread is launched. Whether the file
//! could be opened is only visible afterwards, through [`is_active`] going
//! back to `false` and through the `Error` event on the bus.
//!
//! `stop` cancels the session and waits until the loop has exited, so once it
//! returns `Ok` the stream and decoder have been released. The wait is bounded
//! by [`with_stop_timeout`]; after a timeout the session stays registered and
//! `start` keeps failing with `AlreadyRunning` until the loop is gone.
//!
//! [`is_active`]: PlaybackController::is_active
//! [`with_stop_timeout`]: PlaybackController::with_stop_timeout

use crate::config::AudioPinConfig;
use crate::error::{PlaybackError, Result};
use crate::output::AudioOutput;
use crate::traits::{AudioSink, AudioSource, AudioStream, FrameRead, FRAME_SAMPLES};
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent, Receiver};
use core_runtime::logging::strip_path;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, instrument, warn};

/// How long `stop` waits for the loop by default.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Consecutive empty frames tolerated before the stream is considered stuck.
const MAX_EMPTY_READS: u32 = 1024;

/// How a session ended.
#[derive(Debug)]
pub enum SessionOutcome {
    /// The loop observed a stop request.
    Cancelled,
    /// A non-looping stream reached its end.
    Completed,
    /// The stream could not be opened, read or restarted.
    Failed(PlaybackError),
}

/// Counters collected by one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Samples accepted by the sink
    pub samples_written: u64,
    /// Frames the sink refused
    pub write_failures: u64,
    /// End-of-stream rewinds
    pub restarts: u64,
}

/// Final report of a finished session.
#[derive(Debug)]
pub struct SessionReport {
    pub session_id: u64,
    pub outcome: SessionOutcome,
    pub stats: SessionStats,
}

#[derive(Clone)]
struct SessionHandle {
    id: u64,
    cancel: CancellationToken,
    exited: watch::Receiver<bool>,
}

#[derive(Default)]
struct ControllerState {
    active: bool,
    session: Option<SessionHandle>,
    next_session_id: u64,
    last_report: Option<Arc<SessionReport>>,
}

/// Single-session playback controller behind an audio pin.
pub struct PlaybackController {
    name: String,
    config: AudioPinConfig,
    source: Arc<dyn AudioSource>,
    output: Arc<AudioOutput>,
    events: EventBus,
    stop_timeout: Duration,
    state: Arc<Mutex<ControllerState>>,
}

impl PlaybackController {
    /// Creates an idle controller.
    ///
    /// Events go to a private bus until [`with_event_bus`](Self::with_event_bus)
    /// supplies a shared one.
    pub fn new(
        name: impl Into<String>,
        config: AudioPinConfig,
        source: Arc<dyn AudioSource>,
        output: Arc<AudioOutput>,
    ) -> Self {
        Self {
            name: name.into(),
            config,
            source,
            output,
            events: EventBus::default(),
            stop_timeout: DEFAULT_STOP_TIMEOUT,
            state: Arc::new(Mutex::new(ControllerState::default())),
        }
    }

    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &AudioPinConfig {
        &self.config
    }

    /// Start a playback session.
    ///
    /// Returns once the loop thread is running. Success does not mean the
    /// file could be opened.
    ///
    /// # Errors
    ///
    /// - `SinkNotInitialized` if the output context has no sink
    /// - `AlreadyRunning` if a session is still registered, including one
    ///   that was stopped but has not exited yet
    /// - `Internal` if the loop thread could not be spawned
    #[instrument(skip(self), fields(driver = %self.name))]
    pub fn start(&self) -> Result<()> {
        let sink = self.output.sink()?;

        let mut state = self.state.lock();
        if let Some(session) = &state.session {
            debug!(session_id = session.id, "Start rejected, session still registered");
            return Err(PlaybackError::AlreadyRunning);
        }

        state.next_session_id += 1;
        let session_id = state.next_session_id;
        let cancel = CancellationToken::new();
        let (exit_tx, exit_rx) = watch::channel(false);

        let session = PlaybackSession {
            id: session_id,
            driver: self.name.clone(),
            config: self.config.clone(),
            source: Arc::clone(&self.source),
            sink,
            cancel: cancel.clone(),
            events: self.events.clone(),
            state: Arc::clone(&self.state),
            exit: exit_tx,
        };

        std::thread::Builder::new()
            .name(format!("audio-pin-{}", session_id))
            .spawn(move || session.run())
            .map_err(|e| {
                error!(error = %e, "Failed to spawn playback thread");
                PlaybackError::Internal(format!("failed to spawn playback thread: {}", e))
            })?;

        state.active = true;
        state.session = Some(SessionHandle {
            id: session_id,
            cancel,
            exited: exit_rx,
        });

        // Loop events are emitted under the same lock, so this comes first.
        self.events
            .emit(CoreEvent::Playback(PlaybackEvent::Started {
                driver: self.name.clone(),
                session_id,
            }))
            .ok();

        info!(
            session_id,
            file = %strip_path(&self.config.file_path.to_string_lossy()),
            looping = self.config.looping,
            "Playback started"
        );
        Ok(())
    }

    /// Stop the current session and wait for its loop to exit.
    ///
    /// A no-op on an idle controller. `is_active` is `false` afterwards
    /// whatever the result.
    ///
    /// # Errors
    ///
    /// Returns `StopTimedOut` if the loop did not exit within the stop
    /// timeout. The loop still exits at its next checkpoint.
    #[instrument(skip(self), fields(driver = %self.name))]
    pub async fn stop(&self) -> Result<()> {
        let session = {
            let mut state = self.state.lock();
            state.active = false;
            state.session.clone()
        };

        let Some(SessionHandle {
            id,
            cancel,
            mut exited,
        }) = session
        else {
            debug!("Stop on idle controller");
            return Ok(());
        };

        cancel.cancel();

        let wait = async move {
            // A closed channel means the loop dropped its sender, so it is gone.
            exited.wait_for(|done| *done).await.map(|_| ()).ok();
        };

        match tokio::time::timeout(self.stop_timeout, wait).await {
            Ok(()) => {
                debug!(session_id = id, "Playback loop exited");
                Ok(())
            }
            Err(_) => {
                warn!(
                    session_id = id,
                    timeout = ?self.stop_timeout,
                    "Playback loop did not acknowledge stop in time"
                );
                Err(PlaybackError::StopTimedOut(self.stop_timeout))
            }
        }
    }

    /// Last state accepted by `start`/`stop`, or reset by the loop itself.
    pub fn is_active(&self) -> bool {
        self.state.lock().active
    }

    /// Whether a loop is still registered, including one being stopped.
    pub fn has_session(&self) -> bool {
        self.state.lock().session.is_some()
    }

    /// Report of the most recently finished session.
    pub fn last_report(&self) -> Option<Arc<SessionReport>> {
        self.state.lock().last_report.clone()
    }

    /// Subscribe to this controller's playback events.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.events.subscribe()
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        // Nobody can wait for the loop any more; just tell it to exit.
        if let Some(session) = &self.state.lock().session {
            session.cancel.cancel();
        }
    }
}

impl fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackController")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("active", &self.is_active())
            .field("has_session", &self.has_session())
            .finish()
    }
}

/// Everything one loop thread owns.
struct PlaybackSession {
    id: u64,
    driver: String,
    config: AudioPinConfig,
    source: Arc<dyn AudioSource>,
    sink: Arc<dyn AudioSink>,
    cancel: CancellationToken,
    events: EventBus,
    state: Arc<Mutex<ControllerState>>,
    exit: watch::Sender<bool>,
}

impl PlaybackSession {
    fn run(self) {
        let span = info_span!("playback", driver = %self.driver, session_id = self.id);
        let _guard = span.enter();

        let mut stats = SessionStats::default();
        let outcome = self.play(&mut stats);

        match &outcome {
            SessionOutcome::Cancelled => info!(?stats, "Playback stopped"),
            SessionOutcome::Completed => info!(?stats, "Playback completed"),
            SessionOutcome::Failed(e) => error!(error = %e, ?stats, "Playback failed"),
        }

        self.finish(outcome, stats);
    }

    /// Runs the loop. The stream is dropped when this returns.
    fn play(&self, stats: &mut SessionStats) -> SessionOutcome {
        let mut stream = match self.source.open(&self.config.file_path) {
            Ok(stream) => stream,
            Err(e) => {
                return SessionOutcome::Failed(match e {
                    PlaybackError::StreamOpenFailed(_) => e,
                    other => PlaybackError::StreamOpenFailed(other.to_string()),
                })
            }
        };
        debug!("Stream opened");

        let mut buf = [0.0f32; FRAME_SAMPLES];
        let mut pass_samples: u64 = 0;
        let mut failing_since: Option<u64> = None;
        let mut empty_reads: u32 = 0;

        loop {
            if self.cancel.is_cancelled() {
                return SessionOutcome::Cancelled;
            }

            match stream.read_frame(&mut buf) {
                Ok(FrameRead::Samples(n)) => {
                    let n = n.min(buf.len());
                    if n == 0 {
                        empty_reads += 1;
                        if empty_reads >= MAX_EMPTY_READS {
                            return SessionOutcome::Failed(PlaybackError::DecodeFailed(format!(
                                "stream returned {} empty frames in a row",
                                empty_reads
                            )));
                        }
                        std::thread::yield_now();
                        continue;
                    }
                    empty_reads = 0;
                    pass_samples += n as u64;
                    self.write(&buf[..n], stats, &mut failing_since);
                }
                Ok(FrameRead::EndOfStream) => {
                    if !self.config.looping {
                        return SessionOutcome::Completed;
                    }
                    if pass_samples == 0 {
                        return SessionOutcome::Failed(PlaybackError::RestartFailed(
                            "stream produced no samples before its end".to_string(),
                        ));
                    }
                    if let Err(e) = self.restart(stream.as_mut(), stats) {
                        return SessionOutcome::Failed(e);
                    }
                    pass_samples = 0;
                }
                Err(e) => {
                    return SessionOutcome::Failed(match e {
                        PlaybackError::DecodeFailed(_) => e,
                        other => PlaybackError::DecodeFailed(other.to_string()),
                    })
                }
            }
        }
    }

    fn write(&self, samples: &[f32], stats: &mut SessionStats, failing_since: &mut Option<u64>) {
        match self.sink.write_frame(samples) {
            Ok(()) => {
                stats.samples_written += samples.len() as u64;
                if let Some(first) = failing_since.take() {
                    info!(
                        failed_frames = stats.write_failures - first,
                        "Sink writes recovered"
                    );
                }
            }
            Err(e) => {
                // A refused frame is dropped; playback carries on.
                if failing_since.is_none() {
                    warn!(error = %e, "Sink write failed");
                    *failing_since = Some(stats.write_failures);
                } else {
                    debug!(error = %e, failures = stats.write_failures + 1, "Sink write failed");
                }
                stats.write_failures += 1;
            }
        }
    }

    fn restart(&self, stream: &mut dyn AudioStream, stats: &mut SessionStats) -> Result<()> {
        stream.rewind().map_err(|e| match e {
            PlaybackError::RestartFailed(_) => e,
            other => PlaybackError::RestartFailed(other.to_string()),
        })?;

        stats.restarts += 1;
        debug!(restarts = stats.restarts, "End of stream, restarted");

        // `start` holds this lock until `Started` is on the bus.
        let _state = self.state.lock();
        self.events
            .emit(CoreEvent::Playback(PlaybackEvent::Restarted {
                driver: self.driver.clone(),
                session_id: self.id,
                restarts: stats.restarts,
            }))
            .ok();
        Ok(())
    }

    /// Publish the outcome and release anyone waiting in `stop`.
    fn finish(self, outcome: SessionOutcome, stats: SessionStats) {
        let event = match &outcome {
            SessionOutcome::Cancelled => PlaybackEvent::Stopped {
                driver: self.driver.clone(),
                session_id: self.id,
            },
            SessionOutcome::Completed => PlaybackEvent::Completed {
                driver: self.driver.clone(),
                session_id: self.id,
            },
            SessionOutcome::Failed(e) => PlaybackEvent::Error {
                driver: self.driver.clone(),
                session_id: self.id,
                message: e.to_string(),
            },
        };

        {
            let mut state = self.state.lock();
            if state.session.as_ref().map(|s| s.id) == Some(self.id) {
                state.session = None;
                state.active = false;
            }
            state.last_report = Some(Arc::new(SessionReport {
                session_id: self.id,
                outcome,
                stats,
            }));
            self.events.emit(CoreEvent::Playback(event)).ok();
        }

        self.exit.send_replace(true);
    }
}
