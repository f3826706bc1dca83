//! Fake audio sources shared by the integration tests.

#![allow(dead_code)]

use driver_audio::{AudioSource, AudioStream, FrameRead, PlaybackError, Result};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Path the fake source refuses to open.
pub const MISSING: &str = "/sounds/missing.mp3";

/// How streams opened by a [`FakeSource`] behave.
#[derive(Debug, Clone, Default)]
pub struct StreamPlan {
    /// Samples produced per pass before end-of-stream
    pub samples: usize,
    /// Sleep before every frame read
    pub frame_delay: Duration,
    /// `rewind` fails
    pub fail_rewind: bool,
    /// Reading fails once this many samples have been produced
    pub fail_read_at: Option<usize>,
    /// Every read returns zero samples
    pub empty_frames: bool,
}

impl StreamPlan {
    pub fn finite(samples: usize) -> Self {
        Self {
            samples,
            ..Default::default()
        }
    }

    pub fn with_frame_delay(mut self, delay: Duration) -> Self {
        self.frame_delay = delay;
        self
    }

    pub fn with_failing_rewind(mut self) -> Self {
        self.fail_rewind = true;
        self
    }

    pub fn with_read_failure_at(mut self, samples: usize) -> Self {
        self.fail_read_at = Some(samples);
        self
    }

    pub fn with_empty_frames(mut self) -> Self {
        self.empty_frames = true;
        self
    }
}

/// Counters shared between a source and the streams it opened.
#[derive(Debug, Default)]
pub struct SourceCounters {
    pub opens: AtomicUsize,
    pub live_streams: AtomicUsize,
    pub rewinds: AtomicUsize,
}

impl SourceCounters {
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn live_streams(&self) -> usize {
        self.live_streams.load(Ordering::SeqCst)
    }

    pub fn rewinds(&self) -> usize {
        self.rewinds.load(Ordering::SeqCst)
    }
}

pub struct FakeSource {
    plan: StreamPlan,
    pub counters: Arc<SourceCounters>,
}

impl FakeSource {
    pub fn new(plan: StreamPlan) -> Arc<Self> {
        Arc::new(Self {
            plan,
            counters: Arc::new(SourceCounters::default()),
        })
    }
}

impl AudioSource for FakeSource {
    fn open(&self, path: &Path) -> Result<Box<dyn AudioStream>> {
        self.counters.opens.fetch_add(1, Ordering::SeqCst);
        if path == Path::new(MISSING) {
            return Err(PlaybackError::StreamOpenFailed(format!(
                "{}: No such file or directory",
                path.display()
            )));
        }

        self.counters.live_streams.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeStream {
            plan: self.plan.clone(),
            position: 0,
            produced: 0,
            counters: Arc::clone(&self.counters),
        }))
    }
}

struct FakeStream {
    plan: StreamPlan,
    position: usize,
    produced: usize,
    counters: Arc<SourceCounters>,
}

impl AudioStream for FakeStream {
    fn read_frame(&mut self, buf: &mut [f32]) -> Result<FrameRead> {
        if !self.plan.frame_delay.is_zero() {
            std::thread::sleep(self.plan.frame_delay);
        }

        if let Some(limit) = self.plan.fail_read_at {
            if self.produced >= limit {
                return Err(PlaybackError::DecodeFailed("corrupt frame".to_string()));
            }
        }

        if self.plan.empty_frames {
            return Ok(FrameRead::Samples(0));
        }

        let remaining = self.plan.samples - self.position;
        if remaining == 0 {
            return Ok(FrameRead::EndOfStream);
        }

        let n = remaining.min(buf.len());
        buf[..n].fill(0.25);
        self.position += n;
        self.produced += n;
        Ok(FrameRead::Samples(n))
    }

    fn rewind(&mut self) -> Result<()> {
        if self.plan.fail_rewind {
            return Err(PlaybackError::RestartFailed("seek not supported".to_string()));
        }
        self.counters.rewinds.fetch_add(1, Ordering::SeqCst);
        self.position = 0;
        Ok(())
    }
}

impl Drop for FakeStream {
    fn drop(&mut self) {
        self.counters.live_streams.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Poll `condition` until it holds or `timeout` passes.
pub async fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
