//! # Audio Output Context
//!
//! Holds the sink every audio pin in a process plays through. The sink is
//! installed once, usually at startup, and is only borrowed by playback
//! sessions.
//!
//! ```ignore
//! use driver_audio::{AudioOutput, NullSink};
//! use std::sync::Arc;
//!
//! AudioOutput::global().initialize(Arc::new(NullSink::new()))?;
//! assert!(AudioOutput::global().is_ready());
//! ```
//!
//! Tests and embedders that want isolation create their own context with
//! [`AudioOutput::new`] and hand it to the controller instead.

use crate::error::{PlaybackError, Result};
use crate::traits::AudioSink;
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::info;

static GLOBAL_OUTPUT: OnceLock<Arc<AudioOutput>> = OnceLock::new();

/// Lazily initialized output context.
pub struct AudioOutput {
    sink: RwLock<Option<Arc<dyn AudioSink>>>,
}

impl AudioOutput {
    /// Creates an output context with no sink.
    pub fn new() -> Self {
        Self {
            sink: RwLock::new(None),
        }
    }

    /// The process-wide output context.
    pub fn global() -> Arc<AudioOutput> {
        GLOBAL_OUTPUT
            .get_or_init(|| Arc::new(AudioOutput::new()))
            .clone()
    }

    /// Install the sink.
    ///
    /// # Errors
    ///
    /// Returns `SinkAlreadyInitialized` if a sink is already installed.
    pub fn initialize(&self, sink: Arc<dyn AudioSink>) -> Result<()> {
        let mut slot = self.sink.write();
        if slot.is_some() {
            return Err(PlaybackError::SinkAlreadyInitialized);
        }
        info!(sink = %sink.describe(), "Audio output initialized");
        *slot = Some(sink);
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.sink.read().is_some()
    }

    /// The installed sink.
    ///
    /// # Errors
    ///
    /// Returns `SinkNotInitialized` before [`initialize`](Self::initialize).
    pub fn sink(&self) -> Result<Arc<dyn AudioSink>> {
        self.sink
            .read()
            .clone()
            .ok_or(PlaybackError::SinkNotInitialized)
    }
}

impl Default for AudioOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AudioOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioOutput")
            .field("ready", &self.is_ready())
            .finish()
    }
}

/// Sink that discards every frame.
///
/// Used on headless hosts and in tests; it still counts what it was given.
#[derive(Debug, Default)]
pub struct NullSink {
    samples: AtomicU64,
    frames: AtomicU64,
}

impl NullSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn samples_written(&self) -> u64 {
        self.samples.load(Ordering::Relaxed)
    }

    pub fn frames_written(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }
}

impl AudioSink for NullSink {
    fn write_frame(&self, samples: &[f32]) -> Result<()> {
        self.samples.fetch_add(samples.len() as u64, Ordering::Relaxed);
        self.frames.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn describe(&self) -> String {
        "null sink".to_string()
    }
}
