//! # Audio Source and Sink Contracts
//!
//! The playback controller never touches a codec or a sound card directly.
//! It talks to three small traits:
//!
//! - [`AudioSource`] opens a named stream
//! - [`AudioStream`] yields fixed-size frames and can rewind to the start
//! - [`AudioSink`] accepts frames for playback
//!
//! ## Threading Model
//!
//! A stream is opened on, and owned by, the session's playback thread, so it
//! only needs to be `Send`. Sources and sinks are shared between driver
//! instances and must be `Send + Sync`.
//!
//! ```text
//! AudioSource::open ──► AudioStream::read_frame ──► AudioSink::write_frame
//!                             │ EndOfStream
//!                             └──► AudioStream::rewind (looping only)
//! ```

use crate::error::Result;
use std::fmt;
use std::path::Path;

/// Number of interleaved f32 samples in one frame.
pub const FRAME_SAMPLES: usize = 256;

/// Result of reading one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameRead {
    /// `n` samples were written to the front of the buffer. `n` may be
    /// smaller than the buffer near the end of the stream.
    Samples(usize),
    /// No more samples until the stream is rewound.
    EndOfStream,
}

impl FrameRead {
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, FrameRead::EndOfStream)
    }
}

/// Opens audio streams by path.
pub trait AudioSource: Send + Sync {
    /// Open `path` and build its decoder.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::StreamOpenFailed`](crate::PlaybackError::StreamOpenFailed)
    /// when the file is missing or cannot be decoded.
    fn open(&self, path: &Path) -> Result<Box<dyn AudioStream>>;
}

/// A decoded stream of interleaved f32 samples.
pub trait AudioStream: Send {
    /// Fill `buf` with the next samples.
    ///
    /// `Samples(0)` means nothing was ready yet. The playback loop retries,
    /// but ends the session after a long run of empty frames.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::DecodeFailed`](crate::PlaybackError::DecodeFailed)
    /// for any failure other than reaching the end of the stream.
    fn read_frame(&mut self, buf: &mut [f32]) -> Result<FrameRead>;

    /// Seek to the first sample and reset the decoder.
    fn rewind(&mut self) -> Result<()>;
}

/// Output device accepting decoded frames.
///
/// One sink is shared by every audio pin in the process, so writes from
/// different sessions may interleave.
pub trait AudioSink: Send + Sync {
    /// Queue `samples` for playback. A failure is not fatal to the caller.
    fn write_frame(&self, samples: &[f32]) -> Result<()>;

    /// Short description for logs.
    fn describe(&self) -> String {
        "audio sink".to_string()
    }
}

impl fmt::Debug for dyn AudioSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}
