//! # Playback Error Types
//!
//! Errors reported by the audio pin driver. Only the control-surface errors
//! (`SinkNotInitialized`, `AlreadyRunning`, `StopTimedOut`, ...) ever reach a
//! caller; errors raised inside a playback loop end that session and are
//! reported through logs and the event bus.

use hal_traits::HalError;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Control Errors
    // ========================================================================
    /// The process-wide audio output has no sink installed yet.
    #[error("audio output not initialized")]
    SinkNotInitialized,

    /// `AudioOutput::initialize` was called twice.
    #[error("audio output already initialized")]
    SinkAlreadyInitialized,

    /// A session is still registered for this controller.
    #[error("previous invoke is still running")]
    AlreadyRunning,

    /// The playback loop did not acknowledge cancellation in time.
    #[error("playback loop did not stop within {0:?}")]
    StopTimedOut(Duration),

    // ========================================================================
    // Stream Errors
    // ========================================================================
    /// The file could not be opened or its decoder could not be built.
    #[error("failed to open audio stream: {0}")]
    StreamOpenFailed(String),

    /// Reading a frame failed for a reason other than end-of-stream.
    #[error("audio decoder read failed: {0}")]
    DecodeFailed(String),

    /// Rewinding a looping stream failed.
    #[error("failed to restart audio stream: {0}")]
    RestartFailed(String),

    // ========================================================================
    // Output Errors
    // ========================================================================
    /// The sink refused a frame.
    #[error("audio sink write failed: {0}")]
    SinkWriteFailed(String),

    /// The output device could not be opened or failed.
    #[error("audio device error: {0}")]
    AudioDeviceError(String),

    // ========================================================================
    // Generic Errors
    // ========================================================================
    #[error("invalid audio pin configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl PlaybackError {
    /// Returns `true` for errors raised by a running session rather than by
    /// the control surface.
    pub fn is_session_error(&self) -> bool {
        matches!(
            self,
            PlaybackError::StreamOpenFailed(_)
                | PlaybackError::DecodeFailed(_)
                | PlaybackError::RestartFailed(_)
        )
    }
}

impl From<PlaybackError> for HalError {
    fn from(error: PlaybackError) -> Self {
        match error {
            PlaybackError::InvalidConfig(message) => HalError::InvalidParameters(message),
            PlaybackError::Io(e) => HalError::Io(e),
            other => HalError::OperationFailed(other.to_string()),
        }
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
