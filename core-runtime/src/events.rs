//! # Event Bus System
//!
//! Broadcast channel drivers use to report state changes that happen outside
//! of a caller's request, most importantly a playback session that ends on
//! its own after `write(true)` already returned.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
//!
//! let event_bus = EventBus::new(16);
//! let mut subscriber = event_bus.subscribe();
//!
//! event_bus
//!     .emit(CoreEvent::Playback(PlaybackEvent::Completed {
//!         driver: "mp3".to_string(),
//!         session_id: 1,
//!     }))
//!     .ok();
//!
//! assert!(subscriber.try_recv().is_ok());
//! ```
//!
//! Emitting with no subscribers is not an error worth reporting; drivers
//! ignore the `SendError` in that case.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError, TryRecvError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// Subscribers that fall further behind receive `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

/// Top-level event published on the bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Audio pin playback events
    Playback(PlaybackEvent),
    /// Smart-plug relay events
    Relay(RelayEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Playback(e) => e.description(),
            CoreEvent::Relay(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Playback(PlaybackEvent::Error { .. }) => EventSeverity::Error,
            CoreEvent::Relay(RelayEvent::CommandFailed { .. }) => EventSeverity::Error,
            CoreEvent::Playback(PlaybackEvent::Started { .. }) => EventSeverity::Info,
            CoreEvent::Playback(PlaybackEvent::Completed { .. }) => EventSeverity::Info,
            CoreEvent::Relay(RelayEvent::Switched { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

/// Playback session lifecycle of an audio pin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    /// A session was accepted and its playback thread launched.
    Started { driver: String, session_id: u64 },
    /// A looping session reached end-of-stream and rewound.
    Restarted {
        driver: String,
        session_id: u64,
        restarts: u64,
    },
    /// A session observed a stop request and exited.
    Stopped { driver: String, session_id: u64 },
    /// A non-looping session played its stream to the end.
    Completed { driver: String, session_id: u64 },
    /// A session ended because of an open, decode or restart failure.
    Error {
        driver: String,
        session_id: u64,
        message: String,
    },
}

impl PlaybackEvent {
    fn description(&self) -> &str {
        match self {
            PlaybackEvent::Started { .. } => "Playback started",
            PlaybackEvent::Restarted { .. } => "Playback restarted",
            PlaybackEvent::Stopped { .. } => "Playback stopped",
            PlaybackEvent::Completed { .. } => "Playback completed",
            PlaybackEvent::Error { .. } => "Playback error",
        }
    }

    /// Session the event belongs to.
    pub fn session_id(&self) -> u64 {
        match self {
            PlaybackEvent::Started { session_id, .. }
            | PlaybackEvent::Restarted { session_id, .. }
            | PlaybackEvent::Stopped { session_id, .. }
            | PlaybackEvent::Completed { session_id, .. }
            | PlaybackEvent::Error { session_id, .. } => *session_id,
        }
    }
}

/// Relay switching of a smart plug.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum RelayEvent {
    /// The plug acknowledged a relay command.
    Switched { driver: String, on: bool },
    /// A relay command could not be delivered.
    CommandFailed { driver: String, message: String },
}

impl RelayEvent {
    fn description(&self) -> &str {
        match self {
            RelayEvent::Switched { .. } => "Relay switched",
            RelayEvent::CommandFailed { .. } => "Relay command failed",
        }
    }
}

/// Central event bus for publishing and subscribing to events.
///
/// Cloning the bus clones the sender, so every clone publishes to the same
/// subscribers.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// if there are none.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_multiple_subscribers_receive_event() {
        let bus = EventBus::new(8);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        let event = CoreEvent::Relay(RelayEvent::Switched {
            driver: "tasmota".to_string(),
            on: true,
        });
        assert_eq!(bus.emit(event.clone()).unwrap(), 2);

        assert_eq!(first.recv().await.unwrap(), event);
        assert_eq!(second.recv().await.unwrap(), event);
    }

    #[test]
    fn test_emit_without_subscribers_fails() {
        let bus = EventBus::default();
        let event = CoreEvent::Playback(PlaybackEvent::Started {
            driver: "mp3".to_string(),
            session_id: 1,
        });
        assert!(bus.emit(event).is_err());
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_severity_and_description() {
        let error = CoreEvent::Playback(PlaybackEvent::Error {
            driver: "mp3".to_string(),
            session_id: 3,
            message: "decoder failed".to_string(),
        });
        assert_eq!(error.severity(), EventSeverity::Error);
        assert_eq!(error.description(), "Playback error");

        let restarted = CoreEvent::Playback(PlaybackEvent::Restarted {
            driver: "mp3".to_string(),
            session_id: 3,
            restarts: 2,
        });
        assert_eq!(restarted.severity(), EventSeverity::Debug);
    }

    #[test]
    fn test_event_serialization_shape() {
        let event = CoreEvent::Playback(PlaybackEvent::Completed {
            driver: "mp3".to_string(),
            session_id: 7,
        });
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "Playback");
        assert_eq!(json["payload"]["event"], "Completed");
        assert_eq!(json["payload"]["session_id"], 7);
    }

    #[test]
    fn test_playback_event_session_id() {
        let event = PlaybackEvent::Stopped {
            driver: "mp3".to_string(),
            session_id: 42,
        };
        assert_eq!(event.session_id(), 42);
    }
}
