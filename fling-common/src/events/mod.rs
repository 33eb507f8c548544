//! Event types for the fling event system
//!
//! Provides the session status types and the EventBus used to fan status
//! snapshots out to asynchronous consumers (SSE clients).

mod status_types;

pub use status_types::{
    Fault, MediaStatus, PlaybackCondition, PlaybackState, SessionStatus, Warning,
};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Session event types
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    /// Status snapshot from the session broadcaster
    ///
    /// Emitted on every broadcast state/condition change, on volume and mute
    /// changes, and periodically while playing.
    StatusChanged {
        /// State, condition, mute and volume at broadcast time
        status: MediaStatus,
        /// Playback position in milliseconds (-1 when unavailable)
        position_ms: i64,
        /// When the snapshot was taken
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A new media source was accepted by the controller surface
    SourceRequested {
        /// Source URI
        source: String,
        /// Whether playback was requested immediately
        auto_play: bool,
        /// When the request was accepted
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The session asks a viewer to attach to the display surface
    ViewerLaunchRequested {
        /// When the request was issued
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The session asks the attached viewer to load a still image
    ImageLoadRequested {
        /// Image URI
        uri: String,
        /// When the request was issued
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl SessionEvent {
    /// Event type name used as the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            SessionEvent::StatusChanged { .. } => "StatusChanged",
            SessionEvent::SourceRequested { .. } => "SourceRequested",
            SessionEvent::ViewerLaunchRequested { .. } => "ViewerLaunchRequested",
            SessionEvent::ImageLoadRequested { .. } => "ImageLoadRequested",
        }
    }
}

/// Event distribution bus
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use fling_common::events::{EventBus, MediaStatus, SessionEvent, SessionStatus};
///
/// let event_bus = EventBus::new(100);
/// let _rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(SessionEvent::StatusChanged {
///     status: MediaStatus::new(SessionStatus::default(), false, 0.5),
///     position_ms: -1,
///     timestamp: chrono::Utc::now(),
/// });
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SessionEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: SessionEvent,
    ) -> Result<usize, broadcast::error::SendError<SessionEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: SessionEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
