//! Server-Sent Events (SSE) stream
//!
//! Status broadcasts are forwarded from the session onto the event bus by
//! [`EventBusForwarder`] and streamed to connected clients.

use crate::api::server::AppContext;
use crate::session::StatusListener;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use fling_common::events::{EventBus, MediaStatus, SessionEvent};
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};

/// Status listener publishing every broadcast on the event bus
pub struct EventBusForwarder {
    events: EventBus,
}

impl EventBusForwarder {
    pub fn new(events: EventBus) -> Self {
        Self { events }
    }
}

impl StatusListener for EventBusForwarder {
    fn on_status_change(&self, status: &MediaStatus, position_ms: i64) -> anyhow::Result<()> {
        // No subscribers is not a failure
        self.events.emit_lossy(SessionEvent::StatusChanged {
            status: *status,
            position_ms,
            timestamp: chrono::Utc::now(),
        });
        Ok(())
    }
}

/// GET /events - SSE event stream
pub async fn event_stream(
    State(ctx): State<AppContext>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!("New SSE client connected");

    let rx = ctx.events.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| async move {
        match result {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(json) => Some(Ok(Event::default().event(event.event_type()).data(json))),
                Err(e) => {
                    warn!("Failed to serialize event: {}", e);
                    None
                }
            },
            Err(e) => {
                // Lagged receiver; the next snapshot supersedes what was missed
                warn!("SSE stream error: {:?}", e);
                None
            }
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use fling_common::events::{PlaybackState, SessionStatus};

    #[tokio::test]
    async fn test_forwarder_publishes_status() {
        let bus = EventBus::new(4);
        let mut rx = bus.subscribe();
        let forwarder = EventBusForwarder::new(bus);

        let status = MediaStatus::new(SessionStatus::Ok(PlaybackState::Paused), true, 0.25);
        forwarder.on_status_change(&status, 4200).unwrap();

        match rx.recv().await.unwrap() {
            SessionEvent::StatusChanged {
                status,
                position_ms,
                ..
            } => {
                assert_eq!(status.state, PlaybackState::Paused);
                assert!(status.mute);
                assert_eq!(position_ms, 4200);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }
}
