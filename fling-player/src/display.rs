//! Display surface capability
//!
//! Video and images need a viewer attached to a display surface. The session
//! asks for one through [`DisplaySurfaceRequester`] and learns about the
//! viewer's progress through `MediaSession::set_surface_attached`,
//! `set_binder_status` and `set_image_complete`.

use crate::error::Result;
use fling_common::events::{EventBus, SessionEvent};
use tracing::info;

/// Requests addressed to whatever hosts the display surface
pub trait DisplaySurfaceRequester: Send + Sync {
    /// Ask for a viewer to be brought up and attached
    fn launch_viewer(&self) -> Result<()>;

    /// Ask the attached viewer to load and show a still image
    fn load_image(&self, uri: &str) -> Result<()>;
}

/// Publishes display requests on the event bus
///
/// Remote viewers subscribe to `/events` and react to
/// `ViewerLaunchRequested` / `ImageLoadRequested`.
pub struct EventBusDisplay {
    events: EventBus,
}

impl EventBusDisplay {
    pub fn new(events: EventBus) -> Self {
        Self { events }
    }
}

impl DisplaySurfaceRequester for EventBusDisplay {
    fn launch_viewer(&self) -> Result<()> {
        info!("Requesting viewer launch");
        self.events.emit_lossy(SessionEvent::ViewerLaunchRequested {
            timestamp: chrono::Utc::now(),
        });
        Ok(())
    }

    fn load_image(&self, uri: &str) -> Result<()> {
        info!("Requesting image load: {}", uri);
        self.events.emit_lossy(SessionEvent::ImageLoadRequested {
            uri: uri.to_string(),
            timestamp: chrono::Utc::now(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_requests_are_published() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        let display = EventBusDisplay::new(bus);

        display.launch_viewer().unwrap();
        display.load_image("http://x/pic.png").unwrap();

        assert!(matches!(
            rx.recv().await.unwrap(),
            SessionEvent::ViewerLaunchRequested { .. }
        ));
        match rx.recv().await.unwrap() {
            SessionEvent::ImageLoadRequested { uri, .. } => assert_eq!(uri, "http://x/pic.png"),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_requests_without_subscribers_succeed() {
        let display = EventBusDisplay::new(EventBus::new(1));
        assert!(display.launch_viewer().is_ok());
    }
}
