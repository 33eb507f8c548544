//! Test helpers for fling-player integration tests
//!
//! Provides controllable doubles for every session capability:
//! - ScriptedDecoder: records calls, prepares/seeks automatically or on demand
//! - RecordingDisplay / StaticProbe: viewer and content-type doubles
//! - RecordingListener: captures every status broadcast
//! - TestRig: a session wired to all of the above

#![allow(dead_code)]

pub mod doubles;

pub use doubles::{RecordingDisplay, RecordingListener, ScriptedDecoder, StaticProbe};

use fling_player::session::SessionOptions;
use fling_player::volume::SoftwareVolume;
use fling_player::{Capabilities, MediaSession};
use fling_common::events::PlaybackState;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const WAIT: Duration = Duration::from_secs(3);
pub const VOLUME_STEPS: u32 = 15;

pub const VIDEO_URI: &str = "http://media.example/clip.mp4";
pub const IMAGE_URI: &str = "http://media.example/poster.png";
pub const METADATA: &str = r#"{"title":"Clip","description":"A short clip"}"#;

/// Poll `condition` until it holds or `timeout` elapses
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
}

/// Options used unless a test needs something else: no periodic updates and a
/// bounded readiness wait so a broken test fails instead of hanging
pub fn quiet_options() -> SessionOptions {
    SessionOptions {
        position_update_interval: Duration::ZERO,
        readiness_timeout: Some(Duration::from_secs(5)),
    }
}

pub struct TestRig {
    pub session: MediaSession,
    pub decoder: Arc<ScriptedDecoder>,
    pub display: Arc<RecordingDisplay>,
    pub probe: Arc<StaticProbe>,
    pub volume: Arc<SoftwareVolume>,
    pub listener: Arc<RecordingListener>,
}

impl TestRig {
    /// Session around a decoder that prepares and seeks on its own
    pub fn new() -> Self {
        Self::with(ScriptedDecoder::automatic(), quiet_options())
    }

    /// Session around a decoder whose callbacks the test fires by hand
    pub fn manual() -> Self {
        Self::with(ScriptedDecoder::manual(), quiet_options())
    }

    pub fn with(decoder: ScriptedDecoder, options: SessionOptions) -> Self {
        let decoder = Arc::new(decoder);
        let display = Arc::new(RecordingDisplay::default());
        let probe = Arc::new(StaticProbe::new(Some("image/png")));
        let volume = Arc::new(SoftwareVolume::new(VOLUME_STEPS));
        let listener = Arc::new(RecordingListener::default());

        let session = MediaSession::new(
            Capabilities {
                decoder: decoder.clone(),
                display: display.clone(),
                probe: probe.clone(),
                volume: volume.clone(),
            },
            options,
        )
        .expect("session");
        session.add_status_listener(listener.clone());

        Self {
            session,
            decoder,
            display,
            probe,
            volume,
            listener,
        }
    }

    pub fn wait_for_state(&self, state: PlaybackState) -> bool {
        wait_until(WAIT, || self.session.state() == state)
    }

    /// Wait until a broadcast carrying `state` has been delivered
    pub fn wait_for_broadcast(&self, state: PlaybackState) -> bool {
        wait_until(WAIT, || self.listener.count_state(state) > 0)
    }

    /// Load the default video and wait until its Playing broadcast arrived
    pub fn start_playing(&self) {
        self.session
            .set_media_source(VIDEO_URI, METADATA, true, false)
            .expect("set_media_source");
        assert!(
            self.wait_for_broadcast(PlaybackState::Playing),
            "never reached Playing"
        );
    }
}
