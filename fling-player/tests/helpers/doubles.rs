//! Capability doubles

use fling_common::events::{MediaStatus, PlaybackState};
use fling_player::decoder::{Decoder, DecoderError, DecoderEvents};
use fling_player::display::DisplaySurfaceRequester;
use fling_player::probe::ContentProbe;
use fling_player::session::StatusListener;
use fling_player::{Error, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

const CALLBACK_DELAY: Duration = Duration::from_millis(10);

/// Decoder double
///
/// In automatic mode `prepare_async` and `seek_to` report completion from a
/// helper thread shortly after the call. In manual mode the test fires the
/// callbacks itself. Events are always raised without the double's own locks
/// held, since the session calls back into the decoder from its handlers.
pub struct ScriptedDecoder {
    automatic: bool,
    events: Mutex<Option<DecoderEvents>>,
    calls: Mutex<Vec<String>>,
    position_ms: Mutex<i64>,
    duration_ms: Mutex<i64>,
    fail_set_source: Mutex<Option<DecoderError>>,
    fail_seek: Mutex<bool>,
    mime_queries: AtomicUsize,
}

impl ScriptedDecoder {
    fn build(automatic: bool) -> Self {
        Self {
            automatic,
            events: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
            position_ms: Mutex::new(0),
            duration_ms: Mutex::new(120_000),
            fail_set_source: Mutex::new(None),
            fail_seek: Mutex::new(false),
            mime_queries: AtomicUsize::new(0),
        }
    }

    pub fn automatic() -> Self {
        Self::build(true)
    }

    pub fn manual() -> Self {
        Self::build(false)
    }

    pub fn events(&self) -> DecoderEvents {
        self.events.lock().clone().expect("decoder not attached")
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.as_str() == name || call.starts_with(&format!("{}:", name)))
            .count()
    }

    pub fn set_position(&self, position_ms: i64) {
        *self.position_ms.lock() = position_ms;
    }

    pub fn set_duration(&self, duration_ms: i64) {
        *self.duration_ms.lock() = duration_ms;
    }

    pub fn fail_next_set_source(&self, error: DecoderError) {
        *self.fail_set_source.lock() = Some(error);
    }

    pub fn fail_seeks(&self) {
        *self.fail_seek.lock() = true;
    }

    pub fn mime_queries(&self) -> usize {
        self.mime_queries.load(Ordering::SeqCst)
    }

    pub fn fire_prepared(&self, ok: bool) {
        self.events().prepared(ok);
    }

    pub fn fire_seek_complete(&self) {
        self.events().seek_complete();
    }

    pub fn fire_completion(&self) {
        self.events().completion();
    }

    pub fn fire_error(&self, code: i32) {
        self.events().error(code);
    }

    pub fn fire_info(&self, code: i32) {
        self.events().info(code);
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().push(call.into());
    }

    fn later(&self, notify: impl FnOnce(DecoderEvents) + Send + 'static) {
        let events = self.events();
        thread::spawn(move || {
            thread::sleep(CALLBACK_DELAY);
            notify(events);
        });
    }
}

impl Decoder for ScriptedDecoder {
    fn attach(&self, events: DecoderEvents) {
        *self.events.lock() = Some(events);
    }

    fn reset(&self) {
        self.record("reset");
        *self.position_ms.lock() = 0;
    }

    fn set_data_source(&self, uri: &str) -> std::result::Result<(), DecoderError> {
        self.record(format!("set_data_source:{}", uri));
        match self.fail_set_source.lock().take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn prepare_async(&self) -> std::result::Result<(), DecoderError> {
        self.record("prepare_async");
        if self.automatic {
            self.later(|events| events.prepared(true));
        }
        Ok(())
    }

    fn start(&self) -> std::result::Result<(), DecoderError> {
        self.record("start");
        Ok(())
    }

    fn pause(&self) -> std::result::Result<(), DecoderError> {
        self.record("pause");
        Ok(())
    }

    fn stop(&self) -> std::result::Result<(), DecoderError> {
        self.record("stop");
        Ok(())
    }

    fn seek_to(&self, position_ms: i64) -> std::result::Result<(), DecoderError> {
        self.record(format!("seek_to:{}", position_ms));
        if *self.fail_seek.lock() {
            return Err(DecoderError::InvalidState("seek refused".to_string()));
        }
        *self.position_ms.lock() = position_ms;
        if self.automatic {
            self.later(|events| events.seek_complete());
        }
        Ok(())
    }

    fn current_position(&self) -> std::result::Result<i64, DecoderError> {
        Ok(*self.position_ms.lock())
    }

    fn duration(&self) -> std::result::Result<i64, DecoderError> {
        Ok(*self.duration_ms.lock())
    }

    fn release(&self) {
        self.record("release");
    }

    fn supported_mime_types(&self) -> Vec<String> {
        self.mime_queries.fetch_add(1, Ordering::SeqCst);
        vec!["video/mp4".to_string(), "audio/mpeg".to_string()]
    }
}

/// Display double counting viewer launches and image loads
#[derive(Default)]
pub struct RecordingDisplay {
    launches: AtomicUsize,
    images: Mutex<Vec<String>>,
}

impl RecordingDisplay {
    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn images(&self) -> Vec<String> {
        self.images.lock().clone()
    }
}

impl DisplaySurfaceRequester for RecordingDisplay {
    fn launch_viewer(&self) -> Result<()> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn load_image(&self, uri: &str) -> Result<()> {
        self.images.lock().push(uri.to_string());
        Ok(())
    }
}

/// Probe double answering with a fixed content type
pub struct StaticProbe {
    content_type: Mutex<Option<String>>,
    fail: Mutex<bool>,
}

impl StaticProbe {
    pub fn new(content_type: Option<&str>) -> Self {
        Self {
            content_type: Mutex::new(content_type.map(str::to_string)),
            fail: Mutex::new(false),
        }
    }

    pub fn answer(&self, content_type: Option<&str>) {
        *self.content_type.lock() = content_type.map(str::to_string);
    }

    pub fn fail(&self) {
        *self.fail.lock() = true;
    }
}

impl ContentProbe for StaticProbe {
    fn content_type(&self, uri: &str) -> Result<Option<String>> {
        if *self.fail.lock() {
            return Err(Error::Probe(format!("{} unreachable", uri)));
        }
        Ok(self.content_type.lock().clone())
    }
}

/// Listener capturing every broadcast
#[derive(Default)]
pub struct RecordingListener {
    received: Mutex<Vec<(MediaStatus, i64)>>,
}

impl RecordingListener {
    pub fn received(&self) -> Vec<(MediaStatus, i64)> {
        self.received.lock().clone()
    }

    pub fn states(&self) -> Vec<PlaybackState> {
        self.received.lock().iter().map(|(status, _)| status.state).collect()
    }

    pub fn count(&self) -> usize {
        self.received.lock().len()
    }

    pub fn count_state(&self, state: PlaybackState) -> usize {
        self.received
            .lock()
            .iter()
            .filter(|(status, _)| status.state == state)
            .count()
    }

    pub fn last(&self) -> Option<(MediaStatus, i64)> {
        self.received.lock().last().copied()
    }

    pub fn clear(&self) {
        self.received.lock().clear();
    }
}

impl StatusListener for RecordingListener {
    fn on_status_change(&self, status: &MediaStatus, position_ms: i64) -> anyhow::Result<()> {
        self.received.lock().push((*status, position_ms));
        Ok(())
    }
}
