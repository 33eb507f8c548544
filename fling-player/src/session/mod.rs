//! Media session
//!
//! [`MediaSession`] accepts playback requests from any thread, validates them
//! against the current state, and hands them to a single command worker that
//! drives the decoder one command at a time. Decoder readiness arrives
//! out-of-band through [`DecoderEvents`]; the worker blocks on readiness gates
//! until the matching callback opens them.
//!
//! # Locking
//!
//! All mutable session state lives in one [`SessionCore`] behind a single
//! mutex. The lock is never held while calling the decoder, the display, the
//! volume control or a listener.

mod broadcaster;
mod callbacks;
mod command;
mod executor;
mod gate;
mod queue;
mod state;
mod ticker;

pub use broadcaster::{ListenerId, StatusListener};
pub use callbacks::DecoderEvents;
pub use command::{Command, SeekMode};

use crate::decoder::Decoder;
use crate::display::DisplaySurfaceRequester;
use crate::error::{Error, Result};
use crate::probe::ContentProbe;
use crate::volume::{fraction_to_level, level_to_fraction, VolumeControl};
use broadcaster::ListenerRegistry;
use fling_common::events::{MediaStatus, PlaybackCondition, PlaybackState, SessionStatus};
use fling_common::human_time::format_clock;
use fling_common::media::{MediaInfo, MediaKind, MediaMetadata};
use gate::ReadinessGate;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use queue::CommandQueue;
use serde::Serialize;
use state::{SessionCore, Transition, Transport};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use ticker::PositionTicker;
use tracing::{debug, error, info, warn};

/// Default period between status broadcasts while playing
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_millis(3000);

/// External capabilities the session drives
#[derive(Clone)]
pub struct Capabilities {
    pub decoder: Arc<dyn Decoder>,
    pub display: Arc<dyn DisplaySurfaceRequester>,
    pub probe: Arc<dyn ContentProbe>,
    pub volume: Arc<dyn VolumeControl>,
}

/// Session tuning
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    /// Period between status broadcasts while playing, zero disables them
    pub position_update_interval: Duration,
    /// Upper bound on any readiness wait; `None` waits indefinitely
    pub readiness_timeout: Option<Duration>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            position_update_interval: DEFAULT_UPDATE_INTERVAL,
            readiness_timeout: None,
        }
    }
}

/// Track-level descriptors from the controller's metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TrackInfo {
    pub title: Option<String>,
    pub description: Option<String>,
    pub media_type: Option<String>,
    pub rest_period_after: Option<i64>,
}

/// State shared by the public handle, the worker, the ticker and callbacks
pub(crate) struct SessionShared {
    core: Mutex<SessionCore>,
    decoder: Arc<dyn Decoder>,
    display: Arc<dyn DisplaySurfaceRequester>,
    probe: Arc<dyn ContentProbe>,
    volume: Arc<dyn VolumeControl>,
    listeners: ListenerRegistry,
    prepared: ReadinessGate,
    seek_done: ReadinessGate,
    binder_ready: ReadinessGate,
    queue: Mutex<Option<CommandQueue>>,
    ticker: PositionTicker,
    mime_types: OnceCell<Vec<String>>,
    readiness_timeout: Option<Duration>,
    torn_down: AtomicBool,
    weak_self: Weak<SessionShared>,
}

impl SessionShared {
    pub(crate) fn state(&self) -> PlaybackState {
        self.core.lock().state()
    }

    pub(crate) fn status(&self) -> SessionStatus {
        self.core.lock().status
    }

    /// Apply a state change and run its side effects
    pub(crate) fn set_state(&self, state: PlaybackState, broadcast: bool) {
        let transition = self.core.lock().set_state(state);
        if let Some(transition) = transition {
            self.after_transition(transition, broadcast);
        }
    }

    pub(crate) fn set_condition(&self, condition: PlaybackCondition, broadcast: bool) {
        let transition = self.core.lock().set_condition(condition);
        if let Some(transition) = transition {
            self.after_transition(transition, broadcast);
        }
    }

    fn after_transition(&self, transition: Transition, broadcast: bool) {
        debug!("Status {} -> {}", transition.from, transition.to);
        if transition.left_playing() {
            self.ticker.disarm();
        }
        if broadcast {
            if transition.to.state() == PlaybackState::Playing {
                self.update_status();
            } else {
                self.send_status();
            }
        }
    }

    /// Broadcast while playing and schedule the next refresh
    pub(crate) fn update_status(&self) {
        let (playing, interval) = {
            let core = self.core.lock();
            (core.state() == PlaybackState::Playing, core.update_interval)
        };
        if !playing {
            return;
        }
        self.send_status();
        self.ticker.schedule(interval);
    }

    /// Broadcast the current snapshot to every listener
    pub(crate) fn send_status(&self) {
        if self.listeners.is_empty() {
            return;
        }
        let status = self.snapshot();
        let position_ms = if status.state == PlaybackState::Error {
            -1
        } else {
            self.position().unwrap_or(-1)
        };
        debug!(
            "Broadcasting {}/{} at {}",
            status.state,
            status.condition,
            format_clock(position_ms)
        );
        self.listeners.deliver(&status, position_ms);
    }

    pub(crate) fn snapshot(&self) -> MediaStatus {
        let (status, mute) = {
            let core = self.core.lock();
            (core.status, core.mute)
        };
        MediaStatus::new(status, mute, self.volume_fraction())
    }

    fn volume_fraction(&self) -> f64 {
        match self.volume.level() {
            Ok(level) => level_to_fraction(level, self.volume.max_level()),
            Err(e) => {
                error!("Cannot get volume: {}", e);
                0.0
            }
        }
    }

    pub(crate) fn position(&self) -> Result<i64> {
        let (allowed, image) = {
            let core = self.core.lock();
            (core.can_report_position(), core.image)
        };
        if !allowed {
            return Err(Error::InvalidState("No media stream set".to_string()));
        }
        if image {
            return Ok(0);
        }
        Ok(self.decoder.current_position()?)
    }

    pub(crate) fn enqueue(&self, command: Command) -> Result<()> {
        let queue = self.queue.lock();
        match queue.as_ref() {
            Some(queue) if queue.enqueue(command) => Ok(()),
            _ => Err(Error::InvalidState(
                "Command worker is not running".to_string(),
            )),
        }
    }

    /// Create the command worker on first use
    fn ensure_queue(&self) -> Result<()> {
        let mut queue = self.queue.lock();
        if queue.is_none() {
            let session = self.weak_self.clone();
            *queue = Some(CommandQueue::start(move |command| {
                let Some(session) = session.upgrade() else {
                    return;
                };
                let name = command.name();
                if let Err(e) = session.execute(command) {
                    error!("{} failed: {}", name, e);
                }
            })?);
        }
        Ok(())
    }

    /// Ticker callback, runs on the timer thread
    fn on_tick(&self) {
        if self.state() == PlaybackState::Playing {
            if let Err(e) = self.enqueue(Command::Update) {
                debug!("Position update skipped: {}", e);
            }
        }
    }
}

/// Stateful playback session
///
/// Cheap to share behind an `Arc`; every method takes `&self`.
pub struct MediaSession {
    shared: Arc<SessionShared>,
}

impl MediaSession {
    /// Build a session around its capabilities
    ///
    /// The decoder is attached to the session's [`DecoderEvents`] and the
    /// position ticker thread is started. The command worker is created lazily
    /// on the first `set_media_source`.
    pub fn new(capabilities: Capabilities, options: SessionOptions) -> Result<Self> {
        let shared = Arc::new_cyclic(|weak: &Weak<SessionShared>| SessionShared {
            core: Mutex::new(SessionCore::new(options.position_update_interval)),
            decoder: capabilities.decoder,
            display: capabilities.display,
            probe: capabilities.probe,
            volume: capabilities.volume,
            listeners: ListenerRegistry::default(),
            prepared: ReadinessGate::new(),
            seek_done: ReadinessGate::new(),
            binder_ready: ReadinessGate::new(),
            queue: Mutex::new(None),
            ticker: PositionTicker::new(),
            mime_types: OnceCell::new(),
            readiness_timeout: options.readiness_timeout,
            torn_down: AtomicBool::new(false),
            weak_self: weak.clone(),
        });

        let weak = Arc::downgrade(&shared);
        shared.ticker.start(move || {
            if let Some(session) = weak.upgrade() {
                session.on_tick();
            }
        })?;

        shared
            .decoder
            .attach(DecoderEvents::new(Arc::downgrade(&shared)));

        info!(
            "Media session created (update interval {:?}, readiness timeout {:?})",
            options.position_update_interval, options.readiness_timeout
        );
        Ok(Self { shared })
    }

    /// Load a new source, optionally starting playback
    ///
    /// The URI and metadata are validated here; loading happens on the worker.
    pub fn set_media_source(
        &self,
        uri: &str,
        metadata_json: &str,
        auto_play: bool,
        play_in_background: bool,
    ) -> Result<()> {
        info!("set_media_source: {}", uri);
        self.ensure_live()?;

        if uri.trim().is_empty() {
            return Err(Error::InvalidArgument("Missing media location".to_string()));
        }
        reqwest::Url::parse(uri)
            .map_err(|e| Error::InvalidArgument(format!("Cannot parse URI '{}': {}", uri, e)))?;
        let metadata = MediaMetadata::parse(metadata_json)
            .map_err(|e| Error::InvalidArgument(format!("Cannot parse metadata: {}", e)))?;
        let kind = MediaKind::resolve(metadata.media_type.as_deref(), uri)
            .map_err(|e| Error::InvalidArgument(e.to_string()))?;

        self.shared.ensure_queue()?;

        {
            let mut core = self.shared.core.lock();
            core.pending = Some(MediaInfo::pending(uri, metadata_json));
            core.metadata = Some(metadata);
            core.image = kind.is_image();
            core.source_set = true;
        }
        debug!("Resolved {} as {:?}", uri, kind);

        let uri = uri.to_string();
        if kind.is_image() {
            self.shared.enqueue(Command::SetImage {
                uri: uri.clone(),
                play_in_background,
            })?;
            if auto_play {
                self.shared.enqueue(Command::PlayImage { uri })?;
            }
        } else {
            self.shared.enqueue(Command::SetSource {
                uri,
                play_in_background,
            })?;
            if auto_play {
                self.shared.enqueue(Command::Play)?;
            }
        }
        Ok(())
    }

    pub fn play(&self) -> Result<()> {
        debug!("play called");
        if self.validate(Transport::Play)? {
            return Ok(());
        }
        self.shared.enqueue(Command::Play)
    }

    pub fn pause(&self) -> Result<()> {
        debug!("pause called");
        if self.validate(Transport::Pause)? {
            return Ok(());
        }
        self.shared.enqueue(Command::Pause)
    }

    pub fn stop(&self) -> Result<()> {
        debug!("stop called");
        self.shared.core.lock().validate(Transport::Stop)?;
        self.shared.enqueue(Command::Stop)
    }

    pub fn seek(&self, mode: SeekMode, offset_ms: i64) -> Result<()> {
        debug!("seek called: {:?} {}", mode, format_clock(offset_ms));
        if self.validate(Transport::Seek)? {
            return Ok(());
        }
        self.shared.enqueue(Command::Seek { mode, offset_ms })
    }

    /// Validate a transport request; `Ok(true)` means accepted as a no-op
    /// because the session is showing an image
    fn validate(&self, request: Transport) -> Result<bool> {
        let core = self.shared.core.lock();
        core.validate(request)?;
        Ok(core.image)
    }

    /// Change the periodic broadcast interval; zero disables it
    pub fn set_position_update_interval(&self, interval_ms: i64) -> Result<()> {
        if interval_ms < 0 {
            return Err(Error::InvalidArgument(format!(
                "Update interval must not be negative, got {}",
                interval_ms
            )));
        }
        let interval = Duration::from_millis(interval_ms as u64);
        let playing = {
            let mut core = self.shared.core.lock();
            core.update_interval = interval;
            core.state() == PlaybackState::Playing
        };
        info!("Position update interval set to {:?}", interval);

        if interval.is_zero() {
            self.shared.ticker.disarm();
        } else if playing {
            self.shared.ticker.schedule(interval);
        }
        Ok(())
    }

    pub fn add_status_listener(&self, listener: Arc<dyn StatusListener>) -> ListenerId {
        let id = self.shared.listeners.add(listener);
        debug!("Status listener {} added", id);
        id
    }

    pub fn remove_status_listener(&self, id: ListenerId) -> bool {
        let removed = self.shared.listeners.remove(id);
        debug!("Status listener {} removed: {}", id, removed);
        removed
    }

    pub fn get_status(&self) -> MediaStatus {
        self.shared.snapshot()
    }

    /// Info for the loaded source; empty unless media is loaded
    pub fn get_media_info(&self) -> MediaInfo {
        self.shared.core.lock().current.clone().unwrap_or_default()
    }

    pub fn get_position(&self) -> Result<i64> {
        self.shared.position()
    }

    /// Duration of the loaded source, 0 when unknown
    pub fn get_duration(&self) -> i64 {
        let (allowed, image) = {
            let core = self.shared.core.lock();
            (core.can_report_duration(), core.image)
        };
        if !allowed {
            debug!("Duration requested without a prepared stream");
            return 0;
        }
        if image {
            return 0;
        }
        match self.shared.decoder.duration() {
            Ok(duration) => duration,
            Err(e) => {
                warn!("Cannot get duration: {}", e);
                0
            }
        }
    }

    /// Whether the decoder handles `mime_type`; the decoder is asked once
    pub fn is_mime_type_supported(&self, mime_type: &str) -> bool {
        self.shared
            .mime_types
            .get_or_init(|| {
                let types = self.shared.decoder.supported_mime_types();
                debug!("Decoder supports {} MIME types", types.len());
                types
            })
            .iter()
            .any(|supported| supported.eq_ignore_ascii_case(mime_type.trim()))
    }

    pub fn get_volume(&self) -> Result<f64> {
        let level = self.shared.volume.level()?;
        Ok(level_to_fraction(level, self.shared.volume.max_level()))
    }

    /// Set the output volume as a fraction in `[0.0, 1.0]`
    pub fn set_volume(&self, volume: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&volume) {
            return Err(Error::InvalidArgument(format!(
                "Volume must be within [0, 1], got {}",
                volume
            )));
        }
        let level = fraction_to_level(volume, self.shared.volume.max_level());
        self.shared.volume.set_level(level)?;
        debug!("Volume set to step {}", level);
        self.shared.send_status();
        Ok(())
    }

    pub fn is_mute(&self) -> bool {
        self.shared.core.lock().mute
    }

    pub fn set_mute(&self, mute: bool) -> Result<()> {
        self.shared.volume.set_muted(mute)?;
        self.shared.core.lock().mute = mute;
        self.shared.send_status();
        Ok(())
    }

    pub fn state(&self) -> PlaybackState {
        self.shared.state()
    }

    pub fn condition(&self) -> PlaybackCondition {
        self.shared.status().condition()
    }

    pub fn status(&self) -> SessionStatus {
        self.shared.status()
    }

    /// Force a state change
    ///
    /// Entering `Playing` with `broadcast` also starts periodic updates.
    pub fn set_state(&self, state: PlaybackState, broadcast: bool) {
        self.shared.set_state(state, broadcast);
    }

    /// Force a condition change; error conditions move the state to `Error`
    pub fn set_condition(&self, condition: PlaybackCondition, broadcast: bool) {
        self.shared.set_condition(condition, broadcast);
    }

    pub fn send_status(&self) {
        self.shared.send_status();
    }

    /// Title and related descriptors of the current track
    pub fn track_info(&self) -> TrackInfo {
        let core = self.shared.core.lock();
        match core.metadata.as_ref() {
            Some(meta) => TrackInfo {
                title: Some(meta.title.clone()),
                description: meta.description.clone(),
                media_type: meta.media_type.clone(),
                rest_period_after: meta.rest_period_after,
            },
            None => TrackInfo::default(),
        }
    }

    /// Record whether a display surface is bound; new sources skip the viewer
    /// launch while one is
    pub fn set_surface_attached(&self, attached: bool) {
        self.shared.core.lock().surface_attached = attached;
        debug!("Display surface attached: {}", attached);
    }

    /// Viewer binder readiness, releases a waiting `PlayImage`
    pub fn set_binder_status(&self, ready: bool) {
        debug!("Binder ready: {}", ready);
        if ready {
            self.shared.binder_ready.open();
        } else {
            self.shared.binder_ready.reset();
        }
    }

    /// Report the outcome of displaying an image
    pub fn set_image_complete(&self, ok: bool) {
        info!("Image display complete: {}", ok);
        if ok {
            let transition = {
                let mut core = self.shared.core.lock();
                core.image = true;
                core.promote_pending(0);
                core.set_state(PlaybackState::Playing)
            };
            if let Some(transition) = transition {
                self.shared.after_transition(transition, false);
            }
            self.shared.send_status();
        } else {
            self.shared.core.lock().image = false;
            self.shared.set_state(PlaybackState::Error, true);
        }
    }

    /// Sink the decoder reports into
    pub fn decoder_events(&self) -> DecoderEvents {
        DecoderEvents::new(Arc::downgrade(&self.shared))
    }

    /// Commands queued but not yet started
    pub fn pending_commands(&self) -> usize {
        self.shared
            .queue
            .lock()
            .as_ref()
            .map(|q| q.len())
            .unwrap_or(0)
    }

    pub fn listener_count(&self) -> usize {
        self.shared.listeners.len()
    }

    pub fn is_torn_down(&self) -> bool {
        self.shared.torn_down.load(Ordering::Acquire)
    }

    fn ensure_live(&self) -> Result<()> {
        if self.is_torn_down() {
            Err(Error::InvalidState("Session has been torn down".to_string()))
        } else {
            Ok(())
        }
    }

    /// Stop the worker and release the decoder
    ///
    /// Pending commands are dropped, blocked waits are released and the
    /// decoder is stopped and released. Safe to call more than once.
    pub fn teardown(&self) {
        if self.shared.torn_down.swap(true, Ordering::AcqRel) {
            return;
        }
        info!("Tearing down media session");

        self.shared.ticker.shutdown();

        let queue = self.shared.queue.lock().take();
        if let Some(queue) = &queue {
            let dropped = queue.flush();
            if dropped > 0 {
                info!("Dropped {} pending commands", dropped);
            }
        }

        self.shared.prepared.close();
        self.shared.seek_done.close();
        self.shared.binder_ready.close();

        if queue.is_some() {
            if let Err(e) = self.shared.decoder.stop() {
                debug!("Decoder stop during teardown: {}", e);
            }
        }
        self.shared.decoder.release();

        if let Some(queue) = queue {
            queue.shutdown();
        }
        info!("Media session torn down");
    }
}

impl Drop for MediaSession {
    fn drop(&mut self) {
        self.teardown();
    }
}
