//! Command execution on the worker thread
//!
//! Every decoder-mutating call in the session happens here, one command at a
//! time. Commands that depend on decoder readiness block on the session's
//! gates; a gate that failed or closed turns the command into a no-op.

use super::gate::{ReadinessGate, WaitOutcome};
use super::{Command, SeekMode, SessionShared};
use crate::error::Result;
use fling_common::events::{PlaybackCondition, PlaybackState};
use fling_common::human_time::format_clock;
use fling_common::media::MediaKind;
use tracing::{debug, error, info, warn};

impl SessionShared {
    pub(crate) fn execute(&self, command: Command) -> Result<()> {
        match command {
            Command::SetSource {
                uri,
                play_in_background,
            } => self.exec_set_source(&uri, play_in_background),
            Command::SetImage {
                uri,
                play_in_background,
            } => self.exec_set_image(&uri, play_in_background),
            Command::Play => self.exec_play(),
            Command::PlayImage { uri } => self.exec_play_image(&uri),
            Command::Pause => self.exec_pause(),
            Command::Stop => self.exec_stop(),
            Command::Seek { mode, offset_ms } => self.exec_seek(mode, offset_ms),
            Command::Update => {
                self.update_status();
                Ok(())
            }
            Command::Reset => {
                self.decoder.reset();
                Ok(())
            }
        }
    }

    /// Wait on `gate`, returning whether the command may proceed
    fn await_gate(&self, gate: &ReadinessGate, what: &str) -> bool {
        debug!("Waiting for {}", what);
        match gate.wait(self.readiness_timeout) {
            WaitOutcome::Ready => true,
            WaitOutcome::Failed => {
                warn!("{} will not happen, skipping command", what);
                false
            }
            WaitOutcome::Closed => {
                debug!("Stopped waiting for {}: session shutting down", what);
                false
            }
            WaitOutcome::TimedOut => {
                error!("Timed out waiting for {}", what);
                self.set_condition(PlaybackCondition::ErrorChannel, true);
                false
            }
        }
    }

    fn await_prepared(&self) -> bool {
        self.await_gate(&self.prepared, "decoder preparation")
    }

    /// Reset to an empty, healthy session without telling anyone
    fn reset_for_new_source(&self, play_in_background: bool) -> bool {
        self.set_state(PlaybackState::NoSource, false);
        self.set_condition(PlaybackCondition::Good, false);
        self.decoder.reset();

        let surface_attached = self.core.lock().surface_attached;
        if !play_in_background && !surface_attached {
            if let Err(e) = self.display.launch_viewer() {
                error!("Cannot launch viewer: {}", e);
                self.set_condition(PlaybackCondition::ErrorUnknown, true);
                return false;
            }
        }
        true
    }

    fn exec_set_source(&self, uri: &str, play_in_background: bool) -> Result<()> {
        info!("Loading source {}", uri);
        self.prepared.reset();

        if !self.reset_for_new_source(play_in_background) {
            self.prepared.fail();
            return Ok(());
        }

        if let Err(e) = self.decoder.set_data_source(uri) {
            error!("Cannot set data source {}: {}", uri, e);
            self.prepared.fail();
            self.set_condition(e.source_condition(), true);
            return Ok(());
        }

        self.set_state(PlaybackState::PreparingMedia, true);
        if let Err(e) = self.decoder.prepare_async() {
            error!("Cannot prepare {}: {}", uri, e);
            self.prepared.fail();
            self.set_condition(PlaybackCondition::ErrorUnknown, true);
        }
        Ok(())
    }

    fn exec_set_image(&self, uri: &str, play_in_background: bool) -> Result<()> {
        info!("Loading image {}", uri);
        // Images never go through the decoder
        self.prepared.fail();

        if !self.reset_for_new_source(play_in_background) {
            return Ok(());
        }

        self.set_state(PlaybackState::PreparingMedia, true);
        match self.probe.content_type(uri) {
            Ok(Some(content_type)) if MediaKind::from_mime(&content_type) == Some(MediaKind::Image) => {
                debug!("{} is {}", uri, content_type);
                self.set_state(PlaybackState::ReadyToPlay, true);
            }
            Ok(content_type) => {
                error!("{} is not an image (content type {:?})", uri, content_type);
                self.set_condition(PlaybackCondition::ErrorUnknown, true);
            }
            Err(e) => {
                error!("Cannot probe {}: {}", uri, e);
                self.set_condition(PlaybackCondition::ErrorUnknown, true);
            }
        }
        Ok(())
    }

    fn exec_play(&self) -> Result<()> {
        if !self.await_prepared() {
            return Ok(());
        }
        let state = self.state();
        if matches!(state, PlaybackState::Paused | PlaybackState::ReadyToPlay) {
            self.decoder.start()?;
            self.set_state(PlaybackState::Playing, true);
        } else {
            warn!("Cannot play, bad state: {}", state);
        }
        Ok(())
    }

    fn exec_play_image(&self, uri: &str) -> Result<()> {
        if !self.await_gate(&self.binder_ready, "viewer binder") {
            return Ok(());
        }
        let state = self.state();
        if state != PlaybackState::ReadyToPlay {
            warn!("Cannot show image, bad state: {}", state);
            return Ok(());
        }
        if let Err(e) = self.display.load_image(uri) {
            error!("Cannot hand image to viewer: {}", e);
            self.set_condition(PlaybackCondition::ErrorUnknown, true);
        }
        Ok(())
    }

    fn exec_pause(&self) -> Result<()> {
        if !self.await_prepared() {
            return Ok(());
        }
        let state = self.state();
        if matches!(state, PlaybackState::Playing | PlaybackState::ReadyToPlay) {
            self.decoder.pause()?;
            self.set_state(PlaybackState::Paused, true);
        } else {
            warn!("Cannot pause, bad state: {}", state);
        }
        Ok(())
    }

    fn exec_stop(&self) -> Result<()> {
        let image = self.core.lock().image;
        if image {
            self.set_state(PlaybackState::Finished, true);
            return Ok(());
        }

        if !self.await_prepared() {
            return Ok(());
        }
        let state = self.state();
        if state == PlaybackState::Error || state == PlaybackState::NoSource {
            warn!("Cannot stop, bad state: {}", state);
            return Ok(());
        }
        self.decoder.stop()?;
        self.set_state(PlaybackState::Finished, true);
        Ok(())
    }

    fn exec_seek(&self, mode: SeekMode, offset_ms: i64) -> Result<()> {
        if !self.await_prepared() {
            return Ok(());
        }
        let original = self.state();
        if !matches!(
            original,
            PlaybackState::Playing | PlaybackState::Paused | PlaybackState::ReadyToPlay
        ) {
            warn!("Cannot seek, bad state: {}", original);
            return Ok(());
        }

        self.seek_done.reset();
        let target = match mode {
            SeekMode::Absolute => offset_ms,
            SeekMode::Relative => offset_ms.saturating_add(self.decoder.current_position()?),
        }
        .max(0);
        debug!("Seeking to {}", format_clock(target));

        self.decoder.seek_to(target)?;
        self.set_state(PlaybackState::Seeking, true);

        if self.await_gate(&self.seek_done, "seek completion") {
            // A fault raised mid-seek wins over the pre-seek state
            if self.state() == PlaybackState::Seeking {
                self.set_state(original, true);
            }
        }
        Ok(())
    }
}
