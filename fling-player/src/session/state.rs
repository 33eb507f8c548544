//! Session core state
//!
//! Everything guarded by the session lock lives in [`SessionCore`]. Methods
//! here never block and never call out; the caller decides what to broadcast
//! from the returned [`Transition`].

use crate::error::{Error, Result};
use fling_common::events::{PlaybackCondition, PlaybackState, SessionStatus};
use fling_common::media::{MediaInfo, MediaMetadata};
use std::time::Duration;

const NO_STREAM: &str = "No media stream set";

/// A status change that actually happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Transition {
    pub(crate) from: SessionStatus,
    pub(crate) to: SessionStatus,
}

impl Transition {
    pub(crate) fn left_playing(&self) -> bool {
        self.from.state() == PlaybackState::Playing && self.to.state() != PlaybackState::Playing
    }
}

/// Transport requests validated against the current state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Transport {
    Play,
    Pause,
    Stop,
    Seek,
}

#[derive(Debug)]
pub(crate) struct SessionCore {
    pub(crate) status: SessionStatus,
    /// Set by the controller, promoted to `current` once the decoder is ready
    pub(crate) pending: Option<MediaInfo>,
    /// Only populated while the state has media loaded
    pub(crate) current: Option<MediaInfo>,
    pub(crate) metadata: Option<MediaMetadata>,
    /// True once any source has been accepted
    pub(crate) source_set: bool,
    pub(crate) image: bool,
    pub(crate) mute: bool,
    pub(crate) surface_attached: bool,
    pub(crate) update_interval: Duration,
}

impl SessionCore {
    pub(crate) fn new(update_interval: Duration) -> Self {
        Self {
            status: SessionStatus::default(),
            pending: None,
            current: None,
            metadata: None,
            source_set: false,
            image: false,
            mute: false,
            surface_attached: false,
            update_interval,
        }
    }

    pub(crate) fn state(&self) -> PlaybackState {
        self.status.state()
    }

    pub(crate) fn set_state(&mut self, state: PlaybackState) -> Option<Transition> {
        self.apply(self.status.with_state(state))
    }

    pub(crate) fn set_condition(&mut self, condition: PlaybackCondition) -> Option<Transition> {
        self.apply(self.status.with_condition(condition))
    }

    /// Clear a bandwidth warning; any other condition is left alone
    pub(crate) fn recover_bandwidth(&mut self) -> Option<Transition> {
        if self.status.condition() == PlaybackCondition::WarningBandwidth {
            self.set_condition(PlaybackCondition::Good)
        } else {
            None
        }
    }

    fn apply(&mut self, next: SessionStatus) -> Option<Transition> {
        if next == self.status {
            return None;
        }
        let from = self.status;
        self.status = next;
        if !next.state().has_media() {
            self.current = None;
        }
        Some(Transition { from, to: next })
    }

    /// Promote the pending source to current with its decoded duration
    pub(crate) fn promote_pending(&mut self, duration_ms: i64) {
        self.current = self.pending.as_ref().map(|p| p.with_duration(duration_ms));
    }

    /// Forget the track-level descriptors of a finished or failed stream
    pub(crate) fn clear_track(&mut self) {
        self.metadata = None;
        self.current = None;
    }

    /// True when a source is loaded and not in a terminal state
    fn has_active_stream(&self) -> bool {
        self.source_set
            && !matches!(
                self.state(),
                PlaybackState::NoSource | PlaybackState::Error | PlaybackState::Finished
            )
    }

    /// Check whether a transport request may be queued
    pub(crate) fn validate(&self, request: Transport) -> Result<()> {
        let state = self.state();
        match request {
            Transport::Pause => {
                if self.source_set && state == PlaybackState::Playing {
                    Ok(())
                } else if matches!(state, PlaybackState::Seeking | PlaybackState::Finished) {
                    Err(Error::InvalidState(format!(
                        "Stream cannot be paused while {}",
                        state
                    )))
                } else {
                    Err(Error::InvalidState(NO_STREAM.to_string()))
                }
            }
            Transport::Seek if state == PlaybackState::Finished => Err(Error::InvalidState(
                "Stream cannot be sought once finished".to_string(),
            )),
            Transport::Play | Transport::Stop | Transport::Seek => {
                if self.has_active_stream() {
                    Ok(())
                } else {
                    Err(Error::InvalidState(NO_STREAM.to_string()))
                }
            }
        }
    }

    /// Position queries are refused without a stream or after a failure
    pub(crate) fn can_report_position(&self) -> bool {
        self.source_set && self.state() != PlaybackState::Error
    }

    pub(crate) fn can_report_duration(&self) -> bool {
        self.source_set
            && !matches!(
                self.state(),
                PlaybackState::Error | PlaybackState::PreparingMedia
            )
    }
}
