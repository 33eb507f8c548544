//! Asynchronous decoder notifications
//!
//! Callbacks arrive on decoder-owned threads. They only adjust state and open
//! gates; decoder work they imply is queued for the worker.

use super::{Command, SessionShared};
use crate::decoder::{DecoderErrorCode, DecoderInfoCode, InfoEffect};
use fling_common::events::{PlaybackCondition, PlaybackState};
use std::sync::Weak;
use tracing::{debug, error, info, warn};

/// Sink handed to the decoder at attach time
///
/// Holds only a weak reference; notifications after the session is gone are
/// dropped.
#[derive(Clone)]
pub struct DecoderEvents {
    session: Weak<SessionShared>,
}

impl DecoderEvents {
    pub(crate) fn new(session: Weak<SessionShared>) -> Self {
        Self { session }
    }

    /// Preparation finished; `false` when it failed
    pub fn prepared(&self, ok: bool) {
        if let Some(session) = self.session.upgrade() {
            session.on_prepared(ok);
        }
    }

    /// Asynchronous error with a decoder-specific code
    pub fn error(&self, code: i32) {
        if let Some(session) = self.session.upgrade() {
            session.on_error(code);
        }
    }

    /// Informational event with a decoder-specific code
    pub fn info(&self, code: i32) {
        if let Some(session) = self.session.upgrade() {
            session.on_info(code);
        }
    }

    pub fn seek_complete(&self) {
        if let Some(session) = self.session.upgrade() {
            session.on_seek_complete();
        }
    }

    /// End of stream reached
    pub fn completion(&self) {
        if let Some(session) = self.session.upgrade() {
            session.on_completion();
        }
    }
}

impl std::fmt::Debug for DecoderEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecoderEvents")
            .field("attached", &(self.session.strong_count() > 0))
            .finish()
    }
}

impl SessionShared {
    pub(crate) fn on_prepared(&self, ok: bool) {
        info!("Decoder prepared: {}", ok);
        if !ok {
            self.prepared.fail();
            return;
        }

        let duration = self.decoder.duration().unwrap_or_else(|e| {
            warn!("Prepared decoder reports no duration: {}", e);
            0
        });
        let transition = {
            let mut core = self.core.lock();
            let transition = core.set_state(PlaybackState::ReadyToPlay);
            core.promote_pending(duration);
            transition
        };
        if let Some(transition) = transition {
            self.after_transition(transition, true);
        }
        self.prepared.open();
    }

    pub(crate) fn on_error(&self, code: i32) {
        let code = DecoderErrorCode::from_raw(code);
        let Some(condition) = code.condition() else {
            debug!("Ignoring decoder error {:?}", code);
            return;
        };
        error!("Decoder error {:?} -> {}", code, condition);

        let preparing = self.state() == PlaybackState::PreparingMedia;
        self.set_condition(condition, true);
        if preparing {
            // Preparation will not complete; release whoever waits for it
            self.prepared.fail();
        }
    }

    pub(crate) fn on_info(&self, code: i32) {
        let code = DecoderInfoCode::from_raw(code);
        let transition = match code.effect() {
            InfoEffect::Warn(warning) => {
                warn!("Decoder info {:?}", code);
                self.core.lock().set_condition(warning.into())
            }
            InfoEffect::Recover => {
                debug!("Decoder info {:?}", code);
                self.core.lock().recover_bandwidth()
            }
            InfoEffect::Ignore => {
                debug!("Ignoring decoder info {:?}", code);
                None
            }
        };
        if let Some(transition) = transition {
            self.after_transition(transition, true);
        }
    }

    pub(crate) fn on_seek_complete(&self) {
        debug!("Seek complete");
        self.seek_done.open();
    }

    pub(crate) fn on_completion(&self) {
        let state = self.state();
        info!("Playback completed in state {}", state);

        match state {
            PlaybackState::Finished => return,
            PlaybackState::Error => {
                self.core.lock().clear_track();
                if let Err(e) = self.enqueue(Command::Reset) {
                    debug!("Decoder reset not queued: {}", e);
                }
                return;
            }
            _ => {}
        }

        // Completion while loading is the decoder resetting, not a user-visible end
        let internal = matches!(
            state,
            PlaybackState::NoSource | PlaybackState::PreparingMedia
        );
        let transition = {
            let mut core = self.core.lock();
            core.clear_track();
            core.set_state(PlaybackState::Finished)
        };
        if let Some(transition) = transition {
            self.after_transition(transition, !internal);
        }
        if !internal {
            if let Err(e) = self.enqueue(Command::Stop) {
                debug!("Stop after completion not queued: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detached_events_are_dropped() {
        let events = DecoderEvents::new(Weak::new());
        // No session behind the sink: every notification is a no-op
        events.prepared(true);
        events.error(-1004);
        events.info(701);
        events.seek_complete();
        events.completion();
        assert!(format!("{:?}", events).contains("attached: false"));
    }

    #[test]
    fn test_condition_for_error_is_fatal() {
        let condition = DecoderErrorCode::from_raw(-1007).condition().unwrap();
        assert_eq!(condition, PlaybackCondition::ErrorContent);
        assert!(condition.is_error());
    }
}
