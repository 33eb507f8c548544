//! Session status type definitions
//!
//! Wire-level `PlaybackState` / `PlaybackCondition` enums plus the structural
//! `SessionStatus` value that keeps the two consistent.

use serde::{Deserialize, Serialize};

/// Playback state enumeration
///
/// Exactly one state holds at any instant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "PascalCase")]
pub enum PlaybackState {
    NoSource,
    PreparingMedia,
    ReadyToPlay,
    Playing,
    Paused,
    Seeking,
    Finished,
    Error,
}

impl PlaybackState {
    /// States in which a source is loaded and the current media info is exposed
    pub fn has_media(self) -> bool {
        matches!(
            self,
            PlaybackState::ReadyToPlay
                | PlaybackState::Playing
                | PlaybackState::Paused
                | PlaybackState::Seeking
        )
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackState::NoSource => write!(f, "NoSource"),
            PlaybackState::PreparingMedia => write!(f, "PreparingMedia"),
            PlaybackState::ReadyToPlay => write!(f, "ReadyToPlay"),
            PlaybackState::Playing => write!(f, "Playing"),
            PlaybackState::Paused => write!(f, "Paused"),
            PlaybackState::Seeking => write!(f, "Seeking"),
            PlaybackState::Finished => write!(f, "Finished"),
            PlaybackState::Error => write!(f, "Error"),
        }
    }
}

/// Playback condition enumeration (wire representation)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "PascalCase")]
pub enum PlaybackCondition {
    Good,
    WarningContent,
    WarningBandwidth,
    ErrorContent,
    ErrorChannel,
    ErrorUnknown,
}

impl PlaybackCondition {
    /// Soft signal-quality conditions that persist across state changes
    pub fn is_warning(self) -> bool {
        matches!(
            self,
            PlaybackCondition::WarningContent | PlaybackCondition::WarningBandwidth
        )
    }

    /// Fatal conditions that force the `Error` state
    pub fn is_error(self) -> bool {
        matches!(
            self,
            PlaybackCondition::ErrorContent
                | PlaybackCondition::ErrorChannel
                | PlaybackCondition::ErrorUnknown
        )
    }
}

impl std::fmt::Display for PlaybackCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackCondition::Good => write!(f, "Good"),
            PlaybackCondition::WarningContent => write!(f, "WarningContent"),
            PlaybackCondition::WarningBandwidth => write!(f, "WarningBandwidth"),
            PlaybackCondition::ErrorContent => write!(f, "ErrorContent"),
            PlaybackCondition::ErrorChannel => write!(f, "ErrorChannel"),
            PlaybackCondition::ErrorUnknown => write!(f, "ErrorUnknown"),
        }
    }
}

/// Soft degradation kinds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Warning {
    Content,
    Bandwidth,
}

/// Fatal failure kinds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Fault {
    Content,
    Channel,
    Unknown,
}

impl From<Warning> for PlaybackCondition {
    fn from(warning: Warning) -> Self {
        match warning {
            Warning::Content => PlaybackCondition::WarningContent,
            Warning::Bandwidth => PlaybackCondition::WarningBandwidth,
        }
    }
}

impl From<Fault> for PlaybackCondition {
    fn from(fault: Fault) -> Self {
        match fault {
            Fault::Content => PlaybackCondition::ErrorContent,
            Fault::Channel => PlaybackCondition::ErrorChannel,
            Fault::Unknown => PlaybackCondition::ErrorUnknown,
        }
    }
}

/// Combined (state, condition) value
///
/// Illegal pairs are unrepresentable:
/// - `Ok` and `Degraded` never carry `PlaybackState::Error`
/// - `Faulted` is always projected as `PlaybackState::Error`
///
/// A warning survives state changes (it is carried along in `Degraded`), while a
/// fault is discarded as soon as the state leaves `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum SessionStatus {
    Ok(PlaybackState),
    Degraded(PlaybackState, Warning),
    Faulted(Fault),
}

impl Default for SessionStatus {
    fn default() -> Self {
        SessionStatus::Ok(PlaybackState::NoSource)
    }
}

impl SessionStatus {
    pub fn state(&self) -> PlaybackState {
        match *self {
            SessionStatus::Ok(state) | SessionStatus::Degraded(state, _) => state,
            SessionStatus::Faulted(_) => PlaybackState::Error,
        }
    }

    pub fn condition(&self) -> PlaybackCondition {
        match *self {
            SessionStatus::Ok(_) => PlaybackCondition::Good,
            SessionStatus::Degraded(_, warning) => warning.into(),
            SessionStatus::Faulted(fault) => fault.into(),
        }
    }

    /// Apply a state change
    ///
    /// Entering `Error` directly (without a fault kind) records `Fault::Unknown`.
    pub fn with_state(self, state: PlaybackState) -> Self {
        match (self, state) {
            (SessionStatus::Faulted(fault), PlaybackState::Error) => SessionStatus::Faulted(fault),
            (_, PlaybackState::Error) => SessionStatus::Faulted(Fault::Unknown),
            (SessionStatus::Degraded(_, warning), state) => SessionStatus::Degraded(state, warning),
            (_, state) => SessionStatus::Ok(state),
        }
    }

    /// Apply a condition change
    ///
    /// Fault conditions force `Error`. Warnings and `Good` only adjust a
    /// non-faulted status; a faulted session leaves `Error` through a state change.
    pub fn with_condition(self, condition: PlaybackCondition) -> Self {
        match (self, condition) {
            (_, PlaybackCondition::ErrorContent) => SessionStatus::Faulted(Fault::Content),
            (_, PlaybackCondition::ErrorChannel) => SessionStatus::Faulted(Fault::Channel),
            (_, PlaybackCondition::ErrorUnknown) => SessionStatus::Faulted(Fault::Unknown),
            (SessionStatus::Faulted(fault), _) => SessionStatus::Faulted(fault),
            (status, PlaybackCondition::Good) => SessionStatus::Ok(status.state()),
            (status, PlaybackCondition::WarningContent) => {
                SessionStatus::Degraded(status.state(), Warning::Content)
            }
            (status, PlaybackCondition::WarningBandwidth) => {
                SessionStatus::Degraded(status.state(), Warning::Bandwidth)
            }
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.state(), self.condition())
    }
}

/// Status snapshot delivered to observers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MediaStatus {
    pub state: PlaybackState,
    pub condition: PlaybackCondition,
    pub mute: bool,
    /// Volume in `[0.0, 1.0]`
    pub volume: f64,
}

impl MediaStatus {
    pub fn new(status: SessionStatus, mute: bool, volume: f64) -> Self {
        Self {
            state: status.state(),
            condition: status.condition(),
            mute,
            volume,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_no_source_good() {
        let status = SessionStatus::default();
        assert_eq!(status.state(), PlaybackState::NoSource);
        assert_eq!(status.condition(), PlaybackCondition::Good);
    }

    #[test]
    fn test_fault_forces_error_state() {
        let status = SessionStatus::Ok(PlaybackState::Playing)
            .with_condition(PlaybackCondition::ErrorChannel);
        assert_eq!(status.state(), PlaybackState::Error);
        assert_eq!(status.condition(), PlaybackCondition::ErrorChannel);
    }

    #[test]
    fn test_warning_keeps_state() {
        let status = SessionStatus::Ok(PlaybackState::Playing)
            .with_condition(PlaybackCondition::WarningBandwidth);
        assert_eq!(status.state(), PlaybackState::Playing);
        assert_eq!(status.condition(), PlaybackCondition::WarningBandwidth);
    }

    #[test]
    fn test_warning_persists_across_state_changes() {
        let status = SessionStatus::Ok(PlaybackState::Playing)
            .with_condition(PlaybackCondition::WarningContent)
            .with_state(PlaybackState::Paused)
            .with_state(PlaybackState::Seeking);
        assert_eq!(status, SessionStatus::Degraded(PlaybackState::Seeking, Warning::Content));
    }

    #[test]
    fn test_leaving_error_resets_condition() {
        let status = SessionStatus::Ok(PlaybackState::Playing)
            .with_condition(PlaybackCondition::ErrorContent)
            .with_state(PlaybackState::NoSource);
        assert_eq!(status, SessionStatus::Ok(PlaybackState::NoSource));
    }

    #[test]
    fn test_warning_does_not_mask_fault() {
        let status = SessionStatus::Ok(PlaybackState::Playing)
            .with_condition(PlaybackCondition::ErrorUnknown)
            .with_condition(PlaybackCondition::WarningBandwidth)
            .with_condition(PlaybackCondition::Good);
        assert_eq!(status.state(), PlaybackState::Error);
        assert_eq!(status.condition(), PlaybackCondition::ErrorUnknown);
    }

    #[test]
    fn test_direct_error_state_is_unknown_fault() {
        let status = SessionStatus::Ok(PlaybackState::PreparingMedia).with_state(PlaybackState::Error);
        assert_eq!(status, SessionStatus::Faulted(Fault::Unknown));

        // Re-entering Error keeps the recorded fault kind
        let status = SessionStatus::Faulted(Fault::Channel).with_state(PlaybackState::Error);
        assert_eq!(status, SessionStatus::Faulted(Fault::Channel));
    }

    #[test]
    fn test_good_clears_warning() {
        let status = SessionStatus::Degraded(PlaybackState::Playing, Warning::Bandwidth)
            .with_condition(PlaybackCondition::Good);
        assert_eq!(status, SessionStatus::Ok(PlaybackState::Playing));
    }

    #[test]
    fn test_projection_never_pairs_error_state_with_non_error_condition() {
        let states = [
            PlaybackState::NoSource,
            PlaybackState::PreparingMedia,
            PlaybackState::ReadyToPlay,
            PlaybackState::Playing,
            PlaybackState::Paused,
            PlaybackState::Seeking,
            PlaybackState::Finished,
            PlaybackState::Error,
        ];
        let conditions = [
            PlaybackCondition::Good,
            PlaybackCondition::WarningContent,
            PlaybackCondition::WarningBandwidth,
            PlaybackCondition::ErrorContent,
            PlaybackCondition::ErrorChannel,
            PlaybackCondition::ErrorUnknown,
        ];

        for state in states {
            for condition in conditions {
                let status = SessionStatus::default().with_state(state).with_condition(condition);
                assert_eq!(
                    status.state() == PlaybackState::Error,
                    status.condition().is_error(),
                    "inconsistent projection for {:?}",
                    status
                );
            }
        }
    }

    #[test]
    fn test_media_status_serializes_pascal_case() {
        let status = MediaStatus::new(SessionStatus::Ok(PlaybackState::ReadyToPlay), false, 0.5);
        let json = serde_json::to_value(status).unwrap();
        assert_eq!(json["state"], "ReadyToPlay");
        assert_eq!(json["condition"], "Good");
    }
}
