//! Decoder adapter boundary
//!
//! The decoder is an external capability: it loads a source, plays, pauses,
//! seeks and stops, and reports readiness asynchronously through
//! [`DecoderEvents`]. Mutating calls are only ever issued from the session's
//! command worker; position and duration queries may come from any thread.

pub mod loopback;

use fling_common::events::{PlaybackCondition, Warning};
use thiserror::Error;

pub use crate::session::DecoderEvents;
pub use loopback::{LoopbackConfig, LoopbackDecoder};

/// Errors raised synchronously by decoder calls
#[derive(Error, Debug)]
pub enum DecoderError {
    /// The source or parameter was rejected
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The decoder is in the wrong internal state for the call
    #[error("invalid decoder state: {0}")]
    InvalidState(String),

    /// The source could not be reached
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

impl DecoderError {
    /// Condition recorded when setting a data source fails
    pub fn source_condition(&self) -> PlaybackCondition {
        match self {
            DecoderError::InvalidArgument(_) => PlaybackCondition::ErrorContent,
            DecoderError::Io(_) => PlaybackCondition::ErrorChannel,
            DecoderError::InvalidState(_) => PlaybackCondition::ErrorUnknown,
        }
    }
}

/// Media decoder capability
pub trait Decoder: Send + Sync {
    /// Register the sink for asynchronous notifications
    ///
    /// Called once by the session at construction.
    fn attach(&self, events: DecoderEvents);

    /// Return to the idle state, dropping any loaded source
    fn reset(&self);

    fn set_data_source(&self, uri: &str) -> Result<(), DecoderError>;

    /// Begin loading; completion is reported through `DecoderEvents::prepared`
    fn prepare_async(&self) -> Result<(), DecoderError>;

    fn start(&self) -> Result<(), DecoderError>;

    fn pause(&self) -> Result<(), DecoderError>;

    fn stop(&self) -> Result<(), DecoderError>;

    /// Begin seeking; completion is reported through `DecoderEvents::seek_complete`
    fn seek_to(&self, position_ms: i64) -> Result<(), DecoderError>;

    fn current_position(&self) -> Result<i64, DecoderError>;

    fn duration(&self) -> Result<i64, DecoderError>;

    /// Release all decoder resources; no further calls follow
    fn release(&self);

    /// MIME types this decoder can handle
    fn supported_mime_types(&self) -> Vec<String>;
}

/// Asynchronous error codes reported by the decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderErrorCode {
    Io,
    ServerDied,
    TimedOut,
    Malformed,
    NotValidForProgressivePlayback,
    /// Raised when the player is used after a reset; not a media failure
    PlayerReset,
    Unsupported,
    Unknown(i32),
}

impl DecoderErrorCode {
    pub fn from_raw(code: i32) -> Self {
        match code {
            -1004 => DecoderErrorCode::Io,
            100 => DecoderErrorCode::ServerDied,
            -110 => DecoderErrorCode::TimedOut,
            -1007 => DecoderErrorCode::Malformed,
            200 => DecoderErrorCode::NotValidForProgressivePlayback,
            -38 => DecoderErrorCode::PlayerReset,
            -1010 => DecoderErrorCode::Unsupported,
            other => DecoderErrorCode::Unknown(other),
        }
    }

    /// Condition this error maps to, `None` when the error is ignored
    pub fn condition(self) -> Option<PlaybackCondition> {
        match self {
            DecoderErrorCode::Io | DecoderErrorCode::ServerDied | DecoderErrorCode::TimedOut => {
                Some(PlaybackCondition::ErrorChannel)
            }
            DecoderErrorCode::Malformed | DecoderErrorCode::NotValidForProgressivePlayback => {
                Some(PlaybackCondition::ErrorContent)
            }
            DecoderErrorCode::PlayerReset => None,
            DecoderErrorCode::Unsupported | DecoderErrorCode::Unknown(_) => {
                Some(PlaybackCondition::ErrorUnknown)
            }
        }
    }
}

/// Informational codes reported by the decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderInfoCode {
    VideoRenderingStart,
    VideoTrackLagging,
    BufferingStart,
    BufferingEnd,
    BadInterleaving,
    NotSeekable,
    MetadataUpdate,
    Other(i32),
}

/// What an info code does to the session condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoEffect {
    Warn(Warning),
    /// Clear a bandwidth warning, if one is active
    Recover,
    Ignore,
}

impl DecoderInfoCode {
    pub fn from_raw(code: i32) -> Self {
        match code {
            3 => DecoderInfoCode::VideoRenderingStart,
            700 => DecoderInfoCode::VideoTrackLagging,
            701 => DecoderInfoCode::BufferingStart,
            702 => DecoderInfoCode::BufferingEnd,
            800 => DecoderInfoCode::BadInterleaving,
            801 => DecoderInfoCode::NotSeekable,
            802 => DecoderInfoCode::MetadataUpdate,
            other => DecoderInfoCode::Other(other),
        }
    }

    pub fn effect(self) -> InfoEffect {
        match self {
            DecoderInfoCode::BufferingStart | DecoderInfoCode::VideoTrackLagging => {
                InfoEffect::Warn(Warning::Bandwidth)
            }
            DecoderInfoCode::BadInterleaving => InfoEffect::Warn(Warning::Content),
            DecoderInfoCode::BufferingEnd | DecoderInfoCode::VideoRenderingStart => {
                InfoEffect::Recover
            }
            DecoderInfoCode::NotSeekable
            | DecoderInfoCode::MetadataUpdate
            | DecoderInfoCode::Other(_) => InfoEffect::Ignore,
        }
    }
}
