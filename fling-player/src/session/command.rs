//! Commands executed by the session worker

use serde::{Deserialize, Serialize};

/// How a seek offset is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeekMode {
    /// Offset is the target position
    Absolute,
    /// Offset is added to the current position
    Relative,
}

/// Unit of work for the command worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SetSource {
        uri: String,
        play_in_background: bool,
    },
    SetImage {
        uri: String,
        play_in_background: bool,
    },
    Play,
    PlayImage {
        uri: String,
    },
    Pause,
    Stop,
    Seek {
        mode: SeekMode,
        offset_ms: i64,
    },
    /// Periodic status refresh while playing
    Update,
    /// Return the decoder to idle after a failed stream completes
    Reset,
}

impl Command {
    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Command::SetSource { .. } => "SetSource",
            Command::SetImage { .. } => "SetImage",
            Command::Play => "Play",
            Command::PlayImage { .. } => "PlayImage",
            Command::Pause => "Pause",
            Command::Stop => "Stop",
            Command::Seek { .. } => "Seek",
            Command::Update => "Update",
            Command::Reset => "Reset",
        }
    }
}
