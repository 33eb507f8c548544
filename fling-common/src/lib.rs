//! # Fling Common Library
//!
//! Shared code for the fling media session crates including:
//! - Session status and event types (SessionStatus, SessionEvent, EventBus)
//! - Media descriptors and media-kind resolution
//! - Configuration file resolution
//! - Human-readable time formatting

pub mod config;
pub mod error;
pub mod events;
pub mod human_time;
pub mod media;

pub use error::{Error, Result};
pub use media::{MediaInfo, MediaKind, MediaMetadata};
