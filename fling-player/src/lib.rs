//! # Fling Player Library (fling-player)
//!
//! Remote-controlled media session.
//!
//! **Purpose:** Accept playback requests from a remote controller, execute them
//! one at a time against a media decoder, track a consistent playback
//! (state, condition) status and broadcast it to observers.
//!
//! **Architecture:**
//! - `session`: command queue, worker, readiness gates and state machine
//! - `decoder`: decoder capability and the loopback implementation
//! - `display` / `probe` / `volume`: the other external capabilities
//! - `api`: HTTP/SSE control surface

pub mod api;
pub mod config;
pub mod decoder;
pub mod display;
pub mod error;
pub mod probe;
pub mod session;
pub mod volume;

pub use error::{Error, Result};
pub use session::{Capabilities, MediaSession, SessionOptions};
