//! HTTP control surface
//!
//! Exposes the media session to a remote controller:
//! - `server`: router and server loop
//! - `handlers`: request handlers for session, audio and viewer endpoints
//! - `sse`: status event stream and the listener feeding it

pub mod handlers;
pub mod server;
pub mod sse;

pub use server::{create_router, run, AppContext};
pub use sse::EventBusForwarder;
