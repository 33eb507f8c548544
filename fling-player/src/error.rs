//! Error types for fling-player
//!
//! Defines module-specific error types using thiserror for clear error propagation.

use crate::decoder::DecoderError;
use thiserror::Error;

/// Main error type for fling-player
#[derive(Error, Debug)]
pub enum Error {
    /// Operation not valid in the current session state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Bad caller input (URI, metadata, volume, interval)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Decoder adapter errors
    #[error("Decoder error: {0}")]
    Decoder(#[from] DecoderError),

    /// Content-type probe errors
    #[error("Probe error: {0}")]
    Probe(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors from shared fling-common helpers
    #[error(transparent)]
    Common(#[from] fling_common::Error),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for errors caused by caller input rather than session state or I/O
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidArgument(_) | Error::Common(fling_common::Error::InvalidInput(_))
                | Error::Common(fling_common::Error::Json(_))
        )
    }
}

/// Convenience Result type using fling-player Error
pub type Result<T> = std::result::Result<T, Error>;
