//! Error types for mbx-player
//!
//! Defines module-specific error types using thiserror for clear error
//! propagation. All of these are recoverable, user-visible conditions;
//! none are fatal to the process.

use thiserror::Error;

/// Main error type for the mbx-player module
#[derive(Error, Debug)]
pub enum Error {
    /// The music box has no tracks
    #[error("The music box is empty")]
    EmptyQueue,

    /// Index outside the valid queue range
    #[error("Invalid index {index}: it must range from 0 to {}", len.saturating_sub(1))]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Queue length at the time of the request
        len: usize,
    },

    /// A playback session is already in flight
    #[error("Already playing the music box")]
    AlreadyBusy,

    /// No active voice connection
    #[error("Not connected to a voice channel")]
    NotConnected,

    /// Connected but nothing is playing
    #[error("Not playing anything")]
    NotPlaying,

    /// Query or URL could not be resolved into tracks
    #[error("Resolution error: {0}")]
    Resolution(String),

    /// Audio download failure
    #[error("Network error: {0}")]
    Network(String),

    /// Voice sink / playback process errors
    #[error("Playback error: {0}")]
    Playback(String),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Short machine-readable category, used in error events
    pub fn kind(&self) -> &'static str {
        match self {
            Error::EmptyQueue => "empty_queue",
            Error::IndexOutOfRange { .. } => "index_out_of_range",
            Error::AlreadyBusy => "already_busy",
            Error::NotConnected => "not_connected",
            Error::NotPlaying => "not_playing",
            Error::Resolution(_) => "resolution",
            Error::Network(_) => "network",
            Error::Playback(_) => "playback",
            Error::Http(_) => "http",
            Error::Config(_) => "config",
            Error::Io(_) => "io",
        }
    }
}

/// Convenience Result type using the mbx-player Error
pub type Result<T> = std::result::Result<T, Error>;
