//! Centralized error type for the saber-midi umbrella crate.
//!
//! Wraps subsystem errors so `?` propagates naturally across crate boundaries.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Unparseable text or a missing `event` tag. The message is dropped.
    #[error("malformed message: {0}")]
    MalformedMessage(#[source] serde_json::Error),

    /// Archive flush failed; the pending data stays in memory.
    #[error("failed to persist {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No usable output device at startup.
    #[error("MIDI device unavailable: {0}")]
    DeviceUnavailable(#[from] saber_midi_io::Error),

    #[error("config {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    #[error("message stream: {0}")]
    Stream(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failure inside one processor. Logged by the chain and treated as a pass.
#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("'{event}' message has no '{field}' payload")]
    MissingPayload {
        event: String,
        field: &'static str,
    },

    #[error("{0}")]
    Other(String),
}
