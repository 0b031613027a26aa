//! Error types for the MIDI output subsystem.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("MIDI port error: {0}")]
    MidiPort(String),

    #[error("MIDI device error: {0}")]
    MidiDevice(String),

    #[error("No MIDI output device matching '{name}' (available: {available:?})")]
    DeviceNotFound {
        name: String,
        available: Vec<String>,
    },

    #[error("MIDI output thread not running")]
    OutputThreadStopped,
}

#[cfg(feature = "midi-io")]
impl From<midir::InitError> for Error {
    fn from(e: midir::InitError) -> Self {
        Error::MidiDevice(e.to_string())
    }
}

#[cfg(feature = "midi-io")]
impl From<midir::ConnectError<midir::MidiOutput>> for Error {
    fn from(e: midir::ConnectError<midir::MidiOutput>) -> Self {
        Error::MidiPort(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
