//! Output notes: a start command paired with its matching stop command.

use crate::message::MidiOutputMessage;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Identifier of a live output note.
///
/// Game sources send note ids as either strings or integers; both normalize to
/// the same textual id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NoteId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NoteId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<i64> for NoteId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for NoteId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Int(i64),
            Float(f64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => NoteId(s),
            RawId::Int(i) => NoteId::from(i),
            RawId::Float(f) => NoteId(f.to_string()),
        })
    }
}

/// A note with an optional identifier for later matching.
///
/// A note started on a `noteCut` can be stopped by the `noteFullyCut` carrying
/// the same id; ids can also name other sustained things such as a wall the
/// player is standing in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputNote {
    pub id: Option<NoteId>,
    pub start: MidiOutputMessage,
    pub stop: MidiOutputMessage,
}

impl OutputNote {
    pub fn new(id: impl Into<NoteId>, channel: u8, note: u8, velocity: u8) -> Self {
        Self {
            id: Some(id.into()),
            start: MidiOutputMessage::note_on(channel, note, velocity),
            stop: MidiOutputMessage::note_off(channel, note, velocity),
        }
    }

    /// A note only `all_off` can stop.
    pub fn anonymous(channel: u8, note: u8, velocity: u8) -> Self {
        Self {
            id: None,
            start: MidiOutputMessage::note_on(channel, note, velocity),
            stop: MidiOutputMessage::note_off(channel, note, velocity),
        }
    }

    pub fn pitch(&self) -> Option<u8> {
        self.start.note()
    }

    pub fn velocity(&self) -> Option<u8> {
        self.start.velocity()
    }

    pub fn channel(&self) -> Option<u8> {
        self.start.channel()
    }
}
