//! Inbound game-status messages.
//!
//! A message is a JSON object with an `event` tag, an optional `status` object
//! holding snapshots of the game, and event-specific payload such as `noteCut`.
//! Everything except `status` is kept verbatim so the archive stores exactly
//! what the game sent.

use crate::error::{Error, ProcessorError, Result};
use saber_midi_io::NoteId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tracing::warn;

/// Event tag of a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Event {
    Hello,
    SongStart,
    Finished,
    Failed,
    Menu,
    Pause,
    Resume,
    SoftFailed,
    NoteCut,
    NoteFullyCut,
    NoteMissed,
    BombCut,
    BombMissed,
    ObstacleEnter,
    ObstacleExit,
    ScoreChanged,
    BeatmapEvent,
    Other(String),
}

impl Event {
    pub fn as_str(&self) -> &str {
        match self {
            Event::Hello => "hello",
            Event::SongStart => "songStart",
            Event::Finished => "finished",
            Event::Failed => "failed",
            Event::Menu => "menu",
            Event::Pause => "pause",
            Event::Resume => "resume",
            Event::SoftFailed => "softFailed",
            Event::NoteCut => "noteCut",
            Event::NoteFullyCut => "noteFullyCut",
            Event::NoteMissed => "noteMissed",
            Event::BombCut => "bombCut",
            Event::BombMissed => "bombMissed",
            Event::ObstacleEnter => "obstacleEnter",
            Event::ObstacleExit => "obstacleExit",
            Event::ScoreChanged => "scoreChanged",
            Event::BeatmapEvent => "beatmapEvent",
            Event::Other(name) => name,
        }
    }

    /// `finished`, `failed` and `menu` end whatever map is in progress.
    pub fn is_abort(&self) -> bool {
        matches!(self, Event::Finished | Event::Failed | Event::Menu)
    }
}

impl From<&str> for Event {
    fn from(name: &str) -> Self {
        match name {
            "hello" => Event::Hello,
            "songStart" => Event::SongStart,
            "finished" => Event::Finished,
            "failed" => Event::Failed,
            "menu" => Event::Menu,
            "pause" => Event::Pause,
            "resume" => Event::Resume,
            "softFailed" => Event::SoftFailed,
            "noteCut" => Event::NoteCut,
            "noteFullyCut" => Event::NoteFullyCut,
            "noteMissed" => Event::NoteMissed,
            "bombCut" => Event::BombCut,
            "bombMissed" => Event::BombMissed,
            "obstacleEnter" => Event::ObstacleEnter,
            "obstacleExit" => Event::ObstacleExit,
            "scoreChanged" => Event::ScoreChanged,
            "beatmapEvent" => Event::BeatmapEvent,
            other => Event::Other(other.to_string()),
        }
    }
}

impl From<String> for Event {
    fn from(name: String) -> Self {
        Event::from(name.as_str())
    }
}

impl From<Event> for String {
    fn from(event: Event) -> Self {
        event.as_str().to_string()
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map currently loaded in the game.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Beatmap {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub song_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub song_author_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level_author_name: Option<String>,
    #[serde(rename = "songBPM", default, skip_serializing_if = "Option::is_none")]
    pub song_bpm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub characteristic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes_count: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Running score state of the current map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Performance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_max_score: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiplier: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_multiplier: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passed_notes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combo: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_energy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soft_failed: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Snapshots attached to a message. A missing or `null` key means "unchanged".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Status {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beatmap: Option<Beatmap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance: Option<Performance>,
    #[serde(rename = "mod", default, skip_serializing_if = "Option::is_none")]
    pub modifiers: Option<Value>,
    #[serde(rename = "playerSettings", default, skip_serializing_if = "Option::is_none")]
    pub player_settings: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game: Option<Value>,
}

/// Kinematics of a block cut, carried by `noteCut` and `noteFullyCut`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteCut {
    #[serde(rename = "noteID")]
    pub note_id: NoteId,
    #[serde(default)]
    pub note_type: Option<String>,
    #[serde(default)]
    pub initial_score: Option<f64>,
    #[serde(default)]
    pub cut_distance_score: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Status {
    /// Decode each snapshot on its own. One that does not match its shape is
    /// logged and treated as absent, so it never costs the message its event.
    pub fn from_value(value: &Value) -> Self {
        let Value::Object(status) = value else {
            if !value.is_null() {
                warn!(status = %value, "ignoring non-object status");
            }
            return Self::default();
        };
        Self {
            beatmap: snapshot(status, "beatmap"),
            performance: snapshot(status, "performance"),
            modifiers: snapshot(status, "mod"),
            player_settings: snapshot(status, "playerSettings"),
            game: snapshot(status, "game"),
        }
    }
}

fn snapshot<T: DeserializeOwned>(status: &Map<String, Value>, key: &str) -> Option<T> {
    let raw = status.get(key).filter(|v| !v.is_null())?;
    match T::deserialize(raw) {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            warn!(snapshot = key, error = %e, "ignoring undecodable snapshot");
            None
        }
    }
}

#[derive(Deserialize)]
struct Envelope {
    event: Event,
}

/// One inbound message.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub event: Event,
    pub status: Status,
    body: Map<String, Value>,
}

impl Message {
    /// Parse one text frame. Fails with `MalformedMessage` on bad JSON, a
    /// non-object, or a missing/non-string `event`. A bad `status` is never
    /// fatal.
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text).map_err(Error::MalformedMessage)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let envelope = Envelope::deserialize(&value).map_err(Error::MalformedMessage)?;
        let Value::Object(mut body) = value else {
            return Err(Error::MalformedMessage(
                <serde_json::Error as serde::de::Error>::custom("message is not an object"),
            ));
        };
        let status = body
            .remove("status")
            .map(|status| Status::from_value(&status))
            .unwrap_or_default();
        Ok(Self {
            event: envelope.event,
            status,
            body,
        })
    }

    /// A bare message with no status and no payload.
    pub fn bare(event: Event) -> Self {
        let mut body = Map::new();
        body.insert("event".to_string(), Value::String(event.as_str().to_string()));
        Self {
            event,
            status: Status::default(),
            body,
        }
    }

    /// The message as received, with `status` stripped.
    pub fn entry(&self) -> Value {
        Value::Object(self.body.clone())
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.body.get(name)
    }

    /// The `noteCut` payload.
    pub fn note_cut(&self) -> std::result::Result<NoteCut, ProcessorError> {
        let missing = || ProcessorError::MissingPayload {
            event: self.event.to_string(),
            field: "noteCut",
        };
        let raw = self.body.get("noteCut").ok_or_else(missing)?;
        NoteCut::deserialize(raw).map_err(|e| ProcessorError::Other(format!("bad noteCut: {e}")))
    }
}
