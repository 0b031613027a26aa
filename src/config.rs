//! Bridge configuration.
//!
//! Every field has a default, so an empty object (or no file at all) yields a
//! working setup: block cuts on channels 0/1, a bomb pulse, an obstacle gate,
//! a tempo note, and the performance controls.

use crate::error::{Error, Result};
use crate::message::Event;
use crate::processors::default_controls;
use saber_midi_io::ControlSpec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

/// File looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Case-insensitive substring of the output port name.
    pub midi_port: String,
    pub url: String,
    pub data_dir: PathBuf,
    /// Note type to channel for block cuts; `None` disables block-cut notes.
    pub block_channels: Option<BTreeMap<String, u8>>,
    pub pulse: Vec<PulseConfig>,
    pub gates: Vec<GateConfig>,
    pub tempo: Option<TempoConfig>,
    pub controls: Option<ControlsConfig>,
    pub archive: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            midi_port: "beatsaber".to_string(),
            url: "ws://127.0.0.1:6557/socket".to_string(),
            data_dir: PathBuf::from("sample_data"),
            block_channels: Some(default_block_channels()),
            pulse: vec![PulseConfig::default()],
            gates: vec![GateConfig::default()],
            tempo: Some(TempoConfig::default()),
            controls: Some(ControlsConfig::default()),
            archive: true,
        }
    }
}

pub fn default_block_channels() -> BTreeMap<String, u8> {
    BTreeMap::from([("NoteA".to_string(), 1), ("NoteB".to_string(), 0)])
}

/// Short note fired on any of `events`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PulseConfig {
    pub events: Vec<Event>,
    pub channel: u8,
    pub note: u8,
    pub velocity: u8,
    pub hold_ms: u64,
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            events: vec![Event::BombCut],
            channel: 2,
            note: 74,
            velocity: 127,
            hold_ms: 100,
        }
    }
}

/// Note held from any `start` event until any `stop` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub start: Vec<Event>,
    pub stop: Vec<Event>,
    pub channel: u8,
    pub note: u8,
    pub velocity: u8,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            start: vec![Event::ObstacleEnter],
            stop: vec![Event::ObstacleExit],
            channel: 3,
            note: 74,
            velocity: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TempoConfig {
    pub channel: u8,
    pub velocity: u8,
}

impl Default for TempoConfig {
    fn default() -> Self {
        Self {
            channel: 4,
            velocity: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    pub channel: u8,
    pub controls: Vec<ControlSpec>,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            channel: 0,
            controls: default_controls(),
        }
    }
}

impl BridgeConfig {
    /// Read `path`. A missing file yields the defaults; anything unreadable or
    /// unparseable is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(Error::Config {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })
            }
        };
        let config = serde_json::from_str(&text).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        info!(path = %path.display(), "loaded config");
        Ok(config)
    }
}
