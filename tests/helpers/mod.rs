//! Test helpers and fixtures for saber-midi integration tests
//!
//! Every bridge records into a `MidiOutputCollector`, so no MIDI hardware is
//! touched. Archive-backed bridges write into a `tempfile::TempDir`.

#![allow(dead_code)]

use saber_midi::prelude::*;
use saber_midi::{DispatchReport, MidiOutputMessage, SongArchive};
use serde_json::json;
use std::collections::BTreeMap;
use tempfile::TempDir;

/// Monitor plus the sink it writes to.
pub struct Bridge {
    pub out: Arc<MidiOutputCollector>,
    pub monitor: Monitor,
}

impl Bridge {
    /// Dispatch a message that is expected to parse.
    pub fn send(&mut self, message: serde_json::Value) -> DispatchReport {
        self.monitor
            .dispatch(&message.to_string())
            .expect("message should parse")
    }

    pub fn registry(&self) -> &Arc<NoteRegistry> {
        self.monitor.registry()
    }

    /// Last value sent per CC number.
    pub fn controls(&self) -> BTreeMap<u8, u8> {
        self.out
            .messages()
            .iter()
            .filter_map(MidiOutputMessage::control)
            .collect()
    }
}

/// Default chain without the archive.
pub fn bridge() -> Bridge {
    bridge_with(BridgeConfig::default())
}

pub fn bridge_with(config: BridgeConfig) -> Bridge {
    let out = Arc::new(MidiOutputCollector::new());
    let monitor = Monitor::builder(out.clone())
        .config(config)
        .without_archive()
        .build();
    Bridge { out, monitor }
}

/// Bridge whose only processor is an archive in `dir`.
pub fn archive_bridge(dir: &TempDir, session_file: &str) -> Bridge {
    let out = Arc::new(MidiOutputCollector::new());
    let mut monitor = Monitor::new(out.clone());
    monitor.register(Box::new(SongArchive::with_paths(
        dir.path().join(saber_midi::archive::SONGS_FILE),
        dir.path().join(session_file),
    )));
    Bridge { out, monitor }
}

pub fn event(name: &str) -> serde_json::Value {
    json!({ "event": name, "status": {} })
}

pub fn song_start(level_id: &str, song_name: &str, bpm: f64) -> serde_json::Value {
    json!({
        "event": "songStart",
        "time": 1000,
        "status": {
            "beatmap": {
                "levelId": level_id,
                "songName": song_name,
                "difficulty": "Expert",
                "characteristic": "Standard",
                "songBPM": bpm,
                "notesCount": 100
            },
            "performance": {
                "score": 0,
                "currentMaxScore": 0,
                "multiplier": 1,
                "passedNotes": 0,
                "combo": 0,
                "batteryEnergy": 0.5,
                "softFailed": false
            },
            "mod": { "noFail": false },
            "playerSettings": { "leftHanded": false },
            "game": { "pluginVersion": "1.0" }
        }
    })
}

pub fn note_cut(id: &str, note_type: &str, initial: f64, distance: f64) -> serde_json::Value {
    json!({
        "event": "noteCut",
        "noteCut": {
            "noteID": id,
            "noteType": note_type,
            "initialScore": initial,
            "cutDistanceScore": distance
        }
    })
}

pub fn note_fully_cut(id: &str) -> serde_json::Value {
    json!({ "event": "noteFullyCut", "noteCut": { "noteID": id } })
}

pub fn score_changed(score: u64, max: u64, combo: u64, passed: u64) -> serde_json::Value {
    json!({
        "event": "scoreChanged",
        "status": {
            "performance": {
                "score": score,
                "currentMaxScore": max,
                "multiplier": 2,
                "passedNotes": passed,
                "combo": combo,
                "batteryEnergy": 0.75,
                "softFailed": false
            }
        }
    })
}
