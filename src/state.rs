//! Session state derived from the message stream.

use crate::message::{Beatmap, Event, Performance, Status};
use serde_json::Value;

/// Last-known snapshots plus the map lifecycle flags.
///
/// Snapshots are sticky: each is replaced wholesale when a message carries it
/// and kept otherwise. `in_map` holds strictly between `songStart` and the next
/// abort event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub beatmap: Option<Beatmap>,
    pub performance: Option<Performance>,
    pub modifiers: Option<Value>,
    pub player_settings: Option<Value>,
    pub game: Option<Value>,
    pub in_map: bool,
    pub paused: bool,
    pub soft_failed: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every snapshot present in `status`, keep the rest.
    pub fn merge(&mut self, status: &Status) {
        replace_if_present(&mut self.beatmap, &status.beatmap);
        replace_if_present(&mut self.performance, &status.performance);
        replace_if_present(&mut self.modifiers, &status.modifiers);
        replace_if_present(&mut self.player_settings, &status.player_settings);
        replace_if_present(&mut self.game, &status.game);
    }

    /// Lifecycle flag changes for `event`. Runs after the processor chain.
    pub fn apply_transition(&mut self, event: &Event) {
        match event {
            Event::Finished | Event::Failed | Event::Menu => {
                self.in_map = false;
                self.paused = false;
            }
            Event::SongStart => {
                self.in_map = true;
                self.soft_failed = false;
            }
            Event::Pause => self.paused = true,
            Event::Resume => self.paused = false,
            Event::SoftFailed => self.soft_failed = true,
            _ => {}
        }
    }

    /// Tempo of the current map, if known and positive.
    pub fn song_bpm(&self) -> Option<f64> {
        self.beatmap
            .as_ref()
            .and_then(|b| b.song_bpm)
            .filter(|bpm| *bpm > 0.0)
    }
}

fn replace_if_present<T: Clone>(slot: &mut Option<T>, incoming: &Option<T>) {
    if let Some(value) = incoming {
        *slot = Some(value.clone());
    }
}
