//! A note held for the whole map, pitched by the map's tempo.

use super::{clamp_midi, BASE_PITCH};
use crate::message::{Event, Message};
use crate::processor::{Outcome, ProcessResult, Processor};
use crate::state::SessionState;
use saber_midi_io::{NoteId, NoteRegistry, OutputNote};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Tempo that maps onto the base pitch.
pub const REFERENCE_BPM: f64 = 120.0;

/// Base pitch shifted by one octave per doubling of tempo over 120 BPM.
pub fn tempo_pitch(bpm: f64) -> u8 {
    let offset = 12.0 * (bpm / REFERENCE_BPM).log2();
    clamp_midi((BASE_PITCH as f64 + offset).round() as i64)
}

pub struct TempoNote {
    registry: Arc<NoteRegistry>,
    id: NoteId,
    channel: u8,
    velocity: u8,
}

impl TempoNote {
    pub fn new(registry: Arc<NoteRegistry>, channel: u8, velocity: u8) -> Self {
        Self {
            registry,
            id: NoteId::from("tempo"),
            channel,
            velocity,
        }
    }
}

impl Processor for TempoNote {
    fn process(&mut self, state: &SessionState, message: &Message) -> ProcessResult {
        match &message.event {
            Event::SongStart => {
                self.registry.single_off(&self.id);
                let Some(bpm) = state.song_bpm() else {
                    debug!("song started without a tempo");
                    return Ok(Outcome::Pass);
                };
                let pitch = tempo_pitch(bpm);
                debug!(bpm, pitch, "tempo note");
                self.registry.add(
                    OutputNote::new(self.id.clone(), self.channel, pitch, self.velocity),
                    true,
                );
                Ok(Outcome::Suppress)
            }
            event if event.is_abort() => {
                self.registry.single_off(&self.id);
                Ok(Outcome::Suppress)
            }
            _ => Ok(Outcome::Pass),
        }
    }
}

impl fmt::Display for TempoNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tempo note on channel {}", self.channel)
    }
}
