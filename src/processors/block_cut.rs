//! Notes generated from block cuts.

use super::{clamp_midi, BASE_PITCH};
use crate::error::ProcessorError;
use crate::message::{Event, Message};
use crate::processor::{Outcome, ProcessResult, Processor};
use crate::state::SessionState;
use saber_midi_io::{NoteRegistry, OutputNote};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Channel for block types without a mapping.
pub const UNMAPPED_CHANNEL: u8 = 15;

/// Pitch of a cut: two octaves spread over the pre-swing score range (0-85),
/// starting one octave below the base pitch.
pub fn cut_pitch(initial_score: f64) -> u8 {
    let offset = (initial_score * 24.0 / 85.0).round() as i64;
    clamp_midi(BASE_PITCH as i64 + offset - 12)
}

/// Velocity of a cut: cut accuracy (0-15) across the full velocity range.
pub fn cut_velocity(cut_distance_score: f64) -> u8 {
    clamp_midi((cut_distance_score * 127.0 / 15.0).round() as i64)
}

/// Starts a note on `noteCut` and stops it on the matching `noteFullyCut`.
pub struct BlockCutNoteGenerator {
    registry: Arc<NoteRegistry>,
    channels: BTreeMap<String, u8>,
}

impl BlockCutNoteGenerator {
    pub fn new(registry: Arc<NoteRegistry>, channels: BTreeMap<String, u8>) -> Self {
        Self { registry, channels }
    }

    pub fn channel_for(&self, note_type: Option<&str>) -> u8 {
        note_type
            .and_then(|t| self.channels.get(t))
            .copied()
            .unwrap_or(UNMAPPED_CHANNEL)
    }

    fn start_cut(&self, message: &Message) -> ProcessResult {
        let cut = message.note_cut()?;
        let initial_score = cut
            .initial_score
            .ok_or_else(|| ProcessorError::MissingPayload {
                event: message.event.to_string(),
                field: "noteCut.initialScore",
            })?;

        let pitch = cut_pitch(initial_score);
        let velocity = cut_velocity(cut.cut_distance_score.unwrap_or(0.0));
        let channel = self.channel_for(cut.note_type.as_deref());
        debug!(note_id = %cut.note_id, pitch, velocity, channel, "cut note");

        self.registry
            .add(OutputNote::new(cut.note_id, channel, pitch, velocity), true);
        Ok(Outcome::Suppress)
    }

    fn finish_cut(&self, message: &Message) -> ProcessResult {
        let cut = message.note_cut()?;
        // The source may drop or reorder cut events.
        if !self.registry.single_off(&cut.note_id) {
            debug!(note_id = %cut.note_id, "full cut without an active note");
        }
        Ok(Outcome::Suppress)
    }
}

impl Processor for BlockCutNoteGenerator {
    fn process(&mut self, _state: &SessionState, message: &Message) -> ProcessResult {
        match &message.event {
            event if event.is_abort() => {
                self.registry.all_off();
                Ok(Outcome::Suppress)
            }
            Event::NoteCut => self.start_cut(message),
            Event::NoteFullyCut => self.finish_cut(message),
            _ => Ok(Outcome::Pass),
        }
    }
}

impl fmt::Display for BlockCutNoteGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Block -> Note generator (")?;
        for (i, (note_type, channel)) in self.channels.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{note_type} on {channel}")?;
        }
        write!(f, ")")
    }
}
