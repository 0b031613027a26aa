//! A note sustained between a start event and a stop event.

use crate::message::{Event, Message};
use crate::processor::{Outcome, ProcessResult, Processor};
use crate::state::SessionState;
use saber_midi_io::{NoteId, NoteRegistry, OutputNote};
use std::fmt;
use std::sync::Arc;

/// Holds one note from any of `start` to any of `stop`.
///
/// The note is registered under an id derived from the event pair, so a
/// repeated start restarts the note instead of stacking a second one.
pub struct Gate {
    registry: Arc<NoteRegistry>,
    start: Vec<Event>,
    stop: Vec<Event>,
    id: NoteId,
    channel: u8,
    note: u8,
    velocity: u8,
}

impl Gate {
    pub fn new(
        registry: Arc<NoteRegistry>,
        start: Vec<Event>,
        stop: Vec<Event>,
        channel: u8,
        note: u8,
        velocity: u8,
    ) -> Self {
        let id = gate_id(&start, &stop);
        Self {
            registry,
            start,
            stop,
            id,
            channel,
            note,
            velocity,
        }
    }

    pub fn id(&self) -> &NoteId {
        &self.id
    }
}

fn gate_id(start: &[Event], stop: &[Event]) -> NoteId {
    let join = |events: &[Event]| {
        events
            .iter()
            .map(Event::as_str)
            .collect::<Vec<_>>()
            .join("+")
    };
    NoteId::new(format!("gate:{}->{}", join(start), join(stop)))
}

impl Processor for Gate {
    fn process(&mut self, _state: &SessionState, message: &Message) -> ProcessResult {
        let event = &message.event;
        if self.stop.contains(event) {
            self.registry.single_off(&self.id);
            return Ok(Outcome::Suppress);
        }
        if self.start.contains(event) {
            // Stop-before-start keeps one entry per gate.
            self.registry.single_off(&self.id);
            self.registry.add(
                OutputNote::new(self.id.clone(), self.channel, self.note, self.velocity),
                true,
            );
            return Ok(Outcome::Suppress);
        }
        if event.is_abort() {
            self.registry.single_off(&self.id);
            return Ok(Outcome::Suppress);
        }
        Ok(Outcome::Pass)
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Gate {} (note {} on channel {})",
            self.id, self.note, self.channel
        )
    }
}
