//! Short fire-and-forget notes triggered by events.

use crate::message::{Event, Message};
use crate::processor::{Outcome, ProcessResult, Processor};
use crate::state::SessionState;
use saber_midi_io::{MidiOutputMessage, MidiSink};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Sends a note on each trigger event and its note off after `hold`.
///
/// Pulses are never tracked as active notes; the stop command is handed to the
/// sink already scheduled.
pub struct PulseTrigger {
    sink: Arc<dyn MidiSink>,
    triggers: Vec<Event>,
    channel: u8,
    note: u8,
    velocity: u8,
    hold: Duration,
}

impl PulseTrigger {
    pub fn new(
        sink: Arc<dyn MidiSink>,
        triggers: Vec<Event>,
        channel: u8,
        note: u8,
        velocity: u8,
        hold: Duration,
    ) -> Self {
        Self {
            sink,
            triggers,
            channel,
            note,
            velocity,
            hold,
        }
    }
}

impl Processor for PulseTrigger {
    fn process(&mut self, _state: &SessionState, message: &Message) -> ProcessResult {
        if !self.triggers.contains(&message.event) {
            return Ok(Outcome::Pass);
        }
        self.sink.send(&MidiOutputMessage::note_on(
            self.channel,
            self.note,
            self.velocity,
        ));
        self.sink.send_after(
            MidiOutputMessage::note_off(self.channel, self.note, self.velocity),
            self.hold,
        );
        Ok(Outcome::Suppress)
    }
}

impl fmt::Display for PulseTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.triggers.iter().map(Event::as_str).collect();
        write!(
            f,
            "Pulse note {} on channel {} for [{}]",
            self.note,
            self.channel,
            names.join(", ")
        )
    }
}
