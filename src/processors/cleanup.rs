use crate::message::{Event, Message};
use crate::processor::{Outcome, ProcessResult, Processor};
use crate::state::SessionState;
use saber_midi_io::NoteRegistry;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Silences the whole registry on abort. Register it last.
pub struct Cleanup {
    registry: Arc<NoteRegistry>,
}

impl Cleanup {
    pub fn new(registry: Arc<NoteRegistry>) -> Self {
        Self { registry }
    }
}

impl Processor for Cleanup {
    fn process(&mut self, _state: &SessionState, message: &Message) -> ProcessResult {
        match &message.event {
            Event::Hello => Ok(Outcome::Suppress),
            event if event.is_abort() => {
                let stopped = self.registry.all_off();
                if stopped > 0 {
                    debug!(stopped, "cleanup stopped leftover notes");
                }
                Ok(Outcome::Suppress)
            }
            _ => Ok(Outcome::Pass),
        }
    }
}

impl fmt::Display for Cleanup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Cleanup (all notes off on abort)")
    }
}
