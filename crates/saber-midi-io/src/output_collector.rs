//! In-memory MIDI sink that records everything sent to it.

use crate::message::MidiOutputMessage;
use crate::sink::MidiSink;
use parking_lot::Mutex;
use std::time::Duration;

/// A message as it reached the collector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedMessage {
    pub message: MidiOutputMessage,
    /// Hold requested via `send_after`, zero for immediate sends.
    pub delay: Duration,
}

/// Records output instead of driving a device. Delayed messages are recorded
/// at the moment they are scheduled, in call order.
#[derive(Debug, Default)]
pub struct MidiOutputCollector {
    messages: Mutex<Vec<CollectedMessage>>,
}

impl MidiOutputCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<MidiOutputMessage> {
        self.messages
            .lock()
            .iter()
            .map(|c| c.message.clone())
            .collect()
    }

    pub fn collected(&self) -> Vec<CollectedMessage> {
        self.messages.lock().clone()
    }

    pub fn drain_all(&self) -> Vec<MidiOutputMessage> {
        self.messages
            .lock()
            .drain(..)
            .map(|c| c.message)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }

    fn push(&self, message: MidiOutputMessage, delay: Duration) {
        self.messages.lock().push(CollectedMessage { message, delay });
    }
}

impl MidiSink for MidiOutputCollector {
    fn send(&self, message: &MidiOutputMessage) {
        self.push(message.clone(), Duration::ZERO);
    }

    fn send_after(&self, message: MidiOutputMessage, delay: Duration) {
        self.push(message, delay);
    }
}
