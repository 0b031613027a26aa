//! The seam between note/control producers and whatever carries the bytes out.

use crate::message::MidiOutputMessage;
use std::sync::Arc;
use std::time::Duration;

/// Destination for MIDI output commands.
///
/// Implementations must not block the caller for longer than it takes to
/// enqueue the message.
pub trait MidiSink: Send + Sync {
    fn send(&self, message: &MidiOutputMessage);

    /// Send `message` once `delay` has elapsed, without blocking the caller.
    fn send_after(&self, message: MidiOutputMessage, delay: Duration);
}

impl<S: MidiSink + ?Sized> MidiSink for Arc<S> {
    fn send(&self, message: &MidiOutputMessage) {
        (**self).send(message)
    }

    fn send_after(&self, message: MidiOutputMessage, delay: Duration) {
        (**self).send_after(message, delay)
    }
}
