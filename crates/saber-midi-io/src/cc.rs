//! Continuous control values sent as CC messages, with redundant sends suppressed.

use crate::message::MidiOutputMessage;
use crate::sink::MidiSink;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// CC number (0-127)
pub type CCNumber = u8;

/// One named control: where it goes and what it rests at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlSpec {
    pub name: String,
    pub cc: CCNumber,
    /// Normalized [0, 1] value sent when no map is active.
    pub resting: f64,
}

impl ControlSpec {
    pub fn new(name: impl Into<String>, cc: CCNumber, resting: f64) -> Self {
        Self {
            name: name.into(),
            cc,
            resting,
        }
    }
}

/// Map a normalized value onto the 7-bit CC range.
pub fn quantize(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    (value.clamp(0.0, 1.0) * 127.0).round() as u8
}

/// Remembers the last value sent per control and only sends changes.
///
/// The memory is a traffic filter, nothing more: [`reset`](Self::reset) always
/// sends every resting value.
pub struct ControlEmitter {
    sink: Arc<dyn MidiSink>,
    channel: u8,
    controls: Vec<ControlSpec>,
    last_sent: HashMap<String, u8>,
}

impl ControlEmitter {
    pub fn new(sink: Arc<dyn MidiSink>, channel: u8, controls: Vec<ControlSpec>) -> Self {
        Self {
            sink,
            channel,
            controls,
            last_sent: HashMap::new(),
        }
    }

    pub fn controls(&self) -> &[ControlSpec] {
        &self.controls
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// Last quantized value sent for `name`, `None` if unset.
    pub fn last_sent(&self, name: &str) -> Option<u8> {
        self.last_sent.get(name).copied()
    }

    /// Send `value` for the control `name` if it differs from the last one sent.
    ///
    /// `None` means "no value": if the control was set it falls back to its
    /// resting value once and becomes unset. Returns whether a message went out.
    pub fn emit(&mut self, name: &str, value: Option<f64>) -> bool {
        let Some(spec) = self.controls.iter().find(|c| c.name == name) else {
            debug!(control = name, "unknown control, ignored");
            return false;
        };
        let (cc, resting) = (spec.cc, spec.resting);

        match value {
            Some(v) => {
                let quantized = quantize(v);
                if self.last_sent.get(name) == Some(&quantized) {
                    return false;
                }
                self.send(cc, quantized);
                self.last_sent.insert(name.to_string(), quantized);
                true
            }
            None => {
                if self.last_sent.remove(name).is_none() {
                    return false;
                }
                self.send(cc, quantize(resting));
                true
            }
        }
    }

    /// Send every control's resting value unconditionally and remember it.
    pub fn reset(&mut self) {
        for spec in &self.controls {
            let quantized = quantize(spec.resting);
            self.sink.send(&MidiOutputMessage::control_change(
                self.channel,
                spec.cc,
                quantized,
            ));
            self.last_sent.insert(spec.name.clone(), quantized);
        }
    }

    fn send(&self, cc: CCNumber, value: u8) {
        self.sink
            .send(&MidiOutputMessage::control_change(self.channel, cc, value));
    }
}
