//! Raw channel-voice messages sent to the output device.

/// MIDI message to send to an output device.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MidiOutputMessage {
    /// Raw MIDI bytes to send
    pub bytes: Vec<u8>,
}

impl MidiOutputMessage {
    pub fn control_change(channel: u8, cc_number: u8, value: u8) -> Self {
        let channel = channel.min(15); // MIDI channels are 0-15
        let status = 0xB0 | channel;
        Self {
            bytes: vec![status, cc_number & 0x7F, value & 0x7F],
        }
    }

    pub fn note_on(channel: u8, note: u8, velocity: u8) -> Self {
        let channel = channel.min(15);
        let status = 0x90 | channel;
        Self {
            bytes: vec![status, note & 0x7F, velocity & 0x7F],
        }
    }

    pub fn note_off(channel: u8, note: u8, velocity: u8) -> Self {
        let channel = channel.min(15);
        let status = 0x80 | channel;
        Self {
            bytes: vec![status, note & 0x7F, velocity & 0x7F],
        }
    }

    fn status_kind(&self) -> Option<u8> {
        self.bytes.first().map(|b| b & 0xF0)
    }

    pub fn channel(&self) -> Option<u8> {
        self.bytes.first().map(|b| b & 0x0F)
    }

    pub fn is_note_on(&self) -> bool {
        self.status_kind() == Some(0x90)
    }

    pub fn is_note_off(&self) -> bool {
        self.status_kind() == Some(0x80)
    }

    pub fn is_control_change(&self) -> bool {
        self.status_kind() == Some(0xB0)
    }

    /// Note number for note on/off messages.
    pub fn note(&self) -> Option<u8> {
        if self.is_note_on() || self.is_note_off() {
            self.bytes.get(1).copied()
        } else {
            None
        }
    }

    /// Velocity for note on/off messages.
    pub fn velocity(&self) -> Option<u8> {
        if self.is_note_on() || self.is_note_off() {
            self.bytes.get(2).copied()
        } else {
            None
        }
    }

    /// `(cc_number, value)` for control change messages.
    pub fn control(&self) -> Option<(u8, u8)> {
        if self.is_control_change() {
            Some((*self.bytes.get(1)?, *self.bytes.get(2)?))
        } else {
            None
        }
    }
}
