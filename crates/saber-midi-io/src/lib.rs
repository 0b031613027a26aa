//! MIDI output subsystem for saber-midi.
//!
//! Provides raw output messages, a threaded hardware output device, the shared
//! note registry, and a change-detecting CC emitter.
//!
//! Feature gates: `midi-io` (hardware output via midir).

pub mod error;
pub use error::{Error, Result};

mod message;
pub use message::MidiOutputMessage;

mod sink;
pub use sink::MidiSink;

pub mod output_collector;
pub use output_collector::{CollectedMessage, MidiOutputCollector};

mod note;
pub use note::{NoteId, OutputNote};

mod registry;
pub use registry::NoteRegistry;

pub mod cc;
pub use cc::{quantize, CCNumber, ControlEmitter, ControlSpec};

#[cfg(feature = "midi-io")]
pub(crate) mod io;

#[cfg(feature = "midi-io")]
pub use io::{MidiOutputDevice, MidiOutputManager};
