//! # Saber MIDI - game telemetry to MIDI bridge
//!
//! Listens to a live stream of gameplay events (block cuts, misses, obstacles,
//! score updates, map start/end) and turns them into MIDI notes and control
//! changes, while keeping a per-map archive of everything that happened.
//!
//! ## Architecture
//!
//! - **saber-midi-io** - MIDI output: device thread, note registry, CC emitter
//! - [`Monitor`] - merges state snapshots and runs the processor chain
//! - [`processors`] - block cuts, pulses, gates, tempo note, performance CCs, cleanup
//! - [`SongArchive`] - per-map message log and song index on disk
//! - [`source`] - websocket / replay readers and the host loop
//!
//! ## Quick Start
//!
//! ```ignore
//! use saber_midi::prelude::*;
//!
//! let config = BridgeConfig::load("config.json")?;
//! let sink = Arc::new(MidiOutputManager::connect_by_name(&config.midi_port)?);
//! let mut monitor = Monitor::builder(sink).config(config).build();
//!
//! monitor.dispatch(r#"{"event":"songStart","status":{"beatmap":{"songBPM":128}}}"#)?;
//! monitor.shutdown();
//! ```
//!
//! ## Feature Flags
//!
//! - `midi-hardware` (default) - hardware output through midir
//! - `websocket` (default) - live source over tungstenite

/// Re-export of saber-midi-io for direct access
pub use saber_midi_io as midi;

pub use saber_midi_io::{
    CollectedMessage, ControlEmitter, ControlSpec, MidiOutputCollector, MidiOutputMessage,
    MidiSink, NoteId, NoteRegistry, OutputNote,
};

#[cfg(feature = "midi-hardware")]
pub use saber_midi_io::{MidiOutputDevice, MidiOutputManager};

pub mod archive;
pub mod config;
pub mod error;
pub mod message;
pub mod processor;
pub mod processors;
pub mod source;
pub mod state;

mod builder;
mod monitor;

pub use archive::{map_hash, ArchiveRecord, SongArchive};
pub use builder::MonitorBuilder;
pub use config::BridgeConfig;
pub use error::{Error, ProcessorError, Result};
pub use message::{Beatmap, Event, Message, NoteCut, Performance, Status};
pub use monitor::{DispatchReport, Monitor};
pub use processor::{Outcome, ProcessResult, Processor};
pub use source::{RunSummary, Source};
pub use state::SessionState;

/// Convenience prelude for common imports
pub mod prelude {
    pub use crate::{BridgeConfig, Monitor, MonitorBuilder};

    pub use crate::{Event, Message, SessionState};
    pub use crate::{Outcome, ProcessResult, Processor};

    pub use crate::{MidiOutputCollector, MidiSink, NoteRegistry, OutputNote};

    #[cfg(feature = "midi-hardware")]
    pub use crate::MidiOutputManager;

    pub use std::sync::Arc;
}
