//! Concrete processors.
//!
//! - `BlockCutNoteGenerator`: one note per cut block, stopped when the cut completes
//! - `PulseTrigger`: short fire-and-forget note on chosen events
//! - `Gate`: note held between a start event and a stop event
//! - `TempoNote`: note pitched by the map tempo, held for the whole map
//! - `PerformanceControls`: score/health/combo state as CC values
//! - `Cleanup`: registry-wide all-notes-off on abort

mod block_cut;
mod cleanup;
mod gate;
mod performance;
mod pulse;
mod tempo;

pub use block_cut::{cut_pitch, cut_velocity, BlockCutNoteGenerator, UNMAPPED_CHANNEL};
pub use cleanup::Cleanup;
pub use gate::Gate;
pub use performance::{default_controls, PerformanceControls};
pub use pulse::PulseTrigger;
pub use tempo::{tempo_pitch, TempoNote};

/// Pitch every note-generating processor is centred on.
pub const BASE_PITCH: i32 = 74;

pub(crate) fn clamp_midi(value: i64) -> u8 {
    value.clamp(0, 127) as u8
}
