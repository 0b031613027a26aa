//! Score state mapped onto continuous controllers.

use crate::message::{Event, Message, Performance};
use crate::processor::{Outcome, ProcessResult, Processor};
use crate::state::SessionState;
use saber_midi_io::{ControlEmitter, ControlSpec};
use std::fmt;

pub const SCORE: &str = "score";
pub const HEALTH: &str = "health";
pub const SOFT_FAIL: &str = "softfail";
pub const FULL_COMBO: &str = "fullcombo";
pub const BPM: &str = "bpm";
pub const COMBO: &str = "combo";
pub const PROGRESS: &str = "progress";

/// The game reports the current multiplier only; its ceiling is fixed.
const DEFAULT_MAX_MULTIPLIER: u32 = 8;

pub fn default_controls() -> Vec<ControlSpec> {
    vec![
        ControlSpec::new(SCORE, 0, 1.0),
        ControlSpec::new(HEALTH, 1, 1.0),
        ControlSpec::new(SOFT_FAIL, 2, 0.0),
        ControlSpec::new(FULL_COMBO, 3, 1.0),
        ControlSpec::new(BPM, 4, 0.5),
        ControlSpec::new(COMBO, 5, 0.0),
        ControlSpec::new(PROGRESS, 6, 0.0),
    ]
}

/// Sends normalized performance values whenever a message carries a
/// performance snapshot, and resting values on abort.
pub struct PerformanceControls {
    emitter: ControlEmitter,
}

impl PerformanceControls {
    pub fn new(emitter: ControlEmitter) -> Self {
        Self { emitter }
    }

    pub fn emitter(&self) -> &ControlEmitter {
        &self.emitter
    }

    /// Normalized value per control; `None` means "no value". The session's
    /// soft fail belongs to the previous map while `event` is `songStart`.
    pub fn control_values(
        perf: &Performance,
        state: &SessionState,
        event: &Event,
    ) -> Vec<(&'static str, Option<f64>)> {
        let score = perf.score.map(|score| match perf.current_max_score {
            Some(max) if max > 0 => score as f64 / max as f64,
            _ => 1.0,
        });
        let combo = perf.multiplier.map(|m| {
            let max = perf
                .max_multiplier
                .filter(|m| *m > 0)
                .unwrap_or(DEFAULT_MAX_MULTIPLIER);
            m as f64 / max as f64
        });
        let notes_count = state
            .beatmap
            .as_ref()
            .and_then(|b| b.notes_count)
            .filter(|n| *n > 0);
        let progress = match (perf.passed_notes, notes_count) {
            (Some(passed), Some(total)) => Some(passed as f64 / total as f64),
            _ => None,
        };
        let carried = state.soft_failed && *event != Event::SongStart;
        let soft_failed = perf.soft_failed.unwrap_or(false) || carried;
        let full_combo = match (perf.combo, perf.passed_notes) {
            (Some(combo), Some(passed)) => Some(if combo == passed { 1.0 } else { 0.0 }),
            _ => None,
        };
        let bpm = state
            .song_bpm()
            .map(|bpm| 0.5 + (bpm / 120.0).log2() / 10.0);

        vec![
            (SCORE, score),
            (HEALTH, perf.battery_energy),
            (SOFT_FAIL, Some(if soft_failed { 1.0 } else { 0.0 })),
            (FULL_COMBO, full_combo),
            (BPM, bpm),
            (COMBO, combo),
            (PROGRESS, progress),
        ]
    }
}

impl Processor for PerformanceControls {
    fn process(&mut self, state: &SessionState, message: &Message) -> ProcessResult {
        if message.event.is_abort() {
            self.emitter.reset();
            return Ok(Outcome::Suppress);
        }
        let Some(perf) = &message.status.performance else {
            return Ok(Outcome::Pass);
        };
        for (name, value) in Self::control_values(perf, state, &message.event) {
            self.emitter.emit(name, value);
        }
        Ok(Outcome::Suppress)
    }
}

impl fmt::Display for PerformanceControls {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Performance -> CC on channel {} ({} controls)",
            self.emitter.channel(),
            self.emitter.controls().len()
        )
    }
}
