//! Builder for assembling a `Monitor` and its processor chain.

use crate::archive::SongArchive;
use crate::config::BridgeConfig;
use crate::monitor::Monitor;
use crate::processor::Processor;
use crate::processors::{
    BlockCutNoteGenerator, Cleanup, Gate, PerformanceControls, PulseTrigger, TempoNote,
};
use saber_midi_io::{ControlEmitter, MidiSink, NoteRegistry};
use std::sync::Arc;
use std::time::Duration;

type ProcessorFactory = Box<dyn FnOnce(&Arc<NoteRegistry>) -> Box<dyn Processor>>;

/// Chain order is fixed: block cuts, pulses, gates, tempo, performance
/// controls, archive, any custom processors, and cleanup last so it sees every
/// abort after the others have released their own notes.
///
/// # Example
///
/// ```ignore
/// use saber_midi::prelude::*;
///
/// let sink = Arc::new(MidiOutputManager::connect_by_name("beatsaber")?);
/// let mut monitor = Monitor::builder(sink)
///     .config(BridgeConfig::load("config.json")?)
///     .build();
/// ```
pub struct MonitorBuilder {
    sink: Arc<dyn MidiSink>,
    config: BridgeConfig,
    archive: bool,
    custom: Vec<ProcessorFactory>,
}

impl MonitorBuilder {
    pub fn new(sink: Arc<dyn MidiSink>) -> Self {
        Self {
            sink,
            config: BridgeConfig::default(),
            archive: true,
            custom: Vec::new(),
        }
    }

    pub fn config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    /// Skip the archive regardless of config. Default: follow config.
    pub fn without_archive(mut self) -> Self {
        self.archive = false;
        self
    }

    /// Add a processor built against the shared registry. Runs before cleanup.
    pub fn custom<F>(mut self, factory: F) -> Self
    where
        F: FnOnce(&Arc<NoteRegistry>) -> Box<dyn Processor> + 'static,
    {
        self.custom.push(Box::new(factory));
        self
    }

    pub fn build(self) -> Monitor {
        let config = self.config;
        let mut monitor = Monitor::new(self.sink.clone());
        let registry = monitor.registry().clone();

        if let Some(channels) = config.block_channels {
            monitor.register(Box::new(BlockCutNoteGenerator::new(
                registry.clone(),
                channels,
            )));
        }

        for pulse in config.pulse {
            monitor.register(Box::new(PulseTrigger::new(
                self.sink.clone(),
                pulse.events,
                pulse.channel,
                pulse.note,
                pulse.velocity,
                Duration::from_millis(pulse.hold_ms),
            )));
        }

        for gate in config.gates {
            monitor.register(Box::new(Gate::new(
                registry.clone(),
                gate.start,
                gate.stop,
                gate.channel,
                gate.note,
                gate.velocity,
            )));
        }

        if let Some(tempo) = config.tempo {
            monitor.register(Box::new(TempoNote::new(
                registry.clone(),
                tempo.channel,
                tempo.velocity,
            )));
        }

        if let Some(controls) = config.controls {
            let emitter = ControlEmitter::new(self.sink.clone(), controls.channel, controls.controls);
            monitor.register(Box::new(PerformanceControls::new(emitter)));
        }

        if self.archive && config.archive {
            monitor.register(Box::new(SongArchive::open(&config.data_dir)));
        }

        for factory in self.custom {
            monitor.register(factory(&registry));
        }

        monitor.register(Box::new(Cleanup::new(registry)));
        monitor
    }
}
