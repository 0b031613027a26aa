//! Monitor that coordinates session state and the processor chain.

use crate::builder::MonitorBuilder;
use crate::error::Result;
use crate::message::{Event, Message};
use crate::processor::{Outcome, Processor};
use crate::state::SessionState;
use saber_midi_io::{MidiSink, NoteRegistry};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How the chain handled one message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Index of the processor that stopped the chain.
    pub halted_by: Option<usize>,
    /// At least one processor reported the message as handled.
    pub suppressed: bool,
    /// Processors that failed on this message.
    pub failures: usize,
}

/// Owns the session state, the shared note registry, and the ordered chain.
///
/// For each message, in order: merge snapshots, run the chain left to right,
/// then apply the lifecycle transitions. Processors therefore see the flags as
/// they were before the message, e.g. `in_map` is still set while `finished`
/// is being handled.
///
/// `dispatch` takes `&mut self`; callers delivering messages from another
/// thread must funnel them through a single consumer.
///
/// # Example
///
/// ```ignore
/// let mut monitor = Monitor::builder(sink).config(config).build();
/// monitor.dispatch(r#"{"event":"songStart","status":{}}"#)?;
/// monitor.shutdown();
/// ```
pub struct Monitor {
    state: SessionState,
    registry: Arc<NoteRegistry>,
    processors: Vec<Box<dyn Processor>>,
}

impl Monitor {
    /// An empty chain over a fresh registry on `sink`.
    pub fn new(sink: Arc<dyn MidiSink>) -> Self {
        Self {
            state: SessionState::new(),
            registry: Arc::new(NoteRegistry::new(sink)),
            processors: Vec::new(),
        }
    }

    pub fn builder(sink: Arc<dyn MidiSink>) -> MonitorBuilder {
        MonitorBuilder::new(sink)
    }

    /// Append a processor to the end of the chain.
    pub fn register(&mut self, processor: Box<dyn Processor>) -> &mut Self {
        info!(processor = %processor, position = self.processors.len(), "registered processor");
        self.processors.push(processor);
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Handle for processors that emit notes.
    pub fn registry(&self) -> &Arc<NoteRegistry> {
        &self.registry
    }

    pub fn processor_names(&self) -> Vec<String> {
        self.processors.iter().map(|p| p.to_string()).collect()
    }

    /// Parse and dispatch one text frame. A malformed frame is rejected
    /// before any state changes.
    pub fn dispatch(&mut self, text: &str) -> Result<DispatchReport> {
        let message = Message::parse(text)?;
        Ok(self.dispatch_message(&message))
    }

    pub fn dispatch_message(&mut self, message: &Message) -> DispatchReport {
        debug!(event = %message.event, "message received");
        self.state.merge(&message.status);

        if message.event == Event::Hello {
            for processor in &self.processors {
                info!(processor = %processor, "says hello");
            }
        }

        let report = self.run_chain(message);
        self.state.apply_transition(&message.event);
        report
    }

    fn run_chain(&mut self, message: &Message) -> DispatchReport {
        let mut report = DispatchReport::default();
        let state = &self.state;

        for (index, processor) in self.processors.iter_mut().enumerate() {
            let result = panic::catch_unwind(AssertUnwindSafe(|| processor.process(state, message)));
            match result {
                Ok(Ok(Outcome::Pass)) => {}
                Ok(Ok(Outcome::Suppress)) => report.suppressed = true,
                Ok(Ok(Outcome::Halt)) => {
                    debug!(processor = %processor, event = %message.event, "chain halted");
                    report.suppressed = true;
                    report.halted_by = Some(index);
                    break;
                }
                Ok(Err(e)) => {
                    warn!(processor = %processor, event = %message.event, error = %e, "processor failed");
                    report.failures += 1;
                }
                Err(payload) => {
                    warn!(
                        processor = %processor,
                        event = %message.event,
                        panic = panic_message(&*payload),
                        "processor panicked"
                    );
                    report.failures += 1;
                }
            }
        }
        report
    }

    /// End of stream: dispatch a synthetic `menu` so every processor runs its
    /// abort handling, then give each a final `shutdown`.
    pub fn shutdown(&mut self) -> DispatchReport {
        info!("stream ended, forcing abort");
        let report = self.dispatch_message(&Message::bare(Event::Menu));
        for processor in &mut self.processors {
            if let Err(e) = processor.shutdown() {
                warn!(processor = %processor, error = %e, "shutdown failed");
            }
        }
        let leftover = self.registry.len();
        if leftover > 0 {
            warn!(leftover, ids = ?self.registry.ids(), "notes still active after shutdown");
        }
        report
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}
