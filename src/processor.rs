//! The unit of work in the dispatch chain.

use crate::error::ProcessorError;
use crate::message::Message;
use crate::state::SessionState;
use std::fmt;

/// What a processor did with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// Nothing to do with this message.
    Pass,
    /// Handled; later processors still run.
    Suppress,
    /// Handled; stop the chain here.
    Halt,
}

pub type ProcessResult = std::result::Result<Outcome, ProcessorError>;

/// A pluggable step of the monitor's ordered chain.
///
/// `Display` names the processor in logs.
pub trait Processor: fmt::Display + Send {
    fn process(&mut self, state: &SessionState, message: &Message) -> ProcessResult;

    /// Called once when the stream ends, after the final abort has been dispatched.
    fn shutdown(&mut self) -> Result<(), ProcessorError> {
        Ok(())
    }
}
