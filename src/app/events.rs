//! Outbound control events.
//!
//! The [`ControlLoop`](super::control_loop::ControlLoop) and
//! [`Session`](super::session::Session) emit these through the
//! [`EventSink`](super::ports::EventSink) port. This is a reporting side
//! channel; nothing in the control path depends on what a sink does.

use crate::control::mapping::ActuatorKind;
use crate::error::Error;

use super::control_loop::LoopState;

/// Structured events emitted by the control core.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlEvent {
    /// The session armed the loop and is waiting for samples.
    Started { kind: ActuatorKind, threshold: u8 },

    /// The loop moved between lifecycle states.
    StateChanged { from: LoopState, to: LoopState },

    /// A sample passed the change filter and will be sent.
    SampleAccepted {
        kind: ActuatorKind,
        attention: u8,
        derived: u16,
    },

    /// A sample was observed but sat within the threshold.
    SampleFiltered { attention: u8, last_emitted: u8 },

    /// A command line was written to the transport.
    CommandSent { line: String },

    /// One trimmed response line from the controller.
    Response { line: String, acknowledged: bool },

    /// The response overflowed the buffer; `discarded` bytes were dropped.
    ResponseTruncated { kept: usize, discarded: usize },

    /// A per-sample error. The loop keeps running.
    Fault(Error),
}
