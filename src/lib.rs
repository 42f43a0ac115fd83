//! Attention-driven actuator controller library.
//!
//! Turns a stream of 0–100 attention readings into LED brightness, servo
//! angle or stepper position commands on a serial line, and relays the
//! controller's answers back to the operator. Device access is confined
//! to [`adapters`]; everything else is testable on its own.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod control;
pub mod error;
pub mod protocol;

pub use app::session::{CancelHandle, Session, SessionReport};
pub use control::mapping::ActuatorKind;
pub use error::{Error, Result};
