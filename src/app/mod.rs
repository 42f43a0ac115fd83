//! Application core: the control pipeline, zero device I/O.
//!
//! The session lifecycle and per-sample control loop live here. All
//! interaction with the headset, the serial link and the operator goes
//! through **port traits** defined in [`ports`], keeping this layer fully
//! testable without real hardware.

pub mod channels;
pub mod control_loop;
pub mod events;
pub mod ports;
pub mod session;
