//! Serial wire protocol spoken with the actuator controller.

pub mod codec;
