//! Port traits: the hexagonal boundary between the control pipeline and
//! the outside world.
//!
//! ```text
//!   SignalSource ──▶ ┌──────────────────────┐ ──▶ LineTransport
//!                    │ Session · ControlLoop │
//!                    └──────────────────────┘ ──▶ EventSink
//! ```
//!
//! Driven adapters (serial port, headset bridge, log output, config file)
//! implement these traits. The [`Session`](super::session::Session) and
//! [`ControlLoop`](super::control_loop::ControlLoop) consume them via
//! generics, so the core never touches a device directly.

use crate::config::ControllerConfig;
use crate::error::{SignalError, TransportError};

use super::channels::SampleFeed;

// ───────────────────────────────────────────────────────────────
// Transport port (domain → actuator controller)
// ───────────────────────────────────────────────────────────────

/// Line-oriented link to the actuator controller.
///
/// A single owner holds the transport for its whole open lifetime; the
/// trait therefore takes `&mut self` everywhere and needs no locking.
pub trait LineTransport {
    fn open(&mut self) -> Result<(), TransportError>;

    /// Write `line` followed by the transport's line terminator.
    fn write_line(&mut self, line: &str) -> Result<(), TransportError>;

    /// Copy whatever bytes are pending into `buf`, without blocking.
    /// Returns 0 when nothing is waiting.
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// Release the link. Must be safe to call when never opened or already closed.
    fn close(&mut self);

    fn is_open(&self) -> bool;
}

/// A transport that discards all writes and never has data.
/// Useful for dry runs without a controller attached.
#[derive(Debug, Default)]
pub struct NullTransport {
    open: bool,
}

impl LineTransport for NullTransport {
    fn open(&mut self) -> Result<(), TransportError> {
        self.open = true;
        Ok(())
    }

    fn write_line(&mut self, _line: &str) -> Result<(), TransportError> {
        if self.open {
            Ok(())
        } else {
            Err(TransportError::NotOpen)
        }
    }

    fn read_available(&mut self, _buf: &mut [u8]) -> Result<usize, TransportError> {
        Ok(0)
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

// ───────────────────────────────────────────────────────────────
// Signal source port (biosignal device → domain)
// ───────────────────────────────────────────────────────────────

/// Push-based producer of raw attention readings.
///
/// Pairing and raw protocol decoding live behind this trait; the core
/// only sees integers pushed into a [`SampleFeed`].
pub trait SignalSource {
    /// Connect to and validate the device. No samples flow yet.
    fn connect(&mut self) -> Result<(), SignalError>;

    /// Start pushing attention values into `feed`. May push from any thread.
    fn subscribe(&mut self, feed: SampleFeed) -> Result<(), SignalError>;

    /// Stop delivering samples. Idempotent.
    fn unsubscribe(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → operator)
// ───────────────────────────────────────────────────────────────

/// The core emits structured [`ControlEvent`](super::events::ControlEvent)s
/// through this port. Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::ControlEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists controller configuration.
///
/// Implementations MUST validate before persisting. Invalid ranges are
/// rejected with [`ConfigError::ValidationFailed`], not silently clamped.
pub trait ConfigPort {
    /// Returns [`ControllerConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<ControllerConfig, ConfigError>;

    fn save(&self, config: &ControllerConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug)]
pub enum ConfigError {
    /// Stored config failed to deserialize.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for ConfigError {}
