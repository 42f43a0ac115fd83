//! Unified error types for the attention controller.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! control loop's error handling uniform. All variants are `Copy` so they
//! can be counted, logged and forwarded to the event sink without
//! allocation.
//!
//! Only [`Error::SignalSource`] (and a transport that cannot be opened)
//! aborts a session. Everything else is scoped to a single sample.

use core::fmt;

use crate::app::ports::ConfigError;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the controller funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Attention value outside 0–100. The sample is dropped.
    InvalidSample(i32),
    /// A mapped command value fell outside its actuator range.
    InvalidCommand(u16),
    /// Serial link failure.
    Transport(TransportError),
    /// The biosignal source could not be brought up.
    SignalSource(SignalError),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSample(v) => write!(f, "invalid sample: {v} outside 0-100"),
            Self::InvalidCommand(v) => write!(f, "invalid command: derived value {v} out of range"),
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::SignalSource(e) => write!(f, "signal source: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// The port could not be opened (missing device, busy, permissions).
    OpenFailed,
    /// Write or read attempted before `open` or after `close`.
    NotOpen,
    WriteFailed,
    ReadFailed,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenFailed => write!(f, "open failed"),
            Self::NotOpen => write!(f, "port not open"),
            Self::WriteFailed => write!(f, "write failed"),
            Self::ReadFailed => write!(f, "read failed"),
        }
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// Signal source errors
// ---------------------------------------------------------------------------

/// Startup failures of the biosignal source. Both are fatal to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalError {
    /// No headset found / connection refused.
    Unavailable,
    /// A device answered but failed validation.
    ValidationFailed,
}

impl fmt::Display for SignalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => write!(f, "signal source unavailable"),
            Self::ValidationFailed => write!(f, "device validation failed"),
        }
    }
}

impl From<SignalError> for Error {
    fn from(e: SignalError) -> Self {
        Self::SignalSource(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
            ConfigError::Corrupted => Self::Config("config corrupted"),
            ConfigError::IoError => Self::Config("config I/O error"),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
