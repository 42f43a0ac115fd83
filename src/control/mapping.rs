//! Attention → actuator unit mapping.
//!
//! Each [`ActuatorKind`] fixes a scale factor. Scaling is done in integer
//! tenths so the result is an exact floor:
//!
//! | kind         | factor | range     |
//! |--------------|--------|-----------|
//! | Brightness   | ×1     | 0–100 %   |
//! | ServoAngle   | ×1.8   | 0–180 °   |
//! | StepperAngle | ×3.6   | 0–360 °   |
//!
//! Brightness stays a percentage; the controller firmware does the
//! 0–100 → 0–255 PWM scaling.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Upper bound of a valid attention reading.
pub const ATTENTION_MAX: u8 = 100;

/// The physical actuator driven by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActuatorKind {
    Brightness,
    ServoAngle,
    StepperAngle,
}

impl ActuatorKind {
    /// Scale factor in tenths (18 = ×1.8).
    const fn factor_tenths(self) -> u16 {
        match self {
            Self::Brightness => 10,
            Self::ServoAngle => 18,
            Self::StepperAngle => 36,
        }
    }

    /// Largest derived value this kind can produce.
    pub const fn max_value(self) -> u16 {
        ATTENTION_MAX as u16 * self.factor_tenths() / 10
    }

    /// Display unit for progress output.
    pub const fn unit(self) -> &'static str {
        match self {
            Self::Brightness => "%",
            Self::ServoAngle | Self::StepperAngle => "\u{00b0}",
        }
    }

    /// Map a validated sample to this actuator's units.
    pub const fn map(self, sample: AttentionSample) -> u16 {
        sample.0 as u16 * self.factor_tenths() / 10
    }
}

impl fmt::Display for ActuatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Brightness => write!(f, "brightness"),
            Self::ServoAngle => write!(f, "servo"),
            Self::StepperAngle => write!(f, "stepper"),
        }
    }
}

/// Map a raw attention value, validating it first.
pub fn map(kind: ActuatorKind, attention: i32) -> Result<u16> {
    AttentionSample::new(attention).map(|s| kind.map(s))
}

// ---------------------------------------------------------------------------
// AttentionSample
// ---------------------------------------------------------------------------

/// A single validated attention reading in 0–100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct AttentionSample(u8);

impl AttentionSample {
    pub fn new(raw: i32) -> Result<Self> {
        match u8::try_from(raw) {
            Ok(v) if v <= ATTENTION_MAX => Ok(Self(v)),
            _ => Err(Error::InvalidSample(raw)),
        }
    }

    pub const fn value(self) -> u8 {
        self.0
    }
}

// ---------------------------------------------------------------------------
// ActuatorCommand
// ---------------------------------------------------------------------------

/// Command derived from one accepted sample.
///
/// Only constructible through [`ActuatorCommand::from_sample`], so every
/// command on the wire is backed by a real sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuatorCommand {
    kind: ActuatorKind,
    raw_attention: u8,
    derived_value: u16,
    auxiliary: u8,
}

impl ActuatorCommand {
    pub fn from_sample(kind: ActuatorKind, sample: AttentionSample) -> Self {
        Self {
            kind,
            raw_attention: sample.value(),
            derived_value: kind.map(sample),
            auxiliary: 0,
        }
    }

    pub fn kind(&self) -> ActuatorKind {
        self.kind
    }

    pub fn raw_attention(&self) -> u8 {
        self.raw_attention
    }

    pub fn derived_value(&self) -> u16 {
        self.derived_value
    }

    /// Reserved second protocol channel. Always 0.
    pub fn auxiliary(&self) -> u8 {
        self.auxiliary
    }
}
