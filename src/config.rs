//! Controller configuration parameters
//!
//! Every timing and policy value has a per-actuator default but can be
//! overridden from the JSON config file (see `adapters::json_config`).

use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::control::mapping::{ATTENTION_MAX, ActuatorKind};

/// Controller firmware boot time after the port opens.
pub const DEFAULT_SETTLE_DELAY_MS: u32 = 3_000;
/// 7.5 minutes.
pub const DEFAULT_SESSION_DURATION_MS: u32 = 450_000;
pub const DEFAULT_BAUD_RATE: u32 = 115_200;
pub const DEFAULT_SERIAL_PORT: &str = "/dev/ttyACM0";

/// Per-session control parameters. Immutable once a session starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub actuator_kind: ActuatorKind,
    /// Minimum attention change before a new command is sent (0 = every sample).
    pub change_threshold: u8,
    /// Wait after each write before reading the controller's response.
    pub inter_command_delay_ms: u32,
    /// Length of the active control window.
    pub session_duration_ms: u32,
    /// Wait after opening the port before the first command.
    pub settle_delay_ms: u32,
}

impl SessionConfig {
    /// Defaults sized to each actuator's physical response time.
    pub fn for_kind(kind: ActuatorKind) -> Self {
        let (change_threshold, inter_command_delay_ms) = match kind {
            ActuatorKind::Brightness => (0, 200),
            ActuatorKind::ServoAngle => (0, 500),
            ActuatorKind::StepperAngle => (5, 1_000),
        };
        Self {
            actuator_kind: kind,
            change_threshold,
            inter_command_delay_ms,
            session_duration_ms: DEFAULT_SESSION_DURATION_MS,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
        }
    }

    pub fn inter_command_delay(&self) -> Duration {
        Duration::from_millis(u64::from(self.inter_command_delay_ms))
    }

    pub fn session_duration(&self) -> Duration {
        Duration::from_millis(u64::from(self.session_duration_ms))
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(u64::from(self.settle_delay_ms))
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::for_kind(ActuatorKind::Brightness)
    }
}

/// Serial link to the actuator controller (8N1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialConfig {
    pub port: String,
    pub baud_rate: u32,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_SERIAL_PORT.into(),
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }
}

/// Everything the binary needs to run a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerConfig {
    pub serial: SerialConfig,
    pub session: SessionConfig,
}

/// Range-check a configuration. Invalid values are rejected, never clamped.
pub fn validate_config(cfg: &ControllerConfig) -> Result<(), ConfigError> {
    validate_session(&cfg.session)?;
    if cfg.serial.baud_rate == 0 {
        return Err(ConfigError::ValidationFailed("baud_rate must be > 0"));
    }
    if cfg.serial.port.trim().is_empty() {
        return Err(ConfigError::ValidationFailed("serial port must be set"));
    }
    Ok(())
}

/// Range-check the session parameters alone.
pub fn validate_session(s: &SessionConfig) -> Result<(), ConfigError> {
    if s.change_threshold > ATTENTION_MAX {
        return Err(ConfigError::ValidationFailed(
            "change_threshold must be 0–100",
        ));
    }
    if s.inter_command_delay_ms > 10_000 {
        return Err(ConfigError::ValidationFailed(
            "inter_command_delay_ms must be 0–10000",
        ));
    }
    if s.settle_delay_ms > 30_000 {
        return Err(ConfigError::ValidationFailed(
            "settle_delay_ms must be 0–30000",
        ));
    }
    if !(1..=86_400_000).contains(&s.session_duration_ms) {
        return Err(ConfigError::ValidationFailed(
            "session_duration_ms must be 1–86400000",
        ));
    }
    Ok(())
}
