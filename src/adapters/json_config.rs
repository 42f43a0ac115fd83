//! JSON file configuration adapter.
//!
//! Implements [`ConfigPort`] over a single JSON file. The file may name
//! only a few fields; everything omitted falls back to the defaults of
//! the actuator kind it selects:
//!
//! ```json
//! { "serial": { "port": "/dev/ttyUSB0" }, "session": { "actuator_kind": "stepper_angle" } }
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::Deserialize;

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::{ControllerConfig, SerialConfig, SessionConfig, validate_config};
use crate::control::mapping::ActuatorKind;

pub struct JsonConfigStore {
    path: PathBuf,
}

impl JsonConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

// ── Partial file schema ───────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SerialFile {
    port: Option<String>,
    baud_rate: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SessionFile {
    actuator_kind: Option<ActuatorKind>,
    change_threshold: Option<u8>,
    inter_command_delay_ms: Option<u32>,
    session_duration_ms: Option<u32>,
    settle_delay_ms: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    serial: SerialFile,
    session: SessionFile,
}

impl ConfigFile {
    fn resolve(self) -> ControllerConfig {
        let serial_defaults = SerialConfig::default();
        let serial = SerialConfig {
            port: self.serial.port.unwrap_or(serial_defaults.port),
            baud_rate: self.serial.baud_rate.unwrap_or(serial_defaults.baud_rate),
        };

        let s = self.session;
        let base = SessionConfig::for_kind(s.actuator_kind.unwrap_or(ActuatorKind::Brightness));
        let session = SessionConfig {
            actuator_kind: base.actuator_kind,
            change_threshold: s.change_threshold.unwrap_or(base.change_threshold),
            inter_command_delay_ms: s
                .inter_command_delay_ms
                .unwrap_or(base.inter_command_delay_ms),
            session_duration_ms: s.session_duration_ms.unwrap_or(base.session_duration_ms),
            settle_delay_ms: s.settle_delay_ms.unwrap_or(base.settle_delay_ms),
        };

        ControllerConfig { serial, session }
    }
}

/// Parse and validate config text.
pub fn parse_config(text: &str) -> Result<ControllerConfig, ConfigError> {
    let file: ConfigFile = serde_json::from_str(text).map_err(|e| {
        warn!("JsonConfigStore: parse error: {}", e);
        ConfigError::Corrupted
    })?;
    let cfg = file.resolve();
    validate_config(&cfg)?;
    Ok(cfg)
}

impl ConfigPort for JsonConfigStore {
    fn load(&self) -> Result<ControllerConfig, ConfigError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => {
                let cfg = parse_config(&text)?;
                info!("JsonConfigStore: loaded {}", self.path.display());
                Ok(cfg)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(
                    "JsonConfigStore: {} not found, using defaults",
                    self.path.display()
                );
                Ok(ControllerConfig::default())
            }
            Err(e) => {
                warn!("JsonConfigStore: read {} failed: {}", self.path.display(), e);
                Err(ConfigError::IoError)
            }
        }
    }

    fn save(&self, config: &ControllerConfig) -> Result<(), ConfigError> {
        validate_config(config)?;
        let text = serde_json::to_string_pretty(config).map_err(|_| ConfigError::Corrupted)?;
        // Write-then-rename.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, text).map_err(|_| ConfigError::IoError)?;
        std::fs::rename(&tmp, &self.path).map_err(|_| ConfigError::IoError)?;
        info!("JsonConfigStore: saved {}", self.path.display());
        Ok(())
    }
}
