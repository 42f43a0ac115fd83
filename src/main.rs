//! mindctl: attention-driven actuator controller.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  LineSignalSource   SerialTransport   LogEventSink           │
//! │  (stdin bridge)     (controller)      (console)              │
//! │  JsonConfigStore (config file)                               │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ───────────────────    │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │  Session · ControlLoop (mapping · filter · codec)      │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage: `headset-bridge | RUST_LOG=info mindctl [config.json]`
//!
//! The session report is printed to stdout as one JSON line.

use std::io::BufReader;

use anyhow::{Context, Result};
use log::{info, warn};

use mindctl::Session;
use mindctl::adapters::json_config::JsonConfigStore;
use mindctl::adapters::line_source::LineSignalSource;
use mindctl::adapters::log_sink::LogEventSink;
use mindctl::adapters::serial::SerialTransport;
use mindctl::app::ports::ConfigPort;
use mindctl::config::ControllerConfig;

const DEFAULT_CONFIG_PATH: &str = "mindctl.json";

fn main() -> Result<()> {
    // ── 1. Logging ────────────────────────────────────────────
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("mindctl v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Config (file or defaults) ──────────────────────────
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.into());
    let store = JsonConfigStore::new(config_path);
    let config = match store.load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(
                "Config {} unusable ({}), using defaults",
                store.path().display(),
                e
            );
            ControllerConfig::default()
        }
    };
    info!(
        "Actuator: {} on {} @ {} baud",
        config.session.actuator_kind, config.serial.port, config.serial.baud_rate
    );

    // ── 3. Adapters ───────────────────────────────────────────
    let transport = SerialTransport::new(config.serial.clone());
    let mut source = LineSignalSource::new(BufReader::new(std::io::stdin()));
    let mut sink = LogEventSink::new();

    // ── 4. Run ────────────────────────────────────────────────
    let session = Session::new(config.session);
    let report = session
        .run(&mut source, transport, &mut sink)
        .context("session failed to start")?;

    println!("{}", serde_json::to_string(&report)?);
    Ok(())
}
