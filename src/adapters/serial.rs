//! Serial transport adapter.
//!
//! Implements [`LineTransport`] over a real serial port (USB CDC on the
//! Arduino-class controller) using the `serialport` crate. Link settings
//! are 8 data bits, no parity, one stop bit; the baud rate comes from
//! [`SerialConfig`].

use core::time::Duration;
use std::io::Read;

use log::{info, warn};
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};

use crate::app::ports::LineTransport;
use crate::config::SerialConfig;
use crate::error::TransportError;

/// Line terminator expected by the controller sketch.
const LINE_TERMINATOR: &[u8] = b"\n";

/// Blocking-write timeout. Reads never block: only buffered bytes are read.
const IO_TIMEOUT: Duration = Duration::from_millis(100);

pub struct SerialTransport {
    config: SerialConfig,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialTransport {
    pub fn new(config: SerialConfig) -> Self {
        Self { config, port: None }
    }
}

fn send_line(port: &mut dyn SerialPort, line: &str) -> std::io::Result<()> {
    port.write_all(line.as_bytes())?;
    port.write_all(LINE_TERMINATOR)?;
    port.flush()
}

impl LineTransport for SerialTransport {
    fn open(&mut self) -> Result<(), TransportError> {
        if self.port.is_some() {
            return Ok(());
        }
        let port = serialport::new(&self.config.port, self.config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(IO_TIMEOUT)
            .open()
            .map_err(|e| {
                warn!("SERIAL: open {} failed: {}", self.config.port, e);
                TransportError::OpenFailed
            })?;
        info!(
            "SERIAL: opened {} at {} baud",
            self.config.port, self.config.baud_rate
        );
        self.port = Some(port);
        Ok(())
    }

    fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        let port = self.port.as_mut().ok_or(TransportError::NotOpen)?;
        send_line(port.as_mut(), line).map_err(|e| {
            warn!("SERIAL: write failed: {}", e);
            TransportError::WriteFailed
        })
    }

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let port = self.port.as_mut().ok_or(TransportError::NotOpen)?;
        let pending = port.bytes_to_read().map_err(|e| {
            warn!("SERIAL: bytes_to_read failed: {}", e);
            TransportError::ReadFailed
        })? as usize;
        if pending == 0 || buf.is_empty() {
            return Ok(0);
        }
        let want = pending.min(buf.len());
        port.read(&mut buf[..want]).map_err(|e| {
            warn!("SERIAL: read failed: {}", e);
            TransportError::ReadFailed
        })
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            info!("SERIAL: closed {}", self.config.port);
        }
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }
}
