//! Text-stream signal source.
//!
//! Implements [`SignalSource`] for a headset bridge that writes one
//! attention value per line (e.g. piped to stdin). A reader thread
//! pushes every parsed value into the [`SampleFeed`]; the control loop
//! validates the range. Lines that aren't integers are skipped with a
//! warning.
//!
//! ```text
//! bridge ──"57\n"──▶ reader thread ──push(57)──▶ SampleFeed ──▶ ControlLoop
//! ```

use core::sync::atomic::{AtomicBool, Ordering};
use std::io::BufRead;
use std::sync::Arc;
use std::thread::JoinHandle;

use log::{debug, info, warn};

use crate::app::channels::SampleFeed;
use crate::app::ports::SignalSource;
use crate::error::SignalError;

pub struct LineSignalSource<R> {
    reader: Option<R>,
    connected: bool,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl<R: BufRead + Send + 'static> LineSignalSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: Some(reader),
            connected: false,
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }
}

/// Parse one bridge line. Blank lines and non-integers yield `None`.
pub fn parse_attention(line: &str) -> Option<i32> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match line.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("SOURCE: ignoring non-numeric line '{}'", line);
            None
        }
    }
}

fn pump_lines<R: BufRead>(reader: R, feed: &SampleFeed, running: &AtomicBool) {
    for line in reader.lines() {
        if !running.load(Ordering::Acquire) || feed.is_closed() {
            break;
        }
        match line {
            Ok(line) => {
                if let Some(value) = parse_attention(&line) {
                    feed.push(value);
                }
            }
            Err(e) => {
                warn!("SOURCE: read error: {}", e);
                break;
            }
        }
    }
    debug!("SOURCE: stream ended");
}

impl<R: BufRead + Send + 'static> SignalSource for LineSignalSource<R> {
    fn connect(&mut self) -> Result<(), SignalError> {
        if self.reader.is_none() {
            return Err(SignalError::Unavailable);
        }
        self.connected = true;
        info!("SOURCE: attention stream connected");
        Ok(())
    }

    fn subscribe(&mut self, feed: SampleFeed) -> Result<(), SignalError> {
        if !self.connected {
            return Err(SignalError::Unavailable);
        }
        let reader = self.reader.take().ok_or(SignalError::Unavailable)?;
        let running = self.running.clone();
        running.store(true, Ordering::Release);

        let worker = std::thread::Builder::new()
            .name("attention-source".into())
            .spawn(move || pump_lines(reader, &feed, &running))
            .map_err(|e| {
                warn!("SOURCE: failed to spawn reader: {}", e);
                SignalError::Unavailable
            })?;
        self.worker = Some(worker);
        Ok(())
    }

    fn unsubscribe(&mut self) {
        self.running.store(false, Ordering::Release);
        // The reader may be parked in a blocking read; it exits on its
        // next line or at EOF, and its pushes are ignored once the feed closes.
        if let Some(worker) = self.worker.take() {
            if worker.is_finished() && worker.join().is_err() {
                warn!("SOURCE: reader thread panicked");
            }
        }
    }
}
