//! Session: one bounded run of the control loop.
//!
//! ```text
//!  connect source ──▶ open transport ──▶ settle ──▶ subscribe
//!        │ (fail: abort,                               │
//!        │  transport untouched)                       ▼
//!        ▼                                  ┌─────────────────────┐
//!   Err(SignalSource)                       │ LocalExecutor        │
//!                                           │  ControlLoop::run    │
//!                                           │  session timer ──stop│
//!                                           └─────────────────────┘
//!                                                      │
//!                   unsubscribe ◀──────────────────────┘
//!                   close loop (transport released on every path)
//! ```

use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use async_io_mini::Timer;
use edge_executor::LocalExecutor;
use futures_lite::future;
use log::{error, info, warn};
use serde::Serialize;

use crate::config::{SessionConfig, validate_session};
use crate::control::mapping::ActuatorKind;
use crate::error::{Error, Result};

use super::channels::{SampleFeed, StopSignal};
use super::control_loop::{ControlLoop, LoopStats};
use super::events::ControlEvent;
use super::ports::{EventSink, LineTransport, SignalSource};

/// Terminal summary of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionReport {
    pub kind: ActuatorKind,
    pub samples_received: u32,
    pub accepted: u32,
    pub rejected: u32,
    pub invalid_samples: u32,
    pub command_errors: u32,
    pub transport_errors: u32,
    /// Responses longer than the buffer whose tail was discarded.
    pub truncated_responses: u32,
    /// Samples lost to a full sample channel before reaching the loop.
    pub dropped_samples: u32,
    /// Samples still queued when the session stopped.
    pub unprocessed_samples: u32,
    pub commands_sent: u32,
    pub responses: u32,
    /// Responses that echoed the command just sent.
    pub acknowledged: u32,
    pub elapsed_ms: u64,
    pub cancelled: bool,
}

impl SessionReport {
    fn new(kind: ActuatorKind, stats: LoopStats, feed: FeedTally, started: Instant, cancelled: bool) -> Self {
        Self {
            kind,
            samples_received: stats.received,
            accepted: stats.accepted,
            rejected: stats.rejected,
            invalid_samples: stats.invalid,
            command_errors: stats.command_errors,
            transport_errors: stats.transport_errors,
            truncated_responses: stats.truncated_responses,
            dropped_samples: feed.dropped,
            unprocessed_samples: feed.unprocessed,
            commands_sent: stats.commands_sent,
            responses: stats.responses,
            acknowledged: stats.acknowledged,
            elapsed_ms: started.elapsed().as_millis() as u64,
            cancelled,
        }
    }
}

/// What happened to samples that never reached the loop.
#[derive(Debug, Clone, Copy, Default)]
struct FeedTally {
    dropped: u32,
    unprocessed: u32,
}

/// Stops a running session early from any thread.
#[derive(Clone)]
pub struct CancelHandle {
    stop: Arc<StopSignal>,
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        self.stop.signal(());
    }
}

/// Owns the configuration and stop signal for one run.
pub struct Session {
    config: SessionConfig,
    stop: Arc<StopSignal>,
    cancelled: Arc<AtomicBool>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            stop: Arc::new(StopSignal::new()),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            stop: self.stop.clone(),
            cancelled: self.cancelled.clone(),
        }
    }

    /// Run a full session and block until it ends.
    ///
    /// Fails only if the session config is out of range, the signal source
    /// can't be brought up or the transport can't be opened. Per-sample
    /// errors end up in the report.
    pub fn run<S, T, E>(&self, source: &mut S, mut transport: T, sink: &mut E) -> Result<SessionReport>
    where
        S: SignalSource,
        T: LineTransport,
        E: EventSink,
    {
        let started = Instant::now();
        let kind = self.config.actuator_kind;

        if let Err(e) = validate_session(&self.config) {
            error!("SESSION: {}, not starting", e);
            return Err(e.into());
        }

        info!("SESSION: connecting to signal source ({} actuator)", kind);
        if let Err(e) = source.connect() {
            error!("SESSION: {}, not starting", e);
            return Err(Error::SignalSource(e));
        }

        if let Err(e) = transport.open() {
            transport.close();
            error!("SESSION: transport {}, not starting", e);
            return Err(Error::Transport(e));
        }

        let mut control = ControlLoop::armed(&self.config, transport, sink);
        // From here the loop owns the transport and releases it on drop.

        sink.emit(&ControlEvent::Started {
            kind,
            threshold: self.config.change_threshold,
        });

        let feed = SampleFeed::new();
        let mut tally = FeedTally::default();
        if self.settle() {
            if let Err(e) = source.subscribe(feed.clone()) {
                error!("SESSION: subscribe failed: {}", e);
                feed.close();
                control.close(sink);
                return Err(Error::SignalSource(e));
            }
            self.drive(&mut control, &feed, sink);
            source.unsubscribe();
            tally.unprocessed = feed.drain();
            if tally.unprocessed > 0 {
                warn!("SESSION: {} queued samples left unprocessed", tally.unprocessed);
            }
        } else {
            warn!("SESSION: cancelled during settle delay");
        }
        feed.close();
        tally.dropped = feed.dropped();

        let stats = control.close(sink);
        let report = SessionReport::new(
            kind,
            stats,
            tally,
            started,
            self.cancelled.load(Ordering::Acquire),
        );
        info!(
            "SESSION: done in {} ms | received={} accepted={} rejected={} invalid={} \
             transport_errors={} dropped={} unprocessed={} acked={}/{}",
            report.elapsed_ms,
            report.samples_received,
            report.accepted,
            report.rejected,
            report.invalid_samples,
            report.transport_errors,
            report.dropped_samples,
            report.unprocessed_samples,
            report.acknowledged,
            report.commands_sent,
        );
        Ok(report)
    }

    /// Wait for controller firmware to boot. Returns `false` if cancelled.
    fn settle(&self) -> bool {
        let delay = self.config.settle_delay();
        if delay.is_zero() {
            return !self.stop.signaled();
        }
        info!("SESSION: waiting {} ms for controller boot", delay.as_millis());
        let stop = &*self.stop;
        future::block_on(future::or(
            async {
                stop.wait().await;
                false
            },
            async {
                Timer::after(delay).await;
                true
            },
        ))
    }

    /// Run the loop and the session timer side by side until stop.
    fn drive<T: LineTransport>(
        &self,
        control: &mut ControlLoop<T>,
        feed: &SampleFeed,
        sink: &mut impl EventSink,
    ) {
        let stop = &*self.stop;
        let duration = self.config.session_duration();
        info!("SESSION: running for {} ms", duration.as_millis());

        let executor: LocalExecutor<'_, 4> = LocalExecutor::new();
        let timer = executor.spawn(async move {
            Timer::after(duration).await;
            info!("SESSION: duration elapsed");
            stop.signal(());
        });

        future::block_on(executor.run(control.run(feed, stop, sink)));
        drop(timer);
    }
}
