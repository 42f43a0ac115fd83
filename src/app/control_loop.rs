//! Control loop: sample in, command out, response back.
//!
//! ```text
//!  Idle ──arm──▶ Armed ──start──▶ Running ──stop──▶ Draining ──close──▶ Closed
//!                                   │  ▲
//!                                   └──┘ every sample (accepted or not)
//! ```
//!
//! Per sample in `Running`:
//! 1. validate and map (`control::mapping`)
//! 2. change filter (`control::filter`)
//! 3. encode + write (`protocol::codec`, [`LineTransport`]); the filter
//!    reference only moves once the write succeeds
//! 4. pacing delay, cancellable by the stop signal
//! 5. read whatever the controller answered, decode, report
//!
//! The loop owns the transport exclusively from `arm` until `close` (or
//! drop), so no locking is involved. Transport failures are counted and
//! reported; they never end the loop.

use core::time::Duration;

use async_io_mini::Timer;
use futures_lite::future;
use log::{debug, error, info, warn};

use crate::config::SessionConfig;
use crate::control::filter::ChangeFilter;
use crate::control::mapping::{ActuatorCommand, ActuatorKind, AttentionSample};
use crate::error::{Error, TransportError};
use crate::protocol::codec;

use super::channels::{SampleFeed, StopSignal};
use super::events::ControlEvent;
use super::ports::{EventSink, LineTransport};

/// Upper bound on response bytes collected after one command.
const RESPONSE_CAP: usize = 1024;

const READ_CHUNK: usize = 256;

/// Lifecycle of a [`ControlLoop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopState {
    /// Constructed, no transport bound.
    Idle,
    /// Transport bound and open, awaiting the first sample.
    Armed,
    Running,
    /// Stop requested; only in-flight work completes.
    Draining,
    /// Terminal. Transport released.
    Closed,
}

/// Per-loop counters, folded into the session report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub received: u32,
    pub accepted: u32,
    pub rejected: u32,
    pub invalid: u32,
    pub command_errors: u32,
    pub transport_errors: u32,
    pub commands_sent: u32,
    pub responses: u32,
    pub acknowledged: u32,
    /// Responses that overflowed the buffer and had their tail discarded.
    pub truncated_responses: u32,
}

/// The attention-to-actuator pipeline for one session.
pub struct ControlLoop<T: LineTransport> {
    kind: ActuatorKind,
    pacing: Duration,
    filter: ChangeFilter,
    transport: Option<T>,
    state: LoopState,
    stats: LoopStats,
}

impl<T: LineTransport> ControlLoop<T> {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            kind: config.actuator_kind,
            pacing: config.inter_command_delay(),
            filter: ChangeFilter::new(config.change_threshold),
            transport: None,
            state: LoopState::Idle,
            stats: LoopStats::default(),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// A new loop already bound to an opened transport.
    pub fn armed(config: &SessionConfig, transport: T, sink: &mut impl EventSink) -> Self {
        let mut control = Self::new(config);
        control.bind(transport, sink);
        control
    }

    /// Bind an already-opened transport. Hands it back if the loop is not idle.
    pub fn arm(&mut self, transport: T, sink: &mut impl EventSink) -> Result<(), T> {
        if self.state != LoopState::Idle {
            warn!("LOOP: arm ignored in {:?}", self.state);
            return Err(transport);
        }
        self.bind(transport, sink);
        Ok(())
    }

    /// Begin accepting samples.
    pub fn start(&mut self, sink: &mut impl EventSink) -> bool {
        if self.state != LoopState::Armed {
            warn!("LOOP: start ignored in {:?}", self.state);
            return false;
        }
        self.set_state(LoopState::Running, sink);
        true
    }

    /// Stop taking new samples. In-flight work still completes.
    pub fn begin_drain(&mut self, sink: &mut impl EventSink) {
        if matches!(self.state, LoopState::Armed | LoopState::Running) {
            self.set_state(LoopState::Draining, sink);
        }
    }

    /// Release the transport and enter the terminal state.
    pub fn close(&mut self, sink: &mut impl EventSink) -> LoopStats {
        if self.state == LoopState::Closed {
            return self.stats;
        }
        self.begin_drain(sink);
        self.release_transport();
        self.set_state(LoopState::Closed, sink);
        self.stats
    }

    // ── Event loop ────────────────────────────────────────────

    /// Consume samples from `feed` until `stop` is raised.
    ///
    /// Suspends between samples; a stop raised during a pacing delay cuts
    /// the delay short.
    pub async fn run(&mut self, feed: &SampleFeed, stop: &StopSignal, sink: &mut impl EventSink) {
        if self.state == LoopState::Armed {
            self.start(sink);
        }
        while self.state == LoopState::Running {
            // Stop is polled first so it wins over a ready sample.
            let next = future::or(
                async {
                    stop.wait().await;
                    None
                },
                async { Some(feed.channel().receive().await) },
            )
            .await;

            match next {
                Some(raw) => self.handle_sample(raw, stop, sink).await,
                None => {
                    info!("LOOP: stop requested");
                    self.set_state(LoopState::Draining, sink);
                }
            }
        }
    }

    /// Process one raw attention reading. Ignored unless `Running`.
    pub async fn handle_sample(&mut self, raw: i32, stop: &StopSignal, sink: &mut impl EventSink) {
        if self.state != LoopState::Running {
            debug!("LOOP: sample {} ignored in {:?}", raw, self.state);
            return;
        }
        self.stats.received += 1;

        let sample = match AttentionSample::new(raw) {
            Ok(s) => s,
            Err(e) => {
                self.stats.invalid += 1;
                warn!("LOOP: {}", e);
                sink.emit(&ControlEvent::Fault(e));
                return;
            }
        };

        if !self.filter.passes(sample) {
            self.stats.rejected += 1;
            let last = self.filter.last_emitted().unwrap_or(sample.value());
            debug!("LOOP: attention {} within threshold of {}", sample.value(), last);
            sink.emit(&ControlEvent::SampleFiltered {
                attention: sample.value(),
                last_emitted: last,
            });
            return;
        }
        self.stats.accepted += 1;

        let command = ActuatorCommand::from_sample(self.kind, sample);
        sink.emit(&ControlEvent::SampleAccepted {
            kind: self.kind,
            attention: command.raw_attention(),
            derived: command.derived_value(),
        });

        let line = match codec::encode(&command) {
            Ok(line) => line,
            Err(e) => {
                self.stats.command_errors += 1;
                error!("LOOP: {}", e);
                sink.emit(&ControlEvent::Fault(e));
                return;
            }
        };

        if let Err(e) = self.write(&line) {
            self.stats.transport_errors += 1;
            warn!("LOOP: write '{}' failed: {}", line, e);
            sink.emit(&ControlEvent::Fault(Error::Transport(e)));
            return;
        }
        self.filter.commit(sample);
        self.stats.commands_sent += 1;
        sink.emit(&ControlEvent::CommandSent {
            line: line.as_str().into(),
        });

        self.pace(stop, sink).await;
        self.collect_responses(&command, sink);
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    /// The bound transport, while armed.
    pub fn transport(&self) -> Option<&T> {
        self.transport.as_ref()
    }

    // ── Internal ──────────────────────────────────────────────

    fn bind(&mut self, transport: T, sink: &mut impl EventSink) {
        self.transport = Some(transport);
        self.set_state(LoopState::Armed, sink);
    }

    fn set_state(&mut self, to: LoopState, sink: &mut impl EventSink) {
        let from = self.state;
        if from == to {
            return;
        }
        self.state = to;
        debug!("LOOP: {:?} -> {:?}", from, to);
        sink.emit(&ControlEvent::StateChanged { from, to });
    }

    fn write(&mut self, line: &str) -> Result<(), TransportError> {
        self.transport
            .as_mut()
            .ok_or(TransportError::NotOpen)?
            .write_line(line)
    }

    /// Give the actuator time to move before reading its answer.
    async fn pace(&mut self, stop: &StopSignal, sink: &mut impl EventSink) {
        let pacing = self.pacing;
        if pacing.is_zero() {
            return;
        }
        let cancelled = future::or(
            async {
                stop.wait().await;
                true
            },
            async {
                Timer::after(pacing).await;
                false
            },
        )
        .await;

        if cancelled {
            info!("LOOP: stop requested during pacing");
            self.set_state(LoopState::Draining, sink);
        }
    }

    /// Drain pending response bytes and report each line.
    fn collect_responses(&mut self, sent: &ActuatorCommand, sink: &mut impl EventSink) {
        let Some(transport) = self.transport.as_mut() else {
            return;
        };

        let mut pending: heapless::Vec<u8, RESPONSE_CAP> = heapless::Vec::new();
        let mut chunk = [0u8; READ_CHUNK];
        let mut discarded = 0usize;
        // Past the cap keep reading so the tail can't leak into the next command.
        loop {
            match transport.read_available(&mut chunk) {
                Ok(0) => break,
                Ok(n) => {
                    let n = n.min(chunk.len());
                    let take = n.min(RESPONSE_CAP - pending.len());
                    if pending.extend_from_slice(&chunk[..take]).is_err() {
                        discarded += take;
                    }
                    discarded += n - take;
                }
                Err(e) => {
                    self.stats.transport_errors += 1;
                    warn!("LOOP: read failed: {}", e);
                    sink.emit(&ControlEvent::Fault(Error::Transport(e)));
                    break;
                }
            }
        }

        if discarded > 0 {
            self.stats.truncated_responses += 1;
            warn!(
                "LOOP: response exceeds {} bytes, discarded {}",
                RESPONSE_CAP, discarded
            );
            sink.emit(&ControlEvent::ResponseTruncated {
                kept: pending.len(),
                discarded,
            });
        }

        for line in codec::decode_lines(&pending) {
            let acknowledged = codec::parse_echo(&line).is_some_and(|echo| echo.matches(sent));
            self.stats.responses += 1;
            if acknowledged {
                self.stats.acknowledged += 1;
            }
            sink.emit(&ControlEvent::Response {
                line: line.into_owned(),
                acknowledged,
            });
        }
    }

    fn release_transport(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.close();
            info!("LOOP: transport released");
        }
    }
}

impl<T: LineTransport> Drop for ControlLoop<T> {
    fn drop(&mut self) {
        self.release_transport();
    }
}
