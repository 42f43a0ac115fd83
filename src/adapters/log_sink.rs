//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing each [`ControlEvent`] as one tagged
//! line through the `log` facade. Accepted samples carry a small text
//! gauge so the operator can follow attention at a glance:
//!
//! ```text
//! SAMPLE | attention= 45% | [█████████░░░░░░░░░░░] 45%
//! SAMPLE | attention= 50% | [          ▲          ] 90°
//! SAMPLE | attention= 50% | [○○○○○○○○○○●○○○○○○○○○] 180°
//! ```

use log::{debug, info, warn};

use crate::app::events::ControlEvent;
use crate::app::ports::EventSink;
use crate::control::mapping::ActuatorKind;

/// Cells in a gauge; one cell per 5 attention points.
const GAUGE_CELLS: usize = 20;

/// Adapter that logs every [`ControlEvent`] to the console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

/// Degrees per servo marker step (180° over 20 steps).
const SERVO_STEP_DEG: u16 = 9;

/// Render the progress gauge for `kind` at `attention`.
///
/// Brightness fills a bar. The servo moves a `▲` along a track by its
/// angle; the stepper moves a dot around a dial by attention.
pub fn gauge(kind: ActuatorKind, attention: u8, derived: u16) -> String {
    let pos = (attention as usize / 5).min(GAUGE_CELLS);
    match kind {
        ActuatorKind::Brightness => {
            let mut bar = "\u{2588}".repeat(pos);
            bar.push_str(&"\u{2591}".repeat(GAUGE_CELLS - pos));
            bar
        }
        ActuatorKind::ServoAngle => {
            let pos = usize::from(derived / SERVO_STEP_DEG).min(GAUGE_CELLS);
            let mut track = " ".repeat(pos);
            track.push('\u{25b2}');
            track.push_str(&" ".repeat(GAUGE_CELLS - pos));
            track
        }
        ActuatorKind::StepperAngle => {
            let marker = pos.min(GAUGE_CELLS - 1);
            (0..GAUGE_CELLS)
                .map(|i| if i == marker { '\u{25cf}' } else { '\u{25cb}' })
                .collect()
        }
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &ControlEvent) {
        match event {
            ControlEvent::Started { kind, threshold } => {
                info!("START | actuator={} threshold={}", kind, threshold);
            }
            ControlEvent::StateChanged { from, to } => {
                debug!("STATE | {:?} -> {:?}", from, to);
            }
            ControlEvent::SampleAccepted {
                kind,
                attention,
                derived,
            } => {
                info!(
                    "SAMPLE | attention={:>3}% | [{}] {}{}",
                    attention,
                    gauge(*kind, *attention, *derived),
                    derived,
                    kind.unit(),
                );
            }
            ControlEvent::SampleFiltered {
                attention,
                last_emitted,
            } => {
                debug!("SKIP | attention={} (last sent {})", attention, last_emitted);
            }
            ControlEvent::CommandSent { line } => {
                debug!("SEND | {}", line);
            }
            ControlEvent::Response { line, acknowledged } => {
                if *acknowledged {
                    info!("RESP | {} (ack)", line);
                } else {
                    info!("RESP | {}", line);
                }
            }
            ControlEvent::ResponseTruncated { kept, discarded } => {
                warn!("RESP | truncated: kept {} bytes, discarded {}", kept, discarded);
            }
            ControlEvent::Fault(e) => {
                warn!("FAULT | {}", e);
            }
        }
    }
}
