//! ControlLoop against a recording transport: mapping, filtering,
//! encoding, response relay and error containment per sample.

use futures_lite::future::block_on;

use mindctl::ActuatorKind;
use mindctl::app::channels::{SampleFeed, StopSignal};
use mindctl::app::control_loop::{ControlLoop, LoopState};
use mindctl::app::events::ControlEvent;
use mindctl::app::ports::LineTransport;
use mindctl::config::SessionConfig;
use mindctl::error::{Error, TransportError};

use super::mocks::{MockTransport, RecordingSink};

fn running(
    kind: ActuatorKind,
    mut transport: MockTransport,
    sink: &mut RecordingSink,
) -> ControlLoop<MockTransport> {
    let mut config = SessionConfig::for_kind(kind);
    config.inter_command_delay_ms = 0;
    let mut control = ControlLoop::new(&config);
    transport.open().unwrap();
    assert!(control.arm(transport, sink).is_ok());
    assert!(control.start(sink));
    control
}

fn feed_all(control: &mut ControlLoop<MockTransport>, samples: &[i32], sink: &mut RecordingSink) {
    let stop = StopSignal::new();
    for &s in samples {
        block_on(control.handle_sample(s, &stop, sink));
    }
}

// ── Stepper debounce: [10, 12, 50] at threshold 5 ────────────

#[test]
fn stepper_debounce_sends_only_significant_changes() {
    let mut sink = RecordingSink::new();
    let transport = MockTransport::new();
    let log = transport.log();
    let mut control = running(ActuatorKind::StepperAngle, transport, &mut sink);

    feed_all(&mut control, &[10, 12, 50], &mut sink);

    assert_eq!(sink.accepted(), vec![(10, 36), (50, 180)]);
    assert_eq!(log.borrow().written, vec!["10;0;", "50;0;"]);
    let stats = control.stats();
    assert_eq!(stats.received, 3);
    assert_eq!(stats.accepted, 2);
    assert_eq!(stats.rejected, 1);
    assert!(sink.events.iter().any(|e| matches!(
        e,
        ControlEvent::SampleFiltered {
            attention: 12,
            last_emitted: 10
        }
    )));
}

#[test]
fn servo_sends_every_sample_including_repeats() {
    let mut sink = RecordingSink::new();
    let transport = MockTransport::new();
    let log = transport.log();
    let mut control = running(ActuatorKind::ServoAngle, transport, &mut sink);

    feed_all(&mut control, &[50, 50, 51], &mut sink);

    assert_eq!(sink.accepted(), vec![(50, 90), (50, 90), (51, 91)]);
    assert_eq!(log.borrow().written.len(), 3);
    assert_eq!(control.stats().rejected, 0);
}

#[test]
fn full_brightness_encodes_percentage() {
    let mut sink = RecordingSink::new();
    let transport = MockTransport::new();
    let log = transport.log();
    let mut control = running(ActuatorKind::Brightness, transport, &mut sink);

    feed_all(&mut control, &[100], &mut sink);

    assert_eq!(log.borrow().written, vec!["100;0;"]);
    assert!(sink.events.contains(&ControlEvent::CommandSent {
        line: "100;0;".into()
    }));
}

// ── Responses ────────────────────────────────────────────────

#[test]
fn echo_and_status_lines_are_relayed_in_order() {
    let mut sink = RecordingSink::new();
    let transport = MockTransport::echoing().with_status("  Servo -> 90 deg ");
    let mut control = running(ActuatorKind::ServoAngle, transport, &mut sink);

    feed_all(&mut control, &[50], &mut sink);

    assert_eq!(
        sink.responses(),
        vec![
            ("50;0;".to_string(), true),
            ("Servo -> 90 deg".to_string(), false)
        ]
    );
    let stats = control.stats();
    assert_eq!(stats.responses, 2);
    assert_eq!(stats.acknowledged, 1);
}

#[test]
fn stale_echo_of_other_command_is_not_an_ack() {
    let mut sink = RecordingSink::new();
    let mut transport = MockTransport::new();
    transport.inject(b"42;0;\n");
    let mut control = running(ActuatorKind::Brightness, transport, &mut sink);

    feed_all(&mut control, &[60], &mut sink);

    assert_eq!(sink.responses(), vec![("42;0;".to_string(), false)]);
    assert_eq!(control.stats().acknowledged, 0);
}

#[test]
fn oversized_response_is_discarded_not_carried_over() {
    let mut sink = RecordingSink::new();
    let mut transport = MockTransport::echoing();
    transport.inject(&[b'x'; 1100]);
    let mut control = running(ActuatorKind::Brightness, transport, &mut sink);

    feed_all(&mut control, &[10, 20], &mut sink);

    let responses = sink.responses();
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0].0.len(), 1024);
    assert!(!responses[0].1);
    assert_eq!(responses[1], ("20;0;".to_string(), true));

    // 76 bytes of filler plus the "10;0;\r\n" echo.
    assert!(sink.events.contains(&ControlEvent::ResponseTruncated {
        kept: 1024,
        discarded: 83
    }));
    let stats = control.stats();
    assert_eq!(stats.truncated_responses, 1);
    assert_eq!(stats.acknowledged, 1);
}

#[test]
fn quiet_controller_yields_no_responses() {
    let mut sink = RecordingSink::new();
    let mut control = running(ActuatorKind::Brightness, MockTransport::new(), &mut sink);

    feed_all(&mut control, &[1, 2, 3, 4], &mut sink);

    assert!(sink.responses().is_empty());
    assert_eq!(control.stats().transport_errors, 0);
}

// ── Error containment ────────────────────────────────────────

#[test]
fn write_failure_is_counted_and_loop_continues() {
    let mut sink = RecordingSink::new();
    let transport = MockTransport::echoing().failing_write(1);
    let log = transport.log();
    let mut control = running(ActuatorKind::Brightness, transport, &mut sink);

    feed_all(&mut control, &[10, 20, 30], &mut sink);

    let stats = control.stats();
    assert_eq!(stats.transport_errors, 1);
    assert_eq!(stats.accepted, 3);
    assert_eq!(stats.commands_sent, 2);
    assert_eq!(control.state(), LoopState::Running);
    assert_eq!(log.borrow().written, vec!["10;0;", "30;0;"]);
    assert!(sink.events.contains(&ControlEvent::Fault(Error::Transport(
        TransportError::WriteFailed
    ))));
}

#[test]
fn failed_write_does_not_move_filter_reference() {
    let mut sink = RecordingSink::new();
    let transport = MockTransport::new().failing_write(1);
    let log = transport.log();
    let mut control = running(ActuatorKind::StepperAngle, transport, &mut sink);

    // 50 never reaches the controller, so 52 is still a big move from 10.
    feed_all(&mut control, &[10, 50, 52, 53], &mut sink);

    assert_eq!(log.borrow().written, vec!["10;0;", "52;0;"]);
    let stats = control.stats();
    assert_eq!(stats.transport_errors, 1);
    assert_eq!(stats.rejected, 1);
    assert!(sink.events.contains(&ControlEvent::SampleFiltered {
        attention: 53,
        last_emitted: 52
    }));
}

#[test]
fn read_failure_is_counted_after_successful_write() {
    let mut sink = RecordingSink::new();
    let transport = MockTransport::new().failing_reads();
    let mut control = running(ActuatorKind::ServoAngle, transport, &mut sink);

    feed_all(&mut control, &[10, 90], &mut sink);

    let stats = control.stats();
    assert_eq!(stats.commands_sent, 2);
    assert_eq!(stats.transport_errors, 2);
    assert_eq!(sink.faults(), 2);
}

#[test]
fn invalid_samples_never_reach_the_wire() {
    let mut sink = RecordingSink::new();
    let transport = MockTransport::new();
    let log = transport.log();
    let mut control = running(ActuatorKind::StepperAngle, transport, &mut sink);

    feed_all(&mut control, &[-1, 101, 40], &mut sink);

    assert_eq!(log.borrow().written, vec!["40;0;"]);
    let stats = control.stats();
    assert_eq!(stats.invalid, 2);
    assert_eq!(stats.received, stats.accepted + stats.rejected + stats.invalid);
    assert!(sink.events.contains(&ControlEvent::Fault(Error::InvalidSample(101))));
}

// ── Lifecycle ────────────────────────────────────────────────

#[test]
fn stop_wins_over_queued_samples() {
    let mut sink = RecordingSink::new();
    let mut config = SessionConfig::for_kind(ActuatorKind::Brightness);
    config.inter_command_delay_ms = 0;
    let mut control = ControlLoop::new(&config);
    let mut transport = MockTransport::new();
    transport.open().unwrap();
    let log = transport.log();
    assert!(control.arm(transport, &mut sink).is_ok());

    let feed = SampleFeed::new();
    feed.push(10);
    feed.push(20);
    let stop = StopSignal::new();
    stop.signal(());

    block_on(control.run(&feed, &stop, &mut sink));

    assert_eq!(control.state(), LoopState::Draining);
    assert_eq!(control.stats().received, 0);
    assert!(log.borrow().written.is_empty());
}

#[test]
fn run_processes_queue_then_drains_on_stop() {
    let mut sink = RecordingSink::new();
    let mut config = SessionConfig::for_kind(ActuatorKind::StepperAngle);
    config.inter_command_delay_ms = 0;
    let mut control = ControlLoop::new(&config);
    let mut transport = MockTransport::new();
    transport.open().unwrap();
    let log = transport.log();
    assert!(control.arm(transport, &mut sink).is_ok());

    let feed = SampleFeed::new();
    let stop = StopSignal::new();
    for v in [10, 12, 50] {
        feed.push(v);
    }

    block_on(futures_lite::future::zip(
        control.run(&feed, &stop, &mut sink),
        async {
            // Let the loop take the queued samples before stopping it.
            async_io_mini::Timer::after(std::time::Duration::from_millis(50)).await;
            stop.signal(());
        },
    ));

    assert_eq!(log.borrow().written, vec!["10;0;", "50;0;"]);
    assert_eq!(control.state(), LoopState::Draining);
    let stats = control.close(&mut sink);
    assert_eq!(stats.accepted, 2);
    assert_eq!(control.state(), LoopState::Closed);
    assert_eq!(log.borrow().closes, 1);
}

#[test]
fn dropping_the_loop_releases_the_transport() {
    let mut sink = RecordingSink::new();
    let transport = MockTransport::new();
    let log = transport.log();
    let control = running(ActuatorKind::ServoAngle, transport, &mut sink);
    assert_eq!(log.borrow().opens, 1);

    drop(control);

    assert_eq!(log.borrow().closes, 1);
}

#[test]
fn state_changes_are_reported() {
    let mut sink = RecordingSink::new();
    let mut control = running(ActuatorKind::Brightness, MockTransport::new(), &mut sink);
    control.close(&mut sink);

    let transitions: Vec<_> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            ControlEvent::StateChanged { to, .. } => Some(*to),
            _ => None,
        })
        .collect();
    assert_eq!(
        transitions,
        vec![
            LoopState::Armed,
            LoopState::Running,
            LoopState::Draining,
            LoopState::Closed
        ]
    );
}
