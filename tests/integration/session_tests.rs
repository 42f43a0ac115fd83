//! Session lifecycle end to end: startup failures, timed runs, early
//! cancellation and guaranteed transport release.

use std::time::{Duration, Instant};

use mindctl::ActuatorKind;
use mindctl::Session;
use mindctl::app::ports::NullTransport;
use mindctl::config::SessionConfig;
use mindctl::error::{Error, SignalError, TransportError};

use super::mocks::{MockTransport, RecordingSink, ScriptedSource};

/// Short, fast session: no settle, no pacing.
fn quick(kind: ActuatorKind, duration_ms: u32) -> SessionConfig {
    SessionConfig {
        inter_command_delay_ms: 0,
        settle_delay_ms: 0,
        session_duration_ms: duration_ms,
        ..SessionConfig::for_kind(kind)
    }
}

// ── Startup failures ─────────────────────────────────────────

#[test]
fn unavailable_source_never_opens_transport() {
    let session = Session::new(quick(ActuatorKind::Brightness, 50));
    let mut source = ScriptedSource::unavailable();
    let transport = MockTransport::new();
    let log = transport.log();
    let mut sink = RecordingSink::new();

    let result = session.run(&mut source, transport, &mut sink);

    assert_eq!(
        result,
        Err(Error::SignalSource(SignalError::Unavailable))
    );
    assert_eq!(log.borrow().opens, 0);
    assert!(!source.log.subscribed);
    assert!(sink.events.is_empty());
}

#[test]
fn validation_failure_is_a_startup_failure() {
    let session = Session::new(quick(ActuatorKind::ServoAngle, 50));
    let mut source = ScriptedSource::failing_validation();
    let result = session.run(&mut source, MockTransport::new(), &mut RecordingSink::new());
    assert_eq!(
        result,
        Err(Error::SignalSource(SignalError::ValidationFailed))
    );
}

#[test]
fn transport_open_failure_aborts_session() {
    let session = Session::new(quick(ActuatorKind::Brightness, 50));
    let mut source = ScriptedSource::new(&[10]);
    let result = session.run(&mut source, MockTransport::failing_open(), &mut RecordingSink::new());
    assert_eq!(result, Err(Error::Transport(TransportError::OpenFailed)));
    assert!(!source.log.subscribed);
}

#[test]
fn out_of_range_session_config_is_rejected_up_front() {
    let session = Session::new(quick(ActuatorKind::Brightness, 0));
    let mut source = ScriptedSource::new(&[10]);
    let transport = MockTransport::new();
    let log = transport.log();

    let result = session.run(&mut source, transport, &mut RecordingSink::new());

    assert!(matches!(result, Err(Error::Config(_))));
    assert!(!source.log.connected);
    assert_eq!(log.borrow().opens, 0);
}

#[test]
fn subscribe_failure_still_closes_transport() {
    let session = Session::new(quick(ActuatorKind::Brightness, 50));
    let mut source = ScriptedSource::failing_subscribe();
    let transport = MockTransport::new();
    let log = transport.log();

    let result = session.run(&mut source, transport, &mut RecordingSink::new());

    assert_eq!(result, Err(Error::SignalSource(SignalError::Unavailable)));
    assert_eq!(log.borrow().opens, 1);
    assert_eq!(log.borrow().closes, 1);
}

// ── Timed runs ───────────────────────────────────────────────

#[test]
fn stepper_session_reports_filtered_counts() {
    let session = Session::new(quick(ActuatorKind::StepperAngle, 100));
    let mut source = ScriptedSource::new(&[10, 12, 50]);
    let transport = MockTransport::echoing();
    let log = transport.log();
    let mut sink = RecordingSink::new();

    let report = session.run(&mut source, transport, &mut sink).unwrap();

    assert_eq!(sink.accepted(), vec![(10, 36), (50, 180)]);
    assert_eq!(log.borrow().written, vec!["10;0;", "50;0;"]);
    assert_eq!(report.kind, ActuatorKind::StepperAngle);
    assert_eq!(report.samples_received, 3);
    assert_eq!(report.accepted, 2);
    assert_eq!(report.rejected, 1);
    assert_eq!(report.acknowledged, 2);
    assert_eq!(report.transport_errors, 0);
    assert_eq!(report.unprocessed_samples, 0);
    assert_eq!(report.truncated_responses, 0);
    assert!(!report.cancelled);
    assert!(source.log.unsubscribed);
    assert_eq!(log.borrow().closes, 1);
}

#[test]
fn write_failure_mid_session_runs_full_duration() {
    let session = Session::new(quick(ActuatorKind::Brightness, 150));
    let mut source = ScriptedSource::new(&[10, 20, 30, 40]);
    let transport = MockTransport::new().failing_write(1);
    let log = transport.log();

    let started = Instant::now();
    let report = session
        .run(&mut source, transport, &mut RecordingSink::new())
        .unwrap();

    assert!(started.elapsed() >= Duration::from_millis(150));
    assert!(report.elapsed_ms >= 150);
    assert_eq!(report.transport_errors, 1);
    assert_eq!(report.samples_received, 4);
    assert_eq!(report.commands_sent, 3);
    assert_eq!(log.borrow().written, vec!["10;0;", "30;0;", "40;0;"]);
    assert_eq!(log.borrow().closes, 1);
}

#[test]
fn invalid_samples_are_counted_not_fatal() {
    let session = Session::new(quick(ActuatorKind::ServoAngle, 60));
    let mut source = ScriptedSource::new(&[-5, 101, 50]);

    let report = session
        .run(&mut source, NullTransport::default(), &mut RecordingSink::new())
        .unwrap();

    assert_eq!(report.invalid_samples, 2);
    assert_eq!(report.accepted, 1);
    assert_eq!(
        report.samples_received,
        report.accepted + report.rejected + report.invalid_samples
    );
}

#[test]
fn settle_delay_precedes_the_control_window() {
    let config = SessionConfig {
        settle_delay_ms: 80,
        ..quick(ActuatorKind::Brightness, 20)
    };
    let session = Session::new(config);
    let started = Instant::now();
    session
        .run(&mut ScriptedSource::new(&[]), NullTransport::default(), &mut RecordingSink::new())
        .unwrap();
    assert!(started.elapsed() >= Duration::from_millis(100));
}

// ── Cancellation ─────────────────────────────────────────────

#[test]
fn cancel_handle_ends_session_early() {
    let session = Session::new(quick(ActuatorKind::ServoAngle, 60_000));
    let handle = session.cancel_handle();
    let canceller = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(50));
        handle.cancel();
    });

    let transport = MockTransport::new();
    let log = transport.log();
    let started = Instant::now();
    let report = session
        .run(&mut ScriptedSource::new(&[30]), transport, &mut RecordingSink::new())
        .unwrap();
    canceller.join().unwrap();

    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(report.cancelled);
    assert_eq!(report.accepted, 1);
    assert_eq!(log.borrow().closes, 1);
}

#[test]
fn stop_cuts_pacing_delay_short_but_finishes_read() {
    let config = SessionConfig {
        inter_command_delay_ms: 10_000,
        ..quick(ActuatorKind::StepperAngle, 80)
    };
    let session = Session::new(config);
    let mut sink = RecordingSink::new();

    let started = Instant::now();
    let report = session
        .run(&mut ScriptedSource::new(&[70, 90, 20, 95]), MockTransport::echoing(), &mut sink)
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(5));
    // Only the in-flight sample completes; the queued ones are counted.
    assert_eq!(report.samples_received, 1);
    assert_eq!(report.unprocessed_samples, 3);
    assert_eq!(report.dropped_samples, 0);
    assert_eq!(report.commands_sent, 1);
    assert_eq!(report.acknowledged, 1);
    assert_eq!(sink.responses(), vec![("70;0;".to_string(), true)]);
}

#[test]
fn cancel_before_run_skips_control_window() {
    let session = Session::new(quick(ActuatorKind::Brightness, 60_000));
    session.cancel_handle().cancel();
    let mut source = ScriptedSource::new(&[10]);
    let transport = MockTransport::new();
    let log = transport.log();

    let report = session
        .run(&mut source, transport, &mut RecordingSink::new())
        .unwrap();

    assert!(report.cancelled);
    assert_eq!(report.samples_received, 0);
    assert!(!source.log.subscribed);
    assert_eq!(log.borrow().closes, 1);
}
