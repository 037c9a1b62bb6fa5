//! End-to-end session behaviour against a scripted mock stream.

use std::io::ErrorKind;
use std::time::{Duration, Instant};

use msalib_core::Error;
use msalib_micronix::{Model, Msa400Builder, Preset, Session, SessionConfig, Setting};
use msalib_test_harness::MockStream;

const SWEEP_HEADER: &[u8] = b"CF 1.0G SP 2M RF -20 ST 0.1S RB 100K VB 100K SC 10\r\n";

/// A mock that expects the init command, and an open session over it.
fn open_session() -> (MockStream, Session<MockStream>) {
    let mut mock = MockStream::new();
    mock.expect(b"REFDBM\r\n", b"OK\r\n");
    let session = Msa400Builder::new(Model::Msa438)
        .poll_interval(Duration::from_millis(1))
        .build_with_stream(mock.clone())
        .expect("session opens");
    (mock, session)
}

#[test]
fn open_sends_level_unit_command_first() {
    let (mock, session) = open_session();
    assert!(session.is_open());
    assert_eq!(mock.sent_data(), vec![b"REFDBM\r\n".to_vec()]);
}

#[test]
fn get_and_set_wire_format() {
    let (mut mock, mut session) = open_session();
    mock.expect(b"SPAN?\r\n", b"2M\r\n");
    mock.expect(b"SPAN500K\r\n", b"OK\r\n");

    assert_eq!(session.get(Setting::Span).unwrap(), "2M");
    session.set(Setting::Span, "500k").unwrap();

    assert_eq!(mock.remaining_expectations(), 0);
    assert_eq!(
        mock.sent_bytes(),
        b"REFDBM\r\nSPAN?\r\nSPAN500K\r\n".to_vec()
    );
}

#[test]
fn rejected_value_writes_nothing() {
    let (mock, mut session) = open_session();
    let before = mock.sent_data().len();

    let err = session.set(Setting::Span, "7M").unwrap_err();
    match err {
        Error::Validation { value, expected } => {
            assert_eq!(value, "7M");
            assert!(expected.contains("200K"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(mock.sent_data().len(), before);
    assert!(session.is_open());
}

#[test]
fn measurement_mode_switches_off_first() {
    let (mut mock, mut session) = open_session();
    mock.expect(b"MEASOFF\r\n", b"OK\r\n");
    mock.expect(b"MEASCP\r\n", b"OK\r\n");

    session.set_by_name("meas", "cp").unwrap();

    let sent = mock.sent_data();
    assert_eq!(sent[1], b"MEASOFF\r\n");
    assert_eq!(sent[2], b"MEASCP\r\n");
}

#[test]
fn sweep_bridges_short_gaps() {
    let (mut mock, mut session) = open_session();
    mock.expect_bursts(
        b"SRSF\r\n",
        vec![
            (Duration::ZERO, SWEEP_HEADER.to_vec()),
            (Duration::from_millis(200), b"-45.2 -46.1\r\n".to_vec()),
            (Duration::from_millis(200), b"-44.9\r\n".to_vec()),
        ],
    );

    let record = session.sweep(true).unwrap();
    assert_eq!(record.center_freq_hz, 1_000_000_000);
    assert_eq!(record.span_hz, 2_000_000);
    assert_eq!(record.ref_level_dbm, -20.0);
    assert_eq!(record.amplitudes, vec![-45.2, -46.1, -44.9]);

    let points = record.points.expect("frequencies requested");
    assert_eq!(points.len(), 3);
    assert_eq!(points[0].freq_hz, 999_000_000);
    assert_eq!(points[1].freq_hz - points[0].freq_hz, 2_000);
}

#[test]
fn sweep_stops_after_idle_window() {
    let (mut mock, mut session) = open_session();
    mock.expect_bursts(
        b"SRSF\r\n",
        vec![
            (Duration::ZERO, SWEEP_HEADER.to_vec()),
            (Duration::ZERO, b"-50.0\r\n".to_vec()),
            (Duration::from_millis(1500), b"-60.0\r\n".to_vec()),
        ],
    );

    let start = Instant::now();
    let record = session.sweep(false).unwrap();
    let elapsed = start.elapsed();

    assert_eq!(record.amplitudes, vec![-50.0]);
    assert!(record.points.is_none());
    assert!(elapsed >= Duration::from_secs(1));
    assert!(elapsed < Duration::from_millis(1500));
}

#[test]
fn measurement_result_uses_short_idle_window() {
    let (mut mock, mut session) = open_session();
    mock.expect_bursts(
        b"MEASRES\r\n",
        vec![
            (Duration::ZERO, b"CP -12.3dBm\r\n".to_vec()),
            (Duration::from_millis(100), b"OBW 1.2M\r\n".to_vec()),
        ],
    );

    let result = session.measurement_result().unwrap();
    assert_eq!(result, "CP -12.3dBm\r\nOBW 1.2M");
}

#[test]
fn actions_send_their_commands() {
    let (mut mock, mut session) = open_session();
    for cmd in ["HOLD", "RUN", "FREQSETMK", "AUTO", "MKRRES"] {
        mock.expect(format!("{cmd}\r\n").as_bytes(), b"OK\r\n");
    }

    session.hold().unwrap();
    session.run().unwrap();
    session.freq_set_marker().unwrap();
    session.auto_tune().unwrap();
    session.marker_reset().unwrap();
    assert_eq!(mock.remaining_expectations(), 0);
}

#[test]
fn bytes_after_terminator_serve_next_reply() {
    let (mut mock, mut session) = open_session();
    mock.expect(b"FREQ?\r\n", b"1G\r\n2M\r\n");
    mock.expect(b"SPAN?\r\n", b"");

    assert_eq!(session.get(Setting::Freq).unwrap(), "1G");
    assert_eq!(session.get(Setting::Span).unwrap(), "2M");
}

#[test]
fn closed_session_is_not_connected() {
    let (mock, mut session) = open_session();
    session.close();

    assert!(!session.is_open());
    assert!(matches!(session.get(Setting::Freq), Err(Error::NotConnected)));
    assert!(matches!(session.hold(), Err(Error::NotConnected)));
    assert_eq!(mock.close_count(), 1);
}

#[test]
fn close_is_idempotent() {
    let (mock, mut session) = open_session();
    session.close();
    session.close();
    drop(session);
    assert_eq!(mock.close_count(), 1);

    let mut never_opened: Session<MockStream> = Session::new(SessionConfig::default());
    never_opened.close();
    never_opened.close();
    assert!(!never_opened.is_open());
}

#[test]
fn failed_init_closes_stream() {
    // No expectation for REFDBM: the init write is rejected.
    let mock = MockStream::new();
    let mut session = Session::new(SessionConfig::default());

    let err = session.open(mock.clone()).unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
    assert!(!session.is_open());
    assert!(session.stream().is_none());
    assert_eq!(mock.close_count(), 1);
}

#[test]
fn transport_error_leaves_session_open() {
    let (mut mock, mut session) = open_session();
    mock.fail_next_write(ErrorKind::BrokenPipe);
    mock.expect(b"TRG?\r\n", b"INT\r\n");

    assert!(matches!(session.get(Setting::Trg), Err(Error::Transport(_))));
    assert!(session.is_open());
    assert_eq!(session.get(Setting::Trg).unwrap(), "INT");
}

#[test]
fn read_error_keeps_partial_reply_for_next_command() {
    let (mut mock, mut session) = open_session();
    mock.expect_bursts(
        b"FREQ?\r\n",
        vec![
            (Duration::ZERO, b"1.".to_vec()),
            (Duration::from_millis(20), b"5G\r\n".to_vec()),
        ],
    );
    mock.fail_read_after(1, ErrorKind::TimedOut);

    assert!(matches!(session.get(Setting::Freq), Err(Error::Transport(_))));
    assert!(session.is_open());

    // The rest of the interrupted reply completes the next read.
    mock.expect(b"SPAN?\r\n", b"2M\r\n");
    assert_eq!(session.get(Setting::Span).unwrap(), "1.5G");
}

#[test]
fn preset_snapshot_reads_every_setting() {
    let (mut mock, mut session) = open_session();
    for setting in Setting::ALL {
        let query = format!("{}\r\n", setting.descriptor().query);
        mock.expect(query.as_bytes(), format!("V{}\r\n", setting as usize).as_bytes());
    }

    let preset = session.preset().unwrap();
    assert_eq!(preset.len(), 23);
    assert_eq!(preset.get(Setting::Freq), Some("V0"));
    assert_eq!(preset.get(Setting::PeakSearch), Some("V22"));
    assert_eq!(mock.remaining_expectations(), 0);
}

#[test]
fn apply_preset_writes_in_schema_order() {
    let (mut mock, mut session) = open_session();
    mock.expect(b"FREQ1G\r\n", b"OK\r\n");
    mock.expect(b"SPAN2M\r\n", b"OK\r\n");
    mock.expect(b"MEASOFF\r\n", b"OK\r\n");
    mock.expect(b"MEASOBW\r\n", b"OK\r\n");
    mock.expect(b"SWEEP0,1S\r\n", b"OK\r\n");

    let preset: Preset = serde_json::from_str(
        r#"{"sweep":"0.1S","meas":"obw","span":"2M","freq":"1G","bogus":"1"}"#,
    )
    .unwrap();
    session.apply_preset(&preset).unwrap();
    assert_eq!(mock.remaining_expectations(), 0);
}

#[test]
fn apply_preset_accepts_upper_case_names() {
    let (mut mock, mut session) = open_session();
    mock.expect(b"SPAN2M\r\n", b"OK\r\n");
    mock.expect(b"REF-25\r\n", b"OK\r\n");

    let preset: Preset = serde_json::from_str(r#"{"SPAN":"2M","Ref":"-2.5e1"}"#).unwrap();
    session.apply_preset(&preset).unwrap();
    assert_eq!(mock.remaining_expectations(), 0);
}

#[test]
fn apply_preset_validates_before_writing() {
    let (mock, mut session) = open_session();
    let preset: Preset =
        serde_json::from_str(r#"{"freq":"1G","scale":"3"}"#).unwrap();

    assert!(matches!(
        session.apply_preset(&preset),
        Err(Error::Validation { .. })
    ));
    assert_eq!(mock.sent_data().len(), 1);
}
