//! Integration tests for the session controller.
//!
//! These drive `SessionController` through its public API with the in-memory
//! `MockTransport` and a `RecordingDisplay`, the same way the event loop does.

use std::sync::Arc;
use std::time::Duration;

use serial_tag_reader::bluetooth::{MockTransport, Peripheral, TransportKind};
use serial_tag_reader::config::ReaderConfig;
use serial_tag_reader::display::{LogEntry, RecordingDisplay, NO_DEVICES_PLACEHOLDER};
use serial_tag_reader::reader::{FinishReason, ReaderError, ReaderState};
use serial_tag_reader::session::{READ_COMMAND_FAILED, STATUS_PAIR_DEVICE, WRITE_FAILED};
use serial_tag_reader::state::{AppState, ConnectionStatus, View};
use serial_tag_reader::{SessionController, SessionError};
use tokio::time::Instant;

struct Harness {
    transport: Arc<MockTransport>,
    display: Arc<RecordingDisplay>,
    state: Arc<AppState>,
    controller: SessionController,
}

fn harness_with(transport: MockTransport) -> Harness {
    let transport = Arc::new(transport);
    let display = Arc::new(RecordingDisplay::new());
    let state = AppState::new();
    let controller = SessionController::new(
        transport.clone(),
        display.clone(),
        state.clone(),
        &ReaderConfig::default(),
    );
    Harness {
        transport,
        display,
        state,
        controller,
    }
}

fn harness() -> Harness {
    harness_with(MockTransport::new())
}

fn reader_device() -> Peripheral {
    Peripheral::new("00:06:66:AA:BB:CC", "EarTag Wand")
}

/// Harness already connected to a single discovered peripheral.
async fn connected() -> Harness {
    let mut h = harness();
    h.transport.set_peripherals(vec![reader_device()]);
    h.controller.discover().await.unwrap();
    h.controller.connect("1").await.unwrap();
    h.display.clear();
    h
}

// ── Discovery ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_discover_empty_reports_no_device() {
    let mut h = harness();

    let count = h.controller.discover().await.unwrap();

    assert_eq!(count, 0);
    assert_eq!(h.display.last_status().as_deref(), Some(STATUS_PAIR_DEVICE));
    assert_eq!(h.display.last_peripherals(), Some(vec![]));
    assert!(h.controller.peripherals().is_empty());
}

#[tokio::test]
async fn test_discover_empty_on_scanning_transport() {
    let mut h = harness_with(MockTransport::with_kind(TransportKind::Scan));

    h.controller.discover().await.unwrap();

    assert_eq!(
        h.display.last_status().as_deref(),
        Some("No Bluetooth Peripherals Discovered.")
    );
    // The placeholder text is what a terminal renders for the empty list.
    assert_eq!(NO_DEVICES_PLACEHOLDER, "No Bluetooth Devices");
}

#[tokio::test]
async fn test_discover_counts_with_plural() {
    let mut h = harness();

    h.transport.set_peripherals(vec![reader_device()]);
    assert_eq!(h.controller.discover().await.unwrap(), 1);
    assert_eq!(h.display.last_status().as_deref(), Some("Found 1 device."));

    h.transport.set_peripherals(vec![
        reader_device(),
        Peripheral::new("00:06:66:00:00:01", "Spare Wand"),
    ]);
    assert_eq!(h.controller.discover().await.unwrap(), 2);
    assert_eq!(h.display.last_status().as_deref(), Some("Found 2 devices."));
    assert_eq!(h.display.last_peripherals().unwrap().len(), 2);
}

#[tokio::test]
async fn test_discover_failure_notifies() {
    let mut h = harness();
    h.transport.set_peripherals(vec![reader_device()]);
    h.controller.discover().await.unwrap();

    h.transport.fail_list(Some("adapter powered off"));
    let err = h.controller.discover().await.unwrap_err();

    assert_eq!(err, SessionError::Discovery("adapter powered off".into()));
    assert_eq!(
        h.display.notifications(),
        vec!["ERROR: adapter powered off".to_string()]
    );
    // Previous candidates stay selectable.
    assert_eq!(h.controller.peripherals().len(), 1);
}

// ── Connect / disconnect ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_connect_by_index_shows_detail() {
    let mut h = harness();
    h.transport.set_peripherals(vec![reader_device()]);
    h.controller.discover().await.unwrap();

    h.controller.connect("1").await.unwrap();

    assert_eq!(h.transport.connected_to().as_deref(), Some("00:06:66:AA:BB:CC"));
    assert_eq!(h.display.last_status().as_deref(), Some("Connected"));
    assert_eq!(h.display.last_view(), Some(View::Detail));
    assert_eq!(h.state.get_status(), ConnectionStatus::Connected);
    assert_eq!(h.state.get_device().unwrap().name, "EarTag Wand");
    assert!(h.controller.is_connected());
}

#[tokio::test]
async fn test_connect_by_unknown_address() {
    let mut h = harness();

    h.controller.connect("00:11:22:33:44:55").await.unwrap();

    assert_eq!(h.transport.connected_to().as_deref(), Some("00:11:22:33:44:55"));
}

#[tokio::test]
async fn test_connect_failure_stays_on_discovery() {
    let mut h = harness();
    h.transport.fail_connect(Some("Host is down"));

    let err = h.controller.connect("00:11:22:33:44:55").await.unwrap_err();

    assert_eq!(err, SessionError::Connect("Host is down".into()));
    assert_eq!(h.display.notifications(), vec!["ERROR: Host is down".to_string()]);
    assert_eq!(h.display.last_view(), Some(View::Discovery));
    assert_eq!(h.state.get_status(), ConnectionStatus::Disconnected);
    assert!(!h.controller.is_connected());
}

#[tokio::test]
async fn test_subscribe_failure_is_a_connect_failure() {
    let mut h = harness();
    h.transport.fail_subscribe(Some("stream busy"));

    let err = h.controller.connect("00:11:22:33:44:55").await.unwrap_err();

    assert_eq!(err, SessionError::Connect("stream busy".into()));
    assert_eq!(h.transport.connected_to(), None);
    assert!(!h.controller.is_connected());
}

#[tokio::test]
async fn test_reconnect_tears_down_previous_session() {
    let mut h = connected().await;

    h.controller.connect("00:11:22:33:44:55").await.unwrap();

    assert_eq!(h.transport.connected_to().as_deref(), Some("00:11:22:33:44:55"));
    assert!(h.display.notifications().is_empty());
}

#[tokio::test]
async fn test_disconnect_returns_to_discovery() {
    let mut h = connected().await;

    h.controller.disconnect().await.unwrap();

    assert_eq!(h.display.last_view(), Some(View::Discovery));
    assert_eq!(h.state.get_status(), ConnectionStatus::Disconnected);
    assert!(!h.controller.is_connected());
}

#[tokio::test]
async fn test_disconnect_failure_still_cleans_up() {
    let mut h = connected().await;
    h.transport.fail_disconnect(Some("timeout"));

    let err = h.controller.disconnect().await.unwrap_err();

    assert_eq!(err, SessionError::Disconnect("timeout".into()));
    assert_eq!(h.display.notifications(), vec!["ERROR: timeout".to_string()]);
    assert_eq!(h.display.last_view(), Some(View::Discovery));
    assert!(!h.controller.is_connected());
}

// ── Send ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_send_logs_once_on_success() {
    let mut h = connected().await;

    h.controller.send("hello").await.unwrap();

    assert_eq!(h.transport.written(), vec!["hello\r\n".to_string()]);
    assert_eq!(h.display.log(), vec![LogEntry::Sent("hello".into())]);
    assert!(h.display.notifications().is_empty());
}

#[tokio::test]
async fn test_send_failure_notifies_without_log() {
    let mut h = connected().await;
    h.transport.fail_write(Some("broken pipe"));

    let err = h.controller.send("hello").await.unwrap_err();

    assert_eq!(err, SessionError::Write("broken pipe".into()));
    assert!(h.display.log().is_empty());
    assert_eq!(h.display.notifications(), vec![WRITE_FAILED.to_string()]);
    // Session stays open.
    assert!(h.controller.is_connected());
}

#[tokio::test]
async fn test_send_without_session_fails() {
    let mut h = harness();

    let err = h.controller.send("hello").await.unwrap_err();

    assert_eq!(err, SessionError::Write("not connected".into()));
    assert_eq!(h.display.notifications(), vec![WRITE_FAILED.to_string()]);
}

#[tokio::test]
async fn test_notification_does_not_block_next_operation() {
    let mut h = connected().await;
    h.transport.fail_write(Some("broken pipe"));
    assert!(h.controller.send("first").await.is_err());

    h.transport.fail_write(None);
    h.controller.send("second").await.unwrap();

    assert_eq!(h.display.log(), vec![LogEntry::Sent("second".into())]);
}

// ── Tag reads ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_start_read_writes_command() {
    let mut h = connected().await;

    h.controller.start_read().await.unwrap();

    assert_eq!(h.transport.written(), vec!["read\r\n".to_string()]);
    assert_eq!(h.display.log(), vec![LogEntry::ReadingTag]);
    assert!(matches!(h.controller.reader_state(), ReaderState::Reading(_)));
}

#[tokio::test]
async fn test_second_start_read_has_no_effect() {
    let mut h = connected().await;
    h.controller.start_read().await.unwrap();
    let deadline = h.controller.read_deadline();

    let err = h.controller.start_read().await.unwrap_err();

    assert_eq!(err, SessionError::Reader(ReaderError::AlreadyReading(1)));
    assert_eq!(h.transport.written().len(), 1);
    assert_eq!(h.display.log(), vec![LogEntry::ReadingTag]);
    assert!(h.display.notifications().is_empty());
    assert_eq!(h.controller.read_deadline(), deadline);
}

#[tokio::test]
async fn test_start_read_write_failure_stays_idle() {
    let mut h = connected().await;
    h.transport.fail_write(Some("broken pipe"));

    assert!(h.controller.start_read().await.is_err());

    assert_eq!(h.controller.reader_state(), &ReaderState::Idle);
    assert_eq!(h.display.notifications(), vec![READ_COMMAND_FAILED.to_string()]);
    assert!(h.display.log().is_empty());
}

#[tokio::test]
async fn test_echo_and_ack_are_not_tags() {
    let mut h = connected().await;
    h.controller.start_read().await.unwrap();

    assert_eq!(h.controller.on_receive("read\r"), None);
    assert_eq!(h.controller.on_receive("OK\r"), None);
    assert!(matches!(h.controller.reader_state(), ReaderState::Reading(_)));

    assert_eq!(h.controller.on_receive("1234\r"), Some("1234".to_string()));

    assert_eq!(h.controller.reader_state(), &ReaderState::Idle);
    assert_eq!(h.controller.read_deadline(), None);
    assert_eq!(
        h.display.log(),
        vec![
            LogEntry::ReadingTag,
            LogEntry::Received("read".into()),
            LogEntry::Received("OK".into()),
            LogEntry::Received("1234".into()),
            LogEntry::Tag("1234".into()),
        ]
    );
    assert_eq!(h.state.get_last_tag().as_deref(), Some("1234"));
}

#[tokio::test]
async fn test_blank_line_keeps_reading() {
    let mut h = connected().await;
    h.controller.start_read().await.unwrap();

    assert_eq!(h.controller.on_receive("\r"), None);
    assert!(matches!(h.controller.reader_state(), ReaderState::Reading(_)));
    assert_eq!(h.display.log().last(), Some(&LogEntry::Received(String::new())));
}

#[tokio::test]
async fn test_lines_while_idle_are_only_logged() {
    let mut h = connected().await;

    assert_eq!(h.controller.on_receive("1234"), None);

    assert_eq!(h.display.log(), vec![LogEntry::Received("1234".into())]);
}

#[tokio::test]
async fn test_deadline_after_tag_does_not_fire() {
    let mut h = connected().await;
    h.controller.start_read().await.unwrap();
    h.controller.on_receive("1234");

    let late = Instant::now() + Duration::from_secs(30);
    assert!(!h.controller.on_deadline(late));
}

#[tokio::test]
async fn test_line_after_deadline_is_not_a_tag() {
    let mut h = connected().await;
    h.controller.start_read().await.unwrap();

    let deadline = h.controller.read_deadline().unwrap();
    assert!(!h.controller.on_deadline(deadline - Duration::from_millis(1)));
    assert!(h.controller.on_deadline(deadline));

    assert_eq!(h.controller.on_receive("1234"), None);
    assert!(!h
        .display
        .log()
        .iter()
        .any(|entry| matches!(entry, LogEntry::Tag(_))));
}

#[tokio::test(start_paused = true)]
async fn test_late_line_is_not_a_tag_without_deadline_event() {
    let mut h = connected().await;
    h.controller.start_read().await.unwrap();

    // The deadline passes but nothing has handled it yet.
    tokio::time::advance(Duration::from_secs(12)).await;

    assert_eq!(h.controller.on_receive("1234"), None);
    assert_eq!(h.controller.reader_state(), &ReaderState::Idle);
    assert_eq!(h.controller.last_read_finish(), Some(FinishReason::TimedOut));
    assert_eq!(h.display.log().last(), Some(&LogEntry::Received("1234".into())));
    assert!(h.state.get_last_tag().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_line_just_before_deadline_is_a_tag() {
    let mut h = connected().await;
    h.controller.start_read().await.unwrap();

    tokio::time::advance(Duration::from_millis(10_990)).await;

    assert_eq!(h.controller.on_receive("1234"), Some("1234".to_string()));
    assert_eq!(h.controller.last_read_finish(), Some(FinishReason::TagReceived));
}

#[tokio::test]
async fn test_disconnect_abandons_pending_read() {
    let mut h = connected().await;
    h.controller.start_read().await.unwrap();

    h.controller.disconnect().await.unwrap();

    assert_eq!(h.controller.reader_state(), &ReaderState::Idle);
    assert_eq!(h.controller.last_read_finish(), Some(FinishReason::Abandoned));
}

#[tokio::test]
async fn test_link_lost_returns_to_discovery() {
    let mut h = connected().await;
    h.controller.start_read().await.unwrap();

    h.controller.on_link_lost();

    assert_eq!(h.display.notifications(), vec!["ERROR: connection lost".to_string()]);
    assert_eq!(h.display.last_view(), Some(View::Discovery));
    assert_eq!(h.controller.reader_state(), &ReaderState::Idle);
    assert_eq!(h.controller.last_read_finish(), Some(FinishReason::Abandoned));
    assert!(!h.controller.is_connected());
}
