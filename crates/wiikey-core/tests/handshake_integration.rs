//! Integration tests driving a [`RemoteSession`] with raw frames.
//!
//! Each test feeds byte frames exactly as they would arrive from a remote
//! and checks the encoded outbound frames and key events that come back.

use wiikey_core::keymap::parse_mapping_file;
use wiikey_core::{
    encode_output_report, HandshakePhase, KeyCode, KeyDispatch, KeyEvent, LedSet, MappingTable,
    OutputReport, RemoteIdentity, RemoteSession,
};

const MAPPING: &str = "AA:BB:CC:DD:EE:FF,0x01,0x02,0x03,0x04,0x05,0x06,0x07,0x08,0x09,0x0A\n";

fn identity() -> RemoteIdentity {
    "AA:BB:CC:DD:EE:FF".parse().expect("valid address")
}

fn mappings() -> MappingTable {
    let report = parse_mapping_file(MAPPING);
    assert!(report.is_clean());
    report.table
}

/// Feeds `frame` and returns the encoded outbound frames.
fn feed(session: &mut RemoteSession, frame: &[u8], table: &MappingTable) -> Vec<Vec<u8>> {
    session
        .handle_frame(frame, KeyDispatch::Enabled, table)
        .outbound
        .iter()
        .map(|r| encode_output_report(r).expect("encode must succeed"))
        .collect()
}

fn write_frame(register_low: u8, value: u8) -> Vec<u8> {
    let mut frame = vec![0xA2, 0x16, 0x04, 0xA4, 0x00, register_low, 0x01, value];
    frame.resize(23, 0x00);
    frame
}

const STATUS_WITH_EXTENSION: [u8; 8] = [0xA1, 0x20, 0x00, 0x00, 0x02, 0x00, 0x00, 0xC8];
const STATUS_WITHOUT_EXTENSION: [u8; 8] = [0xA1, 0x20, 0x00, 0x00, 0x00, 0x00, 0x00, 0xC8];
const ACK: [u8; 6] = [0xA1, 0x22, 0x00, 0x00, 0x16, 0x00];

#[test]
fn test_attach_handshake_emits_exact_wire_frames() {
    // Arrange
    let table = mappings();
    let mut session = RemoteSession::new(identity());

    // Act / Assert
    assert_eq!(feed(&mut session, &STATUS_WITH_EXTENSION, &table), vec![write_frame(0xF0, 0x55)]);
    assert_eq!(session.phase(), HandshakePhase::AwaitingFirstAck);

    assert_eq!(feed(&mut session, &ACK, &table), vec![write_frame(0xFB, 0x00)]);
    assert_eq!(session.phase(), HandshakePhase::AwaitingSecondAck);

    assert_eq!(feed(&mut session, &ACK, &table), vec![vec![0xA2, 0x12, 0x00, 0x32]]);
    assert_eq!(session.phase(), HandshakePhase::Streaming);
}

#[test]
fn test_detach_mid_handshake_emits_core_mode_and_reattach_restarts() {
    let table = mappings();
    let mut session = RemoteSession::new(identity());
    feed(&mut session, &STATUS_WITH_EXTENSION, &table);
    feed(&mut session, &ACK, &table);

    assert_eq!(
        feed(&mut session, &STATUS_WITHOUT_EXTENSION, &table),
        vec![vec![0xA2, 0x12, 0x00, 0x30]]
    );
    assert_eq!(session.phase(), HandshakePhase::Idle);

    assert_eq!(feed(&mut session, &STATUS_WITH_EXTENSION, &table), vec![write_frame(0xF0, 0x55)]);
}

#[test]
fn test_strum_and_fret_produce_key_down_and_up() {
    // Arrange – bring the guitar online
    let table = mappings();
    let mut session = RemoteSession::new(identity());
    for frame in [&STATUS_WITH_EXTENSION[..], &ACK[..], &ACK[..]] {
        feed(&mut session, frame, &table);
    }

    // Act – green fret (byte 9 bit 4) and strum up (byte 9 bit 0) together
    let pressed = [0xA1, 0x32, 0x00, 0x00, 0, 0, 0, 0x00, 0xFF, 0xEE];
    let released = [0xA1, 0x32, 0x00, 0x00, 0, 0, 0, 0x00, 0xFF, 0xFF];
    let down = session.handle_frame(&pressed, KeyDispatch::Enabled, &table);
    let held = session.handle_frame(&pressed, KeyDispatch::Enabled, &table);
    let up = session.handle_frame(&released, KeyDispatch::Enabled, &table);

    // Assert
    let keys = |events: &[KeyEvent]| -> Vec<(KeyCode, bool)> {
        events.iter().map(|e| (e.key, e.pressed)).collect()
    };
    assert_eq!(keys(&down.key_events), vec![(KeyCode(0x01), true), (KeyCode(0x06), true)]);
    assert!(held.key_events.is_empty());
    assert_eq!(keys(&up.key_events), vec![(KeyCode(0x01), false), (KeyCode(0x06), false)]);
}

#[test]
fn test_greeting_and_led_commands_encode_with_rumble_bit() {
    let mut session = RemoteSession::new(identity());

    let greeting = session.greeting(LedSet::ALL);
    assert_eq!(encode_output_report(&greeting), Ok(vec![0xA2, 0x11, 0xF0]));

    let rumble = session.set_rumble(true);
    assert_eq!(encode_output_report(&rumble), Ok(vec![0xA2, 0x10, 0x01]));

    let pattern = LedSet([false, true, false, false]);
    let leds = session.set_leds(pattern);
    assert_eq!(
        leds,
        OutputReport::SetLeds {
            leds: pattern,
            rumble: true
        }
    );
    assert_eq!(encode_output_report(&leds), Ok(vec![0xA2, 0x11, 0x21]));
}
