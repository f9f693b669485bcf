//! Report codec: classifies inbound frames and encodes outbound commands.
//!
//! Inbound wire format:
//! ```text
//! [0xA1][report_id:1][payload:N]
//!
//! 0x20 status  : [A1][20][buttons:2][flags:1][reserved:2][battery:1]
//!                flags bit0 = low battery, bit1 = extension present
//! 0x22 ack     : [A1][22][buttons:2][report_id:1][error:1]
//! 0x32 core+ext: [A1][32][buttons:2][ext:8]
//!                guitar window = bytes 7..=9
//! ```
//!
//! Outbound wire format:
//! ```text
//! [0xA2][report_id:1][payload:N]
//!
//! 0x10 rumble      : [rumble:1]
//! 0x11 LEDs        : [leds<<4 | rumble:1]
//! 0x12 report mode : [continuous:1][mode:1]
//! 0x16 write memory: [space:1][addr:3 big-endian][size:1][data:16 zero-padded]
//! ```
//!
//! Decoding never indexes past the end of the input: every report type has a
//! minimum length that is checked before any field is read.

use thiserror::Error;

use crate::protocol::messages::{
    AckRecord, DataRecord, InboundReport, OutputReport, StatusRecord, ACK_MIN_LEN,
    ADDRESS_SPACE_REGISTERS, DATA_MIN_LEN, EXTENSION_WINDOW_OFFSET, OUTPUT_PREFIX, REPORT_ACK,
    REPORT_CORE_EXTENSION, REPORT_STATUS, STATUS_MIN_LEN, WRITE_MEMORY_DATA_LEN,
};

/// Errors produced while decoding or encoding reports.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReportError {
    /// The frame is too short to even carry a report ID.
    #[error("frame has no report id: {available} byte(s)")]
    MissingReportType { available: usize },

    /// The frame is shorter than the minimum length for its declared type.
    #[error("malformed 0x{report_type:02X} frame: need {needed} bytes, got {available}")]
    MalformedFrame {
        report_type: u8,
        needed: usize,
        available: usize,
    },

    /// A register write carries more data than one command can hold.
    #[error("register write of {len} bytes exceeds the {max}-byte limit")]
    PayloadTooLong { len: usize, max: usize },
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Classifies `frame` by its report ID and decodes the payload.
///
/// Report IDs other than `0x20`, `0x22`, and `0x32` decode to
/// [`InboundReport::Unrecognized`] whatever their length.
///
/// # Errors
///
/// Returns [`ReportError::MissingReportType`] for frames under two bytes and
/// [`ReportError::MalformedFrame`] for a recognized type that is too short.
///
/// # Examples
///
/// ```rust
/// use wiikey_core::protocol::{decode_report, InboundReport};
///
/// let frame = [0xA1, 0x22, 0x00, 0x00, 0x16, 0x00];
/// match decode_report(&frame).unwrap() {
///     InboundReport::Ack(ack) => assert_eq!(ack.report_id, 0x16),
///     other => panic!("unexpected {other:?}"),
/// }
/// ```
pub fn decode_report(frame: &[u8]) -> Result<InboundReport, ReportError> {
    let report_type = *frame.get(1).ok_or(ReportError::MissingReportType {
        available: frame.len(),
    })?;

    match report_type {
        REPORT_STATUS => {
            require_len(frame, report_type, STATUS_MIN_LEN)?;
            let flags = frame[4];
            Ok(InboundReport::Status(StatusRecord {
                battery_low: flags & 0x01 != 0,
                extension_present: flags & 0x02 != 0,
                battery_level: frame[7],
            }))
        }
        REPORT_ACK => {
            require_len(frame, report_type, ACK_MIN_LEN)?;
            Ok(InboundReport::Ack(AckRecord {
                report_id: frame[4],
                error_code: frame[5],
            }))
        }
        REPORT_CORE_EXTENSION => {
            require_len(frame, report_type, DATA_MIN_LEN)?;
            let mut extension_bytes = [0u8; 3];
            extension_bytes
                .copy_from_slice(&frame[EXTENSION_WINDOW_OFFSET..EXTENSION_WINDOW_OFFSET + 3]);
            Ok(InboundReport::Data(DataRecord { extension_bytes }))
        }
        other => Ok(InboundReport::Unrecognized(other)),
    }
}

/// Encodes an [`OutputReport`] into a complete outbound frame, header included.
///
/// # Errors
///
/// Returns [`ReportError::PayloadTooLong`] if a register write carries more
/// than 16 bytes.
///
/// # Examples
///
/// ```rust
/// use wiikey_core::protocol::{encode_output_report, OutputReport, ReportMode};
///
/// let report = OutputReport::report_mode(ReportMode::CoreExtension);
/// let bytes = encode_output_report(&report).unwrap();
/// assert_eq!(bytes, vec![0xA2, 0x12, 0x00, 0x32]);
/// ```
pub fn encode_output_report(report: &OutputReport) -> Result<Vec<u8>, ReportError> {
    let mut buf = vec![OUTPUT_PREFIX, report.report_id()];

    match report {
        OutputReport::SetLeds { leds, rumble } => {
            buf.push(leds.bits() | rumble_bit(*rumble));
        }
        OutputReport::SetRumble(rumble) => buf.push(rumble_bit(*rumble)),
        OutputReport::SetReportMode { continuous, mode } => {
            buf.push(if *continuous { 0x04 } else { 0x00 });
            buf.push(*mode as u8);
        }
        OutputReport::WriteRegister { address, data } => {
            if data.len() > WRITE_MEMORY_DATA_LEN {
                return Err(ReportError::PayloadTooLong {
                    len: data.len(),
                    max: WRITE_MEMORY_DATA_LEN,
                });
            }
            let addr = address.to_be_bytes();
            buf.push(ADDRESS_SPACE_REGISTERS);
            buf.extend_from_slice(&addr[1..4]);
            buf.push(data.len() as u8);
            buf.extend_from_slice(data);
            buf.resize(buf.len() + WRITE_MEMORY_DATA_LEN - data.len(), 0x00);
        }
    }

    Ok(buf)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn require_len(frame: &[u8], report_type: u8, needed: usize) -> Result<(), ReportError> {
    if frame.len() < needed {
        return Err(ReportError::MalformedFrame {
            report_type,
            needed,
            available: frame.len(),
        });
    }
    Ok(())
}

fn rumble_bit(rumble: bool) -> u8 {
    if rumble {
        0x01
    } else {
        0x00
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
