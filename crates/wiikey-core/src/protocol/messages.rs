//! Wii Remote HID report types, inbound and outbound.
//!
//! Every frame exchanged on the interrupt channel starts with a one-byte
//! transaction prefix followed by a one-byte report ID:
//!
//! ```text
//! inbound  (remote -> host): [0xA1][report_id][payload...]
//! outbound (host -> remote): [0xA2][report_id][payload...]
//! ```
//!
//! Only the handful of reports needed to bring a guitar extension online and
//! read its buttons are modelled here.  Anything else the remote sends is
//! surfaced as [`InboundReport::Unrecognized`] and ignored by the caller.

use serde::{Deserialize, Serialize};

// ── Frame prefixes ────────────────────────────────────────────────────────────

/// Transaction header byte for DATA | OUTPUT frames sent to the remote.
pub const OUTPUT_PREFIX: u8 = 0xA2;

// ── Inbound report IDs ────────────────────────────────────────────────────────

/// Status information (battery, extension, LEDs).
pub const REPORT_STATUS: u8 = 0x20;

/// Acknowledgement of an output report or memory write.
pub const REPORT_ACK: u8 = 0x22;

/// Core buttons plus 8 extension bytes.
pub const REPORT_CORE_EXTENSION: u8 = 0x32;

// ── Outbound report IDs ───────────────────────────────────────────────────────

pub const OUT_RUMBLE: u8 = 0x10;
pub const OUT_LEDS: u8 = 0x11;
pub const OUT_REPORT_MODE: u8 = 0x12;
pub const OUT_WRITE_MEMORY: u8 = 0x16;

/// Minimum frame length (prefix + report ID + payload) for each inbound type.
pub const STATUS_MIN_LEN: usize = 8;
pub const ACK_MIN_LEN: usize = 6;
pub const DATA_MIN_LEN: usize = 10;

/// Offset of the 3-byte guitar window inside a `0x32` frame.
pub const EXTENSION_WINDOW_OFFSET: usize = 7;

/// Number of data bytes carried by a single write-memory command.
pub const WRITE_MEMORY_DATA_LEN: usize = 16;

/// Address-space byte selecting the extension control registers.
pub const ADDRESS_SPACE_REGISTERS: u8 = 0x04;

/// Extension init register: write `0x55` here first.
pub const EXTENSION_INIT_REGISTER_1: u32 = 0xA4_00F0;

/// Extension init register: write `0x00` here second.
pub const EXTENSION_INIT_REGISTER_2: u32 = 0xA4_00FB;

// ── Inbound records ───────────────────────────────────────────────────────────

/// Decoded `0x20` status report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    /// Bit 0 of the flags byte.
    pub battery_low: bool,
    /// Bit 1 of the flags byte.
    pub extension_present: bool,
    /// Raw battery byte as reported (0–255).
    pub battery_level: u8,
}

/// Decoded `0x22` acknowledgement.  Echoed for observability only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckRecord {
    /// The output report ID being acknowledged.
    pub report_id: u8,
    /// Zero on success.
    pub error_code: u8,
}

/// Decoded `0x32` report.  Only the 3-byte guitar window is retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRecord {
    pub extension_bytes: [u8; 3],
}

/// A classified inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InboundReport {
    Status(StatusRecord),
    Ack(AckRecord),
    Data(DataRecord),
    /// A report ID this system does not handle.  Not an error.
    Unrecognized(u8),
}

// ── Outbound reports ──────────────────────────────────────────────────────────

/// The four player LEDs on the remote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedSet(pub [bool; 4]);

impl LedSet {
    /// All four LEDs lit.
    pub const ALL: LedSet = LedSet([true; 4]);

    /// Returns the LED nibble in bits 4–7 (LED1 = bit 4).
    pub fn bits(self) -> u8 {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, on)| **on)
            .fold(0u8, |acc, (i, _)| acc | (0x10 << i))
    }
}

/// Data reporting mode selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ReportMode {
    /// Core buttons only (`0x30`).
    CoreOnly = 0x30,
    /// Core buttons plus 8 extension bytes (`0x32`).
    CoreExtension = 0x32,
}

/// A control frame sent to the remote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputReport {
    /// Player LEDs, with the current rumble state folded into bit 0.
    SetLeds { leds: LedSet, rumble: bool },
    /// Rumble motor on or off.
    SetRumble(bool),
    /// Write up to 16 bytes into the remote's register space.
    WriteRegister { address: u32, data: Vec<u8> },
    /// Select the data reporting mode.
    SetReportMode { continuous: bool, mode: ReportMode },
}

impl OutputReport {
    /// First extension init step: `0x55` to `0xA400F0`.
    pub fn extension_init_step_1() -> Self {
        OutputReport::WriteRegister {
            address: EXTENSION_INIT_REGISTER_1,
            data: vec![0x55],
        }
    }

    /// Second extension init step: `0x00` to `0xA400FB`.
    pub fn extension_init_step_2() -> Self {
        OutputReport::WriteRegister {
            address: EXTENSION_INIT_REGISTER_2,
            data: vec![0x00],
        }
    }

    /// Non-continuous reporting in the given mode.
    pub fn report_mode(mode: ReportMode) -> Self {
        OutputReport::SetReportMode {
            continuous: false,
            mode,
        }
    }

    /// Returns the outbound report ID for this command.
    pub fn report_id(&self) -> u8 {
        match self {
            OutputReport::SetLeds { .. } => OUT_LEDS,
            OutputReport::SetRumble(_) => OUT_RUMBLE,
            OutputReport::WriteRegister { .. } => OUT_WRITE_MEMORY,
            OutputReport::SetReportMode { .. } => OUT_REPORT_MODE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_led_set_bits_maps_led1_to_bit4() {
        assert_eq!(LedSet([true, false, false, false]).bits(), 0x10);
        assert_eq!(LedSet([false, false, false, true]).bits(), 0x80);
    }

    #[test]
    fn test_led_set_all_is_f0() {
        assert_eq!(LedSet::ALL.bits(), 0xF0);
        assert_eq!(LedSet::default().bits(), 0x00);
    }

    #[test]
    fn test_extension_init_steps_target_expected_registers() {
        assert_eq!(
            OutputReport::extension_init_step_1(),
            OutputReport::WriteRegister {
                address: 0xA400F0,
                data: vec![0x55],
            }
        );
        assert_eq!(
            OutputReport::extension_init_step_2(),
            OutputReport::WriteRegister {
                address: 0xA400FB,
                data: vec![0x00],
            }
        );
    }

    #[test]
    fn test_report_ids_match_wire_values() {
        assert_eq!(OutputReport::SetRumble(true).report_id(), 0x10);
        let leds = OutputReport::SetLeds {
            leds: LedSet::ALL,
            rumble: false,
        };
        assert_eq!(leds.report_id(), 0x11);
        assert_eq!(OutputReport::report_mode(ReportMode::CoreOnly).report_id(), 0x12);
        assert_eq!(OutputReport::extension_init_step_1().report_id(), 0x16);
    }
}
