//! Guitar extension controls and the bit-level decoding of its data window.
//!
//! The guitar reports its state in three bytes of every `0x32` data report.
//! Buttons are active-low (a cleared bit means "pressed"); the whammy bar is
//! a 5-bit axis that counts as engaged once it passes a fixed threshold.
//!
//! ```text
//! byte 0: [..][..][..][whammy:5]
//! byte 1: [..][strum down][..][plus][..][minus][..][..]
//! byte 2: [orange][red][blue][green][yellow][..][..][strum up]
//! ```

use serde::{Deserialize, Serialize};

use crate::protocol::messages::DataRecord;

/// Number of discrete controls tracked per remote.
pub const CONTROL_COUNT: usize = 10;

/// Whammy values above this count as engaged.
pub const WHAMMY_THRESHOLD: u8 = 20;

const WHAMMY_MASK: u8 = 0b0001_1111;

/// One discrete guitar control.
///
/// The discriminant is the control's index into a mapping entry, so the
/// order here fixes the column order of the mapping file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum GuitarControl {
    FretGreen = 0,
    FretRed = 1,
    FretYellow = 2,
    FretBlue = 3,
    FretOrange = 4,
    StrumUp = 5,
    StrumDown = 6,
    Plus = 7,
    Minus = 8,
    Whammy = 9,
}

impl GuitarControl {
    /// All controls in index order.
    pub const ALL: [GuitarControl; CONTROL_COUNT] = [
        GuitarControl::FretGreen,
        GuitarControl::FretRed,
        GuitarControl::FretYellow,
        GuitarControl::FretBlue,
        GuitarControl::FretOrange,
        GuitarControl::StrumUp,
        GuitarControl::StrumDown,
        GuitarControl::Plus,
        GuitarControl::Minus,
        GuitarControl::Whammy,
    ];

    /// Position of this control in a mapping entry (0–9).
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Decoded snapshot of the ten guitar controls.
///
/// The default value (everything released) is the baseline before the first
/// data report arrives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerSample {
    pub whammy_engaged: bool,
    pub plus: bool,
    pub minus: bool,
    pub strum_up: bool,
    pub strum_down: bool,
    pub fret_green: bool,
    pub fret_red: bool,
    pub fret_yellow: bool,
    pub fret_blue: bool,
    pub fret_orange: bool,
}

impl ControllerSample {
    /// Decodes the 3-byte guitar window of a data report.
    pub fn from_extension_bytes(bytes: [u8; 3]) -> Self {
        let [axis, b1, b2] = bytes;
        let released = |byte: u8, mask: u8| byte & mask != 0;

        Self {
            whammy_engaged: (axis & WHAMMY_MASK) > WHAMMY_THRESHOLD,
            plus: !released(b1, 0b0001_0000),
            minus: !released(b1, 0b0000_0100),
            strum_up: !released(b2, 0b0000_0001),
            strum_down: !released(b1, 0b0100_0000),
            fret_green: !released(b2, 0b0001_0000),
            fret_red: !released(b2, 0b0100_0000),
            fret_yellow: !released(b2, 0b0000_1000),
            fret_blue: !released(b2, 0b0010_0000),
            fret_orange: !released(b2, 0b1000_0000),
        }
    }

    /// Returns the state of a single control.
    pub fn get(&self, control: GuitarControl) -> bool {
        match control {
            GuitarControl::FretGreen => self.fret_green,
            GuitarControl::FretRed => self.fret_red,
            GuitarControl::FretYellow => self.fret_yellow,
            GuitarControl::FretBlue => self.fret_blue,
            GuitarControl::FretOrange => self.fret_orange,
            GuitarControl::StrumUp => self.strum_up,
            GuitarControl::StrumDown => self.strum_down,
            GuitarControl::Plus => self.plus,
            GuitarControl::Minus => self.minus,
            GuitarControl::Whammy => self.whammy_engaged,
        }
    }

    /// All control states in index order.
    pub fn controls(&self) -> [bool; CONTROL_COUNT] {
        GuitarControl::ALL.map(|c| self.get(c))
    }
}

impl From<DataRecord> for ControllerSample {
    fn from(record: DataRecord) -> Self {
        Self::from_extension_bytes(record.extension_bytes)
    }
}
