//! Extension initialisation handshake.
//!
//! A freshly attached extension will not report usable data until two
//! register writes have been acknowledged and the remote has been switched
//! into the combined core+extension reporting mode.  Each step waits for the
//! acknowledgement of the previous one, so there is never more than one write
//! outstanding:
//!
//! ```text
//!            attach / write 0x55 -> A400F0
//!   Idle ─────────────────────────────────► AwaitingFirstAck
//!    ▲                                          │ ack / write 0x00 -> A400FB
//!    │                                          ▼
//!    │ detach / mode 0x30               AwaitingSecondAck
//!    │ (from any phase)                         │ ack / mode 0x32
//!    └──────────────────────────────── Streaming ◄┘
//! ```
//!
//! An acknowledgement that arrives while no write is pending (in `Idle` or
//! `Streaming`) is reported as [`HandshakeError::UnexpectedAck`] and does not
//! move the phase.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol::messages::{OutputReport, ReportMode};

/// Where a session is in the extension attach cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandshakePhase {
    /// No extension, or extension not yet initialised.
    #[default]
    Idle,
    /// First register write sent; waiting for its ack.
    AwaitingFirstAck,
    /// Second register write sent; waiting for its ack.
    AwaitingSecondAck,
    /// Combined reporting enabled; extension data is meaningful.
    Streaming,
}

/// Errors raised by the handshake state machine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HandshakeError {
    /// An ack arrived while no handshake write was outstanding.
    #[error("unexpected ack for report 0x{report_id:02X} in phase {phase:?}")]
    UnexpectedAck { phase: HandshakePhase, report_id: u8 },
}

/// Per-session extension handshake.
#[derive(Debug, Default)]
pub struct ExtensionHandshake {
    phase: HandshakePhase,
}

impl ExtensionHandshake {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> HandshakePhase {
        self.phase
    }

    /// An extension was plugged in.  Starts the init sequence.
    pub fn on_attach(&mut self) -> OutputReport {
        self.phase = HandshakePhase::AwaitingFirstAck;
        OutputReport::extension_init_step_1()
    }

    /// The extension was unplugged.  Resets to `Idle` from any phase and
    /// drops the remote back to core-only reporting.
    pub fn on_detach(&mut self) -> OutputReport {
        self.phase = HandshakePhase::Idle;
        OutputReport::report_mode(ReportMode::CoreOnly)
    }

    /// An acknowledgement arrived.  Advances one step and returns the next
    /// command to send.
    ///
    /// # Errors
    ///
    /// Returns [`HandshakeError::UnexpectedAck`] in `Idle` or `Streaming`.
    pub fn on_ack(&mut self, report_id: u8) -> Result<OutputReport, HandshakeError> {
        match self.phase {
            HandshakePhase::AwaitingFirstAck => {
                self.phase = HandshakePhase::AwaitingSecondAck;
                Ok(OutputReport::extension_init_step_2())
            }
            HandshakePhase::AwaitingSecondAck => {
                self.phase = HandshakePhase::Streaming;
                Ok(OutputReport::report_mode(ReportMode::CoreExtension))
            }
            phase @ (HandshakePhase::Idle | HandshakePhase::Streaming) => {
                Err(HandshakeError::UnexpectedAck { phase, report_id })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_handshake_is_idle() {
        let hs = ExtensionHandshake::new();
        assert_eq!(hs.phase(), HandshakePhase::Idle);
    }

    #[test]
    fn test_full_sequence_emits_steps_in_order() {
        // Arrange
        let mut hs = ExtensionHandshake::new();

        // Act / Assert – attach
        assert_eq!(hs.on_attach(), OutputReport::extension_init_step_1());
        assert_eq!(hs.phase(), HandshakePhase::AwaitingFirstAck);

        // first ack
        assert_eq!(hs.on_ack(0x16), Ok(OutputReport::extension_init_step_2()));
        assert_eq!(hs.phase(), HandshakePhase::AwaitingSecondAck);

        // second ack
        assert_eq!(
            hs.on_ack(0x16),
            Ok(OutputReport::report_mode(ReportMode::CoreExtension))
        );
        assert_eq!(hs.phase(), HandshakePhase::Streaming);
    }

    #[test]
    fn test_ack_while_idle_is_rejected_without_phase_change() {
        let mut hs = ExtensionHandshake::new();
        assert_eq!(
            hs.on_ack(0x11),
            Err(HandshakeError::UnexpectedAck {
                phase: HandshakePhase::Idle,
                report_id: 0x11,
            })
        );
        assert_eq!(hs.phase(), HandshakePhase::Idle);
    }

    #[test]
    fn test_ack_while_streaming_is_rejected_without_phase_change() {
        let mut hs = ExtensionHandshake::new();
        hs.on_attach();
        hs.on_ack(0x16).unwrap();
        hs.on_ack(0x16).unwrap();

        assert!(matches!(
            hs.on_ack(0x12),
            Err(HandshakeError::UnexpectedAck { phase: HandshakePhase::Streaming, .. })
        ));
        assert_eq!(hs.phase(), HandshakePhase::Streaming);
    }

    #[test]
    fn test_detach_from_every_phase_resets_to_idle() {
        for acks in 0..=2 {
            // Arrange – drive into AwaitingFirstAck, AwaitingSecondAck, Streaming
            let mut hs = ExtensionHandshake::new();
            hs.on_attach();
            for _ in 0..acks {
                hs.on_ack(0x16).unwrap();
            }

            // Act
            let report = hs.on_detach();

            // Assert
            assert_eq!(report, OutputReport::report_mode(ReportMode::CoreOnly));
            assert_eq!(hs.phase(), HandshakePhase::Idle);
        }
    }

    #[test]
    fn test_reattach_after_detach_restarts_sequence() {
        let mut hs = ExtensionHandshake::new();
        hs.on_attach();
        hs.on_ack(0x16).unwrap();
        hs.on_detach();

        assert_eq!(hs.on_attach(), OutputReport::extension_init_step_1());
        assert_eq!(hs.phase(), HandshakePhase::AwaitingFirstAck);
    }
}
