//! Per-remote protocol orchestration.
//!
//! A [`RemoteSession`] owns everything the host knows about one connected
//! remote: its status flags, the extension handshake, the edge-detection
//! baseline and the rumble state folded into outbound LED frames.
//!
//! The session does no I/O.  Each inbound frame goes in through
//! [`RemoteSession::handle_frame`] and a [`SessionOutput`] comes back holding
//! the control frames to send to the remote and the key events to hand to the
//! OS layer.  The caller must feed frames from one remote strictly in arrival
//! order.
//!
//! # Dispatch gating
//!
//! Whether key events may be produced is passed in per call as a
//! [`KeyDispatch`].  While dispatch is suppressed, data reports are ignored
//! and the tracker baseline is left where it was, so the first sample after
//! dispatch is re-enabled is diffed against the last *dispatched* state.

use tracing::{debug, trace, warn};

use crate::domain::guitar::{ControllerSample, GuitarControl};
use crate::domain::handshake::{ExtensionHandshake, HandshakePhase};
use crate::domain::identity::{RemoteIdentity, SessionId};
use crate::domain::tracker::ControllerStateTracker;
use crate::keymap::{KeyCode, MappingTable};
use crate::protocol::codec::decode_report;
use crate::protocol::messages::{
    AckRecord, DataRecord, InboundReport, LedSet, OutputReport, ReportMode, StatusRecord,
};

// ── Per-call context ──────────────────────────────────────────────────────────

/// Whether detected transitions may be turned into key events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDispatch {
    Enabled,
    Suppressed,
}

impl KeyDispatch {
    pub fn from_enabled(enabled: bool) -> Self {
        if enabled {
            KeyDispatch::Enabled
        } else {
            KeyDispatch::Suppressed
        }
    }

    pub fn is_enabled(self) -> bool {
        self == KeyDispatch::Enabled
    }
}

// ── Outputs ───────────────────────────────────────────────────────────────────

/// A key-down (`pressed = true`) or key-up intent for the OS layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: KeyCode,
    pub pressed: bool,
    /// The guitar control that produced this event.
    pub control: GuitarControl,
}

/// Everything produced by handling one inbound frame.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SessionOutput {
    /// Control frames to send back to the remote, in order.
    pub outbound: Vec<OutputReport>,
    /// Key intents, in control index order.
    pub key_events: Vec<KeyEvent>,
    /// `true` when a status report changed battery or extension flags.
    pub status_changed: bool,
}

impl SessionOutput {
    pub fn is_empty(&self) -> bool {
        self.outbound.is_empty() && self.key_events.is_empty() && !self.status_changed
    }
}

// ── Session ───────────────────────────────────────────────────────────────────

/// Protocol state for one connected remote.
#[derive(Debug)]
pub struct RemoteSession {
    identity: RemoteIdentity,
    session_id: SessionId,
    connected: bool,
    extension_present: bool,
    low_battery: bool,
    battery_level: u8,
    rumble: bool,
    handshake: ExtensionHandshake,
    tracker: ControllerStateTracker,
}

impl RemoteSession {
    /// Creates the session for a freshly established channel.
    pub fn new(identity: RemoteIdentity) -> Self {
        Self {
            identity,
            session_id: SessionId::new(),
            connected: true,
            extension_present: false,
            low_battery: false,
            battery_level: 0,
            rumble: false,
            handshake: ExtensionHandshake::new(),
            tracker: ControllerStateTracker::new(),
        }
    }

    pub fn identity(&self) -> RemoteIdentity {
        self.identity
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn extension_present(&self) -> bool {
        self.extension_present
    }

    pub fn low_battery(&self) -> bool {
        self.low_battery
    }

    pub fn battery_level(&self) -> u8 {
        self.battery_level
    }

    pub fn phase(&self) -> HandshakePhase {
        self.handshake.phase()
    }

    pub fn last_sample(&self) -> ControllerSample {
        self.tracker.baseline()
    }

    /// Frame to send right after the channel opens: the initial LED pattern.
    pub fn greeting(&self, leds: LedSet) -> OutputReport {
        self.set_leds(leds)
    }

    /// Builds an LED command, folding in the current rumble state.
    pub fn set_leds(&self, leds: LedSet) -> OutputReport {
        OutputReport::SetLeds {
            leds,
            rumble: self.rumble,
        }
    }

    /// Builds a rumble command and records the new rumble state so later
    /// LED commands carry it.
    pub fn set_rumble(&mut self, on: bool) -> OutputReport {
        self.rumble = on;
        OutputReport::SetRumble(on)
    }

    /// Marks the channel closed.  Every later frame is ignored.
    pub fn close(&mut self) {
        if self.connected {
            debug!(identity = %self.identity, session = %self.session_id, "session closed");
        }
        self.connected = false;
    }

    /// Decodes and handles one raw inbound frame.
    ///
    /// Malformed frames are logged and dropped without touching any state.
    pub fn handle_frame(
        &mut self,
        frame: &[u8],
        dispatch: KeyDispatch,
        mappings: &MappingTable,
    ) -> SessionOutput {
        if !self.connected {
            return SessionOutput::default();
        }
        match decode_report(frame) {
            Ok(report) => self.handle_report(report, dispatch, mappings),
            Err(e) => {
                warn!(identity = %self.identity, error = %e, "dropping malformed frame");
                SessionOutput::default()
            }
        }
    }

    /// Handles one already-decoded report.
    pub fn handle_report(
        &mut self,
        report: InboundReport,
        dispatch: KeyDispatch,
        mappings: &MappingTable,
    ) -> SessionOutput {
        if !self.connected {
            return SessionOutput::default();
        }
        match report {
            InboundReport::Status(status) => self.on_status(status),
            InboundReport::Ack(ack) => self.on_ack(ack),
            InboundReport::Data(data) => self.on_data(data, dispatch, mappings),
            InboundReport::Unrecognized(report_type) => {
                trace!(
                    identity = %self.identity,
                    report_type = %format_args!("0x{report_type:02X}"),
                    "ignoring report"
                );
                SessionOutput::default()
            }
        }
    }

    fn on_status(&mut self, status: StatusRecord) -> SessionOutput {
        let mut out = SessionOutput {
            status_changed: status.battery_low != self.low_battery
                || status.extension_present != self.extension_present
                || status.battery_level != self.battery_level,
            ..SessionOutput::default()
        };

        let was_present = self.extension_present;
        self.low_battery = status.battery_low;
        self.extension_present = status.extension_present;
        self.battery_level = status.battery_level;

        match (was_present, status.extension_present) {
            (false, true) => {
                debug!(identity = %self.identity, "extension attached, starting init");
                out.outbound.push(self.handshake.on_attach());
            }
            (true, false) => {
                debug!(identity = %self.identity, "extension detached");
                out.outbound.push(self.handshake.on_detach());
            }
            // Every status report also resets the remote's reporting mode.
            (false, false) => out.outbound.push(OutputReport::report_mode(ReportMode::CoreOnly)),
            (true, true) => {}
        }
        out
    }

    fn on_ack(&mut self, ack: AckRecord) -> SessionOutput {
        debug!(
            identity = %self.identity,
            report_id = %format_args!("0x{:02X}", ack.report_id),
            error_code = %format_args!("0x{:02X}", ack.error_code),
            "ack"
        );
        let mut out = SessionOutput::default();
        match self.handshake.on_ack(ack.report_id) {
            Ok(next) => out.outbound.push(next),
            Err(e) => debug!(identity = %self.identity, error = %e, "ack ignored"),
        }
        out
    }

    fn on_data(
        &mut self,
        data: DataRecord,
        dispatch: KeyDispatch,
        mappings: &MappingTable,
    ) -> SessionOutput {
        let mut out = SessionOutput::default();
        if !self.extension_present
            || self.handshake.phase() != HandshakePhase::Streaming
            || !dispatch.is_enabled()
        {
            return out;
        }

        let sample = ControllerSample::from(data);
        for transition in self.tracker.observe(sample) {
            match mappings.lookup(self.identity, transition.control.index()) {
                Some(key) => out.key_events.push(KeyEvent {
                    key,
                    pressed: transition.pressed,
                    control: transition.control,
                }),
                None => {
                    trace!(identity = %self.identity, control = ?transition.control, "no mapping")
                }
            }
        }
        out
    }
}
