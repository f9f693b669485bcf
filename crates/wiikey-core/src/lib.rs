//! # wiikey-core
//!
//! Protocol and domain logic for turning a Wii Remote guitar extension into
//! keyboard input.
//!
//! This crate has no dependencies on OS APIs, Bluetooth stacks or async
//! runtimes.  It is used by `wiikey-host`, which supplies the transport and
//! the key injection.
//!
//! # Architecture overview (for beginners)
//!
//! A Wii Remote talks to the host with small HID reports.  When a guitar
//! extension is plugged into it, the host has to run a short register-write
//! handshake before the remote starts sending the guitar's buttons.  After
//! that, every data report carries three bytes of guitar state, and each
//! button that changes is mapped to a key press or release.
//!
//! - **`protocol`** – How bytes look on the wire.  Inbound frames are
//!   classified into status, ack and data reports; outbound commands are
//!   encoded into the exact frames the remote expects.
//!
//! - **`domain`** – The per-remote state machines: the extension handshake,
//!   edge detection between samples, and the [`RemoteSession`] that ties them
//!   together.
//!
//! - **`keymap`** – Per-remote tables mapping each guitar control to a
//!   platform key code, plus the parser for the mapping file.

pub mod domain;
pub mod keymap;
pub mod protocol;

pub use domain::guitar::{ControllerSample, GuitarControl, CONTROL_COUNT};
pub use domain::handshake::{ExtensionHandshake, HandshakeError, HandshakePhase};
pub use domain::identity::{InvalidAddress, RemoteIdentity, SessionId};
pub use domain::session::{KeyDispatch, KeyEvent, RemoteSession, SessionOutput};
pub use domain::tracker::{ControllerStateTracker, Transition};
pub use keymap::{KeyCode, MappingEntry, MappingTable, SharedMappingTable};
pub use protocol::codec::{decode_report, encode_output_report, ReportError};
pub use protocol::messages::{InboundReport, LedSet, OutputReport, ReportMode};
