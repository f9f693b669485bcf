//! Application layer use cases for the host.
//!
//! # What use cases does the host have?
//!
//! - **`inject_keys`** – Hands the key events produced by a session to the
//!   OS.  The actual OS call is made by a `KeyInjector` implementation that
//!   is injected at construction time.
//!
//! - **`run_session`** – Drives one connected remote: pulls inbound frames
//!   off its link in arrival order, feeds them through the protocol state
//!   machine, sends the resulting control frames back, and injects keys.
//!   Also defines the `FrameSink` seam the transport implements.

pub mod inject_keys;
pub mod run_session;
