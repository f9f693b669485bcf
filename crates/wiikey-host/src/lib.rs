//! wiikey-host library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does wiikey-host do? (for beginners)
//!
//! `wiikey-core` knows how to talk to a Wii Remote but does no I/O.  This
//! crate supplies the moving parts around it:
//!
//! 1. Accepts an open channel per remote and runs one async task for it.
//! 2. Feeds the remote's inbound frames through the protocol state machine in
//!    arrival order and sends the resulting control frames back.
//! 3. Injects the resulting key presses and releases into the OS.
//! 4. Loads the TOML configuration and the key mapping file.

/// Application layer: use cases for the host.
pub mod application;

/// Infrastructure layer: transport adapters, session registry, OS key
/// injection, and storage.
pub mod infrastructure;
