//! Infrastructure layer for the host.
//!
//! Contains the adapters around the application layer: channel
//! implementations, the session registry, key injection and on-disk storage.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `wiikey_core`, but MUST NOT be imported by the `application` layer.
//!
//! # Sub-modules
//!
//! - **`transport`** – `FrameSink` implementations and in-memory channel
//!   pairs, plus a capture-file replayer that drives a session without a
//!   real remote.
//!
//! - **`session_manager`** – Registry of live sessions keyed by remote
//!   identity.  Spawns one task per remote and routes operator commands.
//!
//! - **`key_injection`** – `KeyInjector` implementations: CoreGraphics on
//!   macOS, a logging injector elsewhere, and a recording injector for tests.
//!
//! - **`storage`** – TOML host configuration and mapping-file loading.

pub mod key_injection;
pub mod session_manager;
pub mod storage;
pub mod transport;
