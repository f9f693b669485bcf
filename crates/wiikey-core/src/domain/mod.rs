//! Domain entities for one connected remote.
//!
//! Nothing in here touches a socket, a Bluetooth stack or the OS input
//! layer.  Every type is plain data plus the state machines that act on it,
//! so the whole module can be exercised from unit tests with byte arrays.
//!
//! # How the pieces fit (for beginners)
//!
//! - **`identity`** – who a remote is ([`RemoteIdentity`](identity::RemoteIdentity))
//!   and which connection instance we are looking at
//!   ([`SessionId`](identity::SessionId)).
//! - **`guitar`** – the ten guitar controls and how three raw bytes decode
//!   into a [`ControllerSample`](guitar::ControllerSample).
//! - **`handshake`** – the register writes needed before the guitar streams.
//! - **`tracker`** – compares consecutive samples and reports what flipped.
//! - **`session`** – glues the above together for one remote.

pub mod guitar;
pub mod handshake;
pub mod identity;
pub mod session;
pub mod tracker;
