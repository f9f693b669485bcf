//! Remote identity and per-connection session identifiers.
//!
//! A [`RemoteIdentity`] names a physical remote by its 6-octet Bluetooth
//! device address.  It is parsed once (from the transport, or from the first
//! field of a mapping-file line) and carried immutably from then on; two
//! remotes never compare equal unless their addresses are identical.
//!
//! A [`SessionId`] names one connection *instance*.  Reconnecting the same
//! remote yields the same identity but a fresh session id, which keeps log
//! lines from separate connect/disconnect cycles apart.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Error returned when an address string cannot be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid remote address {0:?}: expected six hex octets like AA:BB:CC:DD:EE:FF")]
pub struct InvalidAddress(pub String);

/// Stable identifier of a physical remote, derived from its transport address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RemoteIdentity([u8; 6]);

impl RemoteIdentity {
    /// Builds an identity from raw address octets, most significant first.
    pub const fn from_octets(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    /// Returns the address octets, most significant first.
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl FromStr for RemoteIdentity {
    type Err = InvalidAddress;

    /// Parses `AA:BB:CC:DD:EE:FF` or `aa-bb-cc-dd-ee-ff`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidAddress(s.to_string());
        let trimmed = s.trim();
        let mut octets = [0u8; 6];
        let mut parts = trimmed.split(|c: char| c == ':' || c == '-');

        for octet in octets.iter_mut() {
            let part = parts.next().ok_or_else(invalid)?;
            if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(invalid());
            }
            *octet = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
        }
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(Self(octets))
    }
}

impl fmt::Display for RemoteIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}")
    }
}

/// Identifier of one connection instance of a remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generates a fresh random session id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
