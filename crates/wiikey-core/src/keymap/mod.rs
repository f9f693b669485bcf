//! Per-remote key mapping tables.
//!
//! Each remote identity maps to exactly ten platform key codes, one per
//! [`GuitarControl`] in index order.  Tables are built whole (usually by
//! [`mapping_file::parse_mapping_file`]) and never edited in place; the
//! running system swaps a complete new table into a [`SharedMappingTable`].
//!
//! [`GuitarControl`]: crate::domain::guitar::GuitarControl
//!
//! # Snapshot semantics
//!
//! The live table sits behind `RwLock<Arc<MappingTable>>`.  A reader holds
//! the lock only long enough to clone the `Arc` and then works from that
//! snapshot, which is either entirely the old table or entirely the new one.

pub mod mapping_file;

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::domain::guitar::CONTROL_COUNT;
use crate::domain::identity::RemoteIdentity;

pub use mapping_file::{parse_mapping_file, MappingLoadError, MappingLoadReport};

/// A platform virtual key code (e.g. a macOS `CGKeyCode`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyCode(pub u16);

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}

/// Ten key codes for one remote, indexed by
/// [`GuitarControl::index`](crate::domain::guitar::GuitarControl::index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry([KeyCode; CONTROL_COUNT]);

impl MappingEntry {
    pub fn new(keys: [KeyCode; CONTROL_COUNT]) -> Self {
        Self(keys)
    }

    /// Returns the key for `index`, or `None` outside 0–9.
    pub fn get(&self, index: usize) -> Option<KeyCode> {
        self.0.get(index).copied()
    }
}

/// Immutable identity → entry table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingTable {
    entries: HashMap<RemoteIdentity, MappingEntry>,
}

impl MappingTable {
    /// An empty table: every lookup misses.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a table from `(identity, entry)` pairs.  A repeated identity
    /// keeps the last entry.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (RemoteIdentity, MappingEntry)>,
    {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Returns the key mapped to `control_index` for `identity`.
    ///
    /// `None` when the identity has no entry or the index is outside 0–9.
    pub fn lookup(&self, identity: RemoteIdentity, control_index: usize) -> Option<KeyCode> {
        self.entries.get(&identity)?.get(control_index)
    }

    pub fn entry(&self, identity: RemoteIdentity) -> Option<&MappingEntry> {
        self.entries.get(&identity)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(RemoteIdentity, MappingEntry)> for MappingTable {
    fn from_iter<T: IntoIterator<Item = (RemoteIdentity, MappingEntry)>>(iter: T) -> Self {
        Self::from_entries(iter)
    }
}

/// The live mapping table shared by every session and the loader.
#[derive(Debug, Default)]
pub struct SharedMappingTable {
    current: RwLock<Arc<MappingTable>>,
}

impl SharedMappingTable {
    pub fn new(table: MappingTable) -> Self {
        Self {
            current: RwLock::new(Arc::new(table)),
        }
    }

    /// Returns the table in effect right now.
    ///
    /// The snapshot stays valid (and unchanged) after a later
    /// [`replace`](Self::replace).
    pub fn snapshot(&self) -> Arc<MappingTable> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    /// Installs `table` wholesale and returns the table it replaced.
    pub fn replace(&self, table: MappingTable) -> Arc<MappingTable> {
        let next = Arc::new(table);
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        std::mem::replace(&mut *guard, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> RemoteIdentity {
        RemoteIdentity::from_octets([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF])
    }

    fn entry(base: u16) -> MappingEntry {
        let mut keys = [KeyCode(0); CONTROL_COUNT];
        for (i, key) in keys.iter_mut().enumerate() {
            *key = KeyCode(base + i as u16);
        }
        MappingEntry::new(keys)
    }

    #[test]
    fn test_lookup_returns_key_per_index() {
        let table = MappingTable::from_entries([(identity(), entry(0x10))]);
        assert_eq!(table.lookup(identity(), 0), Some(KeyCode(0x10)));
        assert_eq!(table.lookup(identity(), 9), Some(KeyCode(0x19)));
    }

    #[test]
    fn test_lookup_out_of_range_index_is_none() {
        let table = MappingTable::from_entries([(identity(), entry(0x10))]);
        assert_eq!(table.lookup(identity(), 10), None);
        assert_eq!(table.lookup(identity(), usize::MAX), None);
    }

    #[test]
    fn test_lookup_unknown_identity_is_none() {
        let table = MappingTable::from_entries([(identity(), entry(0x10))]);
        let other = RemoteIdentity::from_octets([0; 6]);
        assert_eq!(table.lookup(other, 0), None);
        assert_eq!(MappingTable::empty().lookup(identity(), 0), None);
    }

    #[test]
    fn test_repeated_identity_keeps_last_entry() {
        let table: MappingTable = [(identity(), entry(0x10)), (identity(), entry(0x40))]
            .into_iter()
            .collect();
        assert_eq!(table.len(), 1);
        assert_eq!(table.lookup(identity(), 0), Some(KeyCode(0x40)));
    }

    #[test]
    fn test_replace_swaps_table_and_keeps_old_snapshot_intact() {
        // Arrange
        let shared =
            SharedMappingTable::new(MappingTable::from_entries([(identity(), entry(0x10))]));
        let before = shared.snapshot();

        // Act
        let previous = shared.replace(MappingTable::from_entries([(identity(), entry(0x50))]));

        // Assert
        assert_eq!(before.lookup(identity(), 0), Some(KeyCode(0x10)));
        assert_eq!(previous.lookup(identity(), 0), Some(KeyCode(0x10)));
        assert_eq!(shared.snapshot().lookup(identity(), 0), Some(KeyCode(0x50)));
    }

    #[test]
    fn test_key_code_display_is_hex() {
        assert_eq!(KeyCode(0x0A).to_string(), "0x0A");
        assert_eq!(KeyCode(0x7B).to_string(), "0x7B");
    }
}
