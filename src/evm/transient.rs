//! # Transient Storage
//!
//! Call-scoped storage behind TLOAD/TSTORE. Unset keys read as zero. The
//! journal keeps one instance per checkpoint layer so a reverted frame's
//! transient writes vanish with its other effects.

use crate::domain::value_objects::{Address, StorageKey, StorageValue};
use std::collections::HashMap;

/// Per-address transient key/value map.
#[derive(Clone, Debug, Default)]
pub struct TransientStorage {
    slots: HashMap<(Address, StorageKey), StorageValue>,
}

impl TransientStorage {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a slot; zero if never written.
    #[must_use]
    pub fn get(&self, address: Address, key: StorageKey) -> Option<StorageValue> {
        self.slots.get(&(address, key)).copied()
    }

    /// Writes a slot.
    pub fn set(&mut self, address: Address, key: StorageKey, value: StorageValue) {
        self.slots.insert((address, key), value);
    }

    /// Folds another map's entries over this one (child commit).
    pub fn merge(&mut self, other: TransientStorage) {
        self.slots.extend(other.slots);
    }

    /// Number of written slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True if no slot was ever written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================
