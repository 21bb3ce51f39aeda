//! # State Journal
//!
//! Buffers every state effect of a call tree between the interpreter and the
//! world-state provider. Reads fall through the checkpoint layers to the
//! provider; writes land in the newest layer. The orchestrator opens a
//! checkpoint per child frame, commits it on success, and rolls it back on
//! revert or fault, so nothing from a failed frame can reach the provider.
//! A successful top-level frame is flushed to the provider in one pass.

use crate::domain::value_objects::{Address, Bytes, Hash, StorageKey, StorageValue, U256};
use crate::errors::StateError;
use crate::evm::transient::TransientStorage;
use crate::ports::outbound::{BalanceDelta, WorldState};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
struct Layer {
    storage: HashMap<(Address, StorageKey), StorageValue>,
    transient: TransientStorage,
    balances: HashMap<Address, U256>,
    nonces: HashMap<Address, u64>,
    codes: HashMap<Address, Bytes>,
    destroyed: HashSet<Address>,
}

impl Layer {
    fn merge_into(self, parent: &mut Layer) {
        parent.storage.extend(self.storage);
        parent.transient.merge(self.transient);
        parent.balances.extend(self.balances);
        parent.nonces.extend(self.nonces);
        parent.codes.extend(self.codes);
        parent.destroyed.extend(self.destroyed);
    }
}

/// Checkpointed write-buffer over a [`WorldState`] provider.
#[derive(Debug)]
pub struct StateJournal<'a, S: WorldState> {
    provider: &'a S,
    layers: Vec<Layer>,
}

impl<'a, S: WorldState> StateJournal<'a, S> {
    /// Creates a journal with a single root layer.
    pub fn new(provider: &'a S) -> Self {
        Self {
            provider,
            layers: vec![Layer::default()],
        }
    }

    /// Opens a new layer for a child frame.
    pub fn checkpoint(&mut self) {
        self.layers.push(Layer::default());
    }

    /// Merges the newest layer into its parent (child frame succeeded).
    pub fn commit(&mut self) {
        debug_assert!(self.layers.len() > 1, "commit without matching checkpoint");
        if self.layers.len() > 1 {
            let top = self.layers.pop().unwrap_or_default();
            if let Some(parent) = self.layers.last_mut() {
                top.merge_into(parent);
            }
        }
    }

    /// Discards the newest layer (child frame reverted or faulted).
    pub fn rollback(&mut self) {
        debug_assert!(self.layers.len() > 1, "rollback without matching checkpoint");
        if self.layers.len() > 1 {
            self.layers.pop();
        }
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Persistent storage slot, seeing pending writes first.
    pub async fn storage(
        &self,
        address: Address,
        key: StorageKey,
    ) -> Result<StorageValue, StateError> {
        for layer in self.layers.iter().rev() {
            if let Some(value) = layer.storage.get(&(address, key)) {
                return Ok(*value);
            }
        }
        self.provider.get_storage_at(address, key).await
    }

    /// Transient storage slot; zero if never written in this call tree.
    #[must_use]
    pub fn transient(&self, address: Address, key: StorageKey) -> StorageValue {
        for layer in self.layers.iter().rev() {
            if let Some(value) = layer.transient.get(address, key) {
                return value;
            }
        }
        StorageValue::ZERO
    }

    /// Account balance, seeing pending transfers first.
    pub async fn balance(&self, address: Address) -> Result<U256, StateError> {
        for layer in self.layers.iter().rev() {
            if let Some(balance) = layer.balances.get(&address) {
                return Ok(*balance);
            }
        }
        self.provider.get_balance(address).await
    }

    /// Account nonce, seeing pending increments first.
    pub async fn nonce(&self, address: Address) -> Result<u64, StateError> {
        for layer in self.layers.iter().rev() {
            if let Some(nonce) = layer.nonces.get(&address) {
                return Ok(*nonce);
            }
        }
        self.provider.get_nonce(address).await
    }

    /// Account code, seeing pending deployments first.
    pub async fn code(&self, address: Address) -> Result<Bytes, StateError> {
        for layer in self.layers.iter().rev() {
            if let Some(code) = layer.codes.get(&address) {
                return Ok(code.clone());
            }
        }
        self.provider.get_code(address).await
    }

    /// Whether the account exists: pending or provider code, balance, nonce.
    pub async fn account_exists(&self, address: Address) -> Result<bool, StateError> {
        if !self.code(address).await?.is_empty() {
            return Ok(true);
        }
        if !self.balance(address).await?.is_zero() {
            return Ok(true);
        }
        Ok(self.nonce(address).await? != 0)
    }

    /// Historical block hash (provider pass-through).
    pub async fn block_hash(&self, number: u64) -> Result<Hash, StateError> {
        self.provider.get_block_hash(number).await
    }

    // -------------------------------------------------------------------------
    // Writes (newest layer)
    // -------------------------------------------------------------------------

    fn top(&mut self) -> &mut Layer {
        self.layers.last_mut().expect("journal always has a root layer")
    }

    /// Buffers a persistent storage write.
    pub fn set_storage(&mut self, address: Address, key: StorageKey, value: StorageValue) {
        self.top().storage.insert((address, key), value);
    }

    /// Buffers a transient storage write.
    pub fn set_transient(&mut self, address: Address, key: StorageKey, value: StorageValue) {
        self.top().transient.set(address, key, value);
    }

    /// Buffers an absolute balance.
    pub fn set_balance(&mut self, address: Address, balance: U256) {
        self.top().balances.insert(address, balance);
    }

    /// Buffers a nonce.
    pub fn set_nonce(&mut self, address: Address, nonce: u64) {
        self.top().nonces.insert(address, nonce);
    }

    /// Buffers deployed code.
    pub fn save_code(&mut self, address: Address, code: Bytes) {
        self.top().codes.insert(address, code);
    }

    /// Marks an account destroyed.
    pub fn mark_destroyed(&mut self, address: Address) {
        self.top().destroyed.insert(address);
    }

    // -------------------------------------------------------------------------
    // Flush
    // -------------------------------------------------------------------------

    /// Writes every buffered effect through the provider. Called once, after
    /// a successful top-level frame; all checkpoints must be resolved.
    pub async fn flush(mut self) -> Result<(), StateError> {
        while self.layers.len() > 1 {
            self.commit();
        }
        let root = self.layers.pop().unwrap_or_default();

        for ((address, key), value) in root.storage {
            self.provider.set_storage(address, key, value).await?;
        }
        for (address, code) in root.codes {
            self.provider.save_code(address, code).await?;
        }
        for (address, nonce) in root.nonces {
            self.provider.set_nonce(address, nonce).await?;
        }
        for (address, target) in root.balances {
            let current = self.provider.get_balance(address).await?;
            if target > current {
                self.provider
                    .adjust_balance(address, BalanceDelta::Credit(target - current))
                    .await?;
            } else if target < current {
                self.provider
                    .adjust_balance(address, BalanceDelta::Debit(current - target))
                    .await?;
            }
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
