//! # In-Memory World State
//!
//! Reference [`WorldState`] adapter backed by locked maps. Used by the test
//! suites and as the template for real adapters; not a database.

use crate::domain::value_objects::{Address, Bytes, Hash, StorageKey, StorageValue, U256};
use crate::errors::StateError;
use crate::ports::outbound::{BalanceDelta, WorldState};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Account {
    balance: U256,
    nonce: u64,
    code: Bytes,
    storage: HashMap<StorageKey, StorageValue>,
}

/// Map-backed world state.
#[derive(Default)]
pub struct InMemoryWorldState {
    accounts: RwLock<HashMap<Address, Account>>,
    block_hashes: RwLock<HashMap<u64, Hash>>,
}

impl InMemoryWorldState {
    /// Creates an empty world state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an account balance.
    pub async fn set_balance(&self, address: Address, balance: U256) {
        self.accounts.write().await.entry(address).or_default().balance = balance;
    }

    /// Seeds deployed code.
    pub async fn deploy_code(&self, address: Address, code: Bytes) {
        self.accounts.write().await.entry(address).or_default().code = code;
    }

    /// Seeds a historical block hash.
    pub async fn put_block_hash(&self, number: u64, hash: Hash) {
        self.block_hashes.write().await.insert(number, hash);
    }
}

#[async_trait]
impl WorldState for InMemoryWorldState {
    async fn get_code(&self, address: Address) -> Result<Bytes, StateError> {
        Ok(self
            .accounts
            .read()
            .await
            .get(&address)
            .map(|a| a.code.clone())
            .unwrap_or_default())
    }

    async fn get_balance(&self, address: Address) -> Result<U256, StateError> {
        Ok(self
            .accounts
            .read()
            .await
            .get(&address)
            .map(|a| a.balance)
            .unwrap_or_default())
    }

    async fn get_storage_at(
        &self,
        address: Address,
        key: StorageKey,
    ) -> Result<StorageValue, StateError> {
        Ok(self
            .accounts
            .read()
            .await
            .get(&address)
            .and_then(|a| a.storage.get(&key))
            .copied()
            .unwrap_or(StorageValue::ZERO))
    }

    async fn set_storage(
        &self,
        address: Address,
        key: StorageKey,
        value: StorageValue,
    ) -> Result<(), StateError> {
        self.accounts
            .write()
            .await
            .entry(address)
            .or_default()
            .storage
            .insert(key, value);
        Ok(())
    }

    async fn get_nonce(&self, address: Address) -> Result<u64, StateError> {
        Ok(self
            .accounts
            .read()
            .await
            .get(&address)
            .map(|a| a.nonce)
            .unwrap_or_default())
    }

    async fn set_nonce(&self, address: Address, nonce: u64) -> Result<(), StateError> {
        self.accounts.write().await.entry(address).or_default().nonce = nonce;
        Ok(())
    }

    async fn adjust_balance(
        &self,
        address: Address,
        delta: BalanceDelta,
    ) -> Result<(), StateError> {
        let mut accounts = self.accounts.write().await;
        let account = accounts.entry(address).or_default();
        account.balance = match delta {
            BalanceDelta::Credit(amount) => account.balance.saturating_add(amount),
            BalanceDelta::Debit(amount) => account.balance.saturating_sub(amount),
        };
        Ok(())
    }

    async fn save_code(&self, address: Address, code: Bytes) -> Result<(), StateError> {
        self.accounts.write().await.entry(address).or_default().code = code;
        Ok(())
    }

    async fn get_block_hash(&self, number: u64) -> Result<Hash, StateError> {
        Ok(self
            .block_hashes
            .read()
            .await
            .get(&number)
            .copied()
            .unwrap_or(Hash::ZERO))
    }
}

// =============================================================================
// TESTS
// =============================================================================
