//! # Outbound Ports
//!
//! The world-state provider the engine consumes. Lookups may be served
//! asynchronously (network or disk backed); the interpreter suspends the
//! current frame at these calls only, and resumes deterministically with the
//! returned value.

use crate::domain::value_objects::{Address, Bytes, Hash, StorageKey, StorageValue, U256};
use crate::errors::StateError;
use async_trait::async_trait;

/// Signed balance adjustment emitted when a call tree commits.
///
/// The adapter applies deltas in order; an intermediate negative balance is
/// the embedder's concern to validate, not the engine's.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BalanceDelta {
    /// Add to the account balance.
    Credit(U256),
    /// Subtract from the account balance.
    Debit(U256),
}

/// Account state and code supplied by the surrounding node.
///
/// Reads are issued during execution; writes are issued only when the engine
/// flushes a successful top-level frame. No write from a reverted frame ever
/// reaches this trait.
#[async_trait]
pub trait WorldState: Send + Sync {
    /// Deployed code of an account; empty for externally owned accounts.
    async fn get_code(&self, address: Address) -> Result<Bytes, StateError>;

    /// Current balance of an account.
    async fn get_balance(&self, address: Address) -> Result<U256, StateError>;

    /// Persistent storage slot; zero if never written.
    async fn get_storage_at(
        &self,
        address: Address,
        key: StorageKey,
    ) -> Result<StorageValue, StateError>;

    /// Writes a persistent storage slot.
    async fn set_storage(
        &self,
        address: Address,
        key: StorageKey,
        value: StorageValue,
    ) -> Result<(), StateError>;

    /// Current nonce of an account.
    async fn get_nonce(&self, address: Address) -> Result<u64, StateError>;

    /// Sets the nonce of an account.
    async fn set_nonce(&self, address: Address, nonce: u64) -> Result<(), StateError>;

    /// Applies a balance delta.
    async fn adjust_balance(
        &self,
        address: Address,
        delta: BalanceDelta,
    ) -> Result<(), StateError>;

    /// Stores deployed code for a created account.
    async fn save_code(&self, address: Address, code: Bytes) -> Result<(), StateError>;

    /// Hash of a historical block, or zero when unknown.
    async fn get_block_hash(&self, number: u64) -> Result<Hash, StateError>;

    /// Whether the account exists: non-empty code, balance, or nonce.
    ///
    /// Derived from the primary lookups; adapters with a cheaper notion of
    /// existence may override.
    async fn account_exists(&self, address: Address) -> Result<bool, StateError> {
        if !self.get_code(address).await?.is_empty() {
            return Ok(true);
        }
        if !self.get_balance(address).await?.is_zero() {
            return Ok(true);
        }
        Ok(self.get_nonce(address).await? != 0)
    }
}

// =============================================================================
// TESTS
// =============================================================================
