//! # Core Domain Entities
//!
//! Call-frame context, execution results, traces, and engine configuration.

use crate::domain::value_objects::{Address, Bytes, Hash, U256};
use crate::errors::VmError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// EXECUTION CONTEXT
// =============================================================================

/// Per-frame execution environment.
///
/// Each frame owns its context; a child call gets a freshly derived one and
/// never shares the parent's.
#[derive(Clone, Debug)]
pub struct ExecutionContext {
    /// Transaction origin (sender of the outermost call).
    pub origin: Address,
    /// Immediate caller of this frame.
    pub caller: Address,
    /// Account whose storage and balance this frame operates on.
    pub address: Address,
    /// Value carried by this call.
    pub value: U256,
    /// Input data (calldata).
    pub data: Bytes,
    /// Gas limit for this frame.
    pub gas_limit: u64,
    /// Effective gas price of the transaction.
    pub gas_price: U256,
    /// Block-level environment.
    pub block: BlockContext,
    /// Call depth, zero at the top level.
    pub depth: u16,
    /// Static (read-only) mode: all state mutation is forbidden.
    pub is_static: bool,
}

impl ExecutionContext {
    /// Context for a top-level call.
    #[must_use]
    pub fn top_level(
        origin: Address,
        to: Address,
        value: U256,
        data: Bytes,
        gas_limit: u64,
        gas_price: U256,
        block: BlockContext,
    ) -> Self {
        Self {
            origin,
            caller: origin,
            address: to,
            value,
            data,
            gas_limit,
            gas_price,
            block,
            depth: 0,
            is_static: false,
        }
    }

    /// Child context for CALL: the callee's own storage, this frame as sender.
    #[must_use]
    pub fn child_call(&self, target: Address, value: U256, data: Bytes, gas: u64) -> Self {
        Self {
            origin: self.origin,
            caller: self.address,
            address: target,
            value,
            data,
            gas_limit: gas,
            gas_price: self.gas_price,
            block: self.block.clone(),
            depth: self.depth.saturating_add(1),
            is_static: self.is_static,
        }
    }

    /// Child context for CALLCODE: the callee's code against this frame's
    /// storage, with a caller-specified value.
    #[must_use]
    pub fn child_callcode(&self, value: U256, data: Bytes, gas: u64) -> Self {
        Self {
            origin: self.origin,
            caller: self.address,
            address: self.address,
            value,
            data,
            gas_limit: gas,
            gas_price: self.gas_price,
            block: self.block.clone(),
            depth: self.depth.saturating_add(1),
            is_static: self.is_static,
        }
    }

    /// Child context for DELEGATECALL: keeps the original sender and value in
    /// addition to this frame's storage.
    #[must_use]
    pub fn child_delegatecall(&self, data: Bytes, gas: u64) -> Self {
        Self {
            origin: self.origin,
            caller: self.caller,
            address: self.address,
            value: self.value,
            data,
            gas_limit: gas,
            gas_price: self.gas_price,
            block: self.block.clone(),
            depth: self.depth.saturating_add(1),
            is_static: self.is_static,
        }
    }

    /// Child context for STATICCALL: zero value, read-only mode forced on.
    #[must_use]
    pub fn child_staticcall(&self, target: Address, data: Bytes, gas: u64) -> Self {
        Self {
            origin: self.origin,
            caller: self.address,
            address: target,
            value: U256::zero(),
            data,
            gas_limit: gas,
            gas_price: self.gas_price,
            block: self.block.clone(),
            depth: self.depth.saturating_add(1),
            is_static: true,
        }
    }

    /// Child context for CREATE/CREATE2: the new account's (empty) storage,
    /// no calldata — input reaches init code through the code itself.
    #[must_use]
    pub fn child_create(&self, created: Address, value: U256, gas: u64) -> Self {
        Self {
            origin: self.origin,
            caller: self.address,
            address: created,
            value,
            data: Bytes::new(),
            gas_limit: gas,
            gas_price: self.gas_price,
            block: self.block.clone(),
            depth: self.depth.saturating_add(1),
            is_static: self.is_static,
        }
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self {
            origin: Address::ZERO,
            caller: Address::ZERO,
            address: Address::ZERO,
            value: U256::zero(),
            data: Bytes::new(),
            gas_limit: 30_000_000,
            gas_price: U256::zero(),
            block: BlockContext::default(),
            depth: 0,
            is_static: false,
        }
    }
}

// =============================================================================
// BLOCK CONTEXT
// =============================================================================

/// Block-level environment visible to executing code.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockContext {
    /// Block number.
    pub number: u64,
    /// Block timestamp, unix seconds.
    pub timestamp: u64,
    /// Block proposer address.
    pub coinbase: Address,
    /// Difficulty / prevrandao.
    pub difficulty: U256,
    /// Block gas limit.
    pub gas_limit: u64,
    /// Base fee per gas.
    pub base_fee: U256,
    /// Chain id.
    pub chain_id: u64,
    /// Versioned blob hashes of the carrying transaction.
    pub blob_hashes: Vec<Hash>,
    /// Blob base fee per gas.
    pub blob_base_fee: U256,
}

impl Default for BlockContext {
    fn default() -> Self {
        Self {
            number: 0,
            timestamp: 0,
            coinbase: Address::ZERO,
            difficulty: U256::zero(),
            gas_limit: 30_000_000,
            base_fee: U256::zero(),
            chain_id: 1,
            blob_hashes: Vec::new(),
            blob_base_fee: U256::zero(),
        }
    }
}

// =============================================================================
// CALL RECORDS
// =============================================================================

/// Which opcode produced a nested call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallKind {
    /// CALL
    Call,
    /// CALLCODE
    CallCode,
    /// DELEGATECALL
    DelegateCall,
    /// STATICCALL
    StaticCall,
    /// CREATE
    Create,
    /// CREATE2
    Create2,
}

/// Descriptor of one nested call or creation attempt.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CallRecord {
    /// Opcode family that made the call.
    pub kind: CallKind,
    /// Sender of the nested call.
    pub from: Address,
    /// Target (or created) address.
    pub to: Address,
    /// Value carried.
    pub value: U256,
    /// Input passed to the callee (or init code for creations).
    pub input: Bytes,
    /// Output returned by the callee.
    pub output: Bytes,
    /// Whether the callee completed without revert or fault.
    pub success: bool,
    /// Depth of the callee frame.
    pub depth: u16,
}

// =============================================================================
// LOG (EVENT)
// =============================================================================

/// Log emitted by a LOG0..LOG4 instruction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    /// Emitting contract.
    pub address: Address,
    /// Indexed topics, at most four.
    pub topics: Vec<Hash>,
    /// Opaque payload.
    pub data: Bytes,
}

impl Log {
    /// Creates a new log entry.
    #[must_use]
    pub fn new(address: Address, topics: Vec<Hash>, data: Bytes) -> Self {
        Self { address, topics, data }
    }
}

// =============================================================================
// EXECUTION RESULT
// =============================================================================

/// Aggregated outcome of one frame and its merged descendants.
#[derive(Clone, Debug, Default)]
pub struct ExecutionResult {
    /// Return or revert data.
    pub output: Bytes,
    /// True if the frame ended with REVERT (or was marked reverted by a
    /// reverting creation).
    pub reverted: bool,
    /// Logs emitted by this frame and successfully merged descendants.
    pub logs: Vec<Log>,
    /// Every nested call attempted from this frame, in order.
    pub inner_calls: Vec<CallRecord>,
    /// Accounts created under this frame.
    pub created: Vec<Address>,
    /// Accounts destroyed under this frame.
    pub destroyed: Vec<Address>,
    /// Fault captured on this frame (its own, or one recorded from a failed
    /// child that stopped it).
    pub error: Option<VmError>,
    /// Code of every account reached by nested calls, for trace completeness.
    pub touched_code: HashMap<Address, Bytes>,
    /// Gas consumed by the frame (zero when unmetered).
    pub gas_used: u64,
    /// Refund accumulated by storage clears.
    pub gas_refund: u64,
}

impl ExecutionResult {
    /// True if the frame completed without revert or fault.
    #[must_use]
    pub fn is_success(&self) -> bool {
        !self.reverted && self.error.is_none()
    }

    /// Folds a successful child's aggregates into this result.
    pub fn absorb(&mut self, child: ExecutionResult) {
        self.logs.extend(child.logs);
        self.inner_calls.extend(child.inner_calls);
        self.created.extend(child.created);
        self.destroyed.extend(child.destroyed);
        self.touched_code.extend(child.touched_code);
        self.gas_refund = self.gas_refund.saturating_add(child.gas_refund);
    }
}

// =============================================================================
// TRACE
// =============================================================================

/// One executed step, appended when tracing is enabled. Never mutated after
/// creation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TraceEntry {
    /// Call depth of the executing frame.
    pub depth: u16,
    /// Program counter before the step.
    pub pc: usize,
    /// Raw opcode byte.
    pub opcode: u8,
    /// Mnemonic of the instruction.
    pub name: String,
    /// Gas remaining before the step.
    pub gas_remaining: u64,
    /// Stack contents before the step, bottom first.
    pub stack: Vec<U256>,
    /// Memory size in bytes before the step.
    pub memory_size: usize,
}

// =============================================================================
// ENGINE CONFIGURATION
// =============================================================================

/// Whether the engine deducts gas itself or leaves billing to the embedder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum GasPolicy {
    /// Deduct per-instruction costs and fail with `OutOfGas` on exhaustion.
    #[default]
    Metered,
    /// Track nothing; a surrounding billing layer meters the execution.
    Unmetered,
}

/// Execution limits and switches.
#[derive(Clone, Debug)]
pub struct VmConfig {
    /// Maximum nested call depth.
    pub max_call_depth: u16,
    /// Deployed code size cap (EIP-170).
    pub max_code_size: usize,
    /// Init code size cap (EIP-3860).
    pub max_init_code_size: usize,
    /// Memory expansion cap in bytes.
    pub max_memory_size: usize,
    /// Hard ceiling on executed steps per frame.
    pub max_steps: u64,
    /// Record a `TraceEntry` per executed step.
    pub trace_enabled: bool,
    /// Gas enforcement point.
    pub gas_policy: GasPolicy,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            max_call_depth: 1024,
            max_code_size: 24_576,
            max_init_code_size: 49_152,
            max_memory_size: 16 * 1024 * 1024,
            max_steps: 10_000_000,
            trace_enabled: false,
            gas_policy: GasPolicy::Metered,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
