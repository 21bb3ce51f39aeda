//! # evm-core
//!
//! An EVM bytecode execution engine: a 256-bit stack/memory machine with the
//! full instruction set, nested call and contract-creation orchestration, and
//! the precompiled-contract library (signature recovery, hashing, modular
//! exponentiation, alt_bn128 pairing operations, BLAKE2 compression).
//!
//! Account state comes from an abstract asynchronous [`WorldState`] provider;
//! every state effect of a call tree is buffered in a checkpointed journal
//! and reaches the provider only when the top-level frame completes without
//! revert or fault.
//!
//! ## Usage
//!
//! ```ignore
//! use evm_core::prelude::*;
//!
//! let state = InMemoryWorldState::new();
//! let evm = Evm::new(state);
//!
//! // PUSH1 1 PUSH1 2 ADD PUSH1 0 MSTORE PUSH1 32 PUSH1 0 RETURN
//! let code = Bytes::from_slice(&[
//!     0x60, 0x01, 0x60, 0x02, 0x01, 0x60, 0x00, 0x52, 0x60, 0x20, 0x60, 0x00, 0xf3,
//! ]);
//! let (result, _trace) = evm.execute(code, ExecutionContext::default()).await?;
//! assert!(result.is_success());
//! ```
//!
//! ## Layout
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `domain` | value objects, frame entities, address derivation |
//! | `ports` | the [`WorldState`] provider trait |
//! | `adapters` | in-memory reference adapter |
//! | `evm` | stack, memory, journal, interpreter, call orchestration |
//! | `evm::precompiles` | built-in contracts at addresses 1-9 |
//!
//! [`WorldState`]: ports::outbound::WorldState

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod adapters;
pub mod domain;
pub mod errors;
pub mod evm;
pub mod ports;

/// Convenient re-exports for embedding the engine.
pub mod prelude {
    pub use crate::adapters::InMemoryWorldState;
    pub use crate::domain::entities::{
        BlockContext, CallKind, CallRecord, ExecutionContext, ExecutionResult, GasPolicy, Log,
        TraceEntry, VmConfig,
    };
    pub use crate::domain::services::{create2_address, create_address, keccak256};
    pub use crate::domain::value_objects::{
        Address, Bytes, Hash, StorageKey, StorageValue, U256,
    };
    pub use crate::errors::{PrecompileError, StateError, VmError};
    pub use crate::evm::interpreter::{FrameExecution, FrameOutcome, Interpreter};
    pub use crate::evm::memory::Memory;
    pub use crate::evm::opcodes::Instruction;
    pub use crate::evm::precompiles::{
        BasePrecompiles, Precompile, PrecompileProvider, PrecompileSet,
    };
    pub use crate::evm::stack::Stack;
    pub use crate::evm::Evm;
    pub use crate::ports::outbound::{BalanceDelta, WorldState};
}

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn prelude_exports_compile() {
        let _ = VmConfig::default();
        let _ = Address::ZERO;
        let _ = PrecompileSet::base();
    }
}
