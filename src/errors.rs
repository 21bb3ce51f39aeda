//! # Error Types
//!
//! Error taxonomy for bytecode execution. A `REVERT` is not an error: frames
//! report it through the `reverted` flag on their result. `VmError` covers the
//! fatal frame faults; a fault in a child frame is captured on the parent's
//! result instead of being re-thrown (the parent merely observes failure).

use crate::domain::value_objects::{Address, U256};
use thiserror::Error;

// =============================================================================
// VM ERRORS
// =============================================================================

/// Fatal faults that terminate the current frame.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VmError {
    /// Execution ran out of gas.
    #[error("out of gas")]
    OutOfGas,

    /// Stack overflow (>1024 items).
    #[error("stack overflow")]
    StackOverflow,

    /// Stack underflow (pop from empty stack).
    #[error("stack underflow")]
    StackUnderflow,

    /// Byte that does not decode to any instruction.
    #[error("invalid opcode: 0x{0:02x}")]
    InvalidOpcode(u8),

    /// Jump destination outside bytecode bounds or not a JUMPDEST.
    #[error("invalid jump destination: {0}")]
    InvalidJump(usize),

    /// A stack operand used as an offset, length, or index does not fit the
    /// addressable range.
    #[error("operand out of representable range: {0}")]
    OffsetOutOfRange(U256),

    /// Nested call would exceed the configured depth.
    #[error("call depth exceeded: {depth} > {max}")]
    CallDepthExceeded { depth: u16, max: u16 },

    /// Deployed contract code exceeds the size cap (EIP-170).
    #[error("code size exceeded: {size} > {max} bytes")]
    CodeSizeExceeded { size: usize, max: usize },

    /// Initialization code exceeds the size cap (EIP-3860).
    #[error("init code size exceeded: {size} > {max} bytes")]
    InitCodeSizeExceeded { size: usize, max: usize },

    /// Deployed code starts with the 0xef byte reserved for EOF.
    #[error("deployed code starts with reserved 0xef byte")]
    InvalidCodePrefix,

    /// State-mutating operation attempted inside a static context.
    #[error("state mutation in static context")]
    StaticViolation,

    /// Memory expansion would exceed the configured cap.
    #[error("memory limit exceeded: {requested} > {max} bytes")]
    MemoryLimitExceeded { requested: usize, max: usize },

    /// RETURNDATACOPY past the end of the recorded return data.
    #[error("return data out of bounds: offset {offset}, size {size}, available {available}")]
    ReturnDataOutOfBounds {
        offset: usize,
        size: usize,
        available: usize,
    },

    /// A precompiled contract rejected its input.
    #[error("precompile failed: {0}")]
    PrecompileFailed(#[from] PrecompileError),

    /// World-state provider failure.
    #[error("state error: {0}")]
    StateError(#[from] StateError),

    /// Step-count ceiling reached (guards unmetered executions).
    #[error("step limit exceeded: {0} steps")]
    StepLimitExceeded(u64),
}

// =============================================================================
// STATE ERRORS
// =============================================================================

/// Failures raised by the world-state provider.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    /// No state available for the address.
    #[error("state not found for address: {0:?}")]
    NotFound(Address),

    /// Lookup timed out.
    #[error("state access timeout")]
    Timeout,

    /// Backing store unavailable.
    #[error("state provider unavailable")]
    Unavailable,

    /// Any other provider-specific failure.
    #[error("state error: {0}")]
    Other(String),
}

// =============================================================================
// PRECOMPILE ERRORS
// =============================================================================

/// Failures raised by precompiled contracts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PrecompileError {
    /// Input does not have the required length.
    #[error("invalid input length: expected {expected}, got {actual}")]
    InvalidInputLength { expected: usize, actual: usize },

    /// Input is structurally invalid (bad flag byte, malformed point, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The call's gas allowance does not cover the precompile's cost.
    #[error("precompile out of gas")]
    OutOfGas,
}

// =============================================================================
// TESTS
// =============================================================================
