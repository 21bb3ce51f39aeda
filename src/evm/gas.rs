//! # Gas Accounting
//!
//! Static cost table, dynamic-cost formulas, and the per-frame meter. The
//! enforcement point is configurable: a `Metered` meter deducts and fails on
//! exhaustion, an `Unmetered` one records nothing and never fails.

use crate::domain::entities::GasPolicy;
use crate::domain::value_objects::U256;
use crate::errors::VmError;

/// Gas cost constants.
pub mod costs {
    /// Cheapest tier (ADD, comparison, bitwise, PUSH/DUP/SWAP).
    pub const VERY_LOW: u64 = 3;
    /// Cheap tier (ADDRESS, CALLER, POP, PC, ...).
    pub const BASE: u64 = 2;
    /// MUL/DIV/MOD tier.
    pub const LOW: u64 = 5;
    /// ADDMOD/MULMOD tier.
    pub const MID: u64 = 8;
    /// JUMPI tier.
    pub const HIGH: u64 = 10;
    /// JUMPDEST marker.
    pub const JUMPDEST: u64 = 1;

    /// SLOAD (flat; warm/cold tracking is out of scope).
    pub const SLOAD: u64 = 100;
    /// SSTORE setting a zero slot to non-zero.
    pub const SSTORE_SET: u64 = 20_000;
    /// SSTORE any other transition.
    pub const SSTORE_RESET: u64 = 2_900;
    /// Refund for clearing a non-zero slot.
    pub const SSTORE_CLEAR_REFUND: u64 = 4_800;
    /// TLOAD/TSTORE.
    pub const TRANSIENT: u64 = 100;

    /// Account access for BALANCE/EXTCODE*/CALL targets (flat).
    pub const ACCOUNT_ACCESS: u64 = 100;
    /// Surcharge for a value-bearing call.
    pub const CALL_VALUE: u64 = 9_000;
    /// Surcharge for calling into a non-existent account with value.
    pub const CALL_NEW_ACCOUNT: u64 = 25_000;
    /// Stipend granted to the callee of a value-bearing call.
    pub const CALL_STIPEND: u64 = 2_300;

    /// CREATE/CREATE2 base.
    pub const CREATE: u64 = 32_000;
    /// Per word of init code hashed/processed (CREATE2 salt hash, EIP-3860).
    pub const INIT_CODE_WORD: u64 = 2;
    /// Per byte of deployed code stored.
    pub const CODE_DEPOSIT: u64 = 200;

    /// KECCAK256 base.
    pub const KECCAK256: u64 = 30;
    /// KECCAK256 per word hashed.
    pub const KECCAK256_WORD: u64 = 6;
    /// Per word copied (CALLDATACOPY, CODECOPY, MCOPY, ...).
    pub const COPY_WORD: u64 = 3;

    /// LOG base.
    pub const LOG: u64 = 375;
    /// LOG per topic.
    pub const LOG_TOPIC: u64 = 375;
    /// LOG per data byte.
    pub const LOG_DATA: u64 = 8;

    /// EXP base.
    pub const EXP: u64 = 10;
    /// EXP per byte of exponent.
    pub const EXP_BYTE: u64 = 50;

    /// BLOCKHASH.
    pub const BLOCKHASH: u64 = 20;
    /// SELFBALANCE.
    pub const SELFBALANCE: u64 = 5;
    /// SELFDESTRUCT base.
    pub const SELFDESTRUCT: u64 = 5_000;
}

/// Static cost of an instruction byte; dynamic parts are added by handlers.
#[rustfmt::skip]
pub const STATIC_COST: [u64; 256] = {
    let mut t = [0u64; 256];
    t[0x01] = costs::VERY_LOW;  // ADD
    t[0x02] = costs::LOW;       // MUL
    t[0x03] = costs::VERY_LOW;  // SUB
    t[0x04] = costs::LOW;       // DIV
    t[0x05] = costs::LOW;       // SDIV
    t[0x06] = costs::LOW;       // MOD
    t[0x07] = costs::LOW;       // SMOD
    t[0x08] = costs::MID;       // ADDMOD
    t[0x09] = costs::MID;       // MULMOD
    t[0x0a] = costs::EXP;       // EXP (plus per-byte)
    t[0x0b] = costs::LOW;       // SIGNEXTEND
    let mut i = 0x10;
    while i <= 0x1d {
        t[i] = costs::VERY_LOW; // comparison & bitwise block
        i += 1;
    }
    t[0x20] = costs::KECCAK256;
    t[0x30] = costs::BASE;      // ADDRESS
    t[0x31] = costs::ACCOUNT_ACCESS; // BALANCE
    t[0x32] = costs::BASE;      // ORIGIN
    t[0x33] = costs::BASE;      // CALLER
    t[0x34] = costs::BASE;      // CALLVALUE
    t[0x35] = costs::VERY_LOW;  // CALLDATALOAD
    t[0x36] = costs::BASE;      // CALLDATASIZE
    t[0x37] = costs::VERY_LOW;  // CALLDATACOPY (plus per-word)
    t[0x38] = costs::BASE;      // CODESIZE
    t[0x39] = costs::VERY_LOW;  // CODECOPY (plus per-word)
    t[0x3a] = costs::BASE;      // GASPRICE
    t[0x3b] = costs::ACCOUNT_ACCESS; // EXTCODESIZE
    t[0x3c] = costs::ACCOUNT_ACCESS; // EXTCODECOPY (plus per-word)
    t[0x3d] = costs::BASE;      // RETURNDATASIZE
    t[0x3e] = costs::VERY_LOW;  // RETURNDATACOPY (plus per-word)
    t[0x3f] = costs::ACCOUNT_ACCESS; // EXTCODEHASH
    t[0x40] = costs::BLOCKHASH;
    let mut i = 0x41;
    while i <= 0x46 {
        t[i] = costs::BASE;     // COINBASE..CHAINID
        i += 1;
    }
    t[0x47] = costs::SELFBALANCE;
    t[0x48] = costs::BASE;      // BASEFEE
    t[0x49] = costs::VERY_LOW;  // BLOBHASH
    t[0x4a] = costs::BASE;      // BLOBBASEFEE
    t[0x50] = costs::BASE;      // POP
    t[0x51] = costs::VERY_LOW;  // MLOAD
    t[0x52] = costs::VERY_LOW;  // MSTORE
    t[0x53] = costs::VERY_LOW;  // MSTORE8
    t[0x54] = costs::SLOAD;
    // SSTORE is fully dynamic.
    t[0x56] = costs::MID;       // JUMP
    t[0x57] = costs::HIGH;      // JUMPI
    t[0x58] = costs::BASE;      // PC
    t[0x59] = costs::BASE;      // MSIZE
    t[0x5a] = costs::BASE;      // GAS
    t[0x5b] = costs::JUMPDEST;
    t[0x5c] = costs::TRANSIENT; // TLOAD
    t[0x5d] = costs::TRANSIENT; // TSTORE
    t[0x5e] = costs::VERY_LOW;  // MCOPY (plus per-word)
    t[0x5f] = costs::BASE;      // PUSH0
    let mut i = 0x60;
    while i <= 0x9f {
        t[i] = costs::VERY_LOW; // PUSH1..PUSH32, DUP, SWAP
        i += 1;
    }
    let mut i = 0xa0;
    while i <= 0xa4 {
        t[i] = costs::LOG;      // plus topics and data
        i += 1;
    }
    t[0xf0] = costs::CREATE;
    t[0xf1] = costs::ACCOUNT_ACCESS; // CALL (plus value/new-account)
    t[0xf2] = costs::ACCOUNT_ACCESS; // CALLCODE
    t[0xf4] = costs::ACCOUNT_ACCESS; // DELEGATECALL
    t[0xf5] = costs::CREATE;    // CREATE2 (plus hash words)
    t[0xfa] = costs::ACCOUNT_ACCESS; // STATICCALL
    t[0xff] = costs::SELFDESTRUCT;
    t
};

/// Words needed to hold `len` bytes.
#[must_use]
pub fn words_for(len: usize) -> u64 {
    len.div_ceil(32) as u64
}

/// Total cost of a memory of `words` words: `words²/512 + 3·words`.
#[must_use]
pub fn memory_cost(words: usize) -> u64 {
    let w = words as u64;
    w * w / 512 + 3 * w
}

/// Incremental cost of growing memory from `old_words` to `new_words`.
#[must_use]
pub fn memory_expansion_cost(old_words: usize, new_words: usize) -> u64 {
    if new_words <= old_words {
        return 0;
    }
    memory_cost(new_words) - memory_cost(old_words)
}

/// Dynamic part of EXP: 50 per byte of exponent.
#[must_use]
pub fn exp_dynamic_cost(exponent: U256) -> u64 {
    if exponent.is_zero() {
        return 0;
    }
    let bytes = (exponent.bits() as u64).div_ceil(8);
    costs::EXP_BYTE * bytes
}

/// Dynamic part of KECCAK256 and the copy family: per-word charge.
#[must_use]
pub fn per_word_cost(len: usize, word_cost: u64) -> u64 {
    word_cost * words_for(len)
}

/// Dynamic part of LOGn: topic and data charges.
#[must_use]
pub fn log_dynamic_cost(data_len: usize, topics: usize) -> u64 {
    costs::LOG_TOPIC * topics as u64 + costs::LOG_DATA * data_len as u64
}

/// Gas forwarded to a child call: all-but-one-64th of the remainder, capped
/// at the requested amount, plus the stipend on value transfers.
#[must_use]
pub fn child_call_gas(remaining: u64, requested: U256, has_value: bool) -> u64 {
    let ceiling = remaining - remaining / 64;
    let requested = if requested > U256::from(u64::MAX) {
        u64::MAX
    } else {
        requested.as_u64()
    };
    let mut gas = requested.min(ceiling);
    if has_value {
        gas = gas.saturating_add(costs::CALL_STIPEND);
    }
    gas
}

// =============================================================================
// GAS METER
// =============================================================================

/// Per-frame gas meter.
#[derive(Clone, Copy, Debug)]
pub struct GasMeter {
    limit: u64,
    remaining: u64,
    refund: u64,
    policy: GasPolicy,
}

impl GasMeter {
    /// Creates a meter over `limit` gas under the given policy.
    #[must_use]
    pub fn new(limit: u64, policy: GasPolicy) -> Self {
        Self {
            limit,
            remaining: limit,
            refund: 0,
            policy,
        }
    }

    /// Gas still available; equals the limit under `Unmetered`.
    #[must_use]
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Gas consumed so far.
    #[must_use]
    pub fn used(&self) -> u64 {
        self.limit - self.remaining
    }

    /// Accumulated refund.
    #[must_use]
    pub fn refund(&self) -> u64 {
        self.refund
    }

    /// Deducts `amount`.
    ///
    /// # Errors
    ///
    /// `OutOfGas` under `Metered` when the remainder is insufficient; never
    /// fails under `Unmetered`.
    pub fn consume(&mut self, amount: u64) -> Result<(), VmError> {
        if self.policy == GasPolicy::Unmetered {
            return Ok(());
        }
        if amount > self.remaining {
            self.remaining = 0;
            return Err(VmError::OutOfGas);
        }
        self.remaining -= amount;
        Ok(())
    }

    /// Credits back gas a child frame did not use.
    pub fn reclaim(&mut self, amount: u64) {
        if self.policy == GasPolicy::Unmetered {
            return;
        }
        self.remaining = self.remaining.saturating_add(amount).min(self.limit);
    }

    /// Adds to the refund counter (SSTORE clears).
    pub fn add_refund(&mut self, amount: u64) {
        self.refund = self.refund.saturating_add(amount);
    }

    /// Consumes everything left; a faulted frame forfeits its gas.
    pub fn exhaust(&mut self) {
        if self.policy == GasPolicy::Metered {
            self.remaining = 0;
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
