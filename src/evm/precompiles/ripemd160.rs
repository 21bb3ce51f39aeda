//! # RIPEMD160 (address 3)
//!
//! RIPEMD-160 digest, left-padded to 32 bytes. Gas: 600 + 120 per word.

use super::Precompile;
use crate::domain::value_objects::Bytes;
use crate::errors::PrecompileError;
use ripemd::{Digest, Ripemd160 as Ripemd160Hasher};

const RIPEMD_BASE_GAS: u64 = 600;
const RIPEMD_WORD_GAS: u64 = 120;

/// RIPEMD-160 digest precompile.
pub struct Ripemd160;

impl Precompile for Ripemd160 {
    fn gas_cost(&self, input: &[u8]) -> u64 {
        RIPEMD_BASE_GAS + RIPEMD_WORD_GAS * input.len().div_ceil(32) as u64
    }

    fn run(&self, input: &[u8]) -> Result<Bytes, PrecompileError> {
        let digest = Ripemd160Hasher::digest(input);
        let mut out = vec![0u8; 32];
        out[12..].copy_from_slice(&digest);
        Ok(Bytes::from_vec(out))
    }
}

// =============================================================================
// TESTS
// =============================================================================
