//! # SHA256 (address 2)
//!
//! Standard SHA-256 digest of the input. Gas: 60 + 12 per word.

use super::Precompile;
use crate::domain::value_objects::Bytes;
use crate::errors::PrecompileError;
use sha2::{Digest, Sha256 as Sha256Hasher};

const SHA256_BASE_GAS: u64 = 60;
const SHA256_WORD_GAS: u64 = 12;

/// SHA-256 digest precompile.
pub struct Sha256;

impl Precompile for Sha256 {
    fn gas_cost(&self, input: &[u8]) -> u64 {
        SHA256_BASE_GAS + SHA256_WORD_GAS * input.len().div_ceil(32) as u64
    }

    fn run(&self, input: &[u8]) -> Result<Bytes, PrecompileError> {
        Ok(Bytes::from_vec(Sha256Hasher::digest(input).to_vec()))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_vector() {
        // sha256("") = e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855
        let out = Sha256.run(&[]).unwrap();
        assert_eq!(out.len(), 32);
        assert_eq!(&out.as_slice()[..4], &[0xe3, 0xb0, 0xc4, 0x42]);
    }

    #[test]
    fn abc_vector() {
        // sha256("abc") starts with ba7816bf
        let out = Sha256.run(b"abc").unwrap();
        assert_eq!(&out.as_slice()[..4], &[0xba, 0x78, 0x16, 0xbf]);
    }

    #[test]
    fn gas_scales_per_word() {
        assert_eq!(Sha256.gas_cost(&[]), 60);
        assert_eq!(Sha256.gas_cost(&[0u8; 32]), 72);
        assert_eq!(Sha256.gas_cost(&[0u8; 33]), 84);
    }
}
