//! # IDENTITY (address 4)
//!
//! Returns its input unchanged. Gas: 15 + 3 per word.

use super::Precompile;
use crate::domain::value_objects::Bytes;
use crate::errors::PrecompileError;

const IDENTITY_BASE_GAS: u64 = 15;
const IDENTITY_WORD_GAS: u64 = 3;

/// Data-copy precompile.
pub struct Identity;

impl Precompile for Identity {
    fn gas_cost(&self, input: &[u8]) -> u64 {
        IDENTITY_BASE_GAS + IDENTITY_WORD_GAS * input.len().div_ceil(32) as u64
    }

    fn run(&self, input: &[u8]) -> Result<Bytes, PrecompileError> {
        Ok(Bytes::from_slice(input))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_equals_input() {
        let input = b"some calldata";
        assert_eq!(Identity.run(input).unwrap().as_slice(), input);
        assert!(Identity.run(&[]).unwrap().is_empty());
    }

    #[test]
    fn gas_scales_per_word() {
        assert_eq!(Identity.gas_cost(&[]), 15);
        assert_eq!(Identity.gas_cost(&[0u8; 32]), 18);
        assert_eq!(Identity.gas_cost(&[0u8; 65]), 24);
    }
}
