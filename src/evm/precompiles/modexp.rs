//! # MODEXP (address 5)
//!
//! Arbitrary-precision modular exponentiation.
//!
//! Input: baseLen(32) ‖ expLen(32) ‖ modLen(32) ‖ base ‖ exp ‖ mod, with
//! missing bytes reading as zero. Output: base^exp mod mod, left-padded to
//! modLen bytes; all-zero when the modulus is zero. Gas follows EIP-2565.

use super::Precompile;
use crate::domain::value_objects::{Bytes, U256};
use crate::errors::PrecompileError;
use num_bigint::BigUint;
use num_traits::Zero;

const MODEXP_MIN_GAS: u64 = 200;

/// Operand length cap; inputs past this are rejected rather than priced.
const MAX_OPERAND_LEN: usize = 1_024;

/// Modular exponentiation precompile.
pub struct ModExp;

struct Operands {
    base_len: usize,
    exp_len: usize,
    mod_len: usize,
}

fn read_lengths(input: &[u8]) -> Operands {
    Operands {
        base_len: read_word(input, 0).min(U256::from(usize::MAX)).as_usize(),
        exp_len: read_word(input, 32).min(U256::from(usize::MAX)).as_usize(),
        mod_len: read_word(input, 64).min(U256::from(usize::MAX)).as_usize(),
    }
}

/// Reads a 32-byte big-endian word at `offset`, zero-padded past the input.
fn read_word(input: &[u8], offset: usize) -> U256 {
    let mut word = [0u8; 32];
    if offset < input.len() {
        let end = (offset + 32).min(input.len());
        word[..end - offset].copy_from_slice(&input[offset..end]);
    }
    U256::from_big_endian(&word)
}

/// Reads `len` bytes at `offset`, zero-padded past the input.
fn read_operand(input: &[u8], offset: usize, len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    if offset < input.len() {
        let end = (offset + len).min(input.len());
        bytes[..end - offset].copy_from_slice(&input[offset..end]);
    }
    bytes
}

/// EIP-2565 multiplication complexity: `ceil(max_len / 8)²`.
fn multiplication_complexity(max_len: u64) -> u64 {
    let words = max_len.div_ceil(8);
    words.saturating_mul(words)
}

/// EIP-2565 iteration count from the exponent length and its first 32 bytes.
fn iteration_count(exp_len: u64, exp_head: U256) -> u64 {
    let head_bits = if exp_head.is_zero() {
        0
    } else {
        exp_head.bits() as u64 - 1
    };
    let count = if exp_len <= 32 {
        head_bits
    } else {
        8u64.saturating_mul(exp_len - 32).saturating_add(head_bits)
    };
    count.max(1)
}

impl Precompile for ModExp {
    fn gas_cost(&self, input: &[u8]) -> u64 {
        let lengths = read_lengths(input);
        let exp_head = read_word(input, 96 + lengths.base_len);
        let complexity = multiplication_complexity(lengths.base_len.max(lengths.mod_len) as u64);
        let iterations = iteration_count(lengths.exp_len as u64, exp_head);
        (complexity.saturating_mul(iterations) / 3).max(MODEXP_MIN_GAS)
    }

    fn run(&self, input: &[u8]) -> Result<Bytes, PrecompileError> {
        let lengths = read_lengths(input);
        if lengths.base_len > MAX_OPERAND_LEN
            || lengths.exp_len > MAX_OPERAND_LEN
            || lengths.mod_len > MAX_OPERAND_LEN
        {
            return Err(PrecompileError::InvalidInput(
                "modexp operand too large".to_string(),
            ));
        }

        if lengths.mod_len == 0 {
            return Ok(Bytes::new());
        }

        let base = BigUint::from_bytes_be(&read_operand(input, 96, lengths.base_len));
        let exponent = BigUint::from_bytes_be(&read_operand(
            input,
            96 + lengths.base_len,
            lengths.exp_len,
        ));
        let modulus = BigUint::from_bytes_be(&read_operand(
            input,
            96 + lengths.base_len + lengths.exp_len,
            lengths.mod_len,
        ));

        if modulus.is_zero() {
            return Ok(Bytes::from_vec(vec![0u8; lengths.mod_len]));
        }

        let result = base.modpow(&exponent, &modulus);
        let digits = result.to_bytes_be();

        // result < modulus, so it always fits mod_len after left-padding.
        let mut out = vec![0u8; lengths.mod_len];
        out[lengths.mod_len - digits.len()..].copy_from_slice(&digits);
        Ok(Bytes::from_vec(out))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn build_input(base: &[u8], exp: &[u8], modulus: &[u8]) -> Vec<u8> {
        let mut input = vec![0u8; 96];
        input[..32].copy_from_slice(&{
            let mut w = [0u8; 32];
            U256::from(base.len()).to_big_endian(&mut w);
            w
        });
        input[32..64].copy_from_slice(&{
            let mut w = [0u8; 32];
            U256::from(exp.len()).to_big_endian(&mut w);
            w
        });
        input[64..96].copy_from_slice(&{
            let mut w = [0u8; 32];
            U256::from(modulus.len()).to_big_endian(&mut w);
            w
        });
        input.extend_from_slice(base);
        input.extend_from_slice(exp);
        input.extend_from_slice(modulus);
        input
    }

    #[test]
    fn small_exponentiation() {
        // 2^3 mod 5 = 3
        let input = build_input(&[2], &[3], &[5]);
        let out = ModExp.run(&input).unwrap();
        assert_eq!(out.as_slice(), &[3]);
    }

    #[test]
    fn zero_mod_len_returns_empty() {
        let input = build_input(&[2], &[100], &[]);
        assert!(ModExp.run(&input).unwrap().is_empty());
    }

    #[test]
    fn zero_modulus_returns_zeros() {
        let input = build_input(&[2], &[3], &[0, 0, 0, 0]);
        assert_eq!(ModExp.run(&input).unwrap().as_slice(), &[0, 0, 0, 0]);
    }

    #[test]
    fn modulus_one_returns_zeros_of_mod_len() {
        let input = build_input(&[0xff; 8], &[0xff; 8], &[0, 0, 0, 1]);
        assert_eq!(ModExp.run(&input).unwrap().as_slice(), &[0, 0, 0, 0]);
    }

    #[test]
    fn output_is_left_padded_to_mod_len() {
        // 2^10 mod 1000 = 24, over a 4-byte modulus
        let input = build_input(&[2], &[10], &[0, 0, 0x03, 0xe8]);
        assert_eq!(ModExp.run(&input).unwrap().as_slice(), &[0, 0, 0, 24]);
    }

    #[test]
    fn large_operands_round_trip() {
        // Fermat: a^(p-1) mod p = 1 for prime p not dividing a.
        // p = 2^255 - 19 over 32-byte operands.
        let mut p = [0u8; 32];
        p[0] = 0x7f;
        for b in p.iter_mut().skip(1) {
            *b = 0xff;
        }
        p[31] = 0xed;
        let mut p_minus_1 = p;
        p_minus_1[31] = 0xec;

        let input = build_input(&[3], &p_minus_1, &p);
        let out = ModExp.run(&input).unwrap();
        let mut expected = vec![0u8; 32];
        expected[31] = 1;
        assert_eq!(out.as_slice(), expected.as_slice());
    }

    #[test]
    fn eip_2565_minimum_gas() {
        let input = build_input(&[2], &[3], &[5]);
        assert_eq!(ModExp.gas_cost(&input), MODEXP_MIN_GAS);
    }

    #[test]
    fn gas_grows_with_operand_size() {
        let base = vec![0xffu8; 256];
        let exp = vec![0xffu8; 64];
        let modulus = vec![0xffu8; 256];
        let input = build_input(&base, &exp, &modulus);

        // words = 32, complexity = 1024, iterations = 8*32 + 255 = 511
        // gas = 1024 * 511 / 3
        assert_eq!(ModExp.gas_cost(&input), 1024 * 511 / 3);
    }

    #[test]
    fn oversized_operands_are_rejected() {
        let input = build_input(&[2], &[3], &[5]);
        let mut oversized = input.clone();
        // Claim a 2 MiB base length.
        oversized[..32].copy_from_slice(&{
            let mut w = [0u8; 32];
            U256::from(2 * 1024 * 1024).to_big_endian(&mut w);
            w
        });
        assert!(ModExp.run(&oversized).is_err());
    }
}
