//! # BN128 curve operations (addresses 6, 7, 8)
//!
//! Point addition, scalar multiplication, and the pairing check over
//! alt_bn128. Points are 64-byte (x, y) pairs of big-endian field elements;
//! the zero pair encodes the point at infinity. Pairing input is a sequence
//! of 192-byte (G1, G2) pairs.

use super::Precompile;
use crate::domain::value_objects::Bytes;
use crate::errors::PrecompileError;
use substrate_bn::{
    pairing_batch, AffineG1, AffineG2, Fq, Fq2, Fr, Group, Gt, G1, G2,
};

const BN_ADD_GAS: u64 = 150;
const BN_MUL_GAS: u64 = 6_000;
const BN_PAIRING_BASE_GAS: u64 = 45_000;
const BN_PAIRING_PAIR_GAS: u64 = 34_000;

/// Reads a field element, zero-padding past the end of the input.
fn read_fq(input: &[u8], offset: usize) -> Result<Fq, PrecompileError> {
    let mut bytes = [0u8; 32];
    if offset < input.len() {
        let end = (offset + 32).min(input.len());
        bytes[..end - offset].copy_from_slice(&input[offset..end]);
    }
    Fq::from_slice(&bytes)
        .map_err(|_| PrecompileError::InvalidInput("field element out of range".to_string()))
}

/// Reads a scalar, zero-padding past the end of the input.
fn read_fr(input: &[u8], offset: usize) -> Result<Fr, PrecompileError> {
    let mut bytes = [0u8; 32];
    if offset < input.len() {
        let end = (offset + 32).min(input.len());
        bytes[..end - offset].copy_from_slice(&input[offset..end]);
    }
    Fr::from_slice(&bytes)
        .map_err(|_| PrecompileError::InvalidInput("scalar out of range".to_string()))
}

/// Reads a G1 point; the zero pair is the point at infinity.
fn read_g1(input: &[u8], offset: usize) -> Result<G1, PrecompileError> {
    let x = read_fq(input, offset)?;
    let y = read_fq(input, offset + 32)?;
    if x == Fq::zero() && y == Fq::zero() {
        return Ok(G1::zero());
    }
    AffineG1::new(x, y)
        .map(Into::into)
        .map_err(|_| PrecompileError::InvalidInput("point not on curve".to_string()))
}

/// Writes a G1 point as 64 bytes; infinity encodes as zeros.
fn write_g1(point: G1) -> Result<Bytes, PrecompileError> {
    let mut out = vec![0u8; 64];
    if let Some(affine) = AffineG1::from_jacobian(point) {
        affine
            .x()
            .to_big_endian(&mut out[..32])
            .map_err(|_| PrecompileError::InvalidInput("point serialization".to_string()))?;
        affine
            .y()
            .to_big_endian(&mut out[32..])
            .map_err(|_| PrecompileError::InvalidInput("point serialization".to_string()))?;
    }
    Ok(Bytes::from_vec(out))
}

// =============================================================================
// ADD (address 6)
// =============================================================================

/// alt_bn128 point addition.
pub struct Bn128Add;

impl Precompile for Bn128Add {
    fn gas_cost(&self, _input: &[u8]) -> u64 {
        BN_ADD_GAS
    }

    fn run(&self, input: &[u8]) -> Result<Bytes, PrecompileError> {
        let p = read_g1(input, 0)?;
        let q = read_g1(input, 64)?;
        write_g1(p + q)
    }
}

// =============================================================================
// MUL (address 7)
// =============================================================================

/// alt_bn128 scalar multiplication.
pub struct Bn128Mul;

impl Precompile for Bn128Mul {
    fn gas_cost(&self, _input: &[u8]) -> u64 {
        BN_MUL_GAS
    }

    fn run(&self, input: &[u8]) -> Result<Bytes, PrecompileError> {
        let p = read_g1(input, 0)?;
        let scalar = read_fr(input, 64)?;
        write_g1(p * scalar)
    }
}

// =============================================================================
// PAIRING (address 8)
// =============================================================================

/// alt_bn128 pairing check. Returns a 32-byte 1 if the product of pairings
/// is the identity, 32-byte 0 otherwise.
pub struct Bn128Pairing;

impl Precompile for Bn128Pairing {
    fn gas_cost(&self, input: &[u8]) -> u64 {
        BN_PAIRING_BASE_GAS + BN_PAIRING_PAIR_GAS * (input.len() / 192) as u64
    }

    fn run(&self, input: &[u8]) -> Result<Bytes, PrecompileError> {
        if input.len() % 192 != 0 {
            return Err(PrecompileError::InvalidInput(
                "pairing input not a multiple of 192 bytes".to_string(),
            ));
        }

        let mut pairs = Vec::with_capacity(input.len() / 192);
        for chunk in 0..input.len() / 192 {
            let at = chunk * 192;
            let a = read_g1(input, at)?;

            // G2 coordinates arrive imaginary-first.
            let b_x_im = read_fq(input, at + 64)?;
            let b_x_re = read_fq(input, at + 96)?;
            let b_y_im = read_fq(input, at + 128)?;
            let b_y_re = read_fq(input, at + 160)?;
            let b_x = Fq2::new(b_x_re, b_x_im);
            let b_y = Fq2::new(b_y_re, b_y_im);
            let b = if b_x.is_zero() && b_y.is_zero() {
                G2::zero()
            } else {
                AffineG2::new(b_x, b_y)
                    .map(Into::into)
                    .map_err(|_| {
                        PrecompileError::InvalidInput("twist point not on curve".to_string())
                    })?
            };
            pairs.push((a, b));
        }

        let ok = pairing_batch(&pairs) == Gt::one();
        let mut out = vec![0u8; 32];
        out[31] = u8::from(ok);
        Ok(Bytes::from_vec(out))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// The G1 generator (1, 2) as 64 bytes.
    fn generator() -> [u8; 64] {
        let mut g = [0u8; 64];
        g[31] = 1;
        g[63] = 2;
        g
    }

    #[test]
    fn adding_infinity_is_identity() {
        let mut input = [0u8; 128];
        input[..64].copy_from_slice(&generator());
        let out = Bn128Add.run(&input).unwrap();
        assert_eq!(out.as_slice(), &generator());
    }

    #[test]
    fn empty_input_adds_two_infinities() {
        let out = Bn128Add.run(&[]).unwrap();
        assert_eq!(out.as_slice(), &[0u8; 64]);
    }

    #[test]
    fn doubling_matches_scalar_two() {
        let mut add_input = [0u8; 128];
        add_input[..64].copy_from_slice(&generator());
        add_input[64..].copy_from_slice(&generator());
        let doubled = Bn128Add.run(&add_input).unwrap();

        let mut mul_input = [0u8; 96];
        mul_input[..64].copy_from_slice(&generator());
        mul_input[95] = 2;
        let scaled = Bn128Mul.run(&mul_input).unwrap();

        assert_eq!(doubled, scaled);
        assert_ne!(doubled.as_slice(), &[0u8; 64]);
    }

    #[test]
    fn point_off_curve_is_rejected() {
        let mut input = [0u8; 128];
        input[31] = 1;
        input[63] = 3; // (1, 3) is not on y² = x³ + 3
        assert!(Bn128Add.run(&input).is_err());
    }

    #[test]
    fn empty_pairing_input_is_success() {
        let out = Bn128Pairing.run(&[]).unwrap();
        assert_eq!(out.len(), 32);
        assert_eq!(out.as_slice()[31], 1);
    }

    #[test]
    fn ragged_pairing_input_is_rejected() {
        assert!(Bn128Pairing.run(&[0u8; 191]).is_err());
    }

    #[test]
    fn pairing_with_infinity_g2_is_success() {
        // e(G1, O) = 1, so a single (generator, infinity) pair passes.
        let mut input = [0u8; 192];
        input[..64].copy_from_slice(&generator());
        let out = Bn128Pairing.run(&input).unwrap();
        assert_eq!(out.as_slice()[31], 1);
    }

    #[test]
    fn gas_formulas() {
        assert_eq!(Bn128Add.gas_cost(&[]), 150);
        assert_eq!(Bn128Mul.gas_cost(&[]), 6_000);
        assert_eq!(Bn128Pairing.gas_cost(&[]), 45_000);
        assert_eq!(Bn128Pairing.gas_cost(&[0u8; 384]), 45_000 + 2 * 34_000);
    }
}
