//! # BLAKE2F (address 9)
//!
//! The BLAKE2b compression function F with a caller-chosen round count.
//!
//! Input, exactly 213 bytes: rounds(4, big-endian) ‖ h[0..8](64, little-endian
//! words) ‖ m[0..16](128) ‖ t0,t1(16) ‖ final-flag(1, 0 or 1). Output: the 64
//! byte updated state. Gas equals the round count. A zero round count returns
//! the input state unchanged.

use super::Precompile;
use crate::domain::value_objects::Bytes;
use crate::errors::PrecompileError;

const INPUT_LEN: usize = 213;

/// BLAKE2b initialization vector.
const IV: [u64; 8] = [
    0x6a09_e667_f3bc_c908,
    0xbb67_ae85_84ca_a73b,
    0x3c6e_f372_fe94_f82b,
    0xa54f_f53a_5f1d_36f1,
    0x510e_527f_ade6_82d1,
    0x9b05_688c_2b3e_6c1f,
    0x1f83_d9ab_fb41_bd6b,
    0x5be0_cd19_137e_2179,
];

/// Message-schedule permutations, reused modulo 10 past round 9.
const SIGMA: [[usize; 16]; 10] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15],
    [14, 10, 4, 8, 9, 15, 13, 6, 1, 12, 0, 2, 11, 7, 5, 3],
    [11, 8, 12, 0, 5, 2, 15, 13, 10, 14, 3, 6, 7, 1, 9, 4],
    [7, 9, 3, 1, 13, 12, 11, 14, 2, 6, 5, 10, 4, 0, 15, 8],
    [9, 0, 5, 7, 2, 4, 10, 15, 14, 1, 11, 12, 6, 8, 3, 13],
    [2, 12, 6, 10, 0, 11, 8, 3, 4, 13, 7, 5, 15, 14, 1, 9],
    [12, 5, 1, 15, 14, 13, 4, 10, 0, 7, 6, 3, 9, 2, 8, 11],
    [13, 11, 7, 14, 12, 1, 3, 9, 5, 0, 15, 4, 8, 6, 2, 10],
    [6, 15, 14, 9, 11, 3, 0, 8, 12, 2, 13, 7, 1, 4, 10, 5],
    [10, 2, 8, 4, 7, 6, 1, 5, 15, 11, 9, 14, 3, 12, 13, 0],
];

/// BLAKE2b compression precompile.
pub struct Blake2F;

impl Precompile for Blake2F {
    fn gas_cost(&self, input: &[u8]) -> u64 {
        if input.len() < 4 {
            return 0;
        }
        u64::from(u32::from_be_bytes([input[0], input[1], input[2], input[3]]))
    }

    fn run(&self, input: &[u8]) -> Result<Bytes, PrecompileError> {
        if input.len() != INPUT_LEN {
            return Err(PrecompileError::InvalidInputLength {
                expected: INPUT_LEN,
                actual: input.len(),
            });
        }

        let rounds = u32::from_be_bytes([input[0], input[1], input[2], input[3]]);

        let mut h = [0u64; 8];
        for (i, word) in h.iter_mut().enumerate() {
            *word = read_le_u64(input, 4 + i * 8);
        }
        let mut m = [0u64; 16];
        for (i, word) in m.iter_mut().enumerate() {
            *word = read_le_u64(input, 68 + i * 8);
        }
        let t = [read_le_u64(input, 196), read_le_u64(input, 204)];

        let finalize = match input[212] {
            0 => false,
            1 => true,
            flag => {
                return Err(PrecompileError::InvalidInput(format!(
                    "final-block flag must be 0 or 1, got {flag}"
                )))
            }
        };

        if rounds > 0 {
            compress(&mut h, &m, t, finalize, rounds);
        }

        let mut out = Vec::with_capacity(64);
        for word in h {
            out.extend_from_slice(&word.to_le_bytes());
        }
        Ok(Bytes::from_vec(out))
    }
}

fn read_le_u64(input: &[u8], offset: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&input[offset..offset + 8]);
    u64::from_le_bytes(bytes)
}

fn compress(h: &mut [u64; 8], m: &[u64; 16], t: [u64; 2], finalize: bool, rounds: u32) {
    let mut v = [0u64; 16];
    v[..8].copy_from_slice(h);
    v[8..].copy_from_slice(&IV);
    v[12] ^= t[0];
    v[13] ^= t[1];
    if finalize {
        v[14] = !v[14];
    }

    for r in 0..rounds as usize {
        let s = &SIGMA[r % 10];
        g(&mut v, 0, 4, 8, 12, m[s[0]], m[s[1]]);
        g(&mut v, 1, 5, 9, 13, m[s[2]], m[s[3]]);
        g(&mut v, 2, 6, 10, 14, m[s[4]], m[s[5]]);
        g(&mut v, 3, 7, 11, 15, m[s[6]], m[s[7]]);
        g(&mut v, 0, 5, 10, 15, m[s[8]], m[s[9]]);
        g(&mut v, 1, 6, 11, 12, m[s[10]], m[s[11]]);
        g(&mut v, 2, 7, 8, 13, m[s[12]], m[s[13]]);
        g(&mut v, 3, 4, 9, 14, m[s[14]], m[s[15]]);
    }

    for i in 0..8 {
        h[i] ^= v[i] ^ v[i + 8];
    }
}

#[inline]
fn g(v: &mut [u64; 16], a: usize, b: usize, c: usize, d: usize, x: u64, y: u64) {
    v[a] = v[a].wrapping_add(v[b]).wrapping_add(x);
    v[d] = (v[d] ^ v[a]).rotate_right(32);
    v[c] = v[c].wrapping_add(v[d]);
    v[b] = (v[b] ^ v[c]).rotate_right(24);
    v[a] = v[a].wrapping_add(v[b]).wrapping_add(y);
    v[d] = (v[d] ^ v[a]).rotate_right(16);
    v[c] = v[c].wrapping_add(v[d]);
    v[b] = (v[b] ^ v[c]).rotate_right(63);
}

// =============================================================================
// TESTS
// =============================================================================
