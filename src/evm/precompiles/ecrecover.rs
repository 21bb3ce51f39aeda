//! # ECRECOVER (address 1)
//!
//! Recovers the signer address from an ECDSA signature over secp256k1.
//!
//! Input, padded or truncated to 128 bytes:
//! hash(32) ‖ v(32, low byte used, 27 or 28) ‖ r(32) ‖ s(32).
//!
//! Output: the signer's 20-byte address left-padded to 32 bytes, or empty on
//! any recovery failure.

use super::Precompile;
use crate::domain::services::address_from_pubkey;
use crate::domain::value_objects::Bytes;
use crate::errors::PrecompileError;
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};

const ECRECOVER_GAS: u64 = 3_000;

/// Signature recovery precompile.
pub struct EcRecover;

impl Precompile for EcRecover {
    fn gas_cost(&self, _input: &[u8]) -> u64 {
        ECRECOVER_GAS
    }

    fn run(&self, input: &[u8]) -> Result<Bytes, PrecompileError> {
        let mut padded = [0u8; 128];
        let len = input.len().min(128);
        padded[..len].copy_from_slice(&input[..len]);

        let hash = &padded[0..32];
        let v = &padded[32..64];
        let rs = &padded[64..128];

        // v must be 27 or 28 with 31 zero bytes of padding.
        if v[..31] != [0u8; 31] || !matches!(v[31], 27 | 28) {
            return Ok(Bytes::new());
        }
        let recovery_id = match RecoveryId::from_byte(v[31] - 27) {
            Some(id) => id,
            None => return Ok(Bytes::new()),
        };

        // Zero or out-of-order r/s is a soft failure, like a bad signature.
        let signature = match Signature::from_slice(rs) {
            Ok(sig) => sig,
            Err(_) => return Ok(Bytes::new()),
        };

        let key = match VerifyingKey::recover_from_prehash(hash, &signature, recovery_id) {
            Ok(key) => key,
            Err(_) => return Ok(Bytes::new()),
        };

        // Uncompressed SEC1 point without the 0x04 tag.
        let point = key.to_encoded_point(false);
        let address = address_from_pubkey(&point.as_bytes()[1..]);

        let mut out = vec![0u8; 32];
        out[12..].copy_from_slice(address.as_bytes());
        Ok(Bytes::from_vec(out))
    }
}

// =============================================================================
// TESTS
// =============================================================================
